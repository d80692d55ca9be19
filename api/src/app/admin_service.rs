//! Admin service
//!
//! Account moderation and the dashboard counters. Listing moderation,
//! verification review and broadcasts live in their own services.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::app::AdminDirectory;
use crate::domain::entities::{
    NotificationKind, OfferStatus, OutgoingNotification, ProductStatus, Role, User, UserFilter,
    UserId,
};
use crate::domain::ports::{
    Notify, OfferRepository, ProductRepository, UserRepository, VerificationRepository,
};
use crate::error::AppError;

const MAX_PAGE: u64 = 100;

/// Dashboard counters. Every known role and status is present, zero if unused.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub users_by_role: BTreeMap<String, u64>,
    pub products_by_status: BTreeMap<String, u64>,
    pub offers_by_status: BTreeMap<String, u64>,
    pub pending_verifications: u64,
}

pub struct AdminService<UR, PR, OR, VR, N>
where
    UR: UserRepository,
    PR: ProductRepository,
    OR: OfferRepository,
    VR: VerificationRepository,
    N: Notify,
{
    users: Arc<UR>,
    products: Arc<PR>,
    offers: Arc<OR>,
    verifications: Arc<VR>,
    admins: Arc<AdminDirectory<UR>>,
    notifier: Arc<N>,
}

impl<UR, PR, OR, VR, N> AdminService<UR, PR, OR, VR, N>
where
    UR: UserRepository,
    PR: ProductRepository,
    OR: OfferRepository,
    VR: VerificationRepository,
    N: Notify,
{
    pub fn new(
        users: Arc<UR>,
        products: Arc<PR>,
        offers: Arc<OR>,
        verifications: Arc<VR>,
        admins: Arc<AdminDirectory<UR>>,
        notifier: Arc<N>,
    ) -> Self {
        Self {
            users,
            products,
            offers,
            verifications,
            admins,
            notifier,
        }
    }

    pub async fn list_users(&self, mut filter: UserFilter) -> Result<Vec<User>, AppError> {
        filter.limit = filter.limit.clamp(1, MAX_PAGE);
        filter.search = filter
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        Ok(self.users.list(&filter).await?)
    }

    async fn target(&self, admin: &User, id: &UserId) -> Result<User, AppError> {
        if admin.id == *id {
            return Err(AppError::BadRequest(
                "You cannot change your own account this way".to_string(),
            ));
        }
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
    }

    pub async fn set_banned(
        &self,
        admin: &User,
        id: &UserId,
        banned: bool,
    ) -> Result<User, AppError> {
        let mut user = self.target(admin, id).await?;
        if user.is_banned == banned {
            return Ok(user);
        }

        self.users.set_banned(id, banned).await?;
        user.is_banned = banned;
        if user.is_admin() {
            self.admins.invalidate();
        }
        tracing::info!(user_id = %id, admin_id = %admin.id, banned, "Account ban status changed");

        let body = if banned {
            "Your account has been suspended. Contact support if you think this is a mistake."
        } else {
            "Your account has been reinstated."
        };
        self.notifier
            .notify_best_effort(
                id,
                OutgoingNotification::new(NotificationKind::AccountStatus, "Account update", body),
            )
            .await;

        Ok(user)
    }

    pub async fn set_role(&self, admin: &User, id: &UserId, role: Role) -> Result<User, AppError> {
        let mut user = self.target(admin, id).await?;
        if user.role == role {
            return Ok(user);
        }

        let was_admin = user.is_admin();
        self.users.set_role(id, role).await?;
        user.role = role;
        if was_admin || user.is_admin() {
            self.admins.invalidate();
        }
        tracing::info!(user_id = %id, admin_id = %admin.id, role = %role, "Account role changed");
        Ok(user)
    }

    pub async fn stats(&self) -> Result<DashboardStats, AppError> {
        let users_by_role = fill(
            Role::ALL.iter().map(ToString::to_string),
            self.users.count_by_role().await?,
        );
        let products_by_status = fill(
            ProductStatus::ALL.iter().map(ToString::to_string),
            self.products.count_by_status().await?,
        );
        let offers_by_status = fill(
            OfferStatus::ALL.iter().map(ToString::to_string),
            self.offers.count_by_status().await?,
        );

        Ok(DashboardStats {
            users_by_role,
            products_by_status,
            offers_by_status,
            pending_verifications: self.verifications.count_pending().await?,
        })
    }
}

fn fill<T: ToString>(
    keys: impl Iterator<Item = String>,
    counts: Vec<(T, u64)>,
) -> BTreeMap<String, u64> {
    let mut map: BTreeMap<String, u64> = keys.map(|k| (k, 0)).collect();
    for (key, count) in counts {
        *map.entry(key.to_string()).or_default() += count;
    }
    map
}
