//! Cached list of admin accounts, used to fan out moderation notifications

use std::sync::Arc;
use std::time::Duration;

use crate::cache::TtlCache;
use crate::domain::entities::{Role, UserId};
use crate::domain::ports::UserRepository;
use crate::error::DomainError;

pub struct AdminDirectory<UR>
where
    UR: UserRepository,
{
    users: Arc<UR>,
    cache: TtlCache<(), Vec<UserId>>,
}

impl<UR> AdminDirectory<UR>
where
    UR: UserRepository,
{
    pub fn new(users: Arc<UR>, ttl: Duration) -> Self {
        Self {
            users,
            cache: TtlCache::new(1, ttl),
        }
    }

    /// IDs of every non-banned admin
    pub async fn admin_ids(&self) -> Result<Vec<UserId>, DomainError> {
        if let Some(ids) = self.cache.get(&()) {
            return Ok(ids);
        }

        let ids: Vec<UserId> = self
            .users
            .find_by_role(Role::Admin)
            .await?
            .into_iter()
            .filter(|u| !u.is_banned)
            .map(|u| u.id)
            .collect();
        tracing::debug!(count = ids.len(), "Refreshed admin list");
        self.cache.insert((), ids.clone());
        Ok(ids)
    }

    /// Drop the cached list after a role or ban change
    pub fn invalidate(&self) {
        self.cache.invalidate(&());
    }
}
