//! Verification service
//!
//! Sellers submit identity or business documents; admins approve or reject.
//! Approval marks the account verified, which lets new listings skip the
//! moderation queue.

use std::sync::Arc;

use crate::app::AdminDirectory;
use crate::domain::entities::{
    validate_owned_keys, AssetPurpose, DocumentType, NewVerificationRequest, NotificationKind,
    OutgoingNotification, User, VerificationDecision, VerificationId, VerificationRequest,
    VerificationStatus, MAX_VERIFICATION_DOCUMENTS,
};
use crate::domain::ports::{Notify, UserRepository, VerificationRepository};
use crate::error::{AppError, DomainError};

const MAX_PAGE: u64 = 100;
const MAX_NOTES_LEN: usize = 1000;

pub struct VerificationService<VR, UR, N>
where
    VR: VerificationRepository,
    UR: UserRepository,
    N: Notify,
{
    requests: Arc<VR>,
    users: Arc<UR>,
    admins: Arc<AdminDirectory<UR>>,
    notifier: Arc<N>,
}

impl<VR, UR, N> VerificationService<VR, UR, N>
where
    VR: VerificationRepository,
    UR: UserRepository,
    N: Notify,
{
    pub fn new(
        requests: Arc<VR>,
        users: Arc<UR>,
        admins: Arc<AdminDirectory<UR>>,
        notifier: Arc<N>,
    ) -> Self {
        Self {
            requests,
            users,
            admins,
            notifier,
        }
    }

    pub async fn submit(
        &self,
        user: &User,
        document_type: DocumentType,
        document_keys: Vec<String>,
        notes: Option<String>,
    ) -> Result<VerificationRequest, AppError> {
        if user.is_verified {
            return Err(AppError::Domain(DomainError::Conflict(
                "Your account is already verified".to_string(),
            )));
        }
        if document_keys.is_empty() || document_keys.len() > MAX_VERIFICATION_DOCUMENTS {
            return Err(AppError::BadRequest(format!(
                "Attach between 1 and {} documents",
                MAX_VERIFICATION_DOCUMENTS
            )));
        }
        validate_owned_keys(AssetPurpose::Verification, &user.id, &document_keys)
            .map_err(AppError::BadRequest)?;
        let notes = notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        check_notes(notes.as_deref())?;

        if self.requests.find_pending_by_user(&user.id).await?.is_some() {
            return Err(AppError::Domain(DomainError::Conflict(
                "You already have a verification request under review".to_string(),
            )));
        }

        let request = self
            .requests
            .create(&NewVerificationRequest {
                user_id: user.id,
                document_type,
                document_keys,
                notes,
            })
            .await?;

        tracing::info!(request_id = %request.id, user_id = %user.id, document_type = %document_type, "Verification submitted");

        match self.admins.admin_ids().await {
            Ok(admins) => {
                for admin_id in admins {
                    self.notifier
                        .notify_best_effort(
                            &admin_id,
                            OutgoingNotification::new(
                                NotificationKind::VerificationSubmitted,
                                "Verification request",
                                format!("{} submitted {} documents", user.full_name, document_type),
                            )
                            .with_data(serde_json::json!({ "request_id": request.id })),
                        )
                        .await;
                }
            }
            Err(e) => tracing::warn!(error = %e, "Could not load admins to notify"),
        }

        Ok(request)
    }

    pub async fn list_mine(&self, user: &User) -> Result<Vec<VerificationRequest>, AppError> {
        Ok(self.requests.list_by_user(&user.id).await?)
    }

    /// Admin queue; pending requests unless another status is asked for
    pub async fn list(
        &self,
        status: Option<VerificationStatus>,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<VerificationRequest>, AppError> {
        Ok(self
            .requests
            .list(
                Some(status.unwrap_or(VerificationStatus::Pending)),
                limit.clamp(1, MAX_PAGE),
                offset,
            )
            .await?)
    }

    pub async fn approve(
        &self,
        admin: &User,
        id: &VerificationId,
        notes: Option<String>,
    ) -> Result<VerificationRequest, AppError> {
        let notes = notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        check_notes(notes.as_deref())?;
        let request = self
            .decide(admin, id, VerificationStatus::Approved, notes)
            .await?;
        self.users.set_verified(&request.user_id, true).await?;

        self.notify_outcome(&request, "Your account is now verified".to_string())
            .await;
        Ok(request)
    }

    pub async fn reject(
        &self,
        admin: &User,
        id: &VerificationId,
        notes: &str,
    ) -> Result<VerificationRequest, AppError> {
        let notes = notes.trim();
        if notes.is_empty() {
            return Err(AppError::BadRequest(
                "A reason is required to reject a request".to_string(),
            ));
        }
        check_notes(Some(notes))?;
        let request = self
            .decide(admin, id, VerificationStatus::Rejected, Some(notes.to_string()))
            .await?;

        self.notify_outcome(
            &request,
            format!("Your verification request was rejected: {}", notes),
        )
        .await;
        Ok(request)
    }

    async fn decide(
        &self,
        admin: &User,
        id: &VerificationId,
        status: VerificationStatus,
        review_notes: Option<String>,
    ) -> Result<VerificationRequest, AppError> {
        let request = self
            .requests
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Verification request {} not found", id)))?;
        if request.status != VerificationStatus::Pending {
            return Err(AppError::Domain(DomainError::Conflict(format!(
                "Request is already {}",
                request.status
            ))));
        }

        let decided = self
            .requests
            .decide(
                id,
                &VerificationDecision {
                    status,
                    reviewer_id: admin.id,
                    review_notes,
                },
            )
            .await?;
        tracing::info!(request_id = %id, reviewer_id = %admin.id, status = %status, "Verification decided");
        Ok(decided)
    }

    async fn notify_outcome(&self, request: &VerificationRequest, body: String) {
        self.notifier
            .notify_best_effort(
                &request.user_id,
                OutgoingNotification::new(
                    NotificationKind::VerificationUpdated,
                    "Verification update",
                    body,
                )
                .with_data(serde_json::json!({
                    "request_id": request.id,
                    "status": request.status,
                })),
            )
            .await;
    }
}

fn check_notes(notes: Option<&str>) -> Result<(), AppError> {
    if notes.is_some_and(|n| n.chars().count() > MAX_NOTES_LEN) {
        return Err(AppError::BadRequest(format!(
            "Notes must be at most {} characters",
            MAX_NOTES_LEN
        )));
    }
    Ok(())
}
