//! Verification request domain entity
//!
//! A user submits identity or business documents; an admin approves or
//! rejects the request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::UserId;

pub const MAX_VERIFICATION_DOCUMENTS: usize = 5;

/// Unique identifier for a verification request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VerificationId(pub Uuid);

impl From<Uuid> for VerificationId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for VerificationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of document submitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    NationalId,
    BusinessLicense,
    FarmRegistration,
    TaxCertificate,
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentType::NationalId => write!(f, "national_id"),
            DocumentType::BusinessLicense => write!(f, "business_license"),
            DocumentType::FarmRegistration => write!(f, "farm_registration"),
            DocumentType::TaxCertificate => write!(f, "tax_certificate"),
        }
    }
}

impl std::str::FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "national_id" => Ok(DocumentType::NationalId),
            "business_license" => Ok(DocumentType::BusinessLicense),
            "farm_registration" => Ok(DocumentType::FarmRegistration),
            "tax_certificate" => Ok(DocumentType::TaxCertificate),
            _ => Err(format!("Unknown document type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Pending,
    Approved,
    Rejected,
}

impl std::fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerificationStatus::Pending => write!(f, "pending"),
            VerificationStatus::Approved => write!(f, "approved"),
            VerificationStatus::Rejected => write!(f, "rejected"),
        }
    }
}

impl std::str::FromStr for VerificationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(VerificationStatus::Pending),
            "approved" => Ok(VerificationStatus::Approved),
            "rejected" => Ok(VerificationStatus::Rejected),
            _ => Err(format!("Unknown verification status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VerificationRequest {
    pub id: VerificationId,
    pub user_id: UserId,
    pub document_type: DocumentType,
    pub document_keys: Vec<String>,
    pub notes: Option<String>,
    pub status: VerificationStatus,
    pub reviewer_id: Option<UserId>,
    pub review_notes: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

/// Data needed to submit a verification request
#[derive(Debug, Clone)]
pub struct NewVerificationRequest {
    pub user_id: UserId,
    pub document_type: DocumentType,
    pub document_keys: Vec<String>,
    pub notes: Option<String>,
}

/// Admin decision on a pending request
#[derive(Debug, Clone)]
pub struct VerificationDecision {
    pub status: VerificationStatus,
    pub reviewer_id: UserId,
    pub review_notes: Option<String>,
}
