use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;
use thiserror::Error;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Roles ---

/// Role
///
/// The RBAC marker carried in every session token and stored on every account.
/// Persisted as lowercase text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    Admin,
    College,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::College => "college",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row mapping for the `role` text column.
impl TryFrom<String> for Role {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "admin" => Ok(Role::Admin),
            "college" => Ok(Role::College),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

// --- Accounts (Mapped to Database) ---

/// Admin
///
/// An administrator account as read back from the `admins` collection. The password
/// hash is projected out by every query, so this type cannot carry it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Admin {
    pub id: Uuid,
    // Unique, stored normalized (trimmed, lowercased).
    pub email: String,
    pub name: String,
    // Unique institutional code.
    pub admin_code: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// NewAdmin
///
/// Insert payload for an admin account. `password_hash` must already be an argon2
/// PHC string; see `auth::hash_password`.
#[derive(Debug, Clone)]
pub struct NewAdmin {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub admin_code: String,
}

/// UpdateAdminRequest
///
/// Partial update for the signed-in admin's own profile (PUT /api/admin/profile).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdateAdminRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// College
///
/// A college account as read back from the `colleges` collection, password excluded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct College {
    pub id: Uuid,
    pub email: String,
    pub college_name: String,
    pub college_code: String,
    pub address: Option<String>,
    #[sqlx(try_from = "String")]
    pub role: Role,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for a college account.
#[derive(Debug, Clone)]
pub struct NewCollege {
    pub email: String,
    pub password_hash: String,
    pub college_name: String,
    pub college_code: String,
    pub address: Option<String>,
}

/// Emails are compared and stored trimmed and lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

// --- Academic Audit ---

/// AuditSection
///
/// The fixed set of audit form sections. Any section id arriving over the wire is
/// parsed into this enum before it reaches the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub enum AuditSection {
    GeneralInformation,
    Governance,
    Faculty,
    StudentStrength,
    Infrastructure,
    Library,
    Laboratories,
    Curriculum,
    TeachingLearning,
    Examinations,
    Research,
    Placement,
    StudentSupport,
    ExtensionActivities,
    Finance,
    Alumni,
    BestPractices,
}

impl AuditSection {
    pub const ALL: [AuditSection; 17] = [
        AuditSection::GeneralInformation,
        AuditSection::Governance,
        AuditSection::Faculty,
        AuditSection::StudentStrength,
        AuditSection::Infrastructure,
        AuditSection::Library,
        AuditSection::Laboratories,
        AuditSection::Curriculum,
        AuditSection::TeachingLearning,
        AuditSection::Examinations,
        AuditSection::Research,
        AuditSection::Placement,
        AuditSection::StudentSupport,
        AuditSection::ExtensionActivities,
        AuditSection::Finance,
        AuditSection::Alumni,
        AuditSection::BestPractices,
    ];

    /// The wire key, identical to the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditSection::GeneralInformation => "generalInformation",
            AuditSection::Governance => "governance",
            AuditSection::Faculty => "faculty",
            AuditSection::StudentStrength => "studentStrength",
            AuditSection::Infrastructure => "infrastructure",
            AuditSection::Library => "library",
            AuditSection::Laboratories => "laboratories",
            AuditSection::Curriculum => "curriculum",
            AuditSection::TeachingLearning => "teachingLearning",
            AuditSection::Examinations => "examinations",
            AuditSection::Research => "research",
            AuditSection::Placement => "placement",
            AuditSection::StudentSupport => "studentSupport",
            AuditSection::ExtensionActivities => "extensionActivities",
            AuditSection::Finance => "finance",
            AuditSection::Alumni => "alumni",
            AuditSection::BestPractices => "bestPractices",
        }
    }
}

impl fmt::Display for AuditSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown audit section: {0}")]
pub struct UnknownSection(pub String);

impl FromStr for AuditSection {
    type Err = UnknownSection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AuditSection::ALL
            .iter()
            .copied()
            .find(|section| section.as_str() == s)
            .ok_or_else(|| UnknownSection(s.to_string()))
    }
}

/// AuditDocument
///
/// One college's audit: a map from section key to that section's field values.
/// Timestamps are `None` for a college that has not saved any section yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AuditDocument {
    pub college_id: Uuid,
    #[sqlx(json)]
    #[schema(value_type = Object)]
    #[ts(type = "Record<string, Record<string, unknown>>")]
    pub sections: Map<String, Value>,
    #[ts(type = "string | null")]
    pub created_at: Option<DateTime<Utc>>,
    #[ts(type = "string | null")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl AuditDocument {
    /// The audit of a college that has not saved anything yet.
    pub fn empty(college_id: Uuid) -> Self {
        Self {
            college_id,
            sections: Map::new(),
            created_at: None,
            updated_at: None,
        }
    }
}

// --- Response Envelopes ---

/// MessageResponse
///
/// Body of every error response and of informational replies such as logout.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct MessageResponse {
    pub message: String,
}

/// SessionUser
///
/// The identity decoded from a verified session token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SessionUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    // Admin name, or the college name for college accounts.
    pub name: Option<String>,
}

/// VerifyResponse
///
/// Output of GET /api/auth/verify.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct VerifyResponse {
    pub user: SessionUser,
}
