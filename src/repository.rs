use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::{PgPool, postgres::PgPoolOptions, types::Json};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    config::AppConfig,
    models::{
        Admin, AuditDocument, AuditSection, College, NewAdmin, NewCollege, Role,
        UpdateAdminRequest, normalize_email,
    },
};

pub const DUPLICATE_ADMIN_EMAIL: &str = "An admin with this email already exists";
pub const DUPLICATE_ADMIN_CODE: &str = "An admin with this admin code already exists";
pub const DUPLICATE_COLLEGE_EMAIL: &str = "A college with this email already exists";
pub const DUPLICATE_COLLEGE_CODE: &str = "A college with this college code already exists";

/// RepositoryError
///
/// Failures of the document store. Uniqueness violations are reported as
/// `Conflict` with a caller-safe message; everything else is opaque to clients.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("{0}")]
    Conflict(String),

    #[error("referenced document does not exist")]
    MissingReference,

    #[error("document store unavailable")]
    Unavailable,
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                let message = match db_err.constraint() {
                    Some("admins_email_key") => DUPLICATE_ADMIN_EMAIL,
                    Some("admins_admin_code_key") => DUPLICATE_ADMIN_CODE,
                    Some("colleges_email_key") => DUPLICATE_COLLEGE_EMAIL,
                    Some("colleges_college_code_key") => DUPLICATE_COLLEGE_CODE,
                    _ => "Duplicate record",
                };
                return RepositoryError::Conflict(message.to_string());
            }
            if db_err.is_foreign_key_violation() {
                return RepositoryError::MissingReference;
            }
        }
        RepositoryError::Database(err)
    }
}

pub type RepoResult<T> = Result<T, RepositoryError>;

/// Repository Trait
///
/// The document accessors. Every read projects out password hashes; every write
/// stamps `updated_at` with the current time at this boundary.
///
/// **Send + Sync + async_trait** make `Arc<dyn Repository>` shareable across
/// Axum's task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Colleges ---
    async fn get_college(&self, id: Uuid) -> RepoResult<Option<College>>;
    async fn list_colleges(&self) -> RepoResult<Vec<College>>;
    async fn insert_college(&self, college: NewCollege) -> RepoResult<College>;

    // --- Admins ---
    async fn get_admin(&self, id: Uuid) -> RepoResult<Option<Admin>>;
    // Lookup by normalized email.
    async fn find_admin_by_email(&self, email: &str) -> RepoResult<Option<Admin>>;
    // Fails with `Conflict` when the email or admin code is taken.
    async fn create_admin(&self, admin: NewAdmin) -> RepoResult<Admin>;
    async fn update_admin(&self, id: Uuid, changes: UpdateAdminRequest)
    -> RepoResult<Option<Admin>>;

    // --- Audits ---
    async fn get_audit(&self, college_id: Uuid) -> RepoResult<Option<AuditDocument>>;
    /// Replaces one section of the college's audit wholesale, creating the audit
    /// document on first save.
    async fn save_audit_section(
        &self,
        college_id: Uuid,
        section: AuditSection,
        data: Map<String, Value>,
    ) -> RepoResult<AuditDocument>;

    /// Releases the underlying connection handle. Called once on shutdown.
    async fn close(&self) {}
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

const COLLEGE_COLUMNS: &str =
    "id, email, college_name, college_code, address, role, created_at, updated_at";
const ADMIN_COLUMNS: &str = "id, email, name, admin_code, role, created_at, updated_at";

/// PostgresRepository
///
/// The document store backed by PostgreSQL. Collections are tables; free-form
/// audit sections live in a JSONB column.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens the pool and applies pending migrations.
    pub async fn connect(db_url: &str, config: &AppConfig) -> RepoResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .connect(db_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("document store migrations applied");

        Ok(Self::new(pool))
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn get_college(&self, id: Uuid) -> RepoResult<Option<College>> {
        let query = format!("SELECT {COLLEGE_COLUMNS} FROM colleges WHERE id = $1");
        let college = sqlx::query_as::<_, College>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(college)
    }

    async fn list_colleges(&self) -> RepoResult<Vec<College>> {
        let query = format!("SELECT {COLLEGE_COLUMNS} FROM colleges ORDER BY college_name ASC");
        let colleges = sqlx::query_as::<_, College>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(colleges)
    }

    async fn insert_college(&self, college: NewCollege) -> RepoResult<College> {
        let now = Utc::now();
        let query = format!(
            "INSERT INTO colleges (id, email, password, college_name, college_code, address, role, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8) RETURNING {COLLEGE_COLUMNS}"
        );
        let created = sqlx::query_as::<_, College>(&query)
            .bind(Uuid::new_v4())
            .bind(normalize_email(&college.email))
            .bind(college.password_hash)
            .bind(college.college_name.trim())
            .bind(college.college_code.trim())
            .bind(college.address)
            .bind(Role::College.as_str())
            .bind(now)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn get_admin(&self, id: Uuid) -> RepoResult<Option<Admin>> {
        let query = format!("SELECT {ADMIN_COLUMNS} FROM admins WHERE id = $1");
        let admin = sqlx::query_as::<_, Admin>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(admin)
    }

    async fn find_admin_by_email(&self, email: &str) -> RepoResult<Option<Admin>> {
        let query = format!("SELECT {ADMIN_COLUMNS} FROM admins WHERE email = $1");
        let admin = sqlx::query_as::<_, Admin>(&query)
            .bind(normalize_email(email))
            .fetch_optional(&self.pool)
            .await?;
        Ok(admin)
    }

    async fn create_admin(&self, admin: NewAdmin) -> RepoResult<Admin> {
        let now = Utc::now();
        let query = format!(
            "INSERT INTO admins (id, email, password, name, admin_code, role, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $7) RETURNING {ADMIN_COLUMNS}"
        );
        let created = sqlx::query_as::<_, Admin>(&query)
            .bind(Uuid::new_v4())
            .bind(normalize_email(&admin.email))
            .bind(admin.password_hash)
            .bind(admin.name.trim())
            .bind(admin.admin_code.trim())
            .bind(Role::Admin.as_str())
            .bind(now)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    /// Partial update; `COALESCE` keeps columns whose field is `None`.
    async fn update_admin(
        &self,
        id: Uuid,
        changes: UpdateAdminRequest,
    ) -> RepoResult<Option<Admin>> {
        let query = format!(
            "UPDATE admins SET name = COALESCE($2, name), updated_at = $3 \
             WHERE id = $1 RETURNING {ADMIN_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Admin>(&query)
            .bind(id)
            .bind(changes.name.as_deref().map(str::trim))
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await?;
        Ok(updated)
    }

    async fn get_audit(&self, college_id: Uuid) -> RepoResult<Option<AuditDocument>> {
        let audit = sqlx::query_as::<_, AuditDocument>(
            "SELECT college_id, sections, created_at, updated_at FROM audits WHERE college_id = $1",
        )
        .bind(college_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(audit)
    }

    /// Upsert: `||` on JSONB overwrites only the top-level key of this section.
    async fn save_audit_section(
        &self,
        college_id: Uuid,
        section: AuditSection,
        data: Map<String, Value>,
    ) -> RepoResult<AuditDocument> {
        let audit = sqlx::query_as::<_, AuditDocument>(
            r#"
            INSERT INTO audits (college_id, sections, created_at, updated_at)
            VALUES ($1, jsonb_build_object($2::text, $3::jsonb), $4, $4)
            ON CONFLICT (college_id) DO UPDATE
            SET sections = audits.sections || jsonb_build_object($2::text, $3::jsonb),
                updated_at = $4
            RETURNING college_id, sections, created_at, updated_at
            "#,
        )
        .bind(college_id)
        .bind(section.as_str())
        .bind(Json(data))
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(audit)
    }

    async fn close(&self) {
        self.pool.close().await;
        tracing::info!("document store connection pool closed");
    }
}

// --- In-Memory Store ---

#[derive(Default)]
struct MemoryCollections {
    admins: HashMap<Uuid, Admin>,
    colleges: HashMap<Uuid, College>,
    audits: HashMap<Uuid, AuditDocument>,
}

/// MemoryRepository
///
/// An in-process document store with the same uniqueness and projection rules as
/// `PostgresRepository`. Password hashes are accepted on insert and dropped, since
/// no read may return them. Used for local runs without `DATABASE_URL` and in tests;
/// `set_available(false)` makes every call fail as if the store were unreachable.
#[derive(Default)]
pub struct MemoryRepository {
    collections: RwLock<MemoryCollections>,
    unavailable: AtomicBool,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    fn check_available(&self) -> RepoResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(RepositoryError::Unavailable)
        } else {
            Ok(())
        }
    }

    fn now() -> DateTime<Utc> {
        Utc::now()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn get_college(&self, id: Uuid) -> RepoResult<Option<College>> {
        self.check_available()?;
        Ok(self.collections.read().await.colleges.get(&id).cloned())
    }

    async fn list_colleges(&self) -> RepoResult<Vec<College>> {
        self.check_available()?;
        let mut colleges: Vec<College> = self
            .collections
            .read()
            .await
            .colleges
            .values()
            .cloned()
            .collect();
        colleges.sort_by(|a, b| a.college_name.cmp(&b.college_name));
        Ok(colleges)
    }

    async fn insert_college(&self, college: NewCollege) -> RepoResult<College> {
        self.check_available()?;
        let mut collections = self.collections.write().await;

        let email = normalize_email(&college.email);
        let college_code = college.college_code.trim().to_string();
        if collections.colleges.values().any(|c| c.email == email) {
            return Err(RepositoryError::Conflict(DUPLICATE_COLLEGE_EMAIL.to_string()));
        }
        if collections
            .colleges
            .values()
            .any(|c| c.college_code == college_code)
        {
            return Err(RepositoryError::Conflict(DUPLICATE_COLLEGE_CODE.to_string()));
        }

        let now = Self::now();
        let record = College {
            id: Uuid::new_v4(),
            email,
            college_name: college.college_name.trim().to_string(),
            college_code,
            address: college.address,
            role: Role::College,
            created_at: now,
            updated_at: now,
        };
        collections.colleges.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_admin(&self, id: Uuid) -> RepoResult<Option<Admin>> {
        self.check_available()?;
        Ok(self.collections.read().await.admins.get(&id).cloned())
    }

    async fn find_admin_by_email(&self, email: &str) -> RepoResult<Option<Admin>> {
        self.check_available()?;
        let email = normalize_email(email);
        Ok(self
            .collections
            .read()
            .await
            .admins
            .values()
            .find(|a| a.email == email)
            .cloned())
    }

    async fn create_admin(&self, admin: NewAdmin) -> RepoResult<Admin> {
        self.check_available()?;
        let mut collections = self.collections.write().await;

        let email = normalize_email(&admin.email);
        let admin_code = admin.admin_code.trim().to_string();
        if collections.admins.values().any(|a| a.email == email) {
            return Err(RepositoryError::Conflict(DUPLICATE_ADMIN_EMAIL.to_string()));
        }
        if collections.admins.values().any(|a| a.admin_code == admin_code) {
            return Err(RepositoryError::Conflict(DUPLICATE_ADMIN_CODE.to_string()));
        }

        let now = Self::now();
        let record = Admin {
            id: Uuid::new_v4(),
            email,
            name: admin.name.trim().to_string(),
            admin_code,
            role: Role::Admin,
            created_at: now,
            updated_at: now,
        };
        collections.admins.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update_admin(
        &self,
        id: Uuid,
        changes: UpdateAdminRequest,
    ) -> RepoResult<Option<Admin>> {
        self.check_available()?;
        let mut collections = self.collections.write().await;

        let Some(admin) = collections.admins.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            admin.name = name.trim().to_string();
        }
        admin.updated_at = Self::now();
        Ok(Some(admin.clone()))
    }

    async fn get_audit(&self, college_id: Uuid) -> RepoResult<Option<AuditDocument>> {
        self.check_available()?;
        Ok(self.collections.read().await.audits.get(&college_id).cloned())
    }

    async fn save_audit_section(
        &self,
        college_id: Uuid,
        section: AuditSection,
        data: Map<String, Value>,
    ) -> RepoResult<AuditDocument> {
        self.check_available()?;
        let mut collections = self.collections.write().await;

        if !collections.colleges.contains_key(&college_id) {
            return Err(RepositoryError::MissingReference);
        }

        let now = Self::now();
        let audit = collections.audits.entry(college_id).or_insert_with(|| AuditDocument {
            created_at: Some(now),
            ..AuditDocument::empty(college_id)
        });
        audit
            .sections
            .insert(section.as_str().to_string(), Value::Object(data));
        audit.updated_at = Some(now);
        Ok(audit.clone())
    }
}
