#![allow(dead_code)]

use audit_portal::{
    AppState,
    auth::Claims,
    config::AppConfig,
    models::{Admin, College, NewAdmin, NewCollege, Role},
    repository::{MemoryRepository, Repository},
};
use axum::{body::Body, response::Response};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::Value;
use std::{sync::Arc, time::SystemTime};
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";

fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
}

/// Signs arbitrary claims with the given secret.
pub fn sign_claims<T: serde::Serialize>(claims: &T, secret: &str) -> String {
    let key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &key).unwrap()
}

/// Token expiring `exp_offset` seconds from now (negative for already expired).
pub fn create_token(id: Uuid, role: Role, exp_offset: i64) -> String {
    let now = now_secs();
    let (name, college_name) = match role {
        Role::Admin => (Some("Ada Admin".to_string()), None),
        Role::College => (None, Some("Test College".to_string())),
    };
    let claims = Claims {
        id,
        email: format!("{}@example.edu", role),
        role,
        name,
        college_name,
        iat: now as usize,
        exp: (now + exp_offset) as usize,
    };
    sign_claims(&claims, TEST_JWT_SECRET)
}

pub fn college_token(id: Uuid) -> String {
    create_token(id, Role::College, 3600)
}

pub fn admin_token(id: Uuid) -> String {
    create_token(id, Role::Admin, 3600)
}

pub fn test_config() -> AppConfig {
    AppConfig {
        jwt_secret: TEST_JWT_SECRET.to_string(),
        ..AppConfig::default()
    }
}

pub fn test_state(repo: Arc<MemoryRepository>) -> AppState {
    AppState::new(repo, test_config())
}

pub async fn seed_college(repo: &MemoryRepository, code: &str) -> College {
    repo.insert_college(NewCollege {
        email: format!("{}@college.edu", code.to_lowercase()),
        password_hash: "$argon2id$stub".to_string(),
        college_name: format!("College {}", code),
        college_code: code.to_string(),
        address: Some("1 Campus Road".to_string()),
    })
    .await
    .unwrap()
}

pub async fn seed_admin(repo: &MemoryRepository, code: &str) -> Admin {
    repo.create_admin(NewAdmin {
        email: format!("{}@admin.edu", code.to_lowercase()),
        password_hash: "$argon2id$stub".to_string(),
        name: format!("Admin {}", code),
        admin_code: code.to_string(),
    })
    .await
    .unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
