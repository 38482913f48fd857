//! File-backed user directory and the credential verifier the session gate
//! delegates to. Passwords are stored as argon2id PHC strings; records live
//! in one JSON document under the data root.

use anyhow::{anyhow, Result};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use password_hash::{PasswordHash, SaltString};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::session::{AuthError, CredentialVerifier, Role, VerifiedAccount};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub username: String,
    pub display_name: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: i64,
}

fn users_path(data_root: &str) -> PathBuf {
    Path::new(data_root).join("users.json")
}

fn hash_password(password: &str) -> Result<String> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes).map_err(|e| anyhow!(e.to_string()))?;
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| anyhow!(e.to_string()))?;
    let argon2 = Argon2::default();
    let phc = argon2.hash_password(password.as_bytes(), &salt).map_err(|e| anyhow!(e.to_string()))?.to_string();
    Ok(phc)
}

fn verify_password(hash: &str, password: &str) -> bool {
    if let Ok(parsed) = PasswordHash::new(hash) {
        let argon2 = Argon2::default();
        argon2.verify_password(password.as_bytes(), &parsed).is_ok()
    } else { false }
}

fn read_users(path: &Path) -> Result<Vec<UserRecord>> {
    if !path.exists() { return Ok(Vec::new()); }
    let bytes = std::fs::read(path)?;
    let users: Vec<UserRecord> = serde_json::from_slice(&bytes)?;
    Ok(users)
}

fn write_users(path: &Path, users: &[UserRecord]) -> Result<()> {
    if let Some(dir) = path.parent() { std::fs::create_dir_all(dir).ok(); }
    let bytes = serde_json::to_vec_pretty(users)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(tmp, path)?;
    Ok(())
}

/// Seed one demo account per role on first start. Existing directories are
/// left untouched.
pub fn ensure_default_users(data_root: &str) -> Result<()> {
    let p = users_path(data_root);
    if p.exists() { return Ok(()); }
    let now_ms = chrono::Utc::now().timestamp_millis();
    let mut users = Vec::new();
    for role in Role::ALL {
        users.push(UserRecord {
            username: format!("{}@demo.com", role.as_str()),
            display_name: role.display_name().to_string(),
            password_hash: hash_password("demo123")?,
            role,
            created_at: now_ms,
        });
    }
    write_users(&p, &users)
}

/// Add or replace a user record.
pub fn add_user(data_root: &str, username: &str, display_name: &str, password: &str, role: Role) -> Result<()> {
    let p = users_path(data_root);
    let mut users = read_users(&p)?;
    users.retain(|u| u.username != username);
    users.push(UserRecord {
        username: username.to_string(),
        display_name: display_name.to_string(),
        password_hash: hash_password(password)?,
        role,
        created_at: chrono::Utc::now().timestamp_millis(),
    });
    write_users(&p, &users)
}

pub fn delete_user(data_root: &str, username: &str) -> Result<()> {
    let p = users_path(data_root);
    let mut users = read_users(&p)?;
    users.retain(|u| u.username != username);
    write_users(&p, &users)
}

/// Verify a username/password pair against the directory. Returns the
/// matched record on success, None on unknown user or wrong password.
pub fn authenticate(data_root: &str, username: &str, password: &str) -> Result<Option<UserRecord>> {
    let users = read_users(&users_path(data_root))?;
    for user in users {
        if user.username == username {
            if verify_password(&user.password_hash, password) {
                return Ok(Some(user));
            }
            return Ok(None);
        }
    }
    Ok(None)
}

/// The production `CredentialVerifier`: blocking directory lookup moved off
/// the async runtime's worker threads.
pub struct DirectoryVerifier {
    pub data_root: String,
}

impl DirectoryVerifier {
    pub fn new(data_root: impl Into<String>) -> Self {
        Self { data_root: data_root.into() }
    }
}

impl CredentialVerifier for DirectoryVerifier {
    fn verify<'a>(&'a self, username: &'a str, secret: &'a str)
        -> BoxFuture<'a, Result<VerifiedAccount, AuthError>> {
        let data_root = self.data_root.clone();
        let username = username.to_string();
        let secret = secret.to_string();
        async move {
            let looked_up = tokio::task::spawn_blocking(move || {
                authenticate(&data_root, &username, &secret)
            })
            .await
            .map_err(|e| AuthError::VerifierUnavailable(e.to_string()))?;
            match looked_up {
                Ok(Some(user)) => Ok(VerifiedAccount { username: user.username, role: user.role }),
                Ok(None) => Err(AuthError::InvalidCredentials),
                Err(e) => Err(AuthError::VerifierUnavailable(e.to_string())),
            }
        }
        .boxed()
    }
}
