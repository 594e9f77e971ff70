//! First-start checks and seed-administrator creation.

use std::sync::Arc;

use tracing::info;

use auth::store::UserStore;
use desk_core::{new_id, now_rfc3339, Role};

use crate::config::ServerConfig;

/// Verify server configuration is ready for use.
pub fn verify_config(config: &ServerConfig) -> anyhow::Result<()> {
    if config.jwt.secret.is_empty() {
        anyhow::bail!("JWT secret is empty in configuration.");
    }
    if config.admin.password_hash.is_empty() {
        anyhow::bail!(
            "No administrator password hash found in configuration.\n\
             Hash a password and set [admin] password_hash first."
        );
    }
    if config.storage.data_dir.is_empty() {
        anyhow::bail!("Storage data_dir is empty in configuration.");
    }
    Ok(())
}

/// Ensure the seed administrator account exists. Creates it from the
/// configured hash if missing; an existing account is left untouched.
pub fn ensure_admin(users: &Arc<UserStore>, config: &ServerConfig) -> anyhow::Result<()> {
    let username = &config.admin.username;

    if users
        .get_by_username(username)
        .map_err(|e| anyhow::anyhow!("admin lookup: {e}"))?
        .is_some()
    {
        info!(username, "administrator account already exists");
        return Ok(());
    }

    users
        .create(&auth::model::User {
            id: new_id(),
            username: username.clone(),
            name: "Administrator".to_string(),
            role: Role::Admin,
            school_code: None,
            password_hash: config.admin.password_hash.clone(),
            active: true,
            created_at: now_rfc3339(),
        })
        .map_err(|e| anyhow::anyhow!("creating administrator account: {e}"))?;

    info!(username, "created administrator account");
    Ok(())
}
