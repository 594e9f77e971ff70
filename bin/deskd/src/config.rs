//! Server configuration, loaded from a TOML file.
//!
//! A bare name resolves to `/etc/schooldesk/<name>.toml`; anything
//! containing `/` or `.` is treated as a literal path.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Server-side configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub jwt: JwtConfig,
    pub admin: AdminConfig,
    pub storage: StorageConfig,
}

/// JWT signing settings.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    #[serde(default = "default_expire_secs")]
    pub expire_secs: i64,
}

/// Seed administrator account, created on first start.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    #[serde(default = "default_admin_username")]
    pub username: String,
    /// Argon2 PHC hash of the administrator password.
    pub password_hash: String,
}

/// Storage locations.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
}

fn default_expire_secs() -> i64 {
    3600
}

fn default_admin_username() -> String {
    "admin".to_string()
}

impl ServerConfig {
    /// Resolve a context name or path to a config file path.
    pub fn resolve_path(name_or_path: &str) -> PathBuf {
        if name_or_path.contains('/') || name_or_path.contains('.') {
            PathBuf::from(name_or_path)
        } else {
            PathBuf::from(format!("/etc/schooldesk/{name_or_path}.toml"))
        }
    }

    /// Load configuration from disk.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("reading {}: {e}", path.display()))?;
        let config: ServerConfig = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("parsing {}: {e}", path.display()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_name_vs_path() {
        assert_eq!(
            ServerConfig::resolve_path("prod"),
            PathBuf::from("/etc/schooldesk/prod.toml")
        );
        assert_eq!(
            ServerConfig::resolve_path("./local.toml"),
            PathBuf::from("./local.toml")
        );
    }

    #[test]
    fn load_minimal_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.toml");
        std::fs::write(
            &path,
            r#"
[jwt]
secret = "s3cret"

[admin]
password_hash = "$argon2id$v=19$fake"

[storage]
data_dir = "/var/lib/schooldesk"
"#,
        )
        .unwrap();

        let config = ServerConfig::load(&path).unwrap();
        assert_eq!(config.jwt.expire_secs, 3600);
        assert_eq!(config.admin.username, "admin");
        assert_eq!(config.storage.data_dir, "/var/lib/schooldesk");
    }
}
