use std::sync::Arc;

use jsonwebtoken::{encode, EncodingKey, Header};
use tracing::{info, warn};

use desk_core::{new_id, Clock, ServiceError};

use crate::model::{Claims, LoginRequest, LoginResponse, User};
use crate::password::verify_password;
use crate::store::UserStore;
use crate::throttle::LoginThrottle;

/// JWT signing configuration.
#[derive(Clone)]
pub struct TokenConfig {
    pub secret: String,
    pub expire_secs: i64,
}

/// Authentication service: credential checks, throttling and token issue.
pub struct AuthService {
    store: Arc<UserStore>,
    throttle: LoginThrottle,
    clock: Arc<dyn Clock>,
    token: TokenConfig,
}

impl AuthService {
    pub fn new(store: Arc<UserStore>, clock: Arc<dyn Clock>, token: TokenConfig) -> Self {
        Self {
            store,
            throttle: LoginThrottle::new(Arc::clone(&clock)),
            clock,
            token,
        }
    }

    /// Access the underlying store.
    pub fn store(&self) -> &Arc<UserStore> {
        &self.store
    }

    // =======================================================================
    // Login
    // =======================================================================

    /// Verify credentials and issue a session token.
    ///
    /// Lockout is checked before the password. Unknown usernames are
    /// throttled exactly like wrong passwords, so the responses do not
    /// reveal which usernames exist.
    pub fn authenticate(&self, req: LoginRequest) -> Result<LoginResponse, ServiceError> {
        let username = required(req.username.as_deref(), "username")?;
        let password = required(req.password.as_deref(), "password")?;

        if let Some(retry_after_secs) = self.throttle.check_locked(username) {
            return Err(ServiceError::TooManyAttempts { retry_after_secs });
        }

        let user = match self.store.get_by_username(username)? {
            Some(u) if u.active && verify_password(password, &u.password_hash) => Some(u),
            Some(_) => None,
            None => {
                // Burn a comparable amount of time on unknown accounts so
                // timing does not reveal which usernames exist.
                let _ = verify_password(password, DUMMY_HASH);
                None
            }
        };

        let Some(user) = user else {
            let outcome = self.throttle.record_failure(username);
            warn!(
                username,
                remaining = outcome.remaining_attempts,
                "login failed"
            );
            return Err(ServiceError::InvalidCredentials {
                remaining_attempts: outcome.remaining_attempts,
                retry_after_secs: outcome.retry_after_secs,
            });
        };

        self.throttle.record_success(username);
        let token = self.issue_token(&user)?;

        info!(username = %user.username, role = %user.role.as_str(), "login succeeded");
        Ok(LoginResponse {
            token,
            token_type: "Bearer".to_string(),
            expires_in: self.token.expire_secs,
            username: user.username,
            name: user.name,
            role: user.role,
            school_code: user.school_code,
        })
    }

    fn issue_token(&self, user: &User) -> Result<String, ServiceError> {
        let now = self.clock.now();
        let claims = Claims {
            sub: user.username.clone(),
            name: user.name.clone(),
            role: user.role.as_str().to_string(),
            school_code: user.school_code.clone(),
            sid: new_id(),
            iat: now.timestamp(),
            exp: (now + chrono::Duration::seconds(self.token.expire_secs)).timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.token.secret.as_bytes()),
        )
        .map_err(|e| ServiceError::Internal(format!("JWT encode failed: {e}")))
    }
}

// A real Argon2 hash for a password nobody knows.
const DUMMY_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$MDAwMDAwMDAwMDAwMDAwMA$7d5vq4J3NhB0s0NjYwUL9OlNqvQdO3kL8JcDqP6T2vQ";

fn required<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str, ServiceError> {
    match value {
        Some(s) if !s.trim().is_empty() => Ok(s),
        _ => Err(ServiceError::Validation(format!("missing required field '{field}'"))),
    }
}
