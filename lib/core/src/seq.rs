//! Human-readable identifier generators for tickets and public requests.
//!
//! These are timestamp-plus-random codes, not store-backed counters:
//! collisions are accepted as negligible and no uniqueness check is made
//! against the database. Batch numbers are the exception — they are strictly
//! sequential per day and live in the dispatch module, reserved against the
//! store.

use rand::Rng;

/// Which kind of public request a number is being generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// New account request (`REQ-` prefix).
    Account,
    /// Credential reset request (`RST-` prefix).
    Reset,
}

impl RequestKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Account => "REQ-",
            Self::Reset => "RST-",
        }
    }
}

/// Generate a ticket number: `TKT-{unix_millis}-{random 000-999}`.
pub fn ticket_number() -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let suffix: u32 = rand::thread_rng().gen_range(0..1000);
    format!("TKT-{millis}-{suffix:03}")
}

/// Generate an account/reset request number.
///
/// Shape: prefix + 3 random uppercase letters + the trailing 6 digits of the
/// current unix-millis timestamp + a 2-digit random suffix,
/// e.g. `REQ-QXZ48392017`.
pub fn request_number(kind: RequestKind) -> String {
    let mut rng = rand::thread_rng();
    let letters: String = (0..3)
        .map(|_| (b'A' + rng.gen_range(0..26)) as char)
        .collect();
    let millis = chrono::Utc::now().timestamp_millis();
    let tail = millis.rem_euclid(1_000_000);
    let suffix: u32 = rng.gen_range(0..100);
    format!("{}{letters}{tail:06}{suffix:02}", kind.prefix())
}
