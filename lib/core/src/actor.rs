use serde::{Deserialize, Serialize};

/// Role carried in a session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// District administrator — full access.
    Admin,
    /// School account — scoped to its own batches.
    School,
    /// District staff — submits tickets.
    Staff,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::School => "SCHOOL",
            Self::Staff => "STAFF",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "ADMIN" => Some(Self::Admin),
            "SCHOOL" => Some(Self::School),
            "STAFF" => Some(Self::Staff),
            _ => None,
        }
    }
}

/// The authenticated caller, extracted from the session token by the
/// server's auth middleware and stored in request extensions for handlers.
#[derive(Debug, Clone)]
pub struct Actor {
    /// Username the token was issued to.
    pub principal: String,
    pub role: Role,
    /// School scope, set for [`Role::School`] accounts.
    pub school_code: Option<String>,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Whether this actor may act on behalf of the given school.
    /// Admins may; school accounts only for their own school.
    pub fn owns_school(&self, school_code: &str) -> bool {
        match self.role {
            Role::Admin => true,
            Role::School => self.school_code.as_deref() == Some(school_code),
            Role::Staff => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_str_roundtrip() {
        for r in [Role::Admin, Role::School, Role::Staff] {
            assert_eq!(Role::from_str(r.as_str()), Some(r));
        }
        assert_eq!(Role::from_str("ROOT"), None);
    }

    #[test]
    fn school_ownership() {
        let school = Actor {
            principal: "lincoln".into(),
            role: Role::School,
            school_code: Some("LHS".into()),
        };
        assert!(school.owns_school("LHS"));
        assert!(!school.owns_school("WMS"));

        let admin = Actor {
            principal: "it-admin".into(),
            role: Role::Admin,
            school_code: None,
        };
        assert!(admin.owns_school("LHS"));
    }
}
