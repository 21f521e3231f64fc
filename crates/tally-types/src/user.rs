use crate::error::{Result, TallyError};
use crate::id::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Member,
}

impl Role {
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

/// Authenticated actor as supplied by the identity layer.
///
/// The core trusts this input; authorization is a capability check on the
/// role, not per-field branching in the operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: UserId,
    pub role: Role,
}

impl Actor {
    pub fn admin(user_id: UserId) -> Self {
        Self {
            user_id,
            role: Role::Admin,
        }
    }

    pub fn member(user_id: UserId) -> Self {
        Self {
            user_id,
            role: Role::Member,
        }
    }

    pub fn ensure_admin(&self) -> Result<()> {
        if self.role.is_admin() {
            Ok(())
        } else {
            Err(TallyError::Forbidden("admin access required".to_string()))
        }
    }

    /// Owner check for user-scoped resources. Admins are not exempt: an
    /// assignment is completed by the person it belongs to, nobody else.
    pub fn ensure_owner(&self, owner: UserId) -> Result<()> {
        if self.user_id == owner {
            Ok(())
        } else {
            Err(TallyError::Forbidden(format!(
                "user {} does not own this resource",
                self.user_id
            )))
        }
    }

    /// Admins may act on any user's data; members only on their own.
    pub fn ensure_self_or_admin(&self, subject: UserId) -> Result<()> {
        if self.role.is_admin() || self.user_id == subject {
            Ok(())
        } else {
            Err(TallyError::Forbidden("access denied".to_string()))
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub role: Role,
    /// Current credit balance. May go negative; there is no floor.
    pub balance: i64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Insert record; the store assigns the id and creation timestamp.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub role: Role,
    pub balance: i64,
    pub active: bool,
}

impl NewUser {
    pub fn new(name: impl Into<String>, role: Role) -> Self {
        Self {
            name: name.into(),
            role,
            balance: 0,
            active: true,
        }
    }
}
