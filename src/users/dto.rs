use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{Role, User};

/// Sign-in sync body. Accepts the identity provider's camelCase names too.
#[derive(Debug, Deserialize)]
pub struct SyncUserRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default, alias = "displayName")]
    pub display_name: String,
    #[serde(default, alias = "photoURL")]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SyncUserResponse {
    pub acknowledged: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inserted_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Public part of the user returned to clients.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub photo_url: String,
    pub role: Role,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            display_name: u.display_name,
            photo_url: u.photo_url,
            role: u.role,
            created_at: u.created_at,
        }
    }
}
