use serde::{Deserialize, Serialize};
use time::{macros::format_description, OffsetDateTime};

use super::repo_types::UserRow;

/// `POST /add_user` form body.
#[derive(Debug, Default, Deserialize)]
pub struct AddUserForm {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub age: Option<String>,
}

/// `POST /edit_user/:user_id` form body.
#[derive(Debug, Default, Deserialize)]
pub struct EditUserForm {
    pub username: Option<String>,
    pub email: Option<String>,
    pub age: Option<String>,
    pub password: Option<String>,
    pub is_active: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserListItem {
    pub user_id: i64,
    pub username: String,
    pub email: String,
    pub age: Option<i32>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub is_active: bool,
}

impl From<UserRow> for UserListItem {
    fn from(r: UserRow) -> Self {
        Self {
            user_id: r.user_id,
            username: r.username,
            email: r.email,
            age: r.age,
            created_at: r.created_at.map(format_timestamp),
            updated_at: r.updated_at.map(format_timestamp),
            is_active: r.is_active,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// `YYYY-MM-DD HH:MM:SS`
pub fn format_timestamp(ts: OffsetDateTime) -> String {
    ts.format(format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second]"
    ))
    .unwrap_or_else(|_| ts.to_string())
}
