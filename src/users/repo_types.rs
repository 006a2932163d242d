use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::query::Column;

/// Row shape of the user listing.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub user_id: i64,
    pub username: String,
    pub email: String,
    pub age: Option<i32>,
    pub created_at: Option<OffsetDateTime>,
    pub updated_at: Option<OffsetDateTime>,
    pub is_active: bool,
}

impl UserRow {
    pub const COLUMNS: [Column; 7] = [
        Column::UserId,
        Column::Username,
        Column::Email,
        Column::Age,
        Column::CreatedAt,
        Column::UpdatedAt,
        Column::IsActive,
    ];
}

/// Single-user lookup; the password hash is deliberately not selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct UserRecord {
    pub user_id: i64,
    pub username: String,
    pub email: String,
    pub age: Option<i32>,
    pub is_active: bool,
}

impl UserRecord {
    pub const COLUMNS: [Column; 5] = [
        Column::UserId,
        Column::Username,
        Column::Email,
        Column::Age,
        Column::IsActive,
    ];
}

/// Validated input for a new row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub age: Option<i32>,
}

/// Validated edit. `age: None` leaves the column alone, `Some(None)` clears it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserChanges {
    pub username: String,
    pub email: String,
    pub age: Option<Option<i32>>,
    pub password_hash: Option<String>,
    pub is_active: Option<bool>,
}
