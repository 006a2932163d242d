use tracing::instrument;

use super::repo_types::{NewUser, UserChanges, UserRecord, UserRow};
use crate::{
    db::Session,
    error::StoreError,
    query::{Column, Delete, Insert, Order, Select, Update},
};

/// All users, newest first.
#[instrument(skip(session))]
pub async fn list_users(session: &mut Session) -> Result<Vec<UserRow>, StoreError> {
    let select = Select::columns(&UserRow::COLUMNS).order_by(Column::CreatedAt, Order::Desc);
    session.fetch_all(&select).await
}

#[instrument(skip(session))]
pub async fn find_user(session: &mut Session, user_id: i64) -> Result<Option<UserRecord>, StoreError> {
    let select = Select::columns(&UserRecord::COLUMNS).filter_eq(Column::UserId, user_id);
    session.fetch_one(&select).await
}

/// Inserts a user and returns the store-generated id.
#[instrument(skip(session, user), fields(username = %user.username))]
pub async fn insert_user(session: &mut Session, user: &NewUser) -> Result<i64, StoreError> {
    let insert = Insert::new()
        .value(Column::Username, user.username.as_str())
        .value(Column::Email, user.email.as_str())
        .value(Column::PasswordHash, user.password_hash.as_str())
        .value(Column::Age, user.age);
    session.execute_insert(&insert).await
}

#[instrument(skip(session))]
pub async fn toggle_active(session: &mut Session, user_id: i64) -> Result<u64, StoreError> {
    let update = Update::filter_eq(Column::UserId, user_id)
        .negate(Column::IsActive)
        .touch(Column::UpdatedAt);
    session.execute_update(&update).await
}

#[instrument(skip(session, changes), fields(username = %changes.username))]
pub async fn update_user(
    session: &mut Session,
    user_id: i64,
    changes: &UserChanges,
) -> Result<u64, StoreError> {
    session.execute_update(&edit_command(user_id, changes)).await
}

#[instrument(skip(session))]
pub async fn delete_user(session: &mut Session, user_id: i64) -> Result<u64, StoreError> {
    session
        .execute_delete(&Delete::filter_eq(Column::UserId, user_id))
        .await
}

fn edit_command(user_id: i64, changes: &UserChanges) -> Update {
    let mut update = Update::filter_eq(Column::UserId, user_id)
        .set(Column::Username, changes.username.as_str())
        .set(Column::Email, changes.email.as_str());
    if let Some(age) = changes.age {
        update = update.set(Column::Age, age);
    }
    if let Some(hash) = &changes.password_hash {
        update = update.set(Column::PasswordHash, hash.as_str());
    }
    if let Some(active) = changes.is_active {
        update = update.set(Column::IsActive, active);
    }
    update.touch(Column::UpdatedAt)
}
