use axum::{
    extract::State,
    response::Html,
    routing::{get, post},
    Form, Json, Router,
};
use askama::Template;
use tracing::instrument;

use super::{
    dto::{AddUserForm, EditUserForm, MessageResponse, UserListItem},
    extractors::UserIdPath,
    repo_types::UserRecord,
    services,
    view::IndexPage,
};
use crate::{error::AppError, state::AppState};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/api/users", get(list_users))
        .route("/add_user", post(add_user))
        .route("/toggle_active/:user_id", post(toggle_active))
        .route("/get_user/:user_id", get(get_user))
        .route("/edit_user/:user_id", post(edit_user))
        .route("/delete_user/:user_id", post(delete_user))
}

#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let users = services::list_users(&state).await?;
    let page = IndexPage { users }
        .render()
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(Html(page))
}

#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserListItem>>, AppError> {
    Ok(Json(services::list_users(&state).await?))
}

#[instrument(skip(state, form))]
pub async fn add_user(
    State(state): State<AppState>,
    Form(form): Form<AddUserForm>,
) -> Result<Json<MessageResponse>, AppError> {
    services::add_user(&state, form).await?;
    Ok(Json(MessageResponse::new("user added")))
}

#[instrument(skip(state))]
pub async fn toggle_active(
    State(state): State<AppState>,
    UserIdPath(user_id): UserIdPath,
) -> Result<Json<MessageResponse>, AppError> {
    services::toggle_active(&state, user_id).await?;
    Ok(Json(MessageResponse::new("status updated")))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    UserIdPath(user_id): UserIdPath,
) -> Result<Json<UserRecord>, AppError> {
    Ok(Json(services::get_user(&state, user_id).await?))
}

#[instrument(skip(state, form))]
pub async fn edit_user(
    State(state): State<AppState>,
    UserIdPath(user_id): UserIdPath,
    Form(form): Form<EditUserForm>,
) -> Result<Json<MessageResponse>, AppError> {
    services::edit_user(&state, user_id, form).await?;
    Ok(Json(MessageResponse::new("user updated")))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    UserIdPath(user_id): UserIdPath,
) -> Result<Json<MessageResponse>, AppError> {
    services::delete_user(&state, user_id).await?;
    Ok(Json(MessageResponse::new("user deleted")))
}
