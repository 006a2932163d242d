use tracing::{info, instrument, warn};

use super::{
    dto::{AddUserForm, EditUserForm, UserListItem},
    password::PasswordScheme,
    repo,
    repo_types::{NewUser, UserChanges, UserRecord},
};
use crate::{error::AppError, state::AppState};

/// Drops the field when it is absent or only whitespace. A present value is
/// kept exactly as submitted.
fn present(field: Option<String>) -> Option<String> {
    field.filter(|v| !v.trim().is_empty())
}

fn parse_age(raw: &str) -> Result<Option<i32>, AppError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<i32>()
        .map(Some)
        .map_err(|_| AppError::InvalidField("age must be an integer".into()))
}

impl NewUser {
    pub fn from_form(form: AddUserForm, scheme: PasswordScheme) -> Result<Self, AppError> {
        let (Some(username), Some(email), Some(password)) = (
            present(form.username),
            present(form.email),
            form.password.filter(|p| !p.is_empty()),
        ) else {
            return Err(AppError::MissingFields(
                "username, email and password are required",
            ));
        };
        let age = match form.age.as_deref() {
            Some(raw) => parse_age(raw)?,
            None => None,
        };
        Ok(Self {
            username,
            email,
            password_hash: scheme.hash(&password)?,
            age,
        })
    }
}

impl UserChanges {
    pub fn from_form(form: EditUserForm, scheme: PasswordScheme) -> Result<Self, AppError> {
        let (Some(username), Some(email)) = (present(form.username), present(form.email)) else {
            return Err(AppError::MissingFields("username and email are required"));
        };
        let age = form.age.as_deref().map(parse_age).transpose()?;
        let password_hash = form
            .password
            .filter(|p| !p.is_empty())
            .map(|p| scheme.hash(&p))
            .transpose()?;
        let is_active = form.is_active.map(|flag| flag == "true");
        Ok(Self {
            username,
            email,
            age,
            password_hash,
            is_active,
        })
    }
}

#[instrument(skip(state))]
pub async fn list_users(state: &AppState) -> Result<Vec<UserListItem>, AppError> {
    let mut session = state.store.open().await?;
    let result = repo::list_users(&mut session).await;
    let rows = session.finish(result).await?;
    Ok(rows.into_iter().map(UserListItem::from).collect())
}

#[instrument(skip(state, form))]
pub async fn add_user(state: &AppState, form: AddUserForm) -> Result<i64, AppError> {
    let user = NewUser::from_form(form, state.config.password_scheme)?;
    let mut session = state.store.open().await?;
    let result = repo::insert_user(&mut session, &user).await;
    let user_id = session.finish(result).await?;
    info!(user_id, username = %user.username, "user added");
    Ok(user_id)
}

#[instrument(skip(state))]
pub async fn toggle_active(state: &AppState, user_id: i64) -> Result<(), AppError> {
    let mut session = state.store.open().await?;
    let result = repo::toggle_active(&mut session, user_id).await;
    let rows = session.finish(result).await?;
    if rows == 0 {
        warn!(user_id, "toggle matched no user");
    }
    Ok(())
}

#[instrument(skip(state))]
pub async fn get_user(state: &AppState, user_id: i64) -> Result<UserRecord, AppError> {
    let mut session = state.store.open().await?;
    let result = repo::find_user(&mut session, user_id).await;
    session.finish(result).await?.ok_or(AppError::NotFound)
}

#[instrument(skip(state, form))]
pub async fn edit_user(state: &AppState, user_id: i64, form: EditUserForm) -> Result<(), AppError> {
    let changes = UserChanges::from_form(form, state.config.password_scheme)?;
    let mut session = state.store.open().await?;
    let result = repo::update_user(&mut session, user_id, &changes).await;
    let rows = session.finish(result).await?;
    if rows == 0 {
        warn!(user_id, "edit matched no user");
    } else {
        info!(user_id, "user updated");
    }
    Ok(())
}

#[instrument(skip(state))]
pub async fn delete_user(state: &AppState, user_id: i64) -> Result<(), AppError> {
    let mut session = state.store.open().await?;
    let result = repo::delete_user(&mut session, user_id).await;
    let rows = session.finish(result).await?;
    if rows == 0 {
        warn!(user_id, "delete matched no user");
    } else {
        info!(user_id, "user deleted");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::password::sha256_hex;

    fn add_form(username: &str, email: &str, password: &str, age: Option<&str>) -> AddUserForm {
        AddUserForm {
            username: Some(username.into()),
            email: Some(email.into()),
            password: Some(password.into()),
            age: age.map(Into::into),
        }
    }

    #[test]
    fn new_user_hashes_the_password() {
        let user = NewUser::from_form(
            add_form("alice", "a@x.com", "secret", Some("30")),
            PasswordScheme::Sha256,
        )
        .unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.age, Some(30));
        assert_eq!(user.password_hash, sha256_hex("secret"));
        assert_ne!(user.password_hash, "secret");
    }

    #[test]
    fn new_user_requires_all_three_fields() {
        for form in [
            add_form("", "a@x.com", "secret", None),
            add_form("alice", "   ", "secret", None),
            add_form("alice", "a@x.com", "", None),
            AddUserForm::default(),
        ] {
            let err = NewUser::from_form(form, PasswordScheme::Sha256).unwrap_err();
            assert!(matches!(err, AppError::MissingFields(_)));
        }
    }

    #[test]
    fn blank_age_is_null_and_junk_age_is_rejected() {
        let user =
            NewUser::from_form(add_form("a", "b", "c", Some("")), PasswordScheme::Sha256).unwrap();
        assert_eq!(user.age, None);

        let err = NewUser::from_form(add_form("a", "b", "c", Some("thirty")), PasswordScheme::Sha256)
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidField(_)));
    }

    #[test]
    fn edit_only_carries_supplied_fields() {
        let changes = UserChanges::from_form(
            EditUserForm {
                username: Some("alice".into()),
                email: Some("a@x.com".into()),
                ..Default::default()
            },
            PasswordScheme::Sha256,
        )
        .unwrap();
        assert_eq!(changes.age, None);
        assert_eq!(changes.password_hash, None);
        assert_eq!(changes.is_active, None);
    }

    #[test]
    fn edit_coerces_flags_and_rehashes() {
        let changes = UserChanges::from_form(
            EditUserForm {
                username: Some("alice".into()),
                email: Some("a@x.com".into()),
                age: Some("".into()),
                password: Some("n3w".into()),
                is_active: Some("yes".into()),
            },
            PasswordScheme::Sha256,
        )
        .unwrap();
        assert_eq!(changes.age, Some(None));
        assert_eq!(changes.password_hash.as_deref(), Some(sha256_hex("n3w").as_str()));
        assert_eq!(changes.is_active, Some(false));

        let active = UserChanges::from_form(
            EditUserForm {
                username: Some("alice".into()),
                email: Some("a@x.com".into()),
                is_active: Some("true".into()),
                ..Default::default()
            },
            PasswordScheme::Sha256,
        )
        .unwrap();
        assert_eq!(active.is_active, Some(true));
    }

    #[test]
    fn submitted_text_is_stored_verbatim() {
        let user = NewUser::from_form(
            add_form(" alice ", "a@x.com ", "secret", None),
            PasswordScheme::Sha256,
        )
        .unwrap();
        assert_eq!(user.username, " alice ");
        assert_eq!(user.email, "a@x.com ");

        let changes = UserChanges::from_form(
            EditUserForm {
                username: Some("bob\t".into()),
                email: Some(" b@x.com".into()),
                ..Default::default()
            },
            PasswordScheme::Sha256,
        )
        .unwrap();
        assert_eq!(changes.username, "bob\t");
        assert_eq!(changes.email, " b@x.com");
    }

    #[test]
    fn edit_requires_username_and_email() {
        let err = UserChanges::from_form(
            EditUserForm {
                username: Some("alice".into()),
                ..Default::default()
            },
            PasswordScheme::Sha256,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::MissingFields(_)));
    }
}
