use askama::Template;

use super::dto::UserListItem;

/// The console's landing page: the user table plus add/edit dialogs.
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexPage {
    pub users: Vec<UserListItem>,
}
