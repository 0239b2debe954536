use serde::Deserialize;

/// Compose form for both creating and editing a post. `group` holds the
/// selected group id as a decimal string; empty means no group.
#[derive(Debug, Deserialize)]
pub(crate) struct PostForm {
    pub(super) text: String,
    #[serde(default)]
    pub(super) group: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct NextQuery {
    pub(super) next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginForm {
    pub(super) username: String,
    pub(super) password: String,
    #[serde(default)]
    pub(super) next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SignupForm {
    pub(super) username: String,
    pub(super) password: String,
    pub(super) confirm: String,
}
