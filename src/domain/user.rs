use serde::{Deserialize, Serialize};

/// A person allowed to trigger actions by mailing the account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthorizedUser {
    pub name: String,
    pub emails: Vec<String>,
}
