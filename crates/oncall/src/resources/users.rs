//! Users.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{null_as_default, push_if_set, ListFilter};
use crate::client::OnCallClient;
use crate::error::Result;
use crate::pagination::{paginate, Page};
use crate::transport::Transport;

const USERS_PATH: &str = "users";

/// An OnCall user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub username: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub slack: UserSlackMetadata,
    #[serde(default)]
    pub role: UserRole,
}

/// Slack identity linked to a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSlackMetadata {
    #[serde(default, deserialize_with = "null_as_default")]
    pub user_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub team_id: String,
}

/// Permission level of a user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Observer,
    Admin,
    /// Any role this client does not know.
    #[default]
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Observer => write!(f, "observer"),
            Self::Admin => write!(f, "admin"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Narrows a user listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    /// Only the user with this username.
    pub username: String,
}

impl ListFilter for UserFilter {
    fn query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        push_if_set(&mut query, "username", &self.username);
        query
    }
}

impl<T: Transport> OnCallClient<T> {
    /// Fetch one page of users. `page` is zero-based.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response does not decode.
    pub async fn list_users_page(&self, page: u32, filter: &UserFilter) -> Result<Page<User>> {
        self.get_page(USERS_PATH, page, filter).await
    }

    /// Fetch every user matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns the first page error; no partial list is returned.
    #[instrument(skip(self))]
    pub async fn list_users(&self, filter: &UserFilter) -> Result<Vec<User>> {
        paginate(move |page, filter| self.list_users_page(page, filter), filter).await
    }

    /// Fetch one user.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the user does not exist.
    pub async fn get_user(&self, id: &str) -> Result<User> {
        self.get(&[USERS_PATH, id]).await
    }
}
