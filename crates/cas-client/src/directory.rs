//! Downstream directory interface.
//!
//! Deployments usually pair CAS with an internal service that knows a
//! user's roles, permissions and department. The client only carries the
//! seam; implementations live with the deployment.

use async_trait::async_trait;
use cas_protocol::AuthenticationResponse;
use serde::{Deserialize, Serialize};

use crate::error::ClientResult;

/// A role assigned to the authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Role identifier.
    pub id: i64,
    /// Display name.
    pub name: String,
}

/// A permission granted through a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    /// Permission identifier.
    pub id: i64,
    /// Machine-readable code.
    pub code: String,
    /// Display name.
    pub name: String,
}

/// Directory information about a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    /// User identifier.
    pub user_id: i64,
    /// Display name.
    pub name: String,
    /// E-mail address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Department name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

/// Role, permission and user lookups for authenticated users.
///
/// Implementations should map their failures to
/// [`ClientError::Directory`](crate::ClientError::Directory).
#[async_trait]
pub trait DirectoryService: Send + Sync {
    /// Lists the roles of the authenticated user.
    async fn roles(&self, principal: &AuthenticationResponse) -> ClientResult<Vec<Role>>;

    /// Lists the permissions the user holds through `role_id`.
    async fn permissions(
        &self,
        principal: &AuthenticationResponse,
        role_id: i64,
    ) -> ClientResult<Vec<Permission>>;

    /// Looks up a user.
    async fn user_info(&self, user_id: i64) -> ClientResult<UserInfo>;
}
