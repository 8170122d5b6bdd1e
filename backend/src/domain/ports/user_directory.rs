//! Driving port for account administration.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::Error;
use crate::domain::user::{Actor, Role, User, UserId};

/// Account projection returned to administrative callers. The stored
/// password hash is never part of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPayload {
    pub id: UserId,
    pub display_name: String,
    pub email: String,
    pub role: Role,
    pub blocked: bool,
}

impl From<&User> for UserPayload {
    fn from(user: &User) -> Self {
        Self {
            id: user.id().clone(),
            display_name: user.display_name().as_ref().to_owned(),
            email: user.email().as_ref().to_owned(),
            role: user.role(),
            blocked: user.is_blocked(),
        }
    }
}

/// Inputs for registering an account. The password arrives already
/// hashed by the external auth collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserRequest {
    pub display_name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// Account state after a successful registration or mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub user: UserPayload,
}

/// Administrative account listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListUsersResponse {
    pub users: Vec<UserPayload>,
}

/// Port for account registration and administration.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Register a new, unblocked account.
    async fn register_user(&self, request: RegisterUserRequest) -> Result<UserResponse, Error>;

    /// Toggle the blocked flag on an account. Admin only.
    async fn set_user_blocked(
        &self,
        actor: Actor,
        user_id: UserId,
        blocked: bool,
    ) -> Result<UserResponse, Error>;

    /// Every registered account. Admin only.
    async fn list_users(&self, actor: Actor) -> Result<ListUsersResponse, Error>;

    /// Accounts holding the given role. Admin only.
    async fn list_users_by_role(
        &self,
        actor: Actor,
        role: Role,
    ) -> Result<ListUsersResponse, Error>;

    /// Accounts currently blocked. Admin only.
    async fn list_blocked_users(&self, actor: Actor) -> Result<ListUsersResponse, Error>;
}

/// Fixture implementation for adapters that do not exercise account
/// administration.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureUserDirectory;

#[async_trait]
impl UserDirectory for FixtureUserDirectory {
    async fn register_user(&self, _request: RegisterUserRequest) -> Result<UserResponse, Error> {
        Err(Error::not_found("user directory fixture holds no state"))
    }

    async fn set_user_blocked(
        &self,
        _actor: Actor,
        _user_id: UserId,
        _blocked: bool,
    ) -> Result<UserResponse, Error> {
        Err(Error::not_found("user directory fixture holds no state"))
    }

    async fn list_users(&self, _actor: Actor) -> Result<ListUsersResponse, Error> {
        Ok(ListUsersResponse { users: Vec::new() })
    }

    async fn list_users_by_role(
        &self,
        _actor: Actor,
        _role: Role,
    ) -> Result<ListUsersResponse, Error> {
        Ok(ListUsersResponse { users: Vec::new() })
    }

    async fn list_blocked_users(&self, _actor: Actor) -> Result<ListUsersResponse, Error> {
        Ok(ListUsersResponse { users: Vec::new() })
    }
}
