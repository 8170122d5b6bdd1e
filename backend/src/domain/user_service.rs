//! Account registration and administration service.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::Error;
use crate::domain::ports::{
    ListUsersResponse, RegisterUserRequest, UserDirectory, UserRepository, UserRepositoryError,
    UserResponse,
};
use crate::domain::user::{
    Actor, DisplayName, EmailAddress, PasswordHash, Role, User, UserDraft, UserId,
};

fn map_repo_error(error: UserRepositoryError) -> Error {
    match error {
        UserRepositoryError::Connection { message } | UserRepositoryError::Query { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
        UserRepositoryError::DuplicateEmail { email } => {
            Error::conflict(format!("email {email} is already registered"))
        }
    }
}

fn require_admin(actor: &Actor) -> Result<(), Error> {
    if actor.role == Role::Admin {
        Ok(())
    } else {
        Err(Error::unauthorized("only admins may administer accounts"))
    }
}

/// User directory service implementing the account administration port.
#[derive(Clone)]
pub struct UserDirectoryService<U> {
    users: Arc<U>,
}

impl<U> UserDirectoryService<U> {
    pub fn new(users: Arc<U>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl<U> UserDirectory for UserDirectoryService<U>
where
    U: UserRepository,
{
    async fn register_user(&self, request: RegisterUserRequest) -> Result<UserResponse, Error> {
        let display_name = DisplayName::new(request.display_name)
            .map_err(|err| Error::invalid_request(format!("invalid display name: {err}")))?;
        let email = EmailAddress::new(request.email)
            .map_err(|err| Error::invalid_request(format!("invalid email: {err}")))?;
        let password_hash = PasswordHash::new(request.password_hash)
            .map_err(|err| Error::invalid_request(format!("invalid credential: {err}")))?;

        let user = User::new(UserDraft {
            id: UserId::random(),
            display_name,
            email,
            password_hash,
            role: request.role,
        });
        self.users.insert(&user).await.map_err(map_repo_error)?;

        Ok(UserResponse {
            user: (&user).into(),
        })
    }

    async fn set_user_blocked(
        &self,
        actor: Actor,
        user_id: UserId,
        blocked: bool,
    ) -> Result<UserResponse, Error> {
        require_admin(&actor)?;

        let mut user = self
            .users
            .find_by_id(&user_id)
            .await
            .map_err(map_repo_error)?
            .ok_or_else(|| Error::not_found(format!("user {user_id} not found")))?;
        user.set_blocked(blocked);
        self.users.update(&user).await.map_err(map_repo_error)?;

        Ok(UserResponse {
            user: (&user).into(),
        })
    }

    async fn list_users(&self, actor: Actor) -> Result<ListUsersResponse, Error> {
        require_admin(&actor)?;
        let users = self.users.list_all().await.map_err(map_repo_error)?;
        Ok(ListUsersResponse {
            users: users.iter().map(Into::into).collect(),
        })
    }

    async fn list_users_by_role(
        &self,
        actor: Actor,
        role: Role,
    ) -> Result<ListUsersResponse, Error> {
        require_admin(&actor)?;
        let users = self
            .users
            .list_by_role(role)
            .await
            .map_err(map_repo_error)?;
        Ok(ListUsersResponse {
            users: users.iter().map(Into::into).collect(),
        })
    }

    async fn list_blocked_users(&self, actor: Actor) -> Result<ListUsersResponse, Error> {
        require_admin(&actor)?;
        let users = self.users.list_blocked().await.map_err(map_repo_error)?;
        Ok(ListUsersResponse {
            users: users.iter().map(Into::into).collect(),
        })
    }
}

#[cfg(test)]
#[path = "user_service_tests.rs"]
mod tests;
