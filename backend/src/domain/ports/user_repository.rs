//! Port for user persistence adapters and their errors.

use async_trait::async_trait;

use crate::domain::user::{EmailAddress, Role, User, UserId};

/// Persistence errors raised by user repository adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserRepositoryError {
    /// Repository connection could not be established.
    #[error("user repository connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("user repository query failed: {message}")]
    Query { message: String },
    /// Insert violated the email uniqueness constraint.
    #[error("email {email} is already registered")]
    DuplicateEmail { email: String },
}

impl UserRepositoryError {
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }

    pub fn duplicate_email(email: impl Into<String>) -> Self {
        Self::DuplicateEmail {
            email: email.into(),
        }
    }
}

/// Port for user account storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new account, enforcing email uniqueness.
    async fn insert(&self, user: &User) -> Result<(), UserRepositoryError>;

    /// Overwrite an existing account record.
    async fn update(&self, user: &User) -> Result<(), UserRepositoryError>;

    /// Fetch an account by identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError>;

    /// Fetch an account by normalised email.
    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserRepositoryError>;

    /// Every stored account (admin listings).
    async fn list_all(&self) -> Result<Vec<User>, UserRepositoryError>;

    /// Accounts holding the given role.
    async fn list_by_role(&self, role: Role) -> Result<Vec<User>, UserRepositoryError>;

    /// Accounts currently blocked by an admin.
    async fn list_blocked(&self) -> Result<Vec<User>, UserRepositoryError>;
}

/// Fixture implementation for tests that do not exercise user storage.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureUserRepository;

#[async_trait]
impl UserRepository for FixtureUserRepository {
    async fn insert(&self, _user: &User) -> Result<(), UserRepositoryError> {
        Ok(())
    }

    async fn update(&self, _user: &User) -> Result<(), UserRepositoryError> {
        Ok(())
    }

    async fn find_by_id(&self, _id: &UserId) -> Result<Option<User>, UserRepositoryError> {
        Ok(None)
    }

    async fn find_by_email(
        &self,
        _email: &EmailAddress,
    ) -> Result<Option<User>, UserRepositoryError> {
        Ok(None)
    }

    async fn list_all(&self) -> Result<Vec<User>, UserRepositoryError> {
        Ok(Vec::new())
    }

    async fn list_by_role(&self, _role: Role) -> Result<Vec<User>, UserRepositoryError> {
        Ok(Vec::new())
    }

    async fn list_blocked(&self) -> Result<Vec<User>, UserRepositoryError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use rstest::rstest;

    use super::*;

    #[rstest]
    fn duplicate_email_error_names_the_address() {
        let err = UserRepositoryError::duplicate_email("ada@example.com");
        assert!(err.to_string().contains("ada@example.com"));
    }

    #[rstest]
    #[tokio::test]
    async fn fixture_lookups_return_nothing() {
        let repo = FixtureUserRepository;
        assert!(
            repo.find_by_id(&UserId::random())
                .await
                .expect("fixture lookup succeeds")
                .is_none()
        );
        assert!(
            repo.list_by_role(Role::Receiver)
                .await
                .expect("fixture list succeeds")
                .is_empty()
        );
    }
}
