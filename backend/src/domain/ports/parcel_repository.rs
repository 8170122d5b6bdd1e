//! Port for parcel persistence adapters and their errors.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::parcel::{Parcel, ParcelStatus};
use crate::domain::tracking::TrackingCode;
use crate::domain::user::UserId;

/// Persistence errors raised by parcel repository adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParcelRepositoryError {
    /// Repository connection could not be established.
    #[error("parcel repository connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("parcel repository query failed: {message}")]
    Query { message: String },
    /// Insert violated the tracking code uniqueness constraint.
    #[error("tracking code {code} already exists")]
    DuplicateTrackingCode { code: String },
    /// Conditional update lost a concurrent race.
    #[error("parcel {id} changed concurrently; expected status {expected}")]
    StaleStatus { id: Uuid, expected: ParcelStatus },
}

impl ParcelRepositoryError {
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

    pub fn duplicate_tracking_code(code: impl Into<String>) -> Self {
        Self::DuplicateTrackingCode { code: code.into() }
    }

    pub fn stale_status(id: Uuid, expected: ParcelStatus) -> Self {
        Self::StaleStatus { id, expected }
    }
}

/// Port for parcel document storage.
///
/// Adapters must provide per-record atomicity for
/// [`ParcelRepository::update_if_status`]: the stored status comparison
/// and the overwrite must happen as one indivisible step so that two
/// racing transition requests cannot both succeed from the same stale
/// status.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ParcelRepository: Send + Sync {
    /// Insert a new parcel, enforcing tracking code uniqueness.
    async fn insert(&self, parcel: &Parcel) -> Result<(), ParcelRepositoryError>;

    /// Fetch a parcel by identifier.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Parcel>, ParcelRepositoryError>;

    /// Fetch a parcel by its public tracking code.
    async fn find_by_tracking_code(
        &self,
        code: &TrackingCode,
    ) -> Result<Option<Parcel>, ParcelRepositoryError>;

    /// Parcels sent by the given user.
    async fn list_for_sender(&self, sender: &UserId)
    -> Result<Vec<Parcel>, ParcelRepositoryError>;

    /// Parcels assigned to the given receiver.
    async fn list_for_receiver(
        &self,
        receiver: &UserId,
    ) -> Result<Vec<Parcel>, ParcelRepositoryError>;

    /// Every stored parcel (admin listings).
    async fn list_all(&self) -> Result<Vec<Parcel>, ParcelRepositoryError>;

    /// Overwrite the stored parcel only if its status still equals
    /// `expected`; fail with [`ParcelRepositoryError::StaleStatus`]
    /// otherwise.
    async fn update_if_status(
        &self,
        parcel: &Parcel,
        expected: ParcelStatus,
    ) -> Result<(), ParcelRepositoryError>;
}

/// Fixture implementation for tests that do not exercise parcel storage.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureParcelRepository;

#[async_trait]
impl ParcelRepository for FixtureParcelRepository {
    async fn insert(&self, _parcel: &Parcel) -> Result<(), ParcelRepositoryError> {
        Ok(())
    }

    async fn find_by_id(&self, _id: Uuid) -> Result<Option<Parcel>, ParcelRepositoryError> {
        Ok(None)
    }

    async fn find_by_tracking_code(
        &self,
        _code: &TrackingCode,
    ) -> Result<Option<Parcel>, ParcelRepositoryError> {
        Ok(None)
    }

    async fn list_for_sender(
        &self,
        _sender: &UserId,
    ) -> Result<Vec<Parcel>, ParcelRepositoryError> {
        Ok(Vec::new())
    }

    async fn list_for_receiver(
        &self,
        _receiver: &UserId,
    ) -> Result<Vec<Parcel>, ParcelRepositoryError> {
        Ok(Vec::new())
    }

    async fn list_all(&self) -> Result<Vec<Parcel>, ParcelRepositoryError> {
        Ok(Vec::new())
    }

    async fn update_if_status(
        &self,
        _parcel: &Parcel,
        _expected: ParcelStatus,
    ) -> Result<(), ParcelRepositoryError> {
        Ok(())
    }
}
