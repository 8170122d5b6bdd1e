//! In-memory repository adapters.
//!
//! Both stores keep their records under a single `RwLock`, which gives
//! [`ParcelRepository::update_if_status`] its required atomicity: the
//! stored-status comparison and the overwrite happen under one write
//! guard, so racing writers serialise and the loser observes
//! `StaleStatus`.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::parcel::{Parcel, ParcelStatus, StatusLogEntry};
use crate::domain::ports::{
    ParcelRepository, ParcelRepositoryError, UserRepository, UserRepositoryError,
};
use crate::domain::tracking::TrackingCode;
use crate::domain::user::{EmailAddress, Role, User, UserId};

/// Parcel store backed by a lock-guarded map.
#[derive(Debug, Default)]
pub struct InMemoryParcelRepository {
    parcels: RwLock<HashMap<Uuid, Parcel>>,
}

impl InMemoryParcelRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn sorted(mut parcels: Vec<Parcel>) -> Vec<Parcel> {
        parcels.sort_by_key(|parcel| {
            let created = parcel.events().first().map(StatusLogEntry::timestamp);
            (created, parcel.id())
        });
        parcels
    }
}

#[async_trait]
impl ParcelRepository for InMemoryParcelRepository {
    async fn insert(&self, parcel: &Parcel) -> Result<(), ParcelRepositoryError> {
        let mut store = self
            .parcels
            .write()
            .map_err(|_| ParcelRepositoryError::connection("parcel store lock poisoned"))?;
        if store.contains_key(&parcel.id()) {
            return Err(ParcelRepositoryError::query(format!(
                "parcel {} is already stored",
                parcel.id()
            )));
        }
        if store
            .values()
            .any(|stored| stored.tracking_code() == parcel.tracking_code())
        {
            tracing::debug!(
                code = parcel.tracking_code().as_ref(),
                "tracking code collision on insert"
            );
            return Err(ParcelRepositoryError::duplicate_tracking_code(
                parcel.tracking_code().as_ref(),
            ));
        }
        store.insert(parcel.id(), parcel.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Parcel>, ParcelRepositoryError> {
        let store = self
            .parcels
            .read()
            .map_err(|_| ParcelRepositoryError::connection("parcel store lock poisoned"))?;
        Ok(store.get(&id).cloned())
    }

    async fn find_by_tracking_code(
        &self,
        code: &TrackingCode,
    ) -> Result<Option<Parcel>, ParcelRepositoryError> {
        let store = self
            .parcels
            .read()
            .map_err(|_| ParcelRepositoryError::connection("parcel store lock poisoned"))?;
        Ok(store
            .values()
            .find(|parcel| parcel.tracking_code() == code)
            .cloned())
    }

    async fn list_for_sender(
        &self,
        sender: &UserId,
    ) -> Result<Vec<Parcel>, ParcelRepositoryError> {
        let store = self
            .parcels
            .read()
            .map_err(|_| ParcelRepositoryError::connection("parcel store lock poisoned"))?;
        Ok(Self::sorted(
            store
                .values()
                .filter(|parcel| parcel.sender() == sender)
                .cloned()
                .collect(),
        ))
    }

    async fn list_for_receiver(
        &self,
        receiver: &UserId,
    ) -> Result<Vec<Parcel>, ParcelRepositoryError> {
        let store = self
            .parcels
            .read()
            .map_err(|_| ParcelRepositoryError::connection("parcel store lock poisoned"))?;
        Ok(Self::sorted(
            store
                .values()
                .filter(|parcel| parcel.receiver() == Some(receiver))
                .cloned()
                .collect(),
        ))
    }

    async fn list_all(&self) -> Result<Vec<Parcel>, ParcelRepositoryError> {
        let store = self
            .parcels
            .read()
            .map_err(|_| ParcelRepositoryError::connection("parcel store lock poisoned"))?;
        Ok(Self::sorted(store.values().cloned().collect()))
    }

    async fn update_if_status(
        &self,
        parcel: &Parcel,
        expected: ParcelStatus,
    ) -> Result<(), ParcelRepositoryError> {
        let mut store = self
            .parcels
            .write()
            .map_err(|_| ParcelRepositoryError::connection("parcel store lock poisoned"))?;
        let stored = store.get_mut(&parcel.id()).ok_or_else(|| {
            ParcelRepositoryError::query(format!("parcel {} is not stored", parcel.id()))
        })?;
        if stored.status() != expected {
            tracing::warn!(
                parcel = %parcel.id(),
                expected = %expected,
                stored = %stored.status(),
                "conditional update lost a concurrent race"
            );
            return Err(ParcelRepositoryError::stale_status(parcel.id(), expected));
        }
        *stored = parcel.clone();
        Ok(())
    }
}

/// User store backed by a lock-guarded map.
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<UserId, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn sorted(mut users: Vec<User>) -> Vec<User> {
        users.sort_by(|a, b| a.email().as_ref().cmp(b.email().as_ref()));
        users
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn insert(&self, user: &User) -> Result<(), UserRepositoryError> {
        let mut store = self
            .users
            .write()
            .map_err(|_| UserRepositoryError::connection("user store lock poisoned"))?;
        if store.contains_key(user.id()) {
            return Err(UserRepositoryError::query(format!(
                "user {} is already stored",
                user.id()
            )));
        }
        if store.values().any(|stored| stored.email() == user.email()) {
            return Err(UserRepositoryError::duplicate_email(user.email().as_ref()));
        }
        store.insert(user.id().clone(), user.clone());
        Ok(())
    }

    async fn update(&self, user: &User) -> Result<(), UserRepositoryError> {
        let mut store = self
            .users
            .write()
            .map_err(|_| UserRepositoryError::connection("user store lock poisoned"))?;
        let stored = store.get_mut(user.id()).ok_or_else(|| {
            UserRepositoryError::query(format!("user {} is not stored", user.id()))
        })?;
        *stored = user.clone();
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError> {
        let store = self
            .users
            .read()
            .map_err(|_| UserRepositoryError::connection("user store lock poisoned"))?;
        Ok(store.get(id).cloned())
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserRepositoryError> {
        let store = self
            .users
            .read()
            .map_err(|_| UserRepositoryError::connection("user store lock poisoned"))?;
        Ok(store
            .values()
            .find(|user| user.email() == email)
            .cloned())
    }

    async fn list_all(&self) -> Result<Vec<User>, UserRepositoryError> {
        let store = self
            .users
            .read()
            .map_err(|_| UserRepositoryError::connection("user store lock poisoned"))?;
        Ok(Self::sorted(store.values().cloned().collect()))
    }

    async fn list_by_role(&self, role: Role) -> Result<Vec<User>, UserRepositoryError> {
        let store = self
            .users
            .read()
            .map_err(|_| UserRepositoryError::connection("user store lock poisoned"))?;
        Ok(Self::sorted(
            store
                .values()
                .filter(|user| user.role() == role)
                .cloned()
                .collect(),
        ))
    }

    async fn list_blocked(&self) -> Result<Vec<User>, UserRepositoryError> {
        let store = self
            .users
            .read()
            .map_err(|_| UserRepositoryError::connection("user store lock poisoned"))?;
        Ok(Self::sorted(
            store.values().filter(|user| user.is_blocked()).cloned().collect(),
        ))
    }
}
