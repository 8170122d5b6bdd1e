//! Driving port for parcel reads: role-scoped listings, anonymous
//! tracking lookups, and authorised history access.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::Error;
use crate::domain::parcel::{Parcel, ParcelStatus, StatusLogEntry};
use crate::domain::user::Actor;

use super::parcel_command::{ParcelPayload, StatusLogPayload};

/// Log entry projection with acting-user references stripped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicStatusLogPayload {
    pub status: ParcelStatus,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl From<&StatusLogEntry> for PublicStatusLogPayload {
    fn from(entry: &StatusLogEntry) -> Self {
        Self {
            status: entry.status(),
            timestamp: entry.timestamp(),
            note: entry.note().map(ToOwned::to_owned),
        }
    }
}

/// Reduced, non-sensitive projection served to anonymous tracking
/// lookups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicParcelPayload {
    pub tracking_code: String,
    pub status: ParcelStatus,
    pub events: Vec<PublicStatusLogPayload>,
}

impl From<&Parcel> for PublicParcelPayload {
    fn from(parcel: &Parcel) -> Self {
        Self {
            tracking_code: parcel.tracking_code().as_ref().to_owned(),
            status: parcel.status(),
            events: parcel.events().iter().map(Into::into).collect(),
        }
    }
}

/// Inputs for a role-scoped parcel listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParcelsRequest {
    pub actor: Actor,
}

/// Role-scoped parcel listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParcelsResponse {
    pub parcels: Vec<ParcelPayload>,
}

/// Inputs for an anonymous tracking lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackParcelRequest {
    pub tracking_code: String,
}

/// Anonymous tracking lookup result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackParcelResponse {
    pub parcel: PublicParcelPayload,
}

/// Inputs for an authorised history read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParcelHistoryRequest {
    pub actor: Actor,
    pub parcel_id: Uuid,
}

/// Ordered status log for one parcel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParcelHistoryResponse {
    pub events: Vec<StatusLogPayload>,
}

/// Port for parcel reads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ParcelQuery: Send + Sync {
    /// Parcels visible to the actor: senders see what they sent,
    /// receivers what is assigned to them, admins everything.
    async fn list_parcels(&self, request: ListParcelsRequest)
    -> Result<ListParcelsResponse, Error>;

    /// Anonymous lookup by tracking code; requires no authentication.
    async fn track_by_code(&self, request: TrackParcelRequest)
    -> Result<TrackParcelResponse, Error>;

    /// Ordered status log, restricted to parties of the parcel and
    /// admins.
    async fn parcel_history(
        &self,
        request: ParcelHistoryRequest,
    ) -> Result<ParcelHistoryResponse, Error>;
}

/// Fixture implementation for adapters that do not exercise parcel
/// reads.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureParcelQuery;

#[async_trait]
impl ParcelQuery for FixtureParcelQuery {
    async fn list_parcels(
        &self,
        _request: ListParcelsRequest,
    ) -> Result<ListParcelsResponse, Error> {
        Ok(ListParcelsResponse {
            parcels: Vec::new(),
        })
    }

    async fn track_by_code(
        &self,
        _request: TrackParcelRequest,
    ) -> Result<TrackParcelResponse, Error> {
        Err(Error::not_found("parcel query fixture holds no state"))
    }

    async fn parcel_history(
        &self,
        _request: ParcelHistoryRequest,
    ) -> Result<ParcelHistoryResponse, Error> {
        Err(Error::not_found("parcel query fixture holds no state"))
    }
}
