//! Driving port for parcel lifecycle commands.
//!
//! Inbound adapters call this port with an already-authenticated
//! [`Actor`]; the implementations own authorization, transition
//! legality, and the append-only status log.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::Error;
use crate::domain::parcel::{Parcel, ParcelStatus, StatusLogEntry};
use crate::domain::user::{Actor, UserId};

/// Log entry projection shared by command and query responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusLogPayload {
    pub status: ParcelStatus,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl From<&StatusLogEntry> for StatusLogPayload {
    fn from(entry: &StatusLogEntry) -> Self {
        Self {
            status: entry.status(),
            timestamp: entry.timestamp(),
            actor_id: entry.actor().cloned(),
            note: entry.note().map(ToOwned::to_owned),
        }
    }
}

/// Full parcel projection returned to authorised callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParcelPayload {
    pub id: Uuid,
    pub tracking_code: String,
    pub parcel_type: String,
    pub weight: f64,
    pub fee: f64,
    pub pickup_address: String,
    pub delivery_address: String,
    pub sender_id: UserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receiver_id: Option<UserId>,
    pub status: ParcelStatus,
    pub blocked: bool,
    pub events: Vec<StatusLogPayload>,
}

impl From<&Parcel> for ParcelPayload {
    fn from(parcel: &Parcel) -> Self {
        Self {
            id: parcel.id(),
            tracking_code: parcel.tracking_code().as_ref().to_owned(),
            parcel_type: parcel.parcel_type().as_ref().to_owned(),
            weight: parcel.weight().value(),
            fee: parcel.fee().value(),
            pickup_address: parcel.pickup_address().as_ref().to_owned(),
            delivery_address: parcel.delivery_address().as_ref().to_owned(),
            sender_id: parcel.sender().clone(),
            receiver_id: parcel.receiver().cloned(),
            status: parcel.status(),
            blocked: parcel.is_blocked(),
            events: parcel.events().iter().map(Into::into).collect(),
        }
    }
}

/// Inputs for creating a parcel.
///
/// `receiver_id` supports the create-with-receiver workflow; leaving it
/// unset defers assignment to [`ParcelCommand::assign_receiver`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateParcelRequest {
    pub actor: Actor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parcel_type: Option<String>,
    pub weight: f64,
    pub pickup_address: String,
    pub delivery_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receiver_id: Option<UserId>,
}

/// Inputs for a lifecycle transition request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionRequest {
    pub actor: Actor,
    pub parcel_id: Uuid,
    pub target: ParcelStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Inputs for attaching a receiver to an unassigned parcel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignReceiverRequest {
    pub actor: Actor,
    pub parcel_id: Uuid,
    pub receiver_id: UserId,
}

/// Parcel state after a successful command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParcelResponse {
    pub parcel: ParcelPayload,
}

/// Port for parcel lifecycle commands.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ParcelCommand: Send + Sync {
    /// Create a parcel owned by the sending actor.
    async fn create_parcel(&self, request: CreateParcelRequest) -> Result<ParcelResponse, Error>;

    /// Validate and apply one lifecycle transition.
    async fn request_transition(&self, request: TransitionRequest)
    -> Result<ParcelResponse, Error>;

    /// Attach a receiver to an unassigned parcel and move it to
    /// `Approved`.
    async fn assign_receiver(&self, request: AssignReceiverRequest)
    -> Result<ParcelResponse, Error>;

    /// Shorthand: sender cancels their own parcel.
    async fn cancel_parcel(&self, actor: Actor, parcel_id: Uuid) -> Result<ParcelResponse, Error> {
        self.request_transition(TransitionRequest {
            actor,
            parcel_id,
            target: ParcelStatus::Cancelled,
            note: None,
        })
        .await
    }

    /// Shorthand: assigned receiver confirms delivery.
    async fn confirm_delivery(
        &self,
        actor: Actor,
        parcel_id: Uuid,
    ) -> Result<ParcelResponse, Error> {
        self.request_transition(TransitionRequest {
            actor,
            parcel_id,
            target: ParcelStatus::Delivered,
            note: None,
        })
        .await
    }

    /// Shorthand: admin blocks a parcel, or unblocks it back to
    /// `Requested`.
    async fn set_parcel_blocked(
        &self,
        actor: Actor,
        parcel_id: Uuid,
        blocked: bool,
    ) -> Result<ParcelResponse, Error> {
        let target = if blocked {
            ParcelStatus::Blocked
        } else {
            ParcelStatus::Requested
        };
        self.request_transition(TransitionRequest {
            actor,
            parcel_id,
            target,
            note: None,
        })
        .await
    }
}

/// Fixture implementation for adapters that do not exercise parcel
/// commands; every call reports the parcel as missing.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureParcelCommand;

#[async_trait]
impl ParcelCommand for FixtureParcelCommand {
    async fn create_parcel(&self, _request: CreateParcelRequest) -> Result<ParcelResponse, Error> {
        Err(Error::not_found("parcel command fixture holds no state"))
    }

    async fn request_transition(
        &self,
        _request: TransitionRequest,
    ) -> Result<ParcelResponse, Error> {
        Err(Error::not_found("parcel command fixture holds no state"))
    }

    async fn assign_receiver(
        &self,
        _request: AssignReceiverRequest,
    ) -> Result<ParcelResponse, Error> {
        Err(Error::not_found("parcel command fixture holds no state"))
    }
}
