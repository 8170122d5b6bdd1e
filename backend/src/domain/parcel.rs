//! Parcel aggregate and its append-only status log.
//!
//! The parcel is the single mutable record in the system. All mutation
//! goes through [`Parcel::apply_transition`] and
//! [`Parcel::assign_receiver`]; both preserve the aggregate invariants:
//! the log is never truncated or reordered, `status` always equals the
//! status of the most recently appended entry, and log timestamps are
//! monotonically non-decreasing.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::tracking::{TrackingCode, TrackingCodeError};
use crate::domain::user::{UserId, UserValidationError};

/// Validation errors raised when constructing parcel components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParcelValidationError {
    InvalidWeight,
    InvalidFee,
    EmptyAddress,
    EmptyParcelType,
    EmptyEventLog,
    StatusLogMismatch,
    NonMonotonicLog,
    InvalidTrackingCode(TrackingCodeError),
    InvalidUserReference(UserValidationError),
}

impl fmt::Display for ParcelValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidWeight => write!(f, "weight must be a finite, positive number"),
            Self::InvalidFee => write!(f, "fee must be a finite, non-negative number"),
            Self::EmptyAddress => write!(f, "address must not be empty"),
            Self::EmptyParcelType => write!(f, "parcel type must not be empty"),
            Self::EmptyEventLog => write!(f, "parcel event log must contain at least one entry"),
            Self::StatusLogMismatch => {
                write!(f, "parcel status must equal the status of the last log entry")
            }
            Self::NonMonotonicLog => {
                write!(f, "log timestamps must be monotonically non-decreasing")
            }
            Self::InvalidTrackingCode(err) => write!(f, "{err}"),
            Self::InvalidUserReference(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ParcelValidationError {}

impl From<TrackingCodeError> for ParcelValidationError {
    fn from(value: TrackingCodeError) -> Self {
        Self::InvalidTrackingCode(value)
    }
}

impl From<UserValidationError> for ParcelValidationError {
    fn from(value: UserValidationError) -> Self {
        Self::InvalidUserReference(value)
    }
}

/// Parcel weight in weight units; finite and strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Weight(f64);

impl Weight {
    /// Validate and construct a [`Weight`].
    pub fn new(value: f64) -> Result<Self, ParcelValidationError> {
        if !value.is_finite() || value <= 0.0 {
            return Err(ParcelValidationError::InvalidWeight);
        }
        Ok(Self(value))
    }

    /// The weight as a plain number.
    pub fn value(self) -> f64 {
        self.0
    }
}

impl From<Weight> for f64 {
    fn from(value: Weight) -> Self {
        value.0
    }
}

impl TryFrom<f64> for Weight {
    type Error = ParcelValidationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Monetary fee in currency units; finite and non-negative.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Fee(f64);

impl Fee {
    /// Validate and construct a [`Fee`].
    pub fn new(value: f64) -> Result<Self, ParcelValidationError> {
        if !value.is_finite() || value < 0.0 {
            return Err(ParcelValidationError::InvalidFee);
        }
        Ok(Self(value))
    }

    /// The fee as a plain number.
    pub fn value(self) -> f64 {
        self.0
    }
}

impl From<Fee> for f64 {
    fn from(value: Fee) -> Self {
        value.0
    }
}

impl TryFrom<f64> for Fee {
    type Error = ParcelValidationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Category label for a parcel, defaulting to `standard`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ParcelType(String);

impl ParcelType {
    /// Validate and construct a [`ParcelType`].
    pub fn new(value: impl Into<String>) -> Result<Self, ParcelValidationError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ParcelValidationError::EmptyParcelType);
        }
        Ok(Self(value))
    }
}

impl Default for ParcelType {
    fn default() -> Self {
        Self("standard".to_owned())
    }
}

impl AsRef<str> for ParcelType {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ParcelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<ParcelType> for String {
    fn from(value: ParcelType) -> Self {
        value.0
    }
}

impl TryFrom<String> for ParcelType {
    type Error = ParcelValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Trimmed, non-empty postal address line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Validate and construct an [`Address`].
    pub fn new(value: impl Into<String>) -> Result<Self, ParcelValidationError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ParcelValidationError::EmptyAddress);
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.0
    }
}

impl TryFrom<String> for Address {
    type Error = ParcelValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Lifecycle status of a parcel.
///
/// Legacy spellings from earlier deployments (`Pending`, `Canceled`,
/// `In Transit`) are accepted as deserialisation aliases only; the core
/// never branches on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParcelStatus {
    #[serde(alias = "Requested")]
    Requested,
    #[serde(alias = "Approved", alias = "Pending", alias = "pending")]
    Approved,
    #[serde(alias = "Dispatched")]
    Dispatched,
    #[serde(alias = "InTransit", alias = "In Transit")]
    InTransit,
    #[serde(alias = "Delivered")]
    Delivered,
    #[serde(alias = "Cancelled", alias = "Canceled", alias = "canceled")]
    Cancelled,
    #[serde(alias = "Returned")]
    Returned,
    #[serde(alias = "Blocked")]
    Blocked,
}

impl ParcelStatus {
    /// Whether this status admits no further table-driven transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled | Self::Returned)
    }
}

impl fmt::Display for ParcelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Requested => "Requested",
            Self::Approved => "Approved",
            Self::Dispatched => "Dispatched",
            Self::InTransit => "In Transit",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
            Self::Returned => "Returned",
            Self::Blocked => "Blocked",
        };
        f.write_str(label)
    }
}

/// One immutable entry in a parcel's append-only status log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusLogEntry {
    status: ParcelStatus,
    timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    actor: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<String>,
}

impl StatusLogEntry {
    /// Build a log entry. `actor` is `None` for system actions.
    pub fn new(
        status: ParcelStatus,
        timestamp: DateTime<Utc>,
        actor: Option<UserId>,
        note: Option<String>,
    ) -> Self {
        Self {
            status,
            timestamp,
            actor,
            note,
        }
    }

    /// Status recorded by this entry.
    pub fn status(&self) -> ParcelStatus {
        self.status
    }

    /// Server-clock instant of the change.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Acting user, if the change was user-initiated.
    pub fn actor(&self) -> Option<&UserId> {
        self.actor.as_ref()
    }

    /// Optional human-readable note.
    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }
}

/// Mutation errors raised by the parcel aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParcelMutationError {
    ReceiverAlreadyAssigned,
}

impl fmt::Display for ParcelMutationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReceiverAlreadyAssigned => {
                write!(f, "parcel already has a receiver assigned")
            }
        }
    }
}

impl std::error::Error for ParcelMutationError {}

/// Validated inputs for constructing a [`Parcel`].
#[derive(Debug, Clone)]
pub struct ParcelDraft {
    pub id: Uuid,
    pub tracking_code: TrackingCode,
    pub parcel_type: ParcelType,
    pub weight: Weight,
    pub fee: Fee,
    pub pickup_address: Address,
    pub delivery_address: Address,
    pub sender: UserId,
    pub receiver: Option<UserId>,
    pub requested_at: DateTime<Utc>,
    pub requested_note: Option<String>,
}

/// A shipment record tracked through the delivery lifecycle.
///
/// ## Invariants
/// - `tracking_code` is server-generated, globally unique, and immutable.
/// - `sender` is set exclusively at creation and never changes.
/// - `receiver` is set at most once.
/// - The event log is append-only; `status` equals the last entry's
///   status and log timestamps never decrease.
/// - Parcels are never deleted; cancellation and blocking are statuses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(deny_unknown_fields)]
#[serde(try_from = "ParcelDto", into = "ParcelDto")]
pub struct Parcel {
    id: Uuid,
    tracking_code: TrackingCode,
    parcel_type: ParcelType,
    weight: Weight,
    fee: Fee,
    pickup_address: Address,
    delivery_address: Address,
    sender: UserId,
    receiver: Option<UserId>,
    status: ParcelStatus,
    events: Vec<StatusLogEntry>,
    blocked: bool,
}

impl Parcel {
    /// Build a freshly requested parcel with its initial log entry.
    pub fn new(draft: ParcelDraft) -> Self {
        let note = draft
            .requested_note
            .unwrap_or_else(|| "Parcel created by sender".to_owned());
        let initial = StatusLogEntry::new(
            ParcelStatus::Requested,
            draft.requested_at,
            Some(draft.sender.clone()),
            Some(note),
        );
        Self {
            id: draft.id,
            tracking_code: draft.tracking_code,
            parcel_type: draft.parcel_type,
            weight: draft.weight,
            fee: draft.fee,
            pickup_address: draft.pickup_address,
            delivery_address: draft.delivery_address,
            sender: draft.sender,
            receiver: draft.receiver,
            status: ParcelStatus::Requested,
            events: vec![initial],
            blocked: false,
        }
    }

    /// Stable parcel identifier.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Public tracking code.
    pub fn tracking_code(&self) -> &TrackingCode {
        &self.tracking_code
    }

    /// Category label.
    pub fn parcel_type(&self) -> &ParcelType {
        &self.parcel_type
    }

    /// Declared weight.
    pub fn weight(&self) -> Weight {
        self.weight
    }

    /// Fee computed at creation.
    pub fn fee(&self) -> Fee {
        self.fee
    }

    /// Pickup address line.
    pub fn pickup_address(&self) -> &Address {
        &self.pickup_address
    }

    /// Delivery address line.
    pub fn delivery_address(&self) -> &Address {
        &self.delivery_address
    }

    /// Owning sender; immutable after creation.
    pub fn sender(&self) -> &UserId {
        &self.sender
    }

    /// Assigned receiver, if any.
    pub fn receiver(&self) -> Option<&UserId> {
        self.receiver.as_ref()
    }

    /// Current lifecycle status.
    pub fn status(&self) -> ParcelStatus {
        self.status
    }

    /// Append-only status log, oldest first.
    pub fn events(&self) -> &[StatusLogEntry] {
        &self.events
    }

    /// Most recent log entry.
    pub fn last_event(&self) -> &StatusLogEntry {
        // The log is non-empty by construction.
        self.events.last().unwrap_or_else(|| {
            panic!("parcel {} has an empty event log", self.id);
        })
    }

    /// Whether an admin has blocked this parcel.
    pub fn is_blocked(&self) -> bool {
        self.blocked
    }

    /// Overwrite the status and append the matching log entry.
    ///
    /// Transition legality and actor authorization are the transition
    /// engine's responsibility; this method only preserves the aggregate
    /// invariants. The entry timestamp is clamped so the log stays
    /// monotonically non-decreasing.
    pub fn apply_transition(
        &mut self,
        status: ParcelStatus,
        timestamp: DateTime<Utc>,
        actor: Option<UserId>,
        note: Option<String>,
    ) {
        let timestamp = timestamp.max(self.last_event().timestamp());
        self.events
            .push(StatusLogEntry::new(status, timestamp, actor, note));
        self.status = status;
        self.blocked = status == ParcelStatus::Blocked;
    }

    /// Set the receiver reference; allowed exactly once.
    pub fn assign_receiver(&mut self, receiver: UserId) -> Result<(), ParcelMutationError> {
        if self.receiver.is_some() {
            return Err(ParcelMutationError::ReceiverAlreadyAssigned);
        }
        self.receiver = Some(receiver);
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ParcelDto {
    id: Uuid,
    tracking_code: TrackingCode,
    parcel_type: ParcelType,
    weight: Weight,
    fee: Fee,
    pickup_address: Address,
    delivery_address: Address,
    sender: UserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    receiver: Option<UserId>,
    status: ParcelStatus,
    events: Vec<StatusLogEntry>,
    blocked: bool,
}

impl From<Parcel> for ParcelDto {
    fn from(value: Parcel) -> Self {
        let Parcel {
            id,
            tracking_code,
            parcel_type,
            weight,
            fee,
            pickup_address,
            delivery_address,
            sender,
            receiver,
            status,
            events,
            blocked,
        } = value;
        Self {
            id,
            tracking_code,
            parcel_type,
            weight,
            fee,
            pickup_address,
            delivery_address,
            sender,
            receiver,
            status,
            events,
            blocked,
        }
    }
}

impl TryFrom<ParcelDto> for Parcel {
    type Error = ParcelValidationError;

    fn try_from(value: ParcelDto) -> Result<Self, Self::Error> {
        let last = value
            .events
            .last()
            .ok_or(ParcelValidationError::EmptyEventLog)?;
        if last.status() != value.status {
            return Err(ParcelValidationError::StatusLogMismatch);
        }
        let monotonic = value
            .events
            .windows(2)
            .all(|pair| pair[0].timestamp() <= pair[1].timestamp());
        if !monotonic {
            return Err(ParcelValidationError::NonMonotonicLog);
        }

        Ok(Self {
            id: value.id,
            tracking_code: value.tracking_code,
            parcel_type: value.parcel_type,
            weight: value.weight,
            fee: value.fee,
            pickup_address: value.pickup_address,
            delivery_address: value.delivery_address,
            sender: value.sender,
            receiver: value.receiver,
            status: value.status,
            events: value.events,
            blocked: value.blocked,
        })
    }
}
