//! Parcel lifecycle command service.
//!
//! This is the transition engine: the sole authority for moving a parcel
//! from one status to another and for recording why. Every mutation goes
//! through a load / authorize / validate / append / conditional-save
//! sequence; the save is a compare-and-swap keyed on the status the
//! engine observed, retried once before surfacing a conflict.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use uuid::Uuid;

use crate::domain::Error;
use crate::domain::config::ParcelServiceConfig;
use crate::domain::fees::fee_for_weight;
use crate::domain::parcel::{Address, Parcel, ParcelDraft, ParcelStatus, ParcelType, Weight};
use crate::domain::ports::{
    AssignReceiverRequest, CreateParcelRequest, ParcelCommand, ParcelRepository,
    ParcelRepositoryError, ParcelResponse, TransitionRequest, UserRepository, UserRepositoryError,
};
use crate::domain::tracking::TrackingCode;
use crate::domain::transitions;
use crate::domain::user::{Actor, Role, UserId};

fn map_parcel_repo_error(error: ParcelRepositoryError) -> Error {
    match error {
        ParcelRepositoryError::Connection { message }
        | ParcelRepositoryError::Query { message } => {
            Error::internal(format!("parcel repository error: {message}"))
        }
        ParcelRepositoryError::DuplicateTrackingCode { code } => {
            Error::internal(format!("tracking code {code} collided unexpectedly"))
        }
        ParcelRepositoryError::StaleStatus { id, .. } => {
            Error::conflict(format!("parcel {id} was updated concurrently"))
        }
    }
}

fn map_user_repo_error(error: UserRepositoryError) -> Error {
    match error {
        UserRepositoryError::Connection { message } | UserRepositoryError::Query { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
        UserRepositoryError::DuplicateEmail { email } => {
            Error::conflict(format!("email {email} is already registered"))
        }
    }
}

/// Outcome of one optimistic write attempt.
enum AttemptError {
    /// Business-rule failure; not retried.
    Domain(Error),
    /// The conditional update lost a concurrent race.
    LostRace,
}

impl From<Error> for AttemptError {
    fn from(value: Error) -> Self {
        Self::Domain(value)
    }
}

/// Parcel command service implementing the lifecycle driving port.
#[derive(Clone)]
pub struct ParcelCommandService<P, U> {
    parcels: Arc<P>,
    users: Arc<U>,
    clock: Arc<dyn Clock>,
    config: ParcelServiceConfig,
}

impl<P, U> ParcelCommandService<P, U> {
    /// Create a new command service over the parcel and user stores.
    pub fn new(
        parcels: Arc<P>,
        users: Arc<U>,
        clock: Arc<dyn Clock>,
        config: ParcelServiceConfig,
    ) -> Self {
        Self {
            parcels,
            users,
            clock,
            config,
        }
    }
}

impl<P, U> ParcelCommandService<P, U>
where
    P: ParcelRepository,
    U: UserRepository,
{
    /// Look up `id` and insist it is an existing receiver account.
    async fn require_receiver(&self, id: &UserId) -> Result<UserId, Error> {
        let user = self
            .users
            .find_by_id(id)
            .await
            .map_err(map_user_repo_error)?
            .ok_or_else(|| Error::not_found(format!("receiver {id} not found")))?;
        if user.role() != Role::Receiver {
            return Err(Error::invalid_request(
                "assigned user does not hold the receiver role",
            ));
        }
        Ok(user.id().clone())
    }

    async fn load_parcel(&self, id: Uuid) -> Result<Parcel, Error> {
        self.parcels
            .find_by_id(id)
            .await
            .map_err(map_parcel_repo_error)?
            .ok_or_else(|| Error::not_found(format!("parcel {id} not found")))
    }

    async fn attempt_transition(
        &self,
        request: &TransitionRequest,
    ) -> Result<Parcel, AttemptError> {
        let mut parcel = self.load_parcel(request.parcel_id).await?;
        let observed = parcel.status();

        authorize_transition(&request.actor, &parcel, request.target)?;
        check_legality(&request.actor, observed, request.target)?;

        let note = request.note.clone().unwrap_or_else(|| {
            transitions::default_note(observed, request.target, request.actor.role)
        });
        parcel.apply_transition(
            request.target,
            self.clock.utc(),
            Some(request.actor.id.clone()),
            Some(note),
        );

        match self.parcels.update_if_status(&parcel, observed).await {
            Ok(()) => Ok(parcel),
            Err(ParcelRepositoryError::StaleStatus { .. }) => Err(AttemptError::LostRace),
            Err(other) => Err(map_parcel_repo_error(other).into()),
        }
    }

    async fn attempt_assignment(
        &self,
        request: &AssignReceiverRequest,
        receiver: &UserId,
    ) -> Result<Parcel, AttemptError> {
        let mut parcel = self.load_parcel(request.parcel_id).await?;
        let observed = parcel.status();

        if request.actor.role != Role::Sender || parcel.sender() != &request.actor.id {
            return Err(Error::unauthorized(
                "only the owning sender may assign a receiver",
            )
            .into());
        }
        if observed != ParcelStatus::Requested {
            return Err(Error::invalid_transition(format!(
                "invalid status transition: {observed} -> {}",
                ParcelStatus::Approved
            ))
            .into());
        }
        parcel
            .assign_receiver(receiver.clone())
            .map_err(|_| Error::already_assigned("parcel already has a receiver assigned"))?;
        parcel.apply_transition(
            ParcelStatus::Approved,
            self.clock.utc(),
            Some(request.actor.id.clone()),
            Some("Parcel assigned to receiver, pending admin approval".to_owned()),
        );

        match self.parcels.update_if_status(&parcel, observed).await {
            Ok(()) => Ok(parcel),
            Err(ParcelRepositoryError::StaleStatus { .. }) => Err(AttemptError::LostRace),
            Err(other) => Err(map_parcel_repo_error(other).into()),
        }
    }
}

#[async_trait]
impl<P, U> ParcelCommand for ParcelCommandService<P, U>
where
    P: ParcelRepository,
    U: UserRepository,
{
    async fn create_parcel(&self, request: CreateParcelRequest) -> Result<ParcelResponse, Error> {
        if request.actor.role != Role::Sender {
            return Err(Error::unauthorized("only senders may create parcels"));
        }

        let weight = Weight::new(request.weight)
            .map_err(|err| Error::invalid_request(format!("invalid weight: {err}")))?;
        let fee = fee_for_weight(weight, self.config.fee_rate())
            .map_err(|err| Error::internal(format!("fee computation failed: {err}")))?;
        let parcel_type = match request.parcel_type {
            Some(label) if !label.trim().is_empty() => ParcelType::new(label)
                .map_err(|err| Error::invalid_request(format!("invalid parcel type: {err}")))?,
            _ => ParcelType::default(),
        };
        let pickup_address = Address::new(request.pickup_address)
            .map_err(|err| Error::invalid_request(format!("invalid pickup address: {err}")))?;
        let delivery_address = Address::new(request.delivery_address)
            .map_err(|err| Error::invalid_request(format!("invalid delivery address: {err}")))?;
        let receiver = match &request.receiver_id {
            Some(id) => Some(self.require_receiver(id).await?),
            None => None,
        };

        // Tracking codes are random; resolve insert-time collisions by
        // regenerating within the configured attempt budget.
        for _ in 0..self.config.tracking_code_attempts() {
            let requested_at = self.clock.utc();
            let parcel = Parcel::new(ParcelDraft {
                id: Uuid::new_v4(),
                tracking_code: TrackingCode::generate(requested_at),
                parcel_type: parcel_type.clone(),
                weight,
                fee,
                pickup_address: pickup_address.clone(),
                delivery_address: delivery_address.clone(),
                sender: request.actor.id.clone(),
                receiver: receiver.clone(),
                requested_at,
                requested_note: None,
            });
            match self.parcels.insert(&parcel).await {
                Ok(()) => {
                    return Ok(ParcelResponse {
                        parcel: (&parcel).into(),
                    });
                }
                Err(ParcelRepositoryError::DuplicateTrackingCode { .. }) => {}
                Err(other) => return Err(map_parcel_repo_error(other)),
            }
        }

        Err(Error::internal(
            "tracking code generation exhausted its attempt budget",
        ))
    }

    async fn request_transition(
        &self,
        request: TransitionRequest,
    ) -> Result<ParcelResponse, Error> {
        match self.attempt_transition(&request).await {
            Ok(parcel) => Ok(ParcelResponse {
                parcel: (&parcel).into(),
            }),
            Err(AttemptError::Domain(error)) => Err(error),
            // One retry re-runs the full load/validate/write sequence;
            // re-validation may legitimately fail against the advanced
            // status.
            Err(AttemptError::LostRace) => match self.attempt_transition(&request).await {
                Ok(parcel) => Ok(ParcelResponse {
                    parcel: (&parcel).into(),
                }),
                Err(AttemptError::Domain(error)) => Err(error),
                Err(AttemptError::LostRace) => Err(Error::conflict(format!(
                    "parcel {} was updated concurrently",
                    request.parcel_id
                ))),
            },
        }
    }

    async fn assign_receiver(
        &self,
        request: AssignReceiverRequest,
    ) -> Result<ParcelResponse, Error> {
        let receiver = self.require_receiver(&request.receiver_id).await?;

        match self.attempt_assignment(&request, &receiver).await {
            Ok(parcel) => Ok(ParcelResponse {
                parcel: (&parcel).into(),
            }),
            Err(AttemptError::Domain(error)) => Err(error),
            Err(AttemptError::LostRace) => {
                match self.attempt_assignment(&request, &receiver).await {
                    Ok(parcel) => Ok(ParcelResponse {
                        parcel: (&parcel).into(),
                    }),
                    Err(AttemptError::Domain(error)) => Err(error),
                    Err(AttemptError::LostRace) => Err(Error::conflict(format!(
                        "parcel {} was updated concurrently",
                        request.parcel_id
                    ))),
                }
            }
        }
    }
}

/// Check that the actor may request `target` on this parcel instance.
fn authorize_transition(actor: &Actor, parcel: &Parcel, target: ParcelStatus) -> Result<(), Error> {
    match actor.role {
        Role::Admin => Ok(()),
        Role::Sender => {
            if parcel.sender() != &actor.id {
                return Err(Error::unauthorized(
                    "only the owning sender may act on this parcel",
                ));
            }
            if !transitions::role_may_request(Role::Sender, target) {
                return Err(Error::unauthorized("senders may only cancel their parcels"));
            }
            Ok(())
        }
        Role::Receiver => {
            if parcel.receiver() != Some(&actor.id) {
                return Err(Error::unauthorized(
                    "only the assigned receiver may act on this parcel",
                ));
            }
            if !transitions::role_may_request(Role::Receiver, target) {
                return Err(Error::unauthorized("receivers may only confirm delivery"));
            }
            Ok(())
        }
    }
}

/// Check `(current, target)` against the transition table, honouring the
/// admin block override channel.
fn check_legality(actor: &Actor, current: ParcelStatus, target: ParcelStatus) -> Result<(), Error> {
    if actor.role == Role::Admin && target == ParcelStatus::Blocked {
        if current == ParcelStatus::Blocked {
            return Err(Error::invalid_transition("parcel is already blocked"));
        }
        return Ok(());
    }
    if !transitions::is_legal(current, target) {
        return Err(Error::invalid_transition(format!(
            "invalid status transition: {current} -> {target}"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "parcel_service_tests.rs"]
mod tests;
