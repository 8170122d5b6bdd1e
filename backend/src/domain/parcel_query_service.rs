//! Parcel read service: role-scoped listings, anonymous tracking, and
//! history access for the parties of a parcel.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::Error;
use crate::domain::parcel::Parcel;
use crate::domain::ports::{
    ListParcelsRequest, ListParcelsResponse, ParcelHistoryRequest, ParcelHistoryResponse,
    ParcelQuery, ParcelRepository, ParcelRepositoryError, TrackParcelRequest, TrackParcelResponse,
};
use crate::domain::tracking::TrackingCode;
use crate::domain::user::{Actor, Role};

fn map_repo_error(error: ParcelRepositoryError) -> Error {
    Error::internal(format!("parcel repository error: {error}"))
}

/// Parcel query service implementing the read-side driving port.
#[derive(Clone)]
pub struct ParcelQueryService<P> {
    parcels: Arc<P>,
}

impl<P> ParcelQueryService<P> {
    pub fn new(parcels: Arc<P>) -> Self {
        Self { parcels }
    }
}

impl<P> ParcelQueryService<P>
where
    P: ParcelRepository,
{
    async fn load_parcel(&self, id: Uuid) -> Result<Parcel, Error> {
        self.parcels
            .find_by_id(id)
            .await
            .map_err(map_repo_error)?
            .ok_or_else(|| Error::not_found(format!("parcel {id} not found")))
    }
}

#[async_trait]
impl<P> ParcelQuery for ParcelQueryService<P>
where
    P: ParcelRepository,
{
    async fn list_parcels(
        &self,
        request: ListParcelsRequest,
    ) -> Result<ListParcelsResponse, Error> {
        let parcels = match request.actor.role {
            Role::Admin => self.parcels.list_all().await,
            Role::Sender => self.parcels.list_for_sender(&request.actor.id).await,
            Role::Receiver => self.parcels.list_for_receiver(&request.actor.id).await,
        }
        .map_err(map_repo_error)?;

        Ok(ListParcelsResponse {
            parcels: parcels.iter().map(Into::into).collect(),
        })
    }

    async fn track_by_code(
        &self,
        request: TrackParcelRequest,
    ) -> Result<TrackParcelResponse, Error> {
        let code = TrackingCode::new(request.tracking_code)
            .map_err(|err| Error::invalid_request(format!("invalid tracking code: {err}")))?;
        let parcel = self
            .parcels
            .find_by_tracking_code(&code)
            .await
            .map_err(map_repo_error)?
            .ok_or_else(|| {
                Error::not_found(format!("no parcel with tracking code {}", code.as_ref()))
            })?;

        Ok(TrackParcelResponse {
            parcel: (&parcel).into(),
        })
    }

    async fn parcel_history(
        &self,
        request: ParcelHistoryRequest,
    ) -> Result<ParcelHistoryResponse, Error> {
        let parcel = self.load_parcel(request.parcel_id).await?;
        authorize_history(&request.actor, &parcel)?;

        Ok(ParcelHistoryResponse {
            events: parcel.events().iter().map(Into::into).collect(),
        })
    }
}

/// History reads are restricted to the parties of the parcel and admins.
fn authorize_history(actor: &Actor, parcel: &Parcel) -> Result<(), Error> {
    let permitted = match actor.role {
        Role::Admin => true,
        Role::Sender => parcel.sender() == &actor.id,
        Role::Receiver => parcel.receiver() == Some(&actor.id),
    };
    if permitted {
        Ok(())
    } else {
        Err(Error::unauthorized(
            "only parties to the parcel may read its history",
        ))
    }
}

#[cfg(test)]
#[path = "parcel_query_service_tests.rs"]
mod tests;
