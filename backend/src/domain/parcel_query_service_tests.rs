//! Tests for the parcel read service.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use rstest::rstest;

use super::*;
use crate::domain::ErrorCode;
use crate::domain::parcel::{
    Address, Fee, ParcelDraft, ParcelStatus, ParcelType, Weight,
};
use crate::domain::ports::MockParcelRepository;
use crate::domain::user::UserId;

fn requested_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 9, 8, 0, 0)
        .single()
        .expect("valid timestamp")
}

fn stored_parcel(sender: &UserId, receiver: Option<UserId>) -> Parcel {
    Parcel::new(ParcelDraft {
        id: Uuid::new_v4(),
        tracking_code: TrackingCode::generate(requested_at()),
        parcel_type: ParcelType::default(),
        weight: Weight::new(2.5).expect("valid weight"),
        fee: Fee::new(25.0).expect("valid fee"),
        pickup_address: Address::new("1 Depot Lane").expect("valid address"),
        delivery_address: Address::new("9 Harbour Road").expect("valid address"),
        sender: sender.clone(),
        receiver,
        requested_at: requested_at(),
        requested_note: None,
    })
}

fn service(parcels: MockParcelRepository) -> ParcelQueryService<MockParcelRepository> {
    ParcelQueryService::new(Arc::new(parcels))
}

#[tokio::test]
async fn admins_list_every_parcel() {
    let first = stored_parcel(&UserId::random(), None);
    let second = stored_parcel(&UserId::random(), None);

    let mut parcels = MockParcelRepository::new();
    let stored = vec![first, second];
    parcels
        .expect_list_all()
        .times(1)
        .returning(move || Ok(stored.clone()));

    let response = service(parcels)
        .list_parcels(ListParcelsRequest {
            actor: Actor::new(UserId::random(), Role::Admin),
        })
        .await
        .expect("listing succeeds");

    assert_eq!(response.parcels.len(), 2);
}

#[tokio::test]
async fn senders_list_only_their_own_parcels() {
    let sender = UserId::random();
    let owned = stored_parcel(&sender, None);

    let mut parcels = MockParcelRepository::new();
    let expected_sender = sender.clone();
    parcels
        .expect_list_for_sender()
        .times(1)
        .withf(move |id| *id == expected_sender)
        .returning(move |_| Ok(vec![owned.clone()]));

    let response = service(parcels)
        .list_parcels(ListParcelsRequest {
            actor: Actor::new(sender.clone(), Role::Sender),
        })
        .await
        .expect("listing succeeds");

    assert_eq!(response.parcels.len(), 1);
    assert_eq!(response.parcels[0].sender_id, sender);
}

#[tokio::test]
async fn receivers_list_their_assignments() {
    let receiver = UserId::random();
    let assigned = stored_parcel(&UserId::random(), Some(receiver.clone()));

    let mut parcels = MockParcelRepository::new();
    let expected_receiver = receiver.clone();
    parcels
        .expect_list_for_receiver()
        .times(1)
        .withf(move |id| *id == expected_receiver)
        .returning(move |_| Ok(vec![assigned.clone()]));

    let response = service(parcels)
        .list_parcels(ListParcelsRequest {
            actor: Actor::new(receiver.clone(), Role::Receiver),
        })
        .await
        .expect("listing succeeds");

    assert_eq!(response.parcels[0].receiver_id, Some(receiver));
}

#[tokio::test]
async fn tracking_lookups_expose_no_party_identifiers() {
    let parcel = stored_parcel(&UserId::random(), None);
    let code = parcel.tracking_code().as_ref().to_owned();

    let mut parcels = MockParcelRepository::new();
    parcels
        .expect_find_by_tracking_code()
        .times(1)
        .returning(move |_| Ok(Some(parcel.clone())));

    let response = service(parcels)
        .track_by_code(TrackParcelRequest {
            tracking_code: code.clone(),
        })
        .await
        .expect("lookup succeeds");

    assert_eq!(response.parcel.tracking_code, code);
    assert_eq!(response.parcel.status, ParcelStatus::Requested);
    assert_eq!(response.parcel.events.len(), 1);
    let serialized =
        serde_json::to_string(&response.parcel).expect("payload serializes");
    assert!(!serialized.contains("senderId"));
    assert!(!serialized.contains("actorId"));
}

#[rstest]
#[case("TRK-2024-ZZ")]
#[case("not-a-code")]
#[tokio::test]
async fn malformed_tracking_codes_are_rejected_before_the_lookup(#[case] code: &str) {
    let mut parcels = MockParcelRepository::new();
    parcels.expect_find_by_tracking_code().times(0);

    let error = service(parcels)
        .track_by_code(TrackParcelRequest {
            tracking_code: code.to_owned(),
        })
        .await
        .expect_err("malformed code");

    assert_eq!(error.code(), ErrorCode::InvalidRequest);
}

#[tokio::test]
async fn unknown_tracking_codes_fail_not_found() {
    let mut parcels = MockParcelRepository::new();
    parcels
        .expect_find_by_tracking_code()
        .times(1)
        .returning(|_| Ok(None));

    let error = service(parcels)
        .track_by_code(TrackParcelRequest {
            tracking_code: "TRK-20240309-Ab12Cd".to_owned(),
        })
        .await
        .expect_err("nothing stored");

    assert_eq!(error.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn owners_read_their_parcel_history() {
    let sender = UserId::random();
    let parcel = stored_parcel(&sender, None);
    let parcel_id = parcel.id();

    let mut parcels = MockParcelRepository::new();
    parcels
        .expect_find_by_id()
        .times(1)
        .returning(move |_| Ok(Some(parcel.clone())));

    let response = service(parcels)
        .parcel_history(ParcelHistoryRequest {
            actor: Actor::new(sender, Role::Sender),
            parcel_id,
        })
        .await
        .expect("history read succeeds");

    assert_eq!(response.events.len(), 1);
    assert_eq!(response.events[0].status, ParcelStatus::Requested);
}

#[tokio::test]
async fn strangers_cannot_read_parcel_history() {
    let parcel = stored_parcel(&UserId::random(), None);
    let parcel_id = parcel.id();

    let mut parcels = MockParcelRepository::new();
    parcels
        .expect_find_by_id()
        .times(1)
        .returning(move |_| Ok(Some(parcel.clone())));

    let error = service(parcels)
        .parcel_history(ParcelHistoryRequest {
            actor: Actor::new(UserId::random(), Role::Receiver),
            parcel_id,
        })
        .await
        .expect_err("not a party to the parcel");

    assert_eq!(error.code(), ErrorCode::Unauthorized);
}
