//! Tests for the domain error payload.

use rstest::rstest;
use serde_json::json;

use super::*;

#[rstest]
#[case(Error::invalid_request("bad"), ErrorCode::InvalidRequest)]
#[case(Error::unauthorized("denied"), ErrorCode::Unauthorized)]
#[case(Error::not_found("missing"), ErrorCode::NotFound)]
#[case(Error::invalid_transition("illegal"), ErrorCode::InvalidTransition)]
#[case(Error::already_assigned("taken"), ErrorCode::AlreadyAssigned)]
#[case(Error::conflict("lost race"), ErrorCode::Conflict)]
#[case(Error::internal("boom"), ErrorCode::InternalError)]
fn convenience_constructors_set_codes(#[case] error: Error, #[case] expected: ErrorCode) {
    assert_eq!(error.code(), expected);
}

#[rstest]
fn try_new_rejects_empty_messages() {
    let result = Error::try_new(ErrorCode::InvalidRequest, "   ");
    assert!(matches!(result, Err(ErrorValidationError::EmptyMessage)));
}

#[rstest]
fn with_details_attaches_payload() {
    let error = Error::invalid_request("bad").with_details(json!({ "field": "weight" }));
    assert_eq!(error.details(), Some(&json!({ "field": "weight" })));
}

#[rstest]
fn serialisation_round_trips_through_dto() {
    let error = Error::conflict("concurrent update").with_details(json!({ "parcelId": "p" }));
    let encoded = serde_json::to_string(&error).expect("error serialises");
    let decoded: Error = serde_json::from_str(&encoded).expect("error deserialises");
    assert_eq!(decoded, error);
}

#[rstest]
fn deserialisation_rejects_empty_messages() {
    let result = serde_json::from_value::<Error>(json!({
        "code": "not_found",
        "message": "   ",
    }));
    assert!(result.is_err());
}

#[rstest]
fn display_uses_message() {
    let error = Error::not_found("parcel missing");
    assert_eq!(error.to_string(), "parcel missing");
}
