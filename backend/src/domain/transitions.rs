//! The authoritative parcel status transition table.
//!
//! The table is the single source of truth for legal lifecycle moves.
//! The one exception is the admin block override, which the transition
//! engine models as an explicit channel rather than a table row (see
//! `ParcelCommandService::request_transition`).

use crate::domain::parcel::ParcelStatus;
use crate::domain::user::Role;

/// Legal targets for a table-driven transition out of `from`.
///
/// Terminal statuses return an empty slice. `Blocked -> Requested` is the
/// unblock move and is reachable through role gating by admins only.
pub fn allowed_targets(from: ParcelStatus) -> &'static [ParcelStatus] {
    match from {
        ParcelStatus::Requested => &[ParcelStatus::Approved, ParcelStatus::Cancelled],
        ParcelStatus::Approved => &[ParcelStatus::Dispatched, ParcelStatus::Cancelled],
        ParcelStatus::Dispatched => &[ParcelStatus::InTransit],
        ParcelStatus::InTransit => &[ParcelStatus::Delivered, ParcelStatus::Returned],
        ParcelStatus::Delivered | ParcelStatus::Cancelled | ParcelStatus::Returned => &[],
        ParcelStatus::Blocked => &[ParcelStatus::Requested],
    }
}

/// Whether `(from, to)` appears in the transition table.
pub fn is_legal(from: ParcelStatus, to: ParcelStatus) -> bool {
    allowed_targets(from).contains(&to)
}

/// Whether `role` may request `target` through the table-driven channel.
///
/// Ownership (sender owns the parcel, receiver is the assigned receiver)
/// is checked separately by the engine against the loaded parcel.
pub fn role_may_request(role: Role, target: ParcelStatus) -> bool {
    match role {
        Role::Admin => true,
        Role::Sender => target == ParcelStatus::Cancelled,
        Role::Receiver => target == ParcelStatus::Delivered,
    }
}

/// Synthesize the log note used when a caller supplies none.
pub fn default_note(current: ParcelStatus, target: ParcelStatus, role: Role) -> String {
    match (role, target) {
        (Role::Sender, ParcelStatus::Cancelled) => "Parcel cancelled by sender".to_owned(),
        (Role::Receiver, ParcelStatus::Delivered) => "Receiver confirmed delivery".to_owned(),
        (Role::Admin, ParcelStatus::Blocked) => "Parcel blocked by admin".to_owned(),
        (Role::Admin, ParcelStatus::Requested) if current == ParcelStatus::Blocked => {
            "Parcel unblocked by admin".to_owned()
        }
        (Role::Admin, status) => format!("Status updated to {status} by admin"),
        (role, status) => format!("Status updated to {status} by {role}"),
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for the transition table.

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(ParcelStatus::Requested, ParcelStatus::Approved, true)]
    #[case(ParcelStatus::Requested, ParcelStatus::Cancelled, true)]
    #[case(ParcelStatus::Requested, ParcelStatus::Dispatched, false)]
    #[case(ParcelStatus::Approved, ParcelStatus::Dispatched, true)]
    #[case(ParcelStatus::Approved, ParcelStatus::Cancelled, true)]
    #[case(ParcelStatus::Approved, ParcelStatus::Delivered, false)]
    #[case(ParcelStatus::Dispatched, ParcelStatus::InTransit, true)]
    #[case(ParcelStatus::Dispatched, ParcelStatus::Cancelled, false)]
    #[case(ParcelStatus::InTransit, ParcelStatus::Delivered, true)]
    #[case(ParcelStatus::InTransit, ParcelStatus::Returned, true)]
    #[case(ParcelStatus::InTransit, ParcelStatus::Cancelled, false)]
    #[case(ParcelStatus::Blocked, ParcelStatus::Requested, true)]
    #[case(ParcelStatus::Blocked, ParcelStatus::Approved, false)]
    fn table_matches_the_lifecycle_design(
        #[case] from: ParcelStatus,
        #[case] to: ParcelStatus,
        #[case] legal: bool,
    ) {
        assert_eq!(is_legal(from, to), legal);
    }

    #[rstest]
    #[case(ParcelStatus::Delivered)]
    #[case(ParcelStatus::Cancelled)]
    #[case(ParcelStatus::Returned)]
    fn terminal_statuses_have_no_targets(#[case] status: ParcelStatus) {
        assert!(allowed_targets(status).is_empty());
    }

    #[rstest]
    fn no_status_may_transition_to_itself() {
        let statuses = [
            ParcelStatus::Requested,
            ParcelStatus::Approved,
            ParcelStatus::Dispatched,
            ParcelStatus::InTransit,
            ParcelStatus::Delivered,
            ParcelStatus::Cancelled,
            ParcelStatus::Returned,
            ParcelStatus::Blocked,
        ];
        for status in statuses {
            assert!(!is_legal(status, status), "{status} loops onto itself");
        }
    }

    #[rstest]
    fn senders_may_only_request_cancellation() {
        assert!(role_may_request(Role::Sender, ParcelStatus::Cancelled));
        assert!(!role_may_request(Role::Sender, ParcelStatus::Approved));
        assert!(!role_may_request(Role::Sender, ParcelStatus::Delivered));
    }

    #[rstest]
    fn receivers_may_only_request_delivery() {
        assert!(role_may_request(Role::Receiver, ParcelStatus::Delivered));
        assert!(!role_may_request(Role::Receiver, ParcelStatus::Cancelled));
        assert!(!role_may_request(Role::Receiver, ParcelStatus::Blocked));
    }

    #[rstest]
    fn admins_may_request_any_target() {
        assert!(role_may_request(Role::Admin, ParcelStatus::Blocked));
        assert!(role_may_request(Role::Admin, ParcelStatus::Dispatched));
    }

    #[rstest]
    fn default_notes_name_the_acting_channel() {
        assert_eq!(
            default_note(ParcelStatus::Requested, ParcelStatus::Cancelled, Role::Sender),
            "Parcel cancelled by sender"
        );
        assert_eq!(
            default_note(ParcelStatus::InTransit, ParcelStatus::Delivered, Role::Receiver),
            "Receiver confirmed delivery"
        );
        assert_eq!(
            default_note(ParcelStatus::Approved, ParcelStatus::Blocked, Role::Admin),
            "Parcel blocked by admin"
        );
        assert_eq!(
            default_note(ParcelStatus::Blocked, ParcelStatus::Requested, Role::Admin),
            "Parcel unblocked by admin"
        );
        assert_eq!(
            default_note(ParcelStatus::Approved, ParcelStatus::Dispatched, Role::Admin),
            "Status updated to Dispatched by admin"
        );
    }
}
