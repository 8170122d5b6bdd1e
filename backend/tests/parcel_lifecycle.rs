//! End-to-end lifecycle coverage over the in-memory adapters.

use std::sync::Arc;

use mockable::DefaultClock;
use parcel_backend::domain::config::ParcelServiceConfig;
use parcel_backend::domain::ports::{
    CreateParcelRequest, ListParcelsRequest, ParcelCommand, ParcelHistoryRequest, ParcelQuery,
    TrackParcelRequest, TransitionRequest, UserRepository,
};
use parcel_backend::domain::user::{DisplayName, EmailAddress, PasswordHash, User, UserDraft};
use parcel_backend::domain::{
    Actor, ErrorCode, ParcelCommandService, ParcelQueryService, ParcelStatus, Role, UserId,
};
use parcel_backend::outbound::persistence::{InMemoryParcelRepository, InMemoryUserRepository};

type Commands = ParcelCommandService<InMemoryParcelRepository, InMemoryUserRepository>;
type Queries = ParcelQueryService<InMemoryParcelRepository>;

struct Harness {
    commands: Arc<Commands>,
    queries: Queries,
    users: Arc<InMemoryUserRepository>,
}

fn harness() -> Harness {
    let parcels = Arc::new(InMemoryParcelRepository::new());
    let users = Arc::new(InMemoryUserRepository::new());
    let commands = Arc::new(ParcelCommandService::new(
        Arc::clone(&parcels),
        Arc::clone(&users),
        Arc::new(DefaultClock),
        ParcelServiceConfig::default(),
    ));
    let queries = ParcelQueryService::new(Arc::clone(&parcels));
    Harness {
        commands,
        queries,
        users,
    }
}

async fn register(users: &InMemoryUserRepository, role: Role) -> Actor {
    let id = UserId::random();
    let user = User::new(UserDraft {
        email: EmailAddress::new(format!("{id}@example.com")).expect("valid email"),
        id,
        display_name: DisplayName::new("Test Account").expect("valid display name"),
        password_hash: PasswordHash::new("$argon2id$stub").expect("valid hash"),
        role,
    });
    users.insert(&user).await.expect("registration succeeds");
    user.actor()
}

fn creation(actor: &Actor, receiver: Option<&Actor>) -> CreateParcelRequest {
    CreateParcelRequest {
        actor: actor.clone(),
        parcel_type: None,
        weight: 5.0,
        pickup_address: "1 Depot Lane".to_owned(),
        delivery_address: "9 Harbour Road".to_owned(),
        receiver_id: receiver.map(|r| r.id.clone()),
    }
}

async fn advance(commands: &Commands, admin: &Actor, parcel_id: uuid::Uuid, target: ParcelStatus) {
    commands
        .request_transition(TransitionRequest {
            actor: admin.clone(),
            parcel_id,
            target,
            note: None,
        })
        .await
        .expect("transition succeeds");
}

#[tokio::test]
async fn creation_computes_the_fee_and_opens_the_log() {
    let h = harness();
    let sender = register(&h.users, Role::Sender).await;

    let response = h
        .commands
        .create_parcel(creation(&sender, None))
        .await
        .expect("creation succeeds");

    let parcel = response.parcel;
    assert!((parcel.fee - 50.0).abs() < f64::EPSILON);
    assert_eq!(parcel.status, ParcelStatus::Requested);
    assert_eq!(parcel.events.len(), 1);
    assert_eq!(parcel.events[0].status, ParcelStatus::Requested);
}

#[tokio::test]
async fn the_full_lifecycle_appends_one_entry_per_transition() {
    let h = harness();
    let sender = register(&h.users, Role::Sender).await;
    let receiver = register(&h.users, Role::Receiver).await;
    let admin = register(&h.users, Role::Admin).await;

    let created = h
        .commands
        .create_parcel(creation(&sender, Some(&receiver)))
        .await
        .expect("creation succeeds");
    let parcel_id = created.parcel.id;

    advance(&h.commands, &admin, parcel_id, ParcelStatus::Approved).await;
    advance(&h.commands, &admin, parcel_id, ParcelStatus::Dispatched).await;
    advance(&h.commands, &admin, parcel_id, ParcelStatus::InTransit).await;
    let delivered = h
        .commands
        .confirm_delivery(receiver.clone(), parcel_id)
        .await
        .expect("receiver confirms delivery");

    assert_eq!(delivered.parcel.status, ParcelStatus::Delivered);
    let statuses: Vec<ParcelStatus> = delivered
        .parcel
        .events
        .iter()
        .map(|entry| entry.status)
        .collect();
    assert_eq!(
        statuses,
        vec![
            ParcelStatus::Requested,
            ParcelStatus::Approved,
            ParcelStatus::Dispatched,
            ParcelStatus::InTransit,
            ParcelStatus::Delivered,
        ]
    );
    for window in delivered.parcel.events.windows(2) {
        assert!(window[0].timestamp <= window[1].timestamp);
    }

    let history = h
        .queries
        .parcel_history(ParcelHistoryRequest {
            actor: sender,
            parcel_id,
        })
        .await
        .expect("the sender reads the history");
    assert_eq!(history.events.len(), 5);
    assert_eq!(
        history.events[4].note.as_deref(),
        Some("Receiver confirmed delivery")
    );
}

#[tokio::test]
async fn senders_cannot_cancel_once_dispatched() {
    let h = harness();
    let sender = register(&h.users, Role::Sender).await;
    let admin = register(&h.users, Role::Admin).await;

    let created = h
        .commands
        .create_parcel(creation(&sender, None))
        .await
        .expect("creation succeeds");
    let parcel_id = created.parcel.id;
    advance(&h.commands, &admin, parcel_id, ParcelStatus::Approved).await;
    advance(&h.commands, &admin, parcel_id, ParcelStatus::Dispatched).await;

    let error = h
        .commands
        .cancel_parcel(sender.clone(), parcel_id)
        .await
        .expect_err("dispatch is past the point of cancellation");
    assert_eq!(error.code(), ErrorCode::InvalidTransition);

    let listed = h
        .queries
        .list_parcels(ListParcelsRequest { actor: sender })
        .await
        .expect("listing succeeds");
    assert_eq!(listed.parcels[0].status, ParcelStatus::Dispatched);
    assert_eq!(listed.parcels[0].events.len(), 3);
}

#[tokio::test]
async fn confirming_delivery_twice_leaves_the_log_untouched() {
    let h = harness();
    let sender = register(&h.users, Role::Sender).await;
    let receiver = register(&h.users, Role::Receiver).await;
    let admin = register(&h.users, Role::Admin).await;

    let created = h
        .commands
        .create_parcel(creation(&sender, Some(&receiver)))
        .await
        .expect("creation succeeds");
    let parcel_id = created.parcel.id;
    advance(&h.commands, &admin, parcel_id, ParcelStatus::Approved).await;
    advance(&h.commands, &admin, parcel_id, ParcelStatus::Dispatched).await;
    advance(&h.commands, &admin, parcel_id, ParcelStatus::InTransit).await;
    h.commands
        .confirm_delivery(receiver.clone(), parcel_id)
        .await
        .expect("first confirmation succeeds");

    let error = h
        .commands
        .confirm_delivery(receiver, parcel_id)
        .await
        .expect_err("already delivered");
    assert_eq!(error.code(), ErrorCode::InvalidTransition);

    let history = h
        .queries
        .parcel_history(ParcelHistoryRequest {
            actor: admin,
            parcel_id,
        })
        .await
        .expect("admin reads the history");
    assert_eq!(history.events.len(), 5);
}

#[tokio::test]
async fn parcels_are_visible_only_to_their_parties() {
    let h = harness();
    let sender = register(&h.users, Role::Sender).await;
    let stranger = register(&h.users, Role::Sender).await;

    let created = h
        .commands
        .create_parcel(creation(&sender, None))
        .await
        .expect("creation succeeds");
    let parcel_id = created.parcel.id;

    let error = h
        .commands
        .cancel_parcel(stranger.clone(), parcel_id)
        .await
        .expect_err("not the owner");
    assert_eq!(error.code(), ErrorCode::Unauthorized);

    let error = h
        .queries
        .parcel_history(ParcelHistoryRequest {
            actor: stranger.clone(),
            parcel_id,
        })
        .await
        .expect_err("not a party to the parcel");
    assert_eq!(error.code(), ErrorCode::Unauthorized);

    let empty = h
        .queries
        .list_parcels(ListParcelsRequest { actor: stranger })
        .await
        .expect("listing succeeds");
    assert!(empty.parcels.is_empty());
}

#[tokio::test]
async fn anonymous_tracking_exposes_status_but_not_parties() {
    let h = harness();
    let sender = register(&h.users, Role::Sender).await;

    let created = h
        .commands
        .create_parcel(creation(&sender, None))
        .await
        .expect("creation succeeds");

    let tracked = h
        .queries
        .track_by_code(TrackParcelRequest {
            tracking_code: created.parcel.tracking_code.clone(),
        })
        .await
        .expect("anonymous lookup succeeds");

    assert_eq!(tracked.parcel.status, ParcelStatus::Requested);
    let serialized = serde_json::to_string(&tracked.parcel).expect("payload serializes");
    assert!(!serialized.contains("senderId"));
    assert!(!serialized.contains(sender.id.as_ref()));
}

#[tokio::test]
async fn blocking_overrides_the_table_and_unblocking_restarts_the_flow() {
    let h = harness();
    let sender = register(&h.users, Role::Sender).await;
    let admin = register(&h.users, Role::Admin).await;

    let created = h
        .commands
        .create_parcel(creation(&sender, None))
        .await
        .expect("creation succeeds");
    let parcel_id = created.parcel.id;
    advance(&h.commands, &admin, parcel_id, ParcelStatus::Approved).await;
    advance(&h.commands, &admin, parcel_id, ParcelStatus::Dispatched).await;

    let blocked = h
        .commands
        .set_parcel_blocked(admin.clone(), parcel_id, true)
        .await
        .expect("admins block from any status");
    assert_eq!(blocked.parcel.status, ParcelStatus::Blocked);
    assert!(blocked.parcel.blocked);

    let unblocked = h
        .commands
        .set_parcel_blocked(admin, parcel_id, false)
        .await
        .expect("unblock succeeds");
    assert_eq!(unblocked.parcel.status, ParcelStatus::Requested);
    assert!(!unblocked.parcel.blocked);
}

#[tokio::test]
async fn racing_transitions_apply_exactly_once() {
    let h = harness();
    let sender = register(&h.users, Role::Sender).await;
    let admin = register(&h.users, Role::Admin).await;

    let created = h
        .commands
        .create_parcel(creation(&sender, None))
        .await
        .expect("creation succeeds");
    let parcel_id = created.parcel.id;
    advance(&h.commands, &admin, parcel_id, ParcelStatus::Approved).await;

    let request = TransitionRequest {
        actor: admin.clone(),
        parcel_id,
        target: ParcelStatus::Dispatched,
        note: None,
    };
    let first = tokio::spawn({
        let commands = Arc::clone(&h.commands);
        let request = request.clone();
        async move { commands.request_transition(request).await }
    });
    let second = tokio::spawn({
        let commands = Arc::clone(&h.commands);
        let request = request.clone();
        async move { commands.request_transition(request).await }
    });

    let outcomes = [
        first.await.expect("task completes"),
        second.await.expect("task completes"),
    ];
    let successes = outcomes.iter().filter(|outcome| outcome.is_ok()).count();
    assert_eq!(successes, 1);
    for outcome in &outcomes {
        if let Err(error) = outcome {
            assert!(matches!(
                error.code(),
                ErrorCode::Conflict | ErrorCode::InvalidTransition
            ));
        }
    }

    let history = h
        .queries
        .parcel_history(ParcelHistoryRequest {
            actor: admin,
            parcel_id,
        })
        .await
        .expect("admin reads the history");
    let dispatched = history
        .events
        .iter()
        .filter(|entry| entry.status == ParcelStatus::Dispatched)
        .count();
    assert_eq!(dispatched, 1);
}
