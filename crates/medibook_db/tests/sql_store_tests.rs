//! SQL store behaviour against an in-memory SQLite database

use chrono::NaiveDate;
use medibook_db::{
    AccountDefaults, AccountDirectory, BookingStatus, BookingStore, CapacityClaim, CommitOutcome,
    DbClient, DbError, NewBooking, ReservationStore, SlotKey, SlotRegistry, SqlReservationStore,
};

async fn create_store() -> SqlReservationStore {
    let db_client = DbClient::from_url("sqlite::memory:")
        .await
        .expect("in-memory database");
    let store = SqlReservationStore::new(db_client);
    store.init_schema().await.expect("schema");
    store
}

fn slot(time_slot: &str) -> SlotKey {
    SlotKey::new(7, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(), time_slot)
}

fn defaults(name: &str) -> AccountDefaults {
    AccountDefaults {
        first_name: name.to_string(),
        address: "1 Main St".to_string(),
        gender: "F".to_string(),
    }
}

#[tokio::test]
async fn init_schema_is_idempotent() {
    let store = create_store().await;
    store.init_schema().await.unwrap();
}

#[tokio::test]
async fn define_creates_and_updates_capacity() {
    let store = create_store().await;
    let created = store.slots().define(&slot("T1"), 2).await.unwrap();
    assert_eq!(created.max_number, 2);
    assert_eq!(created.current_number, 0);

    store.slots().increment_reserved(&slot("T1")).await.unwrap();
    let raised = store.slots().define(&slot("T1"), 3).await.unwrap();
    assert_eq!(raised.max_number, 3);
    assert_eq!(raised.current_number, 1);

    let err = store.slots().define(&slot("T1"), 0).await.unwrap_err();
    assert!(matches!(err, DbError::InvalidCapacity(_)));
    let unchanged = store.slots().get(&slot("T1")).await.unwrap().unwrap();
    assert_eq!(unchanged.max_number, 3);
}

#[tokio::test]
async fn increment_stops_at_capacity() {
    let store = create_store().await;
    store.slots().define(&slot("T1"), 1).await.unwrap();

    let first = store.slots().increment_reserved(&slot("T1")).await.unwrap();
    assert!(matches!(first, CapacityClaim::Claimed(ref s) if s.current_number == 1));

    let second = store.slots().increment_reserved(&slot("T1")).await.unwrap();
    assert!(matches!(second, CapacityClaim::Full(ref s) if s.current_number == 1));

    let missing = store.slots().increment_reserved(&slot("T9")).await.unwrap();
    assert_eq!(missing, CapacityClaim::Missing);
}

#[tokio::test]
async fn find_or_create_returns_existing_account_unchanged() {
    let store = create_store().await;
    let first = store
        .accounts()
        .find_or_create("ann@example.com", &defaults("Ann"))
        .await
        .unwrap();
    let again = store
        .accounts()
        .find_or_create("ann@example.com", &defaults("Someone Else"))
        .await
        .unwrap();

    assert_eq!(first.id, again.id);
    assert_eq!(again.first_name, "Ann");
    assert_eq!(again.role_id, "R3");
}

#[tokio::test]
async fn commit_new_booking_is_all_or_nothing() {
    let store = create_store().await;
    store.slots().define(&slot("T1"), 1).await.unwrap();
    let ann = store
        .accounts()
        .find_or_create("ann@example.com", &defaults("Ann"))
        .await
        .unwrap();
    let bob = store
        .accounts()
        .find_or_create("bob@example.com", &defaults("Bob"))
        .await
        .unwrap();

    let outcome = store
        .commit_new_booking(NewBooking {
            patient_id: ann.id,
            slot: slot("T1"),
            token: "tok-ann".to_string(),
        })
        .await
        .unwrap();
    let CommitOutcome::Committed { booking, slot: claimed } = outcome else {
        panic!("expected commit, got {:?}", outcome);
    };
    assert_eq!(booking.status, BookingStatus::Pending);
    assert_eq!(booking.time_slot, "T1");
    assert_eq!(claimed.current_number, 1);

    let full = store
        .commit_new_booking(NewBooking {
            patient_id: bob.id,
            slot: slot("T1"),
            token: "tok-bob".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(full, CommitOutcome::SlotFull);
    assert_eq!(
        store.bookings().list_for_provider(7, slot("T1").date).await.unwrap().len(),
        1
    );

    let missing = store
        .commit_new_booking(NewBooking {
            patient_id: bob.id,
            slot: slot("T9"),
            token: "tok-bob".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(missing, CommitOutcome::SlotMissing);
}

#[tokio::test]
async fn duplicate_active_booking_rolls_back_the_claim() {
    let store = create_store().await;
    store.slots().define(&slot("T1"), 5).await.unwrap();
    store.slots().define(&slot("T2"), 5).await.unwrap();
    let ann = store
        .accounts()
        .find_or_create("ann@example.com", &defaults("Ann"))
        .await
        .unwrap();

    store
        .commit_new_booking(NewBooking {
            patient_id: ann.id,
            slot: slot("T1"),
            token: "one".to_string(),
        })
        .await
        .unwrap();
    let err = store
        .commit_new_booking(NewBooking {
            patient_id: ann.id,
            slot: slot("T2"),
            token: "two".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::UniqueViolation(_)), "got {:?}", err);

    let t2 = store.slots().get(&slot("T2")).await.unwrap().unwrap();
    assert_eq!(t2.current_number, 0);
}

#[tokio::test]
async fn cancelled_booking_can_be_reactivated_with_new_token() {
    let store = create_store().await;
    store.slots().define(&slot("T1"), 5).await.unwrap();
    let ann = store
        .accounts()
        .find_or_create("ann@example.com", &defaults("Ann"))
        .await
        .unwrap();
    let CommitOutcome::Committed { booking, .. } = store
        .commit_new_booking(NewBooking {
            patient_id: ann.id,
            slot: slot("T1"),
            token: "old".to_string(),
        })
        .await
        .unwrap()
    else {
        panic!("expected commit");
    };

    let cancelled = store
        .bookings()
        .transition(booking.id, &BookingStatus::ACTIVE, BookingStatus::Cancelled, None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    assert_eq!(cancelled.token, "old");

    let found = store
        .bookings()
        .find_for_requester("ann@example.com", 7, slot("T1").date, &[BookingStatus::Cancelled])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, booking.id);

    let restored = store
        .bookings()
        .transition(
            booking.id,
            &[BookingStatus::Cancelled],
            BookingStatus::Pending,
            Some("new"),
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(restored.status, BookingStatus::Pending);
    assert_eq!(restored.token, "new");

    let by_token = store
        .bookings()
        .find_by_token(7, "new", BookingStatus::Pending)
        .await
        .unwrap();
    assert_eq!(by_token.map(|b| b.id), Some(booking.id));
}

#[tokio::test]
async fn legacy_status_codes_are_readable() {
    let store = create_store().await;
    let ann = store
        .accounts()
        .find_or_create("ann@example.com", &defaults("Ann"))
        .await
        .unwrap();
    sqlx::query(
        "INSERT INTO bookings (patient_id, provider_id, date, time_slot, status, token, created_at) \
         VALUES ($1, 7, '2024-05-01', 'T1', 'S2', 'legacy', '2024-04-30T10:00:00.000Z')",
    )
    .bind(ann.id)
    .execute(store.db_client().pool())
    .await
    .unwrap();

    let found = store
        .bookings()
        .find_for_requester("ann@example.com", 7, slot("T1").date, &BookingStatus::ACTIVE)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.status, BookingStatus::Confirmed);
}

#[tokio::test]
async fn unknown_status_literal_is_a_decode_error() {
    let store = create_store().await;
    let ann = store
        .accounts()
        .find_or_create("ann@example.com", &defaults("Ann"))
        .await
        .unwrap();
    sqlx::query(
        "INSERT INTO bookings (patient_id, provider_id, date, time_slot, status, token, created_at) \
         VALUES ($1, 7, '2024-05-01', 'T1', 'S3', 'odd', '2024-04-30T10:00:00.000Z')",
    )
    .bind(ann.id)
    .execute(store.db_client().pool())
    .await
    .unwrap();

    let err = store
        .bookings()
        .list_for_provider(7, slot("T1").date)
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Decode(_)));
}

#[tokio::test]
async fn concurrent_commits_never_exceed_capacity() {
    let store = create_store().await;
    store.slots().define(&slot("T1"), 3).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..10 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            let account = store
                .accounts()
                .find_or_create(&format!("p{}@example.com", i), &defaults("P"))
                .await
                .unwrap();
            store
                .commit_new_booking(NewBooking {
                    patient_id: account.id,
                    slot: slot("T1"),
                    token: format!("tok-{}", i),
                })
                .await
                .unwrap()
        }));
    }

    let mut committed = 0;
    for handle in handles {
        if let CommitOutcome::Committed { .. } = handle.await.unwrap() {
            committed += 1;
        }
    }
    assert_eq!(committed, 3);
    let t1 = store.slots().get(&slot("T1")).await.unwrap().unwrap();
    assert_eq!(t1.current_number, 3);
}
