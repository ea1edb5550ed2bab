#[cfg(test)]
mod tests {
    use crate::admin::BookingAdmin;
    use crate::models::VerifyRequest;
    use crate::test_support::*;
    use crate::verification::VerificationService;
    use medibook_db::{BookingStore, ReservationStore, SlotRegistry};
    use proptest::prelude::*;
    use std::collections::HashMap;

    const SLOTS: [&str; 3] = ["T1", "T2", "T3"];

    #[derive(Debug, Clone)]
    enum Op {
        Reserve { patient: usize, slot: usize },
        Cancel { patient: usize },
        Confirm { patient: usize },
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => (0..6usize, 0..SLOTS.len()).prop_map(|(patient, slot)| Op::Reserve { patient, slot }),
            1 => (0..6usize).prop_map(|patient| Op::Cancel { patient }),
            1 => (0..6usize).prop_map(|patient| Op::Confirm { patient }),
        ]
    }

    fn email(patient: usize) -> String {
        format!("p{}@example.com", patient)
    }

    async fn check_invariants(store: &medibook_db::MemoryReservationStore) {
        let slots = store.slots().list_for_provider(PROVIDER, day()).await.unwrap();
        let bookings = store.bookings().list_for_provider(PROVIDER, day()).await.unwrap();

        for slot in &slots {
            assert!(slot.current_number >= 0);
            assert!(slot.current_number <= slot.max_number, "over-booked {:?}", slot);
            let active = bookings
                .iter()
                .filter(|b| b.time_slot == slot.key.time_slot && b.status.is_active())
                .count() as i64;
            assert!(active <= slot.current_number, "{} active on {:?}", active, slot);
        }

        let mut per_patient: HashMap<i64, usize> = HashMap::new();
        for booking in bookings.iter().filter(|b| b.status.is_active()) {
            *per_patient.entry(booking.patient_id).or_default() += 1;
        }
        assert!(per_patient.values().all(|count| *count <= 1));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        // Any interleaving of reserve, cancel and confirm keeps the counters consistent
        #[test]
        fn test_capacity_invariant_holds(
            capacities in proptest::collection::vec(0..4i64, SLOTS.len()),
            ops in proptest::collection::vec(op_strategy(), 1..40),
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();

            runtime.block_on(async {
                let definitions: Vec<(&str, i64)> =
                    SLOTS.iter().copied().zip(capacities.iter().copied()).collect();
                let store = store_with_slots(&definitions).await;
                let (_recorder, dispatcher) = recording();
                let coordinator = coordinator(&store, dispatcher);
                let verification = VerificationService::new(store.clone());
                let admin = BookingAdmin::new(store.clone());

                for op in &ops {
                    match op {
                        Op::Reserve { patient, slot } => {
                            coordinator
                                .reserve(request(&email(*patient), SLOTS[*slot]))
                                .await
                                .unwrap();
                        }
                        Op::Cancel { patient } | Op::Confirm { patient } => {
                            let found = store
                                .bookings()
                                .find_for_requester(
                                    &email(*patient),
                                    PROVIDER,
                                    day(),
                                    &medibook_db::BookingStatus::ACTIVE,
                                )
                                .await
                                .unwrap();
                            if let Some(booking) = found {
                                if matches!(op, Op::Cancel { .. }) {
                                    admin.cancel(booking.id).await.unwrap();
                                } else {
                                    verification
                                        .confirm(VerifyRequest {
                                            token: Some(booking.token.clone()),
                                            provider_id: Some(PROVIDER),
                                        })
                                        .await
                                        .unwrap();
                                }
                            }
                        }
                    }
                    check_invariants(&store).await;
                }
            });
        }
    }
}
