mod test_utils;

use chrono::Duration;
use clinic_schedule_core::{
    auth::Role,
    errors::ScheduleError,
    models::timetable::{TimeWindowQuery, TimetablePatch},
};
use pretty_assertions::assert_eq;
use rstest::rstest;

use test_utils::*;

fn window(from: &str, to: &str) -> TimeWindowQuery {
    TimeWindowQuery {
        from: from.to_string(),
        to: to.to_string(),
    }
}

#[tokio::test]
async fn test_new_timetable_offers_every_slot() {
    let state = state();
    let timetable = state
        .timetables
        .create(&admin(), new_timetable("101", at(9, 0), at(10, 0)))
        .await
        .unwrap();

    let slots = state.slots.available_slots(&user("alice"), timetable.id).await.unwrap();

    assert_eq!(slots.slots, vec![at(9, 0), at(9, 30)]);
}

#[tokio::test]
async fn test_second_booking_of_a_slot_fails() {
    let state = state();
    let timetable = state
        .timetables
        .create(&admin(), new_timetable("101", at(9, 0), at(10, 0)))
        .await
        .unwrap();

    let booked = state.booking.book(&user("alice"), timetable.id, at(9, 0)).await.unwrap();
    assert_eq!(booked.username, "alice");

    let second = state.booking.book(&user("bob"), timetable.id, at(9, 0)).await;
    assert!(matches!(second, Err(ScheduleError::Validation(_))));

    let slots = state.slots.available_slots(&user("bob"), timetable.id).await.unwrap();
    assert_eq!(slots.slots, vec![at(9, 30)]);
}

#[tokio::test]
async fn test_range_must_be_whole_slots() {
    let state = state();

    let result = state
        .timetables
        .create(&admin(), new_timetable("101", at(9, 0), at(9, 50)))
        .await;

    assert!(matches!(result, Err(ScheduleError::Validation(_))));
}

#[rstest]
#[case(at(10, 0), at(9, 0))]
#[case(at(9, 0), at(9, 0))]
#[case(at(8, 0), at(8, 0) + Duration::hours(13))]
#[tokio::test]
async fn test_invalid_ranges_are_rejected(
    #[case] from_time: chrono::DateTime<chrono::Utc>,
    #[case] to_time: chrono::DateTime<chrono::Utc>,
) {
    let state = state();

    let result = state
        .timetables
        .create(&admin(), new_timetable("101", from_time, to_time))
        .await;

    assert!(matches!(result, Err(ScheduleError::Validation(_))));
}

#[tokio::test]
async fn test_overlapping_timetable_in_same_room_conflicts() {
    let state = state();
    state
        .timetables
        .create(&admin(), new_timetable("101", at(9, 0), at(10, 0)))
        .await
        .unwrap();

    let overlapping = state
        .timetables
        .create(&manager(), new_timetable("101", at(9, 30), at(10, 30)))
        .await;
    assert!(matches!(overlapping, Err(ScheduleError::Conflict(_))));

    let touching = state
        .timetables
        .create(&manager(), new_timetable("101", at(10, 0), at(11, 0)))
        .await;
    assert!(touching.is_ok());
}

#[tokio::test]
async fn test_non_booker_cannot_cancel() {
    let state = state();
    let timetable = state
        .timetables
        .create(&admin(), new_timetable("101", at(9, 0), at(10, 0)))
        .await
        .unwrap();
    let appointment = state.booking.book(&user("alice"), timetable.id, at(9, 0)).await.unwrap();

    let result = state.booking.cancel(&user("bob"), appointment.id).await;

    assert!(matches!(result, Err(ScheduleError::Authorization(_))));
    let kept = state
        .booking
        .get_appointment(&user("alice"), appointment.id)
        .await
        .unwrap();
    assert_eq!(kept, appointment);
}

#[tokio::test]
async fn test_booker_cancels_once() {
    let state = state();
    let timetable = state
        .timetables
        .create(&admin(), new_timetable("101", at(9, 0), at(10, 0)))
        .await
        .unwrap();
    let appointment = state.booking.book(&user("alice"), timetable.id, at(9, 30)).await.unwrap();

    let cancelled = state.booking.cancel(&user("alice"), appointment.id).await.unwrap();
    assert_eq!(cancelled.deleted, 1);

    let again = state.booking.cancel(&user("alice"), appointment.id).await;
    assert!(matches!(again, Err(ScheduleError::NotFound(_))));

    let slots = state.slots.available_slots(&user("alice"), timetable.id).await.unwrap();
    assert_eq!(slots.slots, vec![at(9, 0), at(9, 30)]);
}

#[tokio::test]
async fn test_manager_cancels_anyones_booking() {
    let state = state();
    let timetable = state
        .timetables
        .create(&admin(), new_timetable("101", at(9, 0), at(10, 0)))
        .await
        .unwrap();
    let appointment = state.booking.book(&user("alice"), timetable.id, at(9, 0)).await.unwrap();

    assert!(state.booking.cancel(&manager(), appointment.id).await.is_ok());
}

#[tokio::test]
async fn test_off_grid_and_out_of_range_bookings_are_rejected() {
    let state = state();
    let timetable = state
        .timetables
        .create(&admin(), new_timetable("101", at(9, 0), at(10, 0)))
        .await
        .unwrap();

    for time in [at(9, 15), at(10, 0), at(8, 30)] {
        let result = state.booking.book(&user("alice"), timetable.id, time).await;
        assert!(matches!(result, Err(ScheduleError::Validation(_))));
    }
}

#[tokio::test]
async fn test_booking_a_missing_timetable_is_not_found() {
    let state = state();

    let result = state
        .booking
        .book(&user("alice"), uuid::Uuid::new_v4(), at(9, 0))
        .await;

    assert!(matches!(result, Err(ScheduleError::NotFound(_))));
}

#[test_log::test(tokio::test(flavor = "multi_thread", worker_threads = 4))]
async fn test_concurrent_bookings_of_one_slot() {
    let state = state();
    let timetable = state
        .timetables
        .create(&admin(), new_timetable("101", at(9, 0), at(10, 0)))
        .await
        .unwrap();

    let timetable_id = timetable.id;

    let handles: Vec<_> = ["alice", "bob", "carol", "dave", "erin", "frank"]
        .into_iter()
        .map(|username| {
            let state = std::sync::Arc::clone(&state);
            tokio::spawn(async move { state.booking.book(&user(username), timetable_id, at(9, 30)).await })
        })
        .collect();

    let mut successes = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(ScheduleError::Conflict(_)) | Err(ScheduleError::Validation(_)) => {}
            Err(other) => panic!("unexpected error: {}", other),
        }
    }

    assert_eq!(successes, 1);
    let slots = state.slots.available_slots(&admin(), timetable.id).await.unwrap();
    assert_eq!(slots.slots, vec![at(9, 0)]);
}

#[test_log::test(tokio::test(flavor = "multi_thread", worker_threads = 4))]
async fn test_update_racing_a_booking() {
    for _ in 0..32 {
        let state = state();
        let timetable = state
            .timetables
            .create(&admin(), new_timetable("101", at(9, 0), at(10, 0)))
            .await
            .unwrap();
        let timetable_id = timetable.id;

        let update = tokio::spawn({
            let state = std::sync::Arc::clone(&state);
            async move {
                let patch = TimetablePatch {
                    to_time: Some(at(9, 30)),
                    ..Default::default()
                };
                state.timetables.update(&admin(), timetable_id, patch).await
            }
        });
        let book = tokio::spawn({
            let state = std::sync::Arc::clone(&state);
            async move { state.booking.book(&user("alice"), timetable_id, at(9, 30)).await }
        });

        let updated = update.await.unwrap();
        let booked = book.await.unwrap();
        let stored = state.timetables.get(&admin(), timetable_id).await.unwrap();

        match (updated, booked) {
            (Ok(updated), Err(ScheduleError::Validation(_))) => {
                assert_eq!(updated.to_time, at(9, 30));
                assert!(stored.appointments.is_empty());
            }
            (Err(ScheduleError::State(_)), Ok(appointment)) => {
                assert_eq!(stored.timetable.to_time, at(10, 0));
                assert_eq!(stored.appointments, vec![appointment]);
            }
            (updated, booked) => panic!("unexpected outcome: {:?} / {:?}", updated, booked),
        }
    }
}

#[tokio::test]
async fn test_update_with_bookings_is_refused() {
    let state = state();
    let timetable = state
        .timetables
        .create(&admin(), new_timetable("101", at(9, 0), at(10, 0)))
        .await
        .unwrap();
    state.booking.book(&user("alice"), timetable.id, at(9, 0)).await.unwrap();

    let patch = TimetablePatch {
        to_time: Some(at(11, 0)),
        ..Default::default()
    };
    let result = state.timetables.update(&admin(), timetable.id, patch).await;

    assert!(matches!(result, Err(ScheduleError::State(_))));
}

#[tokio::test]
async fn test_update_keeps_absent_fields() {
    let state = state();
    let timetable = state
        .timetables
        .create(&admin(), new_timetable("101", at(9, 0), at(10, 0)))
        .await
        .unwrap();

    let patch = TimetablePatch {
        room: Some("102".to_string()),
        to_time: Some(at(11, 0)),
        ..Default::default()
    };
    let updated = state.timetables.update(&manager(), timetable.id, patch).await.unwrap();

    assert_eq!(updated.room, "102");
    assert_eq!(updated.from_time, at(9, 0));
    assert_eq!(updated.to_time, at(11, 0));
    assert_eq!(updated.doctor_id, DOCTOR_ID);
}

#[tokio::test]
async fn test_update_revalidates_changed_references() {
    let state = state();
    let timetable = state
        .timetables
        .create(&admin(), new_timetable("101", at(9, 0), at(10, 0)))
        .await
        .unwrap();

    let unknown_room = TimetablePatch {
        room: Some("999".to_string()),
        ..Default::default()
    };
    let result = state.timetables.update(&admin(), timetable.id, unknown_room).await;
    assert!(matches!(result, Err(ScheduleError::Reference(_))));

    let unknown_doctor = TimetablePatch {
        doctor_id: Some(77),
        ..Default::default()
    };
    let result = state.timetables.update(&admin(), timetable.id, unknown_doctor).await;
    assert!(matches!(result, Err(ScheduleError::Reference(_))));
}

#[tokio::test]
async fn test_update_moving_onto_another_timetable_conflicts() {
    let state = state();
    state
        .timetables
        .create(&admin(), new_timetable("101", at(9, 0), at(10, 0)))
        .await
        .unwrap();
    let other = state
        .timetables
        .create(&admin(), new_timetable("102", at(9, 0), at(10, 0)))
        .await
        .unwrap();

    let patch = TimetablePatch {
        room: Some("101".to_string()),
        ..Default::default()
    };
    let result = state.timetables.update(&admin(), other.id, patch).await;

    assert!(matches!(result, Err(ScheduleError::Conflict(_))));
}

#[tokio::test]
async fn test_update_missing_timetable_is_not_found() {
    let state = state();

    let result = state
        .timetables
        .update(&admin(), uuid::Uuid::new_v4(), TimetablePatch::default())
        .await;

    assert!(matches!(result, Err(ScheduleError::NotFound(_))));
}

#[rstest]
#[case(7, DOCTOR_ID, "101")]
#[case(HOSPITAL_ID, 77, "101")]
#[case(HOSPITAL_ID, DOCTOR_ID, "303")]
#[tokio::test]
async fn test_create_checks_directory_references(
    #[case] hospital_id: i64,
    #[case] doctor_id: i64,
    #[case] room: &str,
) {
    let state = state();
    let mut new = new_timetable(room, at(9, 0), at(10, 0));
    new.hospital_id = hospital_id;
    new.doctor_id = doctor_id;

    let result = state.timetables.create(&admin(), new).await;

    assert!(matches!(result, Err(ScheduleError::Reference(_))));
}

#[rstest]
#[case(caller("alice", &[Role::User]))]
#[case(caller("doc", &[Role::Doctor]))]
#[case(caller("nobody", &[]))]
#[tokio::test]
async fn test_only_admins_and_managers_create(#[case] ctx: clinic_schedule_api::middleware::auth::AuthContext) {
    let state = state();

    let result = state
        .timetables
        .create(&ctx, new_timetable("101", at(9, 0), at(10, 0)))
        .await;

    assert!(matches!(result, Err(ScheduleError::Authorization(_))));
}

#[tokio::test]
async fn test_principal_without_roles_cannot_read() {
    let state = state();

    let result = state
        .timetables
        .find_by_hospital(
            &caller("nobody", &[]),
            HOSPITAL_ID,
            &window("2024-01-01T00:00:00Z", "2024-01-02T00:00:00Z"),
        )
        .await;

    assert!(matches!(result, Err(ScheduleError::Authorization(_))));
}

#[tokio::test]
async fn test_delete_cascades_to_appointments() {
    let state = state();
    let timetable = state
        .timetables
        .create(&admin(), new_timetable("101", at(9, 0), at(10, 0)))
        .await
        .unwrap();
    let appointment = state.booking.book(&user("alice"), timetable.id, at(9, 0)).await.unwrap();

    state.timetables.delete(&admin(), timetable.id).await.unwrap();

    assert!(matches!(
        state.timetables.get(&admin(), timetable.id).await,
        Err(ScheduleError::NotFound(_))
    ));
    assert!(matches!(
        state.booking.get_appointment(&admin(), appointment.id).await,
        Err(ScheduleError::NotFound(_))
    ));
    assert!(matches!(
        state.timetables.delete(&admin(), timetable.id).await,
        Err(ScheduleError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_bulk_deletes() {
    let state = state();
    state
        .timetables
        .create(&admin(), new_timetable("101", at(9, 0), at(10, 0)))
        .await
        .unwrap();
    state
        .timetables
        .create(&admin(), new_timetable("102", at(9, 0), at(10, 0)))
        .await
        .unwrap();

    let deleted = state.timetables.delete_by_doctor(&admin(), DOCTOR_ID).await.unwrap();
    assert_eq!(deleted.deleted, 2);

    let nothing_left = state.timetables.delete_by_hospital(&admin(), HOSPITAL_ID).await;
    assert!(matches!(nothing_left, Err(ScheduleError::NotFound(_))));
}

#[tokio::test]
async fn test_find_by_hospital_uses_containment_and_attaches_bookings() {
    let state = state();
    let morning = state
        .timetables
        .create(&admin(), new_timetable("101", at(9, 0), at(10, 0)))
        .await
        .unwrap();
    state
        .timetables
        .create(&admin(), new_timetable("102", at(11, 0), at(12, 0)))
        .await
        .unwrap();
    state.booking.book(&user("alice"), morning.id, at(9, 30)).await.unwrap();

    let found = state
        .timetables
        .find_by_hospital(
            &user("alice"),
            HOSPITAL_ID,
            &window("2024-01-01T08:00:00Z", "2024-01-01T11:30:00Z"),
        )
        .await
        .unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].timetable.id, morning.id);
    assert_eq!(found[0].appointments.len(), 1);
    assert_eq!(found[0].appointments[0].time, at(9, 30));
}

#[tokio::test]
async fn test_find_by_doctor_returns_empty_list() {
    let state = state();

    let found = state
        .timetables
        .find_by_doctor(
            &user("alice"),
            DOCTOR_ID,
            &window("2024-01-01T00:00:00", "2024-01-02T00:00:00"),
        )
        .await
        .unwrap();

    assert!(found.is_empty());
}

#[tokio::test]
async fn test_find_by_unknown_doctor_is_a_reference_error() {
    let state = state();

    let result = state
        .timetables
        .find_by_doctor(
            &user("alice"),
            77,
            &window("2024-01-01T00:00:00Z", "2024-01-02T00:00:00Z"),
        )
        .await;

    assert!(matches!(result, Err(ScheduleError::Reference(_))));
}

#[tokio::test]
async fn test_find_by_room() {
    let state = state();
    let doctor = caller("doc", &[Role::Doctor]);
    let day = window("2024-01-01T00:00:00Z", "2024-01-02T00:00:00Z");

    let empty = state.timetables.find_by_room(&doctor, HOSPITAL_ID, "101", &day).await;
    assert!(matches!(empty, Err(ScheduleError::NotFound(_))));

    let unknown_room = state.timetables.find_by_room(&doctor, HOSPITAL_ID, "999", &day).await;
    assert!(matches!(unknown_room, Err(ScheduleError::Reference(_))));

    let denied = state.timetables.find_by_room(&user("alice"), HOSPITAL_ID, "101", &day).await;
    assert!(matches!(denied, Err(ScheduleError::Authorization(_))));

    state
        .timetables
        .create(&admin(), new_timetable("101", at(9, 0), at(10, 0)))
        .await
        .unwrap();
    let found = state
        .timetables
        .find_by_room(&doctor, HOSPITAL_ID, "101", &day)
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
}

#[tokio::test]
async fn test_unparseable_window_is_a_validation_error() {
    let state = state();

    let result = state
        .timetables
        .find_by_hospital(&user("alice"), HOSPITAL_ID, &window("yesterday", "2024-01-02T00:00:00Z"))
        .await;

    assert!(matches!(result, Err(ScheduleError::Validation(_))));
}

#[tokio::test]
async fn test_directory_outage_is_upstream() {
    let mut directory = clinic_schedule_core::mock::MockDirectory::new();
    directory
        .expect_resolve_hospital()
        .returning(|_, _| Err(ScheduleError::Upstream("connection refused".to_string())));
    let state = state_with(directory);

    let result = state
        .timetables
        .create(&admin(), new_timetable("101", at(9, 0), at(10, 0)))
        .await;

    assert!(matches!(result, Err(ScheduleError::Upstream(_))));
}
