// ABOUTME: Integration tests for the user, bike and rental repositories
// ABOUTME: Exercises CRUD paths and mapped reads over an in-memory database

#![allow(missing_docs, clippy::unwrap_used)]

use chrono::{Duration, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use velo_rental::database::Database;
use velo_rental::models::RentalStatus;

async fn create_test_db() -> Database {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    let db = Database::from_pool(pool);
    db.migrate().await.unwrap();
    db
}

#[tokio::test]
async fn opens_and_migrates_a_file_backed_database() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite:{}", dir.path().join("rental.db").display());

    let db = Database::new(&url).await.unwrap();
    let user = db
        .create_user("rider@example.com", "hash", "Ada", "Lovelace")
        .await
        .unwrap();

    // A second handle over the same file sees the committed data.
    let db2 = Database::new(&url).await.unwrap();
    let found = db2.get_user(user.id).await.unwrap().unwrap();
    assert_eq!(found.email, "rider@example.com");
}

#[tokio::test]
async fn user_create_and_lookup_round_trip() {
    let db = create_test_db().await;
    let user = db
        .create_user("rider@example.com", "$2b$12$hash", "Ada", "Lovelace")
        .await
        .unwrap();

    assert!(user.id > 0);
    assert_eq!(user.email, "rider@example.com");
    assert!(!user.deleted);
    assert!(user.created_at > Utc::now() - Duration::minutes(1));

    let by_email = db.get_user_by_email("rider@example.com").await.unwrap();
    assert_eq!(by_email.unwrap().id, user.id);

    let by_id = db.get_user(user.id).await.unwrap().unwrap();
    assert_eq!(by_id.first_name, "Ada");
}

#[tokio::test]
async fn soft_deleted_user_is_hidden_from_email_lookup() {
    let db = create_test_db().await;
    let user = db
        .create_user("rider@example.com", "hash", "Ada", "Lovelace")
        .await
        .unwrap();

    assert!(db.delete_user(user.id).await.unwrap());
    assert!(db.get_user_by_email("rider@example.com").await.unwrap().is_none());

    // Still reachable by id for history and admin views.
    let by_id = db.get_user(user.id).await.unwrap().unwrap();
    assert!(by_id.deleted);

    // Deleting an unknown id reports false.
    assert!(!db.delete_user(9999).await.unwrap());
}

#[tokio::test]
async fn user_profile_update_changes_fields_and_bumps_updated_at() {
    let db = create_test_db().await;
    let user = db
        .create_user("rider@example.com", "hash", "Ada", "Lovelace")
        .await
        .unwrap();

    db.update_user(user.id, "ada@example.com", "Ada", "King")
        .await
        .unwrap();
    let updated = db.get_user(user.id).await.unwrap().unwrap();
    assert_eq!(updated.email, "ada@example.com");
    assert_eq!(updated.last_name, "King");
    assert!(updated.updated_at >= user.updated_at);
}

#[tokio::test]
async fn bike_fleet_crud_and_availability_listing() {
    let db = create_test_db().await;
    let b1 = db.create_bike(48.85, 2.35, 0.25).await.unwrap();
    let b2 = db.create_bike(48.86, 2.36, 0.30).await.unwrap();

    assert!(b1.is_available);
    assert_eq!(db.get_bikes().await.unwrap().len(), 2);

    db.set_bike_availability(b1.id, false).await.unwrap();
    let available = db.get_available_bikes().await.unwrap();
    assert_eq!(available.len(), 1);
    assert_eq!(available[0].id, b2.id);

    db.update_bike(b2.id, true, 50.0, 3.0, 0.40).await.unwrap();
    let updated = db.get_bike(b2.id).await.unwrap().unwrap();
    assert!((updated.latitude - 50.0).abs() < f64::EPSILON);
    assert!((updated.cost_per_minute - 0.40).abs() < f64::EPSILON);

    assert!(db.delete_bike(b1.id).await.unwrap());
    assert!(!db.delete_bike(b1.id).await.unwrap());
    assert_eq!(db.get_bikes().await.unwrap().len(), 1);
}

#[tokio::test]
async fn rental_lifecycle_round_trip() {
    let db = create_test_db().await;
    let user = db
        .create_user("rider@example.com", "hash", "Ada", "Lovelace")
        .await
        .unwrap();
    let bike = db.create_bike(48.85, 2.35, 0.25).await.unwrap();

    let start = Utc::now() - Duration::minutes(10);
    let rental = db
        .create_rental(user.id, bike.id, start, bike.latitude, bike.longitude)
        .await
        .unwrap();

    assert_eq!(rental.rental_status, RentalStatus::Running);
    assert_eq!(rental.end_time, None);
    assert_eq!(rental.duration_minutes, None);
    assert_eq!(rental.cost, None);

    let running = db.get_running_rental(user.id).await.unwrap().unwrap();
    assert_eq!(running.id, rental.id);

    let end = Utc::now();
    db.end_rental(rental.id, end, 48.87, 2.33, 10, 2.5)
        .await
        .unwrap();

    assert!(db.get_running_rental(user.id).await.unwrap().is_none());
    let ended = db.get_rental(rental.id).await.unwrap().unwrap();
    assert_eq!(ended.rental_status, RentalStatus::Ended);
    assert!(ended.end_time.is_some());
    assert_eq!(ended.duration_minutes, Some(10));
    assert_eq!(ended.cost, Some(2.5));
    assert_eq!(ended.end_latitude, Some(48.87));
}

#[tokio::test]
async fn rental_record_can_be_rewritten_wholesale() {
    let db = create_test_db().await;
    let user = db
        .create_user("rider@example.com", "hash", "Ada", "Lovelace")
        .await
        .unwrap();
    let bike = db.create_bike(48.85, 2.35, 0.25).await.unwrap();

    let mut rental = db
        .create_rental(user.id, bike.id, Utc::now() - Duration::minutes(30), 48.85, 2.35)
        .await
        .unwrap();

    rental.rental_status = RentalStatus::Ended;
    rental.end_time = Some(Utc::now());
    rental.end_latitude = Some(48.87);
    rental.end_longitude = Some(2.33);
    rental.duration_minutes = Some(30);
    rental.cost = Some(7.5);
    assert!(db.update_rental(&rental).await.unwrap());

    let stored = db.get_rental(rental.id).await.unwrap().unwrap();
    assert_eq!(stored.rental_status, RentalStatus::Ended);
    assert_eq!(stored.duration_minutes, Some(30));
    assert_eq!(stored.cost, Some(7.5));
    assert_eq!(stored.end_latitude, Some(48.87));

    // Unknown ids touch nothing.
    rental.id = 9999;
    assert!(!db.update_rental(&rental).await.unwrap());
}

#[tokio::test]
async fn rental_history_is_newest_first() {
    let db = create_test_db().await;
    let user = db
        .create_user("rider@example.com", "hash", "Ada", "Lovelace")
        .await
        .unwrap();
    let bike = db.create_bike(48.85, 2.35, 0.25).await.unwrap();

    let older = db
        .create_rental(
            user.id,
            bike.id,
            Utc::now() - Duration::hours(2),
            48.85,
            2.35,
        )
        .await
        .unwrap();
    db.end_rental(older.id, Utc::now() - Duration::hours(1), 48.86, 2.36, 60, 15.0)
        .await
        .unwrap();
    let newer = db
        .create_rental(user.id, bike.id, Utc::now(), 48.86, 2.36)
        .await
        .unwrap();

    let history = db.get_rentals_for_user(user.id).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].id, newer.id);
    assert_eq!(history[1].id, older.id);

    // The admin view sees the same rentals.
    assert_eq!(db.get_rentals().await.unwrap().len(), 2);
}
