use super::*;

#[tokio::test]
async fn health_check_succeeds_for_live_pool() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.health_check().await.expect("health check");
}

#[tokio::test]
async fn creates_database_file_when_missing() {
    let suffix = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let temp_root = std::env::temp_dir().join(format!("trip_storage_test_{suffix}"));
    let db_path = temp_root.join("nested").join("trip.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let storage = Storage::new(&database_url).await.expect("db");
    drop(storage);

    assert!(
        db_path.exists(),
        "database file should exist: {}",
        db_path.display()
    );

    std::fs::remove_dir_all(temp_root).expect("cleanup");
}

#[tokio::test]
async fn lists_created_days_in_ascending_order() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.create_day(DayNumber(1)).await.expect("day 1");
    storage.create_day(DayNumber(2)).await.expect("day 2");
    storage.create_day(DayNumber(3)).await.expect("day 3");

    let days = storage.list_days().await.expect("list");
    let numbers: Vec<DayNumber> = days.iter().map(|day| day.number).collect();
    assert_eq!(numbers, vec![DayNumber(1), DayNumber(2), DayNumber(3)]);
    assert_eq!(storage.day_count().await.expect("count"), 3);
}

#[tokio::test]
async fn rejects_duplicate_day_numbers() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.create_day(DayNumber(1)).await.expect("day 1");
    assert!(storage.create_day(DayNumber(1)).await.is_err());
}

#[tokio::test]
async fn groups_attractions_into_their_slots() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.create_day(DayNumber(1)).await.expect("day");
    storage
        .add_attraction(DayNumber(1), AttractionKind::Hotel, "Grand Hotel")
        .await
        .expect("hotel");
    storage
        .add_attraction(DayNumber(1), AttractionKind::Restaurant, "Chez Nous")
        .await
        .expect("restaurant");
    storage
        .add_attraction(DayNumber(1), AttractionKind::Restaurant, "Trattoria")
        .await
        .expect("restaurant");
    storage
        .add_attraction(DayNumber(1), AttractionKind::Activity, "Museum")
        .await
        .expect("activity");

    let days = storage.list_days().await.expect("list");
    assert_eq!(days.len(), 1);
    let day = &days[0];
    assert_eq!(day.hotel.as_ref().map(|h| h.name.as_str()), Some("Grand Hotel"));
    let restaurants: Vec<&str> = day.restaurant.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(restaurants, vec!["Chez Nous", "Trattoria"]);
    let activities: Vec<&str> = day.activity.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(activities, vec!["Museum"]);
}

#[tokio::test]
async fn delete_day_closes_the_numbering_gap() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    for number in 1..=4u32 {
        storage.create_day(DayNumber(number)).await.expect("day");
    }
    storage
        .add_attraction(DayNumber(4), AttractionKind::Activity, "Kayaking")
        .await
        .expect("activity");

    let existed = storage.delete_day(DayNumber(2)).await.expect("delete");
    assert!(existed);

    let days = storage.list_days().await.expect("list");
    let numbers: Vec<DayNumber> = days.iter().map(|day| day.number).collect();
    assert_eq!(numbers, vec![DayNumber(1), DayNumber(2), DayNumber(3)]);
    // the attraction followed its day from number 4 to number 3
    assert_eq!(days[2].activity.len(), 1);
    assert_eq!(days[2].activity[0].name, "Kayaking");
}

#[tokio::test]
async fn delete_day_reports_missing_numbers() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.create_day(DayNumber(1)).await.expect("day");
    let existed = storage.delete_day(DayNumber(9)).await.expect("delete");
    assert!(!existed);
    assert_eq!(storage.day_count().await.expect("count"), 1);
}

#[tokio::test]
async fn deleting_a_day_drops_its_attractions() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.create_day(DayNumber(1)).await.expect("day");
    storage.create_day(DayNumber(2)).await.expect("day");
    let id = storage
        .add_attraction(DayNumber(1), AttractionKind::Hotel, "Grand Hotel")
        .await
        .expect("hotel");

    storage.delete_day(DayNumber(1)).await.expect("delete");

    let days = storage.list_days().await.expect("list");
    assert_eq!(days.len(), 1);
    assert!(days[0].hotel.is_none());
    // the row is gone, not merely detached
    assert!(!storage.remove_attraction(id).await.expect("remove"));
}

#[tokio::test]
async fn removes_individual_attractions() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.create_day(DayNumber(1)).await.expect("day");
    let id = storage
        .add_attraction(DayNumber(1), AttractionKind::Activity, "Museum")
        .await
        .expect("activity");

    assert!(storage.remove_attraction(id).await.expect("remove"));
    assert!(!storage.remove_attraction(id).await.expect("second remove"));
    let days = storage.list_days().await.expect("list");
    assert!(days[0].activity.is_empty());
}
