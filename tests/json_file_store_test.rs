use anyhow::Result;
use chrono::{NaiveDate, NaiveTime};
use slot_scheduler::domain::model::{OpeningHours, WeeklyHours};
use slot_scheduler::{
    AppointmentStatus, BookingRequest, Business, DocumentStore, JsonFileStore, Scheduler,
    SchedulerSettings, ServiceDetails, TracingNotifier,
};
use std::sync::Arc;
use tempfile::TempDir;

fn florist() -> Business {
    Business {
        id: "florist".to_string(),
        name: "Petal & Stem".to_string(),
        slot_granularity_minutes: 30,
        hours: WeeklyHours {
            friday: Some(OpeningHours {
                open: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
                close: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
            }),
            ..Default::default()
        },
    }
}

fn friday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 24).unwrap()
}

async fn open_scheduler(
    path: &std::path::Path,
) -> Result<Scheduler<JsonFileStore, TracingNotifier>> {
    let store = JsonFileStore::open(path).await?;
    Ok(Scheduler::new(
        Arc::new(store),
        TracingNotifier,
        SchedulerSettings::default(),
    ))
}

#[tokio::test]
async fn test_state_survives_reopen() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let data_file = temp_dir.path().join("nested").join("store.json");

    let appointment_id = {
        let scheduler = open_scheduler(&data_file).await?;
        let day = scheduler.open_day(&florist(), friday()).await?;
        assert_eq!(day.slots.len(), 4);

        let receipt = scheduler
            .book_appointment(BookingRequest {
                business_id: "florist".to_string(),
                customer_id: "alice".to_string(),
                service_id: "bouquet".to_string(),
                date: friday(),
                start_time: friday().and_hms_opt(10, 30, 0).unwrap(),
                slot_indexes: vec![1, 2],
                service_duration_minutes: 60,
                service: ServiceDetails {
                    name: "Bouquet consultation".to_string(),
                    price: 40.0,
                },
            })
            .await?;
        scheduler.approve_appointment("florist", &receipt.appointment_id).await?;
        receipt.appointment_id
    };

    assert!(data_file.exists());

    let reopened = open_scheduler(&data_file).await?;
    let appointment = reopened.get_appointment(&appointment_id).await?;
    assert_eq!(appointment.status, AppointmentStatus::Confirmed);
    assert_eq!(appointment.customer_id, "alice");

    let starts: Vec<String> = reopened
        .find_available_slots("florist", friday(), 30)
        .await
        .iter()
        .map(|c| c.time)
        .collect();
    assert_eq!(starts, vec!["10:00", "11:30"]);

    Ok(())
}

#[tokio::test]
async fn test_versions_persist_across_reopen() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let data_file = temp_dir.path().join("store.json");

    {
        let store = JsonFileStore::open(&data_file).await?;
        store
            .insert("businesses/florist", serde_json::to_value(florist())?)
            .await?;
        store
            .insert("businesses/florist", serde_json::to_value(florist())?)
            .await?;
    }

    let store = JsonFileStore::open(&data_file).await?;
    let doc = store.get_document("businesses/florist").await?.unwrap();
    assert_eq!(doc.version, 2);
    assert_eq!(doc.data["slotGranularityMinutes"], 30);
    Ok(())
}

#[tokio::test]
async fn test_empty_file_opens_as_empty_store() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let data_file = temp_dir.path().join("store.json");
    std::fs::write(&data_file, b"")?;

    let store = JsonFileStore::open(&data_file).await?;
    assert!(store.get_document("appointments/x").await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_corrupt_file_is_an_error() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let data_file = temp_dir.path().join("store.json");
    std::fs::write(&data_file, b"{not json")?;

    assert!(JsonFileStore::open(&data_file).await.is_err());
    Ok(())
}

#[tokio::test]
async fn test_failed_save_leaves_nothing_committed() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let data_file = temp_dir.path().join("store.json");
    let store = Arc::new(JsonFileStore::open(&data_file).await?);
    let scheduler = Scheduler::new(store.clone(), TracingNotifier, SchedulerSettings::default());
    scheduler.open_day(&florist(), friday()).await?;
    let saved = std::fs::read(&data_file)?;

    // A directory where the temporary snapshot goes makes every save fail.
    let blocker = temp_dir.path().join("store.json.tmp");
    std::fs::create_dir(&blocker)?;

    let request = BookingRequest {
        business_id: "florist".to_string(),
        customer_id: "alice".to_string(),
        service_id: "bouquet".to_string(),
        date: friday(),
        start_time: friday().and_hms_opt(10, 0, 0).unwrap(),
        slot_indexes: vec![0, 1],
        service_duration_minutes: 60,
        service: ServiceDetails {
            name: "Bouquet consultation".to_string(),
            price: 40.0,
        },
    };
    assert!(scheduler.book_appointment(request.clone()).await.is_err());

    let free = scheduler.find_available_slots("florist", friday(), 30).await;
    assert_eq!(free.iter().count(), 4);
    let day_path = "businesses/florist/slots/2025-01-24";
    let before = store.get_document(day_path).await?.unwrap();
    let mut fields = serde_json::Map::new();
    fields.insert("slots".to_string(), serde_json::json!([]));
    assert!(store.update_document(day_path, fields).await.is_err());
    assert_eq!(store.get_document(day_path).await?.unwrap(), before);
    assert_eq!(std::fs::read(&data_file)?, saved);

    std::fs::remove_dir(&blocker)?;
    let receipt = scheduler.book_appointment(request).await?;
    let reopened = open_scheduler(&data_file).await?;
    assert_eq!(
        reopened.get_appointment(&receipt.appointment_id).await?.slot_indexes,
        vec![0, 1]
    );
    Ok(())
}
