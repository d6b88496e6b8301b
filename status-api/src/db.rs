use crate::errors::{Error, Result};
use crate::metrics::QUERY_LATENCY_SECONDS;
use crate::model::{
    encode_timestamp, DeviceStatus, DeviceStatusUpdate, NewDeviceStatus, SummaryItem,
};
use crate::validate::validate_update;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

const COLUMNS: &str = "id, device_id, timestamp, battery_level, rssi, online";

// Every "latest" lookup orders the same way: newest reading first, later insert wins a tie.
const LATEST_ORDER: &str = "ORDER BY timestamp DESC, id DESC";

pub async fn make_pool(database_url: &str, max_connections: u32) -> Result<SqlitePool> {
    info!("Connecting to database...");
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options)
        .await?;

    info!("Database connection established");
    info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Migrations completed");

    Ok(pool)
}

/// Stores a new reading and returns it with its assigned id.
pub async fn insert(pool: &SqlitePool, status: &NewDeviceStatus) -> Result<DeviceStatus> {
    let _timer = QUERY_LATENCY_SECONDS.start_timer();
    let query = format!(
        "INSERT INTO device_status (device_id, timestamp, battery_level, rssi, online)
         VALUES (?, ?, ?, ?, ?)
         RETURNING {COLUMNS}"
    );

    let stored = sqlx::query_as::<_, DeviceStatus>(&query)
        .bind(&status.device_id)
        .bind(encode_timestamp(&status.timestamp))
        .bind(status.battery_level)
        .bind(status.rssi)
        .bind(status.online)
        .fetch_one(pool)
        .await?;

    debug!("Inserted status {} for device {}", stored.id, stored.device_id);
    Ok(stored)
}

pub async fn list_all(pool: &SqlitePool) -> Result<Vec<DeviceStatus>> {
    let _timer = QUERY_LATENCY_SECONDS.start_timer();
    let query = format!("SELECT {COLUMNS} FROM device_status ORDER BY id");

    let rows = sqlx::query_as::<_, DeviceStatus>(&query)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Returns the reading with the greatest timestamp for `device_id`.
pub async fn latest(pool: &SqlitePool, device_id: &str) -> Result<DeviceStatus> {
    let _timer = QUERY_LATENCY_SECONDS.start_timer();
    let query = format!(
        "SELECT {COLUMNS} FROM device_status WHERE device_id = ? {LATEST_ORDER} LIMIT 1"
    );

    sqlx::query_as::<_, DeviceStatus>(&query)
        .bind(device_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound("Device not found".to_string()))
}

/// Latest reading of every known device, ordered by device id.
pub async fn summary(pool: &SqlitePool) -> Result<Vec<SummaryItem>> {
    let _timer = QUERY_LATENCY_SECONDS.start_timer();
    let query = format!(
        "SELECT {COLUMNS} FROM device_status s
         WHERE s.id = (
             SELECT l.id FROM device_status l
             WHERE l.device_id = s.device_id
             ORDER BY l.timestamp DESC, l.id DESC
             LIMIT 1
         )
         ORDER BY s.device_id"
    );

    let rows = sqlx::query_as::<_, DeviceStatus>(&query)
        .fetch_all(pool)
        .await?;
    if rows.is_empty() {
        return Err(Error::NotFound("Summary cannot be generated".to_string()));
    }

    Ok(rows.into_iter().map(SummaryItem::from).collect())
}

/// Applies `update` to the latest reading of `device_id`.
///
/// Selection and write are one statement, so the write lock is taken up
/// front and concurrent updates queue on SQLite's busy timeout.
pub async fn update(
    pool: &SqlitePool,
    device_id: &str,
    update: &DeviceStatusUpdate,
) -> Result<DeviceStatus> {
    validate_update(update)?;

    let _timer = QUERY_LATENCY_SECONDS.start_timer();
    let query = format!(
        "UPDATE device_status
         SET timestamp = COALESCE(?, timestamp),
             battery_level = COALESCE(?, battery_level),
             rssi = COALESCE(?, rssi),
             online = COALESCE(?, online)
         WHERE id = (
             SELECT id FROM device_status WHERE device_id = ? {LATEST_ORDER} LIMIT 1
         )
         RETURNING {COLUMNS}"
    );

    let stored = sqlx::query_as::<_, DeviceStatus>(&query)
        .bind(update.timestamp.as_ref().map(encode_timestamp))
        .bind(update.battery_level)
        .bind(update.rssi)
        .bind(update.online)
        .bind(device_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| not_found_for(device_id))?;

    debug!("Updated status {} for device {}", stored.id, stored.device_id);
    Ok(stored)
}

/// Removes the latest reading of `device_id`; older readings are kept.
pub async fn delete(pool: &SqlitePool, device_id: &str) -> Result<DeviceStatus> {
    let _timer = QUERY_LATENCY_SECONDS.start_timer();
    let query = format!(
        "DELETE FROM device_status
         WHERE id = (
             SELECT id FROM device_status WHERE device_id = ? {LATEST_ORDER} LIMIT 1
         )
         RETURNING {COLUMNS}"
    );

    let removed = sqlx::query_as::<_, DeviceStatus>(&query)
        .bind(device_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| not_found_for(device_id))?;

    debug!("Deleted status {} for device {}", removed.id, removed.device_id);
    Ok(removed)
}

fn not_found_for(device_id: &str) -> Error {
    Error::NotFound(format!("No device found with device_id={}", device_id))
}
