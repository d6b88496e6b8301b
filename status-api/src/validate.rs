use chrono::{DateTime, Datelike, Timelike, Utc};

use crate::errors::{Error, Result};
use crate::model::{DeviceStatusUpdate, NewDeviceStatus};

const BATTERY_MIN: i32 = 0;
const BATTERY_MAX: i32 = 100;

// The timestamp column holds fixed-width `YYYY-...Z` text.
const YEAR_MIN: i32 = 0;
const YEAR_MAX: i32 = 9999;

/// Validates a status submitted on create
pub fn validate(status: &NewDeviceStatus) -> Result<()> {
    validate_device_id(&status.device_id)?;
    validate_timestamp(&status.timestamp)?;
    validate_battery(status.battery_level)?;
    Ok(())
}

/// Validates the fields carried by a partial update
pub fn validate_update(update: &DeviceStatusUpdate) -> Result<()> {
    if update.is_empty() {
        return Err(Error::Validation(
            "Update must set at least one of timestamp, battery_level, rssi, online".to_string(),
        ));
    }
    if let Some(timestamp) = &update.timestamp {
        validate_timestamp(timestamp)?;
    }
    if let Some(battery_level) = update.battery_level {
        validate_battery(battery_level)?;
    }
    Ok(())
}

fn validate_device_id(device_id: &str) -> Result<()> {
    if device_id.trim().is_empty() {
        return Err(Error::Validation("Device ID cannot be empty".to_string()));
    }
    Ok(())
}

fn validate_battery(battery_level: i32) -> Result<()> {
    if !(BATTERY_MIN..=BATTERY_MAX).contains(&battery_level) {
        return Err(Error::Validation(format!(
            "Battery level {} out of range [{}, {}]",
            battery_level, BATTERY_MIN, BATTERY_MAX
        )));
    }
    Ok(())
}

fn validate_timestamp(timestamp: &DateTime<Utc>) -> Result<()> {
    // chrono represents a leap second as nanosecond >= 1_000_000_000
    if timestamp.nanosecond() >= 1_000_000_000 {
        return Err(Error::Validation(format!(
            "Timestamp {} is not a valid wall-clock time",
            timestamp
        )));
    }
    if !(YEAR_MIN..=YEAR_MAX).contains(&timestamp.year()) {
        return Err(Error::Validation(format!(
            "Timestamp {} out of range: UTC year must be in [{}, {}]",
            timestamp, YEAR_MIN, YEAR_MAX
        )));
    }
    Ok(())
}
