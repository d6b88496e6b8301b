use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

/// A stored device status reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceStatus {
    pub id: i64,
    pub device_id: String,
    pub timestamp: DateTime<Utc>,
    pub battery_level: i32,
    pub rssi: i32,
    pub online: bool,
}

/// Request body for `POST /status/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewDeviceStatus {
    pub device_id: String,
    pub timestamp: DateTime<Utc>,
    pub battery_level: i32,
    pub rssi: i32,
    pub online: bool,
}

/// Request body for `PATCH /status/{device_id}`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceStatusUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery_level: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rssi: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub online: Option<bool>,
}

impl DeviceStatusUpdate {
    pub fn is_empty(&self) -> bool {
        self.timestamp.is_none()
            && self.battery_level.is_none()
            && self.rssi.is_none()
            && self.online.is_none()
    }

    /// Applies the present fields onto `status`.
    pub fn apply_to(&self, status: &mut DeviceStatus) {
        if let Some(timestamp) = self.timestamp {
            status.timestamp = timestamp;
        }
        if let Some(battery_level) = self.battery_level {
            status.battery_level = battery_level;
        }
        if let Some(rssi) = self.rssi {
            status.rssi = rssi;
        }
        if let Some(online) = self.online {
            status.online = online;
        }
    }
}

/// One entry of `GET /status/summary/`: a device's latest reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryItem {
    pub device_id: String,
    pub last_update: DateTime<Utc>,
    pub battery_level: i32,
    pub rssi: i32,
    pub online: bool,
}

impl From<DeviceStatus> for SummaryItem {
    fn from(status: DeviceStatus) -> Self {
        Self {
            device_id: status.device_id,
            last_update: status.timestamp,
            battery_level: status.battery_level,
            rssi: status.rssi,
            online: status.online,
        }
    }
}

/// Fixed-width UTC text used for the `timestamp` column.
///
/// Every value has the same length and a `Z` suffix, so ordering the column
/// as text orders it chronologically. Precision is truncated to microseconds.
pub fn encode_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_timestamp(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value).map(|ts| ts.with_timezone(&Utc))
}

impl<'r> FromRow<'r, SqliteRow> for DeviceStatus {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let timestamp: String = row.try_get("timestamp")?;
        let timestamp =
            decode_timestamp(&timestamp).map_err(|err| sqlx::Error::Decode(Box::new(err)))?;

        Ok(Self {
            id: row.try_get("id")?,
            device_id: row.try_get("device_id")?,
            timestamp,
            battery_level: row.try_get("battery_level")?,
            rssi: row.try_get("rssi")?,
            online: row.try_get("online")?,
        })
    }
}
