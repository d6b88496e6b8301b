use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Body of `POST /status/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceStatus {
    pub device_id: String,
    pub timestamp: DateTime<Utc>,
    pub battery_level: i32,
    pub rssi: i32,
    pub online: bool,
}

/// Generates a plausible reading for `device_id`, with occasional outliers.
pub fn generate_status(rng: &mut impl Rng, device_id: String) -> DeviceStatus {
    let battery_level = if rng.gen_bool(0.02) {
        rng.gen_range(0..20) // 2% low battery
    } else {
        rng.gen_range(20..=100)
    };

    let rssi = if rng.gen_bool(0.05) {
        rng.gen_range(-120..-90) // 5% weak signal
    } else {
        rng.gen_range(-90..=-30)
    };

    DeviceStatus {
        device_id,
        timestamp: Utc::now(),
        battery_level,
        rssi,
        online: !rng.gen_bool(0.03),
    }
}
