use chrono::{DateTime, TimeZone, Utc};

use crate::entities::{AttendanceRecord, VerificationMethod};
use crate::services::geo::EARTH_RADIUS_KM;

pub const KM_PER_DEGREE_LAT: f64 = EARTH_RADIUS_KM * std::f64::consts::PI / 180.0;

pub fn at(hour: u32, minute: u32, second: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, hour, minute, second)
        .single()
        .expect("valid timestamp")
}

/// Latitude `km` kilometers north of `lat`.
pub fn north_of(lat: f64, km: f64) -> f64 {
    lat + km / KM_PER_DEGREE_LAT
}

pub fn record(id: &str, worker: &str, time: DateTime<Utc>, lat: f64, lon: f64) -> AttendanceRecord {
    AttendanceRecord {
        id: id.to_string(),
        worker_id: worker.to_string(),
        check_in_time: time,
        check_out_time: None,
        latitude: Some(lat),
        longitude: Some(lon),
        device_fingerprint: None,
        ip_address: None,
        zone: Some("Rohini".to_string()),
        verification_method: VerificationMethod::Rfid,
        is_verified: true,
        worker: None,
    }
}

pub fn on_device(mut record: AttendanceRecord, fingerprint: &str) -> AttendanceRecord {
    record.device_fingerprint = Some(fingerprint.to_string());
    record
}

pub fn without_geo(mut record: AttendanceRecord) -> AttendanceRecord {
    record.latitude = None;
    record.longitude = None;
    record
}
