use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::entities::{Anomaly, AttendanceRecord, DetectionThresholds, WorkerLocation};
use crate::services::geo::minimum_travel_minutes_at;
use crate::value_objects::{AnomalyType, GeoPoint, Severity};

const TITLE: &str = "Impossible Travel Detected";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TravelAssessment {
    pub distance_km: f64,
    pub elapsed_minutes: f64,
    pub min_travel_minutes: f64,
}

impl TravelAssessment {
    pub fn measure(
        from: GeoPoint,
        from_at: DateTime<Utc>,
        to: GeoPoint,
        to_at: DateTime<Utc>,
        rules: &DetectionThresholds,
    ) -> Self {
        let distance_km = from.distance_km(&to);
        Self {
            distance_km,
            elapsed_minutes: (to_at - from_at).num_milliseconds() as f64 / 60_000.0,
            min_travel_minutes: minimum_travel_minutes_at(distance_km, rules.max_travel_speed_kmh),
        }
    }

    /// Too far to cover in the elapsed time, and beyond the GPS-jitter floor.
    pub fn is_impossible(&self, rules: &DetectionThresholds) -> bool {
        self.min_travel_minutes > self.elapsed_minutes && self.distance_km > rules.travel_floor_km
    }
}

/// Compares a fresh check-in against the worker's last known position.
/// A worker without a prior sample is never flagged.
pub fn detect_impossible_travel(
    candidate: &AttendanceRecord,
    last_location: Option<&WorkerLocation>,
    rules: &DetectionThresholds,
) -> Option<Anomaly> {
    if candidate.validate().is_err() {
        return None;
    }
    let current = candidate.position()?;
    let previous = last_location.filter(|loc| loc.worker_id == candidate.worker_id)?;
    let travel = TravelAssessment::measure(
        previous.position(),
        previous.recorded_at,
        current,
        candidate.check_in_time,
        rules,
    );
    if !travel.is_impossible(rules) {
        return None;
    }
    build_anomaly(candidate, previous.zone.clone(), travel, Vec::new())
}

/// Sequential scan per worker over one day; only chronologically adjacent check-ins are compared.
pub fn scan_impossible_travel(records: &[AttendanceRecord], rules: &DetectionThresholds) -> Vec<Anomaly> {
    let mut order: Vec<Vec<&AttendanceRecord>> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for record in records.iter().filter(|record| record.validate().is_ok()) {
        let slot = *index.entry(record.worker_id.as_str()).or_insert_with(|| {
            order.push(Vec::new());
            order.len() - 1
        });
        order[slot].push(record);
    }

    let mut anomalies = Vec::new();
    for mut history in order {
        history.sort_by_key(|record| record.check_in_time);
        for pair in history.windows(2) {
            let (prev, curr) = (pair[0], pair[1]);
            let (Some(from), Some(to)) = (prev.position(), curr.position()) else {
                continue;
            };
            let travel = TravelAssessment::measure(from, prev.check_in_time, to, curr.check_in_time, rules);
            if !travel.is_impossible(rules) {
                continue;
            }
            if let Some(anomaly) =
                build_anomaly(curr, prev.zone.clone(), travel, vec![prev.id.clone(), curr.id.clone()])
            {
                anomalies.push(anomaly);
            }
        }
    }
    anomalies
}

fn build_anomaly(
    current: &AttendanceRecord,
    previous_zone: Option<String>,
    travel: TravelAssessment,
    log_ids: Vec<String>,
) -> Option<Anomaly> {
    let description = format!(
        "Worker {} appeared {:.1}km away in {:.0} minutes. Minimum travel time required: {:.0} minutes.",
        current.worker_label(),
        travel.distance_km,
        travel.elapsed_minutes,
        travel.min_travel_minutes
    );
    let anomaly = Anomaly::new(
        AnomalyType::ImpossibleTravel,
        Severity::Critical,
        TITLE,
        description,
        vec![current.worker_id.clone()],
    )
    .ok()?;
    Some(
        anomaly
            .with_log_ids(log_ids)
            .with_zone(current.zone.clone())
            .with_location(current.position())
            .with_metadata(json!({
                "distance_km": travel.distance_km,
                "time_elapsed_minutes": travel.elapsed_minutes,
                "min_travel_time_minutes": travel.min_travel_minutes,
                "previous_zone": previous_zone,
                "current_zone": current.zone,
            })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fixtures::{at, north_of, record, without_geo};

    const LAT: f64 = 28.60;
    const LON: f64 = 77.20;

    fn sample(worker: &str, lat: f64, lon: f64, recorded_at: DateTime<Utc>) -> WorkerLocation {
        WorkerLocation {
            id: "loc-1".to_string(),
            worker_id: worker.to_string(),
            latitude: lat,
            longitude: lon,
            zone: Some("Dwarka".to_string()),
            accuracy: None,
            recorded_at,
        }
    }

    #[test]
    fn hundred_km_in_thirty_minutes_is_impossible() {
        let rules = DetectionThresholds::default();
        let last = sample("W1", LAT, LON, at(9, 0, 0));
        let candidate = record("l1", "W1", at(9, 30, 0), north_of(LAT, 100.0), LON);

        let anomaly = detect_impossible_travel(&candidate, Some(&last), &rules).expect("anomaly");
        assert_eq!(anomaly.severity, Severity::Critical);
        assert_eq!(anomaly.worker_ids, vec!["W1".to_string()]);
        assert!(anomaly.attendance_log_ids.is_empty());
        let distance = anomaly.metadata["distance_km"].as_f64().expect("distance");
        assert!((distance - 100.0).abs() < 0.01);
        let required = anomaly.metadata["min_travel_time_minutes"].as_f64().expect("required");
        assert!((required - 100.0).abs() < 0.01);
        assert_eq!(anomaly.metadata["time_elapsed_minutes"], 30.0);
        assert_eq!(anomaly.metadata["previous_zone"], "Dwarka");
        assert_eq!(anomaly.metadata["current_zone"], "Rohini");
    }

    #[test]
    fn short_hops_stay_under_the_floor() {
        let rules = DetectionThresholds::default();
        let last = sample("W1", LAT, LON, at(9, 0, 0));
        let candidate = record("l1", "W1", at(9, 1, 0), north_of(LAT, 3.0), LON);
        assert!(detect_impossible_travel(&candidate, Some(&last), &rules).is_none());
    }

    #[test]
    fn floor_distance_is_exclusive() {
        let rules = DetectionThresholds::default();
        let last = sample("W1", LAT, LON, at(9, 0, 0));
        let above = record("l1", "W1", at(9, 1, 0), north_of(LAT, 5.01), LON);
        assert!(detect_impossible_travel(&above, Some(&last), &rules).is_some());

        let below = record("l2", "W1", at(9, 1, 0), north_of(LAT, 4.99), LON);
        assert!(detect_impossible_travel(&below, Some(&last), &rules).is_none());
    }

    #[test]
    fn required_time_equal_to_elapsed_is_possible() {
        let rules = DetectionThresholds::default();
        let exact = TravelAssessment {
            distance_km: 10.0,
            elapsed_minutes: 10.0,
            min_travel_minutes: 10.0,
        };
        assert!(!exact.is_impossible(&rules));

        let rushed = TravelAssessment {
            elapsed_minutes: 9.9,
            ..exact
        };
        assert!(rushed.is_impossible(&rules));

        let on_the_floor = TravelAssessment {
            distance_km: rules.travel_floor_km,
            elapsed_minutes: 0.0,
            min_travel_minutes: 5.0,
        };
        assert!(!on_the_floor.is_impossible(&rules));
    }

    #[test]
    fn full_scan_honours_the_floor() {
        let rules = DetectionThresholds::default();
        let records = vec![
            record("a", "W1", at(9, 0, 0), LAT, LON),
            record("b", "W1", at(9, 1, 0), north_of(LAT, 5.01), LON),
            record("c", "W2", at(9, 0, 0), LAT, LON),
            record("d", "W2", at(9, 1, 0), north_of(LAT, 4.99), LON),
        ];
        let anomalies = scan_impossible_travel(&records, &rules);
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].attendance_log_ids, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn plausible_trips_and_first_sightings_pass() {
        let rules = DetectionThresholds::default();
        let last = sample("W1", LAT, LON, at(8, 0, 0));
        let candidate = record("l1", "W1", at(9, 30, 0), north_of(LAT, 60.0), LON);
        assert!(detect_impossible_travel(&candidate, Some(&last), &rules).is_none());
        assert!(detect_impossible_travel(&candidate, None, &rules).is_none());

        let stranger = sample("W9", LAT, LON, at(9, 29, 0));
        assert!(detect_impossible_travel(&candidate, Some(&stranger), &rules).is_none());
    }

    #[test]
    fn full_scan_compares_adjacent_check_ins_only() {
        let rules = DetectionThresholds::default();
        let records = vec![
            record("c", "W1", at(10, 0, 0), north_of(LAT, 20.0), LON),
            record("a", "W1", at(9, 0, 0), LAT, LON),
            record("b", "W1", at(9, 50, 0), north_of(LAT, 40.0), LON),
            record("z", "W2", at(9, 0, 0), LAT, LON),
        ];
        // a->b: 40km in 50min is fine, b->c: 20km in 10min is not
        let anomalies = scan_impossible_travel(&records, &rules);
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].attendance_log_ids, vec!["b".to_string(), "c".to_string()]);
        assert_eq!(anomalies[0].severity, Severity::Critical);
    }

    #[test]
    fn full_scan_skips_pairs_without_geo() {
        let rules = DetectionThresholds::default();
        let records = vec![
            record("a", "W1", at(9, 0, 0), LAT, LON),
            without_geo(record("b", "W1", at(9, 5, 0), LAT, LON)),
            record("c", "W1", at(9, 10, 0), north_of(LAT, 50.0), LON),
        ];
        assert!(scan_impossible_travel(&records, &rules).is_empty());
    }
}
