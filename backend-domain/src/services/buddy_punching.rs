use std::collections::HashSet;

use serde_json::json;

use crate::entities::{Anomaly, AttendanceRecord, DetectionThresholds};
use crate::value_objects::{AnomalyType, Severity};

const TITLE: &str = "Buddy Punching Detected";

#[derive(Debug, Clone, Copy, PartialEq)]
struct Collision {
    seconds: f64,
    meters: f64,
}

/// Compares a fresh check-in against other workers' check-ins from the preceding window.
pub fn detect_buddy_punching(
    candidate: &AttendanceRecord,
    recent: &[AttendanceRecord],
    rules: &DetectionThresholds,
) -> Vec<Anomaly> {
    if candidate.validate().is_err() || candidate.position().is_none() {
        return Vec::new();
    }
    recent
        .iter()
        .filter(|other| other.id != candidate.id && other.validate().is_ok())
        .filter_map(|other| {
            let collision = collide(candidate, other, rules)?;
            build_anomaly(candidate, other, collision)
        })
        .collect()
}

/// All-pairs comparison across one day of check-ins. Each colliding pair is reported once.
pub fn scan_buddy_punching(records: &[AttendanceRecord], rules: &DetectionThresholds) -> Vec<Anomaly> {
    let mut ordered = records
        .iter()
        .filter(|record| record.validate().is_ok() && record.position().is_some())
        .collect::<Vec<_>>();
    ordered.sort_by_key(|record| record.check_in_time);

    let window = rules.buddy_window();
    let mut seen = HashSet::new();
    let mut anomalies = Vec::new();
    for (i, first) in ordered.iter().enumerate() {
        for second in ordered.iter().skip(i + 1) {
            // sorted by time, nothing further along can fall inside the window
            if second.check_in_time - first.check_in_time > window {
                break;
            }
            if !seen.insert(pair_key(&first.id, &second.id)) {
                continue;
            }
            let Some(collision) = collide(first, second, rules) else {
                continue;
            };
            if let Some(anomaly) = build_anomaly(first, second, collision) {
                anomalies.push(anomaly);
            }
        }
    }
    anomalies
}

fn collide(a: &AttendanceRecord, b: &AttendanceRecord, rules: &DetectionThresholds) -> Option<Collision> {
    if a.worker_id == b.worker_id {
        return None;
    }
    let (pa, pb) = (a.position()?, b.position()?);
    let delta_ms = (a.check_in_time - b.check_in_time).num_milliseconds().abs();
    if delta_ms > rules.buddy_window_seconds.saturating_mul(1000) {
        return None;
    }
    let distance_km = pa.distance_km(&pb);
    if distance_km >= rules.buddy_radius_km() {
        return None;
    }
    Some(Collision {
        seconds: delta_ms as f64 / 1000.0,
        meters: distance_km * 1000.0,
    })
}

fn build_anomaly(first: &AttendanceRecord, second: &AttendanceRecord, collision: Collision) -> Option<Anomaly> {
    let description = format!(
        "Workers {} and {} checked in from the same GPS point {:.0} seconds apart. Possible proxy attendance.",
        first.worker_label(),
        second.worker_label(),
        collision.seconds
    );
    let anomaly = Anomaly::new(
        AnomalyType::BuddyPunching,
        Severity::High,
        TITLE,
        description,
        vec![first.worker_id.clone(), second.worker_id.clone()],
    )
    .ok()?;
    Some(
        anomaly
            .with_log_ids(vec![first.id.clone(), second.id.clone()])
            .with_zone(first.zone.clone())
            .with_location(first.position())
            .with_metadata(json!({
                "time_difference_seconds": collision.seconds,
                "distance_meters": collision.meters,
            })),
    )
}

fn pair_key(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fixtures::{at, north_of, record, without_geo};

    const LAT: f64 = 28.70;
    const LON: f64 = 77.10;

    #[test]
    fn near_simultaneous_check_ins_at_one_spot_are_flagged() {
        let rules = DetectionThresholds::default();
        let existing = record("l1", "W1", at(10, 0, 0), LAT, LON);
        let candidate = record("l2", "W2", at(10, 0, 20), north_of(LAT, 0.008), LON);

        let anomalies = detect_buddy_punching(&candidate, &[existing], &rules);
        assert_eq!(anomalies.len(), 1);
        let anomaly = &anomalies[0];
        assert_eq!(anomaly.anomaly_type, AnomalyType::BuddyPunching);
        assert_eq!(anomaly.severity, Severity::High);
        assert!(anomaly.worker_ids.contains(&"W1".to_string()));
        assert!(anomaly.worker_ids.contains(&"W2".to_string()));
        assert_eq!(anomaly.attendance_log_ids, vec!["l2".to_string(), "l1".to_string()]);
        assert_eq!(anomaly.metadata["time_difference_seconds"], 20.0);
        let meters = anomaly.metadata["distance_meters"].as_f64().expect("meters");
        assert!((meters - 8.0).abs() < 0.01);
    }

    #[test]
    fn check_ins_beyond_the_window_are_ignored() {
        let rules = DetectionThresholds::default();
        let existing = record("l1", "W1", at(10, 0, 0), LAT, LON);
        let candidate = record("l2", "W2", at(10, 0, 40), north_of(LAT, 0.008), LON);
        assert!(detect_buddy_punching(&candidate, &[existing], &rules).is_empty());
    }

    #[test]
    fn window_end_is_inclusive() {
        let rules = DetectionThresholds::default();
        let existing = record("l1", "W1", at(10, 0, 0), LAT, LON);
        let exact = record("l2", "W2", at(10, 0, 30), LAT, LON);
        assert_eq!(detect_buddy_punching(&exact, &[existing.clone()], &rules).len(), 1);

        let late = record("l3", "W3", at(10, 0, 31), LAT, LON);
        assert!(detect_buddy_punching(&late, &[existing], &rules).is_empty());
    }

    #[test]
    fn radius_is_exclusive() {
        let rules = DetectionThresholds::default();
        let existing = record("l1", "W1", at(10, 0, 0), LAT, LON);
        let outside = record("l2", "W2", at(10, 0, 5), north_of(LAT, 0.0101), LON);
        assert!(detect_buddy_punching(&outside, &[existing.clone()], &rules).is_empty());

        let inside = record("l3", "W3", at(10, 0, 5), north_of(LAT, 0.0099), LON);
        assert_eq!(detect_buddy_punching(&inside, &[existing], &rules).len(), 1);
    }

    #[test]
    fn full_scan_honours_the_same_edges() {
        let rules = DetectionThresholds::default();
        let records = vec![
            record("a", "W1", at(10, 0, 0), LAT, LON),
            record("b", "W2", at(10, 0, 30), LAT, LON),
            record("c", "W3", at(10, 1, 1), LAT, LON),
        ];
        let anomalies = scan_buddy_punching(&records, &rules);
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].attendance_log_ids, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn same_worker_and_missing_geo_never_collide() {
        let rules = DetectionThresholds::default();
        let existing = record("l1", "W1", at(10, 0, 0), LAT, LON);
        let same_worker = record("l2", "W1", at(10, 0, 5), LAT, LON);
        assert!(detect_buddy_punching(&same_worker, &[existing.clone()], &rules).is_empty());

        let no_geo = without_geo(record("l3", "W3", at(10, 0, 5), LAT, LON));
        assert!(detect_buddy_punching(&no_geo, &[existing.clone()], &rules).is_empty());
        let candidate = record("l4", "W4", at(10, 0, 5), LAT, LON);
        assert!(detect_buddy_punching(&candidate, &[without_geo(existing)], &rules).is_empty());
    }

    #[test]
    fn full_scan_reports_each_pair_once() {
        let rules = DetectionThresholds::default();
        let records = vec![
            record("b", "W2", at(10, 0, 10), LAT, LON),
            record("a", "W1", at(10, 0, 0), LAT, LON),
            record("c", "W3", at(11, 0, 0), LAT, LON),
        ];
        let anomalies = scan_buddy_punching(&records, &rules);
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].worker_ids, vec!["W1".to_string(), "W2".to_string()]);
        assert_eq!(anomalies[0].attendance_log_ids, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn full_scan_skips_duplicated_rows_of_one_pair() {
        let rules = DetectionThresholds::default();
        let first = record("a", "W1", at(10, 0, 0), LAT, LON);
        let second = record("b", "W2", at(10, 0, 10), LAT, LON);
        let records = vec![first.clone(), second.clone(), second];
        let anomalies = scan_buddy_punching(&records, &rules);
        assert_eq!(anomalies.len(), 1);
    }

    #[test]
    fn full_scan_flags_every_colliding_pair_in_a_cluster() {
        let rules = DetectionThresholds::default();
        let records = vec![
            record("a", "W1", at(9, 0, 0), LAT, LON),
            record("b", "W2", at(9, 0, 5), LAT, LON),
            record("c", "W3", at(9, 0, 10), LAT, LON),
        ];
        assert_eq!(scan_buddy_punching(&records, &rules).len(), 3);
    }
}
