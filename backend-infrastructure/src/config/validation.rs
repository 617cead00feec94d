use anyhow::{anyhow, Result};

use backend_domain::DetectionThresholds;

pub fn validate_thresholds(rules: &DetectionThresholds) -> Result<()> {
    if rules.buddy_window_seconds <= 0 {
        return Err(anyhow!("buddy_window_seconds must be greater than 0"));
    }
    if !(rules.buddy_radius_meters.is_finite() && rules.buddy_radius_meters > 0.0) {
        return Err(anyhow!("buddy_radius_meters must be a positive number"));
    }
    if !(rules.max_travel_speed_kmh.is_finite() && rules.max_travel_speed_kmh > 0.0) {
        return Err(anyhow!("max_travel_speed_kmh must be a positive number"));
    }
    if !(rules.travel_floor_km.is_finite() && rules.travel_floor_km >= 0.0) {
        return Err(anyhow!("travel_floor_km must not be negative"));
    }
    if rules.travel_lookback_minutes <= 0 {
        return Err(anyhow!("travel_lookback_minutes must be greater than 0"));
    }
    if rules.shared_device_min_workers < 2 {
        return Err(anyhow!("shared_device_min_workers must be at least 2"));
    }
    if rules.shared_device_critical_workers < rules.shared_device_min_workers {
        return Err(anyhow!(
            "shared_device_critical_workers ({}) is below shared_device_min_workers ({})",
            rules.shared_device_critical_workers,
            rules.shared_device_min_workers
        ));
    }
    Ok(())
}

pub fn validate_schedule(hour: u32, minute: u32) -> Result<()> {
    if hour > 23 || minute > 59 {
        return Err(anyhow!("full_scan_hour or full_scan_minute out of range"));
    }
    Ok(())
}
