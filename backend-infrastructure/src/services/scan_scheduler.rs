use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone, Timelike};
use tracing::{error, info};

use backend_application::commands::run_full_scan;
use backend_application::AppState;
use backend_domain::utils::DayWindow;
use backend_domain::RuntimeConfig;

/// Runs the daily full scan at the configured local time, forever.
pub async fn schedule_full_scans(state: AppState) {
    loop {
        let next = next_scan_time(&state.config, Local::now());
        let duration = next.signed_duration_since(Local::now());
        let sleep_ms = duration.num_milliseconds().max(0) as u64;
        tokio::time::sleep(std::time::Duration::from_millis(sleep_ms)).await;

        let window = DayWindow::for_day(scan_day_for(next));
        match run_full_scan(&state, window).await {
            Ok(summary) => info!(
                day = %window.day,
                logs_scanned = summary.logs_scanned,
                anomalies = summary.anomalies_detected,
                "scheduled full scan done"
            ),
            Err(err) => error!("scheduled full scan failed: {}", err),
        }
    }
}

pub fn next_scan_time(config: &RuntimeConfig, now: DateTime<Local>) -> DateTime<Local> {
    let today = now.date_naive();
    match at_local(today, config) {
        Some(at) if at > now => at,
        _ => {
            let mut day = today;
            // skip days where the wall-clock time does not exist
            for _ in 0..3 {
                day = day.succ_opt().unwrap_or(day);
                if let Some(at) = at_local(day, config) {
                    return at;
                }
            }
            now + Duration::days(1)
        }
    }
}

/// Early runs cover the day that just ended, so a 00:15 run sees all of yesterday.
pub fn scan_day_for(run_at: DateTime<Local>) -> NaiveDate {
    let day = run_at.date_naive();
    if run_at.hour() < 12 {
        day.pred_opt().unwrap_or(day)
    } else {
        day
    }
}

fn at_local(day: NaiveDate, config: &RuntimeConfig) -> Option<DateTime<Local>> {
    let target = day.and_hms_opt(config.full_scan_hour, config.full_scan_minute, 0)?;
    Local.from_local_datetime(&target).earliest()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(hour: u32, minute: u32) -> RuntimeConfig {
        RuntimeConfig {
            full_scan_hour: hour,
            full_scan_minute: minute,
            ..RuntimeConfig::default()
        }
    }

    #[test]
    fn next_scan_is_always_in_the_future() {
        let now = Local::now();
        for (hour, minute) in [(0, 0), (12, 30), (23, 59)] {
            let next = next_scan_time(&config(hour, minute), now);
            assert!(next > now);
            assert!(next - now <= Duration::days(1) + Duration::hours(2));
        }
    }

    #[test]
    fn early_runs_scan_the_day_that_just_ended() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 2).expect("date");
        let run = |hour: u32, minute: u32| {
            Local
                .from_local_datetime(&day.and_hms_opt(hour, minute, 0).expect("time"))
                .earliest()
                .expect("local time")
        };
        assert_eq!(scan_day_for(run(0, 15)), NaiveDate::from_ymd_opt(2024, 3, 1).expect("date"));
        assert_eq!(scan_day_for(run(11, 59)), NaiveDate::from_ymd_opt(2024, 3, 1).expect("date"));
        assert_eq!(scan_day_for(run(12, 0)), day);
        assert_eq!(scan_day_for(run(23, 30)), day);
    }

    #[test]
    fn next_scan_lands_on_the_configured_minute() {
        let now = Local::now();
        let next = next_scan_time(&config(23, 30), now);
        assert_eq!(next.format("%H:%M").to_string(), "23:30");
    }
}
