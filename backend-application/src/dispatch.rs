// Single-endpoint request envelope, tagged by "action"

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::commands::{check_attendance, resolve_anomaly, run_full_scan};
use crate::queries::get_stats;
use crate::{AppError, AppState};
use backend_domain::utils::DayWindow;
use backend_domain::{AnomalyStats, AttendanceRecord, DetectionOutcome, ScanSummary};

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum GhostDetectionRequest {
    CheckAttendance {
        attendance: AttendanceRecord,
    },
    RunFullScan {
        #[serde(default)]
        date: Option<NaiveDate>,
    },
    GetStats {
        #[serde(default)]
        date: Option<NaiveDate>,
    },
    Resolve {
        anomaly_id: String,
        resolved_by: String,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum GhostDetectionResponse {
    CheckAttendance(DetectionOutcome),
    RunFullScan(ScanSummary),
    GetStats { date: NaiveDate, stats: AnomalyStats },
    Resolve { success: bool },
}

pub async fn dispatch(
    state: &AppState,
    request: GhostDetectionRequest,
) -> Result<GhostDetectionResponse, AppError> {
    match request {
        GhostDetectionRequest::CheckAttendance { attendance } => {
            let outcome = check_attendance(state, &attendance).await?;
            Ok(GhostDetectionResponse::CheckAttendance(outcome))
        }
        GhostDetectionRequest::RunFullScan { date } => {
            let summary = run_full_scan(state, day_window(date)).await?;
            Ok(GhostDetectionResponse::RunFullScan(summary))
        }
        GhostDetectionRequest::GetStats { date } => {
            let window = day_window(date);
            let stats = get_stats(state, window).await?;
            Ok(GhostDetectionResponse::GetStats {
                date: window.day,
                stats,
            })
        }
        GhostDetectionRequest::Resolve {
            anomaly_id,
            resolved_by,
        } => {
            resolve_anomaly(state, &anomaly_id, &resolved_by).await?;
            Ok(GhostDetectionResponse::Resolve { success: true })
        }
    }
}

fn day_window(date: Option<NaiveDate>) -> DayWindow {
    date.map(DayWindow::for_day).unwrap_or_else(DayWindow::today)
}
