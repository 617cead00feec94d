use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Half-open `[start, end)` span of one local calendar day, expressed in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub day: NaiveDate,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DayWindow {
    pub fn for_day(day: NaiveDate) -> Self {
        let next = day.succ_opt().unwrap_or(day);
        Self {
            day,
            start: local_midnight(day),
            end: local_midnight(next),
        }
    }

    pub fn today() -> Self {
        Self::for_day(today())
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at < self.end
    }
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Local calendar day a UTC instant falls on.
pub fn local_day(at: DateTime<Utc>) -> NaiveDate {
    at.with_timezone(&Local).date_naive()
}

fn local_midnight(day: NaiveDate) -> DateTime<Utc> {
    let naive: NaiveDateTime = day.and_time(chrono::NaiveTime::MIN);
    Local
        .from_local_datetime(&naive)
        .single()
        .or_else(|| Local.from_local_datetime(&naive).earliest())
        .map(|local| local.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_window_is_half_open() {
        let day = NaiveDate::from_ymd_opt(2024, 5, 10).expect("date");
        let window = DayWindow::for_day(day);
        assert!(window.contains(window.start));
        assert!(!window.contains(window.end));
        assert_eq!(local_day(window.start), day);
    }
}
