use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Zone in which reminder times of day are interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReminderTimeZone {
    /// The machine's local time.
    #[default]
    System,
    Named(Tz),
}

impl ReminderTimeZone {
    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        match self {
            ReminderTimeZone::System => instant.with_timezone(&Local).date_naive(),
            ReminderTimeZone::Named(tz) => instant.with_timezone(tz).date_naive(),
        }
    }

    pub fn format(&self, instant: DateTime<Utc>) -> String {
        const FORMAT: &str = "%Y-%m-%d %H:%M %Z";
        match self {
            ReminderTimeZone::System => instant.with_timezone(&Local).format(FORMAT).to_string(),
            ReminderTimeZone::Named(tz) => instant.with_timezone(tz).format(FORMAT).to_string(),
        }
    }

    /// `None` for wall-clock times skipped by a DST transition. Times that
    /// occur twice resolve to the first occurrence.
    pub fn to_instant(&self, local: NaiveDateTime) -> Option<DateTime<Utc>> {
        match self {
            ReminderTimeZone::System => Local
                .from_local_datetime(&local)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc)),
            ReminderTimeZone::Named(tz) => tz
                .from_local_datetime(&local)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }
}
