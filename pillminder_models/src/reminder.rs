use std::{fmt, str::FromStr};

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid reminder time {input:?}, expected HH:MM")]
pub struct InvalidTimeFormat {
    pub input: String,
}

/// Wall-clock time of day a reminder fires at, always at a whole minute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReminderFireTime(NaiveTime);

impl ReminderFireTime {
    pub fn new(inner: NaiveTime) -> Self {
        let normalized_time = NaiveTime::from_hms_opt(inner.hour(), inner.minute(), 0)
            .unwrap_or(NaiveTime::MIN);
        Self(normalized_time)
    }

    pub fn from_hm(hours: u32, minutes: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hours, minutes, 0).map(Self)
    }

    pub fn time(&self) -> &NaiveTime {
        &self.0
    }
}

impl FromStr for ReminderFireTime {
    type Err = InvalidTimeFormat;

    /// Accepts `HH:MM`, and `HH:MM:SS` as returned by SQL time columns. The
    /// seconds component is validated but dropped.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidTimeFormat {
            input: s.to_owned(),
        };

        let mut parts = s.trim().split(':');
        let hours = parts.next().ok_or_else(invalid)?;
        let minutes = parts.next().ok_or_else(invalid)?;
        let seconds = parts.next();
        if parts.next().is_some() {
            return Err(invalid());
        }

        let hours = parse_component(hours, 23).ok_or_else(invalid)?;
        let minutes = parse_component(minutes, 59).ok_or_else(invalid)?;
        if let Some(seconds) = seconds {
            parse_component(seconds, 59).ok_or_else(invalid)?;
        }

        Self::from_hm(hours, minutes).ok_or_else(invalid)
    }
}

fn parse_component(part: &str, max: u32) -> Option<u32> {
    if part.is_empty() || part.len() > 2 || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    part.parse().ok().filter(|value| *value <= max)
}

impl fmt::Display for ReminderFireTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

/// A recurring daily medication alert for one drug.
///
/// Times are kept as entered so that one malformed entry only drops its own
/// timer when the rule is scheduled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderRule {
    pub drug_name: String,
    pub dosage: String,
    pub prescribing_doctor: String,
    pub times_of_day: Vec<String>,
    pub enabled: bool,
}

impl ReminderRule {
    /// Parsed fire times paired with the raw entry they came from.
    pub fn fire_times(
        &self,
    ) -> impl Iterator<Item = (&str, Result<ReminderFireTime, InvalidTimeFormat>)> {
        self.times_of_day
            .iter()
            .map(|raw| (raw.as_str(), raw.parse::<ReminderFireTime>()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parses_hours_and_minutes() {
        let time: ReminderFireTime = "08:30".parse().unwrap();
        assert_eq!(time, ReminderFireTime::from_hm(8, 30).unwrap());
        assert_eq!(time.to_string(), "08:30");
    }

    #[test]
    fn accepts_single_digit_hours_and_sql_seconds() {
        assert_eq!(
            "9:05".parse::<ReminderFireTime>().unwrap(),
            ReminderFireTime::from_hm(9, 5).unwrap()
        );
        assert_eq!(
            "17:00:00".parse::<ReminderFireTime>().unwrap(),
            ReminderFireTime::from_hm(17, 0).unwrap()
        );
    }

    #[test]
    fn rejects_out_of_range_and_garbage() {
        for input in [
            "25:99",
            "24:00",
            "12:60",
            "",
            "12",
            "ab:cd",
            "12:00:00:00",
            "-1:30",
            "123:00",
            "12:+5",
        ] {
            assert_eq!(
                input.parse::<ReminderFireTime>(),
                Err(InvalidTimeFormat {
                    input: input.to_owned()
                }),
                "input = {input:?}"
            );
        }
    }

    #[test]
    fn new_drops_seconds() {
        let time = ReminderFireTime::new(NaiveTime::from_hms_milli_opt(7, 15, 42, 500).unwrap());
        assert_eq!(*time.time(), NaiveTime::from_hms_opt(7, 15, 0).unwrap());
    }

    #[test]
    fn rule_fire_times_keep_malformed_entries_as_errors() {
        let rule = ReminderRule {
            drug_name: "Aspirin".to_owned(),
            dosage: "100mg".to_owned(),
            prescribing_doctor: "Dr. Rahman".to_owned(),
            times_of_day: vec!["25:99".to_owned(), "09:00".to_owned()],
            enabled: true,
        };

        let parsed: Vec<_> = rule.fire_times().collect();
        assert_eq!(parsed.len(), 2);
        assert!(parsed[0].1.is_err());
        assert_eq!(parsed[1].1, Ok(ReminderFireTime::from_hm(9, 0).unwrap()));
    }

    proptest! {
        #[test]
        fn every_valid_time_parses(hours in 0u32..24, minutes in 0u32..60) {
            let input = format!("{hours:02}:{minutes:02}");
            let time: ReminderFireTime = input.parse().unwrap();
            prop_assert_eq!(time.to_string(), input);
        }
    }
}
