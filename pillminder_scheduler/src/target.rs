use chrono::{DateTime, Days, Utc};
use pillminder_models::reminder::ReminderFireTime;

use crate::clock::ReminderTimeZone;

/// Enough to step over one skipped wall-clock day.
const MAX_LOOKAHEAD_DAYS: u64 = 2;

/// Next instant strictly after `now` at which `fire_at` occurs in `zone`:
/// today if that is still ahead, otherwise the following day.
pub fn get_target_datetime(
    fire_at: &ReminderFireTime,
    now: DateTime<Utc>,
    zone: &ReminderTimeZone,
) -> Option<DateTime<Utc>> {
    let today = zone.local_date(now);

    (0..=MAX_LOOKAHEAD_DAYS)
        .filter_map(|offset| today.checked_add_days(Days::new(offset)))
        .filter_map(|date| zone.to_instant(date.and_time(*fire_at.time())))
        .find(|candidate| *candidate > now)
}

#[cfg(test)]
mod tests;
