use super::*;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike};
use chrono_tz::Tz;
use proptest::prelude::*;
use proptest_arbitrary_interop::arb;

const UTC: ReminderTimeZone = ReminderTimeZone::Named(Tz::UTC);

fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

fn fire_at(h: u32, m: u32) -> ReminderFireTime {
    ReminderFireTime::from_hm(h, m).unwrap()
}

#[test]
pub fn when_firing_time_is_yet_to_come_target_should_be_today() {
    let now = utc(2024, 1, 1, 9, 0);

    let target = get_target_datetime(&fire_at(17, 0), now, &UTC);

    assert_eq!(target, Some(utc(2024, 1, 1, 17, 0)));
}

#[test]
pub fn when_firing_time_is_passed_target_should_be_next_day() {
    let now = utc(2024, 1, 1, 9, 0);

    let target = get_target_datetime(&fire_at(8, 30), now, &UTC);

    assert_eq!(target, Some(utc(2024, 1, 2, 8, 30)));
}

#[test]
pub fn firing_time_equal_to_now_is_scheduled_tomorrow() {
    let now = utc(2024, 1, 1, 17, 0);

    let target = get_target_datetime(&fire_at(17, 0), now, &UTC);

    assert_eq!(target, Some(utc(2024, 1, 2, 17, 0)));
}

#[test]
pub fn target_crosses_month_and_year_boundaries() {
    let now = utc(2024, 12, 31, 23, 59);

    let target = get_target_datetime(&fire_at(0, 0), now, &UTC);

    assert_eq!(target, Some(utc(2025, 1, 1, 0, 0)));
}

#[test]
pub fn times_are_interpreted_in_the_configured_zone() {
    let prague = ReminderTimeZone::Named(Tz::Europe__Prague);
    // 07:00 UTC is 08:00 in Prague during winter.
    let now = utc(2024, 1, 15, 7, 0);

    let target = get_target_datetime(&fire_at(8, 30), now, &prague);

    assert_eq!(target, Some(utc(2024, 1, 15, 7, 30)));
}

#[test]
pub fn skipped_wall_clock_time_moves_to_next_day() {
    let prague = ReminderTimeZone::Named(Tz::Europe__Prague);
    // Midnight in Prague on the night clocks jump from 02:00 to 03:00.
    let now = utc(2024, 3, 30, 23, 0);

    let target = get_target_datetime(&fire_at(2, 30), now, &prague);

    assert_eq!(target, Some(utc(2024, 4, 1, 0, 30)));
}

#[test]
pub fn repeated_wall_clock_time_uses_first_occurrence() {
    let prague = ReminderTimeZone::Named(Tz::Europe__Prague);
    // Midnight in Prague on the night 03:00 falls back to 02:00.
    let now = utc(2024, 10, 26, 22, 0);

    let target = get_target_datetime(&fire_at(2, 30), now, &prague);

    assert_eq!(target, Some(utc(2024, 10, 27, 0, 30)));
}

fn timestamp_strategy() -> impl Strategy<Value = DateTime<Utc>> {
    // 1970..2100
    (0i64..4_102_444_800).prop_map(|secs| DateTime::from_timestamp(secs, 0).unwrap())
}

proptest! {
    #[test]
    fn test_target_datetime(
        now_utc in arb::<NaiveDateTime>(),
        time in arb::<NaiveTime>()
    ) {
        let fire_at = ReminderFireTime::new(time);
        let now = DateTime::from_naive_utc_and_offset(now_utc.with_nanosecond(0).unwrap(), Utc);
        prop_assume!(now.date_naive() < NaiveDate::MAX);

        let target = get_target_datetime(&fire_at, now, &UTC).unwrap();
        let delay = target - now;

        prop_assert!(target > now, "Target time should always be in the future");
        prop_assert_eq!(target.time(), *fire_at.time());
        prop_assert!(delay.num_days() <= 1, "Delay should be one day or less. delay = {}", delay);
    }

    #[test]
    fn target_datetime_is_in_the_future_around_dst(
        now in timestamp_strategy(),
        hours in 0u32..24,
        minutes in 0u32..60
    ) {
        let prague = ReminderTimeZone::Named(Tz::Europe__Prague);
        let fire_at = fire_at(hours, minutes);

        let target = get_target_datetime(&fire_at, now, &prague).unwrap();

        prop_assert!(target > now);
        prop_assert!(target - now <= chrono::TimeDelta::hours(49));
    }
}
