use chrono::{DateTime, Duration, LocalResult, NaiveDateTime, NaiveTime, TimeZone};

/// Next instant at `hour:minute:00` strictly after `now`: later today if
/// that time has not passed yet, otherwise tomorrow.
///
/// The step is one wall-clock day, so across a DST change the result can
/// be up to 25 hours away (23 when clocks go forward).
///
/// Returns None for an out-of-range hour or minute.
pub fn next_trigger<Tz: TimeZone>(now: &DateTime<Tz>, hour: u32, minute: u32) -> Option<DateTime<Tz>> {
    let time = NaiveTime::from_hms_opt(hour, minute, 0)?;
    let tz = now.timezone();
    let today = now.naive_local().date();

    let candidate = resolve(&tz, today.and_time(time))?;
    if candidate > *now {
        return Some(candidate);
    }

    let tomorrow = today.succ_opt()?;
    resolve(&tz, tomorrow.and_time(time))
}

/// Map a wall-clock time to an instant. Ambiguous times take the earlier
/// instant; times skipped by a DST jump move forward by the gap.
fn resolve<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => tz.from_local_datetime(&(naive + Duration::hours(1))).earliest(),
    }
}
