// src/ingest/schedule.rs
use chrono::{DateTime, Duration, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

/// Hour-granularity trigger: a run is due only while the local wall-clock
/// hour in `timezone` equals `target_hour`. Outside that hour an invocation
/// is a no-op; nothing is queued for later.
#[derive(Debug, Clone, Copy)]
pub struct ScheduleGate {
    pub timezone: Tz,
    pub target_hour: u32,
}

impl ScheduleGate {
    pub fn new(timezone: Tz, target_hour: u32) -> Self {
        Self {
            timezone,
            target_hour,
        }
    }

    pub fn should_run(&self, now: DateTime<Utc>) -> bool {
        should_run(now, self.timezone, self.target_hour)
    }
}

pub fn should_run(now: DateTime<Utc>, timezone: Tz, target_hour: u32) -> bool {
    now.with_timezone(&timezone).hour() == target_hour
}

/// Start of the local calendar day containing `now`, as a UTC instant.
pub fn local_midnight(now: DateTime<Utc>, timezone: Tz) -> DateTime<Utc> {
    let midnight = now
        .with_timezone(&timezone)
        .date_naive()
        .and_time(NaiveTime::MIN);

    if let Some(dt) = timezone.from_local_datetime(&midnight).earliest() {
        return dt.with_timezone(&Utc);
    }
    // Midnight skipped by a DST jump: the day starts at the first valid hour.
    (1..=3)
        .filter_map(|h| {
            timezone
                .from_local_datetime(&(midnight + Duration::hours(h)))
                .earliest()
        })
        .map(|dt| dt.with_timezone(&Utc))
        .next()
        .unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::{Africa::Casablanca, America::Sao_Paulo, Asia::Tokyo, UTC};

    fn at(tz: Tz, y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        tz.with_ymd_and_hms(y, mo, d, h, mi, 0)
            .single()
            .expect("unambiguous local time")
            .with_timezone(&Utc)
    }

    #[test]
    fn boundary_hours_around_target() {
        let target = 23;
        assert!(!should_run(at(Tokyo, 2024, 5, 10, 22, 59), Tokyo, target));
        assert!(should_run(at(Tokyo, 2024, 5, 10, 23, 0), Tokyo, target));
        assert!(should_run(at(Tokyo, 2024, 5, 10, 23, 59), Tokyo, target));
        // target + 1 wraps to hour 0 of the next day
        assert!(!should_run(at(Tokyo, 2024, 5, 11, 0, 0), Tokyo, target));
    }

    #[test]
    fn only_the_target_hour_passes() {
        let gate = ScheduleGate::new(UTC, 7);
        for h in 0..24 {
            let now = at(UTC, 2024, 1, 15, h, 30);
            assert_eq!(gate.should_run(now), h == 7, "hour {h}");
        }
    }

    #[test]
    fn gate_uses_local_not_utc_hour() {
        // 14:00 UTC is 23:00 in Tokyo (UTC+9)
        let now = at(UTC, 2024, 3, 1, 14, 0);
        assert!(should_run(now, Tokyo, 23));
        assert!(!should_run(now, UTC, 23));
    }

    #[test]
    fn casablanca_default_zone() {
        let now = at(Casablanca, 2024, 10, 1, 23, 15);
        assert!(should_run(now, Casablanca, 23));
        assert!(!should_run(now, Casablanca, 22));
    }

    #[test]
    fn midnight_is_start_of_local_day() {
        let now = at(Tokyo, 2024, 5, 10, 23, 30);
        let m = local_midnight(now, Tokyo);
        assert_eq!(m, at(Tokyo, 2024, 5, 10, 0, 0));
        assert!(m <= now);
        assert!(now - m < Duration::hours(24));
    }

    #[test]
    fn midnight_skipped_by_dst_uses_first_valid_hour() {
        // Sao Paulo moved clocks 00:00 -> 01:00 on 2018-11-04.
        let now = at(Sao_Paulo, 2018, 11, 4, 12, 0);
        let m = local_midnight(now, Sao_Paulo);
        assert_eq!(m, at(Sao_Paulo, 2018, 11, 4, 1, 0));
    }
}
