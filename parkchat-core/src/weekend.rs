use chrono::{DateTime, Datelike, Days, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// All wall-clock reasoning (weekend boundaries, event times) happens in the
/// park's local time.
pub const PARK_TIMEZONE: Tz = chrono_tz::America::New_York;

/// The Saturday/Sunday pair that "this weekend" refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekendWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl WeekendWindow {
    /// Weekend relative to `today`.
    ///
    /// Saturday maps to today/tomorrow, Sunday to the following weekend
    /// (+6/+7 days), Monday through Friday to the upcoming Saturday/Sunday.
    pub fn upcoming(today: NaiveDate) -> Self {
        // 0 = Sunday .. 6 = Saturday, so Sunday yields +6 and Saturday +0.
        let from_sunday = u64::from(today.weekday().num_days_from_sunday());
        let saturday = today + Days::new(6 - from_sunday);

        Self {
            start: saturday,
            end: saturday + Days::new(1),
        }
    }

    /// Weekend relative to the given instant, read in `tz`.
    pub fn at(now: DateTime<Utc>, tz: Tz) -> Self {
        Self::upcoming(now.with_timezone(&tz).date_naive())
    }

    /// Weekend relative to the current wall clock in `tz`.
    pub fn current(tz: Tz) -> Self {
        Self::at(Utc::now(), tz)
    }

    pub fn saturday(&self) -> NaiveDate {
        self.start
    }

    pub fn sunday(&self) -> NaiveDate {
        self.end
    }

    /// Half-open instant range `[Saturday 00:00, Monday 00:00)` in `tz`.
    pub fn bounds(&self, tz: Tz) -> (DateTime<Tz>, DateTime<Tz>) {
        let start = localize(self.start.and_time(NaiveTime::MIN), tz);
        let end = localize((self.end + Days::new(1)).and_time(NaiveTime::MIN), tz);
        (start, end)
    }

    pub fn contains<T: TimeZone>(&self, instant: &DateTime<T>, tz: Tz) -> bool {
        let (start, end) = self.bounds(tz);
        let instant = instant.with_timezone(&Utc);
        instant >= start.with_timezone(&Utc) && instant < end.with_timezone(&Utc)
    }

    /// "Saturday" or "Sunday" for dates inside the window.
    pub fn day_label(&self, date: NaiveDate) -> Option<&'static str> {
        if date == self.start {
            Some("Saturday")
        } else if date == self.end {
            Some("Sunday")
        } else {
            None
        }
    }
}

impl std::fmt::Display for WeekendWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} .. {}", self.start, self.end)
    }
}

/// Attach `tz` to a naive local datetime.
///
/// Ambiguous times (DST fall-back) resolve to the earlier instant; times that
/// fall into a spring-forward gap are shifted forward by one hour.
pub fn localize(naive: NaiveDateTime, tz: Tz) -> DateTime<Tz> {
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
        .unwrap_or_else(|| tz.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn every_weekday_maps_to_a_saturday_sunday_pair() {
        // 2026-10-19 is a Monday; walk two full weeks.
        let monday = date(2026, 10, 19);
        for offset in 0..14 {
            let today = monday + Days::new(offset);
            let w = WeekendWindow::upcoming(today);

            assert_eq!(w.start.weekday(), Weekday::Sat, "start for {today}");
            assert_eq!(w.end.weekday(), Weekday::Sun, "end for {today}");
            assert_eq!(w.end, w.start + Days::new(1));
            assert!(w.start <= w.end);
            assert!(w.start >= today);
            assert!((w.start - today).num_days() <= 6);
        }
    }

    #[test]
    fn saturday_is_today_and_tomorrow() {
        let saturday = date(2026, 10, 24);
        let w = WeekendWindow::upcoming(saturday);
        assert_eq!(w.start, saturday);
        assert_eq!(w.end, date(2026, 10, 25));
    }

    #[test]
    fn sunday_rolls_to_the_next_weekend() {
        let sunday = date(2026, 10, 25);
        let w = WeekendWindow::upcoming(sunday);
        assert_eq!(w.start, date(2026, 10, 31));
        assert_eq!(w.end, date(2026, 11, 1));
    }

    #[test]
    fn weekday_uses_upcoming_saturday() {
        let wednesday = date(2026, 10, 21);
        let w = WeekendWindow::upcoming(wednesday);
        assert_eq!(w.start, date(2026, 10, 24));
    }

    #[test]
    fn at_reads_the_date_in_park_time() {
        // 02:00 UTC on Saturday is still Friday evening in New York.
        let now = Utc.with_ymd_and_hms(2026, 10, 24, 2, 0, 0).unwrap();
        let w = WeekendWindow::at(now, PARK_TIMEZONE);
        assert_eq!(w.start, date(2026, 10, 24));

        // 02:00 UTC on Monday is Sunday evening in New York: next weekend.
        let now = Utc.with_ymd_and_hms(2026, 10, 26, 2, 0, 0).unwrap();
        let w = WeekendWindow::at(now, PARK_TIMEZONE);
        assert_eq!(w.start, date(2026, 10, 31));
    }

    #[test]
    fn contains_is_half_open_in_local_time() {
        let w = WeekendWindow::upcoming(date(2026, 10, 21));
        let tz = PARK_TIMEZONE;

        let sat_midnight = tz.with_ymd_and_hms(2026, 10, 24, 0, 0, 0).unwrap();
        let fri_late = tz.with_ymd_and_hms(2026, 10, 23, 23, 59, 59).unwrap();
        let sun_late = tz.with_ymd_and_hms(2026, 10, 25, 23, 59, 59).unwrap();
        let mon_midnight = tz.with_ymd_and_hms(2026, 10, 26, 0, 0, 0).unwrap();

        assert!(w.contains(&sat_midnight, tz));
        assert!(w.contains(&sun_late, tz));
        assert!(!w.contains(&fri_late, tz));
        assert!(!w.contains(&mon_midnight, tz));
    }

    #[test]
    fn day_labels() {
        let w = WeekendWindow::upcoming(date(2026, 10, 21));
        assert_eq!(w.day_label(w.start), Some("Saturday"));
        assert_eq!(w.day_label(w.end), Some("Sunday"));
        assert_eq!(w.day_label(date(2026, 10, 21)), None);
    }

    #[test]
    fn localize_skips_spring_forward_gap() {
        // 2026-03-08 02:30 does not exist in New York.
        let naive = date(2026, 3, 8).and_hms_opt(2, 30, 0).unwrap();
        let dt = localize(naive, PARK_TIMEZONE);
        assert_eq!(dt.naive_local(), date(2026, 3, 8).and_hms_opt(3, 30, 0).unwrap());
    }
}
