//! Daily refresh clock.
//!
//! The next wake is today at `hour:00` while that is still ahead, otherwise
//! tomorrow at `hour:00`. The configured weekday is only reported on wake; it
//! never holds a refresh back.

use std::time::Duration;

use chrono::{Datelike, Days, Local, NaiveDateTime, NaiveTime, Timelike, Weekday};
use tracing::{debug, info};

/// Computes the next wake time strictly from the current hour.
///
/// `hour` must be in `0..=23`; larger values are clamped to 23.
#[must_use]
pub fn next_update(now: NaiveDateTime, hour: u32) -> NaiveDateTime {
    let hour = hour.min(23);
    let at_hour = NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN);
    let today = now.date();

    if now.hour() < hour {
        return today.and_time(at_hour);
    }
    today
        .checked_add_days(Days::new(1))
        .unwrap_or(today)
        .and_time(at_hour)
}

/// Maps a `0..=6` day number (Sunday = 0) to a weekday.
#[must_use]
pub fn weekday_from_index(index: u8) -> Weekday {
    match index % 7 {
        0 => Weekday::Sun,
        1 => Weekday::Mon,
        2 => Weekday::Tue,
        3 => Weekday::Wed,
        4 => Weekday::Thu,
        5 => Weekday::Fri,
        _ => Weekday::Sat,
    }
}

/// Blocks the refresh loop until the next update hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateClock {
    hour: u32,
    weekday: Weekday,
}

impl UpdateClock {
    /// Creates a clock waking at `hour:00` local time.
    #[must_use]
    pub fn new(hour: u32, weekday: Weekday) -> Self {
        Self {
            hour: hour.min(23),
            weekday,
        }
    }

    /// Next wake relative to `now`.
    #[must_use]
    pub fn next_after(&self, now: NaiveDateTime) -> NaiveDateTime {
        next_update(now, self.hour)
    }

    /// Sleeps until the next wake, then reports whether today is the
    /// configured weekday.
    pub async fn wait(&self) {
        let now = Local::now().naive_local();
        let wake = self.next_after(now);
        let pause = (wake - now).to_std().unwrap_or(Duration::ZERO);
        info!(wake = %wake, secs = pause.as_secs(), "waiting for next update");

        tokio::time::sleep(pause).await;

        let today = Local::now().weekday();
        if today == self.weekday {
            info!(weekday = ?today, "update day reached");
        } else {
            debug!(weekday = ?today, configured = ?self.weekday, "refreshing outside update day");
        }
    }
}
