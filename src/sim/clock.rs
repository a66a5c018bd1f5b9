use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Deserializer};

use crate::error::ConfigError;

/// Supported simulation step lengths.
///
/// Parsed from the strings `"1s"`, `"1m"` and `"1h"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interval {
    Second,
    Minute,
    Hour,
}

impl Interval {
    /// Step length in seconds.
    pub fn seconds(self) -> u32 {
        match self {
            Interval::Second => 1,
            Interval::Minute => 60,
            Interval::Hour => 3600,
        }
    }

    /// Step length as a `chrono::Duration`.
    pub fn duration(self) -> Duration {
        Duration::seconds(i64::from(self.seconds()))
    }

    /// Number of steps that make up one hour.
    pub fn steps_per_hour(self) -> usize {
        3600 / self.seconds() as usize
    }

    /// Maps a spacing between two samples back onto a supported interval.
    pub fn from_duration(d: Duration) -> Option<Self> {
        match d.num_seconds() {
            1 if d.subsec_nanos() == 0 => Some(Interval::Second),
            60 if d.subsec_nanos() == 0 => Some(Interval::Minute),
            3600 if d.subsec_nanos() == 0 => Some(Interval::Hour),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Interval::Second => "1s",
            Interval::Minute => "1m",
            Interval::Hour => "1h",
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1s" => Ok(Interval::Second),
            "1m" => Ok(Interval::Minute),
            "1h" => Ok(Interval::Hour),
            other => Err(ConfigError::new(
                "simulation.interval",
                format!("must be \"1s\", \"1m\" or \"1h\", got \"{other}\""),
            )),
        }
    }
}

impl<'de> Deserialize<'de> for Interval {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A simulation clock that walks a fixed time grid.
///
/// Each tick yields the step index together with the timestamp at the
/// start of that step.
///
/// # Examples
///
/// ```
/// use battery_box_sim::sim::clock::{Clock, Interval};
/// use chrono::NaiveDate;
///
/// let start = NaiveDate::from_ymd_opt(2025, 1, 1)
///     .and_then(|d| d.and_hms_opt(0, 0, 0))
///     .unwrap();
/// let mut clock = Clock::new(start, Interval::Minute, 3);
/// let mut minutes = Vec::new();
///
/// clock.run(|_, ts| minutes.push(ts.format("%M").to_string()));
/// assert_eq!(minutes, vec!["00", "01", "02"]);
/// ```
pub struct Clock {
    start: NaiveDateTime,
    interval: Interval,
    /// Current step of the grid
    current: usize,
    /// Total steps on the grid
    total: usize,
}

impl Clock {
    /// Creates a clock of `total` steps starting at `start`.
    pub fn new(start: NaiveDateTime, interval: Interval, total: usize) -> Self {
        Self {
            start,
            interval,
            current: 0,
            total,
        }
    }

    /// Creates a clock spanning whole days at the given interval.
    pub fn for_days(start: NaiveDateTime, interval: Interval, days: usize) -> Self {
        Self::new(start, interval, days * 24 * interval.steps_per_hour())
    }

    /// Timestamp of step `index` on this grid.
    pub fn timestamp_at(&self, index: usize) -> NaiveDateTime {
        self.start + Duration::seconds(index as i64 * i64::from(self.interval.seconds()))
    }

    /// Advances the clock by one step.
    ///
    /// Returns `None` once every step has been handed out.
    pub fn tick(&mut self) -> Option<(usize, NaiveDateTime)> {
        if self.current < self.total {
            let step = self.current;
            self.current += 1;
            Some((step, self.timestamp_at(step)))
        } else {
            None
        }
    }

    /// Runs a function for each remaining step in the clock.
    pub fn run(&mut self, mut f: impl FnMut(usize, NaiveDateTime)) {
        while let Some((step, ts)) = self.tick() {
            f(step, ts);
        }
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    pub fn total(&self) -> usize {
        self.total
    }
}
