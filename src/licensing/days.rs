use chrono::TimeDelta;
use std::fmt;

const SECONDS_PER_DAY: f64 = 60.0 * 60.0 * 24.0;

/// A quantity of days, possibly fractional.
///
/// A negative amount means "in the past". Only [`Days::new`] can produce one:
/// the time-interval constructors always store the magnitude, because they
/// answer "how many days until a deadline" rather than "how long ago".
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Days {
    amount: f64,
}

impl Days {
    pub fn time_interval_from_amount(amount: f64) -> f64 {
        amount * SECONDS_PER_DAY
    }

    pub fn amount_from_time_interval(time_interval: f64) -> f64 {
        time_interval / SECONDS_PER_DAY
    }

    /// Keeps the sign of `amount`.
    pub fn new(amount: f64) -> Self {
        Self { amount }
    }

    /// Discards the sign of `time_interval` (seconds).
    pub fn from_time_interval(time_interval: f64) -> Self {
        Self {
            amount: Self::amount_from_time_interval(time_interval).abs(),
        }
    }

    /// Discards the sign of `duration`.
    pub fn from_duration(duration: TimeDelta) -> Self {
        Self::from_time_interval(duration.num_milliseconds() as f64 / 1000.0)
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    /// Rounded up to the next integer so that a fraction of a day left
    /// never reads as zero.
    pub fn user_facing_amount(&self) -> i64 {
        self.amount.abs().ceil() as i64
    }

    /// Signed length in seconds
    pub fn time_interval(&self) -> f64 {
        Self::time_interval_from_amount(self.amount)
    }

    /// `None` when the amount is not finite or exceeds what a `TimeDelta` holds
    pub fn to_duration(&self) -> Option<TimeDelta> {
        let milliseconds = (self.time_interval() * 1000.0).round();
        if !milliseconds.is_finite() || milliseconds.abs() >= i64::MAX as f64 {
            return None;
        }
        TimeDelta::try_milliseconds(milliseconds as i64)
    }

    pub fn is_past(&self) -> bool {
        self.amount < 0.0
    }
}

impl fmt::Display for Days {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.amount)
    }
}
