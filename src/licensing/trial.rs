use crate::licensing::days::Days;
use crate::licensing::provider::Clock;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The interval during which the app is usable without a license
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub struct TrialPeriod {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

impl TrialPeriod {
    pub fn new(start_date: DateTime<Utc>, end_date: DateTime<Utc>) -> Self {
        Self { start_date, end_date }
    }

    /// A period of `days` beginning at `now`, `None` if the end date is not representable
    pub fn starting_at(now: DateTime<Utc>, days: Days) -> Option<Self> {
        let end_date = now.checked_add_signed(days.to_duration()?)?;
        Some(Self::new(now, end_date))
    }

    /// Distance to the end date, without sign.
    ///
    /// Check [`TrialPeriod::is_expired`] first: a period that ended two days
    /// ago also reports two days.
    pub fn days_left(&self, now: DateTime<Utc>) -> Days {
        Days::from_duration(self.end_date - now)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.end_date
    }
}

/// A trial period read against a clock, for display
pub struct Trial<'a> {
    pub trial_period: TrialPeriod,
    clock: &'a dyn Clock,
}

impl<'a> Trial<'a> {
    pub fn new(trial_period: TrialPeriod, clock: &'a dyn Clock) -> Self {
        Self { trial_period, clock }
    }

    pub fn days_left(&self) -> i64 {
        self.trial_period.days_left(self.clock.now()).user_facing_amount()
    }

    pub fn ended(&self) -> bool {
        self.trial_period.is_expired(self.clock.now())
    }
}

impl std::fmt::Debug for Trial<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Trial")
            .field("trial_period", &self.trial_period)
            .finish_non_exhaustive()
    }
}
