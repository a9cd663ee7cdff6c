use crate::licensing::trial::TrialPeriod;
use crate::licensing::types::{License, LicenseInformation};
use chrono::{DateTime, Utc};

/// Source of the current time
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Clone, Copy, Default, Debug)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Opaque license code check
pub trait LicenseVerifier {
    fn is_valid(&self, license_code: &str, name: &str) -> bool;
}

/// Source of the stored license, if any
pub trait LicenseProvider {
    fn current_license(&self) -> Option<License>;
}

/// Source of the stored trial period, if any
pub trait TrialProvider {
    fn current_trial_period(&self) -> Option<TrialPeriod>;
}

/// Computes [`LicenseInformation`] from stored data on every query.
///
/// A license the verifier accepts always wins, whatever the trial says.
/// Without one, the trial period decides; no recorded trial counts as
/// the trial being up.
pub struct LicenseInformationProvider<'a> {
    trial_provider: &'a dyn TrialProvider,
    license_provider: &'a dyn LicenseProvider,
    clock: &'a dyn Clock,
    license_verifier: &'a dyn LicenseVerifier,
}

impl<'a> LicenseInformationProvider<'a> {
    pub fn new(
        trial_provider: &'a dyn TrialProvider,
        license_provider: &'a dyn LicenseProvider,
        clock: &'a dyn Clock,
        license_verifier: &'a dyn LicenseVerifier,
    ) -> Self {
        Self {
            trial_provider,
            license_provider,
            clock,
            license_verifier,
        }
    }

    /// Stored license exists but the verifier rejects it
    pub fn license_is_invalid(&self) -> bool {
        match self.license_provider.current_license() {
            Some(license) => !self.is_valid(&license),
            None => false,
        }
    }

    pub fn current_license_information(&self) -> LicenseInformation {
        self.license_information_at(self.clock.now())
    }

    pub fn license_information_at(&self, now: DateTime<Utc>) -> LicenseInformation {
        if let Some(license) = self.license_provider.current_license() {
            if self.is_valid(&license) {
                return LicenseInformation::Registered(license);
            }
            log::debug!("Stored license for {} is invalid, checking trial", license.name);
        }

        match self.trial_provider.current_trial_period() {
            Some(trial_period) if !trial_period.is_expired(now) => {
                LicenseInformation::OnTrial(trial_period)
            }
            Some(_) => LicenseInformation::TrialUp,
            None => {
                log::debug!("No trial period recorded, treating trial as up");
                LicenseInformation::TrialUp
            }
        }
    }

    fn is_valid(&self, license: &License) -> bool {
        self.license_verifier
            .is_valid(&license.license_code, &license.name)
    }
}

impl std::fmt::Debug for LicenseInformationProvider<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LicenseInformationProvider").finish_non_exhaustive()
    }
}
