use crate::licensing::broadcast::BroadcastsLicenseChange;
use crate::licensing::provider::LicenseVerifier;
use crate::licensing::types::{License, LicenseError, LicenseInformation, RegistrationOutcome};

/// Persists a verified license
pub trait LicenseWriter {
    fn store(&self, license_code: &str, name: &str) -> Result<(), LicenseError>;
}

/// Registration use case: verify, store, then announce
pub struct RegisterApplication<'a> {
    license_verifier: &'a dyn LicenseVerifier,
    license_writer: &'a dyn LicenseWriter,
    change_broadcaster: &'a dyn BroadcastsLicenseChange,
}

impl<'a> RegisterApplication<'a> {
    pub fn new(
        license_verifier: &'a dyn LicenseVerifier,
        license_writer: &'a dyn LicenseWriter,
        change_broadcaster: &'a dyn BroadcastsLicenseChange,
    ) -> Self {
        Self {
            license_verifier,
            license_writer,
            change_broadcaster,
        }
    }

    /// Register the app for `name`.
    ///
    /// A rejected code has no side effects; showing the failure is up to the
    /// caller. The license is stored before the change is broadcast so that
    /// listeners reading storage see the new state.
    pub fn register(&self, name: &str, license_code: &str) -> Result<RegistrationOutcome, LicenseError> {
        if !self.license_verifier.is_valid(license_code, name) {
            log::debug!("Rejected license code for {}", name);
            return Ok(RegistrationOutcome::Rejected);
        }

        self.license_writer.store(license_code, name)?;

        let license = License::new(name, license_code);
        self.change_broadcaster
            .broadcast(&LicenseInformation::Registered(license.clone()));
        log::info!("Registered license for {}", name);

        Ok(RegistrationOutcome::Registered(license))
    }
}

impl std::fmt::Debug for RegisterApplication<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterApplication").finish_non_exhaustive()
    }
}
