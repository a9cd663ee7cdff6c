use crate::licensing::trial::TrialPeriod;
use serde::{Deserialize, Serialize};

/// A licensee name paired with the code issued for it.
///
/// No format checks happen here; that is the verifier's job.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
pub struct License {
    pub name: String,
    pub license_code: String,
}

impl License {
    pub fn new(name: impl Into<String>, license_code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            license_code: license_code.into(),
        }
    }
}

/// Current licensing state, the single source of truth for what the UI shows
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
#[serde(rename_all = "snake_case")]
pub enum LicenseInformation {
    Registered(License),
    OnTrial(TrialPeriod),
    TrialUp,
}

impl LicenseInformation {
    /// Check if the user can use the app (trial active or registered)
    pub fn can_use_app(&self) -> bool {
        matches!(self, LicenseInformation::Registered(_) | LicenseInformation::OnTrial(_))
    }
}

/// Result of a registration attempt
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum RegistrationOutcome {
    /// License verified, stored and announced
    Registered(License),
    /// Verifier refused the name/code pair; nothing was stored
    Rejected,
}

/// Error types for licensing operations
#[derive(thiserror::Error, Debug)]
pub enum LicenseError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Trial already started")]
    TrialAlreadyStarted,

    #[error("Trial length out of range: {0} days")]
    InvalidTrialLength(f64),
}

impl Serialize for LicenseError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
