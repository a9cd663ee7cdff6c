/// Trial configuration
pub const TRIAL_DAYS: f64 = 30.0;

/// Directory under the platform's local data dir holding license state
pub const APP_DATA_DIR: &str = "com.shareware.app";

/// File name of the JSON key-value store
pub const LICENSE_STATE_FILE: &str = "license-state.json";

/// How many undelivered notifications a slow subscriber may lag behind
pub const NOTIFICATION_CAPACITY: usize = 16;

/// Keys of the persisted key-value store
pub mod storage_keys {
    pub const LICENSEE: &str = "licensee";
    pub const LICENSE_CODE: &str = "license_code";
    pub const TRIAL_START_DATE: &str = "trial_start_date";
    pub const TRIAL_END_DATE: &str = "trial_end_date";
}

/// Keys of the license change broadcast payload
pub mod payload_keys {
    pub const REGISTERED: &str = "registered";
    pub const ON_TRIAL: &str = "on_trial";
    pub const NAME: &str = "name";
    pub const LICENSE_CODE: &str = "licenseCode";
    pub const TRIAL_START_DATE: &str = "trial_start_date";
    pub const TRIAL_END_DATE: &str = "trial_end_date";
}

/// Get the default location of the license state file
pub fn default_store_path() -> Option<std::path::PathBuf> {
    dirs::data_local_dir().map(|dir| dir.join(APP_DATA_DIR).join(LICENSE_STATE_FILE))
}
