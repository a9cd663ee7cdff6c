//! License change notifications.
//!
//! A [`LicenseInformation`] travels to listeners as a flat attribute map
//! ([`UserInfo`]) so that subscribers outside this crate, or outside the
//! process, only need to understand strings, bools and timestamps.

use crate::licensing::config::{payload_keys, NOTIFICATION_CAPACITY};
use crate::licensing::trial::TrialPeriod;
use crate::licensing::types::{License, LicenseInformation};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio::sync::broadcast;

/// Generic attribute payload of a notification
pub type UserInfo = BTreeMap<String, AttributeValue>;

#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
#[serde(rename_all = "snake_case")]
pub enum AttributeValue {
    Bool(bool),
    Text(String),
    Timestamp(DateTime<Utc>),
}

impl AttributeValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            AttributeValue::Timestamp(value) => Some(*value),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub enum Event {
    #[serde(rename = "License Changed")]
    LicenseChanged,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::LicenseChanged => "License Changed",
        }
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An event together with its payload
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct Notification {
    pub event: Event,
    pub user_info: UserInfo,
}

impl LicenseInformation {
    pub fn user_info(&self) -> UserInfo {
        let mut user_info = UserInfo::new();
        let mut insert = |key: &str, value: AttributeValue| {
            user_info.insert(key.to_string(), value);
        };

        match self {
            LicenseInformation::OnTrial(trial_period) => {
                insert(payload_keys::REGISTERED, AttributeValue::Bool(false));
                insert(payload_keys::ON_TRIAL, AttributeValue::Bool(true));
                insert(
                    payload_keys::TRIAL_START_DATE,
                    AttributeValue::Timestamp(trial_period.start_date),
                );
                insert(
                    payload_keys::TRIAL_END_DATE,
                    AttributeValue::Timestamp(trial_period.end_date),
                );
            }
            LicenseInformation::Registered(license) => {
                insert(payload_keys::REGISTERED, AttributeValue::Bool(true));
                insert(payload_keys::ON_TRIAL, AttributeValue::Bool(false));
                insert(payload_keys::NAME, AttributeValue::Text(license.name.clone()));
                insert(
                    payload_keys::LICENSE_CODE,
                    AttributeValue::Text(license.license_code.clone()),
                );
            }
            LicenseInformation::TrialUp => {
                insert(payload_keys::REGISTERED, AttributeValue::Bool(false));
                insert(payload_keys::ON_TRIAL, AttributeValue::Bool(false));
            }
        }

        user_info
    }

    /// Decode a payload produced by [`LicenseInformation::user_info`].
    ///
    /// `None` means the state could not be determined, which is not the same
    /// as the trial being up.
    pub fn from_user_info(user_info: &UserInfo) -> Option<Self> {
        let registered = user_info.get(payload_keys::REGISTERED)?.as_bool()?;

        if !registered {
            if let Some(on_trial) = user_info
                .get(payload_keys::ON_TRIAL)
                .and_then(AttributeValue::as_bool)
            {
                if !on_trial {
                    return Some(LicenseInformation::TrialUp);
                }

                let start_date = user_info
                    .get(payload_keys::TRIAL_START_DATE)
                    .and_then(AttributeValue::as_timestamp);
                let end_date = user_info
                    .get(payload_keys::TRIAL_END_DATE)
                    .and_then(AttributeValue::as_timestamp);

                if let (Some(start_date), Some(end_date)) = (start_date, end_date) {
                    return Some(LicenseInformation::OnTrial(TrialPeriod::new(
                        start_date, end_date,
                    )));
                }
            }
        }

        let name = user_info.get(payload_keys::NAME)?.as_str()?;
        let license_code = user_info.get(payload_keys::LICENSE_CODE)?.as_str()?;

        Some(LicenseInformation::Registered(License::new(name, license_code)))
    }
}

/// Publish capability of a notification channel
pub trait NotificationChannel {
    fn publish(&self, event: Event, user_info: UserInfo);
}

/// Anything that announces license changes
pub trait BroadcastsLicenseChange {
    fn broadcast(&self, license_information: &LicenseInformation);
}

/// Turns license changes into [`Event::LicenseChanged`] notifications
pub struct LicenseChangeBroadcaster<'a> {
    notification_channel: &'a dyn NotificationChannel,
}

impl<'a> LicenseChangeBroadcaster<'a> {
    pub fn new(notification_channel: &'a dyn NotificationChannel) -> Self {
        Self { notification_channel }
    }
}

impl BroadcastsLicenseChange for LicenseChangeBroadcaster<'_> {
    fn broadcast(&self, license_information: &LicenseInformation) {
        self.notification_channel
            .publish(Event::LicenseChanged, license_information.user_info());
    }
}

impl std::fmt::Debug for LicenseChangeBroadcaster<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LicenseChangeBroadcaster").finish_non_exhaustive()
    }
}

/// In-process publish/subscribe channel owned by the composition root
#[derive(Clone, Debug)]
pub struct NotificationCenter {
    sender: broadcast::Sender<Notification>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::with_capacity(NOTIFICATION_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationChannel for NotificationCenter {
    fn publish(&self, event: Event, user_info: UserInfo) {
        if self.sender.send(Notification { event, user_info }).is_err() {
            log::debug!("No subscribers for {}", event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::cell::RefCell;

    fn trial_period() -> TrialPeriod {
        let start = Utc.with_ymd_and_hms(2025, 2, 1, 8, 0, 0).unwrap();
        TrialPeriod::new(start, start + Duration::days(30))
    }

    fn user_info(entries: &[(&str, AttributeValue)]) -> UserInfo {
        entries
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn test_round_trip_all_variants() {
        let variants = [
            LicenseInformation::Registered(License::new("Jane", "ABC-123")),
            LicenseInformation::OnTrial(trial_period()),
            LicenseInformation::TrialUp,
        ];

        for info in variants {
            assert_eq!(LicenseInformation::from_user_info(&info.user_info()), Some(info));
        }
    }

    #[test]
    fn test_encoding_key_sets() {
        let registered = LicenseInformation::Registered(License::new("Jane", "ABC-123")).user_info();
        assert_eq!(registered.get("registered"), Some(&AttributeValue::Bool(true)));
        assert_eq!(registered.get("on_trial"), Some(&AttributeValue::Bool(false)));
        assert_eq!(registered.get("licenseCode"), Some(&AttributeValue::Text("ABC-123".into())));
        assert_eq!(registered.len(), 4);

        let on_trial = LicenseInformation::OnTrial(trial_period()).user_info();
        assert_eq!(
            on_trial.get("trial_end_date"),
            Some(&AttributeValue::Timestamp(trial_period().end_date))
        );
        assert_eq!(on_trial.len(), 4);

        assert_eq!(LicenseInformation::TrialUp.user_info().len(), 2);
    }

    #[test]
    fn test_decode_flags_only_yields_trial_up() {
        let payload = user_info(&[
            ("registered", AttributeValue::Bool(false)),
            ("on_trial", AttributeValue::Bool(false)),
        ]);
        assert_eq!(LicenseInformation::from_user_info(&payload), Some(LicenseInformation::TrialUp));
    }

    #[test]
    fn test_decode_on_trial_missing_end_date_yields_none() {
        let payload = user_info(&[
            ("registered", AttributeValue::Bool(false)),
            ("on_trial", AttributeValue::Bool(true)),
            ("trial_start_date", AttributeValue::Timestamp(trial_period().start_date)),
        ]);
        assert_eq!(LicenseInformation::from_user_info(&payload), None);
    }

    #[test]
    fn test_decode_missing_registered_flag_yields_none() {
        let payload = user_info(&[
            ("on_trial", AttributeValue::Bool(false)),
            ("name", AttributeValue::Text("Jane".into())),
            ("licenseCode", AttributeValue::Text("ABC-123".into())),
        ]);
        assert_eq!(LicenseInformation::from_user_info(&payload), None);
    }

    #[test]
    fn test_decode_registered_without_name_yields_none() {
        let payload = user_info(&[
            ("registered", AttributeValue::Bool(true)),
            ("on_trial", AttributeValue::Bool(false)),
            ("licenseCode", AttributeValue::Text("ABC-123".into())),
        ]);
        assert_eq!(LicenseInformation::from_user_info(&payload), None);
    }

    #[test]
    fn test_decode_falls_through_to_license_when_trial_dates_missing() {
        let payload = user_info(&[
            ("registered", AttributeValue::Bool(false)),
            ("on_trial", AttributeValue::Bool(true)),
            ("name", AttributeValue::Text("Jane".into())),
            ("licenseCode", AttributeValue::Text("ABC-123".into())),
        ]);
        assert_eq!(
            LicenseInformation::from_user_info(&payload),
            Some(LicenseInformation::Registered(License::new("Jane", "ABC-123")))
        );
    }

    #[test]
    fn test_decode_wrong_value_type_yields_none() {
        let payload = user_info(&[
            ("registered", AttributeValue::Text("false".into())),
            ("on_trial", AttributeValue::Bool(false)),
        ]);
        assert_eq!(LicenseInformation::from_user_info(&payload), None);
    }

    #[test]
    fn test_payload_survives_json() {
        let notification = Notification {
            event: Event::LicenseChanged,
            user_info: LicenseInformation::OnTrial(trial_period()).user_info(),
        };

        let json = serde_json::to_string(&notification).unwrap();
        let decoded: Notification = serde_json::from_str(&json).unwrap();

        assert_eq!(decoded, notification);
        assert!(json.contains("\"License Changed\""));
    }

    #[derive(Default)]
    struct TestChannel {
        published: RefCell<Vec<(Event, UserInfo)>>,
    }

    impl NotificationChannel for TestChannel {
        fn publish(&self, event: Event, user_info: UserInfo) {
            self.published.borrow_mut().push((event, user_info));
        }
    }

    #[test]
    fn test_broadcast_publishes_license_changed() {
        let channel = TestChannel::default();
        let broadcaster = LicenseChangeBroadcaster::new(&channel);

        broadcaster.broadcast(&LicenseInformation::TrialUp);

        let published = channel.published.borrow();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, Event::LicenseChanged);
        assert_eq!(published[0].1, LicenseInformation::TrialUp.user_info());
    }

    #[test]
    fn test_notification_center_delivers_to_subscribers() {
        let center = NotificationCenter::new();
        let mut receiver = center.subscribe();
        let info = LicenseInformation::Registered(License::new("Jane", "ABC-123"));

        LicenseChangeBroadcaster::new(&center).broadcast(&info);

        let notification = receiver.try_recv().unwrap();
        assert_eq!(notification.event, Event::LicenseChanged);
        assert_eq!(LicenseInformation::from_user_info(&notification.user_info), Some(info));
    }

    #[test]
    fn test_notification_center_without_subscribers_is_silent() {
        let center = NotificationCenter::new();
        center.publish(Event::LicenseChanged, LicenseInformation::TrialUp.user_info());
    }
}
