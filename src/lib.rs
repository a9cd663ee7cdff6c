//! Trial and registration state for shareware desktop applications.
//!
//! [`LicenseInformationProvider`] answers "registered, on trial, or trial up?"
//! from the stored license, the stored trial period and the clock.
//! [`RegisterApplication`] verifies and stores a new license and announces
//! the change through a [`LicenseChangeBroadcaster`].
//!
//! The license code check itself is supplied by the host application as a
//! [`LicenseVerifier`].

pub mod licensing;

pub use licensing::*;
