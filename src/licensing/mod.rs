// Licensing system module
// Trial and registration state

pub mod broadcast;
pub mod config;
pub mod days;
pub mod provider;
pub mod registration;
pub mod storage;
pub mod trial;
pub mod types;

pub use broadcast::*;
pub use days::Days;
pub use provider::*;
pub use registration::*;
pub use storage::*;
pub use trial::*;
pub use types::*;
