//! Business logic services.
//!
//! Services sit between the HTTP handlers / workers and the external
//! systems they talk to.

pub mod notifier;

pub use notifier::{DEFAULT_DELAY, Notifier, NotifyOutcome};
