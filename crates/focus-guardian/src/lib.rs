//! focus-guardian - Screen-watching focus monitor
//!
//! Periodically captures the screen, asks a vision model what the user is
//! doing, asks a text model whether that matches their stated goal, and
//! warns (or in strict mode, blocks) when it doesn't.
//!
//! - `controller`: session state and the escalation policy
//! - `monitor`: the polling loop around the controller
//! - `groq`: the shipped classifier
//! - `analysis`: post-session report and achievements

pub mod activity;
pub mod alert;
pub mod analysis;
pub mod block;
pub mod capture;
pub mod classifier;
pub mod config;
pub mod controller;
pub mod error;
pub mod groq;
pub mod monitor;
pub mod report;
pub mod session;
pub mod store;

pub use analysis::SessionAnalysis;
pub use classifier::{Classification, Classifier, PollOutcome, Severity};
pub use config::Config;
pub use controller::{ControllerOptions, FocusController, Intervention};
pub use error::GuardianError;
pub use monitor::Monitor;
pub use session::{DistractionEvent, Session};
pub use store::SessionStore;
