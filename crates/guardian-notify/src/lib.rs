//! guardian-notify - Desktop notifications and alert sounds for Focus Guardian
//!
//! Works on macOS (osascript/terminal-notifier/afplay), Linux
//! (notify-send/kdialog/paplay) and WSL, with a plain-terminal fallback.

mod backend;
mod history;
mod sound;

pub use backend::{Backend, Notification, Urgency};
pub use history::{AlertHistory, AlertRecord};
pub use sound::Player;

pub(crate) use guardian_core::process::command_exists;

/// Default notification title
pub const DEFAULT_TITLE: &str = "Focus Guardian";
