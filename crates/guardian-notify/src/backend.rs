//! Notification backends for different platforms

use anyhow::{bail, Result};
use std::process::Command;

/// Notification urgency levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Urgency {
    Low,
    #[default]
    Normal,
    Critical,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Low => "low",
            Urgency::Normal => "normal",
            Urgency::Critical => "critical",
        }
    }
}

/// A notification to display
#[derive(Debug, Clone, Default)]
pub struct Notification {
    /// Notification title
    pub title: String,
    /// Notification message/body
    pub message: String,
    /// Urgency level
    pub urgency: Urgency,
    /// Auto-dismiss timeout in seconds (optional)
    pub timeout: Option<u32>,
}

impl Notification {
    /// Create a new notification with a message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            title: crate::DEFAULT_TITLE.to_string(),
            message: message.into(),
            ..Default::default()
        }
    }

    /// Set the title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the urgency
    pub fn with_urgency(mut self, urgency: Urgency) -> Self {
        self.urgency = urgency;
        self
    }

    /// Set the timeout
    pub fn with_timeout(mut self, seconds: u32) -> Self {
        self.timeout = Some(seconds);
        self
    }
}

/// Available notification backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// macOS terminal-notifier
    TerminalNotifier,
    /// macOS osascript
    Osascript,
    /// Linux notify-send
    NotifySend,
    /// KDE kdialog
    Kdialog,
    /// WSL PowerShell
    Wsl,
    /// Fallback echo
    Echo,
}

impl Backend {
    /// Detect the best available backend for the current platform
    pub fn detect() -> Self {
        #[cfg(target_os = "macos")]
        {
            if crate::command_exists("terminal-notifier") {
                return Self::TerminalNotifier;
            }
            return Self::Osascript;
        }

        #[cfg(target_os = "linux")]
        {
            if std::env::var("WSL_DISTRO_NAME").is_ok() {
                return Self::Wsl;
            }
            if crate::command_exists("notify-send") {
                return Self::NotifySend;
            }
            if crate::command_exists("kdialog") {
                return Self::Kdialog;
            }
            return Self::Echo;
        }

        #[cfg(not(any(target_os = "macos", target_os = "linux")))]
        {
            Self::Echo
        }
    }

    /// Get the name of this backend
    pub fn name(&self) -> &'static str {
        match self {
            Self::TerminalNotifier => "terminal-notifier",
            Self::Osascript => "osascript",
            Self::NotifySend => "notify-send",
            Self::Kdialog => "kdialog",
            Self::Wsl => "wsl",
            Self::Echo => "echo",
        }
    }

    /// Send a notification using this backend
    pub fn send(&self, notification: &Notification) -> Result<()> {
        match self {
            Self::TerminalNotifier => self.send_terminal_notifier(notification),
            Self::Osascript => self.send_osascript(notification),
            Self::NotifySend => self.send_notify_send(notification),
            Self::Kdialog => self.send_kdialog(notification),
            Self::Wsl => self.send_wsl(notification),
            Self::Echo => self.send_echo(notification),
        }
    }

    fn send_terminal_notifier(&self, notification: &Notification) -> Result<()> {
        let status = Command::new("terminal-notifier")
            .args(terminal_notifier_args(notification))
            .status()?;
        if !status.success() {
            bail!("terminal-notifier failed with status: {}", status);
        }
        Ok(())
    }

    fn send_osascript(&self, notification: &Notification) -> Result<()> {
        let script = osascript_script(notification);
        let status = Command::new("osascript").args(["-e", &script]).status()?;

        if !status.success() {
            bail!("osascript failed with status: {}", status);
        }
        Ok(())
    }

    fn send_notify_send(&self, notification: &Notification) -> Result<()> {
        let mut cmd = Command::new("notify-send");
        cmd.args([&notification.title, &notification.message]);
        cmd.args(["--app-name", "Focus Guardian"]);
        cmd.args(["--urgency", notification.urgency.as_str()]);

        if let Some(timeout) = notification.timeout {
            cmd.args(["--expire-time", &(timeout * 1000).to_string()]);
        }

        let status = cmd.status()?;
        if !status.success() {
            bail!("notify-send failed with status: {}", status);
        }
        Ok(())
    }

    fn send_kdialog(&self, notification: &Notification) -> Result<()> {
        let timeout = notification.timeout.unwrap_or(10);

        let status = Command::new("kdialog")
            .args([
                "--passivepopup",
                &notification.message,
                &timeout.to_string(),
                "--title",
                &notification.title,
            ])
            .status()?;

        if !status.success() {
            bail!("kdialog failed with status: {}", status);
        }
        Ok(())
    }

    fn send_wsl(&self, notification: &Notification) -> Result<()> {
        // Escape single quotes for PowerShell
        let title = notification.title.replace('\'', "''");
        let message = notification.message.replace('\'', "''");

        let ps_script = format!(
            r#"[Windows.UI.Notifications.ToastNotificationManager, Windows.UI.Notifications, ContentType = WindowsRuntime] | Out-Null; $template = [Windows.UI.Notifications.ToastNotificationManager]::GetTemplateContent([Windows.UI.Notifications.ToastTemplateType]::ToastText02); $template.GetElementsByTagName('text')[0].AppendChild($template.CreateTextNode('{}')) | Out-Null; $template.GetElementsByTagName('text')[1].AppendChild($template.CreateTextNode('{}')) | Out-Null; [Windows.UI.Notifications.ToastNotificationManager]::CreateToastNotifier('Focus Guardian').Show([Windows.UI.Notifications.ToastNotification]::new($template))"#,
            title, message
        );

        let status = Command::new("powershell.exe")
            .args(["-Command", &ps_script])
            .status()?;

        if !status.success() {
            self.send_echo(notification)?;
        }
        Ok(())
    }

    fn send_echo(&self, notification: &Notification) -> Result<()> {
        eprintln!("[{}] {}", notification.title, notification.message);
        Ok(())
    }
}

fn terminal_notifier_args(notification: &Notification) -> Vec<String> {
    vec![
        "-title".to_string(),
        notification.title.clone(),
        "-message".to_string(),
        notification.message.clone(),
        "-group".to_string(),
        "focus-guardian".to_string(),
    ]
}

fn osascript_script(notification: &Notification) -> String {
    let title = notification.title.replace('"', r#"\""#);
    let message = notification.message.replace('"', r#"\""#);
    format!(r#"display notification "{}" with title "{}""#, message, title)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_builder() {
        let n = Notification::new("YouTube is open")
            .with_title("Focus Alert")
            .with_urgency(Urgency::Critical)
            .with_timeout(10);

        assert_eq!(n.title, "Focus Alert");
        assert_eq!(n.message, "YouTube is open");
        assert_eq!(n.urgency, Urgency::Critical);
        assert_eq!(n.timeout, Some(10));
    }

    #[test]
    fn test_macos_backends_stay_silent() {
        // alert sounds are played by the Player, never by the popup
        let n = Notification::new("Say \"hi\"")
            .with_title("Focus Alert")
            .with_urgency(Urgency::Critical);

        let args = terminal_notifier_args(&n);
        assert_eq!(args[..4], ["-title", "Focus Alert", "-message", "Say \"hi\""]);
        assert!(!args.iter().any(|a| a == "-sound"));

        let script = osascript_script(&n);
        assert_eq!(
            script,
            r#"display notification "Say \"hi\"" with title "Focus Alert""#
        );
    }

    #[test]
    fn test_default_title() {
        assert_eq!(Notification::new("x").title, crate::DEFAULT_TITLE);
    }

    #[test]
    fn test_echo_backend_never_fails() {
        assert!(Backend::Echo.send(&Notification::new("hello")).is_ok());
        assert_eq!(Backend::Echo.name(), "echo");
    }
}
