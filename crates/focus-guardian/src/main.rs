//! focus-guardian - Keep your screen on your goal
//!
//! Usage:
//!   focus-guardian "Write the quarterly report"      Monitor until Ctrl-C
//!   focus-guardian "Study ML on YouTube" --strict    Block after 3 distractions
//!   focus-guardian --summary                         Analyze stored sessions
//!   focus-guardian --analyze FILE                    Show an exported analysis

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use guardian_core::Paths;
use guardian_notify::AlertHistory;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use focus_guardian::alert::DesktopAlerts;
use focus_guardian::block::ProcessBlocker;
use focus_guardian::capture::CommandCapture;
use focus_guardian::groq::GroqClassifier;
use focus_guardian::report::{self, color, CYAN, GREEN, RED};
use focus_guardian::session::local_now;
use focus_guardian::{
    Config, ControllerOptions, FocusController, GuardianError, Monitor, SessionAnalysis,
    SessionStore,
};

const RECENT_ALERTS: usize = 5;

/// Focus Guardian - AI-assisted focus monitor
#[derive(Parser)]
#[command(name = "focus-guardian")]
#[command(about = "Watches your screen and warns you when you drift away from your goal")]
#[command(version)]
#[command(after_help = r#"HOW IT WORKS:
    Every few seconds the screen is captured and sent to a vision model,
    which names the active application or website. A text model then
    judges that activity against your goal. Off-goal activity raises a
    sound and a desktop alert.

STRICT MODE:
    With --strict, every distraction counts as a strike. When the strike
    threshold is reached, configured browsers are closed and the count
    resets.

CONFIGURATION:
    ~/.config/focus-guardian/config.toml (or --config PATH)
    API key: GROQ_API_KEY, api_key in the config, or ./api.txt

EXAMPLES:
    focus-guardian "Write thesis chapter 3"
    focus-guardian "Study ML on YouTube" --strict --interval 15
    focus-guardian --summary
    focus-guardian --analyze ~/.local/share/focus-guardian/analyses/focus_session_20240314_093000.json
"#)]
struct Cli {
    /// What you intend to work on
    goal: Option<String>,

    /// Close distracting applications after repeated distractions
    #[arg(long, visible_alias = "sfm")]
    strict: bool,

    /// Seconds between screen checks
    #[arg(long, value_name = "SECS")]
    interval: Option<u64>,

    /// Distractions before strict mode blocks
    #[arg(long, value_name = "N")]
    threshold: Option<u32>,

    /// Disable alert sounds
    #[arg(long)]
    no_sound: bool,

    /// Disable popup notifications
    #[arg(long)]
    no_popup: bool,

    /// Print a previously exported analysis and exit
    #[arg(long, value_name = "PATH", conflicts_with_all = ["goal", "summary"])]
    analyze: Option<PathBuf>,

    /// Analyze stored session history and exit
    #[arg(long, conflicts_with = "goal")]
    summary: bool,

    /// Use an alternative config file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("focus_guardian=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli, &Paths::new()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", color(RED, "[error]"), e);
            if e.downcast_ref::<GuardianError>().is_some_and(GuardianError::is_fatal) {
                eprintln!("Run 'focus-guardian --help' for usage and configuration");
            }
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli, paths: &Paths) -> Result<()> {
    if let Some(path) = &cli.analyze {
        return cmd_analyze(path);
    }
    if cli.summary {
        return cmd_summary(paths);
    }

    let config = load_config(&cli, paths)?;

    let goal = cli.goal.as_deref().map(str::trim).unwrap_or_default();
    if goal.is_empty() {
        return Err(GuardianError::Validation(
            "a goal is required, e.g. focus-guardian \"Write the quarterly report\"".into(),
        )
        .into());
    }

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(cmd_monitor(&cli, paths, &config, goal))
}

fn load_config(cli: &Cli, paths: &Paths) -> Result<Config> {
    let path = cli.config.clone().unwrap_or_else(|| paths.config_file());
    let mut config = Config::load(&path)
        .map_err(|e| GuardianError::Configuration(format!("{:#}", e)))?;

    if let Some(interval) = cli.interval {
        config.interval_secs = interval;
    }
    if let Some(threshold) = cli.threshold {
        config.strike_threshold = threshold;
    }
    config.validate()?;
    Ok(config)
}

/// Show a stored analysis
fn cmd_analyze(path: &Path) -> Result<()> {
    let analysis = SessionAnalysis::load(path)?;
    report::print_analysis(&analysis);
    Ok(())
}

/// Analyze stored history and export the result
fn cmd_summary(paths: &Paths) -> Result<()> {
    let store = SessionStore::new(&paths.sessions_file());
    let sessions = store.load().unwrap_or_else(|e| {
        tracing::warn!("{}; analyzing empty history", e);
        Vec::new()
    });

    if sessions.is_empty() {
        println!("{} No focus sessions recorded yet", color(CYAN, "[info]"));
    }

    let now = local_now();
    let analysis = SessionAnalysis::from_sessions(&sessions);
    report::print_analysis(&analysis);
    export(&analysis, paths, now);
    print_recent_alerts(paths);
    Ok(())
}

async fn cmd_monitor(cli: &Cli, paths: &Paths, config: &Config, goal: &str) -> Result<()> {
    let mut classifier = GroqClassifier::from_config(config)?;
    classifier.prepare(goal).await?;

    let alerts = Arc::new(DesktopAlerts::new(
        !cli.no_popup,
        !cli.no_sound,
        &paths.alert_history(),
    ));
    let blocker = Box::new(ProcessBlocker::new(config.block_targets.clone()));
    let options = ControllerOptions {
        strict: cli.strict,
        strike_threshold: config.strike_threshold,
    };
    let controller = FocusController::new(
        options,
        SessionStore::new(&paths.sessions_file()),
        alerts,
        blocker,
    );

    let mut monitor = Monitor::new(
        controller,
        Arc::new(classifier),
        Arc::new(CommandCapture::detect()),
        Duration::from_secs(config.interval_secs),
        Duration::from_secs(config.request_timeout_secs),
    );

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl-C: {}", e);
        }
        on_signal.cancel();
    });

    report::print_session_started(goal, cli.strict, config.interval_secs);
    let session = monitor.run(goal, cancel).await?;
    report::print_session_ended(&session, monitor.controller().last_poll());

    let now = local_now();
    let analysis = monitor.controller().summarize_at(now);
    report::print_analysis(&analysis);
    export(&analysis, paths, now);
    Ok(())
}

fn export(analysis: &SessionAnalysis, paths: &Paths, now: chrono::NaiveDateTime) {
    let path = SessionAnalysis::export_path(&paths.analyses_dir(), now);
    match analysis.save(&path).context("Failed to export analysis") {
        Ok(()) => println!(
            "\n{} Analysis saved to {}",
            color(GREEN, "[ok]"),
            path.display()
        ),
        Err(e) => tracing::error!("{:#}", e),
    }
}

fn print_recent_alerts(paths: &Paths) {
    let records = AlertHistory::new(&paths.alert_history()).and_then(|h| h.recent(RECENT_ALERTS));
    match records {
        Ok(records) => report::print_recent_alerts(&records),
        Err(e) => tracing::debug!("alert history unavailable: {:#}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_flags() {
        let cli = Cli::try_parse_from([
            "focus-guardian",
            "Write report",
            "--sfm",
            "--interval",
            "15",
            "--no-sound",
        ])
        .unwrap();

        assert_eq!(cli.goal.as_deref(), Some("Write report"));
        assert!(cli.strict);
        assert_eq!(cli.interval, Some(15));
        assert!(cli.no_sound);
        assert!(!cli.no_popup);
    }

    #[test]
    fn test_analyze_conflicts_with_goal() {
        assert!(Cli::try_parse_from(["focus-guardian", "goal", "--analyze", "x.json"]).is_err());
        assert!(Cli::try_parse_from(["focus-guardian", "--analyze", "x.json"]).is_ok());
    }

    #[test]
    fn test_cli_overrides_config() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::rooted(dir.path());
        let cli = Cli::try_parse_from(["focus-guardian", "goal", "--threshold", "5"]).unwrap();

        let config = load_config(&cli, &paths).unwrap();
        assert_eq!(config.strike_threshold, 5);
        assert_eq!(config.interval_secs, 10);
    }

    #[test]
    fn test_summary_ignores_broken_config() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::rooted(dir.path());
        std::fs::create_dir_all(&paths.config).unwrap();
        std::fs::write(paths.config_file(), "interval_secs = \"often\"").unwrap();

        let monitor = Cli::try_parse_from(["focus-guardian", "goal"]).unwrap();
        assert!(load_config(&monitor, &paths).is_err());

        let summary = Cli::try_parse_from(["focus-guardian", "--summary"]).unwrap();
        run(summary, &paths).unwrap();
        assert!(paths.analyses_dir().exists());
    }

    #[test]
    fn test_zero_interval_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::rooted(dir.path());
        let cli = Cli::try_parse_from(["focus-guardian", "goal", "--interval", "0"]).unwrap();

        let err = load_config(&cli, &paths).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GuardianError>(),
            Some(GuardianError::Configuration(_))
        ));
    }
}
