//! Process lookup and termination

use std::process::Command;
use sysinfo::{Process, System};

fn matches(process: &Process, needle: &str) -> bool {
    process.name().to_string_lossy().to_lowercase().contains(needle)
}

fn snapshot() -> System {
    let mut sys = System::new();
    sys.refresh_processes(sysinfo::ProcessesToUpdate::All, true);
    sys
}

/// Check if a command exists on PATH
pub fn command_exists(cmd: &str) -> bool {
    let probe = if cfg!(windows) { "where" } else { "which" };
    Command::new(probe)
        .arg(cmd)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Get PIDs of processes whose executable name contains `name` (case-insensitive)
pub fn find_pids(name: &str) -> Vec<u32> {
    let needle = name.to_lowercase();
    let sys = snapshot();

    let mut pids: Vec<u32> = sys
        .processes()
        .iter()
        .filter(|(_, p)| matches(p, &needle))
        .map(|(pid, _)| pid.as_u32())
        .collect();

    pids.sort_unstable();
    pids
}

/// Terminate every process whose name contains `name`.
///
/// Returns the number of processes that accepted the kill signal. Processes
/// owned by other users are skipped silently by the OS.
pub fn terminate(name: &str) -> usize {
    let needle = name.to_lowercase();
    let own_pid = std::process::id();
    let sys = snapshot();

    let mut killed = 0;
    for (pid, process) in sys.processes() {
        if pid.as_u32() == own_pid || !matches(process, &needle) {
            continue;
        }
        if process.kill() {
            tracing::debug!(pid = pid.as_u32(), name, "terminated process");
            killed += 1;
        }
    }

    // Fallback: pkill on Unix, taskkill on Windows
    if killed == 0 {
        killed += terminate_with_command(name);
    }

    killed
}

#[cfg(unix)]
fn terminate_with_command(name: &str) -> usize {
    match Command::new("pkill").args(["-i", "-x", name]).status() {
        Ok(status) if status.success() => 1,
        _ => 0,
    }
}

#[cfg(windows)]
fn terminate_with_command(name: &str) -> usize {
    let image = if name.to_lowercase().ends_with(".exe") {
        name.to_string()
    } else {
        format!("{}.exe", name)
    };
    match Command::new("taskkill").args(["/f", "/im", &image]).status() {
        Ok(status) if status.success() => 1,
        _ => 0,
    }
}

#[cfg(not(any(unix, windows)))]
fn terminate_with_command(_name: &str) -> usize {
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_process_not_running() {
        assert!(find_pids("definitely-not-a-real-process-name-42").is_empty());
    }

    #[test]
    fn test_terminate_unknown_process_is_noop() {
        assert_eq!(terminate("definitely-not-a-real-process-name-42"), 0);
    }

    #[test]
    fn test_missing_command() {
        assert!(!command_exists("definitely-not-a-real-command-42"));
    }
}
