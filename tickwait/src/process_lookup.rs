//! Inspect a process through `/proc/<pid>/stat`.

use anyhow::{bail, Context, Result};
use nix::unistd::Pid;
use std::fs;

/// Command name and scheduler state of a live process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcStat {
    pub comm: String,
    /// Single-letter state, e.g. `R` running, `S` sleeping, `Z` zombie
    pub state: char,
}

/// Read the command name and state of `pid`.
///
/// # Errors
/// Returns error if the process doesn't exist (or was reaped) or its stat
/// file is malformed.
pub fn read_stat(pid: Pid) -> Result<ProcStat> {
    let stat_path = format!("/proc/{pid}/stat");
    let content = fs::read_to_string(&stat_path).with_context(|| format!("Cannot read {stat_path}"))?;
    parse_stat(&content)
}

fn parse_stat(stat_line: &str) -> Result<ProcStat> {
    let comm = extract_comm(stat_line)?;
    let close = stat_line.rfind(')').context("Invalid stat format")?;
    let state = stat_line[close + 1..]
        .split_whitespace()
        .next()
        .and_then(|s| s.chars().next())
        .context("Missing process state")?;
    Ok(ProcStat { comm, state })
}

/// Extract command name from `/proc/<pid>/stat`.
/// Format: "pid (comm) state ..."
fn extract_comm(stat_line: &str) -> Result<String> {
    let open = stat_line.find('(').context("Invalid stat format")?;
    let close = stat_line.rfind(')').context("Invalid stat format")?;
    if open >= close {
        bail!("Invalid stat format");
    }
    Ok(stat_line[open + 1..close].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_comm() {
        let stat = "1234 (my-app) S 1 1234 1234 0 -1 4194304";
        assert_eq!(extract_comm(stat).unwrap(), "my-app");
    }

    #[test]
    fn test_extract_comm_with_parens() {
        // Command names can contain parentheses
        let stat = "1234 (app (v2)) S 1 1234";
        assert_eq!(extract_comm(stat).unwrap(), "app (v2)");
    }

    #[test]
    fn test_parse_state() {
        let stat = parse_stat("42 (tick wait) Z 1 42 42").unwrap();
        assert_eq!(stat, ProcStat { comm: "tick wait".to_string(), state: 'Z' });
        assert!(parse_stat("42 (truncated)").is_err());
    }

    #[test]
    fn test_read_own_stat() {
        let stat = read_stat(nix::unistd::getpid()).unwrap();
        assert!(!stat.comm.is_empty());
        assert!(stat.state.is_ascii_uppercase());
    }

    #[test]
    fn test_process_not_found() {
        let result = read_stat(Pid::from_raw(999_999_999));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Cannot read"));
    }
}
