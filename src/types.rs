use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

/// Default per-path throttle window applied before events are queued.
pub const DEFAULT_THROTTLE_WINDOW: Duration = Duration::from_millis(30);

/// What happens to the rest of a rule's pipeline when one stage fails.
///
/// - `Continue`: report the failure and run the next stage with the state as
///   the failing stage left it (default).
/// - `Abort`: report the failure and skip the remaining stages of this rule.
///   Streams are still released and other rules still run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    #[default]
    Continue,
    Abort,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "continue" => Ok(FailurePolicy::Continue),
            "abort" => Ok(FailurePolicy::Abort),
            other => Err(format!(
                "invalid failure_policy: {other} (expected \"continue\" or \"abort\")"
            )),
        }
    }
}

/// Options that shape how a session filters and dispatches events.
#[derive(Debug, Clone, Copy)]
pub struct DispatchOptions {
    pub failure_policy: FailurePolicy,
    /// Minimum interval between two accepted events for the same path.
    pub throttle_window: Duration,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::default(),
            throttle_window: DEFAULT_THROTTLE_WINDOW,
        }
    }
}

/// Parse a short duration string such as `"30ms"`, `"2s"`, `"1m"` or `"1h"`.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    match unit.as_str() {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        "m" => scaled_secs(s, value, 60),
        "h" => scaled_secs(s, value, 60 * 60),
        _ => Err(format!(
            "unsupported duration unit '{}'; expected ms, s, m, or h",
            unit
        )),
    }
}

fn scaled_secs(text: &str, value: u64, factor: u64) -> Result<Duration, String> {
    value
        .checked_mul(factor)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration '{}' is too large", text))
}
