//! Policy thresholds for a suggestion request.
//!
//! Every limit has a default and can be overridden from the environment
//! (and, in the binary, from CLI flags which take precedence).

use std::collections::HashMap;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

/// Per-file diff character cap.
pub const MAX_FILE_DIFF_CHARS_ENV: &str = "COMMIT_SUGGESTER_MAX_DIFF_CHARS";
/// Aggregate diff size (bytes) above which diffs are summarized.
pub const MAX_TOTAL_DIFF_ENV: &str = "COMMIT_SUGGESTER_MAX_TOTAL_DIFF";
/// Provider request timeout in seconds.
pub const TIMEOUT_ENV: &str = "COMMIT_SUGGESTER_TIMEOUT";

const DEFAULT_MAX_FILE_DIFF_CHARS: usize = 3_000;
const DEFAULT_MAX_TOTAL_DIFF_BYTES: usize = 1_000_000;
const DEFAULT_SUMMARY_CONTEXT_LINES: usize = 50;
const DEFAULT_MAX_SUGGESTIONS: usize = 3;
const DEFAULT_MAX_SUBJECT_LEN: usize = 72;
const DEFAULT_RECENT_COMMIT_COUNT: usize = 3;
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Size bounds applied by the diff collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffLimits {
    pub max_file_diff_chars: usize,
    pub max_total_diff_bytes: usize,
    pub summary_context_lines: usize,
}

impl Default for DiffLimits {
    fn default() -> Self {
        Self {
            max_file_diff_chars: DEFAULT_MAX_FILE_DIFF_CHARS,
            max_total_diff_bytes: DEFAULT_MAX_TOTAL_DIFF_BYTES,
            summary_context_lines: DEFAULT_SUMMARY_CONTEXT_LINES,
        }
    }
}

/// Configuration for one suggestion request.
#[derive(Debug, Clone)]
pub struct SuggestConfig {
    pub limits: DiffLimits,
    pub max_suggestions: usize,
    pub max_subject_len: usize,
    pub recent_commit_count: usize,
    pub request_timeout: Duration,
    /// Rule-template overrides keyed by commit type.
    pub templates: HashMap<String, String>,
    /// Surface a missing credential instead of falling back to rules.
    pub require_ai: bool,
}

impl Default for SuggestConfig {
    fn default() -> Self {
        Self {
            limits: DiffLimits::default(),
            max_suggestions: DEFAULT_MAX_SUGGESTIONS,
            max_subject_len: DEFAULT_MAX_SUBJECT_LEN,
            recent_commit_count: DEFAULT_RECENT_COMMIT_COUNT,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            templates: HashMap::new(),
            require_ai: false,
        }
    }
}

impl SuggestConfig {
    /// Defaults with any environment overrides applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.limits.max_file_diff_chars =
            env_override(MAX_FILE_DIFF_CHARS_ENV, config.limits.max_file_diff_chars);
        config.limits.max_total_diff_bytes =
            env_override(MAX_TOTAL_DIFF_ENV, config.limits.max_total_diff_bytes);
        config.request_timeout = Duration::from_secs(env_override(
            TIMEOUT_ENV,
            config.request_timeout.as_secs(),
        ));
        config
    }
}

/// Parse a `TYPE=TEMPLATE` pair as given on the command line.
pub fn parse_template_override(raw: &str) -> Result<(String, String), String> {
    let (kind, template) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected TYPE=TEMPLATE, got '{raw}'"))?;
    let kind = kind.trim();
    if kind.is_empty() || template.trim().is_empty() {
        return Err(format!("expected TYPE=TEMPLATE, got '{raw}'"));
    }
    Ok((kind.to_string(), template.to_string()))
}

/// Read a value from the environment, keeping `default` when unset or invalid.
///
/// Logs a warning if the variable is set but cannot be parsed.
fn env_override<T>(var: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    match env::var(var) {
        Ok(v) if !v.is_empty() => match v.parse::<T>() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!("Invalid {} value '{}', using default {}", var, v, default);
                default
            }
        },
        _ => default,
    }
}
