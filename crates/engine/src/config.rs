use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_LINEAR_API_URL: &str = "https://api.linear.app/graphql";

const DEFAULT_TIMEOUT_MS: u64 = 10_000;
const MIN_TIMEOUT_MS: u64 = 100;
const MAX_TIMEOUT_MS: u64 = 60_000;

const DEFAULT_TRACKER_CONCURRENCY: usize = 4;
const MIN_TRACKER_CONCURRENCY: usize = 1;
const MAX_TRACKER_CONCURRENCY: usize = 16;

/// Process configuration for a hygiene check.
///
/// Built once (usually at startup) and handed to the tracker and git reader, so nothing
/// below this type reads the environment.
#[derive(Clone)]
pub struct HygieneConfig {
    /// Linear API key; `None` disables remote verification entirely.
    pub linear_api_key: Option<String>,
    pub linear_api_url: String,
    /// Per-request timeout for tracker calls.
    pub tracker_timeout: Duration,
    /// Timeout for each git invocation.
    pub vcs_timeout: Duration,
    /// Upper bound on concurrent tracker lookups.
    pub tracker_concurrency: usize,
}

impl Default for HygieneConfig {
    fn default() -> Self {
        Self {
            linear_api_key: None,
            linear_api_url: DEFAULT_LINEAR_API_URL.to_string(),
            tracker_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            vcs_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            tracker_concurrency: DEFAULT_TRACKER_CONCURRENCY,
        }
    }
}

impl std::fmt::Debug for HygieneConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HygieneConfig")
            .field(
                "linear_api_key",
                &self.linear_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("linear_api_url", &self.linear_api_url)
            .field("tracker_timeout", &self.tracker_timeout)
            .field("vcs_timeout", &self.vcs_timeout)
            .field("tracker_concurrency", &self.tracker_concurrency)
            .finish()
    }
}

impl HygieneConfig {
    /// Read configuration from the process environment, falling back to `./.env`.
    pub fn from_env() -> Self {
        let dotenv = std::env::current_dir()
            .ok()
            .map(|cwd| load_dotenv(&cwd.join(".env")))
            .unwrap_or_default();
        Self::from_lookup(|key| std::env::var(key).ok().or_else(|| dotenv.get(key).cloned()))
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let value = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        Self {
            linear_api_key: value("LINEAR_API_KEY"),
            linear_api_url: value("HYGIENE_LINEAR_API_URL").unwrap_or(defaults.linear_api_url),
            tracker_timeout: duration_ms(value("HYGIENE_TRACKER_TIMEOUT_MS").as_deref()),
            vcs_timeout: duration_ms(value("HYGIENE_GIT_TIMEOUT_MS").as_deref()),
            tracker_concurrency: value("HYGIENE_TRACKER_CONCURRENCY")
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(DEFAULT_TRACKER_CONCURRENCY)
                .clamp(MIN_TRACKER_CONCURRENCY, MAX_TRACKER_CONCURRENCY),
        }
    }

    pub fn tracker_enabled(&self) -> bool {
        self.linear_api_key.is_some()
    }
}

fn duration_ms(raw: Option<&str>) -> Duration {
    let ms = raw
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(DEFAULT_TIMEOUT_MS)
        .clamp(MIN_TIMEOUT_MS, MAX_TIMEOUT_MS);
    Duration::from_millis(ms)
}

fn load_dotenv(path: &Path) -> HashMap<String, String> {
    match std::fs::read_to_string(path) {
        Ok(raw) => parse_dotenv(&raw),
        Err(_) => HashMap::new(),
    }
}

pub(crate) fn parse_dotenv(raw: &str) -> HashMap<String, String> {
    let mut out = HashMap::new();
    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        out.insert(key.to_string(), unquote(value.trim()).to_string());
    }
    out
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|v| v.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}
