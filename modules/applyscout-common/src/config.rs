use anyhow::{Context, Result};

/// Per-task resilience knobs consumed by the apply runner.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// When true, stop at PREFILLED and never auto-submit.
    pub safe_mode: bool,
    /// Max retry attempts for transient failures (total attempts = max_retries + 1).
    pub max_retries: u32,
    /// Base delay for exponential backoff.
    pub base_delay_ms: u64,
    /// Cap on any single backoff delay.
    pub max_delay_ms: u64,
    /// Minimum interval between requests to the same effective domain.
    pub domain_throttle_ms: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            safe_mode: false,
            max_retries: 3,
            base_delay_ms: 1_000,
            max_delay_ms: 30_000,
            domain_throttle_ms: 5_000,
        }
    }
}

/// Worker configuration loaded from environment variables. Provider keys
/// are optional: without YUTORI_API_KEY the worker runs the deterministic
/// stub adapter, without TAVILY_API_KEY discovery is unavailable.
#[derive(Debug, Clone)]
pub struct Config {
    pub tavily_api_key: Option<String>,
    pub yutori_api_key: Option<String>,

    pub runner: RunnerConfig,

    /// Minimum merged score for a candidate to become a lead.
    pub score_threshold: f64,
    /// Cap on new leads per preference profile per discovery run.
    pub max_leads: usize,
    /// Max queued tasks claimed per apply pass.
    pub batch_size: usize,
    /// Score bonus per additional corroborating query during merge.
    pub multi_query_bonus: f64,

    /// Scheduler periods for the long-running `run` mode.
    pub discover_interval_secs: u64,
    pub apply_interval_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            tavily_api_key: std::env::var("TAVILY_API_KEY").ok(),
            yutori_api_key: std::env::var("YUTORI_API_KEY").ok(),
            runner: RunnerConfig {
                safe_mode: std::env::var("APPLY_SAFE_MODE")
                    .map(|v| v == "true")
                    .unwrap_or(false),
                max_retries: env_parse("APPLY_MAX_RETRIES", 3)?,
                base_delay_ms: env_parse("APPLY_BASE_DELAY_MS", 1_000)?,
                max_delay_ms: env_parse("APPLY_MAX_DELAY_MS", 30_000)?,
                domain_throttle_ms: env_parse("APPLY_DOMAIN_THROTTLE_MS", 5_000)?,
            },
            score_threshold: env_parse("SCORE_THRESHOLD", 0.8)?,
            max_leads: env_parse("MAX_LEADS", 15)?,
            batch_size: env_parse("APPLY_BATCH_SIZE", 10)?,
            multi_query_bonus: env_parse("MULTI_QUERY_BONUS", 0.05)?,
            discover_interval_secs: env_parse("DISCOVER_INTERVAL_SECS", 3_600)?,
            apply_interval_secs: env_parse("APPLY_INTERVAL_SECS", 600)?,
        };

        Ok(config)
    }

    pub fn log_redacted(&self) {
        fn preview(val: &Option<String>) -> String {
            match val {
                Some(v) if !v.is_empty() => {
                    let n = v.len().min(5);
                    format!("{}...({} chars)", &v[..n], v.len())
                }
                _ => "<not set>".to_string(),
            }
        }

        tracing::info!("Config loaded:");
        tracing::info!("  TAVILY_API_KEY: {}", preview(&self.tavily_api_key));
        tracing::info!("  YUTORI_API_KEY: {}", preview(&self.yutori_api_key));
        tracing::info!(
            "  runner: safe_mode={} max_retries={} base_delay_ms={} max_delay_ms={} domain_throttle_ms={}",
            self.runner.safe_mode,
            self.runner.max_retries,
            self.runner.base_delay_ms,
            self.runner.max_delay_ms,
            self.runner.domain_throttle_ms,
        );
        tracing::info!(
            "  discovery: score_threshold={} max_leads={} multi_query_bonus={}",
            self.score_threshold,
            self.max_leads,
            self.multi_query_bonus,
        );
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("{key} must be a valid number, got {raw:?}")),
        Err(_) => Ok(default),
    }
}
