use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl Environment {
    /// Tracing filter used when neither `RUST_LOG` nor
    /// `CHATPULSE_LOG_LEVEL` is set.
    #[must_use]
    pub fn default_log_level(&self) -> &'static str {
        match self {
            Environment::Development => "debug",
            Environment::Test => "warn",
            Environment::Production => "info",
        }
    }

    /// Colored log output is for interactive terminals only.
    #[must_use]
    pub fn ansi_logs(&self) -> bool {
        !matches!(self, Environment::Production)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Which classifier backend labels incoming messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierKind {
    /// Built-in word-weight lexicon; no network access.
    Lexicon,
    /// Remote text-classification inference endpoint.
    Http,
}

impl std::fmt::Display for ClassifierKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClassifierKind::Lexicon => write!(f, "lexicon"),
            ClassifierKind::Http => write!(f, "http"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub source_url: Option<String>,
    pub source_file: Option<PathBuf>,
    pub window_secs: u64,
    pub poll_interval_secs: u64,
    pub classifier: ClassifierKind,
    pub classifier_url: Option<String>,
    pub classifier_token: Option<String>,
    pub classify_concurrency: usize,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub connect_max_retries: u32,
    pub connect_backoff_base_ms: u64,
    pub output_dir: PathBuf,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("source_url", &self.source_url)
            .field("source_file", &self.source_file)
            .field("window_secs", &self.window_secs)
            .field("poll_interval_secs", &self.poll_interval_secs)
            .field("classifier", &self.classifier)
            .field("classifier_url", &self.classifier_url)
            .field(
                "classifier_token",
                &self.classifier_token.as_ref().map(|_| "[redacted]"),
            )
            .field("classify_concurrency", &self.classify_concurrency)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("connect_max_retries", &self.connect_max_retries)
            .field("connect_backoff_base_ms", &self.connect_backoff_base_ms)
            .field("output_dir", &self.output_dir)
            .finish()
    }
}
