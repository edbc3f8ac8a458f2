use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use dotenv::dotenv;
use std::{env, fmt, str::FromStr};
use url::Url;

use crate::validation::is_valid_email;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum AppEnvironment {
    Development,
    Production,
    Testing,
}

impl FromStr for AppEnvironment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" => Ok(AppEnvironment::Development),
            "production" => Ok(AppEnvironment::Production),
            "testing" => Ok(AppEnvironment::Testing),
            _ => Err(ConfigError::Message(format!("Invalid environment: {}", s))),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MailProvider {
    #[serde(alias = "gmail")]
    Smtp,
    SendGrid,
    Mailgun,
}

impl FromStr for MailProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "smtp" | "gmail" => Ok(MailProvider::Smtp),
            "sendgrid" => Ok(MailProvider::SendGrid),
            "mailgun" => Ok(MailProvider::Mailgun),
            _ => Err(ConfigError::Message(format!("Invalid mail provider: {}", s))),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(try_from = "String")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(ConfigError::Message(format!("Invalid log format: {}", s))),
        }
    }
}

impl TryFrom<String> for LogFormat {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Deserialize, Clone)]
#[serde(rename_all = "snake_case")]
pub struct AppConfig {
    #[serde(default = "default_env")]
    pub env: AppEnvironment,

    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,

    #[serde(default = "default_cors_origins")]
    pub cors_allowed_origins: Vec<String>,

    #[serde(default = "default_true")]
    pub trust_proxy_headers: bool,

    #[serde(default = "default_rate_limit_max_requests")]
    pub rate_limit_max_requests: u32,

    #[serde(default = "default_rate_limit_window_secs")]
    pub rate_limit_window_secs: u64,

    #[serde(default)]
    pub rate_limit_skip_failed_requests: bool,

    #[serde(default = "default_rate_limit_idle_ttl_secs")]
    pub rate_limit_idle_ttl_secs: u64,

    #[serde(default = "default_mail_provider")]
    pub mail_provider: MailProvider,

    #[serde(default)]
    pub mail_from: String,

    #[serde(default)]
    pub mail_to: String,

    #[serde(default = "default_subject_prefix")]
    pub mail_subject_prefix: String,

    #[serde(default = "default_mail_timeout_secs")]
    pub mail_timeout_secs: u64,

    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,

    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    #[serde(default)]
    pub smtp_username: String,

    #[serde(default)]
    pub smtp_password: String,

    #[serde(default)]
    pub sendgrid_api_key: String,

    #[serde(default = "default_sendgrid_api_base")]
    pub sendgrid_api_base: String,

    #[serde(default)]
    pub mailgun_api_key: String,

    #[serde(default)]
    pub mailgun_domain: String,

    #[serde(default = "default_mailgun_api_base")]
    pub mailgun_api_base: String,
}

fn default_env() -> AppEnvironment {
    AppEnvironment::Development
}
fn default_name() -> String {
    "Contact-Relay".to_string()
}
fn default_port() -> u16 {
    10000
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_worker_count() -> usize {
    num_cpus::get()
}
fn default_log_format() -> LogFormat {
    LogFormat::Pretty
}
fn default_cors_origins() -> Vec<String> {
    vec![
        "https://my-frontend-app-ecru.vercel.app".to_string(),
        "http://localhost:3000".to_string(),
        "http://localhost:5173".to_string(),
    ]
}
fn default_true() -> bool {
    true
}
fn default_rate_limit_max_requests() -> u32 {
    5
}
fn default_rate_limit_window_secs() -> u64 {
    60
}
fn default_rate_limit_idle_ttl_secs() -> u64 {
    600
}
fn default_mail_provider() -> MailProvider {
    MailProvider::Smtp
}
fn default_subject_prefix() -> String {
    "Contact Form: ".to_string()
}
fn default_mail_timeout_secs() -> u64 {
    10
}
fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}
fn default_smtp_port() -> u16 {
    587
}
fn default_sendgrid_api_base() -> String {
    "https://api.sendgrid.com/v3".to_string()
}
fn default_mailgun_api_base() -> String {
    "https://api.mailgun.net".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            env: default_env(),
            name: default_name(),
            port: default_port(),
            host: default_host(),
            worker_count: default_worker_count(),
            log_format: default_log_format(),
            cors_allowed_origins: default_cors_origins(),
            trust_proxy_headers: default_true(),
            rate_limit_max_requests: default_rate_limit_max_requests(),
            rate_limit_window_secs: default_rate_limit_window_secs(),
            rate_limit_skip_failed_requests: false,
            rate_limit_idle_ttl_secs: default_rate_limit_idle_ttl_secs(),
            mail_provider: default_mail_provider(),
            mail_from: String::new(),
            mail_to: String::new(),
            mail_subject_prefix: default_subject_prefix(),
            mail_timeout_secs: default_mail_timeout_secs(),
            smtp_host: default_smtp_host(),
            smtp_port: default_smtp_port(),
            smtp_username: String::new(),
            smtp_password: String::new(),
            sendgrid_api_key: String::new(),
            sendgrid_api_base: default_sendgrid_api_base(),
            mailgun_api_key: String::new(),
            mailgun_domain: String::new(),
            mailgun_api_base: default_mailgun_api_base(),
        }
    }
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        dotenv().ok();

        let raw_env = env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let env_name = AppEnvironment::from_str(&raw_env)
            .map_err(|_| ConfigError::Message(format!("Invalid APP_ENV value: {}", raw_env)))?;

        let builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env_name)).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("cors_allowed_origins")
                    .try_parsing(true)
                    .ignore_empty(true),
            );

        let mut config: Self = builder.build()?.try_deserialize()?;

        config.env = env_name;

        // Conventional provider variables fill whatever the APP_ layer left blank.
        config.mail_to = fill_from_env(config.mail_to, &["TO_EMAIL", "EMAIL_TO"]);
        config.mail_from = fill_from_env(config.mail_from, &["FROM_EMAIL", "EMAIL_FROM"]);
        config.smtp_username = fill_from_env(config.smtp_username, &["SMTP_USER", "EMAIL_USER"]);
        config.smtp_password = fill_from_env(config.smtp_password, &["SMTP_PASS", "EMAIL_PASS"]);
        config.sendgrid_api_key = fill_from_env(config.sendgrid_api_key, &["SENDGRID_API_KEY"]);
        config.mailgun_api_key = fill_from_env(config.mailgun_api_key, &["MAILGUN_API_KEY"]);
        config.mailgun_domain = fill_from_env(config.mailgun_domain, &["MAILGUN_DOMAIN"]);

        if env::var("APP_PORT").is_err() {
            if let Ok(port) = env::var("PORT") {
                config.port = port
                    .parse()
                    .map_err(|_| ConfigError::Message(format!("Invalid PORT value: {}", port)))?;
            }
        }

        if env::var("APP_MAIL_PROVIDER").is_err() {
            if let Ok(provider) = env::var("MAIL_PROVIDER") {
                config.mail_provider = MailProvider::from_str(&provider)?;
            }
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        if self.mail_to.trim().is_empty() {
            errors.push("MAIL_TO (or TO_EMAIL) must be set".into());
        } else if !is_valid_email(&self.mail_to) {
            errors.push("MAIL_TO is not a valid email address".into());
        }
        if !self.mail_from.trim().is_empty() && !is_valid_email(&self.mail_from) {
            errors.push("MAIL_FROM is not a valid email address".into());
        }

        match self.mail_provider {
            MailProvider::Smtp => {
                if self.smtp_host.trim().is_empty() {
                    errors.push("SMTP_HOST cannot be empty".into());
                }
                if self.smtp_username.trim().is_empty() || self.smtp_password.is_empty() {
                    errors.push("SMTP credentials (SMTP_USERNAME, SMTP_PASSWORD) must be set".into());
                }
            }
            MailProvider::SendGrid => {
                if self.sendgrid_api_key.trim().is_empty() {
                    errors.push("SENDGRID_API_KEY must be set".into());
                }
            }
            MailProvider::Mailgun => {
                if self.mailgun_api_key.trim().is_empty() {
                    errors.push("MAILGUN_API_KEY must be set".into());
                }
                if self.mailgun_domain.trim().is_empty() {
                    errors.push("MAILGUN_DOMAIN must be set".into());
                }
            }
        }

        for origin in self.cors_origins() {
            if !is_exact_origin(&origin) {
                errors.push(format!("Invalid CORS origin: {}", origin));
            }
        }

        if self.rate_limit_max_requests == 0 {
            errors.push("RATE_LIMIT_MAX_REQUESTS must be greater than zero".into());
        }
        if self.rate_limit_window_secs == 0 {
            errors.push("RATE_LIMIT_WINDOW_SECS must be greater than zero".into());
        }
        if self.mail_timeout_secs == 0 {
            errors.push("MAIL_TIMEOUT_SECS must be greater than zero".into());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Message(errors.join(", ")))
        }
    }

    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_allowed_origins
            .iter()
            .flat_map(|origin| origin.split(','))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Providers only accept verified senders, so the recipient doubles as the
    /// sender when none is configured.
    pub fn sender_address(&self) -> &str {
        let from = self.mail_from.trim();
        if from.is_empty() {
            self.mail_to.trim()
        } else {
            from
        }
    }
}

/// An origin as browsers send it: `scheme://host[:port]`, nothing more.
fn is_exact_origin(origin: &str) -> bool {
    match Url::parse(origin) {
        Ok(url) => {
            matches!(url.scheme(), "http" | "https")
                && !origin.contains('*')
                && url.origin().ascii_serialization() == origin
        }
        Err(_) => false,
    }
}

fn fill_from_env(current: String, env_keys: &[&str]) -> String {
    if !current.trim().is_empty() {
        return current;
    }
    env_keys
        .iter()
        .find_map(|key| env::var(key).ok().filter(|v| !v.trim().is_empty()))
        .unwrap_or(current)
}

impl fmt::Display for AppEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AppEnvironment::Development => "development",
            AppEnvironment::Production => "production",
            AppEnvironment::Testing => "testing",
        };
        write!(f, "{s}")
    }
}

impl fmt::Display for MailProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MailProvider::Smtp => "smtp",
            MailProvider::SendGrid => "sendgrid",
            MailProvider::Mailgun => "mailgun",
        };
        write!(f, "{s}")
    }
}

trait Redact {
    fn redact(&self) -> &str;
}

impl Redact for str {
    fn redact(&self) -> &str {
        if self.trim().is_empty() {
            "[MISSING]"
        } else {
            "[REDACTED]"
        }
    }
}

impl Redact for String {
    fn redact(&self) -> &str {
        self.as_str().redact()
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("name", &self.name)
            .field("port", &self.port)
            .field("host", &self.host)
            .field("worker_count", &self.worker_count)
            .field("log_format", &self.log_format)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("trust_proxy_headers", &self.trust_proxy_headers)
            .field("rate_limit_max_requests", &self.rate_limit_max_requests)
            .field("rate_limit_window_secs", &self.rate_limit_window_secs)
            .field("rate_limit_skip_failed_requests", &self.rate_limit_skip_failed_requests)
            .field("rate_limit_idle_ttl_secs", &self.rate_limit_idle_ttl_secs)
            .field("mail_provider", &self.mail_provider)
            .field("mail_from", &self.sender_address())
            .field("mail_to", &self.mail_to)
            .field("mail_timeout_secs", &self.mail_timeout_secs)
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &self.smtp_password.redact())
            .field("sendgrid_api_key", &self.sendgrid_api_key.redact())
            .field("mailgun_api_key", &self.mailgun_api_key.redact())
            .field("mailgun_domain", &self.mailgun_domain)
            .finish()
    }
}
