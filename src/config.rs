use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

/// AppConfig
///
/// Holds the application's entire configuration state. This struct is designed to be
/// immutable once loaded, ensuring consistency across all threads and services
/// (Store, Captcha, Sessions, AI proxy). It is pulled into the application state via
/// FromRef, embodying the "immutable AppConfig" part of the Unified State Pattern.
#[derive(Clone)]
pub struct AppConfig {
    // Runtime environment marker. Controls log format and fail-fast secret checks.
    pub env: Env,
    // TCP port the HTTP server binds to.
    pub port: u16,
    // Optional SQLite connection string (e.g. "sqlite://data/swot.db?mode=rwc").
    // When set and reachable, the durable key-value backend is used; otherwise
    // submissions fall back to a local JSON file.
    pub database_url: Option<String>,
    // Directory holding the JSON file backend (submissions.json lives here).
    pub data_path: PathBuf,
    // Secret namespace for the cookie session layer.
    pub session_secret: String,
    // Secret keying the captcha token HMAC. Defaults to the session secret.
    pub captcha_secret: String,
    // Upstream OpenAI credential. None disables the AI analysis proxy (503).
    pub openai_api_key: Option<String>,
    // Chat-completion model forwarded to the upstream API.
    pub openai_model: String,
    // Static admin credential table: username -> plain-text password.
    pub admin_users: HashMap<String, String>,
}

/// Env
///
/// Defines the runtime context, used to switch between development conveniences
/// (pretty logs, default credentials) and hardened production behavior
/// (JSON logs, mandatory secrets).
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// default
    ///
    /// Provides a safe, non-panicking AppConfig instance primarily used for test setup.
    /// This allows us to instantiate the configuration without needing to set environment
    /// variables for lightweight unit or integration testing state scaffolding.
    fn default() -> Self {
        Self {
            env: Env::Local,
            port: 3000,
            database_url: None,
            data_path: PathBuf::from("data"),
            session_secret: "local-dev-session-secret".to_string(),
            captcha_secret: "local-dev-captcha-secret".to_string(),
            openai_api_key: None,
            openai_model: "gpt-4o".to_string(),
            admin_users: HashMap::from([("admin".to_string(), "admin".to_string())]),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// The canonical function for initializing the application configuration at startup.
    /// It reads all parameters from environment variables and implements the **fail-fast**
    /// principle.
    ///
    /// # Panics
    /// Panics if a critical environment variable required for the current runtime
    /// environment (especially Production) is not found. This prevents the application
    /// from starting with an incomplete or insecure configuration.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        // Database backend is opt-in: an empty DATABASE_URL counts as unset.
        let database_url = env::var("DATABASE_URL")
            .ok()
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());

        let data_path = env::var("DATA_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data"));

        // Session Secret Resolution
        // The production secret is mandatory and must be explicitly set.
        let session_secret = match env {
            Env::Production => env::var("SESSION_SECRET")
                .expect("FATAL: SESSION_SECRET must be set in production.")
                .trim()
                .to_string(),
            _ => env::var("SESSION_SECRET")
                .unwrap_or_else(|_| "local-dev-session-secret".to_string())
                .trim()
                .to_string(),
        };

        // The captcha secret falls back to the session secret when not set separately.
        let captcha_secret = env::var("CAPTCHA_SECRET")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| session_secret.clone());

        // The placeholder value shipped in .env templates counts as "not configured".
        let openai_api_key = env::var("OPENAI_API_KEY")
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty() && k != "your_key_here");

        let openai_model = env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o".to_string());

        // Admin Credential Table Resolution
        // ADMIN_USERS is a comma-separated list of `user:pass` pairs.
        let admin_users = match env {
            Env::Production => parse_admin_users(
                &env::var("ADMIN_USERS").expect("FATAL: ADMIN_USERS must be set in production."),
            ),
            _ => env::var("ADMIN_USERS")
                .map(|raw| parse_admin_users(&raw))
                .unwrap_or_else(|_| HashMap::from([("admin".to_string(), "admin".to_string())])),
        };

        Self {
            env,
            port,
            database_url,
            data_path,
            session_secret,
            captcha_secret,
            openai_api_key,
            openai_model,
            admin_users,
        }
    }

    /// submissions_file
    ///
    /// The full path of the JSON file backend under the configured data directory.
    pub fn submissions_file(&self) -> PathBuf {
        self.data_path.join("submissions.json")
    }
}

/// parse_admin_users
///
/// Parses the `user:pass,user2:pass2` credential format. Entries without a colon
/// separator are skipped rather than treated as passwordless accounts.
fn parse_admin_users(raw: &str) -> HashMap<String, String> {
    raw.split(',')
        .filter_map(|entry| {
            let (user, pass) = entry.trim().split_once(':')?;
            if user.is_empty() || pass.is_empty() {
                return None;
            }
            Some((user.to_string(), pass.to_string()))
        })
        .collect()
}
