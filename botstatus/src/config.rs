//! Configuration management via environment variables
//!
//! Provides helper functions for reading environment variables with fallback
//! to the legacy variable names used by earlier deployments, plus loading of
//! `.env` and `config.json` (each optionally downloaded from a URL first).

use crate::error::{MonitorError, MonitorResult};
use botstatus_common::config::MonitorConfig;
use botstatus_common::error::CommonError;
use std::path::Path;
use std::time::Duration;
use tracing::{error, info};

/// Default gateway URL
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8081";

/// Default configuration file path
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Default environment file path
pub const DEFAULT_ENV_PATH: &str = ".env";

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Get an environment variable with fallback to a deprecated name
///
/// If the new variable name is set, returns its value.
/// If only the old (deprecated) variable name is set, returns its value
/// and logs a deprecation warning.
///
/// # Example
/// ```
/// use botstatus::config::get_env_with_fallback;
///
/// let zone = get_env_with_fallback("BOTSTATUS_TIME_ZONE", "TIME_ZONE");
/// ```
pub fn get_env_with_fallback(new_name: &str, old_name: &str) -> Option<String> {
    if let Ok(val) = std::env::var(new_name) {
        return Some(val);
    }
    if let Ok(val) = std::env::var(old_name) {
        tracing::warn!(
            "Environment variable '{}' is deprecated, use '{}' instead",
            old_name,
            new_name
        );
        return Some(val);
    }
    None
}

/// Get an environment variable with fallback and default value
pub fn get_env_with_fallback_or(new_name: &str, old_name: &str, default: &str) -> String {
    get_env_with_fallback(new_name, old_name).unwrap_or_else(|| default.to_string())
}

/// Get an environment variable with fallback, parsing to a specific type
///
/// Returns `default` if neither is set or parsing fails.
pub fn get_env_with_fallback_parse<T: std::str::FromStr>(
    new_name: &str,
    old_name: &str,
    default: T,
) -> T {
    get_env_with_fallback(new_name, old_name)
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Gateway connection settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformConfig {
    /// Gateway base URL
    pub api_url: String,
    /// Session credential
    pub session: String,
}

impl PlatformConfig {
    /// Load gateway settings from the environment.
    ///
    /// The session is mandatory; its absence is a startup error.
    pub fn from_env() -> MonitorResult<Self> {
        let api_url = get_env_with_fallback_or("BOTSTATUS_API_URL", "API_URL", DEFAULT_API_URL);
        let session = get_env_with_fallback("BOTSTATUS_SESSION", "PYRO_SESSION")
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                MonitorError::Common(CommonError::Config(
                    "BOTSTATUS_SESSION is not set".to_string(),
                ))
            })?;
        Ok(Self { api_url, session })
    }
}

/// Apply environment overrides on top of the file settings.
///
/// `BOTSTATUS_HEADER_MSG` (legacy `HEADER_MSG`), `BOTSTATUS_TIME_ZONE`
/// (legacy `TIME_ZONE`) and `BOTSTATUS_CHECK_INTERVAL` (legacy
/// `CHECK_INTERVAL`, seconds) win over `settings` in `config.json`.
/// An interval that does not parse keeps the file value.
pub fn apply_env_overrides(config: &mut MonitorConfig) {
    if let Some(header) = get_env_with_fallback("BOTSTATUS_HEADER_MSG", "HEADER_MSG") {
        config.settings.header = header;
    }
    if let Some(zone) = get_env_with_fallback("BOTSTATUS_TIME_ZONE", "TIME_ZONE") {
        config.settings.time_zone = zone;
    }
    config.settings.check_interval_secs = get_env_with_fallback_parse(
        "BOTSTATUS_CHECK_INTERVAL",
        "CHECK_INTERVAL",
        config.settings.check_interval_secs,
    );
}

/// Download `config.json` from `url` into `dest`.
pub async fn download_config(url: &str, dest: &Path, timeout: Duration) -> MonitorResult<()> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| MonitorError::Download(e.to_string()))?;

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| MonitorError::Download(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(MonitorError::Download(format!("HTTP {}", status)));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| MonitorError::Download(e.to_string()))?;
    tokio::fs::write(dest, &bytes)
        .await
        .map_err(|e| MonitorError::Download(e.to_string()))?;
    Ok(())
}

/// Load `.env` into the process environment.
///
/// If `BOTSTATUS_ENV_URL` (legacy `CONFIG_ENV_URL`) is set the file is
/// refreshed from it first; a failed download is logged and the local copy is
/// used. Values in the file override variables that are already set.
/// Returns `false` when there is no file to load.
pub async fn load_env_file(path: &Path) -> MonitorResult<bool> {
    if let Some(url) = get_env_with_fallback("BOTSTATUS_ENV_URL", "CONFIG_ENV_URL") {
        match download_config(&url, path, DOWNLOAD_TIMEOUT).await {
            Ok(()) => info!(path = %path.display(), "Downloaded .env from BOTSTATUS_ENV_URL"),
            Err(e) => error!(error = %e, "Failed to download .env"),
        }
    }

    if !path.exists() {
        return Ok(false);
    }

    dotenvy::from_path_override(path).map_err(|e| {
        CommonError::Config(format!("Failed to load {}: {}", path.display(), e))
    })?;
    info!(path = %path.display(), "Loaded environment file");
    Ok(true)
}

/// Resolve the monitor configuration.
///
/// If `BOTSTATUS_CONFIG_URL` (legacy `CONFIG_JSON_URL`) is set the file is
/// refreshed from it first; a failed download is logged and the local copy is
/// used. Environment overrides are applied and the result is validated, so a
/// configuration without destinations never reaches a cycle.
pub async fn load_monitor_config(path: &Path) -> MonitorResult<MonitorConfig> {
    if let Some(url) = get_env_with_fallback("BOTSTATUS_CONFIG_URL", "CONFIG_JSON_URL") {
        match download_config(&url, path, DOWNLOAD_TIMEOUT).await {
            Ok(()) => info!(path = %path.display(), "Downloaded config.json from BOTSTATUS_CONFIG_URL"),
            Err(e) => error!(error = %e, "Failed to download config.json"),
        }
    }

    let mut config = MonitorConfig::from_path(path)?;
    apply_env_overrides(&mut config);
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    const VALID: &str = r#"{
        "bots": {"a": {"bot_uname": "@a_bot"}},
        "channels": {"main": {"chat_id": -100, "message_id": 1}}
    }"#;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn clear_env() {
        for name in [
            "BOTSTATUS_HEADER_MSG",
            "HEADER_MSG",
            "BOTSTATUS_TIME_ZONE",
            "TIME_ZONE",
            "BOTSTATUS_CONFIG_URL",
            "CONFIG_JSON_URL",
            "BOTSTATUS_SESSION",
            "PYRO_SESSION",
            "BOTSTATUS_API_URL",
            "API_URL",
            "BOTSTATUS_CHECK_INTERVAL",
            "CHECK_INTERVAL",
            "BOTSTATUS_ENV_URL",
            "CONFIG_ENV_URL",
        ] {
            std::env::remove_var(name);
        }
    }

    #[test]
    #[serial]
    fn test_get_env_with_fallback_new_name() {
        std::env::set_var("TEST_BS_NEW_VAR", "new_value");
        std::env::remove_var("TEST_BS_OLD_VAR");

        let result = get_env_with_fallback("TEST_BS_NEW_VAR", "TEST_BS_OLD_VAR");
        assert_eq!(result, Some("new_value".to_string()));

        std::env::remove_var("TEST_BS_NEW_VAR");
    }

    #[test]
    #[serial]
    fn test_get_env_with_fallback_old_name() {
        std::env::remove_var("TEST_BS_NEW_VAR2");
        std::env::set_var("TEST_BS_OLD_VAR2", "old_value");

        let result = get_env_with_fallback("TEST_BS_NEW_VAR2", "TEST_BS_OLD_VAR2");
        assert_eq!(result, Some("old_value".to_string()));

        std::env::remove_var("TEST_BS_OLD_VAR2");
    }

    #[test]
    #[serial]
    fn test_get_env_with_fallback_new_takes_precedence() {
        std::env::set_var("TEST_BS_NEW_VAR3", "new_value");
        std::env::set_var("TEST_BS_OLD_VAR3", "old_value");

        let result = get_env_with_fallback("TEST_BS_NEW_VAR3", "TEST_BS_OLD_VAR3");
        assert_eq!(result, Some("new_value".to_string()));

        std::env::remove_var("TEST_BS_NEW_VAR3");
        std::env::remove_var("TEST_BS_OLD_VAR3");
    }

    #[test]
    #[serial]
    fn test_get_env_with_fallback_parse_default() {
        std::env::set_var("TEST_BS_NEW_VAR4", "not-a-number");
        let result: u64 = get_env_with_fallback_parse("TEST_BS_NEW_VAR4", "TEST_BS_OLD_VAR4", 300);
        assert_eq!(result, 300);
        std::env::remove_var("TEST_BS_NEW_VAR4");
    }

    #[test]
    #[serial]
    fn test_platform_config_requires_session() {
        clear_env();
        let err = PlatformConfig::from_env().unwrap_err();
        assert!(err.to_string().contains("BOTSTATUS_SESSION"));
    }

    #[test]
    #[serial]
    fn test_platform_config_legacy_session() {
        clear_env();
        std::env::set_var("PYRO_SESSION", "legacy-session");

        let config = PlatformConfig::from_env().unwrap();
        assert_eq!(config.session, "legacy-session");
        assert_eq!(config.api_url, DEFAULT_API_URL);

        clear_env();
    }

    #[tokio::test]
    #[serial]
    async fn test_load_monitor_config_applies_overrides() {
        clear_env();
        std::env::set_var("HEADER_MSG", "<b>Fleet</b>");
        std::env::set_var("BOTSTATUS_TIME_ZONE", "Europe/Berlin");
        let file = write_config(VALID);

        let config = load_monitor_config(file.path()).await.unwrap();
        assert_eq!(config.settings.header, "<b>Fleet</b>");
        assert_eq!(config.settings.time_zone, "Europe/Berlin");

        clear_env();
    }

    #[tokio::test]
    #[serial]
    async fn test_check_interval_from_legacy_env() {
        clear_env();
        std::env::set_var("CHECK_INTERVAL", "120");
        let file = write_config(VALID);

        let config = load_monitor_config(file.path()).await.unwrap();
        assert_eq!(config.settings.check_interval_secs, 120);

        std::env::set_var("BOTSTATUS_CHECK_INTERVAL", "five minutes");
        let config = load_monitor_config(file.path()).await.unwrap();
        assert_eq!(config.settings.check_interval_secs, 300);

        clear_env();
    }

    #[tokio::test]
    #[serial]
    async fn test_check_interval_zero_is_rejected() {
        clear_env();
        std::env::set_var("BOTSTATUS_CHECK_INTERVAL", "0");
        let file = write_config(VALID);

        let err = load_monitor_config(file.path()).await.unwrap_err();
        assert!(err.to_string().contains("check_interval_secs"));

        clear_env();
    }

    #[tokio::test]
    #[serial]
    async fn test_load_env_file_overrides_session() {
        clear_env();
        std::env::set_var("BOTSTATUS_SESSION", "stale-session");
        let file = write_config("BOTSTATUS_SESSION=fresh-session\nAPI_URL=http://gateway:9000\n");

        assert!(load_env_file(file.path()).await.unwrap());
        let platform = PlatformConfig::from_env().unwrap();
        assert_eq!(platform.session, "fresh-session");
        assert_eq!(platform.api_url, "http://gateway:9000");

        clear_env();
    }

    #[tokio::test]
    #[serial]
    async fn test_load_env_file_missing_is_not_an_error() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();

        let loaded = load_env_file(&dir.path().join(".env")).await.unwrap();
        assert!(!loaded);
    }

    #[tokio::test]
    #[serial]
    async fn test_load_env_file_downloads_from_url() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        clear_env();
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/fleet.env"))
            .respond_with(ResponseTemplate::new(200).set_body_string("PYRO_SESSION=remote-session\n"))
            .expect(1)
            .mount(&server)
            .await;
        std::env::set_var("CONFIG_ENV_URL", format!("{}/fleet.env", server.uri()));
        let dir = tempfile::tempdir().unwrap();
        let env_path = dir.path().join(".env");

        assert!(load_env_file(&env_path).await.unwrap());
        assert_eq!(std::env::var("PYRO_SESSION").unwrap(), "remote-session");
        assert!(env_path.exists());

        clear_env();
    }

    #[tokio::test]
    #[serial]
    async fn test_load_env_file_keeps_local_copy_when_download_fails() {
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        clear_env();
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        std::env::set_var("BOTSTATUS_ENV_URL", server.uri());
        let file = write_config("BOTSTATUS_SESSION=local-session\n");

        assert!(load_env_file(file.path()).await.unwrap());
        assert_eq!(PlatformConfig::from_env().unwrap().session, "local-session");

        clear_env();
    }

    #[tokio::test]
    #[serial]
    async fn test_load_monitor_config_rejects_missing_destinations() {
        clear_env();
        let file = write_config(r#"{"bots": {"a": {"bot_uname": "@a_bot"}}, "channels": {}}"#);

        let err = load_monitor_config(file.path()).await.unwrap_err();
        assert!(err.is_no_destinations());
    }

    #[tokio::test]
    #[serial]
    async fn test_load_monitor_config_rejects_bad_time_zone() {
        clear_env();
        std::env::set_var("TIME_ZONE", "Nowhere/Special");
        let file = write_config(VALID);

        let err = load_monitor_config(file.path()).await.unwrap_err();
        assert!(err.to_string().contains("Nowhere/Special"));

        clear_env();
    }
}
