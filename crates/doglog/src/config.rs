// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Settings read from `~/.doglog.toml`, with environment overrides.
//!
//! ```toml
//! [server]
//! api-key = "..."
//! application-key = "..."
//! site = "datadoghq.eu"
//!
//! [options]
//! query-join = "and"
//!
//! [fields]
//! level = "severity, lvl"
//!
//! [formats]
//! java = "{{.__timestamp}} {{.__level}} {{.__short_classname}} {{.__message}}"
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use doglog_core::http::{Auth, ClientConfig, DEFAULT_SITE, DEFAULT_TIMEOUT};
use doglog_core::query::QueryJoin;
use doglog_core::ConfigError;
use serde::Deserialize;
use tracing::debug;

pub const DEFAULT_CONFIG_NAME: &str = ".doglog.toml";

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
struct ConfigFile {
    server: ServerSection,
    options: OptionsSection,
    fields: toml::Table,
    formats: toml::Table,
    long_formats: toml::Table,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
struct ServerSection {
    api_key: Option<String>,
    application_key: Option<String>,
    site: Option<String>,
    url: Option<String>,
    timeout_secs: Option<u64>,
    proxy: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
struct OptionsSection {
    query_join: Option<String>,
}

/// Everything doglog needs besides the command line, loaded once at startup.
#[derive(Debug)]
pub struct Config {
    pub api_key: String,
    pub application_key: String,
    pub site: String,
    pub url: Option<String>,
    pub timeout: Duration,
    pub https_proxy: Option<String>,
    pub query_join: QueryJoin,
    /// Field mapping overrides in file order.
    pub fields: Vec<(String, String)>,
    /// Short templates in file order.
    pub formats: Vec<(String, String)>,
    /// Long templates in file order; empty means the short ones are used.
    pub long_formats: Vec<(String, String)>,
}

impl Config {
    /// Loads the configuration file, then applies environment overrides.
    ///
    /// An explicit path must exist. The default file is optional as long as
    /// the credentials come from the environment.
    pub fn load(path: Option<&str>) -> Result<Config, ConfigError> {
        let file = match path {
            Some(path) => {
                let path = expand_tilde(path);
                ConfigFile::read(&path)?
            }
            None => match default_config_path() {
                Some(path) if path.exists() => ConfigFile::read(&path)?,
                _ => {
                    debug!("No configuration file found, using the environment only");
                    ConfigFile::default()
                }
            },
        };
        Config::from_file(file)
    }

    fn from_file(file: ConfigFile) -> Result<Config, ConfigError> {
        let server = file.server;

        let api_key = env_var("DD_API_KEY")
            .or(server.api_key)
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::MissingCredential("api-key"))?;
        let application_key = env_var("DD_APP_KEY")
            .or_else(|| env_var("DD_APPLICATION_KEY"))
            .or(server.application_key)
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::MissingCredential("application-key"))?;
        let site = env_var("DD_SITE")
            .or(server.site.filter(|s| !s.trim().is_empty()))
            .unwrap_or_else(|| DEFAULT_SITE.to_string());
        let https_proxy = env_var("DD_PROXY_HTTPS")
            .or_else(|| env_var("HTTPS_PROXY"))
            .or(server.proxy.filter(|p| !p.trim().is_empty()));
        let timeout = server
            .timeout_secs
            .filter(|secs| *secs > 0)
            .map_or(DEFAULT_TIMEOUT, Duration::from_secs);
        let query_join = match file.options.query_join {
            Some(join) => join.parse()?,
            None => QueryJoin::default(),
        };

        Ok(Config {
            api_key: api_key.trim().to_string(),
            application_key: application_key.trim().to_string(),
            site,
            url: server.url,
            timeout,
            https_proxy,
            query_join,
            fields: string_entries("fields", file.fields)?,
            formats: string_entries("formats", file.formats)?,
            long_formats: string_entries("long-formats", file.long_formats)?,
        })
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            auth: Auth {
                api_key: self.api_key.clone(),
                application_key: self.application_key.clone(),
            },
            site: self.site.clone(),
            url: self.url.clone(),
            timeout: self.timeout,
            https_proxy: self.https_proxy.clone(),
        }
    }
}

impl ConfigFile {
    fn read(path: &Path) -> Result<ConfigFile, ConfigError> {
        debug!("Reading configuration from {}", path.display());
        let text = fs::read_to_string(path).map_err(|e| {
            ConfigError::Invalid(format!(
                "configuration file not found or not readable at {} - {e}",
                path.display()
            ))
        })?;
        toml::from_str(&text).map_err(|e| {
            ConfigError::Invalid(format!(
                "configuration file cannot be parsed at {} - {e}",
                path.display()
            ))
        })
    }
}

/// Reads an environment variable, treating a blank value as unset.
fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn string_entries(section: &str, table: toml::Table) -> Result<Vec<(String, String)>, ConfigError> {
    table
        .into_iter()
        .map(|(name, value)| match value {
            toml::Value::String(text) => Ok((name, text)),
            other => Err(ConfigError::Invalid(format!(
                "[{section}] {name} must be a string, found {}",
                other.type_str()
            ))),
        })
        .collect()
}

/// `~/.doglog.toml`, when the home directory is known.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(DEFAULT_CONFIG_NAME))
}

/// Expands a leading `~` to the home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use doglog_core::http::DatadogLogsClient;
    use serial_test::serial;
    use std::io::Write;

    const ENV_VARS: [&str; 6] = [
        "DD_API_KEY",
        "DD_APP_KEY",
        "DD_APPLICATION_KEY",
        "DD_SITE",
        "DD_PROXY_HTTPS",
        "HTTPS_PROXY",
    ];

    fn clear_env() {
        for var in ENV_VARS {
            env::remove_var(var);
        }
    }

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    const FULL: &str = r#"
[server]
api-key = " file-api "
application-key = "file-app"
site = "datadoghq.eu"
timeout-secs = 10

[options]
query-join = "space"

[fields]
level = "severity, lvl"
__message = "text"

[formats]
zeta = "{{.__level}} {{.__message}}"
alpha = "{{.__message}}"

[long-formats]
full = "{{.__timestamp}} {{.__message}}"
"#;

    #[test]
    #[serial]
    fn test_load_from_file() {
        clear_env();
        let file = write_config(FULL);
        let config = Config::load(file.path().to_str()).unwrap();

        assert_eq!(config.api_key, "file-api");
        assert_eq!(config.application_key, "file-app");
        assert_eq!(config.site, "datadoghq.eu");
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.query_join, QueryJoin::Space);
        assert_eq!(
            config.fields,
            vec![
                ("level".to_string(), "severity, lvl".to_string()),
                ("__message".to_string(), "text".to_string()),
            ]
        );
        // file order, not alphabetical
        let names: Vec<&str> = config.formats.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
        assert_eq!(config.long_formats.len(), 1);
        assert_eq!(
            config.client_config().base_url(),
            "https://api.datadoghq.eu"
        );
    }

    #[test]
    #[serial]
    fn test_env_overrides_file() {
        clear_env();
        env::set_var("DD_API_KEY", "env-api");
        env::set_var("DD_APPLICATION_KEY", "env-app");
        env::set_var("DD_SITE", "us5.datadoghq.com");
        env::set_var("HTTPS_PROXY", "http://proxy:3128");
        let file = write_config(FULL);

        let config = Config::load(file.path().to_str()).unwrap();
        clear_env();

        assert_eq!(config.api_key, "env-api");
        assert_eq!(config.application_key, "env-app");
        assert_eq!(config.site, "us5.datadoghq.com");
        assert_eq!(config.https_proxy.as_deref(), Some("http://proxy:3128"));
    }

    #[test]
    #[serial]
    fn test_blank_env_vars_do_not_hide_other_sources() {
        clear_env();
        env::set_var("DD_API_KEY", "");
        env::set_var("DD_APP_KEY", " ");
        env::set_var("DD_APPLICATION_KEY", "env-app");
        env::set_var("DD_SITE", "");
        env::set_var("DD_PROXY_HTTPS", "");
        env::set_var("HTTPS_PROXY", "");
        let file = write_config(FULL);

        let config = Config::load(file.path().to_str()).unwrap();
        clear_env();

        assert_eq!(config.api_key, "file-api");
        assert_eq!(config.application_key, "env-app");
        assert_eq!(config.site, "datadoghq.eu");
        assert_eq!(config.https_proxy, None);
        assert!(DatadogLogsClient::new(&config.client_config()).is_ok());
    }

    #[test]
    #[serial]
    fn test_blank_proxy_falls_back_to_next_source() {
        clear_env();
        env::set_var("DD_PROXY_HTTPS", "  ");
        env::set_var("HTTPS_PROXY", "http://proxy:3128");
        let file = write_config(FULL);

        let config = Config::load(file.path().to_str()).unwrap();
        clear_env();

        assert_eq!(config.https_proxy.as_deref(), Some("http://proxy:3128"));
    }

    #[test]
    #[serial]
    fn test_missing_credentials() {
        clear_env();
        let file = write_config("[server]\napi-key = \"abc\"\n");
        let err = Config::load(file.path().to_str()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential("application-key")));

        let file = write_config("");
        let err = Config::load(file.path().to_str()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential("api-key")));
    }

    #[test]
    #[serial]
    fn test_defaults_without_sections() {
        clear_env();
        env::set_var("DD_API_KEY", "api");
        env::set_var("DD_APP_KEY", "app");
        let file = write_config("");
        let config = Config::load(file.path().to_str()).unwrap();
        clear_env();

        assert_eq!(config.site, DEFAULT_SITE);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert_eq!(config.query_join, QueryJoin::And);
        assert!(config.formats.is_empty());
        assert!(config.url.is_none());
    }

    #[test]
    #[serial]
    fn test_explicit_missing_file_is_an_error() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");
        let err = Config::load(path.to_str()).unwrap_err();
        assert!(err.to_string().contains("not found or not readable"), "{err}");
    }

    #[test]
    #[serial]
    fn test_invalid_files_are_rejected() {
        clear_env();
        env::set_var("DD_API_KEY", "api");
        env::set_var("DD_APP_KEY", "app");

        let file = write_config("[formats]\nbroken = 3\n");
        let err = Config::load(file.path().to_str()).unwrap_err();
        assert!(err.to_string().contains("[formats] broken must be a string"), "{err}");

        let file = write_config("[options]\nquery-join = \"or\"\n");
        assert!(Config::load(file.path().to_str()).is_err());

        let file = write_config("[serverr]\n");
        assert!(Config::load(file.path().to_str()).is_err());

        let file = write_config("not toml at all [");
        let err = Config::load(file.path().to_str()).unwrap_err();
        assert!(err.to_string().contains("cannot be parsed"), "{err}");
        clear_env();
    }

    #[test]
    #[serial]
    fn test_expand_tilde() {
        let dir = tempfile::tempdir().unwrap();
        let previous = env::var("HOME").ok();
        env::set_var("HOME", dir.path());

        assert_eq!(expand_tilde("~/.doglog.toml"), dir.path().join(".doglog.toml"));
        assert_eq!(expand_tilde("~"), dir.path());
        assert_eq!(expand_tilde("/etc/doglog.toml"), PathBuf::from("/etc/doglog.toml"));
        assert_eq!(default_config_path(), Some(dir.path().join(DEFAULT_CONFIG_NAME)));

        match previous {
            Some(home) => env::set_var("HOME", home),
            None => env::remove_var("HOME"),
        }
    }

    #[test]
    #[serial]
    fn test_default_file_is_optional() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let previous = env::var("HOME").ok();
        env::set_var("HOME", dir.path());
        env::set_var("DD_API_KEY", "api");
        env::set_var("DD_APP_KEY", "app");

        let config = Config::load(None).unwrap();
        assert_eq!(config.api_key, "api");

        fs::write(dir.path().join(DEFAULT_CONFIG_NAME), "[server]\nsite = \"datadoghq.eu\"\n")
            .unwrap();
        let config = Config::load(None).unwrap();
        assert_eq!(config.site, "datadoghq.eu");

        clear_env();
        match previous {
            Some(home) => env::set_var("HOME", home),
            None => env::remove_var("HOME"),
        }
    }
}
