use std::collections::HashMap;

use serde::Deserialize;

use crate::error::Error;
use crate::sendgrid::api;

pub const DEFAULT_PATH: &str = "/etc/gridmail/gridmail.toml";
const ENV_PREFIX: &str = "GRIDMAIL";

/// Resolved gridmail configuration.
///
/// One flat surface for the account credentials, the API location, the
/// template-id table, and the confirmation-link base URL. Loaded once at
/// startup; the core never re-reads it.
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub api_user: String,
    pub api_key: String,

    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Logical template name -> provider template id.
    #[serde(default)]
    pub templates: HashMap<String, String>,

    /// Base URL the confirmation token is appended to. Absent means no
    /// confirmation links are generated.
    #[serde(default)]
    pub confirmation_url: Option<String>,
}

fn default_api_url() -> String {
    api::SENDGRID_BASE_URL.to_string()
}

fn default_endpoint() -> String {
    api::ENDPOINT_JSON.to_string()
}

impl Config {
    /// Template id for a logical template name, if one is configured.
    pub fn template_id(&self, name: &str) -> Option<&str> {
        self.templates.get(name).map(|s| s.as_str())
    }
}

/// Loads gridmail config from the filesystem and merges it with any
/// environment variables prefixed with GRIDMAIL_.
///
/// The default config file is optional (environment-only setups are fine);
/// an explicitly given path must exist.
pub fn load_config(path: Option<&str>) -> Result<Config, Error> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name(path.unwrap_or(DEFAULT_PATH)).required(path.is_some()))
        .add_source(config::Environment::with_prefix(ENV_PREFIX))
        .build()?;

    settings.try_deserialize::<Config>().map_err(|e| e.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;

    #[test]
    fn load_from_file() {
        let path = std::env::temp_dir().join("gridmail-config-test.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r#"
api_user = "acct"
api_key = "secret"
confirmation_url = "https://example.org/confirm?t="

[templates]
welcome = "tmpl-123"
"#
        )
        .unwrap();

        let config = load_config(path.to_str()).unwrap();

        assert_eq!(config.api_user, "acct");
        assert_eq!(config.api_key, "secret");
        assert_eq!(config.api_url, "https://api.sendgrid.com");
        assert_eq!(config.endpoint, "/api/mail.send.json");
        assert_eq!(config.template_id("welcome"), Some("tmpl-123"));
        assert_eq!(config.template_id("unknown"), None);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        let result = load_config(Some("/no/such/gridmail.toml"));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
