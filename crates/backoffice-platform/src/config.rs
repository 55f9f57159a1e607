use std::path::PathBuf;

use anyhow::{Context, Result};
use backoffice_core::DocumentDefaults;
use tracing::info;

const DEFAULT_PUBLIC_ORIGIN: &str = "http://localhost:8080";
const DEFAULT_EMAIL_API_URL: &str = "https://api.resend.com/emails";
const DEFAULT_EMAIL_FROM: &str = "Back Office <billing@localhost>";

#[derive(Clone, Debug)]
pub struct EmailConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub from: String,
}

#[derive(Clone, Debug)]
pub struct ServiceConfig {
    pub database_url: Option<String>,
    pub redis_url: Option<String>,
    pub http_addr: String,
    pub public_origin: String,
    pub email: EmailConfig,
    pub document_defaults_path: Option<PathBuf>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

impl ServiceConfig {
    pub fn from_env(default_http_addr: &str) -> Result<Self> {
        Self::from_lookup(default_http_addr, |key| std::env::var(key).ok())
    }

    pub fn from_lookup(
        default_http_addr: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let var = |key: &str| non_empty(lookup(key));

        let public_origin = var("PUBLIC_ORIGIN")
            .unwrap_or_else(|| DEFAULT_PUBLIC_ORIGIN.to_string())
            .trim_end_matches('/')
            .to_string();
        if !public_origin.starts_with("http://") && !public_origin.starts_with("https://") {
            anyhow::bail!("PUBLIC_ORIGIN must be an http(s) URL, got {public_origin}");
        }

        Ok(Self {
            database_url: var("DATABASE_URL"),
            redis_url: var("REDIS_URL"),
            http_addr: var("HTTP_ADDR").unwrap_or_else(|| default_http_addr.to_string()),
            public_origin,
            email: EmailConfig {
                api_url: var("EMAIL_API_URL").unwrap_or_else(|| DEFAULT_EMAIL_API_URL.to_string()),
                api_key: var("EMAIL_API_KEY"),
                from: var("EMAIL_FROM").unwrap_or_else(|| DEFAULT_EMAIL_FROM.to_string()),
            },
            document_defaults_path: var("DOCUMENT_DEFAULTS_PATH").map(PathBuf::from),
        })
    }

    pub fn load_document_defaults(&self) -> Result<DocumentDefaults> {
        match &self.document_defaults_path {
            Some(path) => {
                let defaults = DocumentDefaults::load(path)
                    .with_context(|| format!("DOCUMENT_DEFAULTS_PATH={}", path.display()))?;
                info!(path = %path.display(), "loaded document defaults");
                Ok(defaults)
            }
            None => Ok(DocumentDefaults::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<ServiceConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        ServiceConfig::from_lookup("0.0.0.0:8080", |key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_allow_running_without_backends() {
        let config = config(&[]).unwrap();
        assert_eq!(config.database_url, None);
        assert_eq!(config.redis_url, None);
        assert_eq!(config.http_addr, "0.0.0.0:8080");
        assert_eq!(config.public_origin, "http://localhost:8080");
        assert_eq!(config.email.api_url, "https://api.resend.com/emails");
        assert_eq!(config.email.api_key, None);
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config = config(&[
            ("DATABASE_URL", "  "),
            ("PUBLIC_ORIGIN", "https://studio.test/"),
            ("EMAIL_API_KEY", "re_live"),
        ])
        .unwrap();
        assert_eq!(config.database_url, None);
        assert_eq!(config.public_origin, "https://studio.test");
        assert_eq!(config.email.api_key.as_deref(), Some("re_live"));
    }

    #[test]
    fn origin_must_be_http() {
        assert!(config(&[("PUBLIC_ORIGIN", "studio.test")]).is_err());
    }
}
