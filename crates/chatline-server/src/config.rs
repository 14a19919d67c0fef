use std::path::PathBuf;

use anyhow::{Context, bail};

use chatline_core::Tables;
use chatline_db::DEFAULT_PAGE_SIZE;

/// JWT secrets that must never reach production.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreKind {
    Sqlite,
    Memory,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub store: StoreKind,
    pub db_path: PathBuf,
    pub page_size: usize,
    pub jwt_secret: String,
    pub allowed_origin: Option<String>,
    pub tables: Tables,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let jwt_secret = var("CHATLINE_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("CHATLINE_JWT_SECRET is unset or still a placeholder");
        }

        let port: u16 = var("CHATLINE_PORT")
            .unwrap_or_else(|| "3000".into())
            .parse()
            .context("CHATLINE_PORT must be a port number")?;

        let page_size: usize = match var("CHATLINE_PAGE_SIZE") {
            Some(v) => v.parse().context("CHATLINE_PAGE_SIZE must be a positive integer")?,
            None => DEFAULT_PAGE_SIZE,
        };
        if page_size == 0 {
            bail!("CHATLINE_PAGE_SIZE must be a positive integer");
        }

        let store = match var("CHATLINE_STORE").as_deref() {
            None | Some("sqlite") => StoreKind::Sqlite,
            Some("memory") => StoreKind::Memory,
            Some(other) => bail!("CHATLINE_STORE must be 'sqlite' or 'memory', got '{}'", other),
        };

        let mut tables = Tables::default();
        if let Some(name) = var("CHATLINE_CONVERSATIONS_TABLE") {
            tables.conversations = name;
        }
        if let Some(name) = var("CHATLINE_MESSAGES_TABLE") {
            tables.messages = name;
        }

        Ok(Self {
            host: var("CHATLINE_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            store,
            db_path: var("CHATLINE_DB_PATH").unwrap_or_else(|| "chatline.db".into()).into(),
            page_size,
            jwt_secret,
            allowed_origin: var("CHATLINE_ALLOWED_ORIGIN").filter(|o| !o.is_empty()),
            tables,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> anyhow::Result<ServerConfig> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_apply() {
        let config = load(&[("CHATLINE_JWT_SECRET", "s3cret")]).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.store, StoreKind::Sqlite);
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.tables, Tables::default());
        assert!(config.allowed_origin.is_none());
    }

    #[test]
    fn placeholder_secret_is_rejected() {
        assert!(load(&[]).is_err());
        assert!(load(&[("CHATLINE_JWT_SECRET", "dev-secret-change-me")]).is_err());
    }

    #[test]
    fn overrides_and_bad_values() {
        let config = load(&[
            ("CHATLINE_JWT_SECRET", "s3cret"),
            ("CHATLINE_STORE", "memory"),
            ("CHATLINE_PAGE_SIZE", "7"),
            ("CHATLINE_MESSAGES_TABLE", "msgs"),
            ("CHATLINE_ALLOWED_ORIGIN", "http://chat.example"),
        ])
        .unwrap();
        assert_eq!(config.store, StoreKind::Memory);
        assert_eq!(config.page_size, 7);
        assert_eq!(config.tables.messages, "msgs");
        assert_eq!(config.allowed_origin.as_deref(), Some("http://chat.example"));

        assert!(load(&[("CHATLINE_JWT_SECRET", "s"), ("CHATLINE_PORT", "http")]).is_err());
        assert!(load(&[("CHATLINE_JWT_SECRET", "s"), ("CHATLINE_PAGE_SIZE", "0")]).is_err());
        assert!(load(&[("CHATLINE_JWT_SECRET", "s"), ("CHATLINE_STORE", "dynamo")]).is_err());
    }
}
