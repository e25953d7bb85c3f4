use std::env;
use std::net::SocketAddr;

use chrono::Duration;

use crate::error::{config_error, Error};

const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_URGENT_WINDOW_HOURS: i64 = 48;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub listen_addr: SocketAddr,
    pub settings: Settings,
    pub mailer: Option<MailerConfig>,
}

/// Knobs the engine reads at runtime.
#[derive(Clone, Debug)]
pub struct Settings {
    pub admin_emails: Vec<String>,
    /// Rides scheduled sooner than this are announced to subscribers.
    pub urgent_window: Duration,
    pub public_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            admin_emails: Vec::new(),
            urgent_window: Duration::hours(DEFAULT_URGENT_WINDOW_HOURS),
            public_url: format!("http://{}", DEFAULT_LISTEN_ADDR),
        }
    }
}

#[derive(Clone, Debug)]
pub struct MailerConfig {
    pub api_base: String,
    pub api_key: String,
    pub from: String,
}

impl Config {
    /// Reads the process environment, after loading `.env` if there is one.
    pub fn from_env() -> Result<Self, Error> {
        dotenv::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let database_max_connections = match var("DATABASE_MAX_CONNECTIONS") {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| config_error("DATABASE_MAX_CONNECTIONS"))?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let listen_addr: SocketAddr = var("LISTEN_ADDR")
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string())
            .trim()
            .parse()
            .map_err(|_| config_error("LISTEN_ADDR"))?;

        let urgent_window_hours = match var("URGENT_WINDOW_HOURS") {
            Some(value) => value
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|hours| *hours >= 0)
                .ok_or_else(|| config_error("URGENT_WINDOW_HOURS"))?,
            None => DEFAULT_URGENT_WINDOW_HOURS,
        };

        let public_url = var("PUBLIC_URL").unwrap_or_else(|| format!("http://{}", listen_addr));

        let mailer = match (
            var("MAILER_API_BASE"),
            var("MAILER_API_KEY"),
            var("MAILER_FROM"),
        ) {
            (Some(api_base), Some(api_key), Some(from)) => Some(MailerConfig {
                api_base,
                api_key,
                from,
            }),
            _ => None,
        };

        Ok(Self {
            database_url: var("DATABASE_URL"),
            database_max_connections,
            listen_addr,
            settings: Settings {
                admin_emails: parse_list(&var("ADMIN_EMAILS").unwrap_or_default()),
                urgent_window: Duration::hours(urgent_window_hours),
                public_url: public_url.trim_end_matches('/').to_string(),
            },
            mailer,
        })
    }
}

/// Splits a comma separated list, dropping blanks.
pub fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|item| item.trim().to_lowercase())
        .filter(|item| !item.is_empty())
        .collect()
}

#[cfg(test)]
fn config(vars: &[(&str, &str)]) -> Result<Config, Error> {
    let vars: std::collections::HashMap<String, String> = vars
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();

    Config::from_lookup(|key| vars.get(key).cloned())
}

#[test]
fn defaults_test() {
    let config = config(&[]).unwrap();

    assert_eq!(config.database_url, None);
    assert_eq!(config.database_max_connections, 5);
    assert_eq!(config.listen_addr.to_string(), "127.0.0.1:3000");
    assert_eq!(config.settings.urgent_window, Duration::hours(48));
    assert!(config.settings.admin_emails.is_empty());
    assert!(config.mailer.is_none());
}

#[test]
fn mailer_needs_every_variable_test() {
    let partial = config(&[
        ("MAILER_API_BASE", "https://api.mail.test"),
        ("MAILER_API_KEY", "secret"),
    ])
    .unwrap();
    assert!(partial.mailer.is_none());

    let full = config(&[
        ("MAILER_API_BASE", "https://api.mail.test"),
        ("MAILER_API_KEY", "secret"),
        ("MAILER_FROM", "noreply@affretement.fr"),
    ])
    .unwrap();
    assert_eq!(full.mailer.unwrap().from, "noreply@affretement.fr");
}

#[test]
fn invalid_values_are_rejected_test() {
    assert_eq!(
        config(&[("URGENT_WINDOW_HOURS", "soon")]).unwrap_err(),
        config_error("URGENT_WINDOW_HOURS")
    );
    assert_eq!(
        config(&[("LISTEN_ADDR", "localhost")]).unwrap_err(),
        config_error("LISTEN_ADDR")
    );
}

#[test]
fn parse_list_test() {
    assert_eq!(
        parse_list(" Ops@Affretement.fr, ,admin@affretement.fr "),
        vec!["ops@affretement.fr", "admin@affretement.fr"]
    );
    assert!(parse_list("").is_empty());
}
