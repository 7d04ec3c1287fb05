use std::time::Duration;

use crate::errors::AppError;
use crate::fetch::{self, FetchPolicy};

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_SERVICE_URL: &str = "https://lindat.mff.cuni.cz/services/udpipe/api";
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;
const DEFAULT_FETCH_MAX_BYTES: usize = 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    /// Base URL of the UDPipe REST API (`{url}/models`, `{url}/process`).
    pub service_url: String,
    /// Model alias catalog used to resolve the `model` parameter.
    pub catalog_url: String,
    /// Upper bound for every fetch made while filling a form.
    pub fetch_timeout: Duration,
    /// `host[:port]` entries that may be fetched although they are not
    /// public; always includes the catalog's own host and port.
    pub fetch_allowed_hosts: Vec<String>,
    /// Largest document read by a fetch.
    pub fetch_max_bytes: usize,
    pub static_dir: String,
}

impl Config {
    /// Read configuration from the process environment (after `.env`).
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let service_url = get("UDPIPE_SERVICE_URL").unwrap_or_else(|| DEFAULT_SERVICE_URL.to_string());
        // The bundled catalog is served from our own static directory.
        let catalog_url = get("UDPIPE_CATALOG_URL")
            .unwrap_or_else(|| format!("http://{bind_addr}/static/models.txt"));

        let fetch_timeout = Duration::from_secs(positive(&get, "FETCH_TIMEOUT_SECS", DEFAULT_FETCH_TIMEOUT_SECS)?);
        let fetch_max_bytes = positive(&get, "FETCH_MAX_BYTES", DEFAULT_FETCH_MAX_BYTES as u64)? as usize;

        let mut fetch_allowed_hosts: Vec<String> = get("FETCH_ALLOWED_HOSTS")
            .unwrap_or_default()
            .split(',')
            .map(|h| h.trim().to_ascii_lowercase())
            .filter(|h| !h.is_empty())
            .collect();
        match fetch::host_entry(&catalog_url) {
            Some(entry) => fetch_allowed_hosts.push(entry),
            None => {
                return Err(AppError::Config(format!(
                    "UDPIPE_CATALOG_URL is not an absolute URL: {catalog_url:?}"
                )));
            }
        }

        let static_dir = get("STATIC_DIR").unwrap_or_else(|| "./static".to_string());

        Ok(Self {
            bind_addr,
            service_url,
            catalog_url,
            fetch_timeout,
            fetch_allowed_hosts,
            fetch_max_bytes,
            static_dir,
        })
    }

    pub fn fetch_policy(&self) -> FetchPolicy {
        FetchPolicy {
            allowed_hosts: self.fetch_allowed_hosts.clone(),
            max_bytes: self.fetch_max_bytes,
        }
    }
}

fn positive(get: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> Result<u64, AppError> {
    match get(key) {
        Some(raw) => match raw.trim().parse::<u64>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(AppError::Config(format!("{key} must be a positive integer, got {raw:?}"))),
        },
        None => Ok(default),
    }
}
