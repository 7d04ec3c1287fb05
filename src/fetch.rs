//! Plain-text HTTP GET used by the populator for catalog documents and
//! text-area URL values.
//!
//! Text-area URLs come from visitors, so [`HttpFetcher`] only reaches public
//! addresses unless a host is allowed explicitly, and stops reading a body
//! once it passes [`FetchPolicy::max_bytes`].

use std::future::Future;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use regex::Regex;
use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use reqwest::{Client, Url, redirect};

use crate::errors::AppError;

/// Absolute http(s) URL: scheme, host, optional port, path, query, fragment.
static FETCHABLE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^https?://[A-Za-z0-9](?:[A-Za-z0-9.-]*[A-Za-z0-9])?(?::[0-9]{1,5})?(?:/[^\s?#]*)?(?:\?[^\s#]*)?(?:#\S*)?$",
    )
    .expect("static URL pattern is valid")
});

const MAX_REDIRECTS: usize = 5;

/// Whether a text-area value should be replaced by the content it points to.
pub fn is_fetchable_url(value: &str) -> bool {
    FETCHABLE_URL.is_match(value)
}

/// Source of remote plain-text documents.
pub trait Fetcher {
    fn fetch_text(&self, url: &str) -> impl Future<Output = Result<String, AppError>>;
}

/// Run one fetch, treating expiry of `limit` as a fetch failure.
pub async fn fetch_bounded<F: Fetcher>(
    fetcher: &F,
    url: &str,
    limit: Duration,
) -> Result<String, AppError> {
    match tokio::time::timeout(limit, fetcher.fetch_text(url)).await {
        Ok(result) => result,
        Err(_) => Err(AppError::Fetch(format!(
            "{url} did not respond within {}ms",
            limit.as_millis()
        ))),
    }
}

/// Loopback, private, link-local, shared, multicast and unspecified
/// addresses are not public. IPv4-mapped IPv6 addresses are judged as IPv4.
pub fn is_public_address(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            let [a, b, ..] = v4.octets();
            !(a == 0
                || v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_broadcast()
                || v4.is_multicast()
                || (a == 100 && b & 0xc0 == 64))
        }
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => is_public_address(IpAddr::V4(v4)),
            None => {
                !(v6.is_loopback()
                    || v6.is_unspecified()
                    || v6.is_multicast()
                    || v6.is_unique_local()
                    || v6.is_unicast_link_local())
            }
        },
    }
}

/// `host:port` of an absolute URL, the form used in allow lists.
pub fn host_entry(url: &str) -> Option<String> {
    let url = Url::parse(url).ok()?;
    let host = url.host_str()?;
    Some(match url.port_or_known_default() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

/// Which hosts [`HttpFetcher`] may reach and how much it reads.
#[derive(Debug, Clone)]
pub struct FetchPolicy {
    /// `host` or `host:port` entries fetched even when they resolve to a
    /// non-public address. IPv6 hosts are written in brackets.
    pub allowed_hosts: Vec<String>,
    /// Largest response body read, in bytes.
    pub max_bytes: usize,
}

impl FetchPolicy {
    /// Whether any entry names `host`, whatever its port.
    fn lists_host(&self, host: &str) -> bool {
        self.allowed_hosts
            .iter()
            .any(|e| e == host || e.rsplit_once(':').is_some_and(|(h, _)| h == host))
    }

    fn allows(&self, host: &str, port: Option<u16>) -> bool {
        self.allowed_hosts.iter().any(|e| {
            e == host || port.is_some_and(|p| *e == format!("{host}:{p}"))
        })
    }

    /// Check a URL before it is requested or redirected to. Domain names
    /// pass here; their addresses are checked when they are resolved.
    pub fn permits(&self, url: &Url) -> Result<(), String> {
        let host = url.host_str().ok_or_else(|| format!("{url}: no host"))?;
        if self.allows(host, url.port_or_known_default()) {
            return Ok(());
        }
        if self.lists_host(host) {
            return Err(format!("{url}: port not allowed for {host}"));
        }
        let literal = host.trim_start_matches('[').trim_end_matches(']');
        match literal.parse::<IpAddr>() {
            Ok(ip) if !is_public_address(ip) => Err(format!("{url}: {ip} is not a public address")),
            _ => Ok(()),
        }
    }
}

/// Resolves host names to their public addresses only, unless the policy
/// lists the host.
struct PublicResolver {
    policy: Arc<FetchPolicy>,
}

type ResolveError = Box<dyn std::error::Error + Send + Sync>;

async fn resolve_public(policy: Arc<FetchPolicy>, name: Name) -> Result<Addrs, ResolveError> {
    let host = name.as_str();
    let listed = policy.lists_host(host);
    let addrs: Vec<SocketAddr> = tokio::net::lookup_host((host, 0))
        .await?
        .filter(|addr| listed || is_public_address(addr.ip()))
        .collect();
    if addrs.is_empty() {
        return Err(format!("{host} has no public address").into());
    }
    Ok(Box::new(addrs.into_iter()) as Addrs)
}

impl Resolve for PublicResolver {
    fn resolve(&self, name: Name) -> Resolving {
        Box::pin(resolve_public(Arc::clone(&self.policy), name))
    }
}

#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    policy: Arc<FetchPolicy>,
}

impl HttpFetcher {
    /// The client-level timeout backs up [`fetch_bounded`] for callers that
    /// fetch directly.
    pub fn new(timeout: Duration, policy: FetchPolicy) -> Result<Self, AppError> {
        let policy = Arc::new(policy);
        let redirect_policy = Arc::clone(&policy);
        let client = Client::builder()
            .timeout(timeout)
            // a proxy would resolve and connect on our behalf
            .no_proxy()
            .dns_resolver(Arc::new(PublicResolver { policy: Arc::clone(&policy) }))
            .redirect(redirect::Policy::custom(move |attempt| {
                if attempt.previous().len() >= MAX_REDIRECTS {
                    return attempt.error("too many redirects");
                }
                match redirect_policy.permits(attempt.url()) {
                    Ok(()) => attempt.follow(),
                    Err(reason) => attempt.error(reason),
                }
            }))
            .build()
            .map_err(|e| AppError::Config(format!("cannot build HTTP client: {e}")))?;
        Ok(Self { client, policy })
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, AppError> {
        let parsed = Url::parse(url).map_err(|e| AppError::Fetch(format!("{url}: {e}")))?;
        self.policy.permits(&parsed).map_err(AppError::Fetch)?;

        let mut response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| AppError::Fetch(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Fetch(format!("{url}: status {status}")));
        }

        let max = self.policy.max_bytes;
        let too_large = || AppError::Fetch(format!("{url}: body exceeds {max} bytes"));
        if response.content_length().is_some_and(|len| len > max as u64) {
            return Err(too_large());
        }
        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| AppError::Fetch(format!("{url}: {e}")))?
        {
            if body.len() + chunk.len() > max {
                return Err(too_large());
            }
            body.extend_from_slice(&chunk);
        }
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}
