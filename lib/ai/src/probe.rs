//! Best-effort network reachability probe.
//!
//! The probe is a heuristic: it can be stale by the time a provider call is
//! made, and both false positives and false negatives are tolerated.

use async_trait::async_trait;
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::{debug, error, warn};

/// Answers whether the network is likely reachable.
#[async_trait]
pub trait Reachability: Send + Sync {
    /// Returns true if any configured endpoint answered.
    async fn is_online(&self) -> bool;
}

/// Endpoints and timeouts used by [`ReachabilityProbe`].
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// `host:port` targets tried with a plain TCP connect.
    pub socket_targets: Vec<String>,
    /// URLs tried with an HTTP GET; only a 200 counts as success.
    pub http_targets: Vec<String>,
    pub socket_timeout: Duration,
    pub http_timeout: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            socket_targets: vec![
                "1.1.1.1:53".to_string(),
                "8.8.8.8:53".to_string(),
                "api.groq.com:443".to_string(),
            ],
            http_targets: vec![
                "https://www.google.com".to_string(),
                "https://www.cloudflare.com".to_string(),
            ],
            socket_timeout: Duration::from_millis(1500),
            http_timeout: Duration::from_secs(2),
        }
    }
}

/// Probe trying TCP connects first, then HTTP requests.
#[derive(Debug, Clone)]
pub struct ReachabilityProbe {
    config: ProbeConfig,
    http: reqwest::Client,
}

impl ReachabilityProbe {
    #[must_use]
    pub fn new(config: ProbeConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    async fn try_socket(&self, target: &str) -> bool {
        match tokio::time::timeout(self.config.socket_timeout, TcpStream::connect(target)).await {
            Ok(Ok(_)) => {
                debug!(target, "socket probe succeeded");
                true
            }
            Ok(Err(e)) => {
                warn!(target, error = %e, "socket probe failed");
                false
            }
            Err(_) => {
                warn!(target, timeout = ?self.config.socket_timeout, "socket probe timed out");
                false
            }
        }
    }

    async fn try_http(&self, url: &str) -> bool {
        match self
            .http
            .get(url)
            .timeout(self.config.http_timeout)
            .send()
            .await
        {
            Ok(response) if response.status() == reqwest::StatusCode::OK => {
                debug!(url, "http probe succeeded");
                true
            }
            Ok(response) => {
                warn!(url, status = %response.status(), "http probe returned non-200");
                false
            }
            Err(e) => {
                warn!(url, error = %e, "http probe failed");
                false
            }
        }
    }
}

impl Default for ReachabilityProbe {
    fn default() -> Self {
        Self::new(ProbeConfig::default())
    }
}

#[async_trait]
impl Reachability for ReachabilityProbe {
    async fn is_online(&self) -> bool {
        for target in &self.config.socket_targets {
            if self.try_socket(target).await {
                return true;
            }
        }
        for url in &self.config.http_targets {
            if self.try_http(url).await {
                return true;
            }
        }
        error!("all connectivity checks failed, assuming offline");
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    fn config(socket_targets: Vec<String>) -> ProbeConfig {
        ProbeConfig {
            socket_targets,
            http_targets: Vec::new(),
            socket_timeout: Duration::from_millis(500),
            http_timeout: Duration::from_millis(500),
        }
    }

    #[test]
    fn default_targets_cover_dns_and_provider() {
        let config = ProbeConfig::default();
        assert!(config.socket_targets.iter().any(|t| t == "1.1.1.1:53"));
        assert!(config.socket_targets.iter().any(|t| t.starts_with("api.groq.com")));
        assert_eq!(config.socket_timeout, Duration::from_millis(1500));
    }

    #[tokio::test]
    async fn online_when_a_socket_accepts() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");

        let probe = ReachabilityProbe::new(config(vec![addr.to_string()]));
        assert!(probe.is_online().await);
    }

    #[tokio::test]
    async fn offline_when_every_target_fails() {
        // Bind then drop to get a port nothing listens on.
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
            listener.local_addr().expect("addr")
        };

        let probe = ReachabilityProbe::new(config(vec![addr.to_string()]));
        assert!(!probe.is_online().await);
    }

    #[tokio::test]
    async fn offline_with_no_targets() {
        let probe = ReachabilityProbe::new(config(Vec::new()));
        assert!(!probe.is_online().await);
    }

    #[tokio::test]
    async fn later_target_can_succeed() {
        let dead = {
            let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
            listener.local_addr().expect("addr")
        };
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let live = listener.local_addr().expect("addr");

        let probe = ReachabilityProbe::new(config(vec![dead.to_string(), live.to_string()]));
        assert!(probe.is_online().await);
    }
}
