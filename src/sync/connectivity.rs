use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use tokio::{
    net::TcpStream,
    sync::watch,
    time::{self, Duration, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

/// Network reachability as reported by the platform.
#[async_trait]
pub trait ConnectivityOracle: Send + Sync {
    async fn is_reachable(&self) -> bool;

    /// Receiver that observes every reachability change.
    fn subscribe(&self) -> watch::Receiver<bool>;
}

/// Watch-backed oracle. Platform glue (or the TCP probe below) pushes state in
/// with `set_reachable`; subscribers only wake on actual changes.
pub struct ConnectivityMonitor {
    tx: watch::Sender<bool>,
}

impl ConnectivityMonitor {
    pub fn new(initially_reachable: bool) -> Self {
        let (tx, _) = watch::channel(initially_reachable);
        Self { tx }
    }

    pub fn set_reachable(&self, reachable: bool) {
        let changed = self.tx.send_if_modified(|current| {
            if *current == reachable {
                false
            } else {
                *current = reachable;
                true
            }
        });
        if changed {
            log_info!(
                "connectivity changed: {}",
                if reachable { "reachable" } else { "unreachable" }
            );
        }
    }

    pub fn current(&self) -> bool {
        *self.tx.borrow()
    }
}

#[async_trait]
impl ConnectivityOracle for ConnectivityMonitor {
    async fn is_reachable(&self) -> bool {
        self.current()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

/// `host:port` of the backend, used as the reachability probe target.
pub fn probe_target(base_url: &str) -> Result<String> {
    let url = reqwest::Url::parse(base_url)
        .with_context(|| format!("invalid backend URL '{base_url}'"))?;
    let host = url
        .host_str()
        .ok_or_else(|| anyhow!("backend URL '{base_url}' has no host"))?;
    let port = url
        .port_or_known_default()
        .ok_or_else(|| anyhow!("backend URL '{base_url}' has no port"))?;
    Ok(format!("{host}:{port}"))
}

/// Periodically opens a TCP connection to `target` and feeds the result into
/// `monitor` until cancelled.
pub async fn probe_loop(
    monitor: std::sync::Arc<ConnectivityMonitor>,
    target: String,
    interval: Duration,
    connect_timeout: Duration,
    cancel_token: CancellationToken,
) {
    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let reachable = match time::timeout(connect_timeout, TcpStream::connect(&target)).await {
                    Ok(Ok(_)) => true,
                    Ok(Err(err)) => {
                        if monitor.current() {
                            log_warn!("backend {target} unreachable: {err}");
                        }
                        false
                    }
                    Err(_) => {
                        if monitor.current() {
                            log_warn!("backend {target} probe timed out");
                        }
                        false
                    }
                };
                monitor.set_reachable(reachable);
            }
            _ = cancel_token.cancelled() => {
                log_info!("connectivity probe shutting down");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn probe_target_fills_default_port() {
        assert_eq!(
            probe_target("http://192.168.1.2:5000/api").unwrap(),
            "192.168.1.2:5000"
        );
        assert_eq!(
            probe_target("https://survey.example.org/api").unwrap(),
            "survey.example.org:443"
        );
        assert!(probe_target("not a url").is_err());
    }

    #[tokio::test]
    async fn subscribers_only_see_real_changes() {
        let monitor = ConnectivityMonitor::new(false);
        let mut rx = monitor.subscribe();

        monitor.set_reachable(false);
        assert!(!rx.has_changed().unwrap());

        monitor.set_reachable(true);
        assert!(rx.has_changed().unwrap());
        assert!(*rx.borrow_and_update());
        assert!(monitor.is_reachable().await);
    }

    #[tokio::test]
    async fn probe_marks_listening_backend_reachable() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let target = listener.local_addr().unwrap().to_string();
        let monitor = Arc::new(ConnectivityMonitor::new(false));
        let mut rx = monitor.subscribe();
        let token = CancellationToken::new();

        let handle = tokio::spawn(probe_loop(
            monitor.clone(),
            target,
            Duration::from_millis(50),
            Duration::from_secs(1),
            token.clone(),
        ));

        time::timeout(Duration::from_secs(5), rx.changed())
            .await
            .unwrap()
            .unwrap();
        assert!(monitor.current());

        token.cancel();
        handle.await.unwrap();
    }
}
