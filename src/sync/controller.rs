use std::sync::Arc;

use anyhow::{bail, Context, Result};
use log::info;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::{loop_worker::sync_loop, ConnectivityOracle, SubmissionQueue};

/// Owns the background task that drains the queue on reconnect.
pub struct SyncController {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl Default for SyncController {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncController {
    pub fn new() -> Self {
        Self {
            handle: None,
            cancel_token: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    pub fn start(
        &mut self,
        queue: SubmissionQueue,
        connectivity: Arc<dyn ConnectivityOracle>,
    ) -> Result<()> {
        if self.handle.is_some() {
            bail!("sync loop already active");
        }

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(sync_loop(
            queue,
            connectivity.subscribe(),
            cancel_token.clone(),
        ));

        info!("Sync loop started");
        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        Ok(())
    }

    /// Cancels the loop and waits for it. A drain already in flight runs to
    /// completion first.
    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("sync loop task failed to join")
                .map(|_| ())
        } else {
            Ok(())
        }
    }
}
