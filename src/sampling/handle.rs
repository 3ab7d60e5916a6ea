use std::future::Future;

use anyhow::{Context, Result};
use log::debug;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Owns one background sampling task. `stop` cancels cooperatively and then
/// joins, so once it returns no further tick from that task can observe or
/// mutate anything.
pub struct SamplerHandle {
    name: &'static str,
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl SamplerHandle {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            handle: None,
            cancel_token: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Spawn the loop unless one is already live. Restarting a session while
    /// its sampler still runs reuses the existing task.
    pub fn spawn<F, Fut>(&mut self, make_loop: F)
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if self.is_active() {
            debug!("{} task already running", self.name);
            return;
        }

        let cancel_token = CancellationToken::new();
        let token_clone = cancel_token.clone();

        self.handle = Some(tokio::spawn(make_loop(token_clone)));
        self.cancel_token = Some(cancel_token);
    }

    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .with_context(|| format!("{} task failed to join", self.name))
        } else {
            Ok(())
        }
    }
}
