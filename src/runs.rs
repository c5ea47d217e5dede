use std::sync::Arc;

use crate::transport::AssistantApi;

/// Read-only check for in-flight generation runs on a thread.
pub struct RunStateTracker {
    transport: Arc<dyn AssistantApi>,
}

impl RunStateTracker {
    pub fn new(transport: Arc<dyn AssistantApi>) -> Self {
        Self { transport }
    }

    /// True if any run on the thread is queued, in progress, or waiting on
    /// a tool action.
    ///
    /// Fails open: a transport or listing failure reports "no active run"
    /// so a transient error never blocks the user. The submit path handles
    /// the resulting backend rejection if the check was wrong.
    pub async fn has_active_run(&self, thread_id: &str) -> bool {
        match self.transport.list_runs(thread_id).await {
            Ok(runs) => runs.iter().any(|run| run.status.is_active()),
            Err(e) => {
                tracing::warn!(thread_id = %thread_id, error = %e, "Run listing failed, assuming no active run");
                false
            }
        }
    }
}
