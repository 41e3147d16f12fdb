use std::time::Duration;

use crate::selection::session::SessionStore;

pub async fn run(sessions: &SessionStore, ttl: Duration) {
    tracing::debug!("session_sweep: start");
    let max_age = match chrono::Duration::from_std(ttl) {
        Ok(d) => d,
        Err(e) => {
            tracing::error!(error = %e, ttl_secs = ttl.as_secs(), "session_sweep: ttl out of range");
            return;
        }
    };
    let removed = sessions.expire_older_than(max_age).await;
    let remaining = sessions.len().await;
    if removed > 0 {
        tracing::info!(removed, remaining, "session_sweep: done");
    } else {
        tracing::debug!(remaining, "session_sweep: nothing to expire");
    }
}
