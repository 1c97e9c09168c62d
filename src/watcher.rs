use std::sync::Arc;
use std::time::Duration;

use crate::state::AppState;

/// How often the sweep runs
const SWEEP_INTERVAL: Duration = Duration::from_secs(30);

/// Spawn a background task that marks long-abandoned sessions as timed out.
///
/// Users who close the tab mid-session never send a cancel, so open
/// sessions past twice their nominal duration are swept server-side.
pub fn spawn_session_timeout_watcher(state: Arc<AppState>) {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(SWEEP_INTERVAL).await;

            let swept = state.sweep_timed_out_sessions(chrono::Utc::now()).await;
            if !swept.is_empty() {
                tracing::info!("Timed out {} abandoned sessions", swept.len());
            }
        }
    });
}
