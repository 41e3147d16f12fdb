use std::sync::Arc;
use std::time::Instant;

use tokio::sync::broadcast;

use crate::config::Config;
use crate::selection::engine::SelectionEngine;
use crate::selection::model::ModelHandle;
use crate::selection::session::SessionStore;
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    store: Arc<Store>,
    engine: Arc<SelectionEngine>,
    config: Arc<Config>,
    shutdown_tx: broadcast::Sender<()>,
    started_at: Instant,
}

impl AppState {
    pub fn new(
        store: Arc<Store>,
        model: Arc<ModelHandle>,
        config: &Config,
        shutdown_tx: broadcast::Sender<()>,
    ) -> Self {
        let engine = Arc::new(SelectionEngine::new(
            config.selection.clone(),
            store.clone(),
            Arc::new(SessionStore::new()),
            model,
        ));

        Self {
            store,
            engine,
            config: Arc::new(config.clone()),
            shutdown_tx,
            started_at: Instant::now(),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn engine(&self) -> &SelectionEngine {
        &self.engine
    }

    pub fn sessions(&self) -> Arc<SessionStore> {
        self.engine.sessions().clone()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn shutdown_rx(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    pub fn shutdown_tx(&self) -> &broadcast::Sender<()> {
        &self.shutdown_tx
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::sync::broadcast;

    use crate::config::Config;
    use crate::selection::model::{LogisticModel, ModelHandle};
    use crate::store::Store;

    use super::*;

    fn state(tx: broadcast::Sender<()>) -> (AppState, tempfile::TempDir) {
        let cfg = Config::from_env();
        let tmp = tempfile::tempdir().expect("tempdir");
        let store =
            Arc::new(Store::open(tmp.path().join("state.sled").to_str().unwrap()).unwrap());
        let model = Arc::new(ModelHandle::preloaded(LogisticModel::fallback()));
        (AppState::new(store, model, &cfg, tx), tmp)
    }

    #[tokio::test]
    async fn clones_share_one_session_registry() {
        let (tx, _) = broadcast::channel(4);
        let (state, _tmp) = state(tx);
        let other = state.clone();

        let id = state.engine().create_session("alice").await;
        assert!(other.sessions().get_session(id).await.is_some());
    }

    #[tokio::test]
    async fn shutdown_receiver_can_clone() {
        let (tx, _) = broadcast::channel(4);
        let (state, _tmp) = state(tx.clone());

        let mut rx1 = state.shutdown_rx();
        let mut rx2 = state.shutdown_rx();
        tx.send(()).unwrap();
        rx1.recv().await.unwrap();
        rx2.recv().await.unwrap();
    }
}
