//! In-memory index of ready game servers.

use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock};

use fleetcast_events::resources::GameServer;
use serde::{Deserialize, Serialize};

/// Flattened game server as served by the debug API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameServerView {
    pub name: String,
    pub namespace: String,
    pub labels: BTreeMap<String, String>,
    #[serde(rename = "addr")]
    pub address: String,
    pub port: i32,
    pub state: String,
    pub node_name: String,
}

impl GameServerView {
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

impl From<&GameServer> for GameServerView {
    fn from(gs: &GameServer) -> Self {
        Self {
            name: gs.name.clone(),
            namespace: gs.namespace.clone(),
            labels: gs.labels.clone(),
            address: gs.status.address.clone(),
            port: gs.port().unwrap_or_default(),
            state: gs.status.state.to_string(),
            node_name: gs.status.node_name.clone(),
        }
    }
}

/// Thread-safe map of `namespace/name` to game server.
#[derive(Debug, Default)]
pub struct GameServerStore {
    entries: RwLock<HashMap<String, GameServerView>>,
}

impl GameServerStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Index `gs` when it is ready, drop it from the index otherwise.
    pub fn apply(&self, gs: &GameServer) {
        if gs.is_ready() {
            self.upsert(GameServerView::from(gs));
        } else {
            self.remove(&gs.key());
        }
    }

    pub fn upsert(&self, view: GameServerView) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(view.key(), view);
    }

    pub fn remove(&self, key: &str) -> Option<GameServerView> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<GameServerView> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(key).cloned()
    }

    /// Snapshot sorted by key.
    #[must_use]
    pub fn list(&self) -> Vec<GameServerView> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let mut list: Vec<_> = entries.values().cloned().collect();
        list.sort_by_key(GameServerView::key);
        list
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
