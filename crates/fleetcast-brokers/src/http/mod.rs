//! Debug broker exposing ready game servers over HTTP.
//!
//! Instead of forwarding envelopes, this broker keeps an in-memory index of
//! game servers in the `Ready` state and serves it at `GET /api/gameservers`.

pub mod store;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use fleetcast_events::resources::gameserver::{
    GAMESERVER_EVENT_ADDED, GAMESERVER_EVENT_DELETED, GAMESERVER_EVENT_UPDATED,
};
use fleetcast_events::resources::GameServer;
use fleetcast_events::{Envelope, Event};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::{base_envelope, Broker, BrokerError};

pub use store::{GameServerStore, GameServerView};

/// Default listen address.
pub const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:8000";

/// Response body of `GET /api/gameservers`.
#[derive(Debug, Serialize, Deserialize)]
pub struct GameServerResponse {
    pub gameservers: Vec<GameServerView>,
}

/// Broker maintaining the ready game server index.
pub struct HttpBroker {
    addr: SocketAddr,
    store: Arc<GameServerStore>,
}

impl HttpBroker {
    #[must_use]
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            store: Arc::new(GameServerStore::new()),
        }
    }

    /// Read the listen address from `FLEETCAST_HTTP_ADDR` (default `0.0.0.0:8000`).
    pub fn from_env() -> Result<Self, BrokerError> {
        let raw =
            std::env::var("FLEETCAST_HTTP_ADDR").unwrap_or_else(|_| DEFAULT_HTTP_ADDR.to_string());
        let addr = raw.parse().map_err(|e| BrokerError::ConfigInvalid {
            var: "FLEETCAST_HTTP_ADDR".to_string(),
            reason: format!("{raw}: {e}"),
        })?;
        Ok(Self::new(addr))
    }

    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    #[must_use]
    pub fn store(&self) -> Arc<GameServerStore> {
        Arc::clone(&self.store)
    }

    /// Router serving the index.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/api/gameservers", get(list_gameservers))
            .with_state(self.store())
    }

    /// Serve the index until `shutdown` resolves.
    pub async fn serve(
        &self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), BrokerError> {
        let connection_failed = |e: std::io::Error| BrokerError::ConnectionFailed {
            endpoint: self.addr.to_string(),
            cause: e.to_string(),
        };

        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(connection_failed)?;

        info!(addr = %self.addr, "Serving game servers at /api/gameservers");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(connection_failed)
    }
}

/// Decode the game server carried by a `gameserver.events.*` message: the
/// object itself for adds and deletes, `new_obj` for updates. Other event
/// types carry nothing this broker indexes.
fn decode_payload(event_type: &str, message: &Value) -> Result<Option<GameServer>, String> {
    let payload = if event_type == GAMESERVER_EVENT_UPDATED.as_str() {
        message.get("new_obj").ok_or("new_obj is missing")?
    } else if event_type == GAMESERVER_EVENT_ADDED.as_str()
        || event_type == GAMESERVER_EVENT_DELETED.as_str()
    {
        message
    } else {
        return Ok(None);
    };

    GameServer::deserialize(payload)
        .map(Some)
        .map_err(|e| e.to_string())
}

async fn list_gameservers(State(store): State<Arc<GameServerStore>>) -> impl IntoResponse {
    (
        [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
        ],
        Json(GameServerResponse {
            gameservers: store.list(),
        }),
    )
}

#[async_trait]
impl Broker for HttpBroker {
    fn name(&self) -> &'static str {
        "http"
    }

    fn build_envelope(&self, event: &Event) -> Result<Envelope, BrokerError> {
        let envelope = base_envelope(event)?;
        let event_type = event.event_type().as_str();
        decode_payload(event_type, &envelope.message).map_err(|cause| {
            BrokerError::EnvelopeBuild {
                event_type: event_type.to_string(),
                cause,
            }
        })?;
        Ok(envelope)
    }

    async fn send_message(&self, envelope: Envelope) -> Result<(), BrokerError> {
        let event_type = envelope.event_type().unwrap_or_default();
        let gs = decode_payload(event_type, &envelope.message).map_err(|cause| {
            BrokerError::UnexpectedMessage {
                event_type: event_type.to_string(),
                cause,
            }
        })?;

        match gs {
            Some(gs) if event_type == GAMESERVER_EVENT_DELETED.as_str() => {
                self.store.remove(&gs.key());
                info!(key = %gs.key(), "Game server deleted");
            }
            Some(gs) => self.store.apply(&gs),
            None => debug!(event_type = %event_type, "Ignoring event"),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use fleetcast_events::resources::{gameserver, GameServerState};
    use fleetcast_events::{Message, UnstructuredResource};
    use serde_json::json;
    use tower::util::ServiceExt;

    use crate::test_env::ScopedEnv;

    fn broker() -> HttpBroker {
        HttpBroker::new("127.0.0.1:0".parse().unwrap())
    }

    async fn publish(broker: &HttpBroker, event: Event) -> Result<(), BrokerError> {
        let envelope = broker.build_envelope(&event)?;
        broker.send_message(envelope).await
    }

    fn gs(state: GameServerState) -> GameServer {
        GameServer::new("default", "gs-1").with_state(state)
    }

    #[tokio::test]
    async fn test_added_ready_is_indexed() {
        let broker = broker();
        publish(&broker, gameserver::added(Message::object(gs(GameServerState::Ready))))
            .await
            .unwrap();

        assert_eq!(broker.store().len(), 1);
    }

    #[tokio::test]
    async fn test_updated_away_from_ready_is_removed() {
        let broker = broker();
        publish(&broker, gameserver::added(Message::object(gs(GameServerState::Ready))))
            .await
            .unwrap();

        let message = Message::update(
            Arc::new(gs(GameServerState::Ready)),
            Arc::new(gs(GameServerState::Allocated)),
        );
        publish(&broker, gameserver::updated(message)).await.unwrap();

        assert!(broker.store().is_empty());
    }

    #[tokio::test]
    async fn test_deleted_is_removed() {
        let broker = broker();
        publish(&broker, gameserver::added(Message::object(gs(GameServerState::Ready))))
            .await
            .unwrap();
        publish(&broker, gameserver::deleted(Message::object(gs(GameServerState::Shutdown))))
            .await
            .unwrap();

        assert!(broker.store().is_empty());
    }

    #[test]
    fn test_build_envelope_rejects_malformed_game_server() {
        let broker = broker();
        let malformed = || UnstructuredResource::new("GameServer", json!({"nope": true}));

        let events = [
            gameserver::added(Message::object(malformed())),
            gameserver::updated(Message::update(
                Arc::new(gs(GameServerState::Ready)),
                Arc::new(malformed()),
            )),
            gameserver::deleted(Message::object(UnstructuredResource::new(
                "GameServer",
                json!({"name": 3}),
            ))),
        ];

        for event in events {
            match broker.build_envelope(&event) {
                Err(BrokerError::EnvelopeBuild { event_type, .. }) => {
                    assert_eq!(event_type, event.event_type().as_str());
                }
                other => panic!("Expected EnvelopeBuild, got {other:?}"),
            }
        }
        assert!(broker.store().is_empty());
    }

    #[tokio::test]
    async fn test_update_without_new_obj_fails() {
        let broker = broker();
        let envelope = Envelope::new(json!({"old_obj": {}}))
            .with_header("event_type", "gameserver.events.updated");

        let err = broker.send_message(envelope).await.unwrap_err();
        assert!(matches!(err, BrokerError::UnexpectedMessage { .. }));
    }

    #[tokio::test]
    async fn test_other_event_types_are_ignored() {
        let broker = broker();
        let envelope =
            Envelope::new(json!({"name": "f-1"})).with_header("event_type", "fleet.events.added");

        assert!(broker.send_message(envelope).await.is_ok());
        assert!(broker.store().is_empty());
    }

    #[tokio::test]
    async fn test_router_lists_gameservers() {
        let broker = broker();
        publish(&broker, gameserver::added(Message::object(gs(GameServerState::Ready))))
            .await
            .unwrap();

        let response = broker
            .router()
            .oneshot(
                Request::builder()
                    .uri("/api/gameservers")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );

        let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        let parsed: GameServerResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed.gameservers.len(), 1);
        assert_eq!(parsed.gameservers[0].name, "gs-1");
        assert_eq!(parsed.gameservers[0].state, "Ready");
    }

    #[test]
    fn test_from_env_default_addr() {
        let _env = ScopedEnv::with(&[]);

        let broker = HttpBroker::from_env().unwrap();
        assert_eq!(broker.addr(), DEFAULT_HTTP_ADDR.parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn test_from_env_reads_addr() {
        let _env = ScopedEnv::with(&[("FLEETCAST_HTTP_ADDR", "127.0.0.1:9090")]);

        let broker = HttpBroker::from_env().unwrap();
        assert_eq!(broker.addr().port(), 9090);
    }

    #[test]
    fn test_from_env_rejects_bad_addr() {
        let _env = ScopedEnv::with(&[("FLEETCAST_HTTP_ADDR", "not-an-addr")]);

        match HttpBroker::from_env() {
            Err(BrokerError::ConfigInvalid { var, .. }) => assert_eq!(var, "FLEETCAST_HTTP_ADDR"),
            other => panic!("Expected ConfigInvalid, got {:?}", other.map(|b| b.addr())),
        }
    }
}
