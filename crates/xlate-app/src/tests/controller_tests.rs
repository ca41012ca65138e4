use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::time::timeout;
use xlate_config::Config;
use xlate_router::{ContentClient, TranslateOutcome};
use xlate_translator::testing::StubFetch;
use xlate_types::TranslationRequest;

use crate::controller::AppController;
use crate::state::AppState;

const WAIT: Duration = Duration::from_secs(2);

fn offline_config() -> Config {
    let mut config = Config::default();
    config.network.listen_to_ws = false;
    config.translator.display_language = Some("en".to_string());
    config
}

#[tokio::test]
async fn content_tab_is_served_by_the_background() {
    let fetch = Arc::new(StubFetch::new());
    fetch.push_json(
        200,
        json!({ "sentences": [{ "trans": "hello", "orig": "hola" }], "src": "es" }),
    );
    let state = Arc::new(AppState::with_fetch(offline_config(), fetch.clone()));
    let controller = AppController::new(state.clone());
    let mut tasks = controller.spawn_tasks().await.unwrap();

    let client = ContentClient::new(controller.hub().connect(), Some(WAIT));
    let outcome = client
        .translate(TranslationRequest::new("google", "auto", "en", "hola"))
        .await
        .unwrap();

    match outcome {
        TranslateOutcome::Resolved(result) => {
            assert_eq!(result.translation, "hello");
            assert_eq!(result.detected_lang.as_deref(), Some("es"));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(fetch.request_count(), 1);
    assert_eq!(state.registry.ids().collect::<Vec<_>>(), ["google"]);

    controller.shutdown();
    while let Some(result) = timeout(WAIT, tasks.join_next()).await.unwrap() {
        assert!(result.unwrap().is_ok());
    }
}

#[tokio::test]
async fn websocket_bridge_stops_on_shutdown() {
    let mut config = offline_config();
    config.network.listen_to_ws = true;
    config.network.ws_addr = "127.0.0.1:0".to_string();

    let state = Arc::new(AppState::with_fetch(config, Arc::new(StubFetch::new())));
    let controller = AppController::new(state);
    let mut tasks = controller.spawn_tasks().await.unwrap();
    assert_eq!(tasks.len(), 2);

    controller.shutdown();
    while let Some(result) = timeout(WAIT, tasks.join_next()).await.unwrap() {
        assert!(result.unwrap().is_ok());
    }
}

#[tokio::test]
async fn occupied_ws_address_fails_startup() {
    let taken = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let mut config = offline_config();
    config.network.listen_to_ws = true;
    config.network.ws_addr = taken.local_addr().unwrap().to_string();

    let state = Arc::new(AppState::with_fetch(config, Arc::new(StubFetch::new())));
    let controller = AppController::new(state);

    assert!(controller.spawn_tasks().await.is_err());
}
