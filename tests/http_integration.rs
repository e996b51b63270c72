//! Integration tests for the HTTP surface over a running in-memory bridge.

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tower::ServiceExt;

use device_dashboard::adapters::http::{app_router, AppState};
use device_dashboard::adapters::{BroadcastHub, InMemoryDeviceStore, InMemoryMessageBus};
use device_dashboard::application::{
    CommandDispatcher, CommandTopics, GetDeviceStateHandler, StateIngestor,
};
use device_dashboard::config::{ServerConfig, TopicsConfig};
use device_dashboard::domain::device::MessageNormalizer;
use device_dashboard::domain::foundation::{DeviceId, DeviceUuid};
use device_dashboard::ports::{MessageBus, QoS};

struct TestApp {
    router: Router,
    bus: Arc<InMemoryMessageBus>,
    hub: Arc<BroadcastHub>,
    shutdown: watch::Sender<bool>,
}

async fn test_app() -> TestApp {
    let topics = TopicsConfig::default();
    let store = InMemoryDeviceStore::new();
    store
        .insert_device(DeviceId::new(7), DeviceUuid::new("abc-123").unwrap())
        .await;
    let bus = Arc::new(InMemoryMessageBus::new());
    let hub = Arc::new(BroadcastHub::with_default_capacity());

    let ingestor = Arc::new(StateIngestor::new(
        MessageNormalizer::new(&topics.state_namespace),
        Arc::new(store.clone()),
        hub.clone(),
    ));
    bus.subscribe(&topics.state_filter(), QoS::AtLeastOnce, ingestor)
        .await
        .unwrap();

    let dispatcher = CommandDispatcher::new(
        Arc::new(store.clone()),
        bus.clone(),
        CommandTopics {
            command: topics.command_template().unwrap(),
            toggle: topics.toggle_template().unwrap(),
            number_input: topics.number_input_template().unwrap(),
        },
    );
    let (shutdown, shutdown_rx) = watch::channel(false);
    let state = AppState {
        dispatcher: Arc::new(dispatcher),
        device_state: Arc::new(GetDeviceStateHandler::new(Arc::new(store))),
        hub: hub.clone(),
        bus: bus.clone(),
        shutdown: shutdown_rx,
        keep_alive: Duration::from_secs(60),
    };

    TestApp {
        router: app_router(state, &ServerConfig::default()),
        bus,
        hub,
        shutdown,
    }
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn dashboard_stream_receives_device_state() {
    let app = test_app().await;

    let response = app.router.clone().oneshot(get("/api/stream")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let mut stream = response.into_body().into_data_stream();

    app.bus
        .deliver("state/abc-123/state", r#"{"action_name":"temp","temp":"21.5"}"#)
        .await;

    let frame = stream.next().await.unwrap().unwrap();
    assert_eq!(
        std::str::from_utf8(&frame).unwrap(),
        "data: {\"deviceID\":7,\"actionName\":\"temp\",\"state\":\"21.5\"}\n\n"
    );

    let response = app
        .router
        .oneshot(get("/device/7/provide_value/temp"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"21.5");
}

#[tokio::test]
async fn closing_the_stream_releases_the_session() {
    let app = test_app().await;

    let response = app.router.clone().oneshot(get("/api/stream")).await.unwrap();
    assert_eq!(app.hub.subscriber_count(), 1);

    drop(response);

    assert_eq!(app.hub.subscriber_count(), 0);
}

#[tokio::test]
async fn server_shutdown_ends_every_stream() {
    let app = test_app().await;
    let first = app.router.clone().oneshot(get("/api/stream")).await.unwrap();
    let second = app.router.clone().oneshot(get("/api/stream")).await.unwrap();

    app.shutdown.send(true).unwrap();

    for response in [first, second] {
        let mut stream = response.into_body().into_data_stream();
        assert!(stream.next().await.is_none());
    }
    assert_eq!(app.hub.subscriber_count(), 0);
}

#[tokio::test]
async fn command_reaches_the_bus_and_broker_outage_is_reported() {
    let app = test_app().await;

    let request = Request::builder()
        .method("POST")
        .uri("/device/7/command/power")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from("off"))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let published = app.bus.published();
    assert_eq!(published[0].topic, "cmd/abc-123");
    assert_eq!(published[0].payload_str(), "off");

    app.bus.drop_connection();
    let request = Request::builder()
        .method("POST")
        .uri("/device/7/toggle/power")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let response = app.router.oneshot(get("/api/health/broker")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}
