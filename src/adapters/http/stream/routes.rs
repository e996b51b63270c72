//! HTTP routes for the dashboard stream.

use axum::{routing::get, Router};

use super::handlers::{stream_state, StreamState};

pub fn stream_routes(state: StreamState) -> Router {
    Router::new()
        .route("/stream", get(stream_state))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::hub::BroadcastHub;
    use crate::domain::device::StateEvent;
    use crate::domain::foundation::DeviceId;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use futures::StreamExt;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::watch;
    use tower::ServiceExt;

    fn request() -> Request<Body> {
        Request::builder().uri("/stream").body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn streams_published_events_as_json_data() {
        let hub = Arc::new(BroadcastHub::with_default_capacity());
        let (_tx, rx) = watch::channel(false);
        let router = stream_routes(StreamState::new(hub.clone(), rx, Duration::from_secs(60)));

        let response = router.oneshot(request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/event-stream"
        );
        assert_eq!(hub.subscriber_count(), 1);

        hub.publish(&StateEvent::new(DeviceId::new(7), "temp", "21.5"));

        let mut body = response.into_body().into_data_stream();
        let frame = body.next().await.unwrap().unwrap();
        assert_eq!(
            std::str::from_utf8(&frame).unwrap(),
            "data: {\"deviceID\":7,\"actionName\":\"temp\",\"state\":\"21.5\"}\n\n"
        );

        drop(body);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn shutdown_closes_open_streams() {
        let hub = Arc::new(BroadcastHub::with_default_capacity());
        let (tx, rx) = watch::channel(false);
        let router = stream_routes(StreamState::new(hub.clone(), rx, Duration::from_secs(60)));

        let response = router.oneshot(request()).await.unwrap();
        let mut body = response.into_body().into_data_stream();
        tx.send(true).unwrap();

        assert!(body.next().await.is_none());
        assert_eq!(hub.subscriber_count(), 0);
    }
}
