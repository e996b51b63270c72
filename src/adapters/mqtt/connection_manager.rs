//! MQTT implementation of the [`MessageBus`] port on top of `rumqttc`.
//!
//! One [`MqttMessageBus`] owns one broker connection. A background task
//! polls the `rumqttc` event loop, drives the [`ConnectionLifecycle`],
//! replays every subscription after each ConnAck and hands each incoming
//! publish to its handlers on a task of its own.

use async_trait::async_trait;
use rumqttc::{
    AsyncClient, ConnectReturnCode, ConnectionError, Event, EventLoop, MqttOptions, Outgoing, Packet,
};
use secrecy::ExposeSecret;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::MqttConfig;
use crate::domain::connection::{
    ConnectionLifecycle, ConnectionListener, ConnectionState, ConnectionStatus, ReconnectDecision,
};
use crate::ports::{BusError, BusMessage, MessageBus, MessageHandler, QoS};

use super::subscriptions::{run_handler, SubscriptionTable};

/// Upper bound on waiting for the DISCONNECT packet to leave on shutdown.
const DISCONNECT_FLUSH_TIMEOUT: Duration = Duration::from_millis(500);

impl From<QoS> for rumqttc::QoS {
    fn from(qos: QoS) -> Self {
        match qos {
            QoS::AtMostOnce => rumqttc::QoS::AtMostOnce,
            QoS::AtLeastOnce => rumqttc::QoS::AtLeastOnce,
            QoS::ExactlyOnce => rumqttc::QoS::ExactlyOnce,
        }
    }
}

/// State shared between the bus handle and its event-loop task.
struct Shared {
    lifecycle: Mutex<ConnectionLifecycle>,
    subscriptions: SubscriptionTable,
}

impl Shared {
    fn lifecycle(&self) -> MutexGuard<'_, ConnectionLifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn state(&self) -> ConnectionState {
        self.lifecycle().state()
    }
}

/// Broker-side subscribe call, separated from `AsyncClient` so the
/// event-loop logic runs without a broker.
#[async_trait]
trait SubscribeClient: Send + Sync {
    async fn subscribe_filter(&self, filter: &str, qos: QoS) -> Result<(), BusError>;
}

#[async_trait]
impl SubscribeClient for AsyncClient {
    async fn subscribe_filter(&self, filter: &str, qos: QoS) -> Result<(), BusError> {
        // Called from the event-loop task itself, so never wait on the
        // request channel.
        self.try_subscribe(filter, qos.into())
            .map_err(|e| BusError::Client(e.to_string()))
    }
}

/// Message bus backed by a single MQTT connection.
pub struct MqttMessageBus {
    client: AsyncClient,
    shared: Arc<Shared>,
    shutdown_tx: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl MqttMessageBus {
    /// Connects to the broker and starts the event-loop task.
    ///
    /// Returns once the broker acknowledged the first session. A failure
    /// here is final: the initial connection is not retried.
    pub async fn connect(
        config: &MqttConfig,
        listener: Arc<dyn ConnectionListener>,
    ) -> Result<Arc<Self>, BusError> {
        let mut options = MqttOptions::new(&config.client_id, &config.host, config.port);
        options.set_keep_alive(config.keep_alive());
        options.set_clean_session(true);
        if let Some(username) = &config.username {
            let password = config
                .password
                .as_ref()
                .map(|p| p.expose_secret().clone())
                .unwrap_or_default();
            options.set_credentials(username, password);
        }

        let (client, mut eventloop) = AsyncClient::new(options, config.request_capacity);
        let mut lifecycle = ConnectionLifecycle::new(config.reconnect_policy(), listener);
        lifecycle
            .begin_connect()
            .map_err(|e| BusError::Client(e.to_string()))?;

        tracing::info!(host = %config.host, port = config.port, client_id = %config.client_id, "Connecting to message broker");

        if let Err(reason) = await_first_connack(&mut eventloop).await {
            let _ = lifecycle.connection_failed(&reason);
            return Err(BusError::ConnectionLost(reason));
        }
        lifecycle
            .connected()
            .map_err(|e| BusError::Client(e.to_string()))?;

        let shared = Arc::new(Shared {
            lifecycle: Mutex::new(lifecycle),
            subscriptions: SubscriptionTable::new(),
        });
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let driver = EventLoopDriver {
            client: client.clone(),
            shared: shared.clone(),
        };
        let task = tokio::spawn(run_event_loop(driver, eventloop, shutdown_rx));

        Ok(Arc::new(Self {
            client,
            shared,
            shutdown_tx,
            task: Mutex::new(Some(task)),
        }))
    }

    /// Disconnects and stops the event-loop task. Terminal.
    pub async fn shutdown(&self) {
        if let Err(e) = self.shared.lifecycle().shutdown() {
            tracing::warn!(error = %e, "Unexpected lifecycle state on shutdown");
        }
        if let Err(e) = self.client.try_disconnect() {
            tracing::debug!(error = %e, "Disconnect request not sent");
        }
        let _ = self.shutdown_tx.send(true);

        let task = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Broker event loop task ended abnormally");
            }
        }
    }
}

#[async_trait]
impl MessageBus for MqttMessageBus {
    async fn publish(
        &self,
        topic: &str,
        qos: QoS,
        retain: bool,
        payload: Vec<u8>,
    ) -> Result<(), BusError> {
        validate_publish_topic(topic)?;

        let state = self.shared.state();
        if !state.accepts_publishes() {
            return Err(BusError::NotConnected { state });
        }

        tracing::debug!(topic, %qos, retain, bytes = payload.len(), "Publishing");
        self.client
            .try_publish(topic, qos.into(), retain, payload)
            .map_err(|e| BusError::Client(e.to_string()))
    }

    async fn subscribe(
        &self,
        filter: &str,
        qos: QoS,
        handler: Arc<dyn MessageHandler>,
    ) -> Result<(), BusError> {
        if filter.is_empty() {
            return Err(BusError::InvalidTopic {
                topic: filter.to_string(),
                reason: "filter cannot be empty".to_string(),
            });
        }

        tracing::info!(filter, %qos, handler = handler.name(), "Subscribing");
        // Registered first so a ConnAck racing this call still replays it.
        self.shared.subscriptions.insert(filter, qos, handler.clone());

        // While disconnected the filter is sent with the next ConnAck.
        if self.shared.state().accepts_publishes() {
            if let Err(e) = self.client.subscribe(filter, qos.into()).await {
                self.shared.subscriptions.remove(filter, &handler);
                tracing::warn!(filter, error = %e, "Subscribe request failed");
                return Err(BusError::Client(e.to_string()));
            }
        }
        Ok(())
    }

    fn status(&self) -> ConnectionStatus {
        self.shared.lifecycle().status()
    }
}

fn validate_publish_topic(topic: &str) -> Result<(), BusError> {
    if topic.is_empty() || topic.contains(|c: char| matches!(c, '+' | '#')) {
        return Err(BusError::InvalidTopic {
            topic: topic.to_string(),
            reason: "publish topics must be non-empty and wildcard-free".to_string(),
        });
    }
    Ok(())
}

async fn await_first_connack(eventloop: &mut EventLoop) -> Result<(), String> {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(ack))) if ack.code == ConnectReturnCode::Success => {
                return Ok(())
            }
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                return Err(format!("broker refused connection: {:?}", ack.code))
            }
            Ok(_) => {}
            Err(e) => return Err(e.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopControl {
    Continue,
    Backoff(Duration),
    Stop,
}

struct EventLoopDriver<C> {
    client: C,
    shared: Arc<Shared>,
}

impl<C: SubscribeClient> EventLoopDriver<C> {
    async fn on_event(&self, event: Result<Event, ConnectionError>) -> LoopControl {
        match event {
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                self.dispatch(BusMessage::new(publish.topic, publish.payload.to_vec()));
                LoopControl::Continue
            }
            Ok(Event::Incoming(Packet::ConnAck(ack))) if ack.code == ConnectReturnCode::Success => {
                let connected = self.shared.lifecycle().connected();
                match connected {
                    Ok(()) => {
                        self.resubscribe().await;
                        LoopControl::Continue
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Unexpected ConnAck");
                        LoopControl::Continue
                    }
                }
            }
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                self.connection_failed(&format!("broker refused connection: {:?}", ack.code))
            }
            Ok(_) => LoopControl::Continue,
            Err(e) => self.connection_failed(&e.to_string()),
        }
    }

    fn connection_failed(&self, reason: &str) -> LoopControl {
        let decision = self.shared.lifecycle().connection_failed(reason);
        match decision {
            Ok(ReconnectDecision::Retry { delay, .. }) => LoopControl::Backoff(delay),
            Ok(ReconnectDecision::GiveUp) => {
                tracing::error!(reason, "Giving up on message broker");
                LoopControl::Stop
            }
            // Already disconnected: shutdown raced the failure.
            Err(_) => LoopControl::Stop,
        }
    }

    /// Replays every registered filter. Returns how many were accepted.
    async fn resubscribe(&self) -> usize {
        let mut accepted = 0;
        for (filter, qos) in self.shared.subscriptions.filters() {
            match self.client.subscribe_filter(&filter, qos).await {
                Ok(()) => accepted += 1,
                Err(e) => tracing::error!(filter = %filter, error = %e, "Resubscribe failed"),
            }
        }
        tracing::info!(filters = accepted, "Subscriptions restored");
        accepted
    }

    fn dispatch(&self, message: BusMessage) {
        let handlers = self.shared.subscriptions.handlers_for(&message.topic);
        if handlers.is_empty() {
            tracing::trace!(topic = %message.topic, "No handler for topic");
            return;
        }

        tracing::trace!(topic = %message.topic, handlers = handlers.len(), "Dispatching message");
        for handler in handlers {
            tokio::spawn(run_handler(handler, message.clone()));
        }
    }
}

/// True once the session is over from the client's side.
fn ends_session(event: &Result<Event, ConnectionError>) -> bool {
    matches!(event, Ok(Event::Outgoing(Outgoing::Disconnect)) | Err(_))
}

/// Keeps polling until the queued DISCONNECT has been written.
async fn flush_disconnect(eventloop: &mut EventLoop) {
    let flushed = tokio::time::timeout(DISCONNECT_FLUSH_TIMEOUT, async {
        while !ends_session(&eventloop.poll().await) {}
    })
    .await;
    if flushed.is_err() {
        tracing::debug!("Disconnect not flushed before timeout");
    }
}

async fn run_event_loop<C: SubscribeClient>(
    driver: EventLoopDriver<C>,
    mut eventloop: EventLoop,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        let event = tokio::select! {
            _ = shutdown.changed() => {
                flush_disconnect(&mut eventloop).await;
                break;
            }
            event = eventloop.poll() => event,
        };

        match driver.on_event(event).await {
            LoopControl::Continue => {}
            LoopControl::Backoff(delay) => {
                tokio::select! {
                    _ = shutdown.changed() => break,
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            LoopControl::Stop => break,
        }
    }
    tracing::debug!("Broker event loop stopped");
}
