//! [`EventBus`] backed by a topic exchange over AMQP (RabbitMQ and
//! compatible brokers), via `lapin`.

use crate::error::BrokerError;
use crate::state::{BrokerState, StateCell};
use ironhorizon_core::event::EventRecord;
use ironhorizon_core::event_bus::{
    events_exchange_name, events_queue_name, register_unique, EventBus, EventBusError, EventHandler,
};
use lapin::options::{
    BasicAckOptions, BasicConsumeOptions, BasicPublishOptions, BasicRejectOptions,
    ExchangeDeclareOptions, QueueBindOptions, QueueDeclareOptions,
};
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties, ExchangeKind};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, LazyLock};
use tokio::task::JoinHandle;
use uuid::Uuid;

static GLOBAL_HANDLERS: LazyLock<Mutex<Vec<Arc<dyn EventHandler>>>> =
    LazyLock::new(|| Mutex::new(Vec::new()));

/// Metadata key a publish is stamped with, naming the bus instance that
/// published it. The `"#"`-bound queue means a bus receives back every
/// event it publishes itself; `dispatch` reads this key to recognize and
/// skip those self-deliveries rather than re-running this process's own
/// handlers a second time.
const ORIGIN_BUS_ID_KEY: &str = "_origin_bus_id";

/// Read the `_origin_bus_id` stamp back out of a record's metadata, if any.
fn origin_bus_id(record: &EventRecord) -> Option<Uuid> {
    record
        .metadata
        .as_ref()
        .and_then(|metadata| metadata.get(ORIGIN_BUS_ID_KEY))
        .and_then(serde_json::Value::as_str)
        .and_then(|id| Uuid::parse_str(id).ok())
}

/// Events published and consumed through a durable AMQP topic exchange.
///
/// Routing key is the event's `event_type`; this bus's own queue is bound
/// with `"#"` so it receives every event published to the exchange and
/// filters into typed/global tiers itself, mirroring the in-process bus's
/// dispatch so application code sees identical semantics regardless of
/// transport. Local handlers never go through the wire at all — see
/// "Local Handlers" below.
///
/// # Delivery
///
/// At-least-once: a message is acked only after every matching handler
/// tier has run without error. A handler error rejects the message
/// without requeue — a poison message (one no handler can ever process)
/// is dropped rather than retried forever, per the documented policy.
///
/// # Local Handlers
///
/// Local handlers run synchronously inside `publish_event`, before the
/// broker publish, and never run again on the wire-delivery path: a local
/// handler sees only events this instance itself published, and it sees
/// them exactly once, matching the in-process bus's local tier. `dispatch`
/// (the inbound consumer path) only ever considers the typed and global
/// tiers.
///
/// # Self-Delivery
///
/// Because this bus's queue is bound with `"#"`, it receives back every
/// event it publishes itself, not just ones published by peers. Each
/// publish is stamped with this instance's `bus_id` under the
/// `_origin_bus_id` metadata key; `dispatch` drops (acks without invoking
/// the typed/global tiers) any delivery whose stamp matches its own id.
pub struct AmqpEventBus {
    #[allow(dead_code)]
    connection: Connection,
    channel: Channel,
    app_namespace: String,
    consumer_tag: String,
    bus_id: Uuid,
    state: StateCell,
    typed: Mutex<HashMap<&'static str, Vec<Arc<dyn EventHandler>>>>,
    local: Mutex<Vec<Arc<dyn EventHandler>>>,
    consumer_task: Mutex<Option<JoinHandle<()>>>,
}

impl AmqpEventBus {
    /// Connect to `amqp_uri` and declare the durable topic exchange for
    /// `app_namespace`. The bus starts in [`BrokerState::Init`]; call
    /// [`AmqpEventBus::start`] to begin consuming.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::ConnectionFailed`] if the broker cannot be
    /// reached, or [`BrokerError::Channel`] if the exchange cannot be
    /// declared.
    pub async fn connect(
        amqp_uri: &str,
        app_namespace: impl Into<String>,
        consumer_tag: impl Into<String>,
    ) -> Result<Self, BrokerError> {
        let connection = Connection::connect(amqp_uri, ConnectionProperties::default())
            .await
            .map_err(|e| BrokerError::ConnectionFailed(e.to_string()))?;
        let channel = connection
            .create_channel()
            .await
            .map_err(|e| BrokerError::Channel(e.to_string()))?;

        let app_namespace = app_namespace.into();
        let exchange = events_exchange_name(&app_namespace);
        channel
            .exchange_declare(
                &exchange,
                ExchangeKind::Topic,
                ExchangeDeclareOptions {
                    durable: true,
                    ..ExchangeDeclareOptions::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| BrokerError::Channel(e.to_string()))?;

        tracing::info!(exchange = %exchange, "declared events exchange");

        Ok(Self {
            connection,
            channel,
            app_namespace,
            consumer_tag: consumer_tag.into(),
            bus_id: Uuid::new_v4(),
            state: StateCell::new(),
            typed: Mutex::new(HashMap::new()),
            local: Mutex::new(Vec::new()),
            consumer_task: Mutex::new(None),
        })
    }

    /// Declare this instance's durable queue, bind it to the exchange for
    /// every routing key, and spawn the consumer task. Moves the bus to
    /// [`BrokerState::Running`].
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::Channel`] if the queue cannot be declared or
    /// bound, or [`BrokerError::NotRunning`] if called more than once.
    pub async fn start(self: &Arc<Self>) -> Result<(), BrokerError> {
        if self.state.get() != BrokerState::Init {
            return Err(BrokerError::NotRunning(self.state.get()));
        }

        let exchange = events_exchange_name(&self.app_namespace);
        let queue = events_queue_name(&self.app_namespace, &self.consumer_tag);

        self.channel
            .queue_declare(
                &queue,
                QueueDeclareOptions {
                    durable: true,
                    ..QueueDeclareOptions::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| BrokerError::Channel(e.to_string()))?;

        self.channel
            .queue_bind(
                &queue,
                &exchange,
                "#",
                QueueBindOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(|e| BrokerError::Channel(e.to_string()))?;

        let mut consumer = self
            .channel
            .basic_consume(
                &queue,
                &self.consumer_tag,
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(|e| BrokerError::Channel(e.to_string()))?;

        let bus = Arc::clone(self);
        let task = tokio::spawn(async move {
            use futures::StreamExt;

            while let Some(delivery) = consumer.next().await {
                let delivery = match delivery {
                    Ok(delivery) => delivery,
                    Err(error) => {
                        tracing::error!(%error, "amqp consumer error");
                        continue;
                    }
                };

                let record: Result<EventRecord, _> = serde_json::from_slice(&delivery.data);
                let outcome = match record {
                    Ok(record) => bus.dispatch(&record).await,
                    Err(error) => {
                        tracing::warn!(%error, "dropping malformed event payload");
                        Err(EventBusError::DeserializationFailed(error.to_string()))
                    }
                };

                let ack_result = if outcome.is_ok() {
                    delivery.ack(BasicAckOptions::default()).await
                } else {
                    delivery
                        .reject(BasicRejectOptions { requeue: false })
                        .await
                };

                if let Err(error) = ack_result {
                    tracing::error!(%error, "failed to ack/reject delivery");
                }
            }
        });

        *self.consumer_task.lock() = Some(task);
        self.state.start();
        tracing::info!(queue = %queue, "amqp event bus running");
        Ok(())
    }

    /// Cancel the consumer task and move the bus through `Closing` to
    /// `Closed`.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::AlreadyClosed`] if called more than once.
    pub async fn close(&self) -> Result<(), BrokerError> {
        if self.state.get() == BrokerState::Closed {
            return Err(BrokerError::AlreadyClosed);
        }
        self.state.begin_close();
        let task = self.consumer_task.lock().take();
        if let Some(task) = task {
            task.abort();
            let _ = task.await;
        }
        self.state.finish_close();
        Ok(())
    }

    /// `true` if `record` was published by this bus instance rather than a
    /// peer, per the `_origin_bus_id` metadata key stamped in
    /// [`EventBus::publish_event`].
    fn is_self_delivery(&self, record: &EventRecord) -> bool {
        origin_bus_id(record) == Some(self.bus_id)
    }

    /// Dispatch a wire delivery to the typed and global tiers only — local
    /// handlers are delivered directly inside `publish_event` and never
    /// reach this path, wire-delivered or not.
    async fn dispatch(&self, record: &EventRecord) -> Result<(), EventBusError> {
        if self.is_self_delivery(record) {
            tracing::debug!(
                event_type = %record.event_type,
                bus_id = %self.bus_id,
                "dropping self-delivered event"
            );
            return Ok(());
        }

        let mut handlers: Vec<Arc<dyn EventHandler>> = Vec::new();
        {
            let typed = self.typed.lock();
            if let Some(matching) = typed.get(record.event_type.as_str()) {
                handlers.extend(matching.iter().cloned());
            }
        }
        handlers.extend(GLOBAL_HANDLERS.lock().iter().cloned());

        for handler in handlers {
            handler.handle_event(record).await?;
        }
        Ok(())
    }
}

impl EventBus for AmqpEventBus {
    fn publish_event(
        &self,
        event: EventRecord,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + '_>> {
        Box::pin(async move {
            if self.state.get() == BrokerState::Closed {
                return Err(BrokerError::NotRunning(self.state.get()).into());
            }

            // Local handlers run synchronously here, not over the wire:
            // they must see this event exactly once, and never again on the
            // inbound `dispatch` path once it comes back through the
            // `"#"`-bound queue.
            let local_handlers: Vec<Arc<dyn EventHandler>> = self.local.lock().iter().cloned().collect();
            for handler in &local_handlers {
                if let Err(error) = handler.handle_event(&event).await {
                    tracing::warn!(
                        event_type = %event.event_type,
                        %error,
                        "local event handler returned an error"
                    );
                }
            }

            let mut event = event;
            let mut metadata = event.metadata.take().unwrap_or_else(|| serde_json::json!({}));
            if let Some(object) = metadata.as_object_mut() {
                object.insert(
                    ORIGIN_BUS_ID_KEY.to_string(),
                    serde_json::Value::String(self.bus_id.to_string()),
                );
            }
            event.metadata = Some(metadata);

            let payload = serde_json::to_vec(&event).map_err(|e| EventBusError::PublishFailed {
                event_type: event.event_type.clone(),
                reason: e.to_string(),
            })?;
            let exchange = events_exchange_name(&self.app_namespace);
            let routing_key = event.event_type.clone();

            let confirm = self
                .channel
                .basic_publish(
                    &exchange,
                    &routing_key,
                    BasicPublishOptions::default(),
                    &payload,
                    BasicProperties::default().with_delivery_mode(2),
                )
                .await
                .map_err(|e| EventBusError::PublishFailed {
                    event_type: event.event_type.clone(),
                    reason: e.to_string(),
                })?;

            confirm.await.map_err(|e| EventBusError::PublishFailed {
                event_type: event.event_type.clone(),
                reason: e.to_string(),
            })?;

            tracing::debug!(event_type = %event.event_type, "published event");
            Ok(())
        })
    }

    fn add_typed_handler(
        &self,
        event_type: &'static str,
        handler: Arc<dyn EventHandler>,
    ) -> Result<(), EventBusError> {
        register_unique(self.typed.lock().entry(event_type).or_default(), handler);
        Ok(())
    }

    fn add_local_handler(&self, handler: Arc<dyn EventHandler>) -> Result<(), EventBusError> {
        register_unique(&mut self.local.lock(), handler);
        Ok(())
    }

    fn add_global_handler(&self, handler: Arc<dyn EventHandler>) -> Result<(), EventBusError> {
        register_unique(&mut GLOBAL_HANDLERS.lock(), handler);
        Ok(())
    }
}
