//! [`CommandBus`] backed by a direct AMQP exchange: one durable queue per
//! consumer tag, one routing key per command type.

use crate::error::BrokerError;
use crate::state::{BrokerState, StateCell};
use ironhorizon_core::command::{Command, CommandFactory};
use ironhorizon_core::command_bus::{
    commands_exchange_name, commands_queue_name, CommandBus, CommandBusError, CommandHandler,
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
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Commands routed one-to-one via a direct exchange: each `command_type`
/// is both the routing key and the binding key for exactly one handler.
///
/// `publish_command` is fire-and-forget: publish to the exchange and
/// return, leaving delivery to the consumer task spawned by
/// [`AmqpCommandBus::start`]. `handle_command` is the consumer's own
/// entry point — it also serves as the direct, synchronous call path for
/// code that already holds the command bus and wants to await the
/// result, matching the contract `CommandBus::handle_command` documents.
pub struct AmqpCommandBus {
    #[allow(dead_code)]
    connection: Connection,
    channel: Channel,
    app_namespace: String,
    consumer_tag: String,
    state: StateCell,
    handlers: Mutex<HashMap<&'static str, Arc<dyn CommandHandler>>>,
    factories: Mutex<HashMap<&'static str, CommandFactory>>,
    consumer_task: Mutex<Option<JoinHandle<()>>>,
}

impl AmqpCommandBus {
    /// Connect to `amqp_uri` and declare the durable direct exchange for
    /// `app_namespace`'s commands.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::ConnectionFailed`] or [`BrokerError::Channel`].
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
        let exchange = commands_exchange_name(&app_namespace);
        channel
            .exchange_declare(
                &exchange,
                ExchangeKind::Direct,
                ExchangeDeclareOptions {
                    durable: true,
                    ..ExchangeDeclareOptions::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| BrokerError::Channel(e.to_string()))?;

        tracing::info!(exchange = %exchange, "declared commands exchange");

        Ok(Self {
            connection,
            channel,
            app_namespace,
            consumer_tag: consumer_tag.into(),
            state: StateCell::new(),
            handlers: Mutex::new(HashMap::new()),
            factories: Mutex::new(HashMap::new()),
            consumer_task: Mutex::new(None),
        })
    }

    /// Register the decoder used to reconstruct a `command_type` from its
    /// wire payload, for commands arriving via [`Self::start`]'s consumer
    /// task rather than a direct in-process [`Self::handle_command`] call.
    pub fn register_command_type(&self, command_type: &'static str, factory: CommandFactory) {
        self.factories.lock().insert(command_type, factory);
    }

    /// Declare this consumer's queue, bind it for every registered
    /// handler's command type, and spawn the consumer task.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::Channel`] if the queue cannot be declared or
    /// bound, or [`BrokerError::NotRunning`] if called more than once.
    pub async fn start(self: &Arc<Self>) -> Result<(), BrokerError> {
        if self.state.get() != BrokerState::Init {
            return Err(BrokerError::NotRunning(self.state.get()));
        }

        let exchange = commands_exchange_name(&self.app_namespace);
        let queue = commands_queue_name(&self.app_namespace, &self.consumer_tag);

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

        for command_type in self.handlers.lock().keys() {
            self.channel
                .queue_bind(
                    &queue,
                    &exchange,
                    command_type,
                    QueueBindOptions::default(),
                    FieldTable::default(),
                )
                .await
                .map_err(|e| BrokerError::Channel(e.to_string()))?;
        }

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

                let outcome = bus.decode_and_handle(&delivery.routing_key.to_string(), &delivery.data).await;

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
        tracing::info!(queue = %queue, "amqp command bus running");
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

    async fn decode_and_handle(&self, command_type: &str, payload: &[u8]) -> Result<(), CommandBusError> {
        let factory = {
            let factories = self.factories.lock();
            *factories
                .get(command_type)
                .ok_or_else(|| CommandBusError::HandlerNotFound(command_type.to_string()))?
        };

        let value: serde_json::Value = serde_json::from_slice(payload)
            .map_err(|e| CommandBusError::TransportError(e.to_string()))?;
        let command = factory(value).map_err(|e| CommandBusError::TransportError(e.to_string()))?;

        self.handle_command(command).await
    }
}

impl CommandBus for AmqpCommandBus {
    fn set_handler(
        &self,
        command_type: &'static str,
        handler: Arc<dyn CommandHandler>,
    ) -> Result<(), CommandBusError> {
        let mut handlers = self.handlers.lock();
        if handlers.contains_key(command_type) {
            return Err(CommandBusError::HandlerAlreadySet(command_type.to_string()));
        }
        handlers.insert(command_type, handler);
        Ok(())
    }

    fn handle_command(
        &self,
        command: Box<dyn Command>,
    ) -> Pin<Box<dyn Future<Output = Result<(), CommandBusError>> + Send + '_>> {
        Box::pin(async move {
            let handler = {
                let handlers = self.handlers.lock();
                handlers
                    .get(command.command_type())
                    .ok_or_else(|| {
                        CommandBusError::HandlerNotFound(command.command_type().to_string())
                    })?
                    .clone()
            };
            handler.handle_command(command.as_ref()).await
        })
    }

    fn publish_command(
        &self,
        command: Box<dyn Command>,
    ) -> Pin<Box<dyn Future<Output = Result<(), CommandBusError>> + Send + '_>> {
        Box::pin(async move {
            if self.state.get() == BrokerState::Closed {
                return Err(BrokerError::NotRunning(self.state.get()).into());
            }

            let command_type = command.command_type();
            let payload = command
                .to_json()
                .map_err(|e| CommandBusError::PublishFailed {
                    command_type: command_type.to_string(),
                    reason: e.to_string(),
                })?;
            let bytes = serde_json::to_vec(&payload).map_err(|e| CommandBusError::PublishFailed {
                command_type: command_type.to_string(),
                reason: e.to_string(),
            })?;

            let exchange = commands_exchange_name(&self.app_namespace);
            let confirm = self
                .channel
                .basic_publish(
                    &exchange,
                    command_type,
                    BasicPublishOptions::default(),
                    &bytes,
                    BasicProperties::default().with_delivery_mode(2),
                )
                .await
                .map_err(|e| CommandBusError::PublishFailed {
                    command_type: command_type.to_string(),
                    reason: e.to_string(),
                })?;

            confirm.await.map_err(|e| CommandBusError::PublishFailed {
                command_type: command_type.to_string(),
                reason: e.to_string(),
            })?;

            tracing::debug!(command_type, "published command");
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bus_state_starts_at_init() {
        assert_eq!(StateCell::new().get(), BrokerState::Init);
    }
}
