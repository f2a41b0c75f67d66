//! Thin AMQP client for the ranker: JSON publishing, pull-mode consuming with
//! per-message ack/reject, and a connectivity probe for the liveness loop.

pub mod error;

pub use error::{BrokerError, Result};

use std::time::Duration;

use amqprs::callbacks::{DefaultChannelCallback, DefaultConnectionCallback};
use amqprs::channel::{
    BasicAckArguments, BasicConsumeArguments, BasicPublishArguments, BasicRejectArguments,
    Channel, ConsumerMessage, ExchangeDeclareArguments, QueueBindArguments, QueueDeclareArguments,
};
use amqprs::connection::{Connection, OpenConnectionArguments};
use amqprs::BasicProperties;
use serde::Serialize;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::warn;

/// Shared broker client. Cheap to clone; publishing goes through one channel,
/// each subscription gets its own.
#[derive(Clone)]
pub struct Broker {
    connection: Connection,
    channel: Channel,
    exchange: String,
}

/// A message pulled off a queue, awaiting explicit settlement.
pub struct Delivery {
    pub delivery_tag: u64,
    pub body: Vec<u8>,
}

/// A per-queue consumer stream. Messages are settled through the same channel
/// they were delivered on.
pub struct Subscription {
    channel: Channel,
    consumer_tag: String,
    receiver: UnboundedReceiver<ConsumerMessage>,
}

impl Broker {
    /// Connect to the broker, declare the exchange and bind the given queues.
    /// The health target is probed once so a misconfigured broker fails at
    /// startup instead of on the first publish.
    pub async fn connect(
        host: &str,
        port: u16,
        user: &str,
        password: &str,
        exchange: &str,
        queues: &[&str],
        health_target: &str,
    ) -> Result<Self> {
        probe_health_target(health_target).await?;

        let connection =
            Connection::open(&OpenConnectionArguments::new(host, port, user, password))
                .await
                .map_err(BrokerError::Connect)?;
        connection
            .register_callback(DefaultConnectionCallback)
            .await
            .map_err(BrokerError::Connect)?;

        let channel = connection
            .open_channel(None)
            .await
            .map_err(BrokerError::Channel)?;
        channel
            .register_callback(DefaultChannelCallback)
            .await
            .map_err(BrokerError::Channel)?;

        let mut exchange_args = ExchangeDeclareArguments::new(exchange, "direct");
        exchange_args.durable(true);
        channel
            .exchange_declare(exchange_args)
            .await
            .map_err(BrokerError::Channel)?;

        for queue in queues {
            channel
                .queue_declare(QueueDeclareArguments::durable_client_named(queue))
                .await
                .map_err(BrokerError::Channel)?;
            channel
                .queue_bind(QueueBindArguments::new(queue, exchange, queue))
                .await
                .map_err(BrokerError::Channel)?;
        }

        Ok(Self {
            connection,
            channel,
            exchange: exchange.to_string(),
        })
    }

    /// Publish a JSON payload to a queue through the configured exchange.
    pub async fn publish<T: Serialize>(&self, routing_key: &str, payload: &T) -> Result<()> {
        let body = serde_json::to_vec(payload).map_err(|e| BrokerError::Publish(e.to_string()))?;
        let properties = BasicProperties::default()
            .with_content_type("application/json")
            .with_delivery_mode(2)
            .finish();

        self.channel
            .basic_publish(
                properties,
                body,
                BasicPublishArguments::new(&self.exchange, routing_key),
            )
            .await
            .map_err(|e| BrokerError::Publish(e.to_string()))?;
        Ok(())
    }

    /// Start a pull-mode consumer on a queue with the given consumer identity.
    pub async fn subscribe(&self, queue: &str, consumer_tag: &str) -> Result<Subscription> {
        let channel = self
            .connection
            .open_channel(None)
            .await
            .map_err(BrokerError::Channel)?;
        channel
            .register_callback(DefaultChannelCallback)
            .await
            .map_err(BrokerError::Channel)?;

        let (_, receiver) = channel
            .basic_consume_rx(BasicConsumeArguments::new(queue, consumer_tag))
            .await
            .map_err(BrokerError::Consume)?;

        Ok(Subscription {
            channel,
            consumer_tag: consumer_tag.to_string(),
            receiver,
        })
    }

    /// Whether the underlying connection is currently open.
    pub fn connected(&self) -> bool {
        self.connection.is_open()
    }

    /// Close the channel and connection. Failures are logged, not surfaced.
    pub async fn close(self) {
        if let Err(err) = self.channel.close().await {
            warn!(%err, "closing broker channel failed");
        }
        if let Err(err) = self.connection.close().await {
            warn!(%err, "closing broker connection failed");
        }
    }
}

impl Subscription {
    /// Next delivery on this queue, or `None` when the stream closes.
    /// Frames without a body are skipped.
    pub async fn next(&mut self) -> Option<Delivery> {
        while let Some(message) = self.receiver.recv().await {
            match (message.deliver, message.content) {
                (Some(deliver), Some(content)) => {
                    return Some(Delivery {
                        delivery_tag: deliver.delivery_tag(),
                        body: content,
                    });
                }
                _ => continue,
            }
        }
        None
    }

    pub async fn ack(&self, delivery_tag: u64) -> Result<()> {
        self.channel
            .basic_ack(BasicAckArguments::new(delivery_tag, false))
            .await
            .map_err(BrokerError::Consume)?;
        Ok(())
    }

    pub async fn reject(&self, delivery_tag: u64) -> Result<()> {
        self.channel
            .basic_reject(BasicRejectArguments::new(delivery_tag, false))
            .await
            .map_err(BrokerError::Consume)?;
        Ok(())
    }

    pub fn consumer_tag(&self) -> &str {
        &self.consumer_tag
    }
}

async fn probe_health_target(health_target: &str) -> Result<()> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .map_err(|e| BrokerError::HealthProbe(e.to_string()))?;

    let response = client
        .get(health_target)
        .send()
        .await
        .map_err(|e| BrokerError::HealthProbe(e.to_string()))?;

    if !response.status().is_success() {
        return Err(BrokerError::HealthProbe(format!(
            "unexpected status {} from {health_target}",
            response.status()
        )));
    }
    Ok(())
}
