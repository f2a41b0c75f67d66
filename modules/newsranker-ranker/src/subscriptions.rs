//! The subscription runtime: one serial consume loop per queue, each message
//! settled with exactly one ack or reject.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info};

use newsranker_broker::{Broker, Subscription};
use newsranker_common::{id, SERVICE_NAME};

/// A queue-specific message handler. Returning an error rejects the message.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, body: &[u8], msg_id: &str) -> anyhow::Result<()>;
}

/// Settlement seam, so the ack/reject discipline is testable without a broker.
#[async_trait]
pub trait Acknowledger: Send + Sync {
    async fn ack(&self, delivery_tag: u64) -> anyhow::Result<()>;
    async fn reject(&self, delivery_tag: u64) -> anyhow::Result<()>;
}

#[async_trait]
impl Acknowledger for Subscription {
    async fn ack(&self, delivery_tag: u64) -> anyhow::Result<()> {
        Subscription::ack(self, delivery_tag).await?;
        Ok(())
    }

    async fn reject(&self, delivery_tag: u64) -> anyhow::Result<()> {
        Subscription::reject(self, delivery_tag).await?;
        Ok(())
    }
}

/// Consume a queue until its stream closes. Messages are processed strictly
/// serially; each one is settled exactly once.
pub async fn run_subscription(broker: Broker, queue: String, handler: Arc<dyn MessageHandler>) {
    let consumer_tag = format!("{SERVICE_NAME}-{}", id::mint());
    let mut subscription = match broker.subscribe(&queue, &consumer_tag).await {
        Ok(subscription) => subscription,
        Err(err) => {
            error!(%queue, %err, "subscribing failed");
            return;
        }
    };
    info!(%queue, %consumer_tag, "subscription started");

    while let Some(delivery) = subscription.next().await {
        let msg_id = id::mint();
        let result = handler.handle(&delivery.body, &msg_id).await;
        if let Err(ref err) = result {
            error!(%queue, msg_id = %msg_id, %err, "message handling failed");
        }
        settle_message(&subscription, delivery.delivery_tag, &result).await;
    }

    info!(%queue, "subscription stream closed");
}

/// Ack on success, reject on error. Settle failures are logged, never retried.
pub async fn settle_message(
    acker: &dyn Acknowledger,
    delivery_tag: u64,
    result: &anyhow::Result<()>,
) {
    let outcome = match result {
        Ok(()) => acker.ack(delivery_tag).await,
        Err(_) => acker.reject(delivery_tag).await,
    };
    if let Err(err) = outcome {
        error!(delivery_tag, %err, "settling message failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingAcker {
        acked: Mutex<Vec<u64>>,
        rejected: Mutex<Vec<u64>>,
        fail: bool,
    }

    #[async_trait]
    impl Acknowledger for RecordingAcker {
        async fn ack(&self, delivery_tag: u64) -> anyhow::Result<()> {
            self.acked.lock().unwrap().push(delivery_tag);
            if self.fail {
                anyhow::bail!("ack failed");
            }
            Ok(())
        }

        async fn reject(&self, delivery_tag: u64) -> anyhow::Result<()> {
            self.rejected.lock().unwrap().push(delivery_tag);
            if self.fail {
                anyhow::bail!("reject failed");
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn success_acks_exactly_once() {
        let acker = RecordingAcker::default();
        settle_message(&acker, 7, &Ok(())).await;

        assert_eq!(*acker.acked.lock().unwrap(), vec![7]);
        assert!(acker.rejected.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn error_rejects_exactly_once() {
        let acker = RecordingAcker::default();
        settle_message(&acker, 7, &Err(anyhow::anyhow!("handler failed"))).await;

        assert_eq!(*acker.rejected.lock().unwrap(), vec![7]);
        assert!(acker.acked.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn settle_failure_is_not_retried() {
        let acker = RecordingAcker {
            fail: true,
            ..Default::default()
        };
        settle_message(&acker, 7, &Ok(())).await;

        assert_eq!(acker.acked.lock().unwrap().len(), 1);
        assert!(acker.rejected.lock().unwrap().is_empty());
    }
}
