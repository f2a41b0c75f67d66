use thiserror::Error;

pub type Result<T> = std::result::Result<T, BrokerError>;

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("connecting to broker failed: {0}")]
    Connect(amqprs::error::Error),

    #[error("broker channel setup failed: {0}")]
    Channel(amqprs::error::Error),

    #[error("publishing message failed: {0}")]
    Publish(String),

    #[error("consuming from queue failed: {0}")]
    Consume(amqprs::error::Error),

    #[error("broker health probe failed: {0}")]
    HealthProbe(String),
}
