use std::env;

/// Name the service identifies itself with towards the broker and in logs.
pub const SERVICE_NAME: &str = "news-ranker";

/// Broker connection and queue bindings.
#[derive(Debug, Clone)]
pub struct MqConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub exchange: String,
    pub scrape_queue: String,
    pub scraped_queue: String,
    pub rank_queue: String,
    /// URL probed once at connect time to verify the broker is reachable.
    pub health_target: String,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub mq: MqConfig,
    pub database_url: String,
    /// Denominator of the reference score.
    pub twitter_users: f64,
    /// Multiplier of the reference score.
    pub reference_weight: f64,
    pub heartbeat_file: String,
    /// Seconds between liveness probes.
    pub heartbeat_interval: u64,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing or malformed.
    pub fn from_env() -> Self {
        Self {
            mq: MqConfig {
                host: required_env("MQ_HOST"),
                port: env::var("MQ_PORT")
                    .unwrap_or_else(|_| "5672".to_string())
                    .parse()
                    .expect("MQ_PORT must be a number"),
                user: required_env("MQ_USER"),
                password: required_env("MQ_PASSWORD"),
                exchange: required_env("MQ_EXCHANGE"),
                scrape_queue: required_env("MQ_SCRAPE_QUEUE"),
                scraped_queue: required_env("MQ_SCRAPED_QUEUE"),
                rank_queue: required_env("MQ_RANK_QUEUE"),
                health_target: required_env("MQ_HEALTH_TARGET"),
            },
            database_url: required_env("DATABASE_URL"),
            twitter_users: parsed_env("TWITTER_USERS", 320_000_000.0),
            reference_weight: parsed_env("REFERENCE_WEIGHT", 1_000.0),
            heartbeat_file: required_env("HEARTBEAT_FILE"),
            heartbeat_interval: parsed_env("HEARTBEAT_INTERVAL", 20),
        }
    }

    /// Log the non-secret parts of the configuration.
    pub fn log_redacted(&self) {
        tracing::info!(
            mq_host = %self.mq.host,
            mq_port = self.mq.port,
            exchange = %self.mq.exchange,
            rank_queue = %self.mq.rank_queue,
            scraped_queue = %self.mq.scraped_queue,
            scrape_queue = %self.mq.scrape_queue,
            twitter_users = self.twitter_users,
            reference_weight = self.reference_weight,
            heartbeat_file = %self.heartbeat_file,
            heartbeat_interval = self.heartbeat_interval,
            "configuration loaded"
        );
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("Missing required env var: {key}"))
}

fn parsed_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|_| panic!("{key} must be a number, got: {raw}")),
        Err(_) => default,
    }
}
