use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use newsranker_broker::Broker;
use newsranker_common::{Config, SERVICE_NAME};
use newsranker_ranker::handlers::{Clusterer, RankHandler, ScrapedHandler};
use newsranker_ranker::subscriptions::run_subscription;
use newsranker_ranker::{health, BrokerScrapePublisher, ScrapePublisher};
use newsranker_store::{ArticleStore, ClusterStore, PgArticleStore, PgClusterStore};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!(service = SERVICE_NAME, "starting news ranker");

    let config = Config::from_env();
    config.log_redacted();

    let pool = newsranker_store::connect(&config.database_url).await?;
    newsranker_store::migrate(&pool).await?;
    info!("database connected, migrations complete");

    let queues = [
        config.mq.scrape_queue.as_str(),
        config.mq.scraped_queue.as_str(),
        config.mq.rank_queue.as_str(),
    ];
    let broker = Broker::connect(
        &config.mq.host,
        config.mq.port,
        &config.mq.user,
        &config.mq.password,
        &config.mq.exchange,
        &queues,
        &config.mq.health_target,
    )
    .await?;
    info!("broker connected");

    let articles: Arc<dyn ArticleStore> = Arc::new(PgArticleStore::new(pool.clone()));
    let clusters: Arc<dyn ClusterStore> = Arc::new(PgClusterStore::new(pool.clone()));
    let clusterer = Arc::new(Clusterer::new(articles.clone(), clusters));
    let publisher: Arc<dyn ScrapePublisher> = Arc::new(BrokerScrapePublisher::new(
        broker.clone(),
        config.mq.scrape_queue.clone(),
    ));

    let rank_handler = Arc::new(RankHandler::new(
        config.twitter_users,
        config.reference_weight,
        articles.clone(),
        publisher,
        clusterer.clone(),
    ));
    let scraped_handler = Arc::new(ScrapedHandler::new(
        config.twitter_users,
        config.reference_weight,
        articles,
        clusterer,
    ));

    let rank_task = tokio::spawn(run_subscription(
        broker.clone(),
        config.mq.rank_queue.clone(),
        rank_handler,
    ));
    let scraped_task = tokio::spawn(run_subscription(
        broker.clone(),
        config.mq.scraped_queue.clone(),
        scraped_handler,
    ));
    let health_task = tokio::spawn(health::run(
        pool.clone(),
        broker.clone(),
        config.heartbeat_file.clone(),
        config.heartbeat_interval,
    ));

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");

    health_task.abort();

    // Closing the connection ends both subscription streams; the loops get to
    // finish their in-flight message before the streams drain.
    broker.close().await;
    let _ = tokio::time::timeout(Duration::from_secs(5), rank_task).await;
    let _ = tokio::time::timeout(Duration::from_secs(5), scraped_task).await;

    pool.close().await;
    info!("news ranker stopped");
    Ok(())
}
