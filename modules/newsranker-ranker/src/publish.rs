use async_trait::async_trait;

use newsranker_broker::Broker;
use newsranker_common::ScrapeTarget;

/// Seam for handing scrape requests to the downstream scraper.
#[async_trait]
pub trait ScrapePublisher: Send + Sync {
    async fn publish(&self, target: &ScrapeTarget) -> anyhow::Result<()>;
}

/// Publishes scrape targets onto the configured scrape queue.
pub struct BrokerScrapePublisher {
    broker: Broker,
    scrape_queue: String,
}

impl BrokerScrapePublisher {
    pub fn new(broker: Broker, scrape_queue: String) -> Self {
        Self {
            broker,
            scrape_queue,
        }
    }
}

#[async_trait]
impl ScrapePublisher for BrokerScrapePublisher {
    async fn publish(&self, target: &ScrapeTarget) -> anyhow::Result<()> {
        self.broker.publish(&self.scrape_queue, target).await?;
        Ok(())
    }
}
