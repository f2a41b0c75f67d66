//! Handles scraped-article events: merge the referer into stored state,
//! rescore, persist the whole payload transactionally, then re-cluster.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use tracing::{error, info};

use newsranker_common::{Referer, ScrapedArticle};
use newsranker_domain::reference_score;
use newsranker_store::ArticleStore;

use crate::handlers::Clusterer;
use crate::subscriptions::MessageHandler;

pub struct ScrapedHandler {
    twitter_users: f64,
    reference_weight: f64,
    articles: Arc<dyn ArticleStore>,
    clusterer: Arc<Clusterer>,
}

impl ScrapedHandler {
    pub fn new(
        twitter_users: f64,
        reference_weight: f64,
        articles: Arc<dyn ArticleStore>,
        clusterer: Arc<Clusterer>,
    ) -> Self {
        Self {
            twitter_users,
            reference_weight,
            articles,
            clusterer,
        }
    }
}

/// Dedup the incoming referer against the stored set by external author.
fn merge_referers(stored: &[Referer], incoming: &Referer) -> Vec<Referer> {
    let mut merged = stored.to_vec();
    if stored.iter().any(|r| r.external_id == incoming.external_id) {
        return merged;
    }
    merged.push(incoming.clone());
    merged
}

#[async_trait]
impl MessageHandler for ScrapedHandler {
    async fn handle(&self, body: &[u8], msg_id: &str) -> anyhow::Result<()> {
        let mut scraped: ScrapedArticle =
            serde_json::from_slice(body).context("parsing scraped article")?;
        info!(msg_id, article_id = %scraped.article.id, "incoming scraped article");

        // Without the stored referers the score cannot be computed; the
        // message is still acknowledged, storage is best-effort.
        let referers = match self.articles.find_referers(&scraped.article.id).await {
            Ok(referers) => referers,
            Err(err) => {
                error!(msg_id, article_id = %scraped.article.id, %err, "loading stored referers failed");
                return Ok(());
            }
        };

        let merged = merge_referers(&referers, &scraped.referer);
        scraped.article.reference_score =
            reference_score(self.twitter_users, self.reference_weight, &merged);

        // The message already had its best-effort attempt; redelivering a
        // failing transaction would not help, so the failure is only logged.
        if let Err(err) = self.articles.save_scraped(&scraped).await {
            error!(msg_id, article_id = %scraped.article.id, %err, "storing scraped article failed");
            return Ok(());
        }

        self.clusterer.cluster_article(&scraped.article).await;
        info!(msg_id, article_id = %scraped.article.id, "scraped article handled");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::merge_referers;
    use newsranker_common::Referer;

    fn referer(external_id: &str) -> Referer {
        Referer {
            external_id: external_id.to_string(),
            follower_count: 1000,
            ..Default::default()
        }
    }

    #[test]
    fn merge_appends_unknown_author() {
        let stored = vec![referer("e-0"), referer("e-1")];
        let merged = merge_referers(&stored, &referer("e-2"));
        assert_eq!(merged.len(), 3);
    }

    #[test]
    fn merge_skips_known_author() {
        let stored = vec![referer("e-0"), referer("e-1")];
        let merged = merge_referers(&stored, &referer("e-1"));
        assert_eq!(merged, stored);
    }
}
