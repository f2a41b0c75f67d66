//! Handles rank events: unseen URLs are sent to the scraper, known articles
//! are classified against stored state and routed by update kind.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use tracing::{info, warn};

use newsranker_common::{Article, RankObject, ScrapeTarget};
use newsranker_domain::update::{adopt_referer, adopt_subjects};
use newsranker_domain::{classify, reference_score, ArticleUpdate, UpdateKind};
use newsranker_store::{ArticleStore, StoreError};

use crate::handlers::Clusterer;
use crate::publish::ScrapePublisher;
use crate::subscriptions::MessageHandler;

pub struct RankHandler {
    twitter_users: f64,
    reference_weight: f64,
    articles: Arc<dyn ArticleStore>,
    publisher: Arc<dyn ScrapePublisher>,
    clusterer: Arc<Clusterer>,
}

impl RankHandler {
    pub fn new(
        twitter_users: f64,
        reference_weight: f64,
        articles: Arc<dyn ArticleStore>,
        publisher: Arc<dyn ScrapePublisher>,
        clusterer: Arc<Clusterer>,
    ) -> Self {
        Self {
            twitter_users,
            reference_weight,
            articles,
            publisher,
            clusterer,
        }
    }

    /// One URL in the batch. Failures here are logged and never abort the
    /// remaining URLs.
    async fn rank_url(&self, url: &str, rank_object: &RankObject) {
        match self.articles.find_by_url(url).await {
            Ok(article) => self.rank_existing_article(article, rank_object).await,
            Err(StoreError::NoSuchArticle) => self.rank_new_article(url, rank_object).await,
            Err(err) => warn!(%url, %err, "looking up article failed"),
        }
    }

    /// The article is not stored yet: request a scrape. Persistence happens
    /// when the scraped payload comes back.
    async fn rank_new_article(&self, url: &str, rank_object: &RankObject) {
        let article = Article::with_url(url);
        let target = ScrapeTarget {
            url: article.url.clone(),
            subjects: adopt_subjects(&rank_object.subjects, &article.id),
            referer: adopt_referer(&rank_object.referer, &article.id),
            title: String::new(),
            body: String::new(),
            article_id: article.id.clone(),
        };

        if let Err(err) = self.publisher.publish(&target).await {
            warn!(%url, %err, "publishing scrape target failed");
        }
    }

    async fn rank_existing_article(&self, article: Article, rank_object: &RankObject) {
        let update = match self.article_update(&article, rank_object).await {
            Ok(update) => update,
            Err(err) => {
                warn!(article_id = %article.id, %err, "assembling article update failed");
                return;
            }
        };

        match update.kind {
            UpdateKind::NewSubjects | UpdateKind::NewSubjectsAndReferences => {
                self.rank_with_new_subjects(update).await;
            }
            UpdateKind::NewReferences => self.rank_with_new_references(update).await,
            UpdateKind::NoUpdate => {
                info!(kind = %update.kind, article_id = %article.id, "taking no action on update");
            }
        }
    }

    /// New subjects mean stale content: the scraper produces fresh body and
    /// subjects, closing the loop through the scraped queue.
    async fn rank_with_new_subjects(&self, update: ArticleUpdate) {
        let target = update.to_scrape_target();
        if let Err(err) = self.publisher.publish(&target).await {
            warn!(article_id = %update.article.id, %err, "publishing scrape target failed");
        }
    }

    async fn rank_with_new_references(&self, mut update: ArticleUpdate) {
        update.article.reference_score =
            reference_score(self.twitter_users, self.reference_weight, &update.referers);

        if let Err(err) = self.articles.update_article(&update.article).await {
            warn!(article_id = %update.article.id, %err, "rescoring article failed");
            return;
        }

        if let Err(err) = self.articles.save_referer(&update.new_referer).await {
            warn!(article_id = %update.article.id, %err, "saving new referer failed");
            return;
        }

        self.clusterer.cluster_article(&update.article).await;
    }

    async fn article_update(
        &self,
        article: &Article,
        rank_object: &RankObject,
    ) -> Result<ArticleUpdate, StoreError> {
        let subjects = self.articles.find_subjects(&article.id).await?;
        let referers = self.articles.find_referers(&article.id).await?;

        Ok(classify(
            article,
            &subjects,
            &rank_object.subjects,
            &referers,
            &rank_object.referer,
        ))
    }
}

#[async_trait]
impl MessageHandler for RankHandler {
    async fn handle(&self, body: &[u8], msg_id: &str) -> anyhow::Result<()> {
        let rank_object: RankObject =
            serde_json::from_slice(body).context("parsing rank object")?;
        info!(msg_id, urls = rank_object.urls.len(), "incoming rank object");

        for url in &rank_object.urls {
            self.rank_url(url, &rank_object).await;
        }
        Ok(())
    }
}
