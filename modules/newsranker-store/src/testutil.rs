//! Recording in-memory doubles for the store traits. Canned return values,
//! one-shot error injection, and recorded call arguments.

use std::sync::Mutex;

use async_trait::async_trait;

use newsranker_common::{Article, Referer, ScrapedArticle, Subject};
use newsranker_domain::ArticleCluster;

use crate::{ArticleStore, ClusterStore, StoreError};

#[derive(Default)]
pub struct RecordingArticleStore {
    pub article_by_url: Mutex<Option<Article>>,
    pub find_by_url_err: Mutex<Option<StoreError>>,
    pub find_by_url_args: Mutex<Vec<String>>,

    pub subjects: Mutex<Vec<Subject>>,
    pub find_subjects_err: Mutex<Option<StoreError>>,
    pub find_subjects_args: Mutex<Vec<String>>,

    pub referers: Mutex<Vec<Referer>>,
    pub find_referers_err: Mutex<Option<StoreError>>,
    pub find_referers_args: Mutex<Vec<String>>,

    pub updated_articles: Mutex<Vec<Article>>,
    pub update_article_err: Mutex<Option<StoreError>>,

    pub saved_referers: Mutex<Vec<Referer>>,
    pub save_referer_err: Mutex<Option<StoreError>>,

    pub saved_scraped: Mutex<Vec<ScrapedArticle>>,
    pub save_scraped_err: Mutex<Option<StoreError>>,
}

#[async_trait]
impl ArticleStore for RecordingArticleStore {
    async fn find_by_url(&self, url: &str) -> Result<Article, StoreError> {
        self.find_by_url_args.lock().unwrap().push(url.to_string());
        if let Some(err) = self.find_by_url_err.lock().unwrap().take() {
            return Err(err);
        }
        self.article_by_url
            .lock()
            .unwrap()
            .clone()
            .ok_or(StoreError::NoSuchArticle)
    }

    async fn find_subjects(&self, article_id: &str) -> Result<Vec<Subject>, StoreError> {
        self.find_subjects_args
            .lock()
            .unwrap()
            .push(article_id.to_string());
        if let Some(err) = self.find_subjects_err.lock().unwrap().take() {
            return Err(err);
        }
        Ok(self.subjects.lock().unwrap().clone())
    }

    async fn find_referers(&self, article_id: &str) -> Result<Vec<Referer>, StoreError> {
        self.find_referers_args
            .lock()
            .unwrap()
            .push(article_id.to_string());
        if let Some(err) = self.find_referers_err.lock().unwrap().take() {
            return Err(err);
        }
        Ok(self.referers.lock().unwrap().clone())
    }

    async fn update_article(&self, article: &Article) -> Result<(), StoreError> {
        if let Some(err) = self.update_article_err.lock().unwrap().take() {
            return Err(err);
        }
        self.updated_articles.lock().unwrap().push(article.clone());
        Ok(())
    }

    async fn save_referer(&self, referer: &Referer) -> Result<(), StoreError> {
        if let Some(err) = self.save_referer_err.lock().unwrap().take() {
            return Err(err);
        }
        self.saved_referers.lock().unwrap().push(referer.clone());
        Ok(())
    }

    async fn save_scraped(&self, scraped: &ScrapedArticle) -> Result<(), StoreError> {
        self.saved_scraped.lock().unwrap().push(scraped.clone());
        if let Some(err) = self.save_scraped_err.lock().unwrap().take() {
            return Err(err);
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingClusterStore {
    pub cluster: Mutex<Option<ArticleCluster>>,
    pub find_by_hash_err: Mutex<Option<StoreError>>,
    pub find_by_hash_args: Mutex<Vec<String>>,

    pub saved: Mutex<Vec<ArticleCluster>>,
    pub save_err: Mutex<Option<StoreError>>,

    pub updated: Mutex<Vec<ArticleCluster>>,
    pub update_err: Mutex<Option<StoreError>>,
}

#[async_trait]
impl ClusterStore for RecordingClusterStore {
    async fn find_by_hash(&self, cluster_hash: &str) -> Result<ArticleCluster, StoreError> {
        self.find_by_hash_args
            .lock()
            .unwrap()
            .push(cluster_hash.to_string());
        if let Some(err) = self.find_by_hash_err.lock().unwrap().take() {
            return Err(err);
        }
        self.cluster
            .lock()
            .unwrap()
            .clone()
            .ok_or(StoreError::NoSuchCluster)
    }

    async fn save(&self, cluster: &ArticleCluster) -> Result<(), StoreError> {
        self.saved.lock().unwrap().push(cluster.clone());
        if let Some(err) = self.save_err.lock().unwrap().take() {
            return Err(err);
        }
        Ok(())
    }

    async fn update(&self, cluster: &ArticleCluster) -> Result<(), StoreError> {
        self.updated.lock().unwrap().push(cluster.clone());
        if let Some(err) = self.update_err.lock().unwrap().take() {
            return Err(err);
        }
        Ok(())
    }
}
