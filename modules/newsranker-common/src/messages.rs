//! Wire payloads exchanged with the broker. All JSON.

use serde::{Deserialize, Serialize};

use crate::types::{Article, Referer, Subject};

/// Inbound instruction to (re)consider one or more URLs for ranking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankObject {
    #[serde(rename = "URLs")]
    pub urls: Vec<String>,
    pub subjects: Vec<Subject>,
    pub referer: Referer,
    #[serde(default)]
    pub language: String,
}

/// Inbound payload with a fetched article's content plus its subjects and referer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapedArticle {
    pub article: Article,
    pub subjects: Vec<Subject>,
    pub referer: Referer,
}

/// Outbound request to the scraper to fetch a URL.
/// Title and body are empty for articles never scraped before.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeTarget {
    pub url: String,
    pub subjects: Vec<Subject>,
    pub referer: Referer,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    pub article_id: String,
}
