//! Entity aggregates. Articles own subjects and referers; ownership is
//! tree-shaped and keyed by ID, never an object graph.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::id;

const KEYWORD_DELIMITER: &str = ",";

/// A news article as observed by the ranker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub reference_score: f64,
    pub article_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl Article {
    /// A fresh in-memory article for a URL seen for the first time.
    /// Not persisted until the scraped payload comes back.
    pub fn with_url(url: &str) -> Self {
        let now = Utc::now();
        Self {
            id: id::mint(),
            url: url.to_string(),
            title: String::new(),
            body: String::new(),
            keywords: Vec::new(),
            reference_score: 0.0,
            article_date: now.date_naive(),
            created_at: now,
        }
    }
}

/// A topical tag (ticker symbol + name) scored for an article.
/// Within an article, each symbol appears at most once.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    #[serde(default)]
    pub id: String,
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub article_id: String,
}

/// An external social-media author that linked to an article.
/// Within an article, each external_id appears at most once.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Referer {
    #[serde(default)]
    pub id: String,
    pub external_id: String,
    #[serde(default)]
    pub follower_count: i64,
    #[serde(default)]
    pub article_id: String,
}

/// Encode keywords for storage as a single comma-joined column.
pub fn join_keywords(keywords: &[String]) -> Option<String> {
    if keywords.is_empty() {
        return None;
    }
    Some(keywords.join(KEYWORD_DELIMITER))
}

/// Decode the stored keyword column. Missing or empty decodes to an empty
/// sequence; anything else splits on the delimiter with no trimming.
pub fn split_keywords(joined: Option<&str>) -> Vec<String> {
    match joined {
        None | Some("") => Vec::new(),
        Some(joined) => joined.split(KEYWORD_DELIMITER).map(String::from).collect(),
    }
}
