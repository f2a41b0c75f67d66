//! Shared doubles and builders for the handler scenario tests.
#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;

use newsranker_common::{Article, Referer, ScrapeTarget, Subject};
use newsranker_ranker::ScrapePublisher;

#[derive(Default)]
pub struct RecordingPublisher {
    pub published: Mutex<Vec<ScrapeTarget>>,
    pub fail: bool,
}

#[async_trait]
impl ScrapePublisher for RecordingPublisher {
    async fn publish(&self, target: &ScrapeTarget) -> anyhow::Result<()> {
        self.published.lock().unwrap().push(target.clone());
        if self.fail {
            anyhow::bail!("publish failed");
        }
        Ok(())
    }
}

pub fn article(id: &str, url: &str, title: &str, reference_score: f64) -> Article {
    let mut article = Article::with_url(url);
    article.id = id.to_string();
    article.title = title.to_string();
    article.reference_score = reference_score;
    article.article_date = NaiveDate::from_ymd_opt(2018, 10, 25).unwrap();
    article
}

pub fn stored_subject(id: &str, symbol: &str, score: f64, article_id: &str) -> Subject {
    Subject {
        id: id.to_string(),
        symbol: symbol.to_string(),
        name: format!("subject-{symbol}"),
        score,
        article_id: article_id.to_string(),
    }
}

pub fn incoming_subject(symbol: &str) -> Subject {
    Subject {
        symbol: symbol.to_string(),
        name: format!("subject-{symbol}"),
        ..Default::default()
    }
}

pub fn stored_referer(id: &str, external_id: &str, follower_count: i64, article_id: &str) -> Referer {
    Referer {
        id: id.to_string(),
        external_id: external_id.to_string(),
        follower_count,
        article_id: article_id.to_string(),
    }
}

pub fn incoming_referer(external_id: &str, follower_count: i64) -> Referer {
    Referer {
        external_id: external_id.to_string(),
        follower_count,
        ..Default::default()
    }
}

/// Scores are asserted at one-decimal precision.
pub fn score_bucket(score: f64) -> i64 {
    (score * 10.0) as i64
}
