//! Rank-handler scenarios over recording doubles.

mod support;

use std::sync::Arc;

use newsranker_common::RankObject;
use newsranker_ranker::handlers::{Clusterer, RankHandler};
use newsranker_ranker::subscriptions::MessageHandler;
use newsranker_store::testutil::{RecordingArticleStore, RecordingClusterStore};
use newsranker_store::StoreError;

use support::*;

struct Setup {
    articles: Arc<RecordingArticleStore>,
    clusters: Arc<RecordingClusterStore>,
    publisher: Arc<RecordingPublisher>,
    handler: RankHandler,
}

fn setup(twitter_users: f64, reference_weight: f64) -> Setup {
    let articles = Arc::new(RecordingArticleStore::default());
    let clusters = Arc::new(RecordingClusterStore::default());
    let publisher = Arc::new(RecordingPublisher::default());
    let clusterer = Arc::new(Clusterer::new(articles.clone(), clusters.clone()));
    let handler = RankHandler::new(
        twitter_users,
        reference_weight,
        articles.clone(),
        publisher.clone(),
        clusterer,
    );
    Setup {
        articles,
        clusters,
        publisher,
        handler,
    }
}

fn rank_object(urls: &[&str], subjects: Vec<newsranker_common::Subject>, referer: newsranker_common::Referer) -> Vec<u8> {
    let ro = RankObject {
        urls: urls.iter().map(|u| u.to_string()).collect(),
        subjects,
        referer,
        language: "en".to_string(),
    };
    serde_json::to_vec(&ro).unwrap()
}

#[tokio::test]
async fn unknown_url_publishes_scrape_target_with_consistent_ids() {
    let setup = setup(2000.0, 1.0);

    let body = rank_object(
        &["http://u"],
        vec![incoming_subject("S0"), incoming_subject("S1")],
        incoming_referer("e", 1000),
    );
    setup.handler.handle(&body, "msg-0").await.unwrap();

    let published = setup.publisher.published.lock().unwrap();
    assert_eq!(published.len(), 1);
    let target = &published[0];

    assert_eq!(target.url, "http://u");
    assert!(target.title.is_empty());
    assert!(target.body.is_empty());
    assert_eq!(target.article_id.len(), 32);
    assert_eq!(target.referer.article_id, target.article_id);
    assert!(!target.referer.id.is_empty());
    assert_eq!(target.subjects.len(), 2);
    for subject in &target.subjects {
        assert_eq!(subject.article_id, target.article_id);
        assert!(!subject.id.is_empty());
    }

    // Nothing is persisted for a brand-new URL.
    assert!(setup.articles.updated_articles.lock().unwrap().is_empty());
    assert!(setup.articles.saved_referers.lock().unwrap().is_empty());
}

#[tokio::test]
async fn repeated_subjects_and_referer_take_no_action() {
    let setup = setup(2000.0, 1.0);
    *setup.articles.article_by_url.lock().unwrap() =
        Some(article("a-0", "http://u", "t-0", 0.5));
    *setup.articles.subjects.lock().unwrap() = vec![stored_subject("s-0", "S0", 0.3, "a-0")];
    *setup.articles.referers.lock().unwrap() = vec![stored_referer("r-0", "e-0", 1000, "a-0")];

    let body = rank_object(
        &["http://u"],
        vec![incoming_subject("S0")],
        incoming_referer("e-0", 1000),
    );
    setup.handler.handle(&body, "msg-0").await.unwrap();

    assert!(setup.publisher.published.lock().unwrap().is_empty());
    assert!(setup.articles.updated_articles.lock().unwrap().is_empty());
    assert!(setup.articles.saved_referers.lock().unwrap().is_empty());
    assert!(setup.clusters.saved.lock().unwrap().is_empty());
    assert!(setup.clusters.updated.lock().unwrap().is_empty());
}

#[tokio::test]
async fn new_subject_publishes_scrape_target_without_mutating_article() {
    let setup = setup(2000.0, 1.0);
    *setup.articles.article_by_url.lock().unwrap() =
        Some(article("a-0", "http://u", "t-0", 0.5));
    *setup.articles.subjects.lock().unwrap() = vec![stored_subject("s-0", "S0", 0.3, "a-0")];
    *setup.articles.referers.lock().unwrap() = vec![stored_referer("r-0", "e-0", 1000, "a-0")];

    let body = rank_object(
        &["http://u"],
        vec![incoming_subject("S1")],
        incoming_referer("e-0", 1000),
    );
    setup.handler.handle(&body, "msg-0").await.unwrap();

    let published = setup.publisher.published.lock().unwrap();
    assert_eq!(published.len(), 1);
    let target = &published[0];
    assert_eq!(target.article_id, "a-0");
    assert_eq!(target.title, "t-0");
    assert_eq!(target.subjects.len(), 2);

    assert!(setup.articles.updated_articles.lock().unwrap().is_empty());
    assert!(setup.articles.saved_referers.lock().unwrap().is_empty());
}

#[tokio::test]
async fn new_referer_rescores_saves_and_reclusters() {
    let setup = setup(2000.0, 1.0);
    *setup.articles.article_by_url.lock().unwrap() =
        Some(article("a-0", "http://u", "t-0", 0.5));
    *setup.articles.subjects.lock().unwrap() = vec![stored_subject("s-0", "S0", 0.3, "a-0")];
    *setup.articles.referers.lock().unwrap() = vec![stored_referer("r-0", "e-0", 1000, "a-0")];

    let body = rank_object(
        &["http://u"],
        vec![incoming_subject("S0")],
        incoming_referer("e-1", 1000),
    );
    setup.handler.handle(&body, "msg-0").await.unwrap();

    assert!(setup.publisher.published.lock().unwrap().is_empty());

    // Merged follower count 2000 over 2000 users at weight 1.0.
    let updated = setup.articles.updated_articles.lock().unwrap();
    assert_eq!(updated.len(), 1);
    assert_eq!(score_bucket(updated[0].reference_score), 10);

    let saved_referers = setup.articles.saved_referers.lock().unwrap();
    assert_eq!(saved_referers.len(), 1);
    assert_eq!(saved_referers[0].external_id, "e-1");
    assert_eq!(saved_referers[0].article_id, "a-0");
    assert!(!saved_referers[0].id.is_empty());

    // The rescored article lands in a fresh cluster for its subject.
    let saved_clusters = setup.clusters.saved.lock().unwrap();
    assert_eq!(saved_clusters.len(), 1);
    assert_eq!(saved_clusters[0].lead_article_id, "a-0");
    assert_eq!(saved_clusters[0].members.len(), 1);
    assert_eq!(score_bucket(saved_clusters[0].score), 13);
}

#[tokio::test]
async fn unparsable_rank_object_is_an_error() {
    let setup = setup(2000.0, 1.0);
    let result = setup.handler.handle(b"not json", "msg-0").await;
    assert!(result.is_err());
}

#[tokio::test]
async fn url_failures_do_not_abort_the_batch() {
    let setup = setup(2000.0, 1.0);
    *setup.articles.find_by_url_err.lock().unwrap() =
        Some(StoreError::Database(sqlx::Error::PoolClosed));
    *setup.articles.article_by_url.lock().unwrap() =
        Some(article("a-0", "http://u-1", "t-0", 0.5));
    *setup.articles.subjects.lock().unwrap() = vec![stored_subject("s-0", "S0", 0.3, "a-0")];
    *setup.articles.referers.lock().unwrap() = vec![stored_referer("r-0", "e-0", 1000, "a-0")];

    let body = rank_object(
        &["http://u-0", "http://u-1"],
        vec![incoming_subject("S0")],
        incoming_referer("e-0", 1000),
    );
    let result = setup.handler.handle(&body, "msg-0").await;

    assert!(result.is_ok());
    assert_eq!(
        *setup.articles.find_by_url_args.lock().unwrap(),
        vec!["http://u-0".to_string(), "http://u-1".to_string()]
    );
}
