//! Groups an article into title-and-symbol-scoped clusters, one per subject.
//! Clustering is best-effort: every failure is logged and dropped so it never
//! aborts the message handler that triggered it.

use std::sync::Arc;

use tracing::warn;

use newsranker_common::{Article, Subject};
use newsranker_domain::{cluster_hash, ArticleCluster, ClusterMember};
use newsranker_store::{ArticleStore, ClusterStore, StoreError};

pub struct Clusterer {
    articles: Arc<dyn ArticleStore>,
    clusters: Arc<dyn ClusterStore>,
}

impl Clusterer {
    pub fn new(articles: Arc<dyn ArticleStore>, clusters: Arc<dyn ClusterStore>) -> Self {
        Self { articles, clusters }
    }

    /// Find-or-create a cluster for each subject of the article.
    pub async fn cluster_article(&self, article: &Article) {
        let subjects = match self.articles.find_subjects(&article.id).await {
            Ok(subjects) => subjects,
            Err(err) => {
                warn!(article_id = %article.id, %err, "loading subjects for clustering failed");
                return;
            }
        };

        for subject in &subjects {
            self.cluster_with_subject(article, subject).await;
        }
    }

    async fn cluster_with_subject(&self, article: &Article, subject: &Subject) {
        let hash = cluster_hash(&article.title, &subject.symbol, article.article_date);

        match self.clusters.find_by_hash(&hash).await {
            Ok(cluster) => self.update_cluster(cluster, article, subject).await,
            Err(StoreError::NoSuchCluster) => self.create_cluster(&hash, article, subject).await,
            Err(err) => {
                warn!(cluster_hash = %hash, article_id = %article.id, %err, "looking up cluster failed");
            }
        }
    }

    async fn create_cluster(&self, hash: &str, article: &Article, subject: &Subject) {
        let member = ClusterMember::new(hash, &article.id, article.reference_score, subject.score);
        let score = member.score();
        let cluster = ArticleCluster::new(
            &article.title,
            &subject.symbol,
            article.article_date,
            &article.id,
            score,
            vec![member],
        );

        // A concurrent consumer may win the creation race; the conflict
        // surfaces here and the next message converges via the update path.
        if let Err(err) = self.clusters.save(&cluster).await {
            warn!(cluster_hash = %hash, article_id = %article.id, %err, "saving new cluster failed");
        }
    }

    async fn update_cluster(&self, mut cluster: ArticleCluster, article: &Article, subject: &Subject) {
        cluster.add_member(ClusterMember::new(
            &cluster.hash,
            &article.id,
            article.reference_score,
            subject.score,
        ));
        cluster.elect_leader_and_score();

        if let Err(err) = self.clusters.update(&cluster).await {
            warn!(cluster_hash = %cluster.hash, article_id = %article.id, %err, "updating cluster failed");
        }
    }
}
