//! Title-and-symbol-scoped article clusters with a content-derived identity.

use chrono::NaiveDate;
use sha2::{Digest, Sha256};

use newsranker_common::id;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Identity of a cluster: SHA-256 hex digest of the lowercased title, the
/// lowercased symbol and the calendar day, concatenated without separator.
/// The concatenation is load-bearing; stored hashes depend on it.
pub fn cluster_hash(title: &str, symbol: &str, date: NaiveDate) -> String {
    let mut h = Sha256::new();
    h.update(title.to_lowercase().as_bytes());
    h.update(symbol.to_lowercase().as_bytes());
    h.update(date.format(DATE_FORMAT).to_string().as_bytes());
    format!("{:x}", h.finalize())
}

/// A collection of articles sharing a (title, symbol, date) combination.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleCluster {
    pub hash: String,
    pub title: String,
    pub symbol: String,
    pub article_date: NaiveDate,
    pub lead_article_id: String,
    pub score: f64,
    pub members: Vec<ClusterMember>,
}

impl ArticleCluster {
    pub fn new(
        title: &str,
        symbol: &str,
        article_date: NaiveDate,
        lead_article_id: &str,
        score: f64,
        members: Vec<ClusterMember>,
    ) -> Self {
        Self {
            hash: cluster_hash(title, symbol, article_date),
            title: title.to_string(),
            symbol: symbol.to_string(),
            article_date,
            lead_article_id: lead_article_id.to_string(),
            score,
            members,
        }
    }

    /// Add a member unless its article is already in the cluster.
    pub fn add_member(&mut self, new_member: ClusterMember) {
        if self
            .members
            .iter()
            .any(|m| m.article_id == new_member.article_id)
        {
            tracing::debug!(
                article_id = %new_member.article_id,
                cluster_hash = %self.hash,
                "article already a member of cluster"
            );
            return;
        }
        self.members.push(new_member);
    }

    /// Elect the highest-scoring member as lead and recompute the cluster
    /// score. Ties resolve to the later member in iteration order.
    pub fn elect_leader_and_score(&mut self) {
        let mut high_score = 0.0;
        let mut leader: Option<&ClusterMember> = None;
        for member in &self.members {
            if member.score() >= high_score {
                high_score = member.score();
                leader = Some(member);
            }
        }

        let reference_sum: f64 = self.members.iter().map(|m| m.reference_score).sum();
        let (lead_article_id, leader_subject_score) = match leader {
            Some(leader) => (leader.article_id.clone(), leader.subject_score),
            None => (String::new(), 0.0),
        };

        self.lead_article_id = lead_article_id;
        self.score = leader_subject_score + reference_sum;
    }
}

/// A scored article belonging to a cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterMember {
    pub id: String,
    pub cluster_hash: String,
    pub article_id: String,
    pub reference_score: f64,
    pub subject_score: f64,
}

impl ClusterMember {
    pub fn new(
        cluster_hash: &str,
        article_id: &str,
        reference_score: f64,
        subject_score: f64,
    ) -> Self {
        Self {
            id: id::mint(),
            cluster_hash: cluster_hash.to_string(),
            article_id: article_id.to_string(),
            reference_score,
            subject_score,
        }
    }

    /// Compound score used for leader election.
    pub fn score(&self) -> f64 {
        self.reference_score + self.subject_score
    }
}
