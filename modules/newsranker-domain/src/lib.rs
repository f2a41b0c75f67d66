//! Pure ranking and clustering logic: the reference-score arithmetic, the
//! content-derived cluster identity, leader election, and the classifier that
//! diffs an incoming rank event against stored state. No I/O in this crate.

pub mod cluster;
pub mod score;
pub mod update;

pub use cluster::{cluster_hash, ArticleCluster, ClusterMember};
pub use score::reference_score;
pub use update::{classify, ArticleUpdate, UpdateKind};
