//! Classifies an incoming rank event against the stored state of an article.

use std::collections::HashSet;
use std::fmt;

use newsranker_common::{id, Article, Referer, ScrapeTarget, Subject};

/// How an article has been updated by a rank event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateKind {
    NoUpdate,
    NewSubjects,
    NewReferences,
    NewSubjectsAndReferences,
}

impl fmt::Display for UpdateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateKind::NoUpdate => write!(f, "no_update"),
            UpdateKind::NewSubjects => write!(f, "new_subjects"),
            UpdateKind::NewReferences => write!(f, "new_references"),
            UpdateKind::NewSubjectsAndReferences => write!(f, "new_subjects_and_references"),
        }
    }
}

/// An update instruction bundled with the data needed to perform it.
#[derive(Debug, Clone)]
pub struct ArticleUpdate {
    pub kind: UpdateKind,
    pub article: Article,
    pub subjects: Vec<Subject>,
    pub referers: Vec<Referer>,
    pub new_referer: Referer,
}

impl ArticleUpdate {
    /// Build the outbound scrape request for this update.
    pub fn to_scrape_target(&self) -> ScrapeTarget {
        ScrapeTarget {
            url: self.article.url.clone(),
            subjects: self.subjects.clone(),
            referer: self.new_referer.clone(),
            title: self.article.title.clone(),
            body: self.article.body.clone(),
            article_id: self.article.id.clone(),
        }
    }
}

/// Discern how an article has been updated and assemble the data needed to
/// rank it again. Pure function of its inputs.
pub fn classify(
    article: &Article,
    old_subjects: &[Subject],
    new_subjects: &[Subject],
    old_referers: &[Referer],
    new_referer: &Referer,
) -> ArticleUpdate {
    let merged_subjects = merge_subjects(old_subjects, new_subjects, &article.id);
    let merged_referers = merge_referers(old_referers, new_referer, &article.id);

    let has_new_subjects = merged_subjects.len() > old_subjects.len();
    let has_new_referers = merged_referers.len() > old_referers.len();

    ArticleUpdate {
        kind: discern_kind(has_new_subjects, has_new_referers),
        article: article.clone(),
        subjects: merged_subjects,
        referers: merged_referers,
        new_referer: referer_with_ids(new_referer, &article.id),
    }
}

/// Bind incoming subjects to an article, minting IDs where absent.
pub fn adopt_subjects(subjects: &[Subject], article_id: &str) -> Vec<Subject> {
    subjects
        .iter()
        .map(|s| subject_with_ids(s, article_id))
        .collect()
}

/// Bind an incoming referer to an article, minting an ID if absent.
pub fn adopt_referer(referer: &Referer, article_id: &str) -> Referer {
    referer_with_ids(referer, article_id)
}

/// Append incoming subjects whose symbol is not yet present. Existing
/// subjects are never rewritten.
fn merge_subjects(old: &[Subject], new: &[Subject], article_id: &str) -> Vec<Subject> {
    let known: HashSet<&str> = old.iter().map(|s| s.symbol.as_str()).collect();
    let mut merged = old.to_vec();

    for subject in new {
        if !known.contains(subject.symbol.as_str()) {
            merged.push(subject_with_ids(subject, article_id));
        }
    }
    merged
}

/// Append the incoming referer unless its external author is already known.
fn merge_referers(old: &[Referer], new_referer: &Referer, article_id: &str) -> Vec<Referer> {
    let mut merged = old.to_vec();
    if old.iter().any(|r| r.external_id == new_referer.external_id) {
        return merged;
    }
    merged.push(referer_with_ids(new_referer, article_id));
    merged
}

fn subject_with_ids(subject: &Subject, article_id: &str) -> Subject {
    let mut subject = subject.clone();
    subject.article_id = article_id.to_string();
    if subject.id.is_empty() {
        subject.id = id::mint();
    }
    subject
}

fn referer_with_ids(referer: &Referer, article_id: &str) -> Referer {
    let mut referer = referer.clone();
    referer.article_id = article_id.to_string();
    if referer.id.is_empty() {
        referer.id = id::mint();
    }
    referer
}

fn discern_kind(has_new_subjects: bool, has_new_referers: bool) -> UpdateKind {
    match (has_new_subjects, has_new_referers) {
        (true, true) => UpdateKind::NewSubjectsAndReferences,
        (true, false) => UpdateKind::NewSubjects,
        (false, true) => UpdateKind::NewReferences,
        (false, false) => UpdateKind::NoUpdate,
    }
}
