//! In-memory version control.
//!
//! History is recorded oldest first with the `push_*` methods and served
//! newest first, the way a hosted API lists commits.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, Utc};

use fvr_history::{
    ChangedFile, CommitRecord, ContentRef, ReviewRequest, ReviewRequestRef, VcsError,
    VersionControl,
};

#[derive(Default)]
pub struct FakeVcs {
    /// path -> commits, oldest first.
    history: HashMap<String, Vec<CommitRecord>>,
    reviews: HashMap<u64, ReviewRequest>,
    contents: HashMap<String, String>,
    listing_failure: Option<VcsError>,
    next_commit: usize,
    list_calls: AtomicUsize,
    review_calls: AtomicUsize,
    content_fetches: AtomicUsize,
}

impl FakeVcs {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_sha(&mut self) -> String {
        self.next_commit += 1;
        format!("c{:04}", self.next_commit)
    }

    fn store(&mut self, url: String, body: &str) -> String {
        self.contents.insert(url.clone(), body.to_string());
        url
    }

    /// Direct commit carrying `body` for `path`.
    pub fn push_direct(&mut self, path: &str, body: &str) -> &mut Self {
        let sha = self.next_sha();
        let url = self.store(format!("mem://commit/{sha}/{path}"), body);
        self.history.entry(path.to_string()).or_default().push(CommitRecord {
            commit_id: sha,
            review_request: None,
            changed_files: vec![ChangedFile {
                path: path.to_string(),
                content_url: url,
            }],
        });
        self
    }

    /// Commit merged through review request `rr`.
    ///
    /// The first push for a given `rr.number` defines the review request:
    /// its merge time and, when `body` is `Some`, the file content. Later
    /// pushes for the same review request only add commits.
    pub fn push_merged(
        &mut self,
        path: &str,
        rr: ReviewRequestRef,
        merged_at: Option<DateTime<Utc>>,
        body: Option<&str>,
    ) -> &mut Self {
        let sha = self.next_sha();
        if !self.reviews.contains_key(&rr.number) {
            let mut changed_files = vec![ChangedFile {
                path: "README.md".to_string(),
                content_url: format!("mem://rr/{}/README.md", rr.number),
            }];
            if let Some(body) = body {
                let url = self.store(format!("mem://rr/{}/{path}", rr.number), body);
                changed_files.push(ChangedFile {
                    path: path.to_string(),
                    content_url: url,
                });
            }
            self.reviews.insert(
                rr.number,
                ReviewRequest {
                    id: rr.id,
                    number: rr.number,
                    merged_at,
                    changed_files,
                },
            );
        }
        self.history.entry(path.to_string()).or_default().push(CommitRecord {
            commit_id: sha,
            review_request: Some(rr),
            changed_files: Vec::new(),
        });
        self
    }

    /// Every `list_commits` call fails with `err`.
    pub fn fail_listing(&mut self, err: VcsError) -> &mut Self {
        self.listing_failure = Some(err);
        self
    }

    /// Forget every stored body; later fetches fail with `NotFound`.
    pub fn drop_contents(&mut self) -> &mut Self {
        self.contents.clear();
        self
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn review_calls(&self) -> usize {
        self.review_calls.load(Ordering::SeqCst)
    }

    pub fn content_fetches(&self) -> usize {
        self.content_fetches.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl VersionControl for FakeVcs {
    fn source_name(&self) -> &'static str {
        "fake"
    }

    async fn list_commits(&self, path: &str) -> Result<Vec<CommitRecord>, VcsError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = &self.listing_failure {
            return Err(err.clone());
        }
        let mut commits = self.history.get(path).cloned().unwrap_or_default();
        commits.reverse();
        Ok(commits)
    }

    async fn review_request(&self, rr: &ReviewRequestRef) -> Result<ReviewRequest, VcsError> {
        self.review_calls.fetch_add(1, Ordering::SeqCst);
        self.reviews
            .get(&rr.number)
            .cloned()
            .ok_or_else(|| VcsError::NotFound(format!("review request #{}", rr.number)))
    }

    async fn fetch_content(&self, content: &ContentRef) -> Result<String, VcsError> {
        self.content_fetches.fetch_add(1, Ordering::SeqCst);
        self.contents
            .get(&content.content_url)
            .cloned()
            .ok_or_else(|| VcsError::NotFound(content.content_url.clone()))
    }
}
