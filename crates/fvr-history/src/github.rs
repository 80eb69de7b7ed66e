//! GitHub REST v3 adapter for [`VersionControl`].
//!
//! The token (if any) is resolved by the caller and passed in; never log it.

use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use chrono::{DateTime, Utc};
use tracing::debug;

use fvr_config::settings::GithubSettings;

use crate::vcs::{
    ChangedFile, CommitRecord, ContentRef, ReviewRequest, ReviewRequestRef, VcsError,
    VersionControl,
};

pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Page size requested from list endpoints; a shorter page ends paging.
const PER_PAGE: usize = 100;

const USER_AGENT: &str = concat!("fvr/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_base: String,
    owner: String,
    repo: String,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(owner: String, repo: String, token: Option<String>) -> Self {
        Self::new_with_base_url(owner, repo, token, DEFAULT_API_BASE.to_string())
    }

    pub fn new_with_base_url(
        owner: String,
        repo: String,
        token: Option<String>,
        api_base: String,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base,
            owner,
            repo,
            token,
        }
    }

    pub fn from_settings(settings: &GithubSettings, token: Option<String>) -> Self {
        Self::new_with_base_url(
            settings.owner.clone(),
            settings.repo.clone(),
            token,
            settings.api_base.clone(),
        )
    }

    fn repo_url(&self, tail: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.api_base.trim_end_matches('/'),
            self.owner,
            self.repo,
            tail
        )
    }

    fn get(&self, url: &str) -> RequestBuilder {
        let req = self
            .http
            .get(url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json");
        match &self.token {
            Some(t) => req.bearer_auth(t),
            None => req,
        }
    }

    async fn send(&self, req: RequestBuilder, what: &str) -> Result<reqwest::Response, VcsError> {
        let resp = req
            .send()
            .await
            .map_err(|e| VcsError::Transport(format!("github {what} request failed: {e}")))?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(VcsError::NotFound(what.to_string()));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(VcsError::Api {
                status: status.as_u16(),
                message: api_message(&body),
            });
        }
        Ok(resp)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
        what: &str,
    ) -> Result<T, VcsError> {
        let resp = self.send(self.get(url).query(query), what).await?;
        resp.json::<T>()
            .await
            .map_err(|e| VcsError::Decode(format!("github {what} json decode failed: {e}")))
    }

    /// Fetch every page of a list endpoint.
    async fn get_paged<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
        what: &str,
    ) -> Result<Vec<T>, VcsError> {
        let mut out = Vec::new();
        let mut page = 1usize;
        loop {
            let mut q = query.to_vec();
            q.push(("per_page", PER_PAGE.to_string()));
            q.push(("page", page.to_string()));

            let items: Vec<T> = self.get_json(url, &q, what).await?;
            let n = items.len();
            out.extend(items);
            if n < PER_PAGE {
                break;
            }
            page += 1;
        }
        Ok(out)
    }

    /// Changed files of one commit.
    ///
    /// The detail endpoint pages its `files` array at a server-chosen size and
    /// announces further pages only through the `Link` header.
    async fn commit_files(&self, sha: &str) -> Result<Vec<ChangedFile>, VcsError> {
        let url = self.repo_url(&format!("commits/{sha}"));
        let mut out = Vec::new();
        let mut page = 1usize;
        loop {
            let resp = self
                .send(self.get(&url).query(&[("page", page.to_string())]), "commit detail")
                .await?;
            let more = has_next_page(resp.headers());
            let detail: GhCommitDetail = resp
                .json()
                .await
                .map_err(|e| VcsError::Decode(format!("github commit detail json decode failed: {e}")))?;
            if detail.files.is_empty() {
                break;
            }
            out.extend(detail.files.into_iter().filter_map(GhFile::into_changed));
            if !more {
                break;
            }
            page += 1;
        }
        Ok(out)
    }
}

/// True when the `Link` header advertises a `rel="next"` page.
fn has_next_page(headers: &reqwest::header::HeaderMap) -> bool {
    headers
        .get(reqwest::header::LINK)
        .and_then(|v| v.to_str().ok())
        .map(|link| {
            link.split(',')
                .any(|part| part.split(';').skip(1).any(|p| p.trim() == r#"rel="next""#))
        })
        .unwrap_or(false)
}

/// Best-effort extraction of GitHub's `{"message": ..}` error body.
fn api_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.chars().take(200).collect())
}

#[async_trait::async_trait]
impl VersionControl for GitHubClient {
    fn source_name(&self) -> &'static str {
        "github"
    }

    async fn list_commits(&self, path: &str) -> Result<Vec<CommitRecord>, VcsError> {
        let commits: Vec<GhCommit> = self
            .get_paged(&self.repo_url("commits"), &[("path", path.to_string())], "commits")
            .await?;

        let mut out = Vec::with_capacity(commits.len());
        for c in commits {
            let pulls: Vec<GhPull> = self
                .get_json(&self.repo_url(&format!("commits/{}/pulls", c.sha)), &[], "commit pulls")
                .await?;

            let record = match pulls.first() {
                Some(pr) => CommitRecord {
                    commit_id: c.sha,
                    review_request: Some(ReviewRequestRef {
                        id: pr.id,
                        number: pr.number,
                    }),
                    changed_files: Vec::new(),
                },
                None => {
                    let changed_files = self.commit_files(&c.sha).await?;
                    CommitRecord {
                        commit_id: c.sha,
                        review_request: None,
                        changed_files,
                    }
                }
            };
            out.push(record);
        }
        Ok(out)
    }

    async fn review_request(&self, rr: &ReviewRequestRef) -> Result<ReviewRequest, VcsError> {
        let pr: GhPull = self
            .get_json(&self.repo_url(&format!("pulls/{}", rr.number)), &[], "pull request")
            .await?;
        let files: Vec<GhFile> = self
            .get_paged(&self.repo_url(&format!("pulls/{}/files", rr.number)), &[], "pull request files")
            .await?;

        Ok(ReviewRequest {
            id: pr.id,
            number: pr.number,
            merged_at: pr.merged_at,
            changed_files: files.into_iter().filter_map(GhFile::into_changed).collect(),
        })
    }

    async fn fetch_content(&self, content: &ContentRef) -> Result<String, VcsError> {
        let what = format!("raw content of {}", content.path);
        let resp = self.send(self.get(&content.content_url), &what).await?;
        resp.text()
            .await
            .map_err(|e| VcsError::Decode(format!("github raw content read failed: {e}")))
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
struct GhCommit {
    sha: String,
}

#[derive(Debug, Clone, Deserialize)]
struct GhCommitDetail {
    #[serde(default)]
    files: Vec<GhFile>,
}

#[derive(Debug, Clone, Deserialize)]
struct GhPull {
    id: u64,
    number: u64,
    #[serde(default)]
    merged_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
struct GhFile {
    filename: String,
    #[serde(default)]
    raw_url: Option<String>,
}

impl GhFile {
    /// `None` when GitHub gives no raw URL (e.g. submodules); the resolver
    /// then sees the path as absent from the listing.
    fn into_changed(self) -> Option<ChangedFile> {
        match self.raw_url {
            Some(content_url) => Some(ChangedFile {
                path: self.filename,
                content_url,
            }),
            None => {
                debug!(file = %self.filename, "changed file without raw_url ignored");
                None
            }
        }
    }
}
