// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! GitHub contents API client used as the remote file store.
//!
//! Handles:
//! - Fetching a file's decoded content and blob SHA (the revision token)
//! - Creating or overwriting a file with an optional prior SHA
//! - Mapping HTTP failures onto the store error taxonomy

use crate::config::StoreConfig;
use crate::db::{FileStore, RemoteFile};
use crate::error::AppError;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";

/// Remote file store backed by a GitHub repository.
#[derive(Clone)]
pub struct GitHubStore {
    http: reqwest::Client,
    config: StoreConfig,
}

impl GitHubStore {
    /// Create a client for the repository described by `config`.
    pub fn new(config: StoreConfig) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("gradia-tracker/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("HTTP client init failed: {}", e)))?;

        Ok(Self { http, config })
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.config.api_base_url.trim_end_matches('/'),
            urlencoding::encode(&self.config.owner),
            urlencoding::encode(&self.config.collection),
            path.split('/')
                .map(|segment| urlencoding::encode(segment).into_owned())
                .collect::<Vec<_>>()
                .join("/")
        )
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        let builder = self
            .http
            .request(method, url)
            .header(reqwest::header::ACCEPT, GITHUB_ACCEPT);

        match &self.config.access_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Map a non-success response onto the error taxonomy.
    async fn error_for(response: reqwest::Response) -> AppError {
        let status = response.status();
        let message = response
            .json::<GitHubErrorBody>()
            .await
            .map(|b| b.message)
            .unwrap_or_default();

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                tracing::warn!(status = %status, message = %message, "Remote store rejected credential");
                AppError::Unauthorized
            }
            // 409: SHA does not match; 422: SHA missing for an existing file
            StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
                AppError::Conflict(format!("HTTP {}: {}", status, message))
            }
            StatusCode::NOT_FOUND => AppError::NotFound(message),
            _ => AppError::RemoteStore(format!("HTTP {}: {}", status, message)),
        }
    }
}

#[async_trait]
impl FileStore for GitHubStore {
    async fn fetch_file(&self, path: &str) -> Result<Option<RemoteFile>, AppError> {
        if !self.can_read() {
            return Ok(None);
        }

        let url = self.contents_url(path);
        let response = self
            .request(reqwest::Method::GET, &url)
            .query(&[("ref", self.config.branch.as_str())])
            .send()
            .await
            .map_err(|e| AppError::RemoteStore(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!(path, "Remote file not found");
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::error_for(response).await);
        }

        let body: ContentsResponse = response
            .json()
            .await
            .map_err(|e| AppError::RemoteStore(format!("JSON parse error: {}", e)))?;

        // The API wraps base64 content at 60 columns
        let packed: String = body.content.split_whitespace().collect();
        let bytes = BASE64
            .decode(packed)
            .map_err(|e| AppError::RemoteStore(format!("Base64 decode failed: {}", e)))?;
        let content = String::from_utf8(bytes)
            .map_err(|e| AppError::RemoteStore(format!("UTF-8 decode failed: {}", e)))?;

        Ok(Some(RemoteFile {
            path: path.to_string(),
            content,
            revision: body.sha,
        }))
    }

    async fn put_file(
        &self,
        path: &str,
        content: &str,
        revision: Option<&str>,
        message: &str,
    ) -> Result<(), AppError> {
        if !self.can_write() {
            return Err(AppError::NoWriteAccess);
        }

        let body = PutContentsRequest {
            message,
            content: BASE64.encode(content.as_bytes()),
            branch: &self.config.branch,
            sha: revision,
        };

        let url = self.contents_url(path);
        let response = self
            .request(reqwest::Method::PUT, &url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::RemoteStore(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_for(response).await);
        }

        tracing::info!(path, created = revision.is_none(), "Remote file written");
        Ok(())
    }

    fn can_read(&self) -> bool {
        self.config.can_read()
    }

    fn can_write(&self) -> bool {
        self.config.can_write()
    }
}

/// Subset of the contents API file response.
#[derive(Debug, Deserialize)]
struct ContentsResponse {
    content: String,
    sha: String,
}

#[derive(Debug, Serialize)]
struct PutContentsRequest<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Debug, Default, Deserialize)]
struct GitHubErrorBody {
    #[serde(default)]
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> GitHubStore {
        GitHubStore::new(StoreConfig {
            owner: "some one".to_string(),
            collection: "habits".to_string(),
            access_token: None,
            branch: "main".to_string(),
            api_base_url: "https://api.example.com/".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn test_contents_url_encodes_segments() {
        assert_eq!(
            store().contents_url("dir/gradia data.csv"),
            "https://api.example.com/repos/some%20one/habits/contents/dir/gradia%20data.csv"
        );
    }

    #[tokio::test]
    async fn test_put_without_token_fails_fast() {
        let err = store()
            .put_file("gradia_data.csv", "x", None, "msg")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NoWriteAccess));
    }
}
