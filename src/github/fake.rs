// src/github/fake.rs
// In-memory Transport for tests. Unknown URLs answer 404.

use super::transport::{Reply, Transport};
use crate::error::{AcquireError, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Mutex;
use url::Url;

const API: &str = "https://api.github.com";
const RAW: &str = "https://raw.githubusercontent.com";

#[derive(Clone)]
enum Canned {
    Reply(u16, Vec<u8>),
    Fail(AcquireError),
}

#[derive(Default)]
pub struct FakeTransport {
    routes: Mutex<HashMap<String, Canned>>,
    requests: Mutex<Vec<String>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&self, url: &str, status: u16, body: impl Into<Vec<u8>>) -> &Self {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), Canned::Reply(status, body.into()));
        self
    }

    pub fn fail(&self, url: &str, error: AcquireError) -> &Self {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), Canned::Fail(error));
        self
    }

    /// Every URL requested so far, in order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requested(&self, needle: &str) -> bool {
        self.requests().iter().any(|u| u.contains(needle))
    }

    // --- GitHub-shaped helpers ---------------------------------------------

    pub fn repo(&self, owner: &str, repo: &str, default_branch: &str) -> &Self {
        self.reply(
            &format!("{}/repos/{}/{}", API, owner, repo),
            200,
            json!({ "default_branch": default_branch }).to_string(),
        )
    }

    pub fn branch(&self, owner: &str, repo: &str, branch: &str) -> &Self {
        self.reply(
            &format!("{}/repos/{}/{}/branches/{}", API, owner, repo, branch),
            200,
            json!({ "name": branch }).to_string(),
        )
    }

    /// Serves a file through the raw endpoint. `path` must already be
    /// percent-encoded the way the fetcher encodes it.
    pub fn raw_file(&self, owner: &str, repo: &str, branch: &str, path: &str, body: &str) -> &Self {
        self.reply(
            &format!("{}/{}/{}/{}/{}", RAW, owner, repo, branch, path),
            200,
            body,
        )
    }

    /// Serves a file only through the contents API (base64, like GitHub).
    pub fn api_file(&self, owner: &str, repo: &str, branch: &str, path: &str, body: &str) -> &Self {
        let encoded = STANDARD.encode(body.as_bytes());
        // GitHub wraps base64 at 60 columns
        let wrapped: Vec<String> = encoded
            .as_bytes()
            .chunks(60)
            .map(|c| String::from_utf8_lossy(c).into_owned())
            .collect();
        self.reply(
            &contents_url(owner, repo, branch, path),
            200,
            json!({
                "type": "file",
                "name": path.rsplit('/').next().unwrap_or(path),
                "path": path,
                "size": body.len(),
                "encoding": "base64",
                "content": wrapped.join("\n"),
            })
            .to_string(),
        )
    }

    /// Directory listing. Entries are (name, "file" | "dir", size).
    pub fn dir(&self, owner: &str, repo: &str, branch: &str, path: &str, entries: &[(&str, &str, u64)]) -> &Self {
        let items: Vec<_> = entries
            .iter()
            .map(|(name, kind, size)| {
                let full = if path.is_empty() {
                    name.to_string()
                } else {
                    format!("{}/{}", path, name)
                };
                json!({ "name": name, "path": full, "type": kind, "size": size })
            })
            .collect();
        self.reply(
            &contents_url(owner, repo, branch, path),
            200,
            serde_json::Value::Array(items).to_string(),
        )
    }

    /// A directory listing plus raw content for every file in it.
    pub fn dir_with_files(&self, owner: &str, repo: &str, branch: &str, path: &str, files: &[(&str, &str)]) -> &Self {
        let entries: Vec<(&str, &str, u64)> = files
            .iter()
            .map(|(name, body)| (*name, "file", body.len() as u64))
            .collect();
        self.dir(owner, repo, branch, path, &entries);
        for (name, body) in files {
            let full = if path.is_empty() {
                name.to_string()
            } else {
                format!("{}/{}", path, name)
            };
            self.raw_file(owner, repo, branch, &full, body);
        }
        self
    }
}

pub fn contents_url(owner: &str, repo: &str, branch: &str, path: &str) -> String {
    if path.is_empty() {
        format!("{}/repos/{}/{}/contents?ref={}", API, owner, repo, branch)
    } else {
        format!("{}/repos/{}/{}/contents/{}?ref={}", API, owner, repo, path, branch)
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn get(&self, url: &Url) -> Result<Reply> {
        let key = url.to_string();
        self.requests.lock().unwrap().push(key.clone());
        let canned = self.routes.lock().unwrap().get(&key).cloned();
        match canned {
            Some(Canned::Reply(status, body)) => Ok(Reply {
                status,
                body,
                rate_limit_remaining: None,
            }),
            Some(Canned::Fail(error)) => Err(error),
            None => Ok(Reply {
                status: 404,
                body: br#"{"message":"Not Found"}"#.to_vec(),
                rate_limit_remaining: None,
            }),
        }
    }
}
