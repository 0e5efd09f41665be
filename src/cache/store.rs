//! A single named cache store backed by a directory of entry files

use crate::cache::entry::{entry_file_name, CacheEntry};
use crate::error::{NewswError, NewswResult};
use crate::http::{Fetcher, Request, Response};
use chrono::{DateTime, Utc};
use futures_util::future::try_join_all;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

/// Listing row for one stored entry
#[derive(Debug, Clone, Serialize)]
pub struct EntrySummary {
    pub method: String,
    pub url: String,
    pub status: u16,
    pub size: usize,
    pub cached_at: DateTime<Utc>,
}

/// Named request → response map persisted under one directory.
///
/// Each entry lives in its own file named after the SHA-256 of the request
/// key. Writes land in a temp file first and are renamed into place, so a
/// reader never sees a half-written entry.
#[derive(Debug, Clone)]
pub struct CacheStore {
    name: String,
    dir: PathBuf,
}

impl CacheStore {
    pub(crate) fn new(name: String, dir: PathBuf) -> Self {
        Self { name, dir }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Look up the stored response for `request`
    pub async fn match_request(&self, request: &Request) -> NewswResult<Option<Response>> {
        let path = self.dir.join(entry_file_name(request));

        let Some(entry) = read_entry(&path).await? else {
            return Ok(None);
        };

        if !entry.matches(request) {
            debug!("Cache {} has {} but Vary does not match", self.name, request);
            return Ok(None);
        }

        entry.to_response(&path).map(Some)
    }

    /// Store `response` under `request`, overwriting any previous entry
    pub async fn put(&self, request: &Request, response: Response) -> NewswResult<()> {
        let entry = CacheEntry::new(request, response);
        let staged = self.stage(request, &entry).await?;
        self.commit(&staged).await?;

        debug!("Cached {} in {}", request, self.name);
        Ok(())
    }

    /// Fetch every request and store all responses, or none of them.
    ///
    /// Any network failure or non-2xx status aborts before a single entry
    /// is written.
    pub async fn add_all(&self, fetcher: &dyn Fetcher, requests: &[Request]) -> NewswResult<()> {
        self.add_all_with_progress(fetcher, requests, &|_, _, _| {})
            .await
    }

    /// [`CacheStore::add_all`] reporting `(done, total, request)` after each fetch
    pub async fn add_all_with_progress(
        &self,
        fetcher: &dyn Fetcher,
        requests: &[Request],
        on_fetched: &(dyn Fn(usize, usize, &Request) + Send + Sync),
    ) -> NewswResult<()> {
        let total = requests.len();
        let done = AtomicUsize::new(0);

        let responses = try_join_all(requests.iter().map(|request| {
            let done = &done;
            async move {
                let response = fetcher.fetch(request).await?;
                if !response.ok() {
                    return Err(NewswError::AssetRejected {
                        url: request.url().to_string(),
                        status: response.status(),
                    });
                }
                on_fetched(done.fetch_add(1, Ordering::SeqCst) + 1, total, request);
                Ok(response)
            }
        }))
        .await?;

        let mut staged = Vec::with_capacity(total);
        for (request, response) in requests.iter().zip(responses) {
            let entry = CacheEntry::new(request, response);
            match self.stage(request, &entry).await {
                Ok(paths) => staged.push(paths),
                Err(e) => {
                    discard(&staged).await;
                    return Err(e);
                }
            }
        }

        let mut committed: Vec<&StagedEntry> = Vec::with_capacity(staged.len());
        for entry in &staged {
            if let Err(e) = self.commit(entry).await {
                for done in &committed {
                    let _ = fs::remove_file(&done.target).await;
                }
                discard(&staged).await;
                return Err(e);
            }
            committed.push(entry);
        }

        debug!("Cached {} entries in {}", total, self.name);
        Ok(())
    }

    /// Summaries of every entry, sorted by URL
    pub async fn entries(&self) -> NewswResult<Vec<EntrySummary>> {
        let mut summaries = vec![];

        let mut dir = fs::read_dir(&self.dir)
            .await
            .map_err(|e| NewswError::io(format!("reading cache {}", self.name), e))?;

        while let Some(file) = dir
            .next_entry()
            .await
            .map_err(|e| NewswError::io(format!("reading cache {}", self.name), e))?
        {
            let path = file.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }

            match read_entry(&path).await {
                Ok(Some(entry)) => summaries.push(EntrySummary {
                    method: entry.method.clone(),
                    url: entry.url.clone(),
                    status: entry.status,
                    size: entry.body_len(),
                    cached_at: entry.cached_at,
                }),
                Ok(None) => {}
                Err(e) => warn!("Skipping unreadable cache entry: {}", e),
            }
        }

        summaries.sort_by(|a, b| a.url.cmp(&b.url).then(a.method.cmp(&b.method)));
        Ok(summaries)
    }

    /// Number of stored entries
    pub async fn len(&self) -> NewswResult<usize> {
        Ok(self.entries().await?.len())
    }

    pub async fn is_empty(&self) -> NewswResult<bool> {
        Ok(self.len().await? == 0)
    }

    async fn stage(&self, request: &Request, entry: &CacheEntry) -> NewswResult<StagedEntry> {
        let target = self.dir.join(entry_file_name(request));
        let temp = self.dir.join(format!(".tmp-{}", Uuid::new_v4()));

        let content = serde_json::to_vec(entry)?;
        fs::write(&temp, content)
            .await
            .map_err(|e| NewswError::io(format!("writing cache entry {}", temp.display()), e))?;

        Ok(StagedEntry { temp, target })
    }

    async fn commit(&self, staged: &StagedEntry) -> NewswResult<()> {
        fs::rename(&staged.temp, &staged.target).await.map_err(|e| {
            NewswError::io(
                format!("committing cache entry {}", staged.target.display()),
                e,
            )
        })
    }
}

struct StagedEntry {
    temp: PathBuf,
    target: PathBuf,
}

async fn discard(staged: &[StagedEntry]) {
    for entry in staged {
        let _ = fs::remove_file(&entry.temp).await;
    }
}

async fn read_entry(path: &Path) -> NewswResult<Option<CacheEntry>> {
    let content = match fs::read(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(NewswError::io(
                format!("reading cache entry {}", path.display()),
                e,
            ))
        }
    };

    serde_json::from_slice(&content)
        .map(Some)
        .map_err(|e| NewswError::CacheEntryCorrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}
