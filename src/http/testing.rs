//! Scripted network double shared by unit tests

use crate::error::{NewswError, NewswResult};
use crate::http::fetcher::Fetcher;
use crate::http::message::{Headers, Request, Response};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Clone)]
enum Reply {
    Status(u16, Vec<u8>, Vec<(String, String)>),
    Offline,
}

/// Answers by URL from a fixed table and records every call.
///
/// Unknown URLs and URLs marked offline fail with a network error.
#[derive(Default)]
pub struct ScriptedFetcher {
    replies: Mutex<HashMap<String, Reply>>,
    calls: Mutex<Vec<Request>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, url: &str, status: u16, body: &str) -> &Self {
        self.respond_with_headers(url, status, body, &[])
    }

    pub fn respond_with_headers(
        &self,
        url: &str,
        status: u16,
        body: &str,
        headers: &[(&str, &str)],
    ) -> &Self {
        let headers = headers
            .iter()
            .map(|(n, v)| (n.to_string(), v.to_string()))
            .collect();
        self.replies.lock().unwrap().insert(
            url.to_string(),
            Reply::Status(status, body.as_bytes().to_vec(), headers),
        );
        self
    }

    pub fn offline(&self, url: &str) -> &Self {
        self.replies
            .lock()
            .unwrap()
            .insert(url.to_string(), Reply::Offline);
        self
    }

    /// Mark every known URL as unreachable
    pub fn go_offline(&self) {
        for reply in self.replies.lock().unwrap().values_mut() {
            *reply = Reply::Offline;
        }
    }

    pub fn calls(&self) -> Vec<Request> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, url: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.url().as_str() == url)
            .count()
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, request: &Request) -> NewswResult<Response> {
        let url = request.url().to_string();
        self.calls.lock().unwrap().push(request.clone());

        let reply = self.replies.lock().unwrap().get(&url).cloned();
        match reply {
            Some(Reply::Status(status, body, headers)) => Ok(Response::new(
                status,
                request.url().clone(),
                headers.into_iter().collect::<Headers>(),
                body,
            )),
            Some(Reply::Offline) | None => Err(NewswError::network(url, "connection refused")),
        }
    }
}
