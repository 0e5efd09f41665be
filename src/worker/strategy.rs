//! The two caching strategies behind request interception

use crate::cache::CacheStore;
use crate::error::NewswResult;
use crate::http::{Fetcher, Request, Response};
use tracing::{debug, warn};

/// Serve from the store; fall back to the network on a miss.
///
/// A miss is not written back. When the network also fails, its error is
/// returned to the requester.
pub async fn cache_first(
    store: &CacheStore,
    fetcher: &dyn Fetcher,
    request: &Request,
) -> NewswResult<Response> {
    match store.match_request(request).await {
        Ok(Some(cached)) => {
            debug!("Cache hit for {}", request);
            return Ok(cached);
        }
        Ok(None) => debug!("Cache miss for {}", request),
        Err(e) => warn!("Cache lookup for {} failed, using network: {}", request, e),
    }

    fetcher.fetch(request).await
}

/// Prefer the network and keep the store fresh; fall back to the store.
///
/// Any HTTP status counts as success and overwrites the stored entry. A
/// failed fetch yields the stored entry, which may be absent.
pub async fn network_first(
    store: &CacheStore,
    fetcher: &dyn Fetcher,
    request: &Request,
) -> NewswResult<Option<Response>> {
    match fetcher.fetch(request).await {
        Ok(fresh) => {
            if let Err(e) = store.put(request, fresh.duplicate()).await {
                warn!("Failed to cache {}: {}", request, e);
            }
            Ok(Some(fresh))
        }
        Err(e) => {
            debug!("Network failed for {}, trying cache: {}", request, e);
            match store.match_request(request).await {
                Ok(Some(cached)) => Ok(Some(cached)),
                Ok(None) => {
                    debug!("No cached fallback for {}", request);
                    Ok(None)
                }
                Err(e) => {
                    warn!("Cache lookup for {} failed, no fallback: {}", request, e);
                    Ok(None)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::testing::ScriptedFetcher;
    use crate::http::Headers;
    use tempfile::TempDir;
    use url::Url;

    fn test_store() -> (CacheStore, TempDir) {
        let temp = TempDir::new().unwrap();
        let store = CacheStore::new("news-v1".to_string(), temp.path().to_path_buf());
        (store, temp)
    }

    fn get(url: &str) -> Request {
        Request::get(Url::parse(url).unwrap())
    }

    fn body(url: &str, status: u16, text: &str) -> Response {
        Response::new(status, Url::parse(url).unwrap(), Headers::new(), text.as_bytes().to_vec())
    }

    const STATIC: &str = "http://localhost:8080/style.css";
    const API: &str = "https://newsapi.org/v2/everything";

    #[tokio::test]
    async fn cache_first_hit_skips_network() {
        let (store, _temp) = test_store();
        let fetcher = ScriptedFetcher::new();
        fetcher.respond(STATIC, 200, "network");
        store.put(&get(STATIC), body(STATIC, 200, "cached")).await.unwrap();

        let response = cache_first(&store, &fetcher, &get(STATIC)).await.unwrap();

        assert_eq!(response.into_body(), b"cached");
        assert!(fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn cache_first_miss_uses_network_without_writing() {
        let (store, _temp) = test_store();
        let fetcher = ScriptedFetcher::new();
        fetcher.respond(STATIC, 200, "network");

        let response = cache_first(&store, &fetcher, &get(STATIC)).await.unwrap();

        assert_eq!(response.text(), "network");
        assert_eq!(fetcher.call_count(STATIC), 1);
        assert!(store.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn cache_first_double_miss_fails() {
        let (store, _temp) = test_store();
        let fetcher = ScriptedFetcher::new();
        fetcher.offline(STATIC);

        let err = cache_first(&store, &fetcher, &get(STATIC)).await.unwrap_err();
        assert!(err.is_network());
    }

    #[tokio::test]
    async fn network_first_stores_success_and_error_statuses() {
        for status in [200, 404] {
            let (store, _temp) = test_store();
            let fetcher = ScriptedFetcher::new();
            fetcher.respond(API, status, "fresh");
            store.put(&get(API), body(API, 200, "stale")).await.unwrap();

            let response = network_first(&store, &fetcher, &get(API))
                .await
                .unwrap()
                .unwrap();
            assert_eq!(response.status(), status);
            assert_eq!(response.text(), "fresh");

            let stored = store.match_request(&get(API)).await.unwrap().unwrap();
            assert_eq!(stored.status(), status);
            assert_eq!(stored.text(), "fresh");
        }
    }

    #[tokio::test]
    async fn network_first_falls_back_to_cache() {
        let (store, _temp) = test_store();
        let fetcher = ScriptedFetcher::new();
        fetcher.offline(API);
        store.put(&get(API), body(API, 200, "stale")).await.unwrap();

        let response = network_first(&store, &fetcher, &get(API))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(response.text(), "stale");
    }

    #[tokio::test]
    async fn network_first_treats_corrupt_entry_as_missing() {
        let (store, temp) = test_store();
        let fetcher = ScriptedFetcher::new();
        fetcher.offline(API);
        store.put(&get(API), body(API, 200, "stale")).await.unwrap();
        for file in std::fs::read_dir(temp.path()).unwrap() {
            std::fs::write(file.unwrap().path(), "{ not json").unwrap();
        }

        let response = network_first(&store, &fetcher, &get(API)).await.unwrap();
        assert!(response.is_none());
    }

    #[tokio::test]
    async fn stored_binary_body_is_returned_unchanged() {
        let bytes = vec![0x89, 0x50, 0x4e, 0x47, 0x00, 0xff, 0xfe, 0x80];
        let (store, _temp) = test_store();
        let fetcher = ScriptedFetcher::new();
        fetcher.offline(API);
        let image = Response::new(200, Url::parse(API).unwrap(), Headers::new(), bytes.clone());
        store.put(&get(API), image).await.unwrap();

        let fallback = network_first(&store, &fetcher, &get(API))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fallback.into_body(), bytes);

        let hit = cache_first(&store, &fetcher, &get(API)).await.unwrap();
        assert_eq!(hit.into_body(), bytes);
    }

    #[tokio::test]
    async fn network_first_offline_without_cache_is_empty() {
        let (store, _temp) = test_store();
        let fetcher = ScriptedFetcher::new();
        fetcher.offline(API);

        let response = network_first(&store, &fetcher, &get(API)).await.unwrap();
        assert!(response.is_none());
    }
}
