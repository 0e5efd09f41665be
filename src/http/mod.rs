//! HTTP primitives shared by the page and the worker

mod fetcher;
mod message;
#[cfg(test)]
pub(crate) mod testing;

pub use fetcher::{Fetcher, UreqFetcher};
pub use message::{reason_phrase, Headers, Request, Response};

use url::{Origin, Url};

/// Origin tuple of a URL, used to classify requests
pub fn origin_of(url: &Url) -> Origin {
    url.origin()
}
