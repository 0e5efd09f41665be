//! Request classification by origin

use crate::http::{origin_of, Request};
use url::{Origin, Url};

/// Traffic class of an intercepted request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass {
    /// Same origin as the worker: cache first
    Static,
    /// Any other origin: network first
    Dynamic,
}

/// Stateless origin comparison. Method and path play no part.
#[derive(Debug, Clone)]
pub struct Router {
    origin: Origin,
}

impl Router {
    pub fn new(worker_origin: &Url) -> Self {
        Self {
            origin: origin_of(worker_origin),
        }
    }

    pub fn classify(&self, request: &Request) -> RequestClass {
        if origin_of(request.url()) == self.origin {
            RequestClass::Static
        } else {
            RequestClass::Dynamic
        }
    }
}
