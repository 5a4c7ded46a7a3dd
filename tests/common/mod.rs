use http::Method;
use httpstub::{Transport, TransportFactory, TransportRequest};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// The kind of client this crate exists to test: a thin API wrapper that
/// issues requests through an injected transport factory and interprets the
/// outcome for its caller.
pub struct ApiClient {
    base_url: String,
    factory: Arc<dyn TransportFactory>,
}

#[derive(Error, Debug, PartialEq)]
pub enum FetchError {
    #[error("server responded with status {0}")]
    Status(u16),
    #[error("cannot parse response body: {0}")]
    Body(String),
    #[error("transport failed: {0}")]
    Transport(String),
}

impl ApiClient {
    pub fn new<S: Into<String>>(base_url: S, factory: Arc<dyn TransportFactory>) -> Self {
        Self {
            base_url: base_url.into(),
            factory,
        }
    }

    /// Issues a GET request and invokes `on_complete` exactly once when the
    /// response arrives: `Ok` with the parsed JSON body for a 2xx status,
    /// `Err` with the status code otherwise.
    pub fn fetch<F>(&self, path: &str, on_complete: F)
    where
        F: FnOnce(Result<Value, FetchError>) + Send + 'static,
    {
        let request = TransportRequest::new(Method::GET, format!("{}{}", self.base_url, path));

        self.factory.create().dispatch(
            request,
            Box::new(move |delivered| {
                let outcome = match delivered {
                    Ok(response) if response.is_success() => {
                        serde_json::from_slice(&response.body_bytes())
                            .map_err(|e| FetchError::Body(e.to_string()))
                    }
                    Ok(response) => Err(FetchError::Status(response.status())),
                    Err(e) => Err(FetchError::Transport(e.to_string())),
                };
                on_complete(outcome);
            }),
        );
    }

    /// Serializes `payload` as JSON, POSTs it, and invokes `on_complete`
    /// exactly once when the response arrives. The submit path performs no
    /// error interpretation: the handler fires regardless of the response
    /// status.
    pub fn submit<P, F>(&self, path: &str, payload: &P, on_complete: F)
    where
        P: Serialize,
        F: FnOnce() + Send + 'static,
    {
        let body = serde_json::to_vec(payload).expect("cannot serialize payload");
        let request = TransportRequest::new(Method::POST, format!("{}{}", self.base_url, path))
            .header("content-type", "application/json")
            .body(body);

        self.factory
            .create()
            .dispatch(request, Box::new(move |_delivered| on_complete()));
    }
}
