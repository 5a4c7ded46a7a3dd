//! `httpstub` is a Rust crate that allows you to test asynchronous HTTP-request
//! code without touching the network. It contains two major components:
//!
//! * a **fake transport** that intercepts outgoing requests and records them in
//!   an ordered ledger, and
//! * a **response driver** that lets the test body answer a captured request
//!   with a synthetic status, headers, and body.
//!
//! Unlike a mock HTTP server, nothing is bound to a socket: the code under test
//! is handed a [`TransportFactory`] capability, and in tests that capability is
//! a [`FakeTransport`]'s factory. Responses are delivered synchronously, in the
//! same call stack as the test's explicit [`FakeRequest::respond`] call, which
//! makes tests deterministic and order-independent.
//!
//! # Getting Started
//! Add `httpstub` in your `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! httpstub = "0.1"
//! ```
//!
//! You can then use `httpstub` in your tests like shown in the following example:
//! ```rust
//! use httpstub::prelude::*;
//! use std::sync::atomic::{AtomicU16, Ordering};
//! use std::sync::Arc;
//!
//! // Install a fake transport. Its factory is what you hand to the
//! // code under test instead of the real, network-backed factory.
//! let transport = FakeTransport::install();
//! let factory = transport.factory();
//!
//! // This stands in for your code under test: it creates one transport
//! // instance, issues a request, and registers a completion handler.
//! let status = Arc::new(AtomicU16::new(0));
//! let sink = status.clone();
//! factory.create().dispatch(
//!     TransportRequest::new(Method::GET, "http://localhost/translate?word=hello"),
//!     Box::new(move |delivered| {
//!         sink.store(delivered.unwrap().status(), Ordering::SeqCst);
//!     }),
//! );
//!
//! // The request was captured instead of sent. Drive a synthetic
//! // response into it; the completion handler fires before `respond`
//! // returns.
//! transport.request(0).respond(TransportResponse::new(200).body("Привет"));
//!
//! assert_eq!(status.load(Ordering::SeqCst), 200);
//! assert_eq!(transport.request(0).url(), "http://localhost/translate?word=hello");
//! ```
//!
//! # Usage
//! The expected style of usage is as follows:
//! * Create a [`FakeTransport`] with [`FakeTransport::install`] at the top of
//!   the test (or [`FakeTransport::builder`] for a creation observer or a
//!   fallback factory).
//! * Inject [`FakeTransport::factory`] into the code under test. Every
//!   transport instance the code under test creates while the fake is
//!   installed appends one [`FakeRequest`] to the ledger, in creation order.
//! * Address captured requests by index with [`FakeTransport::request`] and
//!   inspect what was sent (method, URL, headers, body).
//! * Answer them with [`FakeRequest::respond`]. The completion handler the
//!   code under test registered is invoked exactly once, synchronously.
//!
//! The fake is detached with [`FakeTransport::restore`], and detaches itself
//! when dropped, so a panicking test body cannot leak its substitution into
//! factories it handed out. After restoration the ledger is frozen: factories
//! still held by the code under test stop recording.
//!
//! # Interpreting responses
//! The driver is content-agnostic: it delivers whatever status, headers, and
//! body it is given and never special-cases error codes. Deciding that a
//! non-2xx status is an error (and parsing the body) is the business of the
//! code under test, as it would be against a real transport.
//!
//! # Production wiring
//! With the `real` cargo feature enabled, the crate ships
//! `HttpTransportFactory`, a hyper-backed [`TransportFactory`] that performs
//! actual network requests. It exists so the same injection seam serves both
//! deployments and tests; `httpstub` itself is otherwise a dev-dependency.
//!
//! # Debugging
//! `httpstub` logs through the `tracing` crate with the `log` bridge enabled.
//! With the `env_logger` backend, set the `RUST_LOG` environment variable to
//! `debug` and call `env_logger::try_init()` in your test to see every
//! install, capture, and delivery.

mod api;
mod common;

#[cfg(feature = "real")]
pub use api::{HttpTransport, HttpTransportFactory};
pub use api::{Completion, FakeRequest, FakeTransport, FakeTransportBuilder, Transport, TransportFactory};
pub use common::data::{Error, TransportRequest, TransportResponse};
pub use common::util::HttpStubBytes;

/// The commonly used items of this crate, bundled for glob import in tests.
pub mod prelude {
    pub use crate::{
        FakeRequest, FakeTransport, Transport, TransportFactory, TransportRequest,
        TransportResponse,
    };
    pub use http::Method;
}
