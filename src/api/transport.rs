use crate::common::data::{Error, TransportRequest, TransportResponse};

/// The completion handler registered by the code under test when it
/// dispatches a request.
///
/// It is invoked exactly once per dispatched request, with the full delivered
/// response. The transport layer is content-agnostic: a non-2xx status still
/// arrives as `Ok`, and deciding whether that constitutes an error is the
/// caller's business. `Err` is reserved for the transport itself failing to
/// deliver anything (an I/O failure on a real transport, or dispatching
/// through a restored fake).
pub type Completion = Box<dyn FnOnce(Result<TransportResponse, Error>) + Send + 'static>;

/// A single-use transport instance: one instance per request.
///
/// `dispatch` consumes the instance, so a transport can never issue more than
/// one request. Implementations must invoke `on_complete` exactly once, when
/// the outcome of the request is known.
pub trait Transport: Send {
    fn dispatch(self: Box<Self>, request: TransportRequest, on_complete: Completion);
}

/// The capability the code under test accepts to create transport instances.
///
/// Production code wires in a network-backed factory; tests inject
/// [`FakeTransport::factory`](crate::FakeTransport::factory) instead. Factories
/// are shared as `Arc<dyn TransportFactory>` and must be cheap to call.
pub trait TransportFactory: Send + Sync {
    fn create(&self) -> Box<dyn Transport>;
}
