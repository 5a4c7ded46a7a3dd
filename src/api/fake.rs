use crate::{
    api::transport::{Completion, Transport, TransportFactory},
    common::data::{Error, TransportRequest, TransportResponse},
};
use bytes::Bytes;
use http::Method;
use std::borrow::Cow;
use std::sync::{Arc, Mutex};

type CreationObserver = Arc<dyn Fn(FakeRequest) + Send + Sync>;

/// One intercepted request, addressable through the ledger.
///
/// A `FakeRequest` is created the moment the code under test constructs a
/// transport instance through an installed [`FakeTransport`]'s factory, before
/// anything is dispatched. Once the code under test dispatches, the handle
/// exposes what was sent; once the test drives a response into it, the handle
/// exposes the captured completion state.
///
/// Handles are cheap clones of the same underlying entry: reading index `i`
/// from the ledger twice yields the same request identity.
#[derive(Clone)]
pub struct FakeRequest {
    state: Arc<Mutex<RequestState>>,
}

struct RequestState {
    index: usize,
    request: Option<TransportRequest>,
    on_complete: Option<Completion>,
    response: Option<TransportResponse>,
}

impl FakeRequest {
    fn new(index: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(RequestState {
                index,
                request: None,
                on_complete: None,
                response: None,
            })),
        }
    }

    /// The creation index of this request within its ledger.
    pub fn index(&self) -> usize {
        self.state.lock().unwrap().index
    }

    /// Whether the code under test has dispatched this request yet.
    pub fn is_dispatched(&self) -> bool {
        self.state.lock().unwrap().request.is_some()
    }

    /// Returns what the code under test dispatched, or `None` if the
    /// transport instance was created but nothing was sent through it yet.
    pub fn dispatched_request(&self) -> Option<TransportRequest> {
        self.state.lock().unwrap().request.clone()
    }

    /// The dispatched request's method.
    ///
    /// # Panics
    /// Panics if the request has not been dispatched yet.
    pub fn method(&self) -> Method {
        self.require_dispatched().method()
    }

    /// The dispatched request's URL.
    ///
    /// # Panics
    /// Panics if the request has not been dispatched yet.
    pub fn url(&self) -> String {
        self.require_dispatched().url().to_string()
    }

    /// The value of the first dispatched header with the given name,
    /// case-insensitively.
    ///
    /// # Panics
    /// Panics if the request has not been dispatched yet.
    pub fn header_value(&self, name: &str) -> Option<String> {
        self.require_dispatched()
            .header_value(name)
            .map(|v| v.to_string())
    }

    /// The dispatched request body.
    ///
    /// # Panics
    /// Panics if the request has not been dispatched yet.
    pub fn body_bytes(&self) -> Bytes {
        self.require_dispatched().body_bytes()
    }

    /// The dispatched request body as a string (lossy if not valid UTF-8).
    ///
    /// # Panics
    /// Panics if the request has not been dispatched yet.
    pub fn body_str(&self) -> String {
        match self.require_dispatched().body_str() {
            Cow::Borrowed(s) => s.to_string(),
            Cow::Owned(s) => s,
        }
    }

    /// Whether a response has been driven into this request.
    pub fn is_responded(&self) -> bool {
        self.state.lock().unwrap().response.is_some()
    }

    /// The captured completion state, or `None` if no response has been
    /// driven yet.
    pub fn response(&self) -> Option<TransportResponse> {
        self.state.lock().unwrap().response.clone()
    }

    /// Delivers a synthetic response to this request.
    ///
    /// Records the status, headers, and body on the entry, marks it as
    /// responded, and then invokes the completion handler the code under test
    /// registered at dispatch time with `Ok(response)`. The handler runs
    /// synchronously, in the same call stack as this call, so the test can
    /// assert on its effects on the next line.
    ///
    /// # Panics
    /// Panics if a response was already delivered to this request, or if the
    /// request was created but never dispatched. Both indicate a defective
    /// test rather than defective code under test; use
    /// [`FakeRequest::try_respond`] to handle them as values.
    pub fn respond(&self, response: TransportResponse) {
        if let Err(err) = self.try_respond(response) {
            panic!("cannot deliver synthetic response: {}", err);
        }
    }

    /// Delivers a synthetic response to this request. This method is the
    /// fallible equivalent of [`FakeRequest::respond`].
    pub fn try_respond(&self, response: TransportResponse) -> Result<(), Error> {
        let mut state = self.state.lock().unwrap();

        if state.response.is_some() {
            return Err(Error::ResponseAlreadyDelivered { index: state.index });
        }

        let on_complete = match state.on_complete.take() {
            Some(handler) => handler,
            None => return Err(Error::ResponseBeforeDispatch { index: state.index }),
        };

        state.response = Some(response.clone());
        let index = state.index;
        drop(state);

        tracing::debug!(
            "Delivering synthetic response with status {} to request {}",
            response.status(),
            index
        );

        on_complete(Ok(response));
        Ok(())
    }

    fn require_dispatched(&self) -> TransportRequest {
        let state = self.state.lock().unwrap();
        match &state.request {
            Some(request) => request.clone(),
            None => panic!(
                "request {} has been created but nothing was dispatched through it yet",
                state.index
            ),
        }
    }
}

struct Ledger {
    requests: Vec<FakeRequest>,
    installed: bool,
}

struct Shared {
    ledger: Mutex<Ledger>,
    on_create: Option<CreationObserver>,
    fallback: Option<Arc<dyn TransportFactory>>,
}

/// A transport double that captures requests instead of sending them.
///
/// Each `install` starts with a fresh, empty ledger; nothing is shared
/// between installations, so every test gets its own isolated request
/// history. The factory obtained from [`FakeTransport::factory`] is what you
/// inject into the code under test.
///
/// Restoration is guaranteed: [`FakeTransport::restore`] detaches the ledger
/// explicitly, and dropping the `FakeTransport` (including during a panic
/// unwind) does the same, so a failing test cannot leak its substitution into
/// factories that outlive it.
pub struct FakeTransport {
    shared: Arc<Shared>,
}

impl FakeTransport {
    /// Installs a fake transport with a fresh, empty ledger.
    pub fn install() -> Self {
        Self::builder().install()
    }

    /// Returns a builder for installations that need a creation observer or
    /// a fallback factory.
    pub fn builder() -> FakeTransportBuilder {
        FakeTransportBuilder {
            on_create: None,
            fallback: None,
        }
    }

    /// The injectable [`TransportFactory`] capability.
    ///
    /// While this fake is installed, every transport instance created through
    /// the returned factory appends one [`FakeRequest`] to the ledger, in
    /// creation order. After [`FakeTransport::restore`], the factory stops
    /// recording and delegates to the configured fallback instead.
    pub fn factory(&self) -> Arc<dyn TransportFactory> {
        Arc::new(FakeTransportFactory {
            shared: self.shared.clone(),
        })
    }

    /// The number of fake requests created so far.
    pub fn created(&self) -> usize {
        self.shared.ledger.lock().unwrap().requests.len()
    }

    /// Whether no request has been created yet.
    pub fn is_empty(&self) -> bool {
        self.created() == 0
    }

    /// Retrieves the `index`-th request created since installation
    /// (0-indexed).
    ///
    /// # Panics
    /// Panics if fewer than `index + 1` requests have been created. That
    /// usually means the code under test did not issue the request the test
    /// expected, or the test is driving responses out of order; use
    /// [`FakeTransport::try_request`] to handle it as a value.
    pub fn request(&self, index: usize) -> FakeRequest {
        match self.try_request(index) {
            Ok(request) => request,
            Err(err) => panic!("{}", err),
        }
    }

    /// Retrieves the `index`-th request created since installation
    /// (0-indexed). This method is the fallible equivalent of
    /// [`FakeTransport::request`].
    pub fn try_request(&self, index: usize) -> Result<FakeRequest, Error> {
        let ledger = self.shared.ledger.lock().unwrap();
        ledger
            .requests
            .get(index)
            .cloned()
            .ok_or(Error::RequestIndexOutOfRange {
                index,
                len: ledger.requests.len(),
            })
    }

    /// Handles to all requests created so far, in creation order.
    pub fn requests(&self) -> Vec<FakeRequest> {
        self.shared.ledger.lock().unwrap().requests.clone()
    }

    /// Whether this fake is still intercepting transport creation.
    pub fn is_installed(&self) -> bool {
        self.shared.ledger.lock().unwrap().installed
    }

    /// Detaches this fake from its factories.
    ///
    /// Transport instances created afterwards no longer populate the ledger:
    /// they come from the fallback factory if one was configured, and
    /// otherwise complete with [`Error::Restored`]. Requests captured before
    /// restoration stay readable and drivable. Calling `restore` a second
    /// time is a no-op.
    pub fn restore(&self) {
        let mut ledger = self.shared.ledger.lock().unwrap();
        if !ledger.installed {
            drop(ledger);
            tracing::warn!("restore() called on an already restored fake transport");
            return;
        }

        ledger.installed = false;
        tracing::debug!(
            "Fake transport restored after {} captured request(s)",
            ledger.requests.len()
        );
    }
}

impl Drop for FakeTransport {
    fn drop(&mut self) {
        let mut ledger = self.shared.ledger.lock().unwrap();
        if ledger.installed {
            ledger.installed = false;
            tracing::debug!("Fake transport dropped while installed, restoring");
        }
    }
}

/// Configures and installs a [`FakeTransport`].
pub struct FakeTransportBuilder {
    on_create: Option<CreationObserver>,
    fallback: Option<Arc<dyn TransportFactory>>,
}

impl FakeTransportBuilder {
    /// Registers a creation observer.
    ///
    /// The observer is invoked synchronously, once, every time a
    /// [`FakeRequest`] is created through the installed factory, with a
    /// handle to that request. The ledger itself is populated regardless;
    /// the observer is for tests that want to react to creation directly.
    pub fn on_create<F>(mut self, observer: F) -> Self
    where
        F: Fn(FakeRequest) + Send + Sync + 'static,
    {
        self.on_create = Some(Arc::new(observer));
        self
    }

    /// Sets the factory that serves transport creation after
    /// [`FakeTransport::restore`]. Without a fallback, post-restore
    /// transports complete with [`Error::Restored`].
    pub fn fallback(mut self, factory: Arc<dyn TransportFactory>) -> Self {
        self.fallback = Some(factory);
        self
    }

    /// Installs the fake transport.
    pub fn install(self) -> FakeTransport {
        tracing::debug!("Installing fake transport with a fresh ledger");
        FakeTransport {
            shared: Arc::new(Shared {
                ledger: Mutex::new(Ledger {
                    requests: Vec::new(),
                    installed: true,
                }),
                on_create: self.on_create,
                fallback: self.fallback,
            }),
        }
    }
}

struct FakeTransportFactory {
    shared: Arc<Shared>,
}

impl TransportFactory for FakeTransportFactory {
    fn create(&self) -> Box<dyn Transport> {
        let mut ledger = self.shared.ledger.lock().unwrap();

        if !ledger.installed {
            drop(ledger);
            tracing::debug!("Transport created through a restored fake, using fallback");
            return match &self.shared.fallback {
                Some(factory) => factory.create(),
                None => Box::new(RestoredTransport),
            };
        }

        let index = ledger.requests.len();
        let handle = FakeRequest::new(index);
        ledger.requests.push(handle.clone());
        drop(ledger);

        tracing::debug!("Recorded fake request {}", index);

        if let Some(observer) = &self.shared.on_create {
            observer(handle.clone());
        }

        Box::new(FakeTransportInstance { handle })
    }
}

struct FakeTransportInstance {
    handle: FakeRequest,
}

impl Transport for FakeTransportInstance {
    fn dispatch(self: Box<Self>, request: TransportRequest, on_complete: Completion) {
        let mut state = self.handle.state.lock().unwrap();
        tracing::debug!(
            "Captured dispatch of {} {} as request {}",
            request.method_str(),
            request.url(),
            state.index
        );
        state.request = Some(request);
        state.on_complete = Some(on_complete);
    }
}

/// Served by factories whose fake has been restored and that have no
/// fallback: completes immediately with an error and records nothing.
struct RestoredTransport;

impl Transport for RestoredTransport {
    fn dispatch(self: Box<Self>, _request: TransportRequest, on_complete: Completion) {
        on_complete(Err(Error::Restored));
    }
}
