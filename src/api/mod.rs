mod fake;
#[cfg(feature = "real")]
mod real;
mod transport;

pub use fake::{FakeRequest, FakeTransport, FakeTransportBuilder};
#[cfg(feature = "real")]
pub use real::{HttpTransport, HttpTransportFactory};
pub use transport::{Completion, Transport, TransportFactory};
