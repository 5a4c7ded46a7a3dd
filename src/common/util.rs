use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// A wrapper around `bytes::Bytes` used for request and response bodies.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct HttpStubBytes(pub Bytes);

impl HttpStubBytes {
    /// Converts the bytes to a `Vec<u8>`.
    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    /// Cheaply clones the bytes into a new `Bytes` instance.
    pub fn to_bytes(&self) -> Bytes {
        self.0.clone()
    }

    /// Checks if the byte slice is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Converts the bytes to a UTF-8 string, potentially lossy.
    /// Tries to borrow the input as a UTF-8 string first to avoid copying and
    /// creating an owned instance. If the bytes are not valid UTF-8, it
    /// creates a lossy string by replacing invalid characters with the
    /// Unicode replacement character.
    pub fn to_maybe_lossy_str(&self) -> Cow<str> {
        match std::str::from_utf8(&self.0) {
            Ok(valid_str) => Cow::Borrowed(valid_str),
            Err(_) => Cow::Owned(String::from_utf8_lossy(&self.0).to_string()),
        }
    }
}

impl From<Bytes> for HttpStubBytes {
    fn from(value: Bytes) -> Self {
        HttpStubBytes(value)
    }
}

impl From<HttpStubBytes> for Bytes {
    fn from(value: HttpStubBytes) -> Self {
        value.0
    }
}

impl PartialEq for HttpStubBytes {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl AsRef<[u8]> for HttpStubBytes {
    fn as_ref(&self) -> &[u8] {
        self.0.as_ref()
    }
}

impl std::fmt::Display for HttpStubBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.to_maybe_lossy_str())
    }
}

/// Extension trait for blocking on a future without a surrounding runtime.
#[cfg(feature = "real")]
pub(crate) trait Join: std::future::Future {
    fn join(self) -> <Self as std::future::Future>::Output;
}

#[cfg(feature = "real")]
impl<F: std::future::Future> Join for F {
    fn join(self) -> <Self as std::future::Future>::Output {
        use crossbeam_utils::sync::{Parker, Unparker};
        use futures_util::{pin_mut, task::ArcWake};
        use std::{
            sync::Arc,
            task::{Context, Poll},
        };

        struct ThreadWaker(Unparker);

        impl ArcWake for ThreadWaker {
            fn wake_by_ref(arc_self: &Arc<Self>) {
                arc_self.0.unpark();
            }
        }

        let parker = Parker::new();
        let waker = futures_util::task::waker(Arc::new(ThreadWaker(parker.unparker().clone())));
        let mut context = Context::from_waker(&waker);

        let future = self;
        pin_mut!(future);

        loop {
            match future.as_mut().poll(&mut context) {
                Poll::Ready(output) => return output,
                Poll::Pending => parker.park(),
            }
        }
    }
}

#[cfg(all(test, feature = "real"))]
mod test {
    use super::Join;

    #[test]
    fn join_drives_a_ready_future() {
        let result = async { 40 + 2 }.join();

        assert_eq!(result, 42);
    }
}
