use crate::{
    api::transport::{Completion, Transport, TransportFactory},
    common::{
        data::{Error, TransportRequest, TransportResponse},
        util::Join,
    },
};
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::sync::Arc;
use tokio::runtime::Runtime;

/// A [`TransportFactory`] that performs actual network requests.
///
/// This is the production wiring default for code that accepts a transport
/// factory capability. One factory owns a hyper client and a small tokio
/// runtime; every [`create`](TransportFactory::create) call yields a
/// single-use [`HttpTransport`] sharing both.
pub struct HttpTransportFactory {
    runtime: Arc<Runtime>,
    client: Arc<Client<HttpConnector, Full<Bytes>>>,
}

impl HttpTransportFactory {
    pub fn new() -> Self {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .expect("cannot build tokio runtime for the HTTP transport");

        Self {
            runtime: Arc::new(runtime),
            client: Arc::new(Client::builder(TokioExecutor::new()).build(HttpConnector::new())),
        }
    }
}

impl Default for HttpTransportFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl TransportFactory for HttpTransportFactory {
    fn create(&self) -> Box<dyn Transport> {
        Box::new(HttpTransport {
            runtime: self.runtime.clone(),
            client: self.client.clone(),
        })
    }
}

/// A single-use, network-backed transport instance.
pub struct HttpTransport {
    runtime: Arc<Runtime>,
    client: Arc<Client<HttpConnector, Full<Bytes>>>,
}

impl Transport for HttpTransport {
    fn dispatch(self: Box<Self>, request: TransportRequest, on_complete: Completion) {
        on_complete(self.send(request));
    }
}

impl HttpTransport {
    fn send(&self, request: TransportRequest) -> Result<TransportResponse, Error> {
        let url = request.parsed_url()?;

        let mut builder = http::Request::builder()
            .method(request.method())
            .uri(url.as_str());
        for (name, value) in request.headers() {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let hyper_req = builder
            .body(Full::new(request.body_bytes()))
            .map_err(|e| Error::InvalidRequestData(e.to_string()))?;

        tracing::debug!("Sending {} {} over the network", request.method_str(), url);

        let client = self.client.clone();
        let (parts, body) = self
            .runtime
            .spawn(async move {
                let response = client
                    .request(hyper_req)
                    .await
                    .map_err(|e| Error::Upstream(e.to_string()))?;
                let (parts, body) = response.into_parts();
                let body = body
                    .collect()
                    .await
                    .map_err(|e| Error::Upstream(e.to_string()))?
                    .to_bytes();
                Ok::<_, Error>((parts, body))
            })
            .join()
            .map_err(|e| Error::Upstream(e.to_string()))??;

        let mut response = TransportResponse::new(parts.status.as_u16()).body(body);
        for (name, value) in parts.headers.iter() {
            response = response.header(
                name.as_str(),
                String::from_utf8_lossy(value.as_bytes()).to_string(),
            );
        }

        Ok(response)
    }
}
