//! Async JSON client with one connection per call.
//!
//! # Design
//! `FetchClient` holds only immutable configuration behind an `Arc`, so it
//! is cheap to clone and safe to share between concurrent calls. Each verb
//! returns a `RequestBuilder` owned by that call; nothing about a request is
//! ever written back to the client. `send` prepares the request (rejecting
//! bad targets, headers and bodies before any I/O), runs the exchange and
//! settles exactly once, from the exchange's terminal event.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, debug_span, Instrument};
use url::Url;

use crate::adapter::{self, TransportEvent};
use crate::decoder::ResponseDecoder;
use crate::error::{FetchError, ResponseOutcome};
use crate::http::{Method, RequestSpec};
use crate::request::{self, PreparedRequest};

/// Client-wide settings. Fixed once the client is built.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Upper bound on a whole call, from connect to decode. `None` waits for
    /// the server indefinitely.
    pub timeout: Option<Duration>,
    /// TLS settings for `https` targets.
    pub tls: Arc<rustls::ClientConfig>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            tls: default_tls_config(),
        }
    }
}

/// TLS config trusting the bundled Mozilla root set.
pub(crate) fn default_tls_config() -> Arc<rustls::ClientConfig> {
    let roots = rustls::RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };
    Arc::new(
        rustls::ClientConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth(),
    )
}

/// Entry point for issuing GET/POST/PUT/DELETE calls.
///
/// ```rust,ignore
/// let client = FetchClient::new();
/// let user: User = client
///     .post("http://localhost:3000/users")
///     .header("content-type", "application/json")
///     .json(&new_user)
///     .send()
///     .await?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct FetchClient {
    config: Arc<FetchConfig>,
}

impl FetchClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> FetchClientBuilder {
        FetchClientBuilder::default()
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    pub fn get(&self, url: &str) -> RequestBuilder<'_> {
        self.request(Method::Get, url)
    }

    pub fn post(&self, url: &str) -> RequestBuilder<'_> {
        self.request(Method::Post, url)
    }

    pub fn put(&self, url: &str) -> RequestBuilder<'_> {
        self.request(Method::Put, url)
    }

    pub fn delete(&self, url: &str) -> RequestBuilder<'_> {
        self.request(Method::Delete, url)
    }

    pub fn request(&self, method: Method, url: &str) -> RequestBuilder<'_> {
        RequestBuilder {
            client: self,
            method,
            target: Url::parse(url).map_err(|e| FetchError::malformed(url, e)),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Run one call described by `spec` and decode its body into `T`.
    pub async fn execute<T: DeserializeOwned>(&self, spec: RequestSpec) -> ResponseOutcome<T> {
        let span = debug_span!("fetch", method = %spec.method, target = %spec.target);
        let prepared = request::prepare(spec)?;
        let call = exchange(prepared, self.config.tls.clone()).instrument(span);
        match self.config.timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .unwrap_or_else(|_| Err(FetchError::Timeout(limit))),
            None => call.await,
        }
    }
}

async fn exchange<T: DeserializeOwned>(
    prepared: PreparedRequest,
    tls: Arc<rustls::ClientConfig>,
) -> ResponseOutcome<T> {
    let mut exchange = adapter::open(prepared, tls).await;
    let mut decoder = ResponseDecoder::new();
    while let Some(event) = exchange.next_event().await {
        match event {
            TransportEvent::Chunk(chunk) => decoder.push(&chunk),
            TransportEvent::Complete => {
                debug!(status = exchange.status(), bytes = decoder.len(), "response complete");
                return decoder.finish(exchange.status());
            }
            TransportEvent::Error(err) => return Err(err),
        }
    }
    Err(FetchError::connection(io::Error::new(
        io::ErrorKind::UnexpectedEof,
        "exchange ended without a terminal event",
    )))
}

/// Builder for `FetchClient`.
#[derive(Debug, Default)]
pub struct FetchClientBuilder {
    timeout: Option<Duration>,
    tls: Option<Arc<rustls::ClientConfig>>,
}

impl FetchClientBuilder {
    /// Bound every call by `timeout`. Without this, calls never time out.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Use a custom rustls configuration (private roots, client certs).
    pub fn tls_config(mut self, tls: Arc<rustls::ClientConfig>) -> Self {
        self.tls = Some(tls);
        self
    }

    pub fn build(self) -> FetchClient {
        FetchClient {
            config: Arc::new(FetchConfig {
                timeout: self.timeout,
                tls: self.tls.unwrap_or_else(default_tls_config),
            }),
        }
    }
}

/// A single call being assembled. Consumed by `send`.
///
/// Errors found while building (an unparsable URL, a body that does not
/// serialize) are held until `send`, which returns them without opening a
/// connection.
#[derive(Debug)]
pub struct RequestBuilder<'a> {
    client: &'a FetchClient,
    method: Method,
    target: Result<Url, FetchError>,
    headers: Vec<(String, String)>,
    body: Option<Result<Bytes, FetchError>>,
}

impl<'a> RequestBuilder<'a> {
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Send `value` serialized as JSON. No `content-type` is added.
    pub fn json<B: Serialize + ?Sized>(mut self, value: &B) -> Self {
        self.body = Some(request::encode_body(value));
        self
    }

    /// Send bytes the caller already serialized.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(Ok(body.into()));
        self
    }

    /// Freeze the call into a `RequestSpec`, surfacing build errors.
    pub fn build(self) -> Result<RequestSpec, FetchError> {
        let target = self.target?;
        let body = self.body.transpose()?;
        Ok(RequestSpec {
            target,
            method: self.method,
            headers: self.headers,
            body,
        })
    }

    pub async fn send<T: DeserializeOwned>(self) -> ResponseOutcome<T> {
        let client = self.client;
        let spec = self.build()?;
        client.execute(spec).await
    }
}
