//! One-shot HTTP/1.1 exchange over a plain or TLS connection.
//!
//! # Design
//! `open` dials a fresh connection for every call, writes the request and
//! hands back an `Exchange`. The exchange is consumed as a sequence of
//! `TransportEvent`s: any number of `Chunk`s in arrival order, then exactly
//! one terminal `Complete` or `Error`. A failure while opening is reported
//! as that terminal `Error` before any chunk. After the terminal event the
//! exchange yields `None`.
//!
//! hyper's connection future is driven on a spawned task that is aborted
//! when the exchange is dropped, so no connection outlives its call.

use std::io;
use std::net::IpAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::{Request, Uri};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper_util::rt::TokioIo;
use rustls::pki_types::ServerName;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_rustls::TlsConnector;
use tracing::{debug, warn};
use url::Host;

use crate::error::FetchError;
use crate::request::{PreparedRequest, TransportOptions};
use crate::transport::TransportVariant;

/// What an in-flight exchange reports.
#[derive(Debug)]
pub enum TransportEvent {
    /// A fragment of the response body.
    Chunk(Bytes),
    /// The response body ended normally.
    Complete,
    /// The connection failed; no further events follow.
    Error(FetchError),
}

enum State {
    Failed(FetchError),
    Streaming(Incoming),
    Done,
}

/// A single request/response cycle on its own connection.
pub struct Exchange {
    status: u16,
    state: State,
    _driver: Option<DriverGuard>,
}

impl Exchange {
    /// Response status, or 0 when no response head was received.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Wait for the next event. Returns `None` once a terminal event has
    /// been delivered.
    pub async fn next_event(&mut self) -> Option<TransportEvent> {
        match std::mem::replace(&mut self.state, State::Done) {
            State::Done => None,
            State::Failed(err) => Some(TransportEvent::Error(err)),
            State::Streaming(mut body) => loop {
                match body.frame().await {
                    Some(Ok(frame)) => {
                        // Trailers carry no body bytes.
                        if let Ok(data) = frame.into_data() {
                            if !data.is_empty() {
                                self.state = State::Streaming(body);
                                return Some(TransportEvent::Chunk(data));
                            }
                        }
                    }
                    Some(Err(err)) => {
                        debug!(error = %err, "response body failed");
                        return Some(TransportEvent::Error(FetchError::connection(err)));
                    }
                    None => return Some(TransportEvent::Complete),
                }
            },
        }
    }
}

struct DriverGuard(JoinHandle<()>);

impl Drop for DriverGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Open a connection for `prepared` and send it.
///
/// `tls` is only consulted for the encrypted variant.
pub async fn open(prepared: PreparedRequest, tls: Arc<rustls::ClientConfig>) -> Exchange {
    let PreparedRequest { options, body } = prepared;
    debug!(
        method = %options.method,
        host = %options.host,
        port = options.port,
        variant = ?options.variant,
        "opening connection"
    );

    let mut driver = None;
    let result = match dial(&options, tls).await {
        Ok(Stream::Plain(tcp)) => send(TokioIo::new(tcp), options, body, &mut driver).await,
        Ok(Stream::Tls(tls)) => send(TokioIo::new(tls), options, body, &mut driver).await,
        Err(err) => Err(err),
    };

    match result {
        Ok((status, body)) => {
            debug!(status, "response head received");
            Exchange {
                status,
                state: State::Streaming(body),
                _driver: driver,
            }
        }
        Err(err) => {
            debug!(error = %err, "exchange failed before response");
            Exchange {
                status: 0,
                state: State::Failed(err),
                _driver: driver,
            }
        }
    }
}

enum Stream {
    Plain(TcpStream),
    Tls(Box<tokio_rustls::client::TlsStream<TcpStream>>),
}

async fn dial(
    options: &TransportOptions,
    tls: Arc<rustls::ClientConfig>,
) -> Result<Stream, FetchError> {
    let tcp = connect_tcp(&options.host, options.port)
        .await
        .map_err(FetchError::connection)?;
    match options.variant {
        TransportVariant::Plain => Ok(Stream::Plain(tcp)),
        TransportVariant::Encrypted => {
            let name = server_name(&options.host)?;
            let stream = TlsConnector::from(tls)
                .connect(name, tcp)
                .await
                .map_err(FetchError::connection)?;
            Ok(Stream::Tls(Box::new(stream)))
        }
    }
}

async fn connect_tcp(host: &Host<String>, port: u16) -> io::Result<TcpStream> {
    match host {
        Host::Domain(domain) => TcpStream::connect((domain.as_str(), port)).await,
        Host::Ipv4(addr) => TcpStream::connect((*addr, port)).await,
        Host::Ipv6(addr) => TcpStream::connect((*addr, port)).await,
    }
}

fn server_name(host: &Host<String>) -> Result<ServerName<'static>, FetchError> {
    match host {
        Host::Domain(domain) => {
            ServerName::try_from(domain.clone()).map_err(FetchError::connection)
        }
        Host::Ipv4(addr) => Ok(ServerName::from(IpAddr::V4(*addr))),
        Host::Ipv6(addr) => Ok(ServerName::from(IpAddr::V6(*addr))),
    }
}

async fn send<S>(
    io: TokioIo<S>,
    options: TransportOptions,
    body: Option<Bytes>,
    driver: &mut Option<DriverGuard>,
) -> Result<(u16, Incoming), FetchError>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
        .await
        .map_err(FetchError::connection)?;
    *driver = Some(DriverGuard(tokio::spawn(async move {
        if let Err(err) = conn.await {
            warn!(error = %err, "connection closed with error");
        }
    })));

    let response = sender
        .send_request(build_request(options, body))
        .await
        .map_err(FetchError::connection)?;
    Ok((response.status().as_u16(), response.into_body()))
}

fn build_request(options: TransportOptions, body: Option<Bytes>) -> Request<Full<Bytes>> {
    let mut request = Request::new(Full::new(body.unwrap_or_default()));
    *request.method_mut() = options.method.into();
    *request.uri_mut() = Uri::from(options.path);
    *request.headers_mut() = options.headers;
    request
}
