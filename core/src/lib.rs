//! Minimal async JSON client over plain and TLS HTTP/1.1.
//!
//! # Overview
//! `FetchClient` issues GET/POST/PUT/DELETE calls and decodes the fully
//! buffered response body as JSON into the caller's type. Every call opens
//! its own connection, sends one request and resolves to exactly one
//! `ResponseOutcome<T>`.
//!
//! # Design
//! - `transport::select` picks plain or TLS from the URL scheme and owns the
//!   default ports; unknown schemes fall back to plain.
//! - `request::prepare` turns a call-scoped `RequestSpec` into
//!   `TransportOptions`, rejecting bad input before any I/O.
//! - `adapter::open` runs the exchange and reports chunk / complete / error
//!   events; `ResponseDecoder` accumulates chunks and decodes on completion.
//! - The client holds only immutable configuration, so concurrent calls on
//!   one handle never share request state.
//! - No redirects, retries, pooling or implicit headers beyond `Host`.

pub mod adapter;
pub mod client;
pub mod decoder;
pub mod error;
pub mod http;
pub mod request;
pub mod transport;

pub use self::adapter::{Exchange, TransportEvent};
pub use self::client::{FetchClient, FetchClientBuilder, FetchConfig, RequestBuilder};
pub use self::decoder::ResponseDecoder;
pub use self::error::{FetchError, ResponseOutcome};
pub use self::http::{Method, RequestSpec};
pub use self::request::{PreparedRequest, TransportOptions};
pub use self::transport::{Selection, TransportVariant};
