//! Request preparation: turns a `RequestSpec` into wire-level options.
//!
//! # Design
//! Everything that can be rejected without touching the network is rejected
//! here: hosts, paths, header names and values, and JSON encoding of the
//! body. `TransportOptions` is a pure function of the `RequestSpec` and the
//! transport selection, so two calls never share one.

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue, HOST};
use http::uri::PathAndQuery;
use http::HeaderMap;
use serde::Serialize;
use url::{Host, Url};

use crate::error::FetchError;
use crate::http::{Method, RequestSpec};
use crate::transport::{self, TransportVariant};

/// Everything the transport needs to open a connection and write the head
/// of the request.
#[derive(Debug, Clone)]
pub struct TransportOptions {
    pub variant: TransportVariant,
    pub host: Host<String>,
    pub port: u16,
    pub path: PathAndQuery,
    pub method: Method,
    pub headers: HeaderMap,
}

/// Options plus the body bytes to write after the head.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub options: TransportOptions,
    pub body: Option<Bytes>,
}

/// Serialize a caller value as the JSON request body.
pub fn encode_body<B: Serialize + ?Sized>(value: &B) -> Result<Bytes, FetchError> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(FetchError::Serialization)
}

/// Derive the transport options for one call.
pub fn prepare(spec: RequestSpec) -> Result<PreparedRequest, FetchError> {
    let target = &spec.target;
    let selection = transport::select(target);

    let host = target
        .host()
        .map(|h| h.to_owned())
        .ok_or_else(|| FetchError::malformed(target.as_str(), "URL has no host"))?;
    let port = selection.port_for(target);
    let path = request_path(target)?;

    let mut headers = header_map(&spec.headers)?;
    if !headers.contains_key(HOST) {
        let value = HeaderValue::from_str(&authority(target))
            .map_err(|e| FetchError::malformed(target.as_str(), e))?;
        headers.insert(HOST, value);
    }

    Ok(PreparedRequest {
        options: TransportOptions {
            variant: selection.variant,
            host,
            port,
            path,
            method: spec.method,
            headers,
        },
        body: spec.body,
    })
}

/// Path plus query. The fragment never goes on the wire.
fn request_path(url: &Url) -> Result<PathAndQuery, FetchError> {
    let mut path = match url.path() {
        "" => "/".to_string(),
        p => p.to_string(),
    };
    if let Some(query) = url.query() {
        path.push('?');
        path.push_str(query);
    }
    PathAndQuery::try_from(path).map_err(|e| FetchError::malformed(url.as_str(), e))
}

/// `Host` header value: the host as written, with the port only when the
/// URL spells one out.
fn authority(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    }
}

fn header_map(pairs: &[(String, String)]) -> Result<HeaderMap, FetchError> {
    let mut headers = HeaderMap::with_capacity(pairs.len() + 1);
    for (name, value) in pairs {
        let invalid = |reason: String| FetchError::InvalidHeader {
            name: name.clone(),
            reason,
        };
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| invalid(e.to_string()))?;
        let header_value = HeaderValue::from_str(value).map_err(|e| invalid(e.to_string()))?;
        headers.append(header_name, header_value);
    }
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn spec(url: &str, method: Method) -> RequestSpec {
        RequestSpec::new(Url::parse(url).unwrap(), method)
    }

    #[test]
    fn plain_target_produces_port_80_options() {
        let prepared = prepare(spec("http://api.local/users", Method::Get)).unwrap();
        let options = prepared.options;
        assert_eq!(options.variant, TransportVariant::Plain);
        assert_eq!(options.host, Host::Domain("api.local".to_string()));
        assert_eq!(options.port, 80);
        assert_eq!(options.path.as_str(), "/users");
        assert_eq!(options.method, Method::Get);
        assert_eq!(options.headers[HOST], "api.local");
        assert!(prepared.body.is_none());
    }

    #[test]
    fn encrypted_target_with_explicit_port() {
        let options = prepare(spec("https://api.local:8443/v1?page=2#frag", Method::Put))
            .unwrap()
            .options;
        assert_eq!(options.variant, TransportVariant::Encrypted);
        assert_eq!(options.port, 8443);
        assert_eq!(options.path.as_str(), "/v1?page=2");
        assert_eq!(options.headers[HOST], "api.local:8443");
    }

    #[test]
    fn ipv6_host_keeps_brackets_in_host_header() {
        let options = prepare(spec("http://[::1]:3000/", Method::Get)).unwrap().options;
        assert!(matches!(options.host, Host::Ipv6(_)));
        assert_eq!(options.headers[HOST], "[::1]:3000");
    }

    #[test]
    fn caller_headers_are_kept_and_nothing_else_is_added() {
        let mut s = spec("http://api.local/", Method::Post);
        s.headers = vec![
            ("Authorization".to_string(), "Bearer abc".to_string()),
            ("x-trace".to_string(), "1".to_string()),
        ];
        let headers = prepare(s).unwrap().options.headers;
        assert_eq!(headers["authorization"], "Bearer abc");
        assert_eq!(headers["x-trace"], "1");
        assert!(headers.get(http::header::CONTENT_TYPE).is_none());
        assert_eq!(headers.len(), 3);
    }

    #[test]
    fn caller_host_header_wins() {
        let mut s = spec("http://127.0.0.1:9000/", Method::Get);
        s.headers = vec![("host".to_string(), "virtual.example".to_string())];
        let headers = prepare(s).unwrap().options.headers;
        assert_eq!(headers[HOST], "virtual.example");
        assert_eq!(headers.get_all(HOST).iter().count(), 1);
    }

    #[test]
    fn invalid_header_name_is_rejected() {
        let mut s = spec("http://api.local/", Method::Get);
        s.headers = vec![("bad header".to_string(), "v".to_string())];
        let err = prepare(s).unwrap_err();
        assert!(matches!(err, FetchError::InvalidHeader { ref name, .. } if name == "bad header"));
    }

    #[test]
    fn invalid_header_value_is_rejected() {
        let mut s = spec("http://api.local/", Method::Get);
        s.headers = vec![("x-line".to_string(), "a\nb".to_string())];
        assert!(matches!(
            prepare(s).unwrap_err(),
            FetchError::InvalidHeader { .. }
        ));
    }

    #[test]
    fn target_without_host_is_malformed() {
        let err = prepare(spec("mailto:someone@example.com", Method::Get)).unwrap_err();
        assert!(matches!(err, FetchError::MalformedTarget { .. }));
    }

    #[test]
    fn body_passes_through_untouched() {
        let mut s = spec("http://api.local/", Method::Post);
        s.body = Some(Bytes::from_static(b"{\"a\":1}"));
        let prepared = prepare(s).unwrap();
        assert_eq!(prepared.body.as_deref(), Some(&b"{\"a\":1}"[..]));
    }

    #[test]
    fn encode_body_writes_json() {
        let body = encode_body(&serde_json::json!({"name": "x", "n": 0})).unwrap();
        let back: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(back, serde_json::json!({"name": "x", "n": 0}));
    }

    #[test]
    fn encode_body_keeps_falsy_values() {
        assert_eq!(&encode_body(&0).unwrap()[..], b"0");
        assert_eq!(&encode_body(&false).unwrap()[..], b"false");
        assert_eq!(&encode_body("").unwrap()[..], b"\"\"");
    }

    #[test]
    fn encode_body_reports_unserializable_values() {
        let mut map = HashMap::new();
        map.insert((1, 2), "tuple keys are not JSON object keys");
        let err = encode_body(&map).unwrap_err();
        assert!(matches!(err, FetchError::Serialization(_)));
    }
}
