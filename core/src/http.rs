//! Plain-data description of one outgoing call.
//!
//! # Design
//! A `RequestSpec` is built fresh for every call and moved through request
//! preparation, the transport and the decoder. Nothing in it is ever stored
//! on the client, so concurrent calls on one client cannot observe each
//! other's target, headers or body.

use std::fmt;

use bytes::Bytes;
use url::Url;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for http::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => http::Method::GET,
            Method::Post => http::Method::POST,
            Method::Put => http::Method::PUT,
            Method::Delete => http::Method::DELETE,
        }
    }
}

/// One outgoing request, owned by the call that issues it.
///
/// `body` is already serialized; the fluent builder is where JSON encoding
/// of caller values happens.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    pub target: Url,
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub body: Option<Bytes>,
}

impl RequestSpec {
    pub fn new(target: Url, method: Method) -> Self {
        Self {
            target,
            method,
            headers: Vec::new(),
            body: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_strings_match_the_wire() {
        assert_eq!(Method::Get.as_str(), "GET");
        assert_eq!(Method::Post.to_string(), "POST");
        assert_eq!(http::Method::from(Method::Put), http::Method::PUT);
        assert_eq!(http::Method::from(Method::Delete), http::Method::DELETE);
    }

    #[test]
    fn new_spec_has_no_headers_or_body() {
        let spec = RequestSpec::new(Url::parse("http://localhost/a").unwrap(), Method::Get);
        assert!(spec.headers.is_empty());
        assert!(spec.body.is_none());
    }
}
