//! HTTP Request types

use crate::{Error, Result};
use bytes::Bytes;
use smallvec::SmallVec;
use std::str::FromStr;

/// HTTP Methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
    Connect,
    Trace,
}

impl Method {
    /// Convert to string
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Patch => "PATCH",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
            Method::Connect => "CONNECT",
            Method::Trace => "TRACE",
        }
    }
}

/// Method tokens are case-sensitive, so `get` is not `GET`.
impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            "PATCH" => Ok(Method::Patch),
            "HEAD" => Ok(Method::Head),
            "OPTIONS" => Ok(Method::Options),
            "CONNECT" => Ok(Method::Connect),
            "TRACE" => Ok(Method::Trace),
            _ => Err(Error::InvalidMethod(s.to_string())),
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HTTP Request
#[derive(Debug, Clone)]
pub struct Request {
    /// HTTP method
    pub method: Method,
    /// Request target exactly as sent on the request line
    pub target: String,
    /// Request path (without query string)
    pub path: String,
    /// Query string (without leading ?)
    pub query: Option<String>,
    /// Request headers in arrival order
    pub headers: SmallVec<[(String, String); 16]>,
    /// Request body, empty until buffered
    pub body: Bytes,
}

impl Request {
    /// Create a new request
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            method,
            target: path.clone(),
            path,
            query: None,
            headers: SmallVec::new(),
            body: Bytes::new(),
        }
    }

    /// Build from the head of a hyper request.
    ///
    /// The target keeps absolute-form URIs intact. Header values are
    /// decoded lossily. The body is left empty.
    pub fn from_parts(parts: &http::request::Parts) -> Result<Self> {
        let method = parts.method.as_str().parse()?;
        let mut request = Request::new(method, parts.uri.path());
        request.target = parts.uri.to_string();
        request.query = parts.uri.query().map(str::to_string);

        for (name, value) in &parts.headers {
            let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
            request.headers.push((name.to_string(), value));
        }

        Ok(request)
    }

    /// Get a header value (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Body decoded as UTF-8, invalid sequences replaced
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Builder for constructing requests
pub struct RequestBuilder {
    request: Request,
}

impl RequestBuilder {
    /// Create a new builder
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            request: Request::new(method, path),
        }
    }

    /// Set query string
    pub fn query(mut self, query: impl Into<String>) -> Self {
        let query = query.into();
        self.request.target = format!("{}?{}", self.request.path, query);
        self.request.query = Some(query);
        self
    }

    /// Add a header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request.headers.push((name.into(), value.into()));
        self
    }

    /// Set body
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.request.body = body.into();
        self
    }

    /// Build the request
    pub fn build(self) -> Request {
        self.request
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_parse() {
        assert_eq!("GET".parse::<Method>().unwrap(), Method::Get);
        assert_eq!("DELETE".parse::<Method>().unwrap(), Method::Delete);
        assert!("post".parse::<Method>().is_err());
        assert!("BREW".parse::<Method>().is_err());
    }

    #[test]
    fn test_request_header() {
        let req = RequestBuilder::new(Method::Get, "/")
            .header("Content-Type", "application/x-www-form-urlencoded")
            .build();

        assert_eq!(req.header("content-type"), Some("application/x-www-form-urlencoded"));
        assert_eq!(req.header("CONTENT-TYPE"), Some("application/x-www-form-urlencoded"));
        assert_eq!(req.header("accept"), None);
    }

    #[test]
    fn test_target_keeps_query() {
        let req = RequestBuilder::new(Method::Get, "/").build();
        assert_eq!(req.target, "/");

        let req = RequestBuilder::new(Method::Get, "/").query("next=home").build();
        assert_eq!(req.target, "/?next=home");
    }

    #[test]
    fn test_from_parts() {
        let (parts, ()) = http::Request::builder()
            .method("POST")
            .uri("/login?from=form")
            .header("Host", "localhost:5000")
            .header("Content-Length", "9")
            .body(())
            .unwrap()
            .into_parts();

        let req = Request::from_parts(&parts).unwrap();
        assert_eq!(req.method, Method::Post);
        assert_eq!(req.target, "/login?from=form");
        assert_eq!(req.path, "/login");
        assert_eq!(req.query.as_deref(), Some("from=form"));
        assert_eq!(req.header("host"), Some("localhost:5000"));
        assert!(req.body.is_empty());
    }

    #[test]
    fn test_from_parts_keeps_absolute_form_target() {
        let (parts, ()) = http::Request::builder()
            .method("GET")
            .uri("http://localhost:5000/")
            .body(())
            .unwrap()
            .into_parts();

        let req = Request::from_parts(&parts).unwrap();
        assert_eq!(req.target, "http://localhost:5000/");
        assert_eq!(req.path, "/");
    }

    #[test]
    fn test_from_parts_keeps_non_ascii_header() {
        let (parts, ()) = http::Request::builder()
            .method("GET")
            .uri("/")
            .header("x-user", http::HeaderValue::from_bytes(b"caf\xc3\xa9").unwrap())
            .header("x-raw", http::HeaderValue::from_bytes(b"a\xffb").unwrap())
            .body(())
            .unwrap()
            .into_parts();

        let req = Request::from_parts(&parts).unwrap();
        assert_eq!(req.header("x-user"), Some("caf\u{e9}"));
        assert_eq!(req.header("x-raw"), Some("a\u{fffd}b"));
    }

    #[test]
    fn test_from_parts_rejects_extension_method() {
        let (parts, ()) = http::Request::builder()
            .method("PURGE")
            .uri("/")
            .body(())
            .unwrap()
            .into_parts();

        assert!(matches!(
            Request::from_parts(&parts),
            Err(Error::InvalidMethod(m)) if m == "PURGE"
        ));
    }

    #[test]
    fn test_body_text_is_lossy() {
        let req = RequestBuilder::new(Method::Post, "/login")
            .body(vec![b'o', b'k', 0xff])
            .build();
        assert_eq!(req.body_text(), "ok\u{fffd}");
    }
}
