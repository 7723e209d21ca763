//! Request dispatch
//!
//! Logs the request head, resolves the route, buffers the body when the
//! route needs it and builds the response.

use crate::handlers::{self, Route};
use crate::{body, Request, Response, Result};
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::{Body, Incoming};
use tracing::{debug, info};

/// Handle one request with any body type.
///
/// The response for a body-reading route is built only after the body has
/// reached end of stream.
pub async fn dispatch<B>(req: hyper::Request<B>) -> Result<Response>
where
    B: Body,
    B::Error: std::fmt::Display,
{
    let (parts, body) = req.into_parts();

    let mut request = match Request::from_parts(&parts) {
        Ok(request) => request,
        Err(e) => {
            info!(method = %parts.method, url = %parts.uri, headers = ?parts.headers, "request");
            debug!(error = %e, "no route for method");
            return Ok(handlers::not_found());
        }
    };

    info!(method = %request.method, url = %request.target, headers = ?request.headers, "request");

    let route = Route::resolve(request.method, &request.target);
    if route.reads_body() {
        request.body = body::read_to_end(body).await?;
        info!(body = %request.body_text(), "login body received");
    }

    route.respond(&request)
}

/// hyper service entry point
pub async fn serve(req: hyper::Request<Incoming>) -> Result<hyper::Response<Full<Bytes>>> {
    dispatch(req).await?.into_hyper()
}
