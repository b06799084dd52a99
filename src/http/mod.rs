//! REST API over `may_minihttp`.
//!
//! Each connection is served on its own coroutine. The adapter in this module
//! only moves bytes: it turns the wire request into an [`ApiRequest`], hands
//! it to the [`Router`] and writes the [`ApiResponse`] back with the CORS
//! headers attached.

pub mod context;
pub mod dto;
pub mod middleware;
pub mod request;
pub mod response;
pub mod router;

pub use context::{RequestContext, TRACE_ID_HEADER};
pub use request::{ApiRequest, QueryParams};
pub use response::ApiResponse;
pub use router::Router;

use crate::service::CatalogService;
use may::coroutine::JoinHandle;
use may_minihttp::{HttpServer, HttpService, Request, Response};
use std::io::{self, Read};

#[cfg(any(feature = "metrics", feature = "tracing"))]
use std::time::Instant;

#[derive(Clone)]
pub struct CatalogHttpService {
    router: Router,
}

impl CatalogHttpService {
    pub fn new(service: CatalogService) -> Self {
        Self {
            router: Router::new(service),
        }
    }
}

fn content_type_header(content_type: &str) -> &'static str {
    match content_type {
        "application/json" => "Content-Type: application/json",
        "text/plain; version=0.0.4" => "Content-Type: text/plain; version=0.0.4",
        _ => "Content-Type: text/plain",
    }
}

/// Reads what the router needs out of the wire request.
fn read_request(req: Request) -> io::Result<ApiRequest> {
    let mut api = ApiRequest::new(req.method(), req.path());
    let trace_id = req
        .headers()
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(TRACE_ID_HEADER))
        .map(|h| String::from_utf8_lossy(h.value).into_owned());
    if let Some(trace_id) = trace_id {
        api = api.with_trace_id(trace_id);
    }

    let mut body = Vec::new();
    req.body().read_to_end(&mut body)?;
    Ok(api.with_body(body))
}

fn write_response(rsp: &mut Response, api: &ApiResponse) {
    rsp.status_code(api.status as usize, response::reason_phrase(api.status));
    for header in middleware::CORS_HEADERS {
        rsp.header(header);
    }
    if api.status != 204 {
        rsp.header(content_type_header(api.content_type));
        rsp.body_mut().extend_from_slice(&api.body);
    }
}

impl HttpService for CatalogHttpService {
    fn call(&mut self, req: Request, rsp: &mut Response) -> io::Result<()> {
        #[cfg(any(feature = "metrics", feature = "tracing"))]
        let start = Instant::now();

        if middleware::is_preflight(req.method()) {
            write_response(rsp, &ApiResponse::no_content());
            return Ok(());
        }

        let api_req = match read_request(req) {
            Ok(api_req) => api_req,
            Err(e) => {
                log::error!("cannot read request body: {}", e);
                write_response(rsp, &ApiResponse::invalid("cannot read request body"));
                return Ok(());
            }
        };
        let ctx = RequestContext::new(api_req.trace_id.as_deref());

        #[cfg(feature = "tracing")]
        let _span = crate::metrics::tracing_helpers::http_request_span(
            &api_req.method,
            &api_req.path,
            &ctx.trace_id,
        )
        .entered();

        let api_rsp = self.router.handle(&api_req, &ctx);
        write_response(rsp, &api_rsp);

        #[cfg(feature = "metrics")]
        crate::metrics::METRICS.record_http_request(
            &api_req.method,
            api_rsp.status as usize,
            start.elapsed(),
        );
        #[cfg(feature = "tracing")]
        log::debug!(
            "{} {} -> {} in {:?}",
            api_req.method,
            api_req.path,
            api_rsp.status,
            start.elapsed()
        );

        Ok(())
    }
}

/// Starts the server on `address`; the returned handle runs until the
/// process exits.
pub fn start(address: &str, service: CatalogService) -> io::Result<JoinHandle<()>> {
    log::info!("REST server listening on {}", address);
    HttpServer(CatalogHttpService::new(service)).start(address)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_header_lines() {
        assert_eq!(
            content_type_header("application/json"),
            "Content-Type: application/json"
        );
        assert_eq!(content_type_header("anything"), "Content-Type: text/plain");
    }
}
