//! HTTP front end: parses the request, hands it to the renderer and the
//! optional converter, and maps errors to status codes.

use std::io::Read;
use std::net::SocketAddr;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use log::{debug, info, warn};
use serde_json::json;
use sha2::{Digest, Sha256};
use tiny_http::{Header, Method, Request, Response};

use crate::config::{resolve, PartialConfig};
use crate::convert::{Converter, OutputFormat};
use crate::error::{Error, Result};
use crate::render::render;

/// Converter shared by all request workers.
pub type SharedConverter = Arc<dyn Converter + Send + Sync>;

/// Largest request body accepted, in bytes.
const MAX_BODY: u64 = 64 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Request worker threads
    pub workers: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            workers: num_cpus::get(),
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// A transport-independent HTTP reply.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub headers: Vec<(&'static str, String)>,
    pub body: Vec<u8>,
}

impl Reply {
    fn new(status: u16, content_type: &'static str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            content_type,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    fn text(status: u16, body: impl Into<String>) -> Self {
        Self::new(status, "text/plain; charset=utf-8", body.into())
    }

    fn json(status: u16, value: serde_json::Value) -> Self {
        Self::new(status, "application/json", value.to_string())
    }

    fn empty(status: u16) -> Self {
        Self::new(status, "text/plain; charset=utf-8", Vec::new())
    }

    fn with_header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn error(err: &Error) -> Self {
        let status = match err {
            Error::ConfigValidation(_) | Error::MalformedRequest(_) | Error::UnsupportedFormat(_) => 400,
            Error::ConversionUnavailable => 501,
            Error::ConversionError(_) | Error::InitializationError(_) => 502,
            Error::Io(_) | Error::Server(_) => 500,
        };
        let fields = match err {
            Error::ConfigValidation(errors) => json!(errors),
            _ => json!([]),
        };
        Self::json(status, json!({ "error": err.to_string(), "fields": fields }))
    }
}

/// Request handling, separate from the socket loop so it can be driven directly.
pub struct CalendarService {
    converter: Option<SharedConverter>,
}

impl CalendarService {
    pub fn new(converter: Option<SharedConverter>) -> Self {
        Self { converter }
    }

    pub fn has_converter(&self) -> bool {
        self.converter.is_some()
    }

    /// Route one request. `url` is the path plus optional query string.
    pub fn handle(&self, method: &str, url: &str, body: &[u8]) -> Reply {
        let (path, query) = url.split_once('?').unwrap_or((url, ""));
        let reply = match (method, path) {
            ("OPTIONS", _) => Reply::empty(204)
                .with_header("Access-Control-Allow-Methods", "GET, POST, OPTIONS")
                .with_header("Access-Control-Allow-Headers", "Content-Type"),
            ("GET", "/") => Reply::text(200, "wallcal: POST /calendar?format=svg|png|pdf\n"),
            ("GET", "/status") => Reply::json(
                200,
                json!({
                    "name": env!("CARGO_PKG_NAME"),
                    "version": env!("CARGO_PKG_VERSION"),
                    "converter": self.has_converter(),
                }),
            ),
            ("GET", "/_ah/warmup") => Reply::empty(204),
            ("POST", "/calendar") => self
                .calendar(query, body)
                .unwrap_or_else(|e| Reply::error(&e)),
            (_, "/calendar") => Reply::text(405, "method not allowed").with_header("Allow", "POST, OPTIONS"),
            _ => Reply::text(404, "not found"),
        };
        reply.with_header("Access-Control-Allow-Origin", "*")
    }

    fn calendar(&self, query: &str, body: &[u8]) -> Result<Reply> {
        let format = match query_param(query, "format") {
            Some(f) if !f.is_empty() => f.parse::<OutputFormat>()?,
            _ => OutputFormat::Svg,
        };
        let body = std::str::from_utf8(body)
            .map_err(|e| Error::MalformedRequest(format!("body is not UTF-8: {}", e)))?;
        let partial = if body.trim().is_empty() {
            PartialConfig::default()
        } else {
            PartialConfig::from_json(body)?
        };
        let config = resolve(partial)?;
        let calendar = render(&config);

        if !format.needs_converter() {
            let etag = format!("\"{}\"", hex::encode(Sha256::digest(calendar.svg.as_bytes())));
            return Ok(Reply::new(200, format.content_type(), calendar.svg).with_header("ETag", etag));
        }

        let converter = self.converter.as_ref().ok_or(Error::ConversionUnavailable)?;
        let bytes = converter.convert(&calendar, format)?;
        Ok(Reply::new(200, format.content_type(), bytes).with_header(
            "Content-Disposition",
            format!("attachment; filename=\"{}\"", format.attachment_filename()),
        ))
    }
}

fn query_param(query: &str, name: &str) -> Option<String> {
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}

/// A bound listener plus the service answering on it.
pub struct HttpServer {
    server: Arc<tiny_http::Server>,
    service: Arc<CalendarService>,
    workers: usize,
}

impl HttpServer {
    pub fn bind(config: &ServerConfig, service: CalendarService) -> Result<Self> {
        let server = tiny_http::Server::http(config.addr())
            .map_err(|e| Error::Server(format!("Failed to bind {}: {}", config.addr(), e)))?;
        Ok(Self {
            server: Arc::new(server),
            service: Arc::new(service),
            workers: config.workers.max(1),
        })
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.server_addr().to_ip()
    }

    /// Serve on background threads until [`ServerHandle::shutdown`].
    pub fn spawn(self) -> ServerHandle {
        let workers = (0..self.workers)
            .map(|i| {
                let server = Arc::clone(&self.server);
                let service = Arc::clone(&self.service);
                thread::Builder::new()
                    .name(format!("wallcal-http-{i}"))
                    .spawn(move || worker_loop(&server, &service))
            })
            .filter_map(|res| res.map_err(|e| warn!("Failed to spawn HTTP worker: {}", e)).ok())
            .collect();
        ServerHandle {
            server: self.server,
            workers,
        }
    }

    /// Serve on the current thread plus `workers - 1` helpers. Never returns
    /// unless the listener fails.
    pub fn run(self) -> Result<()> {
        info!(
            "Listening on {} with {} workers",
            self.local_addr()
                .map(|a| a.to_string())
                .unwrap_or_else(|| "?".into()),
            self.workers
        );
        let server = Arc::clone(&self.server);
        let service = Arc::clone(&self.service);
        let helpers = HttpServer {
            server: Arc::clone(&self.server),
            service: Arc::clone(&self.service),
            workers: self.workers - 1,
        };
        let handle = helpers.spawn();
        worker_loop(&server, &service);
        handle.join();
        Err(Error::Server("listener closed".into()))
    }
}

pub struct ServerHandle {
    server: Arc<tiny_http::Server>,
    workers: Vec<JoinHandle<()>>,
}

impl ServerHandle {
    /// Wake every worker and wait for them to exit.
    pub fn shutdown(self) {
        for _ in 0..self.workers.len() {
            self.server.unblock();
        }
        self.join();
    }

    fn join(self) {
        for w in self.workers {
            let _ = w.join();
        }
    }
}

fn worker_loop(server: &tiny_http::Server, service: &CalendarService) {
    // unblock() makes recv fail, which ends the loop
    while let Ok(request) = server.recv() {
        if let Err(e) = respond(request, service) {
            warn!("Failed to send response: {}", e);
        }
    }
}

fn respond(mut request: Request, service: &CalendarService) -> std::io::Result<()> {
    let started = Instant::now();
    let method = request.method().clone();
    let method_name = method.to_string();
    let url = request.url().to_string();

    let mut body = Vec::new();
    let reply = if method == Method::Post {
        match request.as_reader().take(MAX_BODY + 1).read_to_end(&mut body) {
            Ok(n) if n as u64 > MAX_BODY => Reply::error(&Error::MalformedRequest(format!(
                "body exceeds {} bytes",
                MAX_BODY
            )))
            .with_header("Access-Control-Allow-Origin", "*"),
            Ok(_) => service.handle(&method_name, &url, &body),
            Err(e) => Reply::error(&Error::Io(e)).with_header("Access-Control-Allow-Origin", "*"),
        }
    } else {
        service.handle(&method_name, &url, &body)
    };

    let status = reply.status;
    let len = reply.body.len();
    let mut response = Response::from_data(reply.body).with_status_code(reply.status);
    if let Ok(h) = Header::from_bytes(&b"Content-Type"[..], reply.content_type.as_bytes()) {
        response = response.with_header(h);
    }
    for (name, value) in &reply.headers {
        match Header::from_bytes(name.as_bytes(), value.as_bytes()) {
            Ok(h) => response = response.with_header(h),
            Err(()) => debug!("Dropping invalid header {}", name),
        }
    }
    request.respond(response)?;
    info!("{} {} -> {} ({} bytes, {:?})", method_name, url, status, len, started.elapsed());
    Ok(())
}
