use super::debug::{HttpDebugConfig, truncate_for_log};
use crate::trace::SessionTrace;
use reqwest::Client;
use reqwest::header::HeaderMap;
use serde::Serialize;
use std::error::Error;
use std::fmt;
use std::future::Future;
use std::io::{self, Write};
#[cfg(test)]
use std::sync::{Arc, Mutex};

/// Anything that can POST a JSON body and hand back the raw response.
pub trait Transport {
    fn post_json<T: Serialize + Sync + ?Sized>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        payload: &T,
    ) -> impl Future<Output = Result<HttpResponseData, TransportError>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponseData {
    pub status: u16,
    pub body: String,
}

impl HttpResponseData {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for TransportError {}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self::new(err.to_string())
    }
}

#[derive(Clone)]
pub struct HttpClient {
    inner: Client,
    debug: HttpDebugConfig,
    sink: DebugSink,
    trace: Option<SessionTrace>,
}

#[derive(Clone)]
enum DebugSink {
    Stderr,
    #[cfg(test)]
    Memory(Arc<Mutex<Vec<String>>>),
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("debug", &self.debug)
            .field("traced", &self.trace.is_some())
            .finish()
    }
}

impl HttpClient {
    pub fn new(inner: Client, debug: HttpDebugConfig) -> Self {
        Self {
            inner,
            debug,
            sink: DebugSink::Stderr,
            trace: None,
        }
    }

    pub fn with_trace(mut self, trace: SessionTrace) -> Self {
        self.trace = Some(trace);
        self
    }

    async fn send_json<T: Serialize + Sync + ?Sized>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        payload: &T,
    ) -> Result<HttpResponseData, TransportError> {
        let body_json = serde_json::to_string(payload)
            .map_err(|err| TransportError::new(format!("failed to encode request: {err}")))?;
        let request = self
            .inner
            .post(url)
            .query(query)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body_json.clone())
            .build()?;

        self.debug_request(&request, &body_json);
        if let Some(trace) = &self.trace {
            trace.log_http_request(
                request.method().as_str(),
                &self.debug.filter().url(request.url()),
                request.headers(),
                &body_json,
            );
        }

        let response = self.inner.execute(request).await.inspect_err(|err| {
            if let Some(trace) = &self.trace {
                trace.log_http_error(&err.to_string());
            }
        })?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.text().await?;

        self.debug_response(status, &headers, &body);
        if let Some(trace) = &self.trace {
            trace.log_http_response(status, &headers, &body);
        }

        Ok(HttpResponseData { status, body })
    }

    fn debug_request(&self, request: &reqwest::Request, body_json: &str) {
        if self.debug.enabled {
            self.emit(request_lines(self.debug, request, body_json));
        }
    }

    fn debug_response(&self, status: u16, headers: &HeaderMap, body: &str) {
        if self.debug.enabled {
            self.emit(response_lines(self.debug, status, headers, body));
        }
    }

    fn emit(&self, lines: Vec<String>) {
        match &self.sink {
            DebugSink::Stderr => {
                let mut stderr = io::stderr().lock();
                for line in lines {
                    let _ = writeln!(stderr, "{line}");
                }
            }
            #[cfg(test)]
            DebugSink::Memory(buffer) => {
                if let Ok(mut buffer) = buffer.lock() {
                    buffer.extend(lines);
                }
            }
        }
    }

    #[cfg(test)]
    fn with_memory_sink(inner: Client, debug: HttpDebugConfig) -> (Self, Arc<Mutex<Vec<String>>>) {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let client = Self {
            inner,
            debug,
            sink: DebugSink::Memory(Arc::clone(&buffer)),
            trace: None,
        };
        (client, buffer)
    }
}

impl Transport for HttpClient {
    fn post_json<T: Serialize + Sync + ?Sized>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        payload: &T,
    ) -> impl Future<Output = Result<HttpResponseData, TransportError>> + Send {
        self.send_json(url, query, payload)
    }
}

fn request_lines(debug: HttpDebugConfig, request: &reqwest::Request, body: &str) -> Vec<String> {
    let filter = debug.filter();
    let mut lines = vec![format!(
        "[http-debug] > {} {}",
        request.method(),
        filter.url(request.url())
    )];
    lines.extend(request.headers().iter().map(|(name, value)| {
        format!(
            "[http-debug] > {}: {}",
            name.as_str(),
            filter.header(name.as_str(), value)
        )
    }));
    push_body(
        &mut lines,
        '>',
        &truncate_for_log(&filter.body(body), debug.max_body_chars),
    );
    lines
}

fn response_lines(debug: HttpDebugConfig, status: u16, headers: &HeaderMap, body: &str) -> Vec<String> {
    let filter = debug.filter();
    let mut lines = vec![format!("[http-debug] < HTTP {status}")];
    lines.extend(headers.iter().map(|(name, value)| {
        format!(
            "[http-debug] < {}: {}",
            name.as_str(),
            filter.header(name.as_str(), value)
        )
    }));
    push_body(
        &mut lines,
        '<',
        &truncate_for_log(&filter.body(body), debug.max_body_chars),
    );
    lines
}

fn push_body(lines: &mut Vec<String>, direction: char, body: &str) {
    lines.push(format!("[http-debug] {direction}"));
    if body.is_empty() {
        lines.push(format!("[http-debug] {direction} <empty body>"));
    } else {
        lines.extend(
            body.lines()
                .map(|line| format!("[http-debug] {direction} {line}")),
        );
    }
}
