// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use encoding_rs::{Decoder, UTF_8};
use kbsearch_app::{ChunkSource, Row, SearchRequest, SummaryRequest, normalize_response};
use reqwest::StatusCode;
use reqwest::blocking::{Client as HttpClient, Response};
use serde::Deserialize;
use serde_json::Value;
use std::io::Read;
use std::time::Duration;
use url::Url;

const READ_BUFFER_BYTES: usize = 4096;

#[derive(Debug, Clone)]
pub struct Client {
    search_url: String,
    summarize_url: String,
    timeout: Duration,
    stream_timeout: Duration,
    http: HttpClient,
}

impl Client {
    pub fn new(
        search_url: &str,
        summarize_url: &str,
        timeout: Duration,
        stream_timeout: Duration,
    ) -> Result<Self> {
        let search_url = validate_endpoint("api.search_url", search_url)?;
        let summarize_url = validate_endpoint("api.summarize_url", summarize_url)?;

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            search_url,
            summarize_url,
            timeout,
            stream_timeout,
            http,
        })
    }

    pub fn search_url(&self) -> &str {
        &self.search_url
    }

    pub fn summarize_url(&self) -> &str {
        &self.summarize_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn stream_timeout(&self) -> Duration {
        self.stream_timeout
    }

    /// Posts the query and normalizes the hits. A body that is not a JSON
    /// array comes back as an empty result set rather than an error.
    pub fn search(&self, request: &SearchRequest) -> Result<Vec<Row>> {
        tracing::debug!(url = %self.search_url, "sending search request");
        let response = self
            .http
            .post(&self.search_url)
            .json(request)
            .send()
            .map_err(|error| connection_error(&self.search_url, error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }

        let body = response.text().context("read search response")?;
        let parsed = match serde_json::from_str::<Value>(&body) {
            Ok(parsed) => parsed,
            Err(error) => {
                tracing::debug!(%error, "search response is not JSON; treating as empty");
                Value::Null
            }
        };
        let rows = normalize_response(&parsed);
        tracing::info!(rows = rows.len(), "search completed");
        Ok(rows)
    }

    /// Opens the summarize stream. The body is plain UTF-8 text delivered in
    /// arbitrary chunks; the stream timeout replaces the request timeout.
    pub fn summarize(&self, request: &SummaryRequest) -> Result<SummaryStream> {
        tracing::debug!(
            url = %self.summarize_url,
            answers = request.answers.len(),
            "opening summary stream"
        );
        let response = self
            .http
            .post(&self.summarize_url)
            .timeout(self.stream_timeout)
            .json(request)
            .send()
            .map_err(|error| connection_error(&self.summarize_url, error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }

        Ok(SummaryStream::new(response))
    }
}

/// Incremental UTF-8 decoder. Multi-byte characters split across reads are
/// held back until they complete.
pub struct Utf8Chunker {
    decoder: Decoder,
}

impl Default for Utf8Chunker {
    fn default() -> Self {
        Self::new()
    }
}

impl Utf8Chunker {
    pub fn new() -> Self {
        Self {
            decoder: UTF_8.new_decoder_without_bom_handling(),
        }
    }

    pub fn decode(&mut self, bytes: &[u8], last: bool) -> String {
        let capacity = self
            .decoder
            .max_utf8_buffer_length(bytes.len())
            .unwrap_or(bytes.len() * 3 + 4);
        let mut text = String::with_capacity(capacity);
        let (_, _, replaced) = self.decoder.decode_to_string(bytes, &mut text, last);
        if replaced {
            tracing::debug!("summary stream contained invalid UTF-8");
        }
        text
    }
}

pub struct SummaryStream {
    response: Option<Response>,
    chunker: Utf8Chunker,
    buffer: Box<[u8; READ_BUFFER_BYTES]>,
}

impl SummaryStream {
    fn new(response: Response) -> Self {
        Self {
            response: Some(response),
            chunker: Utf8Chunker::new(),
            buffer: Box::new([0; READ_BUFFER_BYTES]),
        }
    }
}

impl ChunkSource for SummaryStream {
    fn next_chunk(&mut self) -> Result<Option<String>> {
        loop {
            let Some(response) = self.response.as_mut() else {
                return Ok(None);
            };
            let read = response
                .read(&mut self.buffer[..])
                .context("read summary stream")?;

            if read == 0 {
                self.response = None;
                let tail = self.chunker.decode(&[], true);
                return Ok((!tail.is_empty()).then_some(tail));
            }

            let text = self.chunker.decode(&self.buffer[..read], false);
            if !text.is_empty() {
                return Ok(Some(text));
            }
        }
    }

    fn abort(&mut self) {
        if self.response.take().is_some() {
            tracing::debug!("summary stream aborted");
        }
    }
}

fn validate_endpoint(name: &str, raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        bail!("{name} must not be empty");
    }
    let parsed = Url::parse(trimmed).with_context(|| format!("{name} is not a valid URL"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        bail!("{name} must use http or https, got {}", parsed.scheme());
    }
    Ok(trimmed.to_owned())
}

fn connection_error(url: &str, error: reqwest::Error) -> anyhow::Error {
    if error.is_timeout() {
        return anyhow!("request to {url} timed out -- raise [api].timeout if the service is slow");
    }
    anyhow!(
        "cannot reach {} -- check that the search service is running ({})",
        url,
        error
    )
}

#[derive(Debug, Deserialize)]
struct DetailEnvelope {
    detail: Option<Value>,
    message: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorBody {
    Message { message: String },
    Text(String),
}

fn clean_error_response(status: StatusCode, body: &str) -> anyhow::Error {
    if let Ok(parsed) = serde_json::from_str::<DetailEnvelope>(body)
        && let Some(detail) = parsed.detail.or(parsed.message)
    {
        let message = match detail {
            Value::String(message) => message,
            other => other.to_string(),
        };
        if !message.is_empty() {
            return anyhow!("server error ({}): {}", status.as_u16(), message);
        }
    }

    if let Ok(parsed) = serde_json::from_str::<ErrorEnvelope>(body)
        && let Some(error) = parsed.error
    {
        let message = match error {
            ErrorBody::Message { message } | ErrorBody::Text(message) => message,
        };
        if !message.is_empty() {
            return anyhow!("server error ({}): {}", status.as_u16(), message);
        }
    }

    if !body.is_empty() && body.len() < 100 && !body.contains('{') {
        return anyhow!("server error ({}): {}", status.as_u16(), body.trim());
    }

    anyhow!("server returned {}", status.as_u16())
}
