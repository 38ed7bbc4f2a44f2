//! reqwest-backed transport.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Response;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use folio_core::{
    ChatReply, ClientConfig, ConfigError, ConfigResult, Document, Failure, IngestReport,
    IngestSource, Outcome,
};

use crate::transport::TransportClient;
use crate::wire::{
    ChatRequest, ChatResponse, UploadResponse, WelcomeResponse, UPLOAD_FILE_FIELD,
    UPLOAD_URL_FIELD,
};

/// Longest slice of an error body carried into a failure detail.
const BODY_EXCERPT_CHARS: usize = 200;

/// Transport that talks to the content service over HTTP.
pub struct HttpTransport {
    client: reqwest::Client,
    config: ClientConfig,
}

impl HttpTransport {
    /// Build a transport with one pooled client for all requests.
    pub fn new(config: ClientConfig) -> ConfigResult<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout_duration())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn upload_form(source: IngestSource) -> Outcome<Form> {
        match source {
            IngestSource::File(document) => {
                let mime = mime_for(&document);
                let Document { filename, bytes } = document;
                let part = Part::bytes(bytes)
                    .file_name(filename)
                    .mime_str(mime)
                    .map_err(|e| Failure::network(format!("failed to build upload: {}", e)))?;
                Ok(Form::new().part(UPLOAD_FILE_FIELD, part))
            }
            IngestSource::Url(url) => Ok(Form::new().text(UPLOAD_URL_FIELD, url)),
        }
    }

    /// Turn a reqwest error into a failure, using the configured timeout in
    /// the message.
    fn classify(&self, route: &str, err: reqwest::Error) -> Failure {
        let failure = if err.is_timeout() {
            Failure::timeout(format!(
                "{} got no answer within {}s",
                route, self.config.request_timeout_secs
            ))
        } else if err.is_decode() {
            Failure::malformed(format!("{} returned an unreadable body: {}", route, err))
        } else {
            Failure::network(format!("{} could not reach {}: {}", route, self.config.base_url, err))
        };
        warn!("{} failed: {}", route, failure);
        failure
    }

    /// Check the status, then decode the JSON body.
    async fn read_json<T: DeserializeOwned>(&self, route: &str, response: Response) -> Outcome<T> {
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let failure = Failure::status(
                status.as_u16(),
                format!("{} returned {}{}", route, status, excerpt(&body)),
            );
            warn!("{} failed: {}", route, failure);
            return Err(failure);
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| self.classify(route, e))?;

        serde_json::from_slice(&body).map_err(|e| {
            let failure = Failure::malformed(format!("{} returned invalid JSON: {}", route, e));
            warn!("{} failed: {}", route, failure);
            failure
        })
    }
}

#[async_trait]
impl TransportClient for HttpTransport {
    async fn ingest(&self, source: IngestSource) -> Outcome<IngestReport> {
        let route = "POST /upload";
        let url = self.config.endpoint("/upload");
        debug!("{} -> {} ({})", route, url, source.describe());

        let form = Self::upload_form(source)?;
        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.classify(route, e))?;

        let body: UploadResponse = self.read_json(route, response).await?;
        let report = IngestReport::from(body);
        debug!(
            "{} returned {} characters from {} chars of text",
            route,
            report.characters.len(),
            report.total_chars
        );
        Ok(report)
    }

    async fn send_chat_turn(&self, character: &str, message: &str) -> Outcome<ChatReply> {
        let route = "POST /chat";
        let url = self.config.endpoint("/chat");
        debug!("{} -> {} (character: {})", route, url, character);

        let request = ChatRequest {
            character: character.to_string(),
            message: message.to_string(),
        };

        let response = self
            .client
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.classify(route, e))?;

        let body: ChatResponse = self.read_json(route, response).await?;
        match body.reply {
            Some(reply) => Ok(ChatReply { reply }),
            None => {
                let failure = Failure::malformed(format!("{} response has no 'reply' field", route));
                warn!("{} failed: {}", route, failure);
                Err(failure)
            }
        }
    }

    async fn health(&self) -> Outcome<String> {
        let route = "GET /";
        let url = self.config.endpoint("/");
        debug!("{} -> {}", route, url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.classify(route, e))?;

        let body: WelcomeResponse = self.read_json(route, response).await?;
        body.message
            .ok_or_else(|| Failure::malformed(format!("{} response has no 'message' field", route)))
    }
}

fn mime_for(document: &Document) -> &'static str {
    match document.extension().as_deref() {
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}

/// `": <first 200 chars, whitespace collapsed>"`, or nothing for an empty body.
fn excerpt(body: &str) -> String {
    let collapsed = body.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return String::new();
    }
    let mut cut: String = collapsed.chars().take(BODY_EXCERPT_CHARS).collect();
    if collapsed.chars().count() > BODY_EXCERPT_CHARS {
        cut.push('…');
    }
    format!(": {}", cut)
}
