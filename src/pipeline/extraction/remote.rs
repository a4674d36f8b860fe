//! Extractor backed by a remote workflow service.
//!
//! Two calls per document: `POST {base}/workflow/{workflow_id}/run` starts a
//! job for the document and returns `{"job_id": ...}`, then
//! `GET {base}/workflow/results/{job_id}` returns
//! `{"status": ..., "fields": [{"field_name": ..., "value": ...}]}`.
//! Jobs still queued or running are polled a bounded number of times.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::traits::{DocumentExtractor, ExtractionContext};
use super::ExtractionError;
use crate::config::Settings;
use crate::models::{DocumentView, ExtractionModel, FieldValues};

const DEFAULT_MAX_POLLS: u32 = 10;
const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

#[derive(Debug, Clone, PartialEq)]
pub struct RemoteConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    /// Workflow to run. When unset, the extraction model's id is used.
    pub workflow_id: Option<String>,
    pub timeout_secs: u64,
    pub max_polls: u32,
    pub poll_interval: Duration,
}

impl RemoteConfig {
    pub fn new(base_url: &str, timeout_secs: u64) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: None,
            workflow_id: None,
            timeout_secs,
            max_polls: DEFAULT_MAX_POLLS,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, ExtractionError> {
        let base_url = settings
            .backend_url
            .as_deref()
            .ok_or_else(|| ExtractionError::Config("No extraction backend URL configured".into()))?;
        let mut config = Self::new(base_url, settings.backend_timeout_secs);
        config.api_key = settings.backend_api_key.clone();
        Ok(config)
    }
}

pub struct RemoteExtractor {
    config: RemoteConfig,
    client: reqwest::blocking::Client,
}

#[derive(Serialize)]
struct RunRequest<'a> {
    document_id: String,
    document_name: &'a str,
}

#[derive(Deserialize)]
struct RunResponse {
    job_id: Option<String>,
}

#[derive(Deserialize)]
struct JobResults {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    fields: Vec<ExtractedField>,
}

#[derive(Deserialize)]
struct ExtractedField {
    field_name: String,
    #[serde(default)]
    value: serde_json::Value,
}

enum JobState {
    Pending,
    Done(FieldValues),
}

impl RemoteExtractor {
    pub fn new(config: RemoteConfig) -> Result<Self, ExtractionError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ExtractionError::Config(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    fn map_send_error(&self, e: reqwest::Error) -> ExtractionError {
        if e.is_connect() {
            ExtractionError::BackendConnection(self.config.base_url.clone())
        } else if e.is_timeout() {
            ExtractionError::BackendTimeout(self.config.timeout_secs)
        } else {
            ExtractionError::HttpClient(e.to_string())
        }
    }

    /// Check the status, then read the body as text.
    fn read_body(&self, response: reqwest::blocking::Response) -> Result<String, ExtractionError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ExtractionError::BackendStatus {
                status: status.as_u16(),
                body,
            });
        }
        response.text().map_err(|e| self.map_send_error(e))
    }

    fn authorize(&self, request: reqwest::blocking::RequestBuilder) -> reqwest::blocking::RequestBuilder {
        match &self.config.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    fn start_job(&self, workflow_id: &str, document: &DocumentView) -> Result<String, ExtractionError> {
        let url = format!("{}/workflow/{workflow_id}/run", self.config.base_url);
        let body = RunRequest {
            document_id: document.document.id.to_string(),
            document_name: &document.document.name,
        };
        let response = self
            .authorize(self.client.post(&url).json(&body))
            .send()
            .map_err(|e| self.map_send_error(e))?;
        parse_job_id(&self.read_body(response)?)
    }

    fn fetch_results(&self, job_id: &str, document: &DocumentView) -> Result<JobState, ExtractionError> {
        let url = format!("{}/workflow/results/{job_id}", self.config.base_url);
        let response = self
            .authorize(self.client.get(&url))
            .send()
            .map_err(|e| self.map_send_error(e))?;
        parse_results(job_id, &self.read_body(response)?, document)
    }
}

impl DocumentExtractor for RemoteExtractor {
    fn name(&self) -> &str {
        "remote"
    }

    fn extract(
        &self,
        document: &DocumentView,
        model: &ExtractionModel,
        _context: &ExtractionContext,
    ) -> Result<FieldValues, ExtractionError> {
        if document.fields_for_model(model).is_empty() {
            return Ok(FieldValues::new());
        }

        let workflow_id = self
            .config
            .workflow_id
            .clone()
            .unwrap_or_else(|| model.id.to_string());
        let job_id = self.start_job(&workflow_id, document)?;
        tracing::debug!(
            document_id = %document.document.id,
            job_id = %job_id,
            workflow_id = %workflow_id,
            "Extraction job started"
        );

        for attempt in 1..=self.config.max_polls.max(1) {
            match self.fetch_results(&job_id, document)? {
                JobState::Done(values) => {
                    tracing::debug!(job_id = %job_id, fields = values.len(), attempt, "Extraction job finished");
                    return Ok(values);
                }
                JobState::Pending => std::thread::sleep(self.config.poll_interval),
            }
        }

        Err(ExtractionError::JobFailed {
            job_id,
            detail: format!("still running after {} polls", self.config.max_polls.max(1)),
        })
    }
}

fn parse_job_id(body: &str) -> Result<String, ExtractionError> {
    let parsed: RunResponse =
        serde_json::from_str(body).map_err(|e| ExtractionError::BackendResponse(e.to_string()))?;
    parsed
        .job_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ExtractionError::BackendResponse("run response has no job_id".into()))
}

/// Keep only values for fields of the document's taxonomy; the first value
/// reported for a field wins. Null values are dropped.
fn parse_results(job_id: &str, body: &str, document: &DocumentView) -> Result<JobState, ExtractionError> {
    let parsed: JobResults =
        serde_json::from_str(body).map_err(|e| ExtractionError::BackendResponse(e.to_string()))?;

    match parsed.status.as_deref().map(str::to_ascii_lowercase).as_deref() {
        Some("failed" | "error") => {
            return Err(ExtractionError::JobFailed {
                job_id: job_id.to_string(),
                detail: parsed.error.unwrap_or_else(|| "no detail".into()),
            })
        }
        Some("queued" | "pending" | "running") => return Ok(JobState::Pending),
        _ => {}
    }

    let mut values = FieldValues::new();
    for field in parsed.fields {
        if document.taxonomy.as_ref().and_then(|t| t.field_by_name(&field.field_name)).is_none() {
            tracing::debug!(job_id, field = %field.field_name, "Dropping value for unknown field");
            continue;
        }
        let value = match field.value {
            serde_json::Value::Null => continue,
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
        values.entry(field.field_name).or_insert(value);
    }
    Ok(JobState::Done(values))
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::thread::JoinHandle;

    use super::*;
    use crate::models::*;

    fn invoice_view() -> (DocumentView, ExtractionModel) {
        let taxonomy = Taxonomy::new("Document Classification")
            .with_field("document_type", DataType::String, true)
            .with_field("issue_date", DataType::Date, true)
            .with_field("total", DataType::Number, false);
        let model = ExtractionModel::new("Demo", taxonomy.id);
        (DocumentView::new(Document::new("sample1.txt"), Some(taxonomy)), model)
    }

    /// Request line plus body of one HTTP request.
    fn read_request(stream: &mut TcpStream) -> String {
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut request_line = String::new();
        reader.read_line(&mut request_line).unwrap();

        let mut content_length = 0;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            if line == "\r\n" || line.is_empty() {
                break;
            }
            if let Some((name, value)) = line.split_once(':') {
                if name.eq_ignore_ascii_case("content-length") {
                    content_length = value.trim().parse().unwrap();
                }
            }
        }
        let mut body = vec![0; content_length];
        reader.read_exact(&mut body).unwrap();
        format!("{}{}", request_line.trim_end(), String::from_utf8(body).unwrap())
    }

    /// Serve one canned response per connection, in order.
    fn serve(responses: Vec<(u16, &'static str)>) -> (String, JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let handle = std::thread::spawn(move || {
            let mut seen = Vec::new();
            for (status, body) in responses {
                let (mut stream, _) = listener.accept().unwrap();
                seen.push(read_request(&mut stream));
                let reply = format!(
                    "HTTP/1.1 {status} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                stream.write_all(reply.as_bytes()).unwrap();
            }
            seen
        });
        (base, handle)
    }

    fn extractor(base: &str) -> RemoteExtractor {
        let mut config = RemoteConfig::new(base, 5);
        config.workflow_id = Some("wf-1".into());
        config.poll_interval = Duration::from_millis(0);
        RemoteExtractor::new(config).unwrap()
    }

    #[test]
    fn runs_workflow_then_fetches_results() {
        let (base, server) = serve(vec![
            (200, r#"{"job_id": "job-42"}"#),
            (
                200,
                r#"{"status": "completed", "fields": [
                    {"field_name": "document_type", "value": "Invoice", "confidence": 0.9},
                    {"field_name": "total", "value": 12.5},
                    {"field_name": "issue_date", "value": null},
                    {"field_name": "vendor", "value": "ACME"}
                ]}"#,
            ),
        ]);
        let (view, model) = invoice_view();

        let out = extractor(&base).extract(&view, &model, &ExtractionContext::new()).unwrap();

        assert_eq!(out.len(), 2);
        assert_eq!(out["document_type"], "Invoice");
        assert_eq!(out["total"], "12.5");

        let requests = server.join().unwrap();
        assert!(requests[0].starts_with("POST /workflow/wf-1/run"));
        assert!(requests[0].contains(&view.document.id.to_string()));
        assert!(requests[1].starts_with("GET /workflow/results/job-42"));
    }

    #[test]
    fn pending_job_is_polled() {
        let (base, server) = serve(vec![
            (200, r#"{"job_id": "job-7"}"#),
            (200, r#"{"status": "running"}"#),
            (200, r#"{"status": "done", "fields": [{"field_name": "document_type", "value": "Receipt"}]}"#),
        ]);
        let (view, model) = invoice_view();

        let out = extractor(&base).extract(&view, &model, &ExtractionContext::new()).unwrap();
        assert_eq!(out["document_type"], "Receipt");
        assert_eq!(server.join().unwrap().len(), 3);
    }

    #[test]
    fn error_status_is_reported_with_body() {
        let (base, server) = serve(vec![(503, "overloaded")]);
        let (view, model) = invoice_view();

        let err = extractor(&base).extract(&view, &model, &ExtractionContext::new()).unwrap_err();
        match err {
            ExtractionError::BackendStatus { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "overloaded");
            }
            other => panic!("unexpected error {other:?}"),
        }
        server.join().unwrap();
    }

    #[test]
    fn closed_port_is_a_connection_error() {
        let port = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
        let (view, model) = invoice_view();

        let err = extractor(&format!("http://127.0.0.1:{port}"))
            .extract(&view, &model, &ExtractionContext::new())
            .unwrap_err();
        assert!(matches!(err, ExtractionError::BackendConnection(_)), "{err:?}");
        assert!(err.is_backend_failure());
    }

    #[test]
    fn slow_backend_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let _server = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            read_request(&mut stream);
            std::thread::sleep(Duration::from_secs(3));
        });

        let mut config = RemoteConfig::new(&base, 1);
        config.workflow_id = Some("wf-1".into());
        let (view, model) = invoice_view();

        let err = RemoteExtractor::new(config)
            .unwrap()
            .extract(&view, &model, &ExtractionContext::new())
            .unwrap_err();
        assert!(matches!(err, ExtractionError::BackendTimeout(1)), "{err:?}");
    }

    #[test]
    fn no_taxonomy_skips_the_backend() {
        // nothing listens here; a request would fail
        let view = DocumentView::new(Document::new("loose.txt"), None);
        let model = ExtractionModel::new("Demo", uuid::Uuid::new_v4());

        let out = extractor("http://127.0.0.1:9")
            .extract(&view, &model, &ExtractionContext::new())
            .unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn missing_job_id_is_malformed() {
        assert!(matches!(parse_job_id("{}"), Err(ExtractionError::BackendResponse(_))));
        assert!(matches!(parse_job_id("not json"), Err(ExtractionError::BackendResponse(_))));
        assert_eq!(parse_job_id(r#"{"job_id": "j"}"#).unwrap(), "j");
    }

    #[test]
    fn failed_job_carries_detail() {
        let (view, _) = invoice_view();
        let err = parse_results("j1", r#"{"status": "FAILED", "error": "unreadable scan"}"#, &view)
            .err()
            .unwrap();
        match err {
            ExtractionError::JobFailed { job_id, detail } => {
                assert_eq!(job_id, "j1");
                assert_eq!(detail, "unreadable scan");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn first_value_per_field_wins() {
        let (view, _) = invoice_view();
        let state = parse_results(
            "j1",
            r#"{"fields": [
                {"field_name": "document_type", "value": "Invoice"},
                {"field_name": "document_type", "value": "Receipt"}
            ]}"#,
            &view,
        )
        .unwrap();
        match state {
            JobState::Done(values) => assert_eq!(values["document_type"], "Invoice"),
            JobState::Pending => panic!("expected finished job"),
        }
    }

    #[test]
    fn config_from_settings() {
        let mut settings = Settings::default();
        assert!(matches!(RemoteConfig::from_settings(&settings), Err(ExtractionError::Config(_))));

        settings.backend_url = Some("https://extract.example.com/".into());
        settings.backend_api_key = Some("secret".into());
        let config = RemoteConfig::from_settings(&settings).unwrap();
        assert_eq!(config.base_url, "https://extract.example.com");
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.timeout_secs, settings.backend_timeout_secs);
    }
}
