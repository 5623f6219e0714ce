//! HTTP knowledge-base backend speaking the agent-runtime
//! `RetrieveAndGenerate` JSON API.

use crate::retrieval::KnowledgeBase;
use askdocs_rs_config::KnowledgeBaseConfig;
use askdocs_rs_protocol::{Answer, CitationRef, KnowledgeBaseError, RetrievalRequest};
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

const THROTTLING_EXCEPTION: &str = "ThrottlingException";
const ERROR_TYPE_HEADER: &str = "x-amzn-errortype";

/// `KnowledgeBase` backed by a remote `retrieveAndGenerate` endpoint.
#[derive(Clone)]
pub struct HttpKnowledgeBase {
    client: Client,
    endpoint: String,
    model_arn: String,
    auth_token: Option<String>,
}

impl HttpKnowledgeBase {
    pub fn new(
        endpoint: impl Into<String>,
        model_arn: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, KnowledgeBaseError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| KnowledgeBaseError::Other(format!("http client: {err}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model_arn: model_arn.into(),
            auth_token: None,
        })
    }

    /// Build from config, reading the bearer token from the configured env var.
    pub fn from_config(
        config: &KnowledgeBaseConfig,
        region: &str,
    ) -> Result<Self, KnowledgeBaseError> {
        let mut backend = Self::new(
            config.resolved_endpoint(region),
            config.model_arn.clone(),
            config.timeout(),
        )?;
        if let Some(env_var) = &config.auth_token_env {
            match std::env::var(env_var) {
                Ok(token) if !token.is_empty() => backend = backend.with_auth_token(token),
                _ => debug!("no bearer token in env (env_var={env_var})"),
            }
        }
        Ok(backend)
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl KnowledgeBase for HttpKnowledgeBase {
    async fn retrieve_and_generate(
        &self,
        request: &RetrievalRequest,
    ) -> Result<Answer, KnowledgeBaseError> {
        let url = format!("{}/retrieveAndGenerate", self.endpoint);
        let body = RetrieveAndGenerateBody {
            input: InputText {
                text: &request.question_text,
            },
            retrieve_and_generate_configuration: GenerateConfiguration {
                kind: "KNOWLEDGE_BASE",
                knowledge_base_configuration: KnowledgeBaseConfiguration {
                    knowledge_base_id: &request.knowledge_base_id,
                    model_arn: &self.model_arn,
                },
            },
        };

        let mut builder = self.client.post(&url).json(&body);
        if let Some(token) = &self.auth_token {
            builder = builder.bearer_auth(token);
        }
        debug!("posting retrieveAndGenerate (url={url})");
        let response = builder
            .send()
            .await
            .map_err(|err| KnowledgeBaseError::Other(format!("request failed: {err}")))?;

        let status = response.status();
        let error_type = response
            .headers()
            .get(ERROR_TYPE_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let text = response
            .text()
            .await
            .map_err(|err| KnowledgeBaseError::Other(format!("failed to read response: {err}")))?;

        if status.is_success() {
            parse_answer(&text)
        } else {
            Err(classify_error(status, error_type.as_deref(), &text))
        }
    }
}

/// Map a non-success response onto a retrieval error.
pub(crate) fn classify_error(
    status: StatusCode,
    header_error_type: Option<&str>,
    body: &str,
) -> KnowledgeBaseError {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let body_error_type = parsed.as_ref().and_then(|value| {
        value
            .get("__type")
            .or_else(|| value.get("code"))
            .and_then(Value::as_str)
    });
    let message = parsed
        .as_ref()
        .and_then(|value| value.get("message").or_else(|| value.get("Message")))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| body.trim().to_string());

    let throttled = status == StatusCode::TOO_MANY_REQUESTS
        || [header_error_type, body_error_type]
            .into_iter()
            .flatten()
            .any(|kind| kind.contains(THROTTLING_EXCEPTION));
    if throttled {
        warn!("knowledge base throttled request (status={status})");
        KnowledgeBaseError::Throttled(message)
    } else {
        KnowledgeBaseError::Other(format!("HTTP {status}: {message}"))
    }
}

/// Decode a success body into an `Answer`.
pub(crate) fn parse_answer(body: &str) -> Result<Answer, KnowledgeBaseError> {
    let response: RetrieveAndGenerateResponse = serde_json::from_str(body)
        .map_err(|err| KnowledgeBaseError::Other(format!("invalid response body: {err}")))?;
    // Only the first citation group is surfaced.
    let citations = response
        .citations
        .unwrap_or_default()
        .into_iter()
        .next()
        .map(|citation| {
            citation
                .retrieved_references
                .unwrap_or_default()
                .into_iter()
                .filter_map(|reference| reference.location.and_then(ReferenceLocation::url))
                .map(CitationRef::new)
                .collect()
        })
        .unwrap_or_default();
    Ok(Answer {
        answer_text: response.output.text,
        citations,
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RetrieveAndGenerateBody<'a> {
    input: InputText<'a>,
    retrieve_and_generate_configuration: GenerateConfiguration<'a>,
}

#[derive(Serialize)]
struct InputText<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateConfiguration<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    knowledge_base_configuration: KnowledgeBaseConfiguration<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct KnowledgeBaseConfiguration<'a> {
    knowledge_base_id: &'a str,
    model_arn: &'a str,
}

#[derive(Deserialize)]
struct RetrieveAndGenerateResponse {
    output: GeneratedOutput,
    #[serde(default)]
    citations: Option<Vec<Citation>>,
}

#[derive(Deserialize)]
struct GeneratedOutput {
    text: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Citation {
    #[serde(default)]
    retrieved_references: Option<Vec<RetrievedReference>>,
}

#[derive(Deserialize)]
struct RetrievedReference {
    #[serde(default)]
    location: Option<ReferenceLocation>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReferenceLocation {
    #[serde(default)]
    confluence_location: Option<UrlLocation>,
    #[serde(default)]
    web_location: Option<UrlLocation>,
    #[serde(default)]
    s3_location: Option<S3Location>,
}

impl ReferenceLocation {
    fn url(self) -> Option<String> {
        self.confluence_location
            .and_then(|location| location.url)
            .or_else(|| self.web_location.and_then(|location| location.url))
            .or_else(|| self.s3_location.and_then(|location| location.uri))
    }
}

#[derive(Deserialize)]
struct UrlLocation {
    #[serde(default)]
    url: Option<String>,
}

#[derive(Deserialize)]
struct S3Location {
    #[serde(default)]
    uri: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn parses_first_citation_group_only() {
        let body = json!({
            "output": { "text": "Use the staging VPN." },
            "citations": [
                {
                    "retrievedReferences": [
                        { "location": { "confluenceLocation": { "url": "https://wiki.example.com/vpn" } } },
                        { "location": { "webLocation": { "url": "https://docs.example.com/net" } } },
                        { "location": { "type": "CUSTOM" } },
                        { "location": { "s3Location": { "uri": "s3://bucket/vpn.pdf" } } }
                    ]
                },
                {
                    "retrievedReferences": [
                        { "location": { "confluenceLocation": { "url": "https://wiki.example.com/ignored" } } }
                    ]
                }
            ]
        });
        let answer = parse_answer(&body.to_string()).expect("answer");
        assert_eq!(answer.answer_text, "Use the staging VPN.");
        assert_eq!(
            answer.citations,
            vec![
                CitationRef::new("https://wiki.example.com/vpn"),
                CitationRef::new("https://docs.example.com/net"),
                CitationRef::new("s3://bucket/vpn.pdf"),
            ]
        );
    }

    #[test]
    fn absent_null_and_empty_citations_are_equivalent() {
        for body in [
            json!({ "output": { "text": "x" } }),
            json!({ "output": { "text": "x" }, "citations": null }),
            json!({ "output": { "text": "x" }, "citations": [] }),
            json!({ "output": { "text": "x" }, "citations": [ { "retrievedReferences": [] } ] }),
        ] {
            let answer = parse_answer(&body.to_string()).expect("answer");
            assert!(answer.citations.is_empty(), "{body}");
        }
    }

    #[test]
    fn missing_output_is_an_error() {
        let err = parse_answer(r#"{"citations": []}"#).unwrap_err();
        assert!(!err.is_throttled());
    }

    #[test]
    fn classifies_throttling_signals() {
        assert!(classify_error(StatusCode::TOO_MANY_REQUESTS, None, "").is_throttled());
        assert!(
            classify_error(
                StatusCode::BAD_REQUEST,
                None,
                r#"{"__type":"com.amazonaws#ThrottlingException","message":"Rate exceeded"}"#,
            )
            .is_throttled()
        );
        assert!(
            classify_error(
                StatusCode::BAD_REQUEST,
                Some("ThrottlingException:http://internal.amazon.com/"),
                "{}",
            )
            .is_throttled()
        );
    }

    #[test]
    fn other_failures_carry_status_and_message() {
        let err = classify_error(
            StatusCode::FORBIDDEN,
            None,
            r#"{"code":"AccessDeniedException","Message":"not allowed"}"#,
        );
        assert_eq!(
            err,
            KnowledgeBaseError::Other("HTTP 403 Forbidden: not allowed".to_string())
        );
    }
}
