use crate::translation::outcome::Outcome;
use crate::utils::{ApiConfig, Result, TranslatorError};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, warn};
use url::Url;

/// Something that turns a prompt into an [`Outcome`].
///
/// Implementations absorb their own failures: every error becomes
/// [`Outcome::Absent`] so one bad row never stops a batch.
#[async_trait]
pub trait TranslationBackend: Send + Sync {
    async fn translate(&self, prompt: &str) -> Outcome;
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SafetySetting {
    pub category: String,
    pub threshold: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub safety_settings: Vec<SafetySetting>,
    pub contents: Vec<RequestContent>,
}

#[derive(Debug, Serialize)]
pub struct RequestContent {
    pub parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
pub struct RequestPart {
    pub text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

/// Client for the `generateContent` endpoint.
pub struct GeminiClient {
    client: Client,
    endpoint: Url,
    api_key: SecretString,
    safety_settings: Vec<SafetySetting>,
    http_error_cooldown: Duration,
}

impl GeminiClient {
    pub fn new(config: &ApiConfig, api_key: SecretString, timeout: Duration) -> Result<Self> {
        let endpoint = Url::parse(&config.endpoint).map_err(|e| {
            TranslatorError::ConfigError(format!("invalid api.endpoint {}: {}", config.endpoint, e))
        })?;

        let client = Client::builder().timeout(timeout).build()?;

        let safety_settings = config
            .harm_categories
            .iter()
            .map(|category| SafetySetting {
                category: category.clone(),
                threshold: config.block_threshold.clone(),
            })
            .collect();

        Ok(Self {
            client,
            endpoint,
            api_key,
            safety_settings,
            http_error_cooldown: config.http_error_cooldown(),
        })
    }

    pub fn build_request(&self, prompt: &str) -> GenerateRequest {
        GenerateRequest {
            safety_settings: self.safety_settings.clone(),
            contents: vec![RequestContent {
                parts: vec![RequestPart {
                    text: prompt.to_string(),
                }],
            }],
        }
    }

    fn request_url(&self) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("key", self.api_key.expose_secret());
        url
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl TranslationBackend for GeminiClient {
    async fn translate(&self, prompt: &str) -> Outcome {
        let request = self.build_request(prompt);

        let response = match self
            .client
            .post(self.request_url())
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                error!(endpoint = %self.endpoint, "Request timed out");
                return Outcome::Absent;
            }
            Err(e) => {
                error!(endpoint = %self.endpoint, error = %e.without_url(), "Request failed");
                return Outcome::Absent;
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(
                endpoint = %self.endpoint,
                status = %status,
                body = %body,
                cooldown_secs = self.http_error_cooldown.as_secs(),
                "HTTP error from translation API"
            );
            tokio::time::sleep(self.http_error_cooldown).await;
            return Outcome::Absent;
        }

        match response.text().await {
            Ok(body) => classify_response(&body),
            Err(e) if e.is_timeout() => {
                error!(endpoint = %self.endpoint, "Timed out reading response body");
                Outcome::Absent
            }
            Err(e) => {
                error!(endpoint = %self.endpoint, error = %e.without_url(), "Failed to read response body");
                Outcome::Absent
            }
        }
    }
}

/// Maps a successful response body to an outcome.
///
/// A body without `candidates` is a prompt block; a body with candidates but
/// no text in the first part is a shape error and yields `Absent`.
pub fn classify_response(body: &str) -> Outcome {
    debug!(body = %body, "Translation API response");

    let response: GenerateResponse = match serde_json::from_str(body) {
        Ok(response) => response,
        Err(e) => {
            error!(error = %e, body = %body, "Unparseable translation API response");
            return Outcome::Absent;
        }
    };

    let Some(candidates) = response.candidates else {
        let reason = response.prompt_feedback.and_then(|f| f.block_reason);
        warn!(reason = ?reason, "Prompt blocked by translation API");
        return Outcome::Blocked(reason);
    };

    let text = candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text);

    match text {
        // An empty cell means Absent on disk, so an empty reply is not a translation.
        Some(text) if text.is_empty() => {
            warn!("Translation API returned empty text");
            Outcome::Absent
        }
        Some(text) => Outcome::Translated(text),
        None => {
            error!(body = %body, "Unexpected translation API response shape");
            Outcome::Absent
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Instant;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const GENERATE_PATH: &str = "/v1beta/models/gemini-pro:generateContent";

    fn client() -> GeminiClient {
        GeminiClient::new(
            &ApiConfig::default(),
            SecretString::from("test-key".to_string()),
            Duration::from_secs(15),
        )
        .unwrap()
    }

    #[test]
    fn request_disables_all_safety_categories() {
        let request = client().build_request("Translate me");
        let json = serde_json::to_value(&request).unwrap();

        let settings = json["safetySettings"].as_array().unwrap();
        assert_eq!(settings.len(), 4);
        assert!(settings.iter().all(|s| s["threshold"] == "BLOCK_NONE"));
        assert_eq!(settings[3]["category"], "HARM_CATEGORY_HARASSMENT");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "Translate me");
    }

    #[test]
    fn api_key_goes_into_query() {
        let client = client();
        let url = client.request_url();
        assert_eq!(
            url.query_pairs().find(|(k, _)| k == "key").map(|(_, v)| v.into_owned()),
            Some("test-key".to_string())
        );
        assert!(client.endpoint().query().is_none());
    }

    #[test]
    fn invalid_endpoint_is_config_error() {
        let config = ApiConfig {
            endpoint: "not a url".to_string(),
            ..ApiConfig::default()
        };
        let result = GeminiClient::new(
            &config,
            SecretString::from("k".to_string()),
            Duration::from_secs(1),
        );
        assert!(matches!(result, Err(TranslatorError::ConfigError(_))));
    }

    #[test]
    fn candidate_text_is_translation() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"Jó reggelt!"}],"role":"model"},"finishReason":"STOP"}]}"#;
        assert_eq!(
            classify_response(body),
            Outcome::Translated("Jó reggelt!".to_string())
        );
    }

    #[test]
    fn missing_candidates_is_block() {
        let body = r#"{"promptFeedback":{"blockReason":"SAFETY","safetyRatings":[]}}"#;
        assert_eq!(
            classify_response(body),
            Outcome::Blocked(Some("SAFETY".to_string()))
        );
        assert_eq!(classify_response(r#"{"promptFeedback":{}}"#), Outcome::Blocked(None));
        assert_eq!(classify_response("{}"), Outcome::Blocked(None));
    }

    #[test]
    fn malformed_shapes_are_absent() {
        assert_eq!(classify_response("not json"), Outcome::Absent);
        assert_eq!(classify_response(r#"{"candidates":[]}"#), Outcome::Absent);
        assert_eq!(
            classify_response(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#),
            Outcome::Absent
        );
        assert_eq!(
            classify_response(r#"{"candidates":[{"content":{"parts":[]}}]}"#),
            Outcome::Absent
        );
    }

    #[test]
    fn empty_text_is_absent() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":""}]}}]}"#;
        let outcome = classify_response(body);
        assert_eq!(outcome, Outcome::Absent);
        assert_eq!(Outcome::from_cell(&outcome.to_cell()), outcome);
    }

    fn mock_client(server: &MockServer, timeout: Duration) -> GeminiClient {
        let config = ApiConfig {
            endpoint: format!("{}{}", server.uri(), GENERATE_PATH),
            http_error_cooldown_seconds: 1,
            ..ApiConfig::default()
        };
        GeminiClient::new(&config, SecretString::from("test-key".to_string()), timeout).unwrap()
    }

    #[tokio::test]
    async fn sends_key_and_returns_translation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .and(query_param("key", "test-key"))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "Jó reggelt!"}], "role": "model"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = mock_client(&server, Duration::from_secs(5))
            .translate("Good morning!")
            .await;

        assert_eq!(outcome, Outcome::Translated("Jó reggelt!".to_string()));
    }

    #[tokio::test]
    async fn prompt_feedback_only_is_blocked() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "promptFeedback": {"blockReason": "SAFETY"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = mock_client(&server, Duration::from_secs(5))
            .translate("anything")
            .await;

        assert_eq!(outcome, Outcome::Blocked(Some("SAFETY".to_string())));
    }

    #[tokio::test]
    async fn server_error_waits_cooldown_then_is_absent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
            .expect(1)
            .mount(&server)
            .await;

        let client = mock_client(&server, Duration::from_secs(5));
        let start = Instant::now();
        let outcome = client.translate("anything").await;

        assert_eq!(outcome, Outcome::Absent);
        assert!(start.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test]
    async fn slow_response_times_out_as_absent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({
                        "candidates": [{"content": {"parts": [{"text": "késő"}]}}]
                    }))
                    .set_delay(Duration::from_millis(800)),
            )
            .mount(&server)
            .await;

        let outcome = mock_client(&server, Duration::from_millis(100))
            .translate("anything")
            .await;

        assert_eq!(outcome, Outcome::Absent);
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_absent() {
        let config = ApiConfig {
            endpoint: "http://127.0.0.1:9/v1beta/models/gemini-pro:generateContent".to_string(),
            ..ApiConfig::default()
        };
        let client = GeminiClient::new(
            &config,
            SecretString::from("test-key".to_string()),
            Duration::from_secs(2),
        )
        .unwrap();

        assert_eq!(client.translate("anything").await, Outcome::Absent);
    }
}
