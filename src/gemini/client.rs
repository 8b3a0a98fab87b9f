// Gemini API client - single-shot frame classification
// Author: kelexine (https://github.com/kelexine)

use super::parse::parse_verdict;
use super::Classifier;
use crate::config::GeminiConfig;
use crate::error::{DetectorError, Result};
use crate::metrics;
use crate::models::gemini::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, InlineData, Part,
};
use crate::models::Verdict;
use crate::prompt::build_prompt;
use crate::utils::logging::sanitize;
use crate::vision::ImagePayload;
use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, error};

/// Client for the Gemini `generateContent` API.
///
/// Every call is a single attempt bounded by the configured timeout. Errors
/// are returned immediately; the extension re-submits on its next tick.
pub struct GeminiClient {
    http_client: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    /// Create a new Gemini client with a pooled HTTP connection.
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Some(Duration::from_secs(60)))
            .use_rustls_tls()
            .build()
            .map_err(|e| DetectorError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        debug!("Created HTTP client with {}s timeout", config.timeout_seconds);

        Ok(Self {
            http_client,
            config: config.clone(),
        })
    }

    /// Model used for classification
    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/{}:generateContent",
            self.config.api_base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    fn build_request(image: &ImagePayload, prompt: &str, captions: &str) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text {
                        text: build_prompt(prompt, captions),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: image.mime_type().to_string(),
                            data: image.data.clone(),
                        },
                    },
                ],
            }],
            generation_config: Some(GenerationConfig::default()),
        }
    }

    /// Extract error message from API response JSON
    fn extract_error_message(response_text: &str) -> Option<String> {
        #[derive(serde::Deserialize)]
        struct ErrorResponse {
            error: Option<ErrorDetail>,
        }

        #[derive(serde::Deserialize)]
        struct ErrorDetail {
            message: Option<String>,
            status: Option<String>,
        }

        if let Ok(error_resp) = serde_json::from_str::<ErrorResponse>(response_text) {
            if let Some(error) = error_resp.error {
                return error.message.or(error.status);
            }
        }
        None
    }

    async fn call(&self, image: &ImagePayload, prompt: &str, captions: &str) -> Result<Verdict> {
        if !self.config.is_configured() {
            return Err(DetectorError::Unconfigured(
                "set GEMINI_API_KEY or gemini.api_key".to_string(),
            ));
        }

        let request = Self::build_request(image, prompt, captions);
        debug!("Calling generateContent API for model: {}", self.config.model);

        let response = self
            .http_client
            .post(self.endpoint())
            .query(&[("key", self.config.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                let message = if e.is_timeout() {
                    format!("request timed out after {}s", self.config.timeout_seconds)
                } else {
                    format!("HTTP error: {}", sanitize(&e.to_string()))
                };
                DetectorError::ExternalFailure {
                    status: None,
                    message,
                }
            })?;

        let status = response.status();
        let response_text = response.text().await.map_err(|e| DetectorError::ExternalFailure {
            status: None,
            message: format!("Failed to read response body: {}", sanitize(&e.to_string())),
        })?;

        if !status.is_success() {
            let message = Self::extract_error_message(&response_text).unwrap_or(response_text);
            error!("Gemini API error: HTTP {} - {}", status, sanitize(&message));
            return Err(DetectorError::ExternalFailure {
                status: Some(status.as_u16()),
                message: format!("HTTP {}: {}", status, sanitize(&message)),
            });
        }

        debug!(
            "Raw Gemini response (first 500 chars): {}",
            response_text.chars().take(500).collect::<String>()
        );

        let gemini_response: GenerateContentResponse = serde_json::from_str(&response_text)
            .map_err(|e| DetectorError::UnparseableResponse(format!("Response parsing error: {}", e)))?;

        if let Some(reason) = gemini_response
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
        {
            return Err(DetectorError::UnparseableResponse(format!(
                "prompt blocked by Gemini: {}",
                reason
            )));
        }

        parse_verdict(gemini_response.first_text())
    }
}

#[async_trait]
impl Classifier for GeminiClient {
    async fn classify(&self, image: &ImagePayload, prompt: &str, captions: &str) -> Result<Verdict> {
        let start = Instant::now();
        let result = self.call(image, prompt, captions).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.kind(),
        };
        metrics::record_classifier_call(outcome, start.elapsed().as_secs_f64());

        result
    }

    fn is_configured(&self) -> bool {
        self.config.is_configured()
    }
}
