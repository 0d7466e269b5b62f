//! HTTP backend for the generative image API.

use std::time::Duration;

use async_trait::async_trait;
use frameclean_capture::EncodedImage;
use frameclean_ipc::EnhancementSettings;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::backend::{EnhancementBackend, EnhancementRequest};
use crate::credential::Credential;
use crate::error::EnhanceError;
use crate::EnhanceResult;

/// Header carrying the API key.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// `generateContent` client for an image-output model.
pub struct GeminiBackend {
    http: reqwest::Client,
    endpoint: Url,
}

impl GeminiBackend {
    /// Create a backend from settings.
    pub fn new(settings: &EnhancementSettings) -> EnhanceResult<Self> {
        let endpoint = endpoint_url(&settings.api_base_url, &settings.model)?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self { http, endpoint })
    }
}

#[async_trait]
impl EnhancementBackend for GeminiBackend {
    #[instrument(name = "gemini_generate", skip_all, fields(purpose = request.purpose.name()))]
    async fn generate(
        &self,
        request: &EnhancementRequest,
        credential: &Credential,
    ) -> EnhanceResult<Option<EncodedImage>> {
        let body = GenerateRequest::from_request(request);

        let response = self
            .http
            .post(self.endpoint.clone())
            .header(API_KEY_HEADER, credential.expose())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        debug!(status = status.as_u16(), bytes = text.len(), "Enhancement response");

        if !status.is_success() {
            return Err(parse_error(status.as_u16(), &text));
        }

        let parsed: GenerateResponse =
            serde_json::from_str(&text).map_err(|e| EnhanceError::Decode(e.to_string()))?;
        extract_image(parsed, request)
    }
}

fn endpoint_url(base: &str, model: &str) -> Result<Url, url::ParseError> {
    Url::parse(&format!(
        "{}/v1beta/models/{}:generateContent",
        base.trim_end_matches('/'),
        model
    ))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: [RequestContent<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: [RequestPart<'a>; 2],
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestPart<'a> {
    Text {
        text: &'a str,
    },
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: InlineDataIn<'a>,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineDataIn<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: [&'static str; 1],
}

impl<'a> GenerateRequest<'a> {
    fn from_request(request: &'a EnhancementRequest) -> Self {
        Self {
            contents: [RequestContent {
                parts: [
                    RequestPart::Text {
                        text: request.instruction(),
                    },
                    RequestPart::Inline {
                        inline_data: InlineDataIn {
                            mime_type: &request.image.mime_type,
                            data: request.image.to_base64(),
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_modalities: ["IMAGE"],
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    inline_data: Option<InlineDataOut>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineDataOut {
    mime_type: Option<String>,
    data: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    status: Option<String>,
}

/// Take the first inline image of the first candidate.
fn extract_image(
    response: GenerateResponse,
    request: &EnhancementRequest,
) -> EnhanceResult<Option<EncodedImage>> {
    let inline = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().find_map(|part| part.inline_data));

    let Some(inline) = inline else {
        return Ok(None);
    };

    let mime_type = match inline.mime_type {
        Some(m) if is_image_mime_type(&m) => m,
        other => {
            if let Some(m) = other.filter(|m| !m.is_empty()) {
                warn!(mime_type = %m, "Ignoring non-image mime type from service");
            }
            request.purpose.fallback_mime_type(&request.image.mime_type)
        }
    };

    EncodedImage::from_base64(&inline.data, mime_type)
        .map(Some)
        .map_err(|e| EnhanceError::Decode(e.to_string()))
}

/// `image/<subtype>` with a plain token subtype, safe to embed in a data URL.
fn is_image_mime_type(mime_type: &str) -> bool {
    mime_type.strip_prefix("image/").is_some_and(|subtype| {
        !subtype.is_empty()
            && subtype
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'+' | b'-'))
    })
}

/// Turn a non-success response into an error, keeping the service message.
fn parse_error(status: u16, body: &str) -> EnhanceError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => EnhanceError::Api {
            status,
            code: envelope.error.status,
            message: envelope.error.message,
        },
        Err(_) => EnhanceError::Api {
            status,
            code: None,
            message: body.chars().take(512).collect(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::purpose::Purpose;

    fn request(purpose: Purpose) -> EnhancementRequest {
        EnhancementRequest::new(purpose, EncodedImage::new(vec![1u8, 2, 3], "image/png"))
    }

    #[test]
    fn test_endpoint_url() {
        let url = endpoint_url("https://example.com/", "img-model").unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.com/v1beta/models/img-model:generateContent"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let request = request(Purpose::LogoRemoval);
        let body = serde_json::to_value(GenerateRequest::from_request(&request)).unwrap();

        let parts = &body["contents"][0]["parts"];
        assert_eq!(parts[0]["text"], Purpose::LogoRemoval.instruction());
        assert_eq!(parts[1]["inlineData"]["mimeType"], "image/png");
        assert_eq!(parts[1]["inlineData"]["data"], "AQID");
        assert_eq!(body["generationConfig"]["responseModalities"][0], "IMAGE");
    }

    #[test]
    fn test_extract_first_inline_image() {
        let response: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[
                {"text":"Here you go"},
                {"inlineData":{"mimeType":"image/png","data":"AQID"}}
            ]}}]}"#,
        )
        .unwrap();

        let image = extract_image(response, &request(Purpose::SubtitleRemoval))
            .unwrap()
            .unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(&image.data[..], &[1, 2, 3]);
    }

    #[test]
    fn test_missing_mime_falls_back_per_purpose() {
        let body = r#"{"candidates":[{"content":{"parts":[{"inlineData":{"data":"AQID"}}]}}]}"#;

        let subtitle = extract_image(
            serde_json::from_str(body).unwrap(),
            &request(Purpose::SubtitleRemoval),
        )
        .unwrap()
        .unwrap();
        assert_eq!(subtitle.mime_type, "image/jpeg");

        let logo = extract_image(
            serde_json::from_str(body).unwrap(),
            &request(Purpose::LogoRemoval),
        )
        .unwrap()
        .unwrap();
        assert_eq!(logo.mime_type, "image/png");
    }

    #[test]
    fn test_untrusted_mime_falls_back() {
        let body = r#"{"candidates":[{"content":{"parts":[{"inlineData":{
            "mimeType":"image/png\"><img src=x onerror=alert(1)>","data":"AQID"}}]}}]}"#;
        let image = extract_image(
            serde_json::from_str(body).unwrap(),
            &request(Purpose::SubtitleRemoval),
        )
        .unwrap()
        .unwrap();
        assert_eq!(image.mime_type, "image/jpeg");

        assert!(is_image_mime_type("image/svg+xml"));
        assert!(is_image_mime_type("image/webp"));
        assert!(!is_image_mime_type("text/html"));
        assert!(!is_image_mime_type("image/"));
        assert!(!is_image_mime_type("image/png;charset=x"));
    }

    #[test]
    fn test_no_image_is_none() {
        let response: GenerateResponse =
            serde_json::from_str(r#"{"candidates":[{"content":{"parts":[{"text":"no"}]}}]}"#)
                .unwrap();
        assert!(extract_image(response, &request(Purpose::SubtitleRemoval))
            .unwrap()
            .is_none());

        let empty: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert!(extract_image(empty, &request(Purpose::SubtitleRemoval))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_parse_error_body() {
        let err = parse_error(
            400,
            r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT"}}"#,
        );
        assert!(err.is_credential_rejection());

        let err = parse_error(502, "<html>Bad Gateway</html>");
        assert!(!err.is_credential_rejection());
        assert!(err.to_string().contains("502"));
    }
}
