//! AI metadata generation.

use serde::Deserialize;
use serde_json::json;

use super::{hostname_of, ToolboxConfig};
use crate::error::{ToolboxError, ToolboxResult};
use crate::types::AiMetadata;

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

fn build_prompt(url: &str) -> String {
    format!(
        "Analyze the domain or URL: \"{url}\".\n\
         Provide a likely name for this service/app, a brief 1-sentence description,\n\
         the likely owner (organization or \"Private\"), an estimated or known registration date/year,\n\
         the likely registrar and an estimated expiry date (YYYY-MM-DD or \"Unknown\").\n\
         If it is a localhost or private IP, just describe it as a local service.\n\
         Return valid JSON."
    )
}

fn response_schema() -> serde_json::Value {
    let field = |description: &str| json!({ "type": "STRING", "description": description });
    json!({
        "type": "OBJECT",
        "properties": {
            "name": field("A clean, displayable name for the app/domain"),
            "description": field("A short description of what the site does"),
            "owner": field("The likely owner or 'Unknown'"),
            "registrationDate": field("The registration year or date, or 'Unknown'"),
            "expiresAt": field("Estimated expiry date YYYY-MM-DD, or 'Unknown'"),
            "registrar": field("The likely registrar, or 'Unknown'"),
        },
        "required": ["name", "description", "owner", "registrationDate", "expiresAt", "registrar"],
    })
}

async fn request_metadata(
    client: &reqwest::Client,
    config: &ToolboxConfig,
    url: &str,
) -> ToolboxResult<AiMetadata> {
    let api_key = config
        .ai_api_key
        .as_deref()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| ToolboxError::MissingCredential("AI API key is not set".to_string()))?;

    let endpoint = format!(
        "{}/v1beta/models/{}:generateContent",
        config.ai_endpoint.trim_end_matches('/'),
        config.ai_model
    );

    let body = json!({
        "contents": [{ "parts": [{ "text": build_prompt(url) }] }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": response_schema(),
        },
    });

    let response = client
        .post(&endpoint)
        .header("x-goog-api-key", api_key)
        .json(&body)
        .send()
        .await
        .map_err(|e| ToolboxError::NetworkError(format!("AI request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        return Err(ToolboxError::NetworkError(format!(
            "AI endpoint returned HTTP {}: {text}",
            status.as_u16()
        )));
    }

    let response: GenerateResponse = response
        .json()
        .await
        .map_err(|e| ToolboxError::ParseError(format!("Invalid AI response envelope: {e}")))?;

    let text = response
        .candidates
        .into_iter()
        .filter_map(|c| c.content)
        .flat_map(|c| c.parts)
        .find_map(|p| p.text)
        .ok_or_else(|| ToolboxError::ParseError("AI response has no text".to_string()))?;

    serde_json::from_str(&text)
        .map_err(|e| ToolboxError::ParseError(format!("AI metadata is not valid JSON: {e}")))
}

/// Describe a domain, falling back to hostname-derived defaults on any failure.
pub async fn ai_metadata(client: &reqwest::Client, config: &ToolboxConfig, url: &str) -> AiMetadata {
    match request_metadata(client, config, url).await {
        Ok(metadata) => metadata,
        Err(e) => {
            match &e {
                ToolboxError::MissingCredential(_) => log::debug!("AI metadata skipped: {e}"),
                _ => log::warn!("AI metadata fetch failed for {url}: {e}"),
            }
            let hostname = hostname_of(url).unwrap_or_else(|_| url.trim().to_string());
            AiMetadata::fallback(&hostname)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_mentions_url() {
        assert!(build_prompt("https://example.com").contains("\"https://example.com\""));
    }

    #[test]
    fn schema_requires_all_fields() {
        let schema = response_schema();
        let required = schema["required"].as_array().map_or(0, Vec::len);
        assert_eq!(required, 6);
    }

    #[tokio::test]
    async fn missing_key_falls_back() {
        let client = reqwest::Client::new();
        let config = ToolboxConfig {
            ai_api_key: None,
            ..ToolboxConfig::default()
        };
        let meta = ai_metadata(&client, &config, "https://blog.example.net/x").await;
        assert_eq!(meta, AiMetadata::fallback("blog.example.net"));
    }
}
