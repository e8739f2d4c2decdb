//! Hazard analysis: multimodal LLM call returning a structured finding.

use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::errors::ApiError;
use crate::llm::{ChatMessage, ContentPart, LlmService};

/// Structured fields the model is asked to produce. Field names are the
/// French ones the downstream report vocabulary uses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HazardFields {
    #[serde(rename = "type_danger")]
    pub hazard_type: String,
    pub description: String,
    #[serde(rename = "risques")]
    pub risks: Value,
    #[serde(rename = "gravite_estimee")]
    pub estimated_severity: String,
}

/// Model output for a hazard: the raw text (fed verbatim into the later
/// prompts) plus the parsed fields when the model returned valid JSON.
#[derive(Debug, Clone, Serialize)]
pub struct HazardAnalysis {
    pub raw: String,
    pub fields: Option<HazardFields>,
}

pub async fn analyze(
    llm: &LlmService,
    description: Option<&str>,
    photo_jpeg: Option<&[u8]>,
) -> Result<HazardAnalysis, ApiError> {
    let description = description.map(str::trim).filter(|s| !s.is_empty());
    if description.is_none() && photo_jpeg.is_none() {
        return Err(ApiError::BadRequest(
            "Veuillez fournir une description du danger ou une photo.".to_string(),
        ));
    }

    let mut parts = vec![ContentPart::text(analysis_prompt(description))];
    if let Some(bytes) = photo_jpeg {
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        parts.push(ContentPart::image_url(format!(
            "data:image/jpeg;base64,{}",
            encoded
        )));
    }

    let raw = llm.chat(vec![ChatMessage::user_parts(parts)]).await?;
    let fields = parse_fields(&raw);
    if fields.is_none() {
        tracing::warn!("Hazard analysis did not return parseable JSON; keeping raw text");
    }

    Ok(HazardAnalysis { raw, fields })
}

fn analysis_prompt(description: Option<&str>) -> String {
    let mut prompt = String::from(
        "Tu es un assistant HSE.\n\
         Analyse les éléments fournis (texte et/ou image).\n",
    );
    if let Some(text) = description {
        prompt.push_str(&format!(
            "Voici une description brute d'un danger : \"{}\"\n",
            text
        ));
    }
    prompt.push_str(
        "Produis une analyse factuelle et professionnelle.\n\
         La sortie doit être concise et structurée en JSON avec les champs :\n\
         - type_danger\n\
         - description\n\
         - risques\n\
         - gravite_estimee\n\
         Ne propose pas encore de mesures préventives ni de rapport final.",
    );
    prompt
}

/// Parse the structured fields, tolerating a fenced ```json block around
/// the object.
fn parse_fields(raw: &str) -> Option<HazardFields> {
    let trimmed = strip_code_fence(raw);
    serde_json::from_str::<HazardFields>(trimmed).ok()
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.trim_start_matches(['\r', '\n']);
    rest.strip_suffix("```").map(str::trim).unwrap_or(rest)
}
