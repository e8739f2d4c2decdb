//! Compliance check against the CFST 6508 directive, grounded in
//! retrieved passages.

use serde::Serialize;

use crate::core::errors::ApiError;
use crate::directive::{DirectiveIndex, PassageMatch};
use crate::llm::{ChatMessage, LlmService};

#[derive(Debug, Clone, Serialize)]
pub struct ComplianceReport {
    pub assessment: String,
    /// Sources of the passages the assessment was grounded on.
    pub citations: Vec<String>,
}

pub async fn check(
    llm: &LlmService,
    index: &DirectiveIndex,
    hazard_analysis: &str,
    company_size: u32,
) -> Result<ComplianceReport, ApiError> {
    let query = compliance_query(hazard_analysis, company_size);

    let matches = index.retrieve(&query).await?;
    if matches.is_empty() {
        tracing::warn!("No directive passage passed the similarity threshold");
    }
    let context = index.build_context(&matches)?;

    let citations = unique_sources(&matches);

    let messages = vec![
        ChatMessage::system(
            "Tu es un expert en conformité CFST 6508. Réponds uniquement à partir \
             des extraits de la directive fournis, en citant leurs numéros.",
        ),
        ChatMessage::user(format!(
            "Extraits de la directive CFST 6508 :\n{}\n\n{}",
            context, query
        )),
    ];

    let assessment = llm.chat(messages).await?;

    Ok(ComplianceReport {
        assessment,
        citations,
    })
}

/// One citation per source, in retrieval rank order. Matches are ordered
/// by score, so the same page can reappear between other sources.
fn unique_sources(matches: &[PassageMatch]) -> Vec<String> {
    let mut sources: Vec<String> = Vec::new();
    for m in matches {
        if !sources.contains(&m.passage.source) {
            sources.push(m.passage.source.clone());
        }
    }
    sources
}

fn compliance_query(hazard_analysis: &str, company_size: u32) -> String {
    format!(
        "Analyse la situation suivante selon la directive CFST 6508.\n\
         Description du danger: \"{}\"\n\
         Taille de l'entreprise: {} collaborateurs\n\
         Tâches :\n\
         1. Identifier dangers particuliers selon annexe 1.\n\
         2. Vérifier si spécialistes MSST requis.\n\
         3. Expliquer avec passages du document.\n\
         4. Avis de conformité (conforme / non conforme / mesures à prendre).\n\
         5. Plan d'action priorisé.",
        hazard_analysis, company_size
    )
}
