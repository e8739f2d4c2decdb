//! Final HSE report synthesis.

use crate::core::errors::ApiError;
use crate::llm::{ChatMessage, LlmService};

pub async fn synthesize(
    llm: &LlmService,
    hazard_analysis: &str,
    compliance_assessment: &str,
    company_name: &str,
) -> Result<String, ApiError> {
    let prompt = format!(
        "Tu es un expert HSE senior.\n\
         Rédige un rapport complet et structuré pour {} :\n\
         Description du danger : {}\n\
         Rapport de conformité : {}\n\
         Le rapport doit contenir :\n\
         - Résumé exécutif\n\
         - Analyse détaillée\n\
         - Conformité CFST 6508\n\
         - Recommandations et plan d'action priorisé\n\
         - Conclusion\n\
         Style professionnel, clair, titres et sous-titres.",
        company_name, hazard_analysis, compliance_assessment
    );

    llm.chat(vec![ChatMessage::user(prompt)]).await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::core::config::{AppPaths, ConfigService};
    use crate::llm::testing::ScriptedProvider;
    use crate::llm::MessageContent;

    #[tokio::test]
    async fn prompt_includes_company_and_both_inputs() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = Arc::new(AppPaths::for_test(tmp.path()));
        let config = ConfigService::new(paths);
        let provider = ScriptedProvider::with_replies(vec!["Résumé Exécutif\n...".to_string()]);
        let llm = LlmService::new(Arc::new(provider.clone()), config);

        let body = synthesize(&llm, "analyse du danger", "avis de conformité", "Atelier SA")
            .await
            .unwrap();
        assert!(body.starts_with("Résumé Exécutif"));

        let calls = provider.chat_calls();
        let MessageContent::Text(prompt) = &calls[0].1.messages[0].content else {
            panic!("expected text content");
        };
        assert!(prompt.contains("Atelier SA"));
        assert!(prompt.contains("analyse du danger"));
        assert!(prompt.contains("avis de conformité"));
        assert!(prompt.contains("Résumé exécutif"));
    }
}
