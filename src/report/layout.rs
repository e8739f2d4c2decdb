//! Turns the synthesized report text into classified lines the PDF
//! renderer can style.

use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Heading,
    Numbered,
    Bullet,
    Body,
    Blank,
}

#[derive(Debug, Clone)]
pub struct ReportLine {
    pub kind: LineKind,
    pub text: String,
}

/// Section titles the report prompt asks for; lines starting with one of
/// them become headings.
fn heading_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"(?i)^(Résumé Exécutif|Analyse Détaillée|Conformité|Recommandations|Plan d'Action|Conclusion)",
        )
        .expect("static regex")
    })
}

fn numbered_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d+\.").expect("static regex"))
}

/// Strip markdown heading markers and bold markers the model tends to emit.
pub fn clean_markdown(text: &str) -> String {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let re = PATTERN.get_or_init(|| Regex::new(r"#+|\*\*").expect("static regex"));
    re.replace_all(text, "").to_string()
}

pub fn classify(line: &str) -> LineKind {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        LineKind::Blank
    } else if heading_pattern().is_match(trimmed) {
        LineKind::Heading
    } else if numbered_pattern().is_match(trimmed) {
        LineKind::Numbered
    } else if trimmed.starts_with("- ") {
        LineKind::Bullet
    } else {
        LineKind::Body
    }
}

pub fn lines(text: &str) -> Vec<ReportLine> {
    clean_markdown(text)
        .lines()
        .map(|line| {
            let trimmed = line.trim();
            ReportLine {
                kind: classify(trimmed),
                text: trimmed.to_string(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_markdown_markers() {
        assert_eq!(
            clean_markdown("## Résumé Exécutif\n**important**"),
            " Résumé Exécutif\nimportant"
        );
    }

    #[test]
    fn classifies_section_headings() {
        assert_eq!(classify("Résumé Exécutif"), LineKind::Heading);
        assert_eq!(classify("résumé exécutif du rapport"), LineKind::Heading);
        assert_eq!(classify("Conformité CFST 6508"), LineKind::Heading);
        assert_eq!(classify("Conclusion"), LineKind::Heading);
    }

    #[test]
    fn classifies_numbered_bullet_and_body() {
        assert_eq!(classify("1. Porter un casque"), LineKind::Numbered);
        assert_eq!(classify("- mesure immédiate"), LineKind::Bullet);
        assert_eq!(classify("Le danger identifié est le bruit."), LineKind::Body);
        assert_eq!(classify("   "), LineKind::Blank);
    }

    #[test]
    fn heading_survives_markdown_cleanup() {
        let report = "## **Résumé Exécutif**\n\nTexte du rapport.";
        let lines = lines(report);
        assert_eq!(lines[0].kind, LineKind::Heading);
        assert_eq!(lines[0].text, "Résumé Exécutif");
        assert_eq!(lines[1].kind, LineKind::Blank);
        assert_eq!(lines[2].kind, LineKind::Body);
    }
}
