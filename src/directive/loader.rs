//! Directive PDF loading and text extraction.

use std::path::Path;

use crate::core::errors::ApiError;

/// Extracted directive text, one entry per page where the extractor
/// exposes page breaks, otherwise a single section.
#[derive(Debug, Clone)]
pub struct DirectiveSection {
    pub page: usize,
    pub text: String,
}

pub fn load_directive(path: &Path) -> Result<Vec<DirectiveSection>, ApiError> {
    if !path.exists() {
        return Err(ApiError::NotFound(format!(
            "directive PDF not found: {}",
            path.display()
        )));
    }

    let text = pdf_extract::extract_text(path).map_err(|err| {
        ApiError::Internal(format!(
            "failed to extract text from {}: {}",
            path.display(),
            err
        ))
    })?;

    let sections = split_pages(&text);
    if sections.is_empty() {
        return Err(ApiError::Internal(format!(
            "directive PDF {} contains no extractable text",
            path.display()
        )));
    }

    Ok(sections)
}

/// The extractor emits form feeds between pages for most documents; fall
/// back to a single section when none are present.
fn split_pages(text: &str) -> Vec<DirectiveSection> {
    let raw_pages: Vec<&str> = if text.contains('\u{0C}') {
        text.split('\u{0C}').collect()
    } else {
        vec![text]
    };

    raw_pages
        .into_iter()
        .enumerate()
        .filter_map(|(idx, page)| {
            let cleaned = normalize_whitespace(page);
            if cleaned.is_empty() {
                None
            } else {
                Some(DirectiveSection {
                    page: idx + 1,
                    text: cleaned,
                })
            }
        })
        .collect()
}

fn normalize_whitespace(text: &str) -> String {
    let lines: Vec<&str> = text
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_form_feed_and_numbers_pages() {
        let text = "Premiere page.\n\u{0C}Deuxieme page.\n\u{0C}";
        let sections = split_pages(text);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].page, 1);
        assert_eq!(sections[0].text, "Premiere page.");
        assert_eq!(sections[1].page, 2);
    }

    #[test]
    fn whole_document_becomes_one_section_without_breaks() {
        let sections = split_pages("  Annexe 1 \n\n dangers particuliers ");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].text, "Annexe 1\ndangers particuliers");
    }

    #[test]
    fn blank_pages_are_dropped() {
        let sections = split_pages("contenu\u{0C}   \n \u{0C}suite");
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[1].text, "suite");
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = load_directive(Path::new("/nonexistent/directive.pdf")).unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
