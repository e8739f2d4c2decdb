//! PDF rendering of the synthesized report via genpdf.

use std::path::Path;

use genpdf::elements::{Break, Paragraph};
use genpdf::style::{Color, Style, StyledString};
use genpdf::{Alignment, Document, SimplePageDecorator};
use serde_json::Value;

use super::layout::{self, LineKind};
use crate::core::errors::ApiError;

const HEADING_COLOR: Color = Color::Rgb(0, 51, 102);

#[derive(Debug, Clone)]
pub struct PdfExporter {
    font_dir: String,
    font_family: String,
}

impl PdfExporter {
    pub fn new(font_dir: String, font_family: String) -> Self {
        Self {
            font_dir,
            font_family,
        }
    }

    pub fn from_config(config: &Value) -> Self {
        let report = config.get("report").cloned().unwrap_or(Value::Null);
        Self::new(
            report
                .get("font_dir")
                .and_then(|v| v.as_str())
                .unwrap_or("/usr/share/fonts/truetype/liberation")
                .to_string(),
            report
                .get("font_family")
                .and_then(|v| v.as_str())
                .unwrap_or("LiberationSans")
                .to_string(),
        )
    }

    /// Render the report body to `output_path` and verify the file landed.
    pub fn export(&self, title: &str, body: &str, output_path: &Path) -> Result<(), ApiError> {
        let font_family = self.load_fonts()?;

        let mut doc = Document::new(font_family);
        doc.set_title(title);

        let mut decorator = SimplePageDecorator::new();
        decorator.set_margins(15);
        doc.set_page_decorator(decorator);

        let title_style = Style::new()
            .bold()
            .with_font_size(20)
            .with_color(HEADING_COLOR);
        doc.push(
            Paragraph::new(StyledString::new(title.to_string(), title_style))
                .aligned(Alignment::Center),
        );
        doc.push(Break::new(2));

        for line in layout::lines(body) {
            match line.kind {
                LineKind::Blank => doc.push(Break::new(1)),
                LineKind::Heading => {
                    let style = Style::new()
                        .bold()
                        .with_font_size(16)
                        .with_color(HEADING_COLOR);
                    doc.push(Paragraph::new(StyledString::new(line.text, style)));
                    doc.push(Break::new(1));
                }
                LineKind::Numbered => {
                    let style = Style::new().bold().with_font_size(12);
                    doc.push(Paragraph::new(StyledString::new(line.text, style)));
                }
                LineKind::Bullet | LineKind::Body => {
                    let style = Style::new().with_font_size(12);
                    doc.push(Paragraph::new(StyledString::new(line.text, style)));
                }
            }
        }

        if let Some(parent) = output_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        doc.render_to_file(output_path)
            .map_err(|err| ApiError::Internal(format!("PDF rendering failed: {}", err)))?;

        let size = std::fs::metadata(output_path)
            .map(|m| m.len())
            .unwrap_or(0);
        if size == 0 {
            return Err(ApiError::Internal(format!(
                "PDF file was not created: {}",
                output_path.display()
            )));
        }

        tracing::info!("Report exported: {} ({} bytes)", output_path.display(), size);
        Ok(())
    }

    fn load_fonts(&self) -> Result<genpdf::fonts::FontFamily<genpdf::fonts::FontData>, ApiError> {
        genpdf::fonts::from_files(&self.font_dir, &self.font_family, None)
            .or_else(|_| genpdf::fonts::from_files("", &self.font_family, None))
            .or_else(|_| {
                genpdf::fonts::from_files(
                    "/usr/share/fonts/truetype/liberation",
                    "LiberationSans",
                    None,
                )
            })
            .map_err(|err| {
                ApiError::Internal(format!(
                    "no usable font ({}/{}): {}",
                    self.font_dir, self.font_family, err
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn exporter_reads_fonts_from_config() {
        let config = json!({
            "report": { "font_dir": "/tmp/fonts", "font_family": "DejaVuSans" }
        });
        let exporter = PdfExporter::from_config(&config);
        assert_eq!(exporter.font_dir, "/tmp/fonts");
        assert_eq!(exporter.font_family, "DejaVuSans");
    }

    #[test]
    fn exporter_defaults_without_report_section() {
        let exporter = PdfExporter::from_config(&json!({}));
        assert_eq!(exporter.font_family, "LiberationSans");
    }

    // Rendering against real font files is environment-dependent; run with
    // `cargo test -- --ignored` on a machine with Liberation fonts.
    #[test]
    #[ignore]
    fn renders_a_nonempty_pdf() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("rapport.pdf");
        let exporter = PdfExporter::new(
            "/usr/share/fonts/truetype/liberation".to_string(),
            "LiberationSans".to_string(),
        );

        let body = "Résumé Exécutif\n\nLe danger est maîtrisé.\n1. Mesure\n- détail";
        exporter.export("Rapport HSE", body, &out).unwrap();
        assert!(out.metadata().unwrap().len() > 0);
    }
}
