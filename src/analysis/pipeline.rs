//! End-to-end report pipeline: intake validation, photo storage, hazard
//! analysis, compliance check, report synthesis and PDF export.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Local;
use serde_json::Value;

use super::compliance::{self, ComplianceReport};
use super::hazard::{self, HazardAnalysis};
use super::report;
use crate::core::config::{AppPaths, ConfigService};
use crate::core::errors::ApiError;
use crate::directive::DirectiveIndex;
use crate::llm::LlmService;
use crate::report::PdfExporter;

#[derive(Debug, Clone)]
pub struct UploadedPhoto {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct ReportRequest {
    pub description: Option<String>,
    pub company_name: Option<String>,
    pub company_size: Option<u32>,
    pub photo: Option<UploadedPhoto>,
}

/// Everything produced for one hazard report.
#[derive(Debug)]
pub struct ReportArtifact {
    pub pdf_path: PathBuf,
    pub pdf_filename: String,
    pub report_text: String,
    pub hazard: HazardAnalysis,
    pub compliance: ComplianceReport,
    pub photo_path: Option<PathBuf>,
}

#[derive(Clone)]
pub struct ReportPipeline {
    llm: LlmService,
    index: DirectiveIndex,
    config: ConfigService,
    paths: Arc<AppPaths>,
}

impl ReportPipeline {
    pub fn new(
        llm: LlmService,
        index: DirectiveIndex,
        config: ConfigService,
        paths: Arc<AppPaths>,
    ) -> Self {
        Self {
            llm,
            index,
            config,
            paths,
        }
    }

    /// Run the full pipeline and write the PDF.
    pub async fn run(&self, request: ReportRequest) -> Result<ReportArtifact, ApiError> {
        let mut artifact = self.generate(request).await?;

        let pdf_filename = format!(
            "rapport_hse_{}.pdf",
            Local::now().format("%Y%m%d_%H%M%S")
        );
        let pdf_path = self.paths.reports_dir.join(&pdf_filename);

        let exporter = PdfExporter::from_config(&self.config.load_config()?);
        exporter.export("Rapport HSE", &artifact.report_text, &pdf_path)?;

        artifact.pdf_filename = pdf_filename;
        artifact.pdf_path = pdf_path;
        Ok(artifact)
    }

    /// Run everything except the PDF export.
    pub async fn generate(&self, request: ReportRequest) -> Result<ReportArtifact, ApiError> {
        let app = self.app_section();

        let description = request
            .description
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        if description.is_none() && request.photo.is_none() {
            return Err(ApiError::BadRequest(
                "Veuillez remplir la description du danger.".to_string(),
            ));
        }

        let max_len = app
            .get("max_description_length")
            .and_then(|v| v.as_u64())
            .unwrap_or(8000) as usize;
        if let Some(text) = description {
            if text.chars().count() > max_len {
                return Err(ApiError::BadRequest(format!(
                    "La description dépasse {} caractères.",
                    max_len
                )));
            }
        }

        let company_name = request
            .company_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| {
                app.get("company_name_default")
                    .and_then(|v| v.as_str())
                    .unwrap_or("Entreprise XYZ")
                    .to_string()
            });
        let company_size = request.company_size.unwrap_or_else(|| {
            app.get("company_size_default")
                .and_then(|v| v.as_u64())
                .unwrap_or(20) as u32
        });

        let photo_path = match &request.photo {
            Some(photo) => Some(self.store_photo(photo)?),
            None => None,
        };

        tracing::info!(
            "Analyzing hazard: {} | photo: {}",
            description.unwrap_or("(photo only)"),
            photo_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "none".to_string())
        );
        let hazard = hazard::analyze(
            &self.llm,
            description,
            request.photo.as_ref().map(|p| p.bytes.as_slice()),
        )
        .await?;

        let ingest = self.index.ensure_ingested().await?;
        if !ingest.reused {
            tracing::info!("Directive indexed: {} passages", ingest.passages);
        }

        tracing::info!("Checking compliance for {}", company_name);
        let compliance = compliance::check(&self.llm, &self.index, &hazard.raw, company_size).await?;

        tracing::info!("Synthesizing report for {}", company_name);
        let mut report_text =
            report::synthesize(&self.llm, &hazard.raw, &compliance.assessment, &company_name)
                .await?;

        if let Some(path) = &photo_path {
            report_text.push_str(&format!("\n\nPhoto jointe: {}", path.display()));
        }

        Ok(ReportArtifact {
            pdf_path: PathBuf::new(),
            pdf_filename: String::new(),
            report_text,
            hazard,
            compliance,
            photo_path,
        })
    }

    fn store_photo(&self, photo: &UploadedPhoto) -> Result<PathBuf, ApiError> {
        if photo.bytes.is_empty() {
            return Err(ApiError::BadRequest(
                "La photo envoyée est vide.".to_string(),
            ));
        }

        let filename = sanitize_filename(&photo.filename);
        let path = self.paths.uploads_dir.join(filename);
        std::fs::write(&path, &photo.bytes).map_err(ApiError::internal)?;
        tracing::info!("Photo stored: {}", path.display());
        Ok(path)
    }

    fn app_section(&self) -> Value {
        self.config
            .load_config()
            .ok()
            .and_then(|c| c.get("app").cloned())
            .unwrap_or(Value::Null)
    }
}

/// Restrict a client-supplied filename to a safe charset and strip any
/// path components.
pub fn sanitize_filename(raw: &str) -> String {
    let base = raw
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(raw)
        .trim()
        .trim_start_matches('.');

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() {
        "photo.jpg".to_string()
    } else {
        cleaned
    }
}
