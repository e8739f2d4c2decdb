use std::sync::Arc;

use axum::extract::{Multipart, Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::analysis::{ReportRequest, UploadedPhoto};
use crate::core::errors::ApiError;
use crate::state::AppState;

/// `POST /api/reports`: multipart form with `description`,
/// `company_name`, `company_size` and an optional `photo` file. Returns
/// the generated PDF as an attachment.
pub async fn create_report(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let request = parse_report_form(multipart).await?;

    let artifact = state.pipeline.run(request).await.map_err(|err| {
        tracing::error!("Report generation failed: {}", err);
        err
    })?;

    let pdf_bytes = std::fs::read(&artifact.pdf_path).map_err(ApiError::internal)?;
    tracing::info!(
        "Report ready: {} ({} bytes)",
        artifact.pdf_filename,
        pdf_bytes.len()
    );

    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", artifact.pdf_filename),
        ),
    ];
    Ok((headers, pdf_bytes))
}

async fn parse_report_form(mut multipart: Multipart) -> Result<ReportRequest, ApiError> {
    let mut request = ReportRequest::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::BadRequest(format!("invalid multipart form: {}", err)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "description" => {
                request.description = Some(text_field(field, "description").await?);
            }
            // the legacy form posted camelCase names; accept both
            "company_name" | "companyName" => {
                request.company_name = Some(text_field(field, "company_name").await?);
            }
            "company_size" | "companySize" => {
                let raw = text_field(field, "company_size").await?;
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    let size = trimmed.parse::<u32>().map_err(|_| {
                        ApiError::BadRequest(format!(
                            "company_size must be a positive integer, got '{}'",
                            trimmed
                        ))
                    })?;
                    request.company_size = Some(size);
                }
            }
            "photo" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(|err| {
                    ApiError::BadRequest(format!("failed to read photo upload: {}", err))
                })?;
                if !filename.is_empty() && !bytes.is_empty() {
                    request.photo = Some(UploadedPhoto {
                        filename,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            other => {
                tracing::debug!("Ignoring unknown form field: {}", other);
            }
        }
    }

    Ok(request)
}

async fn text_field(field: axum::extract::multipart::Field<'_>, name: &str) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|err| ApiError::BadRequest(format!("failed to read field '{}': {}", name, err)))
}

/// `GET /api/reports`: list generated report files.
pub async fn list_reports(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let mut reports = Vec::new();

    let entries = std::fs::read_dir(&state.paths.reports_dir).map_err(ApiError::internal)?;
    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().to_string();
        if !name.ends_with(".pdf") {
            continue;
        }
        let metadata = entry.metadata().ok();
        reports.push(json!({
            "filename": name,
            "size_bytes": metadata.as_ref().map(|m| m.len()),
        }));
    }

    reports.sort_by(|a, b| {
        let a = a["filename"].as_str().unwrap_or_default();
        let b = b["filename"].as_str().unwrap_or_default();
        b.cmp(a)
    });

    Ok(Json(json!({ "reports": reports })))
}

/// `GET /api/reports/{filename}`: download a previously generated PDF.
pub async fn download_report(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    if filename.contains('/') || filename.contains('\\') || filename.contains("..") {
        return Err(ApiError::BadRequest("invalid report filename".to_string()));
    }
    if !filename.ends_with(".pdf") {
        return Err(ApiError::BadRequest(
            "report filename must end with .pdf".to_string(),
        ));
    }

    let path = state.paths.reports_dir.join(&filename);
    let bytes = std::fs::read(&path)
        .map_err(|_| ApiError::NotFound(format!("report not found: {}", filename)))?;

    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        ),
    ];
    Ok((headers, bytes))
}
