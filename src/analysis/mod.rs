//! Hazard analysis, CFST 6508 compliance checking and report synthesis.

pub mod compliance;
pub mod hazard;
pub mod pipeline;
pub mod report;

pub use compliance::ComplianceReport;
pub use hazard::HazardAnalysis;
pub use pipeline::{ReportArtifact, ReportPipeline, ReportRequest, UploadedPhoto};
