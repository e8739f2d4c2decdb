//! Report rendering: markdown cleanup, line classification and PDF export.

pub mod layout;
pub mod pdf;

pub use pdf::PdfExporter;
