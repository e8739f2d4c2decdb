pub mod config;
pub mod directive;
pub mod health;
pub mod reports;
