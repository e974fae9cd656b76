//! # Bidcast
//!
//! Up/down prediction service for auction-style listings.
//!
//! This crate provides:
//! - Request validation, standardization, dummy encoding, and feature
//!   alignment for a pre-trained binary classifier
//! - Deterministic scoring against a logistic-regression model artifact
//! - An offline utility for computing standardization statistics from a
//!   relational store
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core business types and the pipeline stages
//! - `ports`: Trait definitions for external operations
//! - `adapters`: Concrete implementations (model artifacts, SQLite)
//! - `application`: Use cases orchestrating domain and ports
//! - `server`: Thin HTTP surface

pub mod adapters;
pub mod application;
pub mod domain;
pub mod ports;
pub mod server;

pub use domain::{Outcome, Prediction, RawListing};

/// Result type for Bidcast operations
pub type Result<T> = std::result::Result<T, BidcastError>;

/// Main error type for Bidcast
#[derive(Debug, thiserror::Error)]
pub enum BidcastError {
    #[error("Invalid listing data: {0}")]
    Validation(domain::ValidationErrors),

    #[error("Model artifact error: {0}")]
    Artifact(#[from] adapters::ArtifactError),

    #[error("Standardization table error: {0}")]
    MeanStd(#[from] adapters::MeanStdError),

    #[error("Statistics source error: {0}")]
    Statistics(#[from] adapters::StatsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}
