//! # Disaster Response
//!
//! An ingestion job that merges, cleans and stores labelled disaster-response messages, and a
//! training job that fits, evaluates and saves a multi-label text classifier on them.
#![forbid(unsafe_code)]

/// Pipelines
pub mod pipelines;

/// Datasets
pub mod datasets;

/// SQLite persistence
pub mod storage;

/// Utilities
pub mod utils;

/// CLI argument parsing and job orchestration
pub mod cli;
