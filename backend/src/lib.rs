//! # SFP Rust Backend
//!
//! Data cleaning and outlier analysis for solar generation forecasting.
//!
//! Uploaded hourly site data (irradiance, temperature, AC energy) is validated
//! and carried through three stages: `raw`, `gi_tm_adjusted` and
//! `outlier_removed`. Every stage comes with histograms, pairwise scatter sets,
//! calendar box plots and a correlation matrix, served as JSON over an axum
//! REST API.
//!
//! ## Architecture
//!
//! - [`models`]: Dataset, records, stages and irradiance units
//! - [`parsing`]: CSV and JSON uploads into a raw string table
//! - [`preprocessing`]: Schema validation, GI/TM adjustment, stage pipeline
//! - [`algorithms`]: Quantiles, descriptive statistics, outlier detectors
//! - [`services`]: Grouped statistics and endpoint orchestration
//! - [`routes`]: Request and response payloads per endpoint
//! - [`api`]: Re-exports of the public DTO surface
//! - [`db`]: Repository pattern and in-memory storage
//! - [`config`]: TOML and environment configuration
//! - [`http`]: Axum-based HTTP server and request handlers

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod algorithms;
pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod parsing;
pub mod preprocessing;
pub mod routes;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
