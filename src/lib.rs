//! HMC Prometheus Exporter
//!
//! A Prometheus metrics exporter for CPCs managed through an HMC, built around
//! a dependency-driven resource cache.
//!
//! # Overview
//!
//! Metric records coming from the HMC are keyed by opaque resource URIs. The
//! [`cache`] turns those URIs into identified, hierarchically related
//! resources (CPC, adapter, partition, nic, port, storage group, ...), while
//! keeping round trips to the HMC low and never re-fetching resources the
//! session user cannot see.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     REST (HTTPS)     ┌──────────────────┐
//! │     HMC     │ ◄─────────────────►  │     Exporter     │
//! │  Web Svcs   │                      │  ┌────────────┐  │
//! └─────────────┘                      │  │  Console   │  │      HTTP      ┌────────────┐
//!                                      │  └────────────┘  │ ◄────────────► │ Prometheus │
//!                                      │  ┌────────────┐  │   /metrics     └────────────┘
//!                                      │  │   Cache    │  │
//!                                      │  └────────────┘  │
//!                                      │  ┌────────────┐  │
//!                                      │  │  Metrics   │  │
//!                                      │  └────────────┘  │
//!                                      └──────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`cache`] - Resource cache: classification, population, lazy lookup
//! - [`console`] - HMC client trait and REST implementation
//! - [`collectors`] - Per-concern collectors run every cycle
//! - [`metrics`] - Prometheus metric definitions
//! - [`server`] - HTTP server and collection loop
//! - [`config`] - Configuration management
//! - [`error`] - Error types
//!
//! # Quick Start
//!
//! ```no_run
//! use hmc_exporter::{config::Config, server};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/Default.toml")?;
//!     server::start(config).await?;
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod collectors;
pub mod config;
pub mod console;
pub mod error;
pub mod metrics;
pub mod server;
