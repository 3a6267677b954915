//! # Till Server
//!
//! HTTP back-office service for the Till cash-shift engine.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Till Server                                     │
//! │                                                                         │
//! │  Back-office UI ───► HTTP (axum) ───► Services ───► till-db (SQLite)   │
//! │                                          │                              │
//! │                                          ▼                              │
//! │                                      till-core                          │
//! │                                 (pure reconciliation)                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod routes;
pub mod services;
pub mod state;

pub use config::ServerConfig;
pub use error::{ApiError, ErrorCode};
pub use state::AppState;
