//! # Repository Module
//!
//! Database repository implementations for Till.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  Service layer                                                         │
//! │       │                                                                 │
//! │       │  db.sessions().find_open()                                      │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  SessionRepository                                                     │
//! │  ├── insert_open(&self, session)                                       │
//! │  ├── find_open(&self)                                                  │
//! │  ├── close(&self, id, figures)                                         │
//! │  └── history(&self, filter)                                            │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Benefits:                                                              │
//! │  • Clean separation of concerns                                        │
//! │  • SQL is isolated in one place                                        │
//! │  • Window-boundary conventions live next to the queries               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`session::SessionRepository`] - Shift lifecycle rows and history
//! - [`withdrawal::WithdrawalRepository`] - Append-only withdrawal ledger
//! - [`sale::SaleReader`] - Read-only sales stream queries
//! - [`user::UserDirectory`] - Operator lookup projection

pub mod sale;
pub mod session;
pub mod user;
pub mod withdrawal;
