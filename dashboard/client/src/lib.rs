//! Dashboard client
//!
//! Client-side state for the content-approval dashboard: an HTTP client for
//! the approval service and a content board that caches items, applies
//! status changes once the server accepts them, and periodically reconciles
//! with the store.
//!
//! # Modules
//!
//! - `api`: HTTP client with bounded timeouts
//! - `board`: Item cache, status actions, notices, reconciliation

pub mod api;
pub mod board;

pub use api::{ApiClient, ClientError};
pub use board::{BoardConfig, ContentBoard, Notice, NoticeLevel};
