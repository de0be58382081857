//! # Content Model
//!
//! Shared types for the content-approval workflow.
//!
//! ## Modules
//! - `api`: request and response bodies of the REST API
//! - `item`: the `ContentItem` record as exchanged over the REST API
//! - `status`: lifecycle status vocabulary and target platforms
//! - `timestamp`: ISO-8601 rendering used for every stamped field
//! - `fixtures`: fixed development dataset

pub mod api;
pub mod fixtures;
pub mod item;
pub mod status;
pub mod timestamp;

pub use item::{ContentItem, StatusPatch};
pub use status::{ParseEnumError, Platform, Status};
