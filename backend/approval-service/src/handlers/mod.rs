/// HTTP handlers
///
/// - Content: list items, update one item's status, bulk sync
/// - Health: liveness and store readiness
pub mod content;
pub mod health;

pub use content::{list_content, sync_content, update_status};
pub use health::{health, readiness};
