/// Business logic layer
///
/// - `status`: single-item status transitions and their stamps
/// - `sync`: bulk row overwrite from client state
/// - `clock`: monotonic stamp source shared by both write paths
pub mod clock;
pub mod status;
pub mod sync;

pub use clock::StampClock;
pub use status::{StatusService, StatusUpdate};
pub use sync::{SyncOutcome, SyncService};
