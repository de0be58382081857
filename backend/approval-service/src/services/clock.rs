/// Stamp source shared by every write path
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

/// Hands out millisecond timestamps that strictly increase across calls,
/// even when the wall clock stalls or steps backwards.
#[derive(Default)]
pub struct StampClock {
    last: Mutex<Option<DateTime<Utc>>>,
}

impl StampClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> DateTime<Utc> {
        let mut last = self.last.lock();
        let mut stamp = content_model::timestamp::now();
        if let Some(previous) = *last {
            if stamp <= previous {
                stamp = previous + Duration::milliseconds(1);
            }
        }
        *last = Some(stamp);
        stamp
    }
}
