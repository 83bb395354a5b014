use chrono::{DateTime, Utc};

/// Wall-clock capability. Auction state ("Ended", featured, ending-soon)
/// is recomputed from `now()` on every read, so the clock is injected
/// through app state rather than read from the system directly — tests pin
/// it to an arbitrary instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at a fixed instant.
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
