//! services/forge/src/adapters/clock.rs
//!
//! Wall-clock implementation of the `Clock` port.

use cardforge_core::ports::Clock;
use chrono::{DateTime, Local, NaiveDate, Utc};

/// Streak days follow the device's local calendar; timestamps are UTC.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
