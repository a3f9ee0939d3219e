//! Time and timestamp helpers.
//!
//! Everything stored or published uses UTC. Hardware clocks on the lighting
//! bus run on local time, so they get a naive local reading instead.

use chrono::{DateTime, Local, NaiveDateTime, Utc};

/// UTC timestamp used for `last_changed`, `last_updated` and event times.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Current local wall-clock time without an offset.
#[must_use]
pub fn local_wall_clock() -> NaiveDateTime {
    Local::now().naive_local()
}
