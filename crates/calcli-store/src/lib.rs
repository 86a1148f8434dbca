//! Event storage: `.ics` files in calendar directories, read through a
//! coalescing cache.

pub mod cache;
pub mod error;
pub mod ics;
pub mod vdir;

pub use cache::{CacheEntry, CacheKey, EventCache};
pub use error::{StoreError, StoreResult};
pub use ics::{generate_event, parse_events, parse_rrule};
pub use vdir::{BoxFuture, Calendars, EventSource, ReindexStats, VdirStore, safe_file_stem};
