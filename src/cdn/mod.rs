//! CDN-facing concerns: object naming, URL resolution, transfer and
//! retention.

pub mod age;

mod namer;
mod sync;

pub use namer::CdnNamer;
pub use sync::CdnSync;
