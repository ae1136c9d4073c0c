//! `carfeed-core`: vehicle feed normalization engine.
//!
//! Pure engine crate: receives decoded feed bodies, returns canonical vehicle
//! records. Network and filesystem access sit behind the [`Fetcher`] and
//! [`Persist`] traits, implemented by the CLI.

pub mod body;
pub mod driver;
pub mod error;
pub mod flatten;
pub mod inference;
pub mod model;
pub mod normalize;
pub mod reconcile;

pub use body::RawBody;
pub use driver::{run, Aggregator, Fetcher, Persist, RunReport, SourceOutcome};
pub use error::FeedError;
pub use flatten::{flatten, unwrap_envelope};
pub use inference::InferenceTable;
pub use model::{AggregateDocument, RawRecord, VehicleRecord};
pub use normalize::normalize;
pub use reconcile::{reconcile, reconcile_record};
