//! Candidate matching: skill overlap plus great-circle distance over the active candidate pool.

pub mod config;
pub mod distance;
pub(crate) mod engine;
pub mod location;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use config::MatchPolicy;
pub use distance::{distance_km, GeoPoint};
pub use engine::{CandidateMatch, Distance};
pub use location::parse_location_blob;
pub use router::matching_router;
pub use service::{CandidateMatcher, MatchError, MatchReport};
