//! Compatibility identity layer and candidate matching for the crew marketplace.
//!
//! * [`identity`] verifies bearer tokens from both the legacy CMS and the current platform.
//! * [`directory`] resolves accounts, taxonomy nodes and openings by legacy or native id.
//! * [`matching`] selects candidates for an opening by skill overlap and distance.

pub mod config;
pub mod directory;
pub mod error;
pub mod identity;
pub mod matching;
pub mod telemetry;
