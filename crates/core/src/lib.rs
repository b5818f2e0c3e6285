//! `matchlens-core` — domain building blocks shared by the analytics and infra crates.
//!
//! This crate contains **pure domain** types (no I/O): player identities, routing
//! regions and the immutable match records ingested from the upstream API.

pub mod error;
pub mod id;
pub mod matches;
pub mod region;
pub mod riot_id;

pub use error::{DomainError, DomainResult};
pub use id::{MatchId, Puuid};
pub use matches::{MatchRecord, Participant, QueueType, Team, RANKED_QUEUES};
pub use region::Region;
pub use riot_id::RiotId;
