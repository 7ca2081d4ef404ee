//! # Search Crawling
//!
//! One search fans out to every registered site:
//! - `session`: drives a single browser through one site's results page
//! - `job`: the failure boundary around a session, never fails outward
//! - `orchestrator`: runs all jobs concurrently and merges by price

pub mod job;
pub mod orchestrator;
pub mod session;

pub use job::ScrapeJob;
pub use orchestrator::{OrchestratorConfig, SearchOrchestrator};
pub use session::{ScrapeError, SiteSession};
