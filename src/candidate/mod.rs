//! Candidate resolution: turns external search results into engine inputs
//!
//! The engine never talks to a search backend. Callers query a
//! [`CandidateSource`], normalize its records into [`Candidate`]s, and pass the
//! chosen one to a reconciliation operation.

mod latest;
mod normalize;
mod source;

pub use latest::{SearchTicket, SearchTracker};
pub use normalize::{normalize_record, normalize_results, Candidate};
pub use source::{resolve, CandidateSource, InMemorySource, SearchError, SearchNamespace};
