//! View projection
//!
//! Derives renderer operations from reconciliation steps so the graph widget
//! and the text view can be patched in place instead of rebuilt, which would
//! lose layout positions, selection and scroll state.

mod project;
mod segments;
mod types;

pub use project::project_delta;
pub use segments::{segments, Segment};
pub use types::{span_id, EdgeView, NodeView, SpanView, ViewOp, ViewState};
