//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `ContentKind`: Classification of a fetched resource (html, pdf, docx, other, error)
//! - `HostState`: Per-host request timing used for politeness pacing

mod content_kind;
mod host_state;

// Re-export main types
pub use content_kind::ContentKind;
pub use host_state::HostState;
