//! Forward rendering helpers (CPU implementation).
//!
//! - Binary tube silhouettes for synthetic reference masks
//! - RGB diagnostic overlays of a fit
//!
//! No gradients computed here - see `diff` module for backward passes.

pub mod overlay;
pub mod silhouette;

// Re-export
pub use overlay::render_overlay;
pub use silhouette::render_silhouette;
