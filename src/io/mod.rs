//! I/O operations for loading and saving data.
//!
//! - Binary reference masks (any `image` format, Otsu-thresholded on load)
//! - Fit configuration and reports are JSON, see `config` and `optim::trainer`

mod mask;

// Re-export public functions
pub use mask::{binarize_otsu, load_binary_mask, save_binary_mask};
