//! Compatibility constraint engine.
//!
//! Twelve fixed pairwise checks between build slots. Each check fires only
//! when every slot it reads is filled and every value it compares is present;
//! missing data is never reported as a conflict.
//!
//! # Severity
//!
//! - Frame checks (1-6) and the ESC cell-count check (10) read the part's
//!   `_compat_hard` / `_compat_soft` lists for the compared field.
//! - The connector check (7) is always `error`.
//! - Voltage window, motor cell count, video system and current checks
//!   (8, 9, 11, 12) are always `warning`.
//!
//! # Example
//!
//! ```ignore
//! use droneclear::build::BuildState;
//! use droneclear::rules::Evaluator;
//!
//! let evaluator = Evaluator::new();
//! let warnings = evaluator.evaluate(&build);
//!
//! for w in &warnings {
//!     println!("[{}] {}: {}", w.severity, w.title, w.message);
//! }
//!
//! // What-if: would this propeller fit?
//! let preview = evaluator.evaluate_hypothetical(&build, Slot::Propellers, &candidate);
//! ```

mod checks;
mod engine;
mod types;

pub use engine::Evaluator;
pub use types::*;
