//! Guided build wizard.
//!
//! Walks a build through an ordered list of category steps after a size
//! class pre-step, re-ranking each step's candidates against the parts
//! already chosen.
//!
//! # Example
//!
//! ```ignore
//! use droneclear::wizard::{ClassFilter, SizeClass, Wizard};
//!
//! let mut wizard = Wizard::new(config.wizard.steps.clone());
//! wizard.start(&mut build, true);
//! wizard.choose_class(ClassFilter::Only(SizeClass::FiveInch), &build)?;
//!
//! let partition = wizard
//!     .candidate_partition(&build, registry.category(Slot::Frames), &evaluator)
//!     .unwrap();
//! for candidate in &partition.compatible {
//!     println!("{}", candidate.component.name);
//! }
//! ```

mod classify;
mod machine;
mod partition;
mod types;

pub use classify::{classify_name, infer_frame_class};
pub use machine::Wizard;
pub use partition::partition_candidates;
pub use types::*;
