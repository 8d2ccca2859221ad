//! Build state: one optional component per slot, derived totals, saved-build
//! records, and the borrowed views the compatibility rules read from.

mod saved;
mod state;
mod view;

pub use saved::{generate_build_pid, relations_from_json, SavedBuild};
pub use state::{BuildAggregates, BuildState, DroppedRelation, RehydrateReport};
pub use view::{BuildView, PartView};
