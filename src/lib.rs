pub mod api;
pub mod build;
pub mod catalog;
pub mod config;
pub mod error;
pub mod rules;
pub mod session;
pub mod wizard;

pub use api::{ApiClient, BuildStore, CatalogSource, CategoryInfo};
pub use build::{BuildAggregates, BuildState, RehydrateReport, SavedBuild};
pub use catalog::{Component, ComponentRegistry, Slot, StaticCatalog};
pub use config::{default_config, load_config, resolve_config, AppConfig};
pub use error::{DroneClearError, Result};
pub use rules::{Evaluator, RuleId, Warning};
pub use session::{AddOutcome, CategoryOutcome, Session};
pub use wizard::{ClassFilter, SizeClass, Wizard};

/// Install the global `tracing` subscriber. `RUST_LOG` overrides the default
/// `info` level. Calling it again is a no-op.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}
