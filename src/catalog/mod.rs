//! Parts catalog: component types, the session registry, import, and the
//! browsing helpers (search, filters, similar parts, labels).

mod filter;
mod import;
mod labels;
mod registry;
mod similar;
mod types;

pub use filter::{
    filter_fields, manufacturers, select_options, sort_components, AttributeFilter, ComponentQuery,
    FilterField, FilterKind, SortOrder,
};
pub use import::{catalog_from_value, load_catalog_file, parse_catalog, Catalog, StaticCatalog};
pub use labels::format_title;
pub use registry::ComponentRegistry;
pub use similar::{similar_components, similarity_score, DEFAULT_SIMILAR_LIMIT};
pub use types::*;
