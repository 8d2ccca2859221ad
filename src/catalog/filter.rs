//! Search, filtering and sorting over a category's component list.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::types::{Component, Scalar, Slot};
use crate::error::DroneClearError;

// =============================================================================
// QUERY TYPES
// =============================================================================

/// Sort order for component lists. Missing values always sort last.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    #[default]
    Default,
    NameAsc,
    NameDesc,
    WeightAsc,
    WeightDesc,
    PriceAsc,
    PriceDesc,
}

impl FromStr for SortOrder {
    type Err = DroneClearError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "default" | "" => Ok(SortOrder::Default),
            "name-asc" => Ok(SortOrder::NameAsc),
            "name-desc" => Ok(SortOrder::NameDesc),
            "weight-asc" => Ok(SortOrder::WeightAsc),
            "weight-desc" => Ok(SortOrder::WeightDesc),
            "price-asc" => Ok(SortOrder::PriceAsc),
            "price-desc" => Ok(SortOrder::PriceDesc),
            other => Err(DroneClearError::InvalidInput(format!("Unknown sort order '{}'", other))),
        }
    }
}

/// A filter on one attribute path (dotted, relative to the attribute bag).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AttributeFilter {
    /// Value (or any list element) equals the selected option.
    Select { path: String, value: String },
    /// Numeric value within the optional bounds.
    Range {
        path: String,
        min: Option<f64>,
        max: Option<f64>,
    },
    /// Truthiness equals the flag.
    Flag { path: String, value: bool },
}

/// Search and filter state for a category listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub weight_min: Option<f64>,
    #[serde(default)]
    pub weight_max: Option<f64>,
    #[serde(default)]
    pub filters: Vec<AttributeFilter>,
    #[serde(default)]
    pub sort: SortOrder,
}

impl ComponentQuery {
    pub fn search(term: impl Into<String>) -> Self {
        Self {
            search: Some(term.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn matches(&self, component: &Component) -> bool {
        self.matches_search(component)
            && self.matches_manufacturer(component)
            && self.matches_weight(component)
            && self.filters.iter().all(|f| filter_matches(f, component))
    }

    /// Filter then sort. The input order is kept for `SortOrder::Default`.
    pub fn apply(&self, components: &[Arc<Component>]) -> Vec<Arc<Component>> {
        let mut result: Vec<Arc<Component>> = components
            .iter()
            .filter(|c| self.matches(c))
            .cloned()
            .collect();
        sort_components(&mut result, self.sort);
        result
    }

    fn matches_search(&self, component: &Component) -> bool {
        let Some(term) = self.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) else {
            return true;
        };
        let term = term.to_lowercase();
        component.name.to_lowercase().contains(&term)
            || component.manufacturer.to_lowercase().contains(&term)
            || component.description.to_lowercase().contains(&term)
            || component.attributes.tags().iter().any(|tag| tag.contains(&term))
    }

    fn matches_manufacturer(&self, component: &Component) -> bool {
        match self.manufacturer.as_deref().filter(|m| !m.is_empty()) {
            Some(m) => component.manufacturer == m,
            None => true,
        }
    }

    fn matches_weight(&self, component: &Component) -> bool {
        if self.weight_min.is_none() && self.weight_max.is_none() {
            return true;
        }
        within(component.weight_g(), self.weight_min, self.weight_max)
    }
}

fn within(value: Option<f64>, min: Option<f64>, max: Option<f64>) -> bool {
    let Some(v) = value else {
        return false;
    };
    min.map_or(true, |m| v >= m) && max.map_or(true, |m| v <= m)
}

fn filter_matches(filter: &AttributeFilter, component: &Component) -> bool {
    match filter {
        AttributeFilter::Select { path, value } => match component.attributes.get_path(path) {
            Some(Value::Array(items)) => items.iter().any(|item| value_text(item) == *value),
            Some(Value::Null) | None => false,
            Some(other) => value_text(other) == *value,
        },
        AttributeFilter::Range { path, min, max } => {
            if min.is_none() && max.is_none() {
                return true;
            }
            let number = component
                .attributes
                .get_path(path)
                .and_then(Scalar::from_json)
                .and_then(|s| s.as_number());
            within(number, *min, *max)
        }
        AttributeFilter::Flag { path, value } => {
            truthy(component.attributes.get_path(path)) == *value
        }
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map_or(false, |v| v != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

fn cmp_missing_last(a: Option<f64>, b: Option<f64>, descending: bool) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) if descending => y.total_cmp(&x),
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

pub fn sort_components(components: &mut [Arc<Component>], order: SortOrder) {
    let by_name = |a: &Arc<Component>, b: &Arc<Component>| {
        a.name.to_lowercase().cmp(&b.name.to_lowercase())
    };
    match order {
        SortOrder::Default => {}
        SortOrder::NameAsc => components.sort_by(by_name),
        SortOrder::NameDesc => components.sort_by(|a, b| by_name(b, a)),
        SortOrder::WeightAsc => {
            components.sort_by(|a, b| cmp_missing_last(a.weight_g(), b.weight_g(), false))
        }
        SortOrder::WeightDesc => {
            components.sort_by(|a, b| cmp_missing_last(a.weight_g(), b.weight_g(), true))
        }
        SortOrder::PriceAsc => components.sort_by(|a, b| cmp_missing_last(a.price(), b.price(), false)),
        SortOrder::PriceDesc => components.sort_by(|a, b| cmp_missing_last(a.price(), b.price(), true)),
    }
}

/// Sorted distinct manufacturers of a component list.
pub fn manufacturers(components: &[Arc<Component>]) -> Vec<String> {
    components
        .iter()
        .map(|c| c.manufacturer.trim())
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

// =============================================================================
// PER-CATEGORY FILTER FIELDS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    Select,
    Range,
}

/// A filterable attribute offered for a category.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FilterField {
    pub label: &'static str,
    pub path: &'static str,
    pub kind: FilterKind,
}

const fn select(label: &'static str, path: &'static str) -> FilterField {
    FilterField { label, path, kind: FilterKind::Select }
}

const fn range(label: &'static str, path: &'static str) -> FilterField {
    FilterField { label, path, kind: FilterKind::Range }
}

const FRAMES_FILTERS: &[FilterField] = &[
    select("Mounting Pattern", "compatibility.fc_mounting_patterns_mm"),
    range("Max Prop Size (in)", "compatibility.prop_size_max_in"),
    select("Motor Mount Spacing", "compatibility.motor_mount_hole_spacing_mm"),
    range("Wheelbase (mm)", "wheelbase_mm"),
];

const MOTORS_FILTERS: &[FilterField] = &[
    select("Motor Size", "motor_size"),
    range("KV Rating", "kv_rating"),
    select("Mount Spacing", "compatibility.motor_mount_hole_spacing_mm"),
    range("Max Cell Count", "compatibility.cell_count_max"),
];

const FLIGHT_CONTROLLERS_FILTERS: &[FilterField] = &[
    select("Mounting Pattern", "mounting_pattern_mm"),
    select("Processor", "processor"),
    select("Firmware", "firmware"),
];

const ESCS_FILTERS: &[FilterField] = &[
    select("Mounting Pattern", "compatibility.mounting_pattern_mm"),
    range("Max Cell Count", "compatibility.cell_count_max"),
    range("Current Rating (A)", "compatibility.continuous_current_per_motor_a"),
];

const STACKS_FILTERS: &[FilterField] = &[
    select("Mounting Pattern", "mounting_pattern_mm"),
    range("Max Cell Count", "cell_count_max"),
];

const VIDEO_TRANSMITTERS_FILTERS: &[FilterField] = &[
    select("Video System", "video_system"),
    select("Digital System", "compatibility.digital_system"),
    range("Output Power (mW)", "output_power_mw"),
];

const FPV_CAMERAS_FILTERS: &[FilterField] = &[
    select("Video System", "video_system"),
    select("Digital System", "compatibility.digital_system"),
    select("Sensor Size", "sensor_size"),
];

const RECEIVERS_FILTERS: &[FilterField] = &[
    select("Protocol", "protocol"),
    select("Frequency (GHz)", "frequency_ghz"),
    select("Antenna Connector", "antenna_connector"),
];

const BATTERIES_FILTERS: &[FilterField] = &[
    select("Cell Count (S)", "cell_count"),
    range("Capacity (mAh)", "capacity_mah"),
    range("Discharge Rate (C)", "discharge_rate_c"),
    select("Connector", "connector_type"),
];

const PROPELLERS_FILTERS: &[FilterField] = &[
    select("Diameter (in)", "diameter_in"),
    select("Pitch (in)", "pitch_in"),
    select("Blade Count", "blade_count"),
    select("Material", "material"),
];

const ANTENNAS_FILTERS: &[FilterField] = &[
    select("Connector Type", "connector_type"),
    select("Frequency (GHz)", "frequency_ghz"),
    select("Polarization", "polarization"),
];

const ACTION_CAMERAS_FILTERS: &[FilterField] = &[
    select("Resolution", "resolution"),
    select("Sensor Size", "sensor_size"),
];

/// Filterable attributes for a category.
pub fn filter_fields(slot: Slot) -> &'static [FilterField] {
    match slot {
        Slot::Frames => FRAMES_FILTERS,
        Slot::Motors => MOTORS_FILTERS,
        Slot::FlightControllers => FLIGHT_CONTROLLERS_FILTERS,
        Slot::Escs => ESCS_FILTERS,
        Slot::Stacks => STACKS_FILTERS,
        Slot::VideoTransmitters => VIDEO_TRANSMITTERS_FILTERS,
        Slot::FpvCameras => FPV_CAMERAS_FILTERS,
        Slot::Receivers => RECEIVERS_FILTERS,
        Slot::Batteries => BATTERIES_FILTERS,
        Slot::Propellers => PROPELLERS_FILTERS,
        Slot::Antennas => ANTENNAS_FILTERS,
        Slot::ActionCameras => ACTION_CAMERAS_FILTERS,
    }
}

/// Distinct option values present for a select field.
pub fn select_options(components: &[Arc<Component>], path: &str) -> Vec<String> {
    let mut options = BTreeSet::new();
    for component in components {
        match component.attributes.get_path(path) {
            Some(Value::Array(items)) => options.extend(items.iter().map(value_text)),
            Some(Value::Null) | None => {}
            Some(other) => {
                options.insert(value_text(other));
            }
        }
    }
    options.into_iter().collect()
}
