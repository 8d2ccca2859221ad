//! Type definitions for catalog components and their attribute bags.
//!
//! Components arrive from the backend (or an imported catalog file) as JSON
//! records with an open `schema_data` mapping. The mapping is kept verbatim for
//! display and round-trip, while the rule-relevant parts (weight, the
//! `compatibility` block and its severity lists, stack sub-objects) are parsed
//! once when the component is loaded.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

// =============================================================================
// SLOTS
// =============================================================================

/// A build slot / component category.
///
/// Declaration order is the display priority order, so `Ord` on `Slot` sorts
/// a build the way the build drawer lists it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Slot {
    #[serde(rename = "frames", alias = "frame")]
    Frames,
    #[serde(rename = "flight_controllers", alias = "flight_controller")]
    FlightControllers,
    #[serde(rename = "escs", alias = "esc")]
    Escs,
    #[serde(rename = "stacks", alias = "stack")]
    Stacks,
    #[serde(rename = "motors", alias = "motor")]
    Motors,
    #[serde(rename = "propellers", alias = "propeller")]
    Propellers,
    #[serde(rename = "video_transmitters", alias = "video_transmitter", alias = "vtx")]
    VideoTransmitters,
    #[serde(rename = "fpv_cameras", alias = "fpv_camera", alias = "camera")]
    FpvCameras,
    #[serde(rename = "receivers", alias = "receiver")]
    Receivers,
    #[serde(rename = "antennas", alias = "antenna")]
    Antennas,
    #[serde(rename = "batteries", alias = "battery")]
    Batteries,
    #[serde(rename = "action_cameras", alias = "action_camera")]
    ActionCameras,
}

impl Slot {
    pub const ALL: [Slot; 12] = [
        Slot::Frames,
        Slot::FlightControllers,
        Slot::Escs,
        Slot::Stacks,
        Slot::Motors,
        Slot::Propellers,
        Slot::VideoTransmitters,
        Slot::FpvCameras,
        Slot::Receivers,
        Slot::Antennas,
        Slot::Batteries,
        Slot::ActionCameras,
    ];

    /// Wire slug used by the backend (`/api/components/?category=<slug>`).
    pub fn slug(&self) -> &'static str {
        match self {
            Slot::Frames => "frames",
            Slot::FlightControllers => "flight_controllers",
            Slot::Escs => "escs",
            Slot::Stacks => "stacks",
            Slot::Motors => "motors",
            Slot::Propellers => "propellers",
            Slot::VideoTransmitters => "video_transmitters",
            Slot::FpvCameras => "fpv_cameras",
            Slot::Receivers => "receivers",
            Slot::Antennas => "antennas",
            Slot::Batteries => "batteries",
            Slot::ActionCameras => "action_cameras",
        }
    }

    /// Parse a slug, accepting plural wire slugs and singular spellings.
    pub fn from_slug(slug: &str) -> Option<Slot> {
        let normalized = slug.trim().to_lowercase().replace(['-', ' '], "_");
        let slot = match normalized.as_str() {
            "frames" | "frame" => Slot::Frames,
            "flight_controllers" | "flight_controller" | "fc" => Slot::FlightControllers,
            "escs" | "esc" => Slot::Escs,
            "stacks" | "stack" => Slot::Stacks,
            "motors" | "motor" => Slot::Motors,
            "propellers" | "propeller" | "props" => Slot::Propellers,
            "video_transmitters" | "video_transmitter" | "vtx" => Slot::VideoTransmitters,
            "fpv_cameras" | "fpv_camera" | "camera" => Slot::FpvCameras,
            "receivers" | "receiver" | "rx" => Slot::Receivers,
            "antennas" | "antenna" => Slot::Antennas,
            "batteries" | "battery" => Slot::Batteries,
            "action_cameras" | "action_camera" => Slot::ActionCameras,
            _ => return None,
        };
        Some(slot)
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

// =============================================================================
// SCALAR VALUES
// =============================================================================

static LEADING_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*[+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?").expect("valid regex")
});

static PRICE_AMOUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+(?:\.\d+)?|\.\d+").expect("valid regex"));

/// Parse the leading numeric token of a string (`"30.5x30.5"` -> 30.5, `"6S"` -> 6).
pub fn leading_number(text: &str) -> Option<f64> {
    let token = LEADING_NUMBER.find(text)?.as_str().trim();
    token.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Parse the first numeric amount out of a free-text price (`"$1,049.99"` -> 1049.99).
pub fn parse_price(text: &str) -> Option<f64> {
    let cleaned = text.replace(',', "");
    let amount = PRICE_AMOUNT.find(&cleaned)?.as_str();
    amount.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// A single attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Number(f64),
    Text(String),
    Bool(bool),
}

impl Scalar {
    pub fn from_json(value: &Value) -> Option<Scalar> {
        match value {
            Value::Number(n) => n.as_f64().map(Scalar::Number),
            Value::String(s) => Some(Scalar::Text(s.clone())),
            Value::Bool(b) => Some(Scalar::Bool(*b)),
            _ => None,
        }
    }

    /// Numeric reading of the value, using the leading-number rule for text.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Scalar::Number(n) if n.is_finite() => Some(*n),
            Scalar::Number(_) => None,
            Scalar::Text(s) => leading_number(s),
            Scalar::Bool(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Bool(b) => Some(*b),
            Scalar::Text(s) => match s.trim().to_lowercase().as_str() {
                "true" | "yes" => Some(true),
                "false" | "no" => Some(false),
                _ => None,
            },
            Scalar::Number(_) => None,
        }
    }

    /// Normalized designator text: lowercase with whitespace removed.
    pub fn normalized(&self) -> String {
        self.to_string()
            .chars()
            .filter(|c| !c.is_whitespace())
            .flat_map(char::to_lowercase)
            .collect()
    }

    /// Equality used by pattern and designator checks: numeric when both
    /// sides parse as numbers, normalized text otherwise.
    pub fn same_as(&self, other: &Scalar) -> bool {
        match (self, other) {
            (Scalar::Bool(a), Scalar::Bool(b)) => a == b,
            _ => match (self.as_number(), other.as_number()) {
                (Some(a), Some(b)) => (a - b).abs() < 1e-9,
                _ => self.normalized() == other.normalized(),
            },
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Number(n) => write!(f, "{}", n),
            Scalar::Text(s) => f.write_str(s.trim()),
            Scalar::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// A compatibility value: a scalar or a list meaning "supports any of these".
#[derive(Debug, Clone, PartialEq)]
pub enum CompatValue {
    One(Scalar),
    Many(Vec<Scalar>),
}

impl CompatValue {
    /// Parse a JSON value. Null, objects and empty lists read as absent.
    pub fn from_json(value: &Value) -> Option<CompatValue> {
        match value {
            Value::Array(items) => {
                let scalars: Vec<Scalar> = items.iter().filter_map(Scalar::from_json).collect();
                if scalars.is_empty() {
                    None
                } else {
                    Some(CompatValue::Many(scalars))
                }
            }
            other => Scalar::from_json(other).map(CompatValue::One),
        }
    }

    pub fn values(&self) -> &[Scalar] {
        match self {
            CompatValue::One(s) => std::slice::from_ref(s),
            CompatValue::Many(list) => list,
        }
    }

    /// Single numeric reading. Lists only qualify when they hold exactly one value.
    pub fn number(&self) -> Option<f64> {
        match self.values() {
            [only] => only.as_number(),
            _ => None,
        }
    }

    /// Single text reading, for designator comparisons.
    pub fn text(&self) -> Option<&Scalar> {
        match self.values() {
            [only] => Some(only),
            _ => None,
        }
    }

    pub fn contains(&self, needle: &Scalar) -> bool {
        self.values().iter().any(|v| v.same_as(needle))
    }

    pub fn overlaps(&self, other: &CompatValue) -> bool {
        other.values().iter().any(|v| self.contains(v))
    }

    pub fn same_as(&self, other: &CompatValue) -> bool {
        let (a, b) = (self.values(), other.values());
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same_as(y))
    }
}

impl fmt::Display for CompatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.values().iter().map(|v| v.to_string()).collect();
        f.write_str(&parts.join(", "))
    }
}

// =============================================================================
// SEVERITY
// =============================================================================

/// Warning severity: `error` blocks, `warning` advises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Warning => f.write_str("warning"),
        }
    }
}

/// Field name -> severity, built once from `_compat_hard` / `_compat_soft`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeverityMap {
    fields: HashMap<String, Severity>,
}

impl SeverityMap {
    /// Hard wins when a field appears in both lists.
    pub fn from_lists(hard: &[String], soft: &[String]) -> Self {
        let mut fields = HashMap::new();
        for name in soft {
            fields.insert(name.clone(), Severity::Warning);
        }
        for name in hard {
            fields.insert(name.clone(), Severity::Error);
        }
        Self { fields }
    }

    /// Severity explicitly declared for the field, if any.
    pub fn explicit(&self, field: &str) -> Option<Severity> {
        self.fields.get(field).copied()
    }

    /// Declared severity, defaulting to advisory.
    pub fn severity_for(&self, field: &str) -> Severity {
        self.explicit(field).unwrap_or(Severity::Warning)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

// =============================================================================
// COMPATIBILITY FIELDS
// =============================================================================

/// Every attribute name the compatibility rules and size inference read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompatField {
    PropSizeMaxIn,
    DiameterIn,
    FcMountingPatternsMm,
    MountingPatternMm,
    MotorMountHoleSpacingMm,
    FcMountHoleSize,
    MountHoleSize,
    MotorMountBoltSize,
    ConnectorType,
    BatteryConnector,
    PeakVoltageV,
    VoltageMinV,
    VoltageMaxV,
    CellCount,
    CellCountMax,
    CellCountMin,
    VideoSystem,
    DigitalSystem,
    MinEscCurrentA,
    ContinuousCurrentPerMotorA,
    WheelbaseMm,
}

impl CompatField {
    pub fn key(&self) -> &'static str {
        match self {
            CompatField::PropSizeMaxIn => "prop_size_max_in",
            CompatField::DiameterIn => "diameter_in",
            CompatField::FcMountingPatternsMm => "fc_mounting_patterns_mm",
            CompatField::MountingPatternMm => "mounting_pattern_mm",
            CompatField::MotorMountHoleSpacingMm => "motor_mount_hole_spacing_mm",
            CompatField::FcMountHoleSize => "fc_mount_hole_size",
            CompatField::MountHoleSize => "mount_hole_size",
            CompatField::MotorMountBoltSize => "motor_mount_bolt_size",
            CompatField::ConnectorType => "connector_type",
            CompatField::BatteryConnector => "battery_connector",
            CompatField::PeakVoltageV => "peak_voltage_v",
            CompatField::VoltageMinV => "voltage_min_v",
            CompatField::VoltageMaxV => "voltage_max_v",
            CompatField::CellCount => "cell_count",
            CompatField::CellCountMax => "cell_count_max",
            CompatField::CellCountMin => "cell_count_min",
            CompatField::VideoSystem => "video_system",
            CompatField::DigitalSystem => "digital_system",
            CompatField::MinEscCurrentA => "min_esc_current_a",
            CompatField::ContinuousCurrentPerMotorA => "continuous_current_per_motor_a",
            CompatField::WheelbaseMm => "wheelbase_mm",
        }
    }
}

/// The parsed `compatibility` block of a component.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Compatibility {
    values: BTreeMap<String, CompatValue>,
    severities: SeverityMap,
}

impl Compatibility {
    pub fn from_map(map: &Map<String, Value>) -> Self {
        let hard = string_list(map.get("_compat_hard"));
        let soft = string_list(map.get("_compat_soft"));

        let values = map
            .iter()
            .filter(|(key, _)| !key.starts_with('_'))
            .filter_map(|(key, value)| CompatValue::from_json(value).map(|v| (key.clone(), v)))
            .collect();

        Self {
            values,
            severities: SeverityMap::from_lists(&hard, &soft),
        }
    }

    pub fn get(&self, key: &str) -> Option<&CompatValue> {
        self.values.get(key)
    }

    pub fn values(&self) -> &BTreeMap<String, CompatValue> {
        &self.values
    }

    pub fn severities(&self) -> &SeverityMap {
        &self.severities
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(|s| s.trim().to_string()))
            .collect(),
        Some(Value::String(s)) => s
            .split(',')
            .map(|part| part.trim().to_string())
            .filter(|part| !part.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

// =============================================================================
// ATTRIBUTES
// =============================================================================

/// The open attribute bag (`schema_data`) of a component.
///
/// Serializes back to exactly the raw mapping it was built from.
#[derive(Debug, Clone, Default)]
pub struct Attributes {
    raw: Map<String, Value>,
    weight_g: Option<f64>,
    specs: BTreeMap<String, CompatValue>,
    compatibility: Compatibility,
    fc: Option<Box<Attributes>>,
    esc: Option<Box<Attributes>>,
}

impl Attributes {
    pub fn from_map(raw: Map<String, Value>) -> Self {
        let weight_g = raw
            .get("weight_g")
            .and_then(Scalar::from_json)
            .and_then(|s| s.as_number());

        let compatibility = match raw.get("compatibility") {
            Some(Value::Object(map)) => Compatibility::from_map(map),
            _ => Compatibility::default(),
        };

        let specs = raw
            .iter()
            .filter(|(key, _)| key.as_str() != "compatibility" && !key.starts_with('_'))
            .filter_map(|(key, value)| CompatValue::from_json(value).map(|v| (key.clone(), v)))
            .collect();

        let nested = |key: &str| match raw.get(key) {
            Some(Value::Object(map)) => Some(Box::new(Attributes::from_map(map.clone()))),
            _ => None,
        };
        let fc = nested("fc");
        let esc = nested("esc");

        Self {
            raw,
            weight_g,
            specs,
            compatibility,
            fc,
            esc,
        }
    }

    /// Build from any JSON value; non-objects give an empty bag.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::from_map(map),
            _ => Self::default(),
        }
    }

    pub fn raw(&self) -> &Map<String, Value> {
        &self.raw
    }

    /// Look up a raw value by dotted path (`"compatibility.prop_size_max_in"`).
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let mut current = self.raw.get(parts.next()?)?;
        for part in parts {
            current = current.as_object()?.get(part)?;
        }
        Some(current)
    }

    pub fn weight_g(&self) -> Option<f64> {
        self.weight_g
    }

    pub fn compatibility(&self) -> &Compatibility {
        &self.compatibility
    }

    /// Rule field lookup: the `compatibility` block first, then top level.
    pub fn field(&self, field: CompatField) -> Option<&CompatValue> {
        let key = field.key();
        self.compatibility.get(key).or_else(|| self.specs.get(key))
    }

    /// Positive numeric reading of a field; zero, negative and unparseable read as absent.
    pub fn positive(&self, field: CompatField) -> Option<f64> {
        self.field(field)
            .and_then(CompatValue::number)
            .filter(|n| *n > 0.0)
    }

    /// Single designator value of a field.
    pub fn designator(&self, field: CompatField) -> Option<&Scalar> {
        self.field(field)
            .and_then(CompatValue::text)
            .filter(|s| !s.normalized().is_empty())
    }

    pub fn severities(&self) -> &SeverityMap {
        self.compatibility.severities()
    }

    /// Nested flight-controller attributes (stacks).
    pub fn fc(&self) -> Option<&Attributes> {
        self.fc.as_deref()
    }

    /// Nested ESC attributes (stacks).
    pub fn esc(&self) -> Option<&Attributes> {
        self.esc.as_deref()
    }

    /// Tags as lowercase strings, from a list or a comma-separated string.
    pub fn tags(&self) -> Vec<String> {
        string_list(self.raw.get("tags"))
            .into_iter()
            .map(|t| t.to_lowercase())
            .filter(|t| !t.is_empty())
            .collect()
    }
}

impl From<Map<String, Value>> for Attributes {
    fn from(raw: Map<String, Value>) -> Self {
        Attributes::from_map(raw)
    }
}

impl Serialize for Attributes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Attributes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Object(map) => Ok(Attributes::from_map(map)),
            Value::Null => Ok(Attributes::default()),
            other => Err(serde::de::Error::custom(format!(
                "schema_data must be an object, got {}",
                other
            ))),
        }
    }
}

// =============================================================================
// COMPONENT
// =============================================================================

/// A catalog part.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Component {
    /// Stable identifier, e.g. "FC-0001"
    #[serde(alias = "id")]
    pub pid: String,
    pub category: Slot,
    pub name: String,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub manufacturer: String,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub description: String,
    /// Free-text currency string, e.g. "$54.99"
    #[serde(default, deserialize_with = "price_text")]
    pub approx_price: Option<String>,
    #[serde(default)]
    pub image_file: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub manual_link: Option<String>,
    #[serde(default, rename = "schema_data")]
    pub attributes: Attributes,
}

impl Component {
    pub fn weight_g(&self) -> Option<f64> {
        self.attributes.weight_g()
    }

    /// Numeric price parsed from `approx_price`.
    pub fn price(&self) -> Option<f64> {
        self.approx_price.as_deref().and_then(parse_price)
    }
}

fn string_or_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn price_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        Value::Number(n) => n.as_f64().map(format_price),
        _ => None,
    })
}

/// Render a numeric price as `$x.xx`.
pub fn format_price(amount: f64) -> String {
    format!("${:.2}", amount)
}
