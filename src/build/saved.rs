use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::state::BuildState;

/// A named build as stored by the backend (`/api/drone-models/`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedBuild {
    pub pid: String,
    pub name: String,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_class: Option<String>,
    /// Category slug -> component pid
    #[serde(default, deserialize_with = "relation_map")]
    pub relations: BTreeMap<String, String>,
}

impl SavedBuild {
    /// Snapshot a build under a fresh id.
    pub fn from_build(name: &str, description: &str, build: &BuildState) -> Self {
        Self {
            pid: generate_build_pid(),
            name: name.trim().to_string(),
            description: description.trim().to_string(),
            image_file: None,
            pdf_file: None,
            vehicle_type: None,
            build_class: None,
            relations: build
                .serialize()
                .into_iter()
                .map(|(slot, pid)| (slot.slug().to_string(), pid))
                .collect(),
        }
    }
}

/// `BUILD-` followed by the current Unix time in milliseconds, base 36, upper case.
pub fn generate_build_pid() -> String {
    let millis = Utc::now().timestamp_millis().max(0) as u64;
    format!("BUILD-{}", to_base36(millis))
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// Slot map from a build file: either a bare `{slug: pid}` object or a saved
/// build record carrying `relations`. Null and empty ids are ignored.
pub fn relations_from_json(mut value: Value) -> serde_json::Result<BTreeMap<String, String>> {
    if let Some(relations) = value.get_mut("relations") {
        value = relations.take();
    }
    relation_map(value)
}

fn string_or_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Relations keep only string (or numeric) ids; empty and null entries are ignored.
fn relation_map<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BTreeMap<String, String>, D::Error> {
    let raw = Option::<BTreeMap<String, Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .filter_map(|(slug, value)| match value {
            Value::String(pid) if !pid.trim().is_empty() => Some((slug, pid)),
            Value::Number(n) => Some((slug, n.to_string())),
            _ => None,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_to_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "Z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(1_700_000_000_000), "LOYW3V28");
    }

    #[test]
    fn test_generate_build_pid_format() {
        let pid = generate_build_pid();
        assert!(pid.starts_with("BUILD-"));
        assert!(pid[6..].chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn test_saved_build_tolerates_backend_nulls() {
        let saved: SavedBuild = serde_json::from_value(json!({
            "pid": "BUILD-1",
            "name": "Freestyle 5",
            "description": null,
            "relations": { "frames": "FRM-1", "motors": null, "batteries": "" }
        }))
        .unwrap();

        assert_eq!(saved.description, "");
        assert_eq!(saved.relations.len(), 1);
        assert_eq!(saved.relations["frames"], "FRM-1");
    }

    #[test]
    fn test_relations_from_record_or_bare_map() {
        let record = json!({
            "pid": "BUILD-1",
            "name": "Whoop",
            "relations": { "frames": "FRM-1", "escs": null, "motors": "" }
        });
        let relations = relations_from_json(record).unwrap();
        assert_eq!(relations, BTreeMap::from([("frames".to_string(), "FRM-1".to_string())]));

        let bare = json!({ "frames": "FRM-1", "batteries": 42, "props": null });
        let relations = relations_from_json(bare).unwrap();
        assert_eq!(relations.len(), 2);
        assert_eq!(relations["batteries"], "42");

        assert!(relations_from_json(json!(["FRM-1"])).is_err());
    }
}
