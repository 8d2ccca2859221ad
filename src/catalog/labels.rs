//! Display labels for category slugs and attribute keys.

const ACRONYMS: &[(&str, &str)] = &[
    ("fpv", "FPV"),
    ("aio", "AIO"),
    ("fc", "FC"),
    ("esc", "ESC"),
    ("pdb", "PDB"),
    ("vtx", "VTX"),
    ("dji", "DJI"),
    ("kv", "KV"),
    ("rx", "RX"),
    ("tx", "TX"),
    ("hd", "HD"),
    ("pid", "PID"),
    ("osd", "OSD"),
    ("led", "LED"),
    ("usb", "USB"),
    ("mcu", "MCU"),
    ("imu", "IMU"),
    ("bec", "BEC"),
    ("gps", "GPS"),
    ("lipo", "LiPo"),
    ("lihv", "LiHV"),
    ("mah", "mAh"),
    ("g", "g"),
    ("mm", "mm"),
    ("pcb", "PCB"),
    ("cmos", "CMOS"),
    ("tvl", "TVL"),
    ("wdr", "WDR"),
    ("cvbs", "CVBS"),
    ("mipi", "MIPI"),
    ("hdmi", "HDMI"),
    ("pc", "PC"),
    ("tpu", "TPU"),
    ("rf", "RF"),
];

fn acronym(lower: &str) -> Option<&'static str> {
    ACRONYMS
        .iter()
        .find(|(key, _)| *key == lower)
        .map(|(_, label)| *label)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn format_word(word: &str) -> String {
    let lower = word.to_lowercase();
    if let Some(label) = acronym(&lower) {
        return label.to_string();
    }
    if let Some(stem) = lower.strip_suffix('s') {
        if let Some(label) = acronym(stem) {
            return format!("{}s", label);
        }
    }
    if word.contains('-') {
        return word
            .split('-')
            .map(|part| {
                acronym(&part.to_lowercase())
                    .map(str::to_string)
                    .unwrap_or_else(|| capitalize(part))
            })
            .collect::<Vec<_>>()
            .join("-");
    }
    capitalize(word)
}

/// Turn a snake_case key into a title, keeping drone acronyms intact.
///
/// `"flight_controllers"` -> `"Flight Controllers"`, `"escs"` -> `"ESCs"`,
/// `"fpv_cameras"` -> `"FPV Cameras"`.
pub fn format_title(text: &str) -> String {
    text.replace('_', " ")
        .split(' ')
        .map(format_word)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_title_category_slugs() {
        assert_eq!(format_title("flight_controllers"), "Flight Controllers");
        assert_eq!(format_title("escs"), "ESCs");
        assert_eq!(format_title("fpv_cameras"), "FPV Cameras");
        assert_eq!(format_title("video_transmitters"), "Video Transmitters");
    }

    #[test]
    fn test_format_title_units_and_hyphens() {
        assert_eq!(format_title("capacity_mah"), "Capacity mAh");
        assert_eq!(format_title("weight_g"), "Weight g");
        assert_eq!(format_title("lipo-hv"), "LiPo-Hv");
        assert_eq!(format_title(""), "");
    }
}
