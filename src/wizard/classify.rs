//! Frame size-class inference.
//!
//! Order of evidence: the frame's max prop size, then its wheelbase, then
//! size tokens and keywords in the product name.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::catalog::{CompatField, Component};

use super::types::SizeClass;

static INCH_SIZE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?:^|[^\d.])(\d+(?:\.\d+)?)\s*(?:"|''|-?\s*inch\b|in\b)"#).expect("valid regex")
});

static MM_SIZE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{2,3})\s*mm\b").expect("valid regex"));

/// Keyword groups, most specific first ("cinewhoop" before "whoop", "cinelifter" before "cine").
static KEYWORDS: Lazy<Vec<(Regex, SizeClass)>> = Lazy::new(|| {
    [
        (r"x-?class|cinelifter|heavy\s*lift|\bheavy\b", SizeClass::Heavy),
        (r"cinewhoop|toothpick", SizeClass::ThreeInch),
        (r"whoop|\btiny\b|\bmicro\b|\b1s\b", SizeClass::Micro),
        (r"freestyle|racing|racer|nazgul", SizeClass::FiveInch),
        (r"long\s*-?\s*range|\blr\b|\bcine\b|cinematic", SizeClass::SevenInch),
    ]
    .into_iter()
    .map(|(pattern, class)| (Regex::new(pattern).expect("valid regex"), class))
    .collect()
});

/// Infer a frame's size class.
pub fn infer_frame_class(frame: &Component) -> SizeClass {
    if let Some(prop_max) = frame.attributes.positive(CompatField::PropSizeMaxIn) {
        return SizeClass::from_prop_size(prop_max);
    }

    if let Some(wheelbase) = frame.attributes.positive(CompatField::WheelbaseMm) {
        return SizeClass::from_wheelbase(wheelbase);
    }

    classify_name(&frame.name)
}

/// Infer a size class from a product name alone.
pub fn classify_name(name: &str) -> SizeClass {
    let name = name.to_lowercase();

    if let Some(inches) = capture_number(&INCH_SIZE, &name) {
        return SizeClass::from_prop_size(inches);
    }

    if let Some(mm) = capture_number(&MM_SIZE, &name) {
        return SizeClass::from_wheelbase(mm);
    }

    KEYWORDS
        .iter()
        .find(|(pattern, _)| pattern.is_match(&name))
        .map(|(_, class)| *class)
        .unwrap_or(SizeClass::Unknown)
}

fn capture_number(pattern: &Regex, text: &str) -> Option<f64> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|n| *n > 0.0)
}
