//! Route label and key derivation from free-text OSM-style tags.
//!
//! Route relations carry their identity in `name`, `ref` and `operator`
//! with little consistency. The matching core only ever sees the derived
//! `(label, key)` pair; everything heuristic lives here.

use geojson::JsonObject;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

use crate::identifiers::{RouteKey, RouteLabel};

pub const UNKNOWN_LABEL: &str = "Desconocida";
pub const UNKNOWN_KEY: &str = "SIN_IDENTIFICADOR";

static RAMAL_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bRamal\b").expect("ramal pattern is valid"));
static REPEATED_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("whitespace pattern is valid"));
static LINEA_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*L[ií]nea\s+").expect("prefix pattern is valid"));
static REF_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]+)\s*([A-ZÁÉÍÓÚÑ0-9]+)?$").expect("ref pattern is valid")
});

/// Signature of a label/key derivation, so callers can plug their own.
pub type DeriveFn = fn(&JsonObject) -> (RouteLabel, RouteKey);

/// Derive both the display label and the identity key.
pub fn derive(properties: &JsonObject) -> (RouteLabel, RouteKey) {
    (route_label(properties), route_key(properties))
}

/// Display label: cleaned `name`, else normalized `ref`, else `operator`.
pub fn route_label(properties: &JsonObject) -> RouteLabel {
    let name = tag(properties, "name");
    if !name.is_empty() {
        let base = name.split(':').next().unwrap_or_default().trim();
        return RouteLabel::new(clean_name(base));
    }

    let reference = tag(properties, "ref");
    if !reference.is_empty() {
        return RouteLabel::new(normalize_ref(&reference));
    }

    let operator = tag(properties, "operator");
    if !operator.is_empty() {
        return RouteLabel::new(operator);
    }

    RouteLabel::new(UNKNOWN_LABEL)
}

/// Identity key: upper-cased `ref`, else `name`, else `operator`.
pub fn route_key(properties: &JsonObject) -> RouteKey {
    let reference = tag(properties, "ref").to_uppercase();
    if !reference.is_empty() {
        return RouteKey::new(reference);
    }

    ["name", "operator"]
        .iter()
        .map(|k| tag(properties, k))
        .find(|v| !v.is_empty())
        .map(|v| RouteKey::new(v))
        .unwrap_or_else(|| RouteKey::new(UNKNOWN_KEY))
}

/// "Línea 214 Ramal B" -> "214 B"
fn clean_name(name: &str) -> String {
    let without_ramal = RAMAL_WORD.replace_all(name, "");
    let collapsed = REPEATED_SPACE.replace_all(&without_ramal, " ");
    let trimmed = collapsed.trim();
    LINEA_PREFIX.replace(trimmed, "").trim().to_string()
}

/// "214b" -> "214 B", "273" -> "273", anything else upper-cased
fn normalize_ref(reference: &str) -> String {
    let upper = reference.to_uppercase();
    match REF_CODE.captures(&upper) {
        Some(caps) => match caps.get(2) {
            Some(suffix) => format!("{} {}", &caps[1], suffix.as_str()),
            None => caps[1].to_string(),
        },
        None => upper,
    }
}

/// Trimmed string form of a tag; missing, null and empty values yield "".
fn tag(properties: &JsonObject, key: &str) -> String {
    match properties.get(key) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(true)) => "true".to_string(),
        _ => String::new(),
    }
}
