//! Formatting of proximity messages and merging them into existing text.

use hashbrown::HashSet;
use regex::Regex;
use std::sync::LazyLock;

use crate::config::ProximityConfig;
use crate::models::ProximityMatch;

static ROUTE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]{2,4}").expect("route number pattern is valid"));

/// How a new message was combined with the facility's previous text
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MergeAction {
    /// There was no previous text
    Set,
    /// Previous text mentioned one of the same route numbers and was replaced
    Replaced,
    /// Previous text was unrelated and kept, with the message appended
    Appended,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MergedAnnotation {
    pub text: String,
    pub action: MergeAction,
}

/// "Near" message: labels in the order they were first seen.
pub fn format_near(matches: &[ProximityMatch], config: &ProximityConfig) -> String {
    let labels: Vec<&str> = matches.iter().map(|m| m.label.as_str()).collect();
    format!(
        "Colectivos cerca (≤ {} m): {}",
        config.near_radius_m,
        labels.join("; ")
    )
}

/// "Walkable" message: each label with its distance in blocks.
pub fn format_walkable(matches: &[ProximityMatch], config: &ProximityConfig) -> String {
    let items: Vec<String> = matches
        .iter()
        .map(|m| {
            format!(
                "{} (a ~{} cuadras)",
                m.label,
                blocks(m.distance_m, config.block_length_m)
            )
        })
        .collect();
    format!(
        "Colectivos a distancia caminable (≤ {} m): {}",
        config.far_radius_m,
        items.join("; ")
    )
}

/// Distance expressed in whole blocks, rounded to nearest.
pub fn blocks(distance_m: f64, block_length_m: f64) -> i64 {
    (distance_m / block_length_m).round() as i64
}

/// All runs of 2 to 4 ASCII digits in `text`. Longer digit runs are cut
/// into consecutive chunks, so "12345" yields only "1234".
pub fn route_numbers(text: &str) -> HashSet<&str> {
    ROUTE_NUMBER.find_iter(text).map(|m| m.as_str()).collect()
}

/// Combine a freshly computed message with the facility's previous text.
///
/// Empty or missing previous text is replaced outright. Otherwise, when both
/// texts mention a common route number the previous text is treated as an
/// older version of the same information and replaced; when they share none
/// the previous text is kept and the message appended as a new sentence.
pub fn merge_annotation(previous: Option<&str>, message: &str) -> MergedAnnotation {
    let previous = previous.map(str::trim).unwrap_or_default();

    if previous.is_empty() {
        return MergedAnnotation {
            text: message.to_string(),
            action: MergeAction::Set,
        };
    }

    let new_numbers = route_numbers(message);
    let old_numbers = route_numbers(previous);

    if !new_numbers.is_disjoint(&old_numbers) {
        return MergedAnnotation {
            text: message.to_string(),
            action: MergeAction::Replaced,
        };
    }

    let separator = if previous.ends_with(['.', '!', '?']) {
        " "
    } else {
        ". "
    };

    MergedAnnotation {
        text: format!("{}{}{}", previous, separator, message),
        action: MergeAction::Appended,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifiers::{RouteKey, RouteLabel};

    fn m(label: &str, distance_m: f64) -> ProximityMatch {
        ProximityMatch {
            label: RouteLabel::new(label),
            key: RouteKey::new(label),
            distance_m,
        }
    }

    #[test]
    fn test_format_near() {
        let config = ProximityConfig::default();
        assert_eq!(
            format_near(&[m("73", 150.0)], &config),
            "Colectivos cerca (≤ 300 m): 73"
        );
        assert_eq!(
            format_near(&[m("73", 150.0), m("214 B", 20.0)], &config),
            "Colectivos cerca (≤ 300 m): 73; 214 B"
        );
    }

    #[test]
    fn test_format_walkable() {
        let config = ProximityConfig::default();
        assert_eq!(
            format_walkable(&[m("57", 600.0)], &config),
            "Colectivos a distancia caminable (≤ 1000 m): 57 (a ~6 cuadras)"
        );
        assert_eq!(
            format_walkable(&[m("57", 649.0), m("Norte", 351.0)], &config),
            "Colectivos a distancia caminable (≤ 1000 m): 57 (a ~6 cuadras); Norte (a ~4 cuadras)"
        );
    }

    #[test]
    fn test_format_uses_configured_radii() {
        let config = ProximityConfig {
            near_radius_m: 250.0,
            far_radius_m: 800.5,
            ..Default::default()
        };
        assert_eq!(format_near(&[m("1", 1.0)], &config), "Colectivos cerca (≤ 250 m): 1");
        assert!(format_walkable(&[m("1", 700.0)], &config).starts_with("Colectivos a distancia caminable (≤ 800.5 m)"));
    }

    #[test]
    fn test_blocks_rounding() {
        assert_eq!(blocks(649.9, 100.0), 6);
        assert_eq!(blocks(650.0, 100.0), 7);
        assert_eq!(blocks(301.0, 100.0), 3);
        assert_eq!(blocks(1000.0, 100.0), 10);
    }

    #[test]
    fn test_route_numbers() {
        let numbers = route_numbers("Líneas 73, 214 B y 5; ramal 12345");
        assert!(numbers.contains("73"));
        assert!(numbers.contains("214"));
        assert!(numbers.contains("1234"));
        assert!(!numbers.contains("5"));
        assert!(!numbers.contains("45"));
        assert!(route_numbers("Llegada en auto.").is_empty());
    }

    #[test]
    fn test_merge_into_empty() {
        let merged = merge_annotation(None, "Colectivos cerca (≤ 300 m): 73");
        assert_eq!(merged.action, MergeAction::Set);
        assert_eq!(merged.text, "Colectivos cerca (≤ 300 m): 73");

        let merged = merge_annotation(Some("   "), "nuevo");
        assert_eq!(merged.action, MergeAction::Set);
        assert_eq!(merged.text, "nuevo");
    }

    #[test]
    fn test_merge_appends_unrelated_text() {
        let merged = merge_annotation(Some("Llegada en auto."), "Colectivos cerca (≤ 300 m): 12");
        assert_eq!(merged.action, MergeAction::Appended);
        assert_eq!(merged.text, "Llegada en auto. Colectivos cerca (≤ 300 m): 12");
    }

    #[test]
    fn test_merge_inserts_period() {
        let merged = merge_annotation(Some("Llegada en auto  "), "Colectivos cerca (≤ 300 m): 12");
        assert_eq!(merged.text, "Llegada en auto. Colectivos cerca (≤ 300 m): 12");

        let merged = merge_annotation(Some("¿Hay estacionamiento?"), "Colectivos cerca (≤ 300 m): 12");
        assert_eq!(merged.text, "¿Hay estacionamiento? Colectivos cerca (≤ 300 m): 12");
    }

    #[test]
    fn test_merge_replaces_on_shared_route_number() {
        let merged = merge_annotation(
            Some("Tomar el 73 desde plaza Moreno"),
            "Colectivos cerca (≤ 300 m): 73",
        );
        assert_eq!(merged.action, MergeAction::Replaced);
        assert_eq!(merged.text, "Colectivos cerca (≤ 300 m): 73");
    }

    #[test]
    fn test_merge_replaces_previous_generated_text() {
        // Earlier runs share the radius figure in their header
        let merged = merge_annotation(
            Some("Colectivos cerca (≤ 300 m): 506"),
            "Colectivos cerca (≤ 300 m): 214",
        );
        assert_eq!(merged.action, MergeAction::Replaced);
    }
}
