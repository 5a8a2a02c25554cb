use std::collections::{HashMap, HashSet};

use eframe::egui::Color32;

use crate::source::{Taxonomy, TaxonomyStyle};

/// Neutral gray used for any type the taxonomy does not know.
pub(in crate::app) const FALLBACK_COLOR: Color32 = Color32::from_rgb(148, 152, 158);

/// Case-folded lookup over the externally edited taxonomy. Lookups
/// never fail: unknown types resolve to [`FALLBACK_COLOR`] and are
/// warned about once per type name. Refresh replaces the contents
/// wholesale; on a failed refresh the caller keeps the previous cache.
pub(in crate::app) struct TaxonomyCache {
    node_styles: HashMap<String, TaxonomyStyle>,
    edge_styles: HashMap<String, TaxonomyStyle>,
    warned_types: HashSet<String>,
}

impl TaxonomyCache {
    pub fn new(taxonomy: &Taxonomy) -> Self {
        Self {
            node_styles: index_styles(&taxonomy.node_styles),
            edge_styles: index_styles(&taxonomy.edge_styles),
            warned_types: HashSet::new(),
        }
    }

    pub fn replace(&mut self, taxonomy: &Taxonomy) {
        self.node_styles = index_styles(&taxonomy.node_styles);
        self.edge_styles = index_styles(&taxonomy.edge_styles);
        self.warned_types.clear();
    }

    pub fn node_style(&self, type_name: &str) -> Option<&TaxonomyStyle> {
        self.node_styles.get(&type_name.to_lowercase())
    }

    /// Like [`Self::node_color`] but without the once-per-type warning;
    /// used for legend swatches where a miss is already visible.
    pub fn node_swatch(&self, type_name: &str) -> Color32 {
        self.node_style(type_name)
            .and_then(|style| parse_hex_color(&style.color))
            .unwrap_or(FALLBACK_COLOR)
    }

    pub fn node_color(&mut self, type_name: &str) -> Color32 {
        let resolved = self
            .node_styles
            .get(&type_name.to_lowercase())
            .and_then(|style| parse_hex_color(&style.color));
        match resolved {
            Some(color) => color,
            None => self.fallback(type_name),
        }
    }

    pub fn edge_color(&mut self, type_name: &str) -> Color32 {
        let resolved = self
            .edge_styles
            .get(&type_name.to_lowercase())
            .and_then(|style| parse_hex_color(&style.color));
        match resolved {
            Some(color) => color,
            None => self.fallback(type_name),
        }
    }

    /// Every node type the taxonomy knows about, sorted by display
    /// name. Drives the type toggle lists in the controls panel.
    pub fn node_type_names(&self) -> Vec<String> {
        sorted_names(&self.node_styles)
    }

    pub fn edge_type_names(&self) -> Vec<String> {
        sorted_names(&self.edge_styles)
    }

    fn fallback(&mut self, type_name: &str) -> Color32 {
        if self.warned_types.insert(type_name.to_lowercase()) {
            log::warn!("no usable taxonomy style for type {type_name:?}, using fallback color");
        }
        FALLBACK_COLOR
    }
}

fn index_styles(styles: &[TaxonomyStyle]) -> HashMap<String, TaxonomyStyle> {
    styles
        .iter()
        .map(|style| (style.name.to_lowercase(), style.clone()))
        .collect()
}

fn sorted_names(styles: &HashMap<String, TaxonomyStyle>) -> Vec<String> {
    let mut names = styles
        .values()
        .map(|style| style.name.clone())
        .collect::<Vec<_>>();
    names.sort();
    names
}

fn parse_hex_color(value: &str) -> Option<Color32> {
    let hex = value.trim().strip_prefix('#').unwrap_or(value.trim());
    // Byte-indexed slicing below; reject multi-byte content outright.
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }

    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Color32::from_rgb(r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn taxonomy() -> Taxonomy {
        Taxonomy {
            node_styles: vec![TaxonomyStyle {
                name: "Organization".to_owned(),
                color: "#3478c0".to_owned(),
                definition: "A company or institution".to_owned(),
                example: "Acme Corp".to_owned(),
            }],
            edge_styles: vec![TaxonomyStyle {
                name: "supports".to_owned(),
                color: "#70b070".to_owned(),
                definition: String::new(),
                example: String::new(),
            }],
        }
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let mut cache = TaxonomyCache::new(&taxonomy());
        let upper = cache.node_color("Organization");
        let lower = cache.node_color("organization");
        let shouting = cache.node_color("ORGANIZATION");

        assert_eq!(upper, Color32::from_rgb(0x34, 0x78, 0xc0));
        assert_eq!(upper, lower);
        assert_eq!(upper, shouting);
    }

    #[test]
    fn unknown_types_fall_back_to_gray() {
        let mut cache = TaxonomyCache::new(&taxonomy());
        assert_eq!(cache.node_color("wormhole"), FALLBACK_COLOR);
        assert_eq!(cache.edge_color("wormhole"), FALLBACK_COLOR);
        assert!(cache.node_style("wormhole").is_none());
    }

    #[test]
    fn malformed_color_values_fall_back_to_gray() {
        let mut broken = taxonomy();
        broken.node_styles[0].color = "bright blue".to_owned();
        let mut cache = TaxonomyCache::new(&broken);
        assert_eq!(cache.node_color("organization"), FALLBACK_COLOR);
    }

    #[test]
    fn non_ascii_color_values_fall_back_to_gray() {
        // Six bytes but not six ASCII digits; must not slice mid-char.
        let mut broken = taxonomy();
        broken.node_styles[0].color = "a\u{e9}\u{e9}a".to_owned();
        let mut cache = TaxonomyCache::new(&broken);
        assert_eq!(cache.node_color("organization"), FALLBACK_COLOR);
    }

    #[test]
    fn replace_swaps_contents_wholesale() {
        let mut cache = TaxonomyCache::new(&taxonomy());
        let mut updated = taxonomy();
        updated.node_styles[0].color = "#ff0000".to_owned();

        cache.replace(&updated);
        assert_eq!(cache.node_color("organization"), Color32::from_rgb(255, 0, 0));
    }

    #[test]
    fn hex_parsing_accepts_only_six_digit_rgb() {
        assert_eq!(parse_hex_color("#0a0B0c"), Some(Color32::from_rgb(10, 11, 12)));
        assert_eq!(parse_hex_color("0a0b0c"), Some(Color32::from_rgb(10, 11, 12)));
        assert_eq!(parse_hex_color("#fff"), None);
        assert_eq!(parse_hex_color("#zzzzzz"), None);
        assert_eq!(parse_hex_color("a\u{e9}\u{e9}a"), None);
        assert_eq!(parse_hex_color(""), None);
    }
}
