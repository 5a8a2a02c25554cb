use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Character budget for node labels drawn on the canvas.
pub const LABEL_CHAR_BUDGET: usize = 20;

pub fn truncate_label(label: &str) -> String {
    if label.chars().count() <= LABEL_CHAR_BUDGET {
        label.to_owned()
    } else {
        let head = label.chars().take(LABEL_CHAR_BUDGET).collect::<String>();
        format!("{head}\u{2026}")
    }
}

/// Deterministic pseudo-random pair in [-1, 1] derived from an id, used
/// to jitter seeded node positions without a PRNG dependency.
pub fn stable_jitter(id: &str) -> (f32, f32) {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    let hash = hasher.finish();

    let x = ((hash & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    let y = (((hash >> 32) & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    ((x * 2.0) - 1.0, (y * 2.0) - 1.0)
}
