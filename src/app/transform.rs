use eframe::egui::{Pos2, Vec2};

pub(in crate::app) const MIN_ZOOM: f32 = 0.3;
pub(in crate::app) const MAX_ZOOM: f32 = 3.0;

/// Pan offset + zoom scale mapping simulation coordinates to screen
/// coordinates: `screen = sim * scale + offset`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) struct ViewTransform {
    pub offset: Vec2,
    pub scale: f32,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            scale: 1.0,
        }
    }
}

impl ViewTransform {
    pub fn to_screen(&self, sim: Vec2) -> Pos2 {
        (sim * self.scale + self.offset).to_pos2()
    }

    pub fn to_sim(&self, screen: Pos2) -> Vec2 {
        (screen.to_vec2() - self.offset) / self.scale
    }

    /// Multiplies the scale by `factor` (clamped to the allowed range)
    /// while keeping the simulation point under `anchor` fixed on
    /// screen.
    pub fn zoom_around(&mut self, factor: f32, anchor: Pos2) {
        let new_scale = (self.scale * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        let applied = new_scale / self.scale;
        self.offset = anchor.to_vec2() - (anchor.to_vec2() - self.offset) * applied;
        self.scale = new_scale;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eframe::egui::{pos2, vec2};

    fn assert_close(a: f32, b: f32) {
        assert!((a - b).abs() < 1e-3, "{a} != {b}");
    }

    #[test]
    fn screen_sim_round_trip_is_identity() {
        let transform = ViewTransform {
            offset: vec2(130.0, -42.5),
            scale: 1.7,
        };

        for screen in [pos2(0.0, 0.0), pos2(512.3, 260.1), pos2(-40.0, 999.0)] {
            let back = transform.to_screen(transform.to_sim(screen));
            assert_close(back.x, screen.x);
            assert_close(back.y, screen.y);
        }
    }

    #[test]
    fn zoom_and_inverse_zoom_restore_the_transform() {
        for factor in [1.1, 1.5, 0.8] {
            let mut transform = ViewTransform {
                offset: vec2(25.0, 60.0),
                scale: 1.0,
            };
            let anchor = pos2(320.0, 180.0);

            transform.zoom_around(factor, anchor);
            transform.zoom_around(1.0 / factor, anchor);

            assert_close(transform.scale, 1.0);
            assert_close(transform.offset.x, 25.0);
            assert_close(transform.offset.y, 60.0);
        }
    }

    #[test]
    fn zoom_keeps_the_anchor_point_fixed() {
        let mut transform = ViewTransform {
            offset: vec2(-12.0, 8.0),
            scale: 0.9,
        };
        let anchor = pos2(200.0, 150.0);
        let sim_before = transform.to_sim(anchor);

        transform.zoom_around(1.1, anchor);
        let sim_after = transform.to_sim(anchor);

        assert_close(sim_before.x, sim_after.x);
        assert_close(sim_before.y, sim_after.y);
    }

    #[test]
    fn zoom_scale_is_clamped() {
        let mut transform = ViewTransform::default();
        for _ in 0..40 {
            transform.zoom_around(1.5, pos2(0.0, 0.0));
        }
        assert_close(transform.scale, MAX_ZOOM);

        for _ in 0..80 {
            transform.zoom_around(0.5, pos2(0.0, 0.0));
        }
        assert_close(transform.scale, MIN_ZOOM);
    }
}
