use eframe::egui::Color32;
use palette::{LinSrgb, Mix, Srgb};

// ---------------------------------------------------------------------------
// Sequential colorscales for the choropleth
// ---------------------------------------------------------------------------

/// A two-anchor sequential colorscale: light at 0, saturated at 1.
/// Interpolation happens in linear RGB so the midtones don't wash out.
#[derive(Debug, Clone, Copy)]
pub struct ColorScale {
    low: LinSrgb,
    high: LinSrgb,
}

impl ColorScale {
    /// Blues, for case counts.
    pub fn blues() -> Self {
        ColorScale {
            low: Srgb::new(0.87, 0.92, 0.97).into_linear(),
            high: Srgb::new(8.0 / 255.0, 48.0 / 255.0, 107.0 / 255.0).into_linear(),
        }
    }

    /// Reds, for death counts.
    pub fn reds() -> Self {
        ColorScale {
            low: Srgb::new(0.99, 0.90, 0.85).into_linear(),
            high: Srgb::new(103.0 / 255.0, 0.0, 13.0 / 255.0).into_linear(),
        }
    }

    /// Map a normalized value in `[0, 1]` to a fill color. Out-of-range
    /// values clamp.
    pub fn color_for(&self, t: f64) -> Color32 {
        let t = t.clamp(0.0, 1.0) as f32;
        to_color32(self.low.mix(self.high, t))
    }

    /// The saturated anchor, used for line series and polygon outlines.
    pub fn line_color(&self) -> Color32 {
        to_color32(self.high)
    }
}

/// Fill for regions with boundary geometry but no data row.
pub fn missing_data_color() -> Color32 {
    Color32::from_gray(200)
}

fn to_color32(linear: LinSrgb) -> Color32 {
    let rgb: Srgb = Srgb::from_linear(linear);
    Color32::from_rgb(
        (rgb.red * 255.0) as u8,
        (rgb.green * 255.0) as u8,
        (rgb.blue * 255.0) as u8,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Color32, b: Color32) -> bool {
        a.r().abs_diff(b.r()) <= 1 && a.g().abs_diff(b.g()) <= 1 && a.b().abs_diff(b.b()) <= 1
    }

    #[test]
    fn scale_endpoints_hit_the_anchors() {
        let scale = ColorScale::blues();
        assert!(close(scale.color_for(0.0), Color32::from_rgb(222, 235, 247)));
        assert!(close(scale.color_for(1.0), Color32::from_rgb(8, 48, 107)));
        assert!(close(scale.color_for(1.0), scale.line_color()));
    }

    #[test]
    fn out_of_range_values_clamp() {
        let scale = ColorScale::reds();
        assert_eq!(scale.color_for(-1.0), scale.color_for(0.0));
        assert_eq!(scale.color_for(2.0), scale.color_for(1.0));
    }
}
