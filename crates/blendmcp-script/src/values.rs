pub const DEFAULT_COLOR: [f64; 4] = [0.8, 0.8, 0.8, 1.0];

const INVALID_NAME_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

pub fn clamp_value(value: f64, min_val: f64, max_val: f64) -> f64 {
    max_val.min(value.max(min_val))
}

/// Normalizes an RGB or RGBA colour to four channels in `[0, 1]`.
///
/// RGB channels are treated as 0-255 when any of them exceeds 1.0. Alpha
/// is scaled on its own, so `[255, 0, 0, 0.5]` keeps its alpha. Inputs with
/// fewer than three channels fall back to [`DEFAULT_COLOR`].
pub fn normalize_color(color: &[f64]) -> [f64; 4] {
    let [r, g, b] = match color {
        [r, g, b, ..] => [*r, *g, *b],
        _ => return DEFAULT_COLOR,
    };

    let scale = if [r, g, b].iter().any(|channel| *channel > 1.0) {
        255.0
    } else {
        1.0
    };

    let alpha = match color.get(3) {
        Some(a) if *a > 1.0 => *a / 255.0,
        Some(a) => *a,
        None => 1.0,
    };

    [r / scale, g / scale, b / scale, alpha].map(|channel| clamp_value(channel, 0.0, 1.0))
}

pub fn validate_blender_object_name(name: &str) -> bool {
    if name.trim().is_empty() {
        return false;
    }
    !name.contains(INVALID_NAME_CHARS)
}

pub fn degrees_to_radians(degrees: f64) -> f64 {
    degrees.to_radians()
}

pub fn radians_to_degrees(radians: f64) -> f64 {
    radians.to_degrees()
}
