//! Nearest named color lookup for scene inspection logs.

const COMMON_COLORS: [(&str, [f32; 3]); 20] = [
    ("red", [1.0, 0.0, 0.0]),
    ("green", [0.0, 1.0, 0.0]),
    ("blue", [0.0, 0.0, 1.0]),
    ("yellow", [1.0, 1.0, 0.0]),
    ("cyan", [0.0, 1.0, 1.0]),
    ("magenta", [1.0, 0.0, 1.0]),
    ("black", [0.0, 0.0, 0.0]),
    ("white", [1.0, 1.0, 1.0]),
    ("gray", [0.5, 0.5, 0.5]),
    ("orange", [1.0, 0.5, 0.0]),
    ("purple", [0.5, 0.0, 0.5]),
    ("brown", [0.6, 0.4, 0.2]),
    ("pink", [1.0, 0.75, 0.8]),
    ("lime", [0.75, 1.0, 0.0]),
    ("teal", [0.0, 0.5, 0.5]),
    ("indigo", [0.29, 0.0, 0.51]),
    ("violet", [0.93, 0.51, 0.93]),
    ("turquoise", [0.25, 0.88, 0.82]),
    ("gold", [1.0, 0.84, 0.0]),
    ("silver", [0.75, 0.75, 0.75]),
];

/// Name the common color closest to `rgb` (components in `0.0..=1.0`).
pub fn nearest_common_color(rgb: [f32; 3]) -> &'static str {
    let mut nearest = COMMON_COLORS[0].0;
    let mut min_distance = f32::INFINITY;

    for (name, reference) in COMMON_COLORS {
        let distance = (rgb[0] - reference[0]).powi(2)
            + (rgb[1] - reference[1]).powi(2)
            + (rgb[2] - reference[2]).powi(2);

        if distance < min_distance {
            min_distance = distance;
            nearest = name;
        }
    }

    nearest
}
