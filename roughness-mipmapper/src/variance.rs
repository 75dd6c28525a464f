//! Conversion between roughness and normal-dispersion variance
//!
//! The curve is piecewise: linear between the control points below, and a
//! quartic tail under the last one. The tail is scaled to meet the linear
//! segment so that both directions stay continuous and strictly increasing.
//!
//! | roughness | variance |
//! |-----------|----------|
//! | 1.0       | 0.339    |
//! | 0.8       | 0.276    |
//! | 0.4       | 0.046    |
//! | 0.305     | 0.016    |

const R0: f32 = 1.0;
const V0: f32 = 0.339;
const R1: f32 = 0.8;
const V1: f32 = 0.276;
const R4: f32 = 0.4;
const V4: f32 = 0.046;
const R5: f32 = 0.305;
const V5: f32 = 0.016;

/// Map a roughness value to its equivalent variance
///
/// Input is clamped to [0, 1]. The result is non-negative and strictly
/// increasing in roughness.
pub fn roughness_to_variance(roughness: f32) -> f32 {
    let roughness = roughness.clamp(0.0, 1.0);
    if roughness >= R1 {
        (R0 - roughness) * (V1 - V0) / (R0 - R1) + V0
    } else if roughness >= R4 {
        (R1 - roughness) * (V4 - V1) / (R1 - R4) + V1
    } else if roughness >= R5 {
        (R4 - roughness) * (V5 - V4) / (R4 - R5) + V4
    } else {
        let t = roughness / R5;
        let t2 = t * t;
        V5 * t2 * t2
    }
}

/// Map a variance value back to roughness, clamped to [0, 1]
///
/// Accepts any input: negative variance yields 0 and variance past the top
/// control point saturates at 1.
pub fn variance_to_roughness(variance: f32) -> f32 {
    let roughness = if variance >= V1 {
        (V0 - variance) * (R1 - R0) / (V0 - V1) + R0
    } else if variance >= V4 {
        (V1 - variance) * (R4 - R1) / (V1 - V4) + R1
    } else if variance >= V5 {
        (V4 - variance) * (R5 - R4) / (V4 - V5) + R4
    } else if variance > 0.0 {
        R5 * (variance / V5).powf(0.25)
    } else {
        0.0
    };
    // NaN input falls through every comparison above; keep it out of the texture
    if roughness.is_nan() {
        return 0.0;
    }
    roughness.clamp(0.0, 1.0)
}

/// Add a dispersion term to a roughness value in variance space
pub fn add_variance(roughness: f32, dispersion: f32) -> f32 {
    variance_to_roughness(roughness_to_variance(roughness) + dispersion)
}
