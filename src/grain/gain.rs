//! Linear ↔ decibel conversions used by panning and track amplitude.

/// Convert a linear multiplier to decibels: `20 log10(m)`.
///
/// Zero, negative and NaN multipliers have no decibel value and map to
/// negative infinity, which [`db_to_gain`] turns back into silence.
pub fn multiplier_to_db(multiplier: f64) -> f64 {
    if multiplier > 0.0 {
        20.0 * multiplier.log10()
    } else {
        f64::NEG_INFINITY
    }
}

/// Convert decibels to a linear multiplier: `10^(db / 20)`.
pub fn db_to_gain(db: f64) -> f64 {
    if db == f64::NEG_INFINITY || db.is_nan() {
        0.0
    } else {
        10f64.powf(db / 20.0)
    }
}

/// Scale interleaved samples by a decibel offset.
pub fn apply_db(samples: &mut [f32], db: f64) {
    let gain = db_to_gain(db) as f32;
    if gain == 1.0 {
        return;
    }
    for s in samples {
        *s *= gain;
    }
}
