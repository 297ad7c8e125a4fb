//! Simple series generators with predictable, verifiable values.

/// `len` samples of the same value.
pub fn constant(value: f32, len: usize) -> Vec<f32> {
    vec![value; len]
}

/// `start, start + step, start + 2·step, …`, `len` samples.
pub fn ramp(start: f32, step: f32, len: usize) -> Vec<f32> {
    (0..len).map(|i| start + i as f32 * step).collect()
}

/// A diurnal-looking wave: `mean + amplitude · sin(2π · i / period)`.
pub fn diurnal(mean: f32, amplitude: f32, period: usize, len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| mean + amplitude * (std::f32::consts::TAU * i as f32 / period as f32).sin())
        .collect()
}
