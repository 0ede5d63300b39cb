/// Context passed to voices and nodes for one render block.
///
/// - sample_rate: audio sample rate (e.g. 48000.0)
/// - time: playback time at the first sample of the block, in seconds
/// - vibrato_cents: pitch offset contributed by the vibrato effector for this
///   block; voices fold it into their detune at block rate
#[derive(Debug, Clone, Copy)]
pub struct RenderCtx {
    pub sample_rate: f32,
    pub time: f64,
    pub vibrato_cents: f32,
}

impl RenderCtx {
    pub fn new(sample_rate: f32, time: f64) -> Self {
        Self {
            sample_rate,
            time,
            vibrato_cents: 0.0,
        }
    }

    pub fn with_vibrato(mut self, cents: f32) -> Self {
        self.vibrato_cents = cents;
        self
    }
}
