//! Fixed-length stereo render buffer.

/// Interleaved stereo f32 audio whose length is fixed at creation.
///
/// Overlaying never grows the buffer; material past the end is dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl AudioBuffer {
    /// Frames in `duration_ms` at `sample_rate`, truncated.
    pub fn frames_for(duration_ms: u64, sample_rate: u32) -> usize {
        (duration_ms * sample_rate as u64 / 1000) as usize
    }

    /// A silent buffer `duration_ms` long.
    pub fn silent(duration_ms: u64, sample_rate: u32) -> Self {
        Self {
            samples: vec![0.0; Self::frames_for(duration_ms, sample_rate) * 2],
            sample_rate,
        }
    }

    /// Wrap existing interleaved stereo samples. A trailing half frame is dropped.
    pub fn from_interleaved(mut samples: Vec<f32>, sample_rate: u32) -> Self {
        samples.truncate(samples.len() & !1);
        Self {
            samples,
            sample_rate,
        }
    }

    /// Add interleaved stereo `samples` starting at `frame_offset`, clipped at the end.
    pub fn overlay(&mut self, samples: &[f32], frame_offset: usize) {
        let start = frame_offset.saturating_mul(2);
        if start >= self.samples.len() {
            return;
        }
        for (dst, src) in self.samples[start..].iter_mut().zip(samples) {
            *dst += *src;
        }
    }

    /// Add another buffer sample by sample. Lengths may differ; the shorter wins.
    pub fn mix(&mut self, other: &AudioBuffer) {
        self.overlay(&other.samples, 0);
    }

    /// Multiply every sample by a linear gain.
    pub fn apply_gain(&mut self, gain: f32) {
        for s in &mut self.samples {
            *s *= gain;
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn samples_mut(&mut self) -> &mut [f32] {
        &mut self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn frames(&self) -> usize {
        self.samples.len() / 2
    }

    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        self.frames() as u64 * 1000 / self.sample_rate as u64
    }

    /// Largest absolute sample value.
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0, |m, s| m.max(s.abs()))
    }
}
