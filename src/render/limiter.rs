//! Output limiter: hard clamp applied to the final mix before export.

use super::buffer::AudioBuffer;

/// Hard limiter that clamps samples to `[-ceiling, ceiling]`.
#[derive(Debug, Clone)]
pub struct Limiter {
    ceiling: f32,
}

impl Limiter {
    /// Create a limiter. Ceilings outside `(0.0, 1.0]` are clamped into it.
    pub fn new(ceiling: f32) -> Self {
        let ceiling = if ceiling.is_finite() && ceiling > 0.0 {
            ceiling.min(1.0)
        } else {
            1.0
        };
        Self { ceiling }
    }

    /// Clamp a single sample to `[-ceiling, ceiling]`.
    #[inline]
    pub fn process(&self, sample: f32) -> f32 {
        sample.clamp(-self.ceiling, self.ceiling)
    }

    /// Clamp a whole buffer in place, returning how many samples were clipped.
    pub fn process_buffer(&self, buffer: &mut AudioBuffer) -> usize {
        let mut clipped = 0;
        for sample in buffer.samples_mut() {
            if sample.abs() > self.ceiling {
                clipped += 1;
            }
            *sample = self.process(*sample);
        }
        clipped
    }

    pub fn ceiling(&self) -> f32 {
        self.ceiling
    }
}

impl Default for Limiter {
    fn default() -> Self {
        Self { ceiling: 1.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_within_range() {
        let limiter = Limiter::new(0.95);
        assert_eq!(limiter.process(0.0), 0.0);
        assert_eq!(limiter.process(0.5), 0.5);
        assert_eq!(limiter.process(-0.95), -0.95);
    }

    #[test]
    fn clamps_both_signs() {
        let limiter = Limiter::new(0.95);
        assert_eq!(limiter.process(2.5), 0.95);
        assert_eq!(limiter.process(f32::MIN), -0.95);
    }

    #[test]
    fn process_buffer_counts_clipped_samples() {
        let limiter = Limiter::default();
        let mut buf = AudioBuffer::from_interleaved(vec![0.5, 1.5, -2.0, -0.2], 10);
        assert_eq!(limiter.process_buffer(&mut buf), 2);
        assert_eq!(buf.samples(), &[0.5, 1.0, -1.0, -0.2]);
    }

    #[test]
    fn invalid_ceiling_falls_back() {
        assert_eq!(Limiter::new(0.0).ceiling(), 1.0);
        assert_eq!(Limiter::new(f32::NAN).ceiling(), 1.0);
        assert_eq!(Limiter::new(3.0).ceiling(), 1.0);
    }
}
