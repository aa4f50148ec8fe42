//! Synthetic demo clips, so a session can render without any files on disk.
//!
//! Noise-based generators use a seeded `ChaCha8Rng` for determinism.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use super::clip::Clip;

/// A decaying sine tone with a touch of second harmonic.
pub fn generate_tone(sample_rate: u32, freq: f64, duration_secs: f64) -> Vec<f32> {
    let num_samples = (sample_rate as f64 * duration_secs) as usize;
    let mut output = Vec::with_capacity(num_samples);

    for i in 0..num_samples {
        let t = i as f64 / sample_rate as f64;
        let norm = t / duration_secs;
        let amp = (-norm * 3.0).exp();
        let phase = t * freq * 2.0 * std::f64::consts::PI;
        let sample = (phase.sin() * 0.8 + (phase * 2.0).sin() * 0.2) * amp;
        output.push(sample as f32);
    }

    output
}

/// Band-limited-ish noise: white noise through a one-pole low-pass, with a swell.
pub fn generate_noise(sample_rate: u32, duration_secs: f64, seed: u64) -> Vec<f32> {
    let num_samples = (sample_rate as f64 * duration_secs) as usize;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut output = Vec::with_capacity(num_samples);
    let mut state = 0.0_f64;
    let alpha = 0.15;

    for i in 0..num_samples {
        let norm = i as f64 / num_samples.max(1) as f64;
        let amp = (norm * std::f64::consts::PI).sin();
        let white: f64 = rng.gen_range(-1.0..1.0);
        state += alpha * (white - state);
        output.push((state * amp * 2.0) as f32);
    }

    output
}

/// A stereo chirp: the left channel sweeps up, the right sweeps down.
pub fn generate_chirp(sample_rate: u32, duration_secs: f64) -> Vec<f32> {
    let num_frames = (sample_rate as f64 * duration_secs) as usize;
    let mut output = Vec::with_capacity(num_frames * 2);
    let mut phase_l = 0.0_f64;
    let mut phase_r = 0.0_f64;

    for i in 0..num_frames {
        let norm = i as f64 / num_frames.max(1) as f64;
        let up = 200.0 + 800.0 * norm;
        let down = 1000.0 - 800.0 * norm;
        phase_l += up / sample_rate as f64;
        phase_r += down / sample_rate as f64;
        let amp = 0.5 * (1.0 - norm);
        output.push(((phase_l * std::f64::consts::TAU).sin() * amp) as f32);
        output.push(((phase_r * std::f64::consts::TAU).sin() * amp) as f32);
    }

    output
}

/// The demo clip set: three tones, a noise swell, and a stereo chirp.
pub fn demo_clips(sample_rate: u32, seed: u64) -> Vec<Clip> {
    vec![
        Clip::from_mono(generate_tone(sample_rate, 220.0, 1.0), sample_rate),
        Clip::from_mono(generate_tone(sample_rate, 330.0, 0.75), sample_rate),
        Clip::from_mono(generate_tone(sample_rate, 440.0, 0.5), sample_rate),
        Clip::from_mono(generate_noise(sample_rate, 1.5, seed), sample_rate),
        Clip::new(generate_chirp(sample_rate, 1.0), 2, sample_rate),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tone_length_and_range() {
        let tone = generate_tone(44100, 220.0, 0.5);
        assert_eq!(tone.len(), 22050);
        assert!(tone.iter().all(|s| s.abs() <= 1.0));
        assert!(tone.iter().any(|s| s.abs() > 0.1));
    }

    #[test]
    fn noise_is_deterministic_per_seed() {
        let a = generate_noise(8000, 0.1, 7);
        let b = generate_noise(8000, 0.1, 7);
        let c = generate_noise(8000, 0.1, 8);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn chirp_is_interleaved_stereo() {
        let chirp = generate_chirp(1000, 1.0);
        assert_eq!(chirp.len(), 2000);
    }

    #[test]
    fn demo_set() {
        let clips = demo_clips(8000, 42);
        assert_eq!(clips.len(), 5);
        assert_eq!(clips[4].channels(), 2);
        assert!(clips.iter().all(|c| !c.is_empty()));
    }
}
