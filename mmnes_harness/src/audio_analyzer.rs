use log::debug;
use rustfft::{Fft, FftPlanner};
use rustfft::num_complex::Complex;
use serde::Serialize;
use crate::wav_encoder::to_pcm;

/// RMS level separating silence from a playing channel.
pub const SILENCE_THRESHOLD: f64 = 0.01;
const PCM_SCALE: f64 = 32768.0;

/// Metrics of a captured clip, as reported to automated audio tests.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AudioAnalysis {
    pub rms: f64,
    /// Strongest FFT bin below Nyquist in Hz, DC excluded.
    pub frequency: f64,
    pub is_playing: bool,
    pub is_silence: bool,
    pub sample_rate: u32,
    pub duration_sec: f64,
}

pub struct AudioAnalyzer {
    planner: FftPlanner<f64>,
    sample_rate: u32,
}

impl AudioAnalyzer {
    pub fn new(sample_rate: u32) -> Self {
        AudioAnalyzer { planner: FftPlanner::new(), sample_rate }
    }

    /// Analyze `samples` as they come back out of the 16-bit WAV, so the numbers match what a
    /// reader of the `wav` payload would measure.
    pub fn analyze(&mut self, samples: &[f64]) -> AudioAnalysis {
        let pcm: Vec<f64> = samples.iter().map(|s| to_pcm(*s) as f64 / PCM_SCALE).collect();

        let rms = AudioAnalyzer::rms(&pcm);
        let frequency = self.dominant_frequency(&pcm);
        debug!("audio analysis: {} samples, rms={:.4}, frequency={:.1} Hz", pcm.len(), rms, frequency);

        AudioAnalysis {
            rms,
            frequency,
            is_playing: rms > SILENCE_THRESHOLD,
            is_silence: rms < SILENCE_THRESHOLD,
            sample_rate: self.sample_rate,
            duration_sec: pcm.len() as f64 / self.sample_rate as f64,
        }
    }

    fn rms(samples: &[f64]) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }

        (samples.iter().map(|s| s * s).sum::<f64>() / samples.len() as f64).sqrt()
    }

    fn dominant_frequency(&mut self, samples: &[f64]) -> f64 {
        let len = samples.len();
        if len < 4 {
            return 0.0;
        }

        let mut spectrum: Vec<Complex<f64>> = samples.iter().map(|s| Complex::new(*s, 0.0)).collect();
        self.planner.plan_fft_forward(len).process(&mut spectrum);

        // first strongest bin wins ties
        let (peak, _) = spectrum[1..len / 2].iter()
            .map(|c| c.norm())
            .enumerate()
            .fold((0, f64::MIN), |best, (index, magnitude)| if magnitude > best.1 { (index, magnitude) } else { best });

        (peak + 1) as f64 * self.sample_rate as f64 / len as f64
    }
}
