use std::cell::RefCell;
use std::rc::Rc;

pub const SAMPLE_RATE: u32 = 48_000;

/// Capture buffer shared between the session and the core's audio callback.
pub type SharedAudioCapture = Rc<RefCell<AudioCapture>>;

/// Mono samples recorded while a capture window is open; anything emitted outside it is dropped.
#[derive(Debug, Default)]
pub struct AudioCapture {
    capturing: bool,
    samples: Vec<f64>,
}

impl AudioCapture {
    pub fn new() -> Self {
        AudioCapture::default()
    }

    pub fn shared() -> SharedAudioCapture {
        Rc::new(RefCell::new(AudioCapture::new()))
    }

    pub fn start(&mut self) {
        self.samples.clear();
        self.capturing = true;
    }

    pub fn stop(&mut self) {
        self.capturing = false;
    }

    #[cfg(test)]
    pub fn is_capturing(&self) -> bool {
        self.capturing
    }

    pub fn record(&mut self, left: f32, right: f32) {
        if self.capturing {
            self.samples.push((left as f64 + right as f64) / 2.0);
        }
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// Back to the state of a freshly created session.
    pub fn clear(&mut self) {
        self.samples.clear();
        self.capturing = false;
    }
}
