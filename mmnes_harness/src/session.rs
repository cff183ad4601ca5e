use log::{debug, trace};
use crate::audio_capture::{AudioCapture, SharedAudioCapture};
use crate::emulation_core::{CoreCallbacks, CoreFactory, EmulationCore};
use crate::harness_error::HarnessError;
use crate::verbosity::Verbosity;

/// Process-wide state owned by the command loop.
pub struct Session {
    core: Option<Box<dyn EmulationCore>>,
    frame_count: u64,
    audio: SharedAudioCapture,
    verbosity: Verbosity,
    factory: CoreFactory,
}

impl Session {
    pub fn new(factory: CoreFactory, verbosity: Verbosity) -> Session {
        verbosity.apply();

        Session {
            core: None,
            frame_count: 0,
            audio: AudioCapture::shared(),
            verbosity,
            factory,
        }
    }

    /// A fresh core whose audio feeds this session's capture buffer. It is not installed yet.
    pub fn create_core(&self) -> Box<dyn EmulationCore> {
        let audio = self.audio.clone();

        let callbacks = CoreCallbacks {
            on_frame: Box::new(|frame: u64| trace!("core frame {} done", frame)),
            on_audio_sample: Box::new(move |left: f32, right: f32| audio.borrow_mut().record(left, right)),
        };

        (self.factory)(callbacks)
    }

    /// Replace the active core, dropping the previous one.
    pub fn install_core(&mut self, core: Box<dyn EmulationCore>) {
        if self.core.is_some() {
            debug!("session: discarding previous core");
        }
        self.core = Some(core);
        self.frame_count = 0;
        self.audio.borrow_mut().clear();
    }

    pub fn has_core(&self) -> bool {
        self.core.is_some()
    }

    pub fn core(&self) -> Result<&dyn EmulationCore, HarnessError> {
        self.core.as_deref().ok_or(HarnessError::PreconditionError)
    }

    pub fn core_mut(&mut self) -> Result<&mut dyn EmulationCore, HarnessError> {
        match self.core.as_mut() {
            Some(core) => Ok(core.as_mut()),
            None => Err(HarnessError::PreconditionError),
        }
    }

    /// Advance `count` frames, counting each one as it completes.
    pub fn step_frames(&mut self, count: u64) -> Result<u64, HarnessError> {
        let core = self.core.as_mut().ok_or(HarnessError::PreconditionError)?;

        for _ in 0..count {
            core.step_frame()?;
            self.frame_count += 1;
        }

        Ok(self.frame_count)
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn reset_frame_count(&mut self) {
        self.frame_count = 0;
    }

    pub fn audio(&self) -> &SharedAudioCapture {
        &self.audio
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    pub fn set_verbosity(&mut self, verbosity: Verbosity) {
        self.verbosity = verbosity;
        verbosity.apply();
    }
}
