//! One audio session: an engine, its voice pool and its scope

use crate::config::SessionConfig;
use crate::engine::Engine;
use crate::nodes::Scope;
use crate::port::ScopeFrame;
use crate::voice::{ToneDescriptor, VoicePool};

#[cfg(feature = "cpal_sink")]
use crate::error::Error;
#[cfg(feature = "cpal_sink")]
use crate::output::OutputDevice;

/// Everything a front end talks to.
///
/// When the host has no audio output the session is *unsupported*: snapshots
/// are accepted and ignored, and no scope frames are produced.
pub struct Session {
    pool: Option<VoicePool<Engine>>,
    scope: Option<Scope>,
}

impl Session {
    /// Open the configured output device.
    ///
    /// A host without any output device yields an unsupported session rather
    /// than an error; naming a device that doesn't exist is an error.
    #[cfg(feature = "cpal_sink")]
    pub fn open(config: &SessionConfig) -> Result<Self, Error> {
        let device = match OutputDevice::select(config.output.device.as_deref()) {
            Ok(device) => device,
            Err(Error::NoOutputDevice) => {
                tracing::warn!("no audio output available, running without sound");
                return Ok(Self::unsupported());
            }
            Err(err) => return Err(err),
        };

        let channels = config.output.channels.unwrap_or(device.channels() as usize);
        let engine = Engine::new(device.sample_rate(), channels).with_output(device.create_sink()?);
        tracing::info!(
            device = device.name(),
            sample_rate = device.sample_rate(),
            channels,
            "audio session started"
        );

        Ok(Self::with_engine(engine, config))
    }

    /// Build a session around an existing engine, e.g. one rendering offline.
    pub fn with_engine(mut engine: Engine, config: &SessionConfig) -> Self {
        let scope = config.scope.enabled.then(|| engine.add_scope(config.scope.window));
        Self {
            pool: Some(VoicePool::new(engine, &config.pool)),
            scope,
        }
    }

    pub fn unsupported() -> Self {
        Self {
            pool: None,
            scope: None,
        }
    }

    pub fn audio_supported(&self) -> bool {
        self.pool.is_some()
    }

    /// Make `tones` the set of sounding tones.
    pub fn apply(&mut self, tones: &[ToneDescriptor]) {
        if let Some(pool) = &mut self.pool {
            pool.reconcile(tones);
        }
    }

    /// Render `blocks` blocks of audio, releasing voices as their time comes.
    pub fn render(&mut self, blocks: usize) {
        let Some(pool) = &mut self.pool else {
            return;
        };
        for _ in 0..blocks {
            pool.platform_mut().process();
            pool.tick();
        }
    }

    /// The latest window of output samples.
    pub fn scope_frame(&self) -> Option<ScopeFrame> {
        let scope = self.scope.as_ref()?;
        Some(ScopeFrame {
            samples: scope.snapshot(),
        })
    }

    pub fn pool(&self) -> Option<&VoicePool<Engine>> {
        self.pool.as_ref()
    }

    pub fn engine(&self) -> Option<&Engine> {
        self.pool.as_ref().map(VoicePool::platform)
    }
}
