//! CPAL output device discovery and the audio capability flag.
//!
//! # Example: List and Select a Device
//!
//! ```no_run
//! use tonepool::{Engine, OutputDevice};
//!
//! // List all available output devices
//! let devices = OutputDevice::list_outputs();
//! for (i, device) in devices.iter().enumerate() {
//!     println!("[{}] {} ({} Hz, {} ch)",
//!         i, device.name(), device.sample_rate(), device.channels());
//! }
//!
//! # #[cfg(feature = "cpal_sink")]
//! # {
//! // Use a specific device
//! let device = &devices[0];
//! let engine = Engine::new(device.sample_rate(), device.channels() as usize)
//!     .with_output(device.create_sink().unwrap());
//! # }
//! ```

#[cfg(feature = "cpal_sink")]
use cpal::traits::{DeviceTrait, HostTrait};

#[cfg(feature = "cpal_sink")]
use crate::error::Error;

/// Whether this host can produce audio at all.
///
/// Computed once at startup; when it's `false` no voice pool is ever built
/// and front ends should hide their audio controls.
pub fn audio_supported() -> bool {
    OutputDevice::default_output().is_some()
}

/// A discovered audio output device.
///
/// Use [`OutputDevice::default_output`] to get the system default, or
/// [`OutputDevice::list_outputs`] to enumerate all available devices.
///
/// Once you have a device, use [`create_sink`](Self::create_sink) to create
/// a [`CpalSink`](crate::nodes::CpalSink) node for audio output.
pub struct OutputDevice {
    #[cfg(feature = "cpal_sink")]
    device: cpal::Device,
    #[cfg(feature = "cpal_sink")]
    config: cpal::SupportedStreamConfig,

    name: String,
    sample_rate: u32,
    channels: u16,
}

impl OutputDevice {
    /// Get the system's default output device.
    ///
    /// Returns `None` if no audio device is available (or the crate was built
    /// without the `cpal_sink` feature).
    #[cfg(feature = "cpal_sink")]
    pub fn default_output() -> Option<Self> {
        let host = cpal::default_host();
        let device = host.default_output_device()?;
        Self::from_cpal(device).ok()
    }

    #[cfg(not(feature = "cpal_sink"))]
    pub fn default_output() -> Option<Self> {
        None
    }

    /// List all available audio output devices.
    ///
    /// Returns an empty list if no devices are found or if enumeration fails.
    #[cfg(feature = "cpal_sink")]
    pub fn list_outputs() -> Vec<Self> {
        let host = cpal::default_host();
        host.output_devices()
            .map(|devices| devices.filter_map(|device| Self::from_cpal(device).ok()).collect())
            .unwrap_or_default()
    }

    #[cfg(not(feature = "cpal_sink"))]
    pub fn list_outputs() -> Vec<Self> {
        Vec::new()
    }

    /// Find an output device by name, or the default one when `name` is `None`.
    #[cfg(feature = "cpal_sink")]
    pub fn select(name: Option<&str>) -> Result<Self, Error> {
        match name {
            None => Self::default_output().ok_or(Error::NoOutputDevice),
            Some(name) => Self::list_outputs()
                .into_iter()
                .find(|d| d.name == name)
                .ok_or_else(|| Error::DeviceNotFound(name.to_string())),
        }
    }

    #[cfg(feature = "cpal_sink")]
    fn from_cpal(device: cpal::Device) -> Result<Self, Error> {
        let config = device.default_output_config()?;
        let name = device.name().unwrap_or_else(|_| "Unknown".into());
        Ok(Self {
            sample_rate: config.sample_rate().0,
            channels: config.channels(),
            name,
            device,
            config,
        })
    }

    /// Get the device name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the device's sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Get the number of output channels.
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Create a sink node that outputs audio to this device.
    ///
    /// The returned [`CpalSink`](crate::nodes::CpalSink) should be added to
    /// the engine via [`Engine::with_output`](crate::Engine::with_output).
    #[cfg(feature = "cpal_sink")]
    pub fn create_sink(&self) -> Result<crate::nodes::CpalSink, Error> {
        crate::nodes::CpalSink::new(&self.device, &self.config)
    }
}
