//! Reconciles the tones that should sound with the voices that do

use hashbrown::{HashMap, HashSet};
use itertools::Itertools;

use super::descriptor::{ToneDescriptor, ToneKey};
use super::device::{Device, DeviceId};
use super::platform::AudioPlatform;
use super::release::ReleaseQueue;
use crate::config::PoolConfig;

/// Running totals over a pool's lifetime.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub created: u64,
    pub faded: u64,
    pub released: u64,
    /// Descriptors skipped because they failed validation
    pub rejected: u64,
}

/// Keeps exactly one voice per distinct wanted tone.
///
/// Each call to [`reconcile`](Self::reconcile) takes the full set of tones that
/// should be sounding. New tones start immediately; tones that disappeared fade
/// out over their own `fade_out_period` and are released by a later
/// [`tick`](Self::tick) once the fade (plus a small margin) is over.
///
/// ```
/// use tonepool::config::PoolConfig;
/// use tonepool::nodes::Waveform;
/// use tonepool::voice::{RecordingPlatform, ToneDescriptor, VoicePool};
///
/// let mut pool = VoicePool::new(RecordingPlatform::new(), &PoolConfig::default());
/// let a440 = ToneDescriptor::new(Waveform::Sine, 440.0, 50.0, 0.5);
///
/// pool.reconcile(&[a440.clone()]);
/// assert!(pool.contains(&a440));
///
/// pool.reconcile(&[]);
/// assert_eq!(pool.live_len(), 0);
/// assert_eq!(pool.fading_len(), 1);
///
/// pool.platform_mut().advance(0.6);
/// assert_eq!(pool.tick(), 1);
/// assert_eq!(pool.fading_len(), 0);
/// ```
pub struct VoicePool<P: AudioPlatform> {
    platform: P,
    live: HashMap<ToneKey, Device<P>>,
    fading: ReleaseQueue<Device<P>>,
    release_margin: f64,
    next_id: u64,
    stats: PoolStats,
}

impl<P: AudioPlatform> VoicePool<P> {
    /// Create an empty pool.
    ///
    /// Releases must land strictly after their ramps end, so a margin that
    /// isn't a positive number of seconds is replaced by the default.
    pub fn new(platform: P, config: &PoolConfig) -> Self {
        let mut release_margin = config.release_margin_secs;
        if !(release_margin.is_finite() && release_margin > 0.0) {
            let fallback = PoolConfig::default().release_margin_secs;
            tracing::warn!(release_margin, fallback, "release margin must be positive");
            release_margin = fallback;
        }

        Self {
            platform,
            live: HashMap::new(),
            fading: ReleaseQueue::new(),
            release_margin,
            next_id: 0,
            stats: PoolStats::default(),
        }
    }

    /// Bring the pool in line with `desired`.
    ///
    /// Duplicates collapse into one voice; invalid descriptors are skipped.
    /// Voices for tones still wanted are left untouched.
    pub fn reconcile(&mut self, desired: &[ToneDescriptor]) {
        let stats = &mut self.stats;
        let wanted: Vec<(ToneKey, &ToneDescriptor)> = desired
            .iter()
            .filter_map(|descriptor| match descriptor.key() {
                Ok(key) => Some((key, descriptor)),
                Err(err) => {
                    stats.rejected += 1;
                    tracing::warn!(%err, ?descriptor, "skipping tone");
                    None
                }
            })
            .unique_by(|(key, _)| *key)
            .collect();

        for (key, descriptor) in &wanted {
            if self.live.contains_key(key) {
                continue;
            }
            let id = DeviceId(self.next_id);
            self.next_id += 1;
            let device = Device::create(&mut self.platform, id, *key, (*descriptor).clone());
            self.live.insert(*key, device);
            self.stats.created += 1;
        }

        let wanted: HashSet<ToneKey> = wanted.into_iter().map(|(key, _)| key).collect();
        let stale = self
            .live
            .extract_if(|key, _| !wanted.contains(key))
            .map(|(_, device)| device)
            .sorted_by_key(Device::id);

        let now = self.platform.now();
        for mut device in stale {
            match device.begin_fade(&mut self.platform, now, self.release_margin) {
                Some(release_at) => {
                    self.fading.schedule(release_at, device);
                    self.stats.faded += 1;
                }
                None => {
                    device.release(&mut self.platform);
                    self.stats.released += 1;
                }
            }
        }
    }

    /// Release every fading voice whose time has come. Returns how many.
    pub fn tick(&mut self) -> usize {
        let now = self.platform.now();
        let mut released = 0;
        while let Some(device) = self.fading.pop_due(now) {
            device.release(&mut self.platform);
            released += 1;
        }
        self.stats.released += released as u64;
        released
    }

    /// Voices currently sounding.
    pub fn live_len(&self) -> usize {
        self.live.len()
    }

    /// Voices fading out, not yet released.
    pub fn fading_len(&self) -> usize {
        self.fading.len()
    }

    /// Whether a voice is sounding for `descriptor`.
    pub fn contains(&self, descriptor: &ToneDescriptor) -> bool {
        descriptor
            .key()
            .map(|key| self.live.contains_key(&key))
            .unwrap_or(false)
    }

    pub fn device(&self, key: &ToneKey) -> Option<&Device<P>> {
        self.live.get(key)
    }

    pub fn live_keys(&self) -> impl Iterator<Item = &ToneKey> {
        self.live.keys()
    }

    /// Fading voices, in no particular order.
    pub fn fading(&self) -> impl Iterator<Item = &Device<P>> {
        self.fading.iter()
    }

    /// When the next fading voice is due for release.
    pub fn next_release_at(&self) -> Option<f64> {
        self.fading.next_due()
    }

    pub fn stats(&self) -> PoolStats {
        self.stats
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }
}
