//! High-level audio engine API

use std::marker::PhantomData;

use crate::graph::AudioGraph;
use crate::node::{AudioNode, NodeId};
use crate::nodes::{Mixer, Scope, ScopeTap};

#[cfg(feature = "cpal_sink")]
use crate::error::Error;
#[cfg(feature = "cpal_sink")]
use crate::output::OutputDevice;

/// A handle for sending messages to a node in the audio graph.
///
/// Handles are returned when you add a node to an [`Engine`] and provide two capabilities:
/// 1. **Connections** - Pass handles to [`Engine::connect`] or [`Engine::output`]
/// 2. **Messages** - Send parameter updates via [`Handle::send`]
///
/// # Example
///
/// ```
/// # use tonepool::{Engine, nodes::{Oscillator, OscillatorMessage}};
/// let mut engine = Engine::new(48_000, 2);
/// let mut osc = engine.add(Oscillator::sine(440.0));
///
/// // Start it (processed next audio block)
/// osc.send(OscillatorMessage::Start).ok();
/// ```
///
/// # Message Delivery
///
/// Messages are buffered in a lock-free ring buffer and processed at the start
/// of each audio block. If the buffer is full, [`Handle::send`] returns `Err(msg)`
/// with the message that couldn't be sent.
pub struct Handle<M: Send + 'static> {
    pub(crate) node_id: NodeId,
    pub(crate) sender: rtrb::Producer<M>,
    pub(crate) _marker: PhantomData<M>,
}

impl<M: Send + 'static> Handle<M> {
    /// Send a message to the node.
    ///
    /// The message will be processed at the start of the next audio block.
    ///
    /// # Returns
    ///
    /// - `Ok(())` if the message was queued successfully
    /// - `Err(msg)` if the queue is full (message dropped)
    pub fn send(&mut self, msg: M) -> Result<(), M> {
        self.sender.push(msg).map_err(|rtrb::PushError::Full(m)| m)
    }

    /// The node this handle addresses.
    pub fn id(&self) -> NodeId {
        self.node_id
    }
}

/// The audio engine - owns the graph, the shared output bus and the output sink.
///
/// Every voice connects into one summing bus ([`Mixer`]). The bus feeds the
/// sink, optionally through a [`ScopeTap`] for visualization:
///
/// ```text
/// oscillator → gain ┐
/// oscillator → gain ┼→ bus → [scope tap] → sink
/// oscillator → gain ┘
/// ```
///
/// The engine also keeps the audio clock: [`now`](Self::now) is the time, in
/// seconds, of the next block [`process`](Self::process) will render. Parameter
/// automation is scheduled against that clock.
///
/// # Creating an Instance
///
/// ```no_run
/// # #[cfg(feature = "cpal_sink")]
/// # fn main() -> Result<(), tonepool::Error> {
/// use tonepool::Engine;
///
/// let engine = Engine::default_output()?;
/// # Ok(())
/// # }
/// # #[cfg(not(feature = "cpal_sink"))]
/// # fn main() {}
/// ```
///
/// For offline rendering, attach an [`RtrbSink`](crate::nodes::RtrbSink):
///
/// ```
/// use tonepool::Engine;
/// use tonepool::nodes::RtrbSink;
///
/// let (producer, consumer) = rtrb::RingBuffer::<f32>::new(4096);
/// let mut engine = Engine::new(48_000, 1).with_output(RtrbSink::mono(producer));
/// engine.process();
/// assert_eq!(consumer.slots(), 64);
/// ```
///
/// # Processing Audio
///
/// Call [`process`](Self::process) repeatedly to generate audio, paced to match
/// real time:
///
/// ```no_run
/// # use tonepool::Engine;
/// # let mut engine = Engine::new(48_000, 2);
/// use std::time::{Duration, Instant};
///
/// let start = Instant::now();
/// let rate = engine.sample_rate() as f64;
/// let mut blocks = 0u64;
///
/// loop {
///     // Stay a few blocks ahead to prevent underruns
///     let target = (start.elapsed().as_secs_f64() * rate / 64.0) as u64 + 4;
///
///     while blocks < target {
///         engine.process();
///         blocks += 1;
///     }
///
///     std::thread::sleep(Duration::from_micros(500));
/// }
/// ```
pub struct Engine {
    graph: AudioGraph,
    /// Number of output channels
    channels: usize,

    /// Summing bus all voices feed
    bus: NodeId,
    /// Analysis tap between the bus and the sink
    tap: Option<NodeId>,
    /// The output sink node (e.g., CpalSink)
    sink: Option<NodeId>,
}

impl Engine {
    /// Create an engine with an explicit sample rate and channel count.
    ///
    /// This creates an engine without an output sink. Use [`with_output`](Self::with_output)
    /// to add one.
    pub fn new(sample_rate: u32, channels: usize) -> Self {
        let channels = channels.max(1);
        let mut graph = AudioGraph::new(sample_rate);
        let bus = graph.add(Mixer::new(channels)).id();

        Self {
            graph,
            channels,
            bus,
            tap: None,
            sink: None,
        }
    }

    /// Create an engine playing through the system's default audio device.
    #[cfg(feature = "cpal_sink")]
    pub fn default_output() -> Result<Self, Error> {
        let device = OutputDevice::default_output().ok_or(Error::NoOutputDevice)?;
        Self::for_device(&device)
    }

    /// Create an engine playing through `device`.
    #[cfg(feature = "cpal_sink")]
    pub fn for_device(device: &OutputDevice) -> Result<Self, Error> {
        let sink = device.create_sink()?;
        Ok(Self::new(device.sample_rate(), device.channels() as usize).with_output(sink))
    }

    /// Add the output sink (builder pattern).
    ///
    /// Replaces any sink added before.
    pub fn with_output<S: AudioNode<Message = ()>>(mut self, sink: S) -> Self {
        if let Some(old) = self.sink.take() {
            self.graph.remove(old);
        }

        let sink = self.graph.add(sink).id();
        self.graph.connect(self.tap.unwrap_or(self.bus), sink);
        self.graph.set_terminal(sink);
        self.sink = Some(sink);
        self
    }

    /// Insert an analysis tap after the bus and return its reader.
    ///
    /// `window` is the number of samples each [`Scope::snapshot`] returns.
    /// Calling this again replaces the previous tap.
    pub fn add_scope(&mut self, window: usize) -> Scope {
        if let Some(old) = self.tap.take() {
            self.graph.remove(old);
        } else if let Some(sink) = self.sink {
            self.graph.disconnect(self.bus, sink);
        }

        let (tap, scope) = ScopeTap::new(self.channels, window);
        let tap = self.graph.add(tap).id();
        self.graph.connect(self.bus, tap);
        if let Some(sink) = self.sink {
            self.graph.connect(tap, sink);
        }
        self.tap = Some(tap);

        scope
    }

    /// Get the output sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.graph.sample_rate()
    }

    /// Get the number of output channels.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Audio clock: the time, in seconds, of the next block to be processed.
    pub fn now(&self) -> f64 {
        self.graph.frame() as f64 / self.graph.sample_rate() as f64
    }

    /// Frames processed so far.
    pub fn frames(&self) -> u64 {
        self.graph.frame()
    }

    /// Number of nodes in the graph, including the bus, tap and sink.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Add a node to the audio graph.
    ///
    /// Returns a [`Handle`] for connecting the node and sending messages to it.
    pub fn add<N: AudioNode>(&mut self, node: N) -> Handle<N::Message> {
        let handle = self.graph.add(node);

        Handle {
            node_id: handle.id(),
            sender: handle.sender,
            _marker: PhantomData,
        }
    }

    /// Connect two nodes together.
    ///
    /// Audio flows from `from` to `to`. Connecting the same pair twice is a no-op.
    pub fn connect<M1, M2>(&mut self, from: &Handle<M1>, to: &Handle<M2>)
    where
        M1: Send + 'static,
        M2: Send + 'static,
    {
        if !self.graph.connect(from.node_id, to.node_id) {
            tracing::warn!(from = ?from.node_id, to = ?to.node_id, "connect on a removed node");
        }
    }

    /// Connect a node to the shared output bus.
    pub fn output<M: Send + 'static>(&mut self, handle: &Handle<M>) {
        self.graph.connect(handle.node_id, self.bus);
    }

    /// Remove the edge between two nodes.
    pub fn disconnect<M1, M2>(&mut self, from: &Handle<M1>, to: &Handle<M2>)
    where
        M1: Send + 'static,
        M2: Send + 'static,
    {
        self.graph.disconnect(from.node_id, to.node_id);
    }

    /// Remove a node and every connection to or from it.
    ///
    /// Consumes the handle: the node and its message queue are gone.
    pub fn remove<M: Send + 'static>(&mut self, handle: Handle<M>) {
        self.graph.remove(handle.node_id);
    }

    /// Process one block of audio (64 samples) and advance the clock.
    pub fn process(&mut self) {
        self.graph.process();
    }
}
