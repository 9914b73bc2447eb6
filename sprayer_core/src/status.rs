//! Channel state owned by a lane worker.

/// Logical state of one nozzle channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelState {
    #[default]
    Off,
    On,
}

impl ChannelState {
    pub fn is_on(self) -> bool {
        matches!(self, ChannelState::On)
    }
}

impl std::fmt::Display for ChannelState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelState::Off => f.write_str("off"),
            ChannelState::On => f.write_str("on"),
        }
    }
}

/// Receives every logical transition of every lane (e.g. a terminal display).
///
/// Called from lane worker threads, so implementations synchronize internally.
pub trait TransitionSink: Send + Sync {
    fn update(&self, lane: usize, state: ChannelState);
}
