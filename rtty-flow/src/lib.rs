//! Credit-based flow control for the host transport.
//!
//! Each logical channel carries a credit window: the controller grants the
//! remote side permission to send up to `credit_outstanding` bytes, receipt
//! of data consumes credit, and [`FlowController::plan_credit_grant`] tops
//! the window back up towards its target. Global pause reasons (transport
//! backpressure, hidden visibility, offline) suspend granting entirely.
//!
//! All operations are synchronous and return the policy events produced by
//! the transition; callers own timers and scheduling.

use std::collections::HashMap;

use log::{debug, trace};
use serde::{Deserialize, Serialize};

/// Default number of bytes a channel aims to keep granted.
pub const DEFAULT_WINDOW_TARGET: u64 = 64 * 1024;

/// Default hard cap on outstanding credit per channel.
pub const DEFAULT_MAX_WINDOW: u64 = 256 * 1024;

/// Default buffered-amount high water mark.
pub const DEFAULT_HIGH_WATER_MARK: u64 = 1024 * 1024;

/// Default buffered-amount low water mark.
pub const DEFAULT_LOW_WATER_MARK: u64 = 256 * 1024;

/// Why granting is currently suspended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PauseReason {
    TransportBackpressure,
    VisibilityHidden,
    Offline,
}

/// Events produced by flow-control transitions, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PolicyEvent {
    CreditGrant { channel: u64, amount: u64 },
    FlowPause { reason: PauseReason },
    FlowResume { reason: PauseReason },
}

/// Per-channel window configuration.
#[derive(Debug, Clone, Copy)]
pub struct ChannelOptions {
    pub window_target: u64,
    pub max_window: u64,
}

impl Default for ChannelOptions {
    fn default() -> Self {
        Self {
            window_target: DEFAULT_WINDOW_TARGET,
            max_window: DEFAULT_MAX_WINDOW,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Channel {
    credit_outstanding: u64,
    window_target: u64,
    max_window: u64,
}

/// The flow controller: per-channel credit plus global pause reasons.
#[derive(Debug)]
pub struct FlowController {
    channels: HashMap<u64, Channel>,
    high_water_mark: u64,
    low_water_mark: u64,
    transport_backpressured: bool,
    visibility_hidden: bool,
    offline: bool,
}

impl Default for FlowController {
    fn default() -> Self {
        Self {
            channels: HashMap::new(),
            high_water_mark: DEFAULT_HIGH_WATER_MARK,
            low_water_mark: DEFAULT_LOW_WATER_MARK,
            transport_backpressured: false,
            visibility_hidden: false,
            offline: false,
        }
    }
}

impl FlowController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the buffered-amount hysteresis thresholds.
    #[must_use]
    pub fn with_water_marks(mut self, high: u64, low: u64) -> Self {
        self.high_water_mark = high;
        self.low_water_mark = low.min(high);
        self
    }

    /// Start tracking a channel. The window target is clamped to the
    /// maximum window.
    pub fn register(&mut self, id: u64, options: ChannelOptions) {
        let window_target = options.window_target.min(options.max_window);
        trace!(
            "register channel {id}: target={window_target} max={}",
            options.max_window
        );
        self.channels.insert(
            id,
            Channel {
                credit_outstanding: 0,
                window_target,
                max_window: options.max_window,
            },
        );
    }

    pub fn deregister(&mut self, id: u64) {
        self.channels.remove(&id);
    }

    /// Active pause reasons, in a stable order.
    pub fn pause_reasons(&self) -> Vec<PauseReason> {
        let mut reasons = Vec::new();
        if self.transport_backpressured {
            reasons.push(PauseReason::TransportBackpressure);
        }
        if self.visibility_hidden {
            reasons.push(PauseReason::VisibilityHidden);
        }
        if self.offline {
            reasons.push(PauseReason::Offline);
        }
        reasons
    }

    pub fn is_paused(&self) -> bool {
        self.transport_backpressured || self.visibility_hidden || self.offline
    }

    /// Outstanding credit for a channel; zero when unknown.
    pub fn credit_outstanding(&self, id: u64) -> u64 {
        self.channels
            .get(&id)
            .map_or(0, |channel| channel.credit_outstanding)
    }

    /// Data arrived on a channel, consuming that much credit (floored at
    /// zero).
    pub fn apply_data_receipt(&mut self, id: u64, bytes: u64) {
        let Some(channel) = self.channels.get_mut(&id) else {
            debug!("data receipt for unknown channel {id}");
            return;
        };
        channel.credit_outstanding =
            channel.credit_outstanding.saturating_sub(bytes);
    }

    /// Compute and commit the next credit grant for a channel. Returns the
    /// grant size (zero while paused or for unknown channels) and the
    /// policy events it produced.
    pub fn plan_credit_grant(&mut self, id: u64) -> (u64, Vec<PolicyEvent>) {
        if self.is_paused() {
            return (0, Vec::new());
        }

        let Some(channel) = self.channels.get_mut(&id) else {
            debug!("credit grant for unknown channel {id}");
            return (0, Vec::new());
        };

        let headroom_to_target = channel
            .window_target
            .saturating_sub(channel.credit_outstanding);
        let headroom_to_max =
            channel.max_window.saturating_sub(channel.credit_outstanding);
        let grant = headroom_to_target.min(headroom_to_max);

        if grant == 0 {
            return (0, Vec::new());
        }

        channel.credit_outstanding += grant;
        trace!(
            "grant {grant} to channel {id}, outstanding {}",
            channel.credit_outstanding
        );
        (
            grant,
            vec![PolicyEvent::CreditGrant {
                channel: id,
                amount: grant,
            }],
        )
    }

    pub fn update_transport_backpressure(
        &mut self,
        backpressured: bool,
    ) -> Vec<PolicyEvent> {
        let changed = self.transport_backpressured != backpressured;
        self.transport_backpressured = backpressured;
        Self::transition_events(
            changed,
            backpressured,
            PauseReason::TransportBackpressure,
        )
    }

    pub fn update_visibility_hidden(&mut self, hidden: bool) -> Vec<PolicyEvent> {
        let changed = self.visibility_hidden != hidden;
        self.visibility_hidden = hidden;
        Self::transition_events(changed, hidden, PauseReason::VisibilityHidden)
    }

    pub fn update_offline(&mut self, offline: bool) -> Vec<PolicyEvent> {
        let changed = self.offline != offline;
        self.offline = offline;
        Self::transition_events(changed, offline, PauseReason::Offline)
    }

    /// Derive transport backpressure from the transport's buffered amount
    /// with high/low-water hysteresis.
    pub fn update_buffered_amount(&mut self, buffered: u64) -> Vec<PolicyEvent> {
        if buffered >= self.high_water_mark {
            self.update_transport_backpressure(true)
        } else if buffered <= self.low_water_mark {
            self.update_transport_backpressure(false)
        } else {
            Vec::new()
        }
    }

    fn transition_events(
        changed: bool,
        active: bool,
        reason: PauseReason,
    ) -> Vec<PolicyEvent> {
        if !changed {
            return Vec::new();
        }
        if active {
            vec![PolicyEvent::FlowPause { reason }]
        } else {
            vec![PolicyEvent::FlowResume { reason }]
        }
    }
}
