//! Connection channels: the client side of one button session.

use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

use crate::click::{ClickEngine, ClickEvent};
use crate::listeners::Listeners;
use crate::types::{
    BdAddr, ButtonEvent, ClickOrHold, Closed, ConnectionStatus, CreateConnectionChannelError,
    DisconnectReason, LatencyMode, RemovedReason, SingleOrDoubleClick, SingleOrDoubleClickOrHold,
    UpOrDown,
};

/// Who decides between click, hold, single and double click.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClickSource {
    /// Derive the families from raw edges with the local engine; only the
    /// daemon's hold classification is taken over.
    #[default]
    Local,
    /// Forward every family exactly as the daemon classified it.
    Daemon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateResponse {
    pub error: CreateConnectionChannelError,
    pub connection_status: ConnectionStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub status: ConnectionStatus,
    /// Only set when the button dropped to [`ConnectionStatus::Disconnected`].
    pub disconnect_reason: Option<DisconnectReason>,
}

#[derive(Debug, Default)]
pub struct ChannelListeners {
    pub create_response: Listeners<CreateResponse>,
    pub removed: Listeners<RemovedReason>,
    pub connection_status_changed: Listeners<StatusChange>,
    pub button_up_or_down: Listeners<ButtonEvent<UpOrDown>>,
    pub button_click_or_hold: Listeners<ButtonEvent<ClickOrHold>>,
    pub button_single_or_double_click: Listeners<ButtonEvent<SingleOrDoubleClick>>,
    pub button_single_or_double_click_or_hold: Listeners<ButtonEvent<SingleOrDoubleClickOrHold>>,
    /// The client closed while this channel was registered.
    pub closed: Listeners<Closed>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Not handed to a client yet.
    Detached,
    /// Create request sent, waiting for the daemon to acknowledge.
    Pending,
    Bound,
    /// Terminal; the channel never receives events again.
    Removed,
}

#[derive(Debug)]
pub struct ConnectionChannel {
    bd_addr: BdAddr,
    latency_mode: LatencyMode,
    auto_disconnect_time: u16,
    click_source: ClickSource,
    status: ConnectionStatus,
    lifecycle: Lifecycle,
    engine: ClickEngine,
    listeners: ChannelListeners,
}

impl ConnectionChannel {
    pub fn new(bd_addr: BdAddr) -> Self {
        Self {
            bd_addr,
            latency_mode: LatencyMode::default(),
            auto_disconnect_time: 0,
            click_source: ClickSource::default(),
            status: ConnectionStatus::Disconnected,
            lifecycle: Lifecycle::Detached,
            engine: ClickEngine::default(),
            listeners: ChannelListeners::default(),
        }
    }

    pub fn with_latency_mode(mut self, latency_mode: LatencyMode) -> Self {
        self.latency_mode = latency_mode;
        self
    }

    /// Seconds of inactivity before the daemon drops the connection; `0` disables it.
    pub fn with_auto_disconnect_time(mut self, seconds: u16) -> Self {
        self.auto_disconnect_time = seconds;
        self
    }

    pub fn with_click_source(mut self, click_source: ClickSource) -> Self {
        self.click_source = click_source;
        self
    }

    pub fn bd_addr(&self) -> BdAddr {
        self.bd_addr
    }

    pub fn latency_mode(&self) -> LatencyMode {
        self.latency_mode
    }

    pub fn auto_disconnect_time(&self) -> u16 {
        self.auto_disconnect_time
    }

    pub fn click_source(&self) -> ClickSource {
        self.click_source
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn listeners(&mut self) -> &mut ChannelListeners {
        &mut self.listeners
    }

    pub(crate) fn attach(&mut self, double_click_window: Duration) {
        self.engine = ClickEngine::new(double_click_window);
        self.lifecycle = Lifecycle::Pending;
    }

    /// Optimistic: the daemon applies the change later, if at all.
    pub(crate) fn set_mode_parameters(
        &mut self,
        latency_mode: LatencyMode,
        auto_disconnect_time: u16,
    ) {
        self.latency_mode = latency_mode;
        self.auto_disconnect_time = auto_disconnect_time;
    }

    pub(crate) fn next_deadline(&self) -> Option<Instant> {
        self.engine.deadline()
    }

    /// Returns whether the channel is now bound.
    pub(crate) fn apply_create_response(
        &mut self,
        error: CreateConnectionChannelError,
        connection_status: ConnectionStatus,
    ) -> bool {
        let bound = error == CreateConnectionChannelError::NoError;
        if bound {
            self.lifecycle = Lifecycle::Bound;
            self.status = connection_status;
        } else {
            self.lifecycle = Lifecycle::Removed;
            self.status = ConnectionStatus::Disconnected;
        }

        self.listeners.create_response.emit(&CreateResponse {
            error,
            connection_status: self.status,
        });
        bound
    }

    pub(crate) fn apply_status(&mut self, reported: ConnectionStatus, reason: DisconnectReason) {
        let path = status_path(self.status, reported);
        if path.is_empty() && reported != self.status {
            warn!(
                bd_addr = %self.bd_addr,
                from = %self.status,
                to = %reported,
                "ignoring backward connection status"
            );
        }

        for &status in path {
            self.status = status;
            let disconnect_reason =
                (status == ConnectionStatus::Disconnected).then_some(reason);
            self.listeners
                .connection_status_changed
                .emit(&StatusChange {
                    status,
                    disconnect_reason,
                });
        }
    }

    pub(crate) fn apply_removed(&mut self, reason: RemovedReason) {
        if self.lifecycle == Lifecycle::Removed {
            return;
        }
        debug!(bd_addr = %self.bd_addr, %reason, "connection channel removed");
        self.lifecycle = Lifecycle::Removed;
        self.status = ConnectionStatus::Disconnected;
        self.listeners.removed.emit(&reason);
    }

    /// Local removal: no notification, the caller asked for it.
    pub(crate) fn detach(&mut self) {
        self.lifecycle = Lifecycle::Removed;
        self.status = ConnectionStatus::Disconnected;
    }

    pub(crate) fn apply_closed(&mut self, closed: Closed) {
        if self.lifecycle == Lifecycle::Removed {
            return;
        }
        self.lifecycle = Lifecycle::Removed;
        self.status = ConnectionStatus::Disconnected;
        self.listeners.closed.emit(&closed);
    }

    /// Routes one button event from the daemon according to the click source.
    pub(crate) fn handle_button(&mut self, event: ClickEvent, now: Instant) {
        let emitted = match self.click_source {
            ClickSource::Daemon => vec![event],
            ClickSource::Local => match event {
                ClickEvent::UpOrDown(edge) => self.engine.edge(edge, now),
                ClickEvent::ClickOrHold(ev) if ev.click_type == ClickOrHold::Hold => {
                    self.engine.hold(ev.was_queued, ev.time_diff)
                }
                ClickEvent::SingleOrDoubleClickOrHold(ev)
                    if ev.click_type == SingleOrDoubleClickOrHold::Hold =>
                {
                    self.engine.hold(ev.was_queued, ev.time_diff)
                }
                other => {
                    trace!(
                        bd_addr = %self.bd_addr,
                        ?other,
                        "daemon classification superseded locally"
                    );
                    Vec::new()
                }
            },
        };

        for event in emitted {
            self.emit_click(event);
        }
    }

    pub(crate) fn fire_timers(&mut self, now: Instant) {
        for event in self.engine.poll(now) {
            self.emit_click(event);
        }
    }

    fn emit_click(&mut self, event: ClickEvent) {
        match event {
            ClickEvent::UpOrDown(ev) => self.listeners.button_up_or_down.emit(&ev),
            ClickEvent::ClickOrHold(ev) => self.listeners.button_click_or_hold.emit(&ev),
            ClickEvent::SingleOrDoubleClick(ev) => {
                self.listeners.button_single_or_double_click.emit(&ev);
            }
            ClickEvent::SingleOrDoubleClickOrHold(ev) => {
                self.listeners
                    .button_single_or_double_click_or_hold
                    .emit(&ev);
            }
        }
    }
}

/// Statuses a subscriber observes when the daemon reports `to` while the
/// channel is at `from`.
///
/// Ready is only reachable through Connected, so a Disconnected -> Ready
/// report yields both steps. Moving back from Ready to Connected is not a
/// valid transition and yields nothing.
pub(crate) fn status_path(
    from: ConnectionStatus,
    to: ConnectionStatus,
) -> &'static [ConnectionStatus] {
    use ConnectionStatus::{Connected, Disconnected, Ready};

    match (from, to) {
        (Disconnected, Connected) => &[Connected],
        (Disconnected, Ready) => &[Connected, Ready],
        (Connected, Ready) => &[Ready],
        (Connected | Ready, Disconnected) => &[Disconnected],
        (Disconnected, Disconnected)
        | (Connected, Connected)
        | (Ready, Ready)
        | (Ready, Connected) => &[],
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, Instant};

    use pretty_assertions::assert_eq;
    use strum::IntoEnumIterator;

    use super::*;

    fn channel() -> ConnectionChannel {
        let mut channel = ConnectionChannel::new(BdAddr::new([0x80, 0xe4, 0xda, 0x70, 0, 1]));
        channel.attach(Duration::from_millis(400));
        channel
    }

    fn record_statuses(channel: &mut ConnectionChannel) -> Arc<Mutex<Vec<StatusChange>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        channel
            .listeners()
            .connection_status_changed
            .on(move |change| sink.lock().unwrap().push(*change));
        seen
    }

    #[test]
    fn status_paths_never_skip_connected() {
        for from in ConnectionStatus::iter() {
            for to in ConnectionStatus::iter() {
                let path = status_path(from, to);
                let mut current = from;
                for &next in path {
                    let valid = matches!(
                        (current, next),
                        (ConnectionStatus::Disconnected, ConnectionStatus::Connected)
                            | (ConnectionStatus::Connected, ConnectionStatus::Ready)
                            | (_, ConnectionStatus::Disconnected)
                    );
                    assert!(valid, "{current} -> {next} reported for {from} -> {to}");
                    current = next;
                }
            }
        }
    }

    #[test]
    fn ready_from_disconnected_is_reported_in_two_steps() {
        let mut channel = channel();
        let seen = record_statuses(&mut channel);
        channel.apply_create_response(
            CreateConnectionChannelError::NoError,
            ConnectionStatus::Disconnected,
        );

        channel.apply_status(ConnectionStatus::Ready, DisconnectReason::Unspecified);
        channel.apply_status(ConnectionStatus::Ready, DisconnectReason::Unspecified);
        channel.apply_status(ConnectionStatus::Disconnected, DisconnectReason::TimedOut);

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                StatusChange {
                    status: ConnectionStatus::Connected,
                    disconnect_reason: None,
                },
                StatusChange {
                    status: ConnectionStatus::Ready,
                    disconnect_reason: None,
                },
                StatusChange {
                    status: ConnectionStatus::Disconnected,
                    disconnect_reason: Some(DisconnectReason::TimedOut),
                },
            ]
        );
        assert_eq!(channel.status(), ConnectionStatus::Disconnected);
    }

    #[test]
    fn backward_status_is_dropped() {
        let mut channel = channel();
        channel.apply_create_response(
            CreateConnectionChannelError::NoError,
            ConnectionStatus::Ready,
        );
        let seen = record_statuses(&mut channel);

        channel.apply_status(ConnectionStatus::Connected, DisconnectReason::Unspecified);

        assert!(seen.lock().unwrap().is_empty());
        assert_eq!(channel.status(), ConnectionStatus::Ready);
    }

    #[test]
    fn failed_create_leaves_channel_unbound() {
        let mut channel = channel();
        let responses = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&responses);
        channel
            .listeners()
            .create_response
            .on(move |r| sink.lock().unwrap().push(*r));

        let bound = channel.apply_create_response(
            CreateConnectionChannelError::MaxPendingConnectionsReached,
            ConnectionStatus::Disconnected,
        );

        assert!(!bound);
        assert_eq!(channel.lifecycle(), Lifecycle::Removed);
        assert_eq!(
            *responses.lock().unwrap(),
            vec![CreateResponse {
                error: CreateConnectionChannelError::MaxPendingConnectionsReached,
                connection_status: ConnectionStatus::Disconnected,
            }]
        );
    }

    #[test]
    fn removed_is_delivered_once() {
        let mut channel = channel();
        channel.apply_create_response(
            CreateConnectionChannelError::NoError,
            ConnectionStatus::Ready,
        );
        let count = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&count);
        channel.listeners().removed.on(move |_| *counter.lock().unwrap() += 1);

        channel.apply_removed(RemovedReason::ForceDisconnectedByOtherClient);
        channel.apply_removed(RemovedReason::ForceDisconnectedByOtherClient);
        channel.apply_closed(Closed { had_error: false });

        assert_eq!(*count.lock().unwrap(), 1);
        assert_eq!(channel.status(), ConnectionStatus::Disconnected);
    }

    #[test]
    fn local_source_supersedes_daemon_clicks_but_keeps_holds() {
        let mut channel = channel();
        let holds = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&holds);
        channel
            .listeners()
            .button_click_or_hold
            .on(move |ev| sink.lock().unwrap().push(ev.click_type));

        let now = Instant::now();
        channel.handle_button(
            ClickEvent::UpOrDown(ButtonEvent::new(UpOrDown::Down, false, 0)),
            now,
        );
        channel.handle_button(
            ClickEvent::ClickOrHold(ButtonEvent::new(ClickOrHold::Hold, false, 0)),
            now,
        );
        channel.handle_button(
            ClickEvent::SingleOrDoubleClickOrHold(ButtonEvent::new(
                SingleOrDoubleClickOrHold::Hold,
                false,
                0,
            )),
            now,
        );
        channel.handle_button(
            ClickEvent::ClickOrHold(ButtonEvent::new(ClickOrHold::Click, false, 0)),
            now,
        );

        assert_eq!(*holds.lock().unwrap(), vec![ClickOrHold::Hold]);
    }

    #[test]
    fn daemon_source_forwards_verbatim() {
        let mut channel = channel().with_click_source(ClickSource::Daemon);
        let singles = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&singles);
        channel
            .listeners()
            .button_single_or_double_click
            .on(move |ev| sink.lock().unwrap().push(*ev));

        let event = ButtonEvent::new(SingleOrDoubleClick::DoubleClick, true, 3);
        channel.handle_button(ClickEvent::SingleOrDoubleClick(event), Instant::now());

        assert_eq!(*singles.lock().unwrap(), vec![event]);
        assert_eq!(channel.next_deadline(), None);
    }

    #[test]
    fn pending_single_click_fires_from_timer() {
        let mut channel = channel();
        let singles = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&singles);
        channel
            .listeners()
            .button_single_or_double_click
            .on(move |ev| sink.lock().unwrap().push(ev.click_type));

        let t0 = Instant::now();
        channel.handle_button(
            ClickEvent::UpOrDown(ButtonEvent::new(UpOrDown::Down, false, 0)),
            t0,
        );
        channel.handle_button(
            ClickEvent::UpOrDown(ButtonEvent::new(UpOrDown::Up, false, 0)),
            t0 + Duration::from_millis(100),
        );
        let deadline = channel.next_deadline().expect("single click should be pending");

        channel.fire_timers(deadline);

        assert_eq!(*singles.lock().unwrap(), vec![SingleOrDoubleClick::SingleClick]);
        assert_eq!(channel.next_deadline(), None);
    }
}
