use std::io;
use std::time::{Duration, Instant};

use tracing::{debug, error, trace, warn};

use crate::battery::BatteryStatusListener;
use crate::channel::ConnectionChannel;
use crate::click::{ClickEvent, DEFAULT_DOUBLE_CLICK_WINDOW};
use crate::framing::FrameDecoder;
use crate::listeners::Listeners;
use crate::protocol::{
    Command, Event, MAX_AUTO_DISCONNECT_TIME, ProtocolError, decode_events, encode_command,
};
use crate::registry::{IdAllocator, PendingRequests, Registry, RequestId};
use crate::scanner::{ScanWizard, Scanner};
use crate::transport::Transport;
#[cfg(feature = "tcp")]
use crate::transport::tcp::TcpTransport;
use crate::types::{
    BatteryListenerId, BdAddr, BluetoothControllerState, ButtonDeleted, ButtonInfo, ChannelId,
    Closed, LatencyMode, ScanWizardId, ScannerId, ServerInfo,
};

pub const DEFAULT_PORT: u16 = 5551;
pub const DEFAULT_READ_BUFFER_SIZE: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    pub port: u16,
    pub read_buffer_size: usize,
    pub double_click_window: Duration,
    /// Bound on establishing the TCP connection; `None` leaves it to the OS.
    pub connect_timeout: Option<Duration>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            double_click_window: DEFAULT_DOUBLE_CLICK_WINDOW,
            connect_timeout: None,
        }
    }
}

impl ClientOptions {
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size;
        self
    }

    pub fn with_double_click_window(mut self, window: Duration) -> Self {
        self.double_click_window = window;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("client is closed")]
    Closed,
    #[error("{handle} is not registered with this client")]
    NotRegistered { handle: String },
    #[error("auto-disconnect time {0}s is out of range; expected 0..=510")]
    InvalidAutoDisconnectTime(u16),
}

impl ClientError {
    fn not_registered(handle: impl std::fmt::Display) -> Self {
        Self::NotRegistered {
            handle: handle.to_string(),
        }
    }
}

#[derive(Debug, Default)]
pub struct ClientListeners {
    /// First turn of the event loop.
    pub ready: Listeners<()>,
    pub close: Listeners<Closed>,
    /// The fatal error that is about to close the client.
    pub error: Listeners<ClientError>,
    pub new_verified_button: Listeners<BdAddr>,
    /// Carries the controller's concurrent connection limit.
    pub no_space_for_new_connection: Listeners<u8>,
    pub got_space_for_new_connection: Listeners<u8>,
    pub bluetooth_controller_state: Listeners<BluetoothControllerState>,
    pub button_deleted: Listeners<ButtonDeleted>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Session {
    Open { started: bool },
    Closed,
}

/// Connection to one flicd daemon and everything registered over it.
///
/// Nothing happens in the background: requests are written immediately, and
/// responses and events are only read and dispatched while the owner drives
/// [`FlicClient::run`] or [`FlicClient::poll`].
pub struct FlicClient<T> {
    io: T,
    options: ClientOptions,
    session: Session,
    decoder: FrameDecoder,
    read_buffer: Vec<u8>,
    request_ids: IdAllocator,
    handles: IdAllocator,
    channels: Registry<ChannelId, ConnectionChannel>,
    pending_channels: Registry<ChannelId, ConnectionChannel>,
    scanners: Registry<ScannerId, Scanner>,
    wizards: Registry<ScanWizardId, ScanWizard>,
    battery_listeners: Registry<BatteryListenerId, BatteryStatusListener>,
    info_requests: PendingRequests<ServerInfo>,
    button_info_requests: PendingRequests<ButtonInfo>,
    pings: PendingRequests<Instant>,
    listeners: ClientListeners,
}

impl<T: Transport> FlicClient<T> {
    pub fn new(io: T) -> Self {
        Self::with_options(io, ClientOptions::default())
    }

    pub fn with_options(io: T, options: ClientOptions) -> Self {
        Self {
            io,
            session: Session::Open { started: false },
            decoder: FrameDecoder::new(),
            read_buffer: vec![0; options.read_buffer_size.max(1)],
            options,
            request_ids: IdAllocator::new(),
            handles: IdAllocator::new(),
            channels: Registry::new(),
            pending_channels: Registry::new(),
            scanners: Registry::new(),
            wizards: Registry::new(),
            battery_listeners: Registry::new(),
            info_requests: PendingRequests::new("get_info"),
            button_info_requests: PendingRequests::new("get_button_info"),
            pings: PendingRequests::new("ping"),
            listeners: ClientListeners::default(),
        }
    }

    pub fn into_inner(self) -> T {
        self.io
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub fn is_closed(&self) -> bool {
        self.session == Session::Closed
    }

    pub fn listeners(&mut self) -> &mut ClientListeners {
        &mut self.listeners
    }

    pub fn add_scanner(&mut self, mut scanner: Scanner) -> Result<ScannerId, ClientError> {
        self.ensure_open()?;
        let scan_id = ScannerId::new(self.handles.allocate());
        self.send(&Command::CreateScanner { scan_id })?;

        scanner.activate();
        self.scanners.bind(scan_id, scanner);
        debug!(%scan_id, "scanner added");
        Ok(scan_id)
    }

    pub fn remove_scanner(&mut self, scan_id: ScannerId) -> Result<Scanner, ClientError> {
        self.ensure_open()?;
        let mut scanner = self
            .scanners
            .unbind(scan_id)
            .ok_or_else(|| ClientError::not_registered(scan_id))?;
        scanner.deactivate();
        self.send(&Command::RemoveScanner { scan_id })?;
        Ok(scanner)
    }

    pub fn add_scan_wizard(&mut self, mut wizard: ScanWizard) -> Result<ScanWizardId, ClientError> {
        self.ensure_open()?;
        let scan_wizard_id = ScanWizardId::new(self.handles.allocate());
        self.send(&Command::CreateScanWizard { scan_wizard_id })?;

        wizard.start();
        self.wizards.bind(scan_wizard_id, wizard);
        debug!(%scan_wizard_id, "scan wizard started");
        Ok(scan_wizard_id)
    }

    /// Stops the wizard. Its completion, which the daemon still sends, is not
    /// delivered.
    pub fn cancel_scan_wizard(
        &mut self,
        scan_wizard_id: ScanWizardId,
    ) -> Result<ScanWizard, ClientError> {
        self.ensure_open()?;
        let mut wizard = self
            .wizards
            .unbind(scan_wizard_id)
            .ok_or_else(|| ClientError::not_registered(scan_wizard_id))?;
        wizard.cancel();
        self.send(&Command::CancelScanWizard { scan_wizard_id })?;
        Ok(wizard)
    }

    /// Asks the daemon to open a channel to the channel's button.
    ///
    /// The channel's `create_response` listeners learn the outcome. When the
    /// daemon refuses, the channel is dropped without ever being bound.
    pub fn add_connection_channel(
        &mut self,
        mut channel: ConnectionChannel,
    ) -> Result<ChannelId, ClientError> {
        self.ensure_open()?;
        check_auto_disconnect_time(channel.auto_disconnect_time())?;

        let conn_id = ChannelId::new(self.handles.allocate());
        self.send(&Command::CreateConnectionChannel {
            conn_id,
            bd_addr: channel.bd_addr(),
            latency_mode: channel.latency_mode(),
            auto_disconnect_time: channel.auto_disconnect_time(),
        })?;

        channel.attach(self.options.double_click_window);
        debug!(%conn_id, bd_addr = %channel.bd_addr(), "connection channel requested");
        self.pending_channels.bind(conn_id, channel);
        Ok(conn_id)
    }

    /// Unbinds the channel right away; frames for it still in flight are dropped.
    pub fn remove_connection_channel(
        &mut self,
        conn_id: ChannelId,
    ) -> Result<ConnectionChannel, ClientError> {
        self.ensure_open()?;
        let mut channel = self
            .channels
            .unbind(conn_id)
            .or_else(|| self.pending_channels.unbind(conn_id))
            .ok_or_else(|| ClientError::not_registered(conn_id))?;
        channel.detach();
        self.send(&Command::RemoveConnectionChannel { conn_id })?;
        Ok(channel)
    }

    pub fn set_latency_mode(
        &mut self,
        conn_id: ChannelId,
        latency_mode: LatencyMode,
    ) -> Result<(), ClientError> {
        let auto_disconnect_time = self.channel_or_err(conn_id)?.auto_disconnect_time();
        self.change_mode_parameters(conn_id, latency_mode, auto_disconnect_time)
    }

    /// `0` disables the timeout.
    pub fn set_auto_disconnect_time(
        &mut self,
        conn_id: ChannelId,
        seconds: u16,
    ) -> Result<(), ClientError> {
        check_auto_disconnect_time(seconds)?;
        let latency_mode = self.channel_or_err(conn_id)?.latency_mode();
        self.change_mode_parameters(conn_id, latency_mode, seconds)
    }

    pub fn add_battery_status_listener(
        &mut self,
        mut listener: BatteryStatusListener,
    ) -> Result<BatteryListenerId, ClientError> {
        self.ensure_open()?;
        let listener_id = BatteryListenerId::new(self.handles.allocate());
        self.send(&Command::CreateBatteryStatusListener {
            listener_id,
            bd_addr: listener.bd_addr(),
        })?;

        listener.activate();
        self.battery_listeners.bind(listener_id, listener);
        Ok(listener_id)
    }

    pub fn remove_battery_status_listener(
        &mut self,
        listener_id: BatteryListenerId,
    ) -> Result<BatteryStatusListener, ClientError> {
        self.ensure_open()?;
        let mut listener = self
            .battery_listeners
            .unbind(listener_id)
            .ok_or_else(|| ClientError::not_registered(listener_id))?;
        listener.deactivate();
        self.send(&Command::RemoveBatteryStatusListener { listener_id })?;
        Ok(listener)
    }

    /// Requests the daemon's state; `callback` runs when the answer is dispatched.
    pub fn get_info(
        &mut self,
        callback: impl FnOnce(&ServerInfo) + Send + 'static,
    ) -> Result<RequestId, ClientError> {
        self.ensure_open()?;
        self.send(&Command::GetInfo)?;
        let id = self.request_ids.allocate();
        self.info_requests.await_response(id, callback);
        Ok(id)
    }

    pub fn get_button_info(
        &mut self,
        bd_addr: BdAddr,
        callback: impl FnOnce(&ButtonInfo) + Send + 'static,
    ) -> Result<RequestId, ClientError> {
        self.ensure_open()?;
        self.send(&Command::GetButtonInfo { bd_addr })?;
        let id = self.request_ids.allocate();
        self.button_info_requests.await_response(id, callback);
        Ok(id)
    }

    /// Round-trip check; `callback` receives the measured latency.
    pub fn ping(
        &mut self,
        callback: impl FnOnce(Duration) + Send + 'static,
    ) -> Result<RequestId, ClientError> {
        self.ensure_open()?;
        let ping_id = self.request_ids.allocate();
        self.send(&Command::Ping { ping_id })?;
        let sent = Instant::now();
        self.pings
            .await_response(ping_id, move |received: &Instant| {
                callback(received.saturating_duration_since(sent));
            });
        Ok(ping_id)
    }

    /// Removes the button from the daemon's verified list.
    ///
    /// Channels to it, from any client, are removed with
    /// [`crate::RemovedReason::DeletedByThisClient`] or
    /// [`crate::RemovedReason::DeletedByOtherClient`].
    pub fn delete_button(&mut self, bd_addr: BdAddr) -> Result<(), ClientError> {
        self.ensure_open()?;
        self.send(&Command::DeleteButton { bd_addr })
    }

    /// Disconnects the button and removes every client's channel to it.
    pub fn force_disconnect(&mut self, bd_addr: BdAddr) -> Result<(), ClientError> {
        self.ensure_open()?;
        self.send(&Command::ForceDisconnect { bd_addr })
    }

    pub fn close(&mut self) -> Result<(), ClientError> {
        self.ensure_open()?;
        debug!("closing flicd session");
        if let Err(err) = self.io.shutdown() {
            debug!(%err, "transport shutdown failed");
        }
        self.teardown(false);
        Ok(())
    }

    /// Drives the event loop until the session ends.
    ///
    /// Returns `Ok` after [`FlicClient::close`] or a clean end of stream, and
    /// the fatal error otherwise.
    pub fn run(&mut self) -> Result<(), ClientError> {
        while !self.is_closed() {
            self.poll(None)?;
        }
        Ok(())
    }

    /// One bounded turn of the event loop.
    ///
    /// Waits at most `timeout` (forever for `None`) for data, shortened so a
    /// pending double-click decision is never late, then dispatches whatever
    /// arrived and fires due click timers.
    pub fn poll(&mut self, timeout: Option<Duration>) -> Result<(), ClientError> {
        self.ensure_open()?;

        if let Session::Open { started: false } = self.session {
            self.session = Session::Open { started: true };
            self.listeners.ready.emit(&());
        }

        let wait = self.read_wait(timeout, Instant::now());
        if let Err(err) = self.io.set_read_timeout(wait) {
            return Err(self.fail(err.into()));
        }

        match self.io.read(&mut self.read_buffer) {
            Ok(0) => {
                debug!("flicd closed the connection");
                self.teardown(false);
                return Ok(());
            }
            Ok(read) => {
                trace!(bytes = read, "read from flicd");
                let events = match decode_events(&mut self.decoder, &self.read_buffer[..read]) {
                    Ok(events) => events,
                    Err(err) => return Err(self.fail(err.into())),
                };
                for event in events {
                    self.dispatch(event, Instant::now());
                }
            }
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut | io::ErrorKind::Interrupted
                ) => {}
            Err(err) => return Err(self.fail(err.into())),
        }

        self.fire_timers(Instant::now());
        Ok(())
    }

    pub fn channel(&self, conn_id: ChannelId) -> Option<&ConnectionChannel> {
        self.channels
            .lookup(conn_id)
            .or_else(|| self.pending_channels.lookup(conn_id))
    }

    pub fn channel_mut(&mut self, conn_id: ChannelId) -> Option<&mut ConnectionChannel> {
        if self.channels.contains(conn_id) {
            return self.channels.lookup_mut(conn_id);
        }
        self.pending_channels.lookup_mut(conn_id)
    }

    pub fn scanner(&self, scan_id: ScannerId) -> Option<&Scanner> {
        self.scanners.lookup(scan_id)
    }

    pub fn scanner_mut(&mut self, scan_id: ScannerId) -> Option<&mut Scanner> {
        self.scanners.lookup_mut(scan_id)
    }

    pub fn scan_wizard(&self, scan_wizard_id: ScanWizardId) -> Option<&ScanWizard> {
        self.wizards.lookup(scan_wizard_id)
    }

    pub fn scan_wizard_mut(&mut self, scan_wizard_id: ScanWizardId) -> Option<&mut ScanWizard> {
        self.wizards.lookup_mut(scan_wizard_id)
    }

    pub fn battery_listener(
        &self,
        listener_id: BatteryListenerId,
    ) -> Option<&BatteryStatusListener> {
        self.battery_listeners.lookup(listener_id)
    }

    pub fn battery_listener_mut(
        &mut self,
        listener_id: BatteryListenerId,
    ) -> Option<&mut BatteryStatusListener> {
        self.battery_listeners.lookup_mut(listener_id)
    }

    pub(crate) fn fire_timers(&mut self, now: Instant) {
        if self.channels.is_empty() {
            return;
        }
        for (_, channel) in self.channels.iter_mut() {
            channel.fire_timers(now);
        }
    }

    fn read_wait(&self, timeout: Option<Duration>, now: Instant) -> Option<Duration> {
        let until_deadline = self
            .channels
            .iter()
            .filter_map(|(_, channel)| channel.next_deadline())
            .min()
            .map(|deadline| deadline.saturating_duration_since(now));

        let wait = match (timeout, until_deadline) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        wait.map(|w| w.max(Duration::from_millis(1)))
    }

    fn change_mode_parameters(
        &mut self,
        conn_id: ChannelId,
        latency_mode: LatencyMode,
        auto_disconnect_time: u16,
    ) -> Result<(), ClientError> {
        self.send(&Command::ChangeModeParameters {
            conn_id,
            latency_mode,
            auto_disconnect_time,
        })?;
        if let Some(channel) = self.channel_mut(conn_id) {
            channel.set_mode_parameters(latency_mode, auto_disconnect_time);
        }
        Ok(())
    }

    fn channel_or_err(&self, conn_id: ChannelId) -> Result<&ConnectionChannel, ClientError> {
        self.ensure_open()?;
        self.channel(conn_id)
            .ok_or_else(|| ClientError::not_registered(conn_id))
    }

    fn ensure_open(&self) -> Result<(), ClientError> {
        match self.session {
            Session::Open { .. } => Ok(()),
            Session::Closed => Err(ClientError::Closed),
        }
    }

    fn send(&mut self, command: &Command) -> Result<(), ClientError> {
        let name: &'static str = command.into();
        let frame = match encode_command(command) {
            Ok(frame) => frame,
            Err(err) => return Err(self.fail(err.into())),
        };
        trace!(command = name, bytes = frame.len(), "sending to flicd");

        let written = self.io.write_all(&frame).and_then(|()| self.io.flush());
        written.map_err(|err| self.fail(err.into()))
    }

    fn dispatch(&mut self, event: Event, now: Instant) {
        trace!(event = event.name(), "dispatching");

        match event {
            Event::AdvertisementPacket { scan_id, packet } => {
                if let Some(scanner) = self.scanners.lookup_mut(scan_id) {
                    scanner.handle_advertisement(&packet);
                }
            }
            Event::CreateConnectionChannelResponse {
                conn_id,
                error,
                connection_status,
            } => {
                let Some(mut channel) = self.pending_channels.unbind(conn_id) else {
                    debug!(%conn_id, "create response for a channel that is no longer pending");
                    return;
                };
                if channel.apply_create_response(error, connection_status) {
                    debug!(%conn_id, %connection_status, "connection channel bound");
                    self.channels.bind(conn_id, channel);
                } else {
                    debug!(%conn_id, %error, "connection channel refused");
                }
            }
            Event::ConnectionStatusChanged {
                conn_id,
                connection_status,
                disconnect_reason,
            } => {
                if let Some(channel) = self.channels.lookup_mut(conn_id) {
                    channel.apply_status(connection_status, disconnect_reason);
                }
            }
            Event::ConnectionChannelRemoved {
                conn_id,
                removed_reason,
            } => match self.channels.unbind(conn_id) {
                Some(mut channel) => channel.apply_removed(removed_reason),
                None => debug!(%conn_id, %removed_reason, "channel already removed locally"),
            },
            Event::ButtonUpOrDown { conn_id, event } => {
                self.button(conn_id, ClickEvent::UpOrDown(event), now);
            }
            Event::ButtonClickOrHold { conn_id, event } => {
                self.button(conn_id, ClickEvent::ClickOrHold(event), now);
            }
            Event::ButtonSingleOrDoubleClick { conn_id, event } => {
                self.button(conn_id, ClickEvent::SingleOrDoubleClick(event), now);
            }
            Event::ButtonSingleOrDoubleClickOrHold { conn_id, event } => {
                self.button(conn_id, ClickEvent::SingleOrDoubleClickOrHold(event), now);
            }
            Event::NewVerifiedButton { bd_addr } => {
                self.listeners.new_verified_button.emit(&bd_addr);
            }
            Event::GetInfoResponse(info) => {
                self.info_requests.resolve_next(&info);
            }
            Event::NoSpaceForNewConnection {
                max_concurrently_connected_buttons,
            } => self
                .listeners
                .no_space_for_new_connection
                .emit(&max_concurrently_connected_buttons),
            Event::GotSpaceForNewConnection {
                max_concurrently_connected_buttons,
            } => self
                .listeners
                .got_space_for_new_connection
                .emit(&max_concurrently_connected_buttons),
            Event::BluetoothControllerStateChange { state } => {
                debug!(%state, "bluetooth controller state changed");
                self.listeners.bluetooth_controller_state.emit(&state);
            }
            Event::PingResponse { ping_id } => {
                self.pings.resolve(ping_id, &now);
            }
            Event::GetButtonInfoResponse(info) => {
                self.button_info_requests.resolve_next(&info);
            }
            Event::ScanWizardFoundPrivateButton { scan_wizard_id } => {
                if let Some(wizard) = self.wizards.lookup_mut(scan_wizard_id) {
                    wizard.handle_found_private();
                }
            }
            Event::ScanWizardFoundPublicButton {
                scan_wizard_id,
                bd_addr,
                name,
            } => {
                if let Some(wizard) = self.wizards.lookup_mut(scan_wizard_id) {
                    wizard.handle_found_public(bd_addr, name);
                }
            }
            Event::ScanWizardButtonConnected { scan_wizard_id } => {
                if let Some(wizard) = self.wizards.lookup_mut(scan_wizard_id) {
                    wizard.handle_button_connected();
                }
            }
            Event::ScanWizardCompleted {
                scan_wizard_id,
                result,
            } => match self.wizards.unbind(scan_wizard_id) {
                Some(mut wizard) => wizard.handle_completed(result),
                None => debug!(%scan_wizard_id, %result, "completion for unbound scan wizard"),
            },
            Event::ButtonDeleted(deleted) => self.listeners.button_deleted.emit(&deleted),
            Event::BatteryStatus {
                listener_id,
                status,
            } => {
                if let Some(listener) = self.battery_listeners.lookup_mut(listener_id) {
                    listener.handle_status(status);
                }
            }
        }
    }

    fn button(&mut self, conn_id: ChannelId, event: ClickEvent, now: Instant) {
        if let Some(channel) = self.channels.lookup_mut(conn_id) {
            channel.handle_button(event, now);
        }
    }

    /// Closes the session on a fatal error and hands the error back for the caller.
    fn fail(&mut self, err: ClientError) -> ClientError {
        error!(%err, "flicd session failed");
        self.listeners.error.emit(&err);
        if let Err(shutdown) = self.io.shutdown() {
            debug!(err = %shutdown, "transport shutdown failed");
        }
        self.teardown(true);
        err
    }

    fn teardown(&mut self, had_error: bool) {
        if self.is_closed() {
            return;
        }
        self.session = Session::Closed;
        debug!(
            had_error,
            channels = self.channels.len() + self.pending_channels.len(),
            scanners = self.scanners.len(),
            wizards = self.wizards.len(),
            battery_listeners = self.battery_listeners.len(),
            "tearing down flicd session"
        );

        let dropped = self.info_requests.clear()
            + self.button_info_requests.clear()
            + self.pings.clear();
        if dropped > 0 {
            warn!(dropped, "closing with unanswered requests");
        }

        let closed = Closed { had_error };
        for (_, mut channel) in self.channels.drain() {
            channel.apply_closed(closed);
        }
        for (_, mut channel) in self.pending_channels.drain() {
            channel.apply_closed(closed);
        }
        for (_, mut scanner) in self.scanners.drain() {
            scanner.apply_closed(closed);
        }
        for (_, mut wizard) in self.wizards.drain() {
            wizard.apply_closed(closed);
        }
        for (_, mut listener) in self.battery_listeners.drain() {
            listener.apply_closed(closed);
        }

        self.listeners.close.emit(&closed);
    }
}

fn check_auto_disconnect_time(seconds: u16) -> Result<(), ClientError> {
    if seconds > MAX_AUTO_DISCONNECT_TIME {
        return Err(ClientError::InvalidAutoDisconnectTime(seconds));
    }
    Ok(())
}

#[cfg(feature = "tcp")]
impl FlicClient<TcpTransport> {
    /// Connects to flicd at `host:port`.
    ///
    /// flicd listens on [`DEFAULT_PORT`] unless configured otherwise.
    pub fn connect(host: &str, port: u16) -> Result<Self, ClientError> {
        Self::connect_with_options(host, ClientOptions::default().with_port(port))
    }

    pub fn connect_with_options(host: &str, options: ClientOptions) -> Result<Self, ClientError> {
        let transport = TcpTransport::connect_with(host, options.port, options.connect_timeout)?;
        debug!(peer = %transport.peer_addr(), "connected to flicd");
        Ok(Self::with_options(transport, options))
    }
}
