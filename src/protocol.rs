//! flicd opcodes and their field layouts.
//!
//! Both directions encode and decode, so the same module can drive a client
//! or stand in for the daemon.

use bytes::{Buf, BufMut};
use chrono::DateTime;
use num_enum::TryFromPrimitive;
use strum_macros::IntoStaticStr;
use tracing::warn;
use uuid::Uuid;

use crate::framing::{FrameDecoder, FramingError, encode_frame};
use crate::types::{
    AdvertisementPacket, BatteryListenerId, BatteryStatus, BdAddr, BdAddrType,
    BluetoothControllerState, ButtonDeleted, ButtonEvent, ButtonInfo, ChannelId, ClickOrHold,
    ClickType, ConnectionStatus, CreateConnectionChannelError, DisconnectReason, LatencyMode,
    RemovedReason, ScanWizardId, ScanWizardResult, ScannerId, ServerInfo, SingleOrDoubleClick,
    SingleOrDoubleClickOrHold, UpOrDown,
};

/// Wire value of `auto_disconnect_time` meaning "never".
pub const AUTO_DISCONNECT_DISABLED: i16 = 511;
/// Largest auto-disconnect time, in seconds, that can be requested.
pub const MAX_AUTO_DISCONNECT_TIME: u16 = 510;

const STRING_FIELD_LEN: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("framing error: {0}")]
    Framing(#[from] FramingError),
    #[error("unknown event opcode {0}")]
    UnknownEvent(u8),
    #[error("unknown command opcode {0}")]
    UnknownCommand(u8),
    #[error("{frame} frame truncated: needed {needed} bytes, {remaining} left")]
    Truncated {
        frame: &'static str,
        needed: usize,
        remaining: usize,
    },
    #[error("invalid value {value} for {field}")]
    InvalidValue { field: &'static str, value: i64 },
}

/// Requests sent from the client to the daemon.
#[derive(Debug, Clone, PartialEq, Eq, IntoStaticStr)]
pub enum Command {
    GetInfo,
    CreateScanner {
        scan_id: ScannerId,
    },
    RemoveScanner {
        scan_id: ScannerId,
    },
    CreateConnectionChannel {
        conn_id: ChannelId,
        bd_addr: BdAddr,
        latency_mode: LatencyMode,
        /// Seconds, `0` = disabled.
        auto_disconnect_time: u16,
    },
    RemoveConnectionChannel {
        conn_id: ChannelId,
    },
    ForceDisconnect {
        bd_addr: BdAddr,
    },
    ChangeModeParameters {
        conn_id: ChannelId,
        latency_mode: LatencyMode,
        /// Seconds, `0` = disabled.
        auto_disconnect_time: u16,
    },
    Ping {
        ping_id: u32,
    },
    GetButtonInfo {
        bd_addr: BdAddr,
    },
    CreateScanWizard {
        scan_wizard_id: ScanWizardId,
    },
    CancelScanWizard {
        scan_wizard_id: ScanWizardId,
    },
    DeleteButton {
        bd_addr: BdAddr,
    },
    CreateBatteryStatusListener {
        listener_id: BatteryListenerId,
        bd_addr: BdAddr,
    },
    RemoveBatteryStatusListener {
        listener_id: BatteryListenerId,
    },
}

/// Notifications and responses sent from the daemon to the client.
#[derive(Debug, Clone, PartialEq, Eq, IntoStaticStr)]
pub enum Event {
    AdvertisementPacket {
        scan_id: ScannerId,
        packet: AdvertisementPacket,
    },
    CreateConnectionChannelResponse {
        conn_id: ChannelId,
        error: CreateConnectionChannelError,
        connection_status: ConnectionStatus,
    },
    ConnectionStatusChanged {
        conn_id: ChannelId,
        connection_status: ConnectionStatus,
        disconnect_reason: DisconnectReason,
    },
    ConnectionChannelRemoved {
        conn_id: ChannelId,
        removed_reason: RemovedReason,
    },
    ButtonUpOrDown {
        conn_id: ChannelId,
        event: ButtonEvent<UpOrDown>,
    },
    ButtonClickOrHold {
        conn_id: ChannelId,
        event: ButtonEvent<ClickOrHold>,
    },
    ButtonSingleOrDoubleClick {
        conn_id: ChannelId,
        event: ButtonEvent<SingleOrDoubleClick>,
    },
    ButtonSingleOrDoubleClickOrHold {
        conn_id: ChannelId,
        event: ButtonEvent<SingleOrDoubleClickOrHold>,
    },
    NewVerifiedButton {
        bd_addr: BdAddr,
    },
    GetInfoResponse(ServerInfo),
    NoSpaceForNewConnection {
        max_concurrently_connected_buttons: u8,
    },
    GotSpaceForNewConnection {
        max_concurrently_connected_buttons: u8,
    },
    BluetoothControllerStateChange {
        state: BluetoothControllerState,
    },
    PingResponse {
        ping_id: u32,
    },
    GetButtonInfoResponse(ButtonInfo),
    ScanWizardFoundPrivateButton {
        scan_wizard_id: ScanWizardId,
    },
    ScanWizardFoundPublicButton {
        scan_wizard_id: ScanWizardId,
        bd_addr: BdAddr,
        name: String,
    },
    ScanWizardButtonConnected {
        scan_wizard_id: ScanWizardId,
    },
    ScanWizardCompleted {
        scan_wizard_id: ScanWizardId,
        result: ScanWizardResult,
    },
    ButtonDeleted(ButtonDeleted),
    BatteryStatus {
        listener_id: BatteryListenerId,
        status: BatteryStatus,
    },
}

impl Command {
    pub fn opcode(&self) -> u8 {
        match self {
            Self::GetInfo => 0,
            Self::CreateScanner { .. } => 1,
            Self::RemoveScanner { .. } => 2,
            Self::CreateConnectionChannel { .. } => 3,
            Self::RemoveConnectionChannel { .. } => 4,
            Self::ForceDisconnect { .. } => 5,
            Self::ChangeModeParameters { .. } => 6,
            Self::Ping { .. } => 7,
            Self::GetButtonInfo { .. } => 8,
            Self::CreateScanWizard { .. } => 9,
            Self::CancelScanWizard { .. } => 10,
            Self::DeleteButton { .. } => 11,
            Self::CreateBatteryStatusListener { .. } => 12,
            Self::RemoveBatteryStatusListener { .. } => 13,
        }
    }

    pub fn encode_body(&self) -> Vec<u8> {
        let mut out = vec![self.opcode()];

        match self {
            Self::GetInfo => {}
            Self::CreateScanner { scan_id } | Self::RemoveScanner { scan_id } => {
                out.put_u32_le(scan_id.get());
            }
            Self::CreateConnectionChannel {
                conn_id,
                bd_addr,
                latency_mode,
                auto_disconnect_time,
            } => {
                out.put_u32_le(conn_id.get());
                put_bd_addr(&mut out, *bd_addr);
                out.put_u8((*latency_mode).into());
                out.put_i16_le(auto_disconnect_to_wire(*auto_disconnect_time));
            }
            Self::RemoveConnectionChannel { conn_id } => out.put_u32_le(conn_id.get()),
            Self::ForceDisconnect { bd_addr }
            | Self::GetButtonInfo { bd_addr }
            | Self::DeleteButton { bd_addr } => put_bd_addr(&mut out, *bd_addr),
            Self::ChangeModeParameters {
                conn_id,
                latency_mode,
                auto_disconnect_time,
            } => {
                out.put_u32_le(conn_id.get());
                out.put_u8((*latency_mode).into());
                out.put_i16_le(auto_disconnect_to_wire(*auto_disconnect_time));
            }
            Self::Ping { ping_id } => out.put_u32_le(*ping_id),
            Self::CreateScanWizard { scan_wizard_id }
            | Self::CancelScanWizard { scan_wizard_id } => {
                out.put_u32_le(scan_wizard_id.get());
            }
            Self::CreateBatteryStatusListener {
                listener_id,
                bd_addr,
            } => {
                out.put_u32_le(listener_id.get());
                put_bd_addr(&mut out, *bd_addr);
            }
            Self::RemoveBatteryStatusListener { listener_id } => {
                out.put_u32_le(listener_id.get());
            }
        }

        out
    }

    pub fn decode(body: &[u8]) -> Result<Self, ProtocolError> {
        let mut r = FieldReader::new(body, "command");
        let opcode = r.u8()?;

        let command = match opcode {
            0 => Self::GetInfo,
            1 => Self::CreateScanner {
                scan_id: ScannerId::new(r.u32()?),
            },
            2 => Self::RemoveScanner {
                scan_id: ScannerId::new(r.u32()?),
            },
            3 => Self::CreateConnectionChannel {
                conn_id: ChannelId::new(r.u32()?),
                bd_addr: r.bd_addr()?,
                latency_mode: r.enum_u8("latency_mode")?,
                auto_disconnect_time: auto_disconnect_from_wire(r.i16()?)?,
            },
            4 => Self::RemoveConnectionChannel {
                conn_id: ChannelId::new(r.u32()?),
            },
            5 => Self::ForceDisconnect {
                bd_addr: r.bd_addr()?,
            },
            6 => Self::ChangeModeParameters {
                conn_id: ChannelId::new(r.u32()?),
                latency_mode: r.enum_u8("latency_mode")?,
                auto_disconnect_time: auto_disconnect_from_wire(r.i16()?)?,
            },
            7 => Self::Ping { ping_id: r.u32()? },
            8 => Self::GetButtonInfo {
                bd_addr: r.bd_addr()?,
            },
            9 => Self::CreateScanWizard {
                scan_wizard_id: ScanWizardId::new(r.u32()?),
            },
            10 => Self::CancelScanWizard {
                scan_wizard_id: ScanWizardId::new(r.u32()?),
            },
            11 => Self::DeleteButton {
                bd_addr: r.bd_addr()?,
            },
            12 => Self::CreateBatteryStatusListener {
                listener_id: BatteryListenerId::new(r.u32()?),
                bd_addr: r.bd_addr()?,
            },
            13 => Self::RemoveBatteryStatusListener {
                listener_id: BatteryListenerId::new(r.u32()?),
            },
            other => return Err(ProtocolError::UnknownCommand(other)),
        };

        Ok(command)
    }
}

impl Event {
    pub fn opcode(&self) -> u8 {
        match self {
            Self::AdvertisementPacket { .. } => 0,
            Self::CreateConnectionChannelResponse { .. } => 1,
            Self::ConnectionStatusChanged { .. } => 2,
            Self::ConnectionChannelRemoved { .. } => 3,
            Self::ButtonUpOrDown { .. } => 4,
            Self::ButtonClickOrHold { .. } => 5,
            Self::ButtonSingleOrDoubleClick { .. } => 6,
            Self::ButtonSingleOrDoubleClickOrHold { .. } => 7,
            Self::NewVerifiedButton { .. } => 8,
            Self::GetInfoResponse(_) => 9,
            Self::NoSpaceForNewConnection { .. } => 10,
            Self::GotSpaceForNewConnection { .. } => 11,
            Self::BluetoothControllerStateChange { .. } => 12,
            Self::PingResponse { .. } => 13,
            Self::GetButtonInfoResponse(_) => 14,
            Self::ScanWizardFoundPrivateButton { .. } => 15,
            Self::ScanWizardFoundPublicButton { .. } => 16,
            Self::ScanWizardButtonConnected { .. } => 17,
            Self::ScanWizardCompleted { .. } => 18,
            Self::ButtonDeleted(_) => 19,
            Self::BatteryStatus { .. } => 20,
        }
    }

    pub fn name(&self) -> &'static str {
        self.into()
    }

    pub fn encode_body(&self) -> Vec<u8> {
        let mut out = vec![self.opcode()];

        match self {
            Self::AdvertisementPacket { scan_id, packet } => {
                out.put_u32_le(scan_id.get());
                put_bd_addr(&mut out, packet.bd_addr);
                put_string(&mut out, &packet.name);
                out.put_i8(packet.rssi);
                out.put_u8(packet.is_private.into());
                out.put_u8(packet.already_verified.into());
                out.put_u8(packet.already_connected_to_this_device.into());
                out.put_u8(packet.already_connected_to_other_device.into());
            }
            Self::CreateConnectionChannelResponse {
                conn_id,
                error,
                connection_status,
            } => {
                out.put_u32_le(conn_id.get());
                out.put_u8((*error).into());
                out.put_u8((*connection_status).into());
            }
            Self::ConnectionStatusChanged {
                conn_id,
                connection_status,
                disconnect_reason,
            } => {
                out.put_u32_le(conn_id.get());
                out.put_u8((*connection_status).into());
                out.put_u8((*disconnect_reason).into());
            }
            Self::ConnectionChannelRemoved {
                conn_id,
                removed_reason,
            } => {
                out.put_u32_le(conn_id.get());
                out.put_u8((*removed_reason).into());
            }
            Self::ButtonUpOrDown { conn_id, event } => put_button_event(&mut out, *conn_id, event),
            Self::ButtonClickOrHold { conn_id, event } => {
                put_button_event(&mut out, *conn_id, event);
            }
            Self::ButtonSingleOrDoubleClick { conn_id, event } => {
                put_button_event(&mut out, *conn_id, event);
            }
            Self::ButtonSingleOrDoubleClickOrHold { conn_id, event } => {
                put_button_event(&mut out, *conn_id, event);
            }
            Self::NewVerifiedButton { bd_addr } => put_bd_addr(&mut out, *bd_addr),
            Self::GetInfoResponse(info) => {
                out.put_u8(info.bluetooth_controller_state.into());
                put_bd_addr(&mut out, info.my_bd_addr);
                out.put_u8(info.my_bd_addr_type.into());
                out.put_u8(info.max_pending_connections);
                out.put_i16_le(info.max_concurrently_connected_buttons);
                out.put_u8(info.current_pending_connections);
                out.put_u8(info.currently_no_space_for_new_connection.into());
                let count = u16::try_from(info.verified_buttons.len()).unwrap_or(u16::MAX);
                out.put_u16_le(count);
                for addr in info.verified_buttons.iter().take(usize::from(count)) {
                    put_bd_addr(&mut out, *addr);
                }
            }
            Self::NoSpaceForNewConnection {
                max_concurrently_connected_buttons,
            }
            | Self::GotSpaceForNewConnection {
                max_concurrently_connected_buttons,
            } => out.put_u8(*max_concurrently_connected_buttons),
            Self::BluetoothControllerStateChange { state } => out.put_u8((*state).into()),
            Self::PingResponse { ping_id } => out.put_u32_le(*ping_id),
            Self::GetButtonInfoResponse(info) => {
                put_bd_addr(&mut out, info.bd_addr);
                out.put_slice(info.uuid.unwrap_or(Uuid::nil()).as_bytes());
                put_string(&mut out, info.color.as_deref().unwrap_or_default());
                put_string(&mut out, info.serial_number.as_deref().unwrap_or_default());
                out.put_u8(info.flic_version);
                out.put_u32_le(info.firmware_version);
            }
            Self::ScanWizardFoundPrivateButton { scan_wizard_id }
            | Self::ScanWizardButtonConnected { scan_wizard_id } => {
                out.put_u32_le(scan_wizard_id.get());
            }
            Self::ScanWizardFoundPublicButton {
                scan_wizard_id,
                bd_addr,
                name,
            } => {
                out.put_u32_le(scan_wizard_id.get());
                put_bd_addr(&mut out, *bd_addr);
                put_string(&mut out, name);
            }
            Self::ScanWizardCompleted {
                scan_wizard_id,
                result,
            } => {
                out.put_u32_le(scan_wizard_id.get());
                out.put_u8((*result).into());
            }
            Self::ButtonDeleted(deleted) => {
                put_bd_addr(&mut out, deleted.bd_addr);
                out.put_u8(deleted.deleted_by_this_client.into());
            }
            Self::BatteryStatus {
                listener_id,
                status,
            } => {
                out.put_u32_le(listener_id.get());
                let percentage = status
                    .percentage
                    .and_then(|p| i8::try_from(p).ok())
                    .unwrap_or(-1);
                out.put_i8(percentage);
                out.put_i64_le(status.timestamp.timestamp());
            }
        }

        out
    }

    pub fn decode(body: &[u8]) -> Result<Self, ProtocolError> {
        let mut r = FieldReader::new(body, "event");
        let opcode = r.u8()?;

        let event = match opcode {
            0 => Self::AdvertisementPacket {
                scan_id: ScannerId::new(r.u32()?),
                packet: AdvertisementPacket {
                    bd_addr: r.bd_addr()?,
                    name: r.string()?,
                    rssi: r.i8()?,
                    is_private: r.bool()?,
                    already_verified: r.bool()?,
                    already_connected_to_this_device: r.bool()?,
                    already_connected_to_other_device: r.bool()?,
                },
            },
            1 => Self::CreateConnectionChannelResponse {
                conn_id: ChannelId::new(r.u32()?),
                error: r.enum_u8("create_connection_channel_error")?,
                connection_status: r.enum_u8("connection_status")?,
            },
            2 => Self::ConnectionStatusChanged {
                conn_id: ChannelId::new(r.u32()?),
                connection_status: r.enum_u8("connection_status")?,
                disconnect_reason: r.enum_u8("disconnect_reason")?,
            },
            3 => Self::ConnectionChannelRemoved {
                conn_id: ChannelId::new(r.u32()?),
                removed_reason: r.enum_u8("removed_reason")?,
            },
            4 => {
                let (conn_id, event) = r.button_event()?;
                Self::ButtonUpOrDown { conn_id, event }
            }
            5 => {
                let (conn_id, event) = r.button_event()?;
                Self::ButtonClickOrHold { conn_id, event }
            }
            6 => {
                let (conn_id, event) = r.button_event()?;
                Self::ButtonSingleOrDoubleClick { conn_id, event }
            }
            7 => {
                let (conn_id, event) = r.button_event()?;
                Self::ButtonSingleOrDoubleClickOrHold { conn_id, event }
            }
            8 => Self::NewVerifiedButton {
                bd_addr: r.bd_addr()?,
            },
            9 => Self::GetInfoResponse(decode_server_info(&mut r)?),
            10 => Self::NoSpaceForNewConnection {
                max_concurrently_connected_buttons: r.u8()?,
            },
            11 => Self::GotSpaceForNewConnection {
                max_concurrently_connected_buttons: r.u8()?,
            },
            12 => Self::BluetoothControllerStateChange {
                state: r.enum_u8("bluetooth_controller_state")?,
            },
            13 => Self::PingResponse { ping_id: r.u32()? },
            14 => Self::GetButtonInfoResponse(decode_button_info(&mut r)?),
            15 => Self::ScanWizardFoundPrivateButton {
                scan_wizard_id: ScanWizardId::new(r.u32()?),
            },
            16 => Self::ScanWizardFoundPublicButton {
                scan_wizard_id: ScanWizardId::new(r.u32()?),
                bd_addr: r.bd_addr()?,
                name: r.string()?,
            },
            17 => Self::ScanWizardButtonConnected {
                scan_wizard_id: ScanWizardId::new(r.u32()?),
            },
            18 => Self::ScanWizardCompleted {
                scan_wizard_id: ScanWizardId::new(r.u32()?),
                result: r.enum_u8("scan_wizard_result")?,
            },
            19 => Self::ButtonDeleted(ButtonDeleted {
                bd_addr: r.bd_addr()?,
                deleted_by_this_client: r.bool()?,
            }),
            20 => Self::BatteryStatus {
                listener_id: BatteryListenerId::new(r.u32()?),
                status: decode_battery_status(&mut r)?,
            },
            other => return Err(ProtocolError::UnknownEvent(other)),
        };

        Ok(event)
    }
}

pub fn encode_command(command: &Command) -> Result<Vec<u8>, ProtocolError> {
    Ok(encode_frame(&command.encode_body())?)
}

pub fn encode_event(event: &Event) -> Result<Vec<u8>, ProtocolError> {
    Ok(encode_frame(&event.encode_body())?)
}

pub fn decode_commands(
    decoder: &mut FrameDecoder,
    chunk: &[u8],
) -> Result<Vec<Command>, ProtocolError> {
    decoder
        .push(chunk)?
        .into_iter()
        .map(|frame| Command::decode(&frame))
        .collect()
}

pub fn decode_events(
    decoder: &mut FrameDecoder,
    chunk: &[u8],
) -> Result<Vec<Event>, ProtocolError> {
    decoder
        .push(chunk)?
        .into_iter()
        .map(|frame| Event::decode(&frame))
        .collect()
}

fn auto_disconnect_to_wire(seconds: u16) -> i16 {
    if seconds == 0 {
        return AUTO_DISCONNECT_DISABLED;
    }
    i16::try_from(seconds.min(MAX_AUTO_DISCONNECT_TIME)).unwrap_or(AUTO_DISCONNECT_DISABLED)
}

fn auto_disconnect_from_wire(raw: i16) -> Result<u16, ProtocolError> {
    match raw {
        AUTO_DISCONNECT_DISABLED => Ok(0),
        1..=510 => Ok(raw.unsigned_abs()),
        _ => Err(ProtocolError::InvalidValue {
            field: "auto_disconnect_time",
            value: raw.into(),
        }),
    }
}

fn put_bd_addr(out: &mut Vec<u8>, addr: BdAddr) {
    out.put_slice(&addr.to_wire());
}

/// Length byte followed by a zero-padded 16-byte field.
///
/// Longer values are cut at the last character boundary that fits.
fn put_string(out: &mut Vec<u8>, value: &str) {
    let mut end = value.len().min(STRING_FIELD_LEN);
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    let bytes = &value.as_bytes()[..end];
    let mut field = [0_u8; STRING_FIELD_LEN];
    field[..bytes.len()].copy_from_slice(bytes);

    out.put_u8(u8::try_from(bytes.len()).unwrap_or_default());
    out.put_slice(&field);
}

fn put_button_event<K: Copy + Into<ClickType>>(
    out: &mut Vec<u8>,
    conn_id: ChannelId,
    event: &ButtonEvent<K>,
) {
    let click_type: ClickType = event.click_type.into();
    out.put_u32_le(conn_id.get());
    out.put_u8(click_type.into());
    out.put_u8(event.was_queued.into());
    out.put_i32_le(event.time_diff);
}

fn decode_server_info(r: &mut FieldReader<'_>) -> Result<ServerInfo, ProtocolError> {
    let bluetooth_controller_state = r.enum_u8("bluetooth_controller_state")?;
    let my_bd_addr = r.bd_addr()?;
    let my_bd_addr_type: BdAddrType = r.enum_u8("bd_addr_type")?;
    let max_pending_connections = r.u8()?;
    let max_concurrently_connected_buttons = r.i16()?;
    let current_pending_connections = r.u8()?;
    let currently_no_space_for_new_connection = r.bool()?;
    let count = r.u16()?;
    let verified_buttons = (0..count)
        .map(|_| r.bd_addr())
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ServerInfo {
        bluetooth_controller_state,
        my_bd_addr,
        my_bd_addr_type,
        max_pending_connections,
        max_concurrently_connected_buttons,
        current_pending_connections,
        currently_no_space_for_new_connection,
        verified_buttons,
    })
}

fn decode_button_info(r: &mut FieldReader<'_>) -> Result<ButtonInfo, ProtocolError> {
    let bd_addr = r.bd_addr()?;
    let uuid = Uuid::from_bytes(r.array::<16>()?);
    let color = r.string()?;
    let serial_number = r.string()?;

    Ok(ButtonInfo {
        bd_addr,
        uuid: (!uuid.is_nil()).then_some(uuid),
        color: (!color.is_empty()).then_some(color),
        serial_number: (!serial_number.is_empty()).then_some(serial_number),
        flic_version: r.u8()?,
        firmware_version: r.u32()?,
    })
}

fn decode_battery_status(r: &mut FieldReader<'_>) -> Result<BatteryStatus, ProtocolError> {
    let raw_percentage = r.i8()?;
    // Negative means the daemon has no reading; anything else is passed through.
    let percentage = u8::try_from(raw_percentage).ok();

    let seconds = r.i64()?;
    let timestamp = DateTime::from_timestamp(seconds, 0).unwrap_or_else(|| {
        warn!(seconds, "battery timestamp out of range; using the epoch");
        DateTime::default()
    });

    Ok(BatteryStatus {
        percentage,
        timestamp,
    })
}

/// Bounds-checked little-endian field access over a frame body.
struct FieldReader<'a> {
    buf: &'a [u8],
    frame: &'static str,
}

impl<'a> FieldReader<'a> {
    fn new(buf: &'a [u8], frame: &'static str) -> Self {
        Self { buf, frame }
    }

    fn need(&self, needed: usize) -> Result<(), ProtocolError> {
        if self.buf.remaining() < needed {
            return Err(ProtocolError::Truncated {
                frame: self.frame,
                needed,
                remaining: self.buf.remaining(),
            });
        }
        Ok(())
    }

    fn u8(&mut self) -> Result<u8, ProtocolError> {
        self.need(1)?;
        Ok(self.buf.get_u8())
    }

    fn i8(&mut self) -> Result<i8, ProtocolError> {
        self.need(1)?;
        Ok(self.buf.get_i8())
    }

    fn bool(&mut self) -> Result<bool, ProtocolError> {
        Ok(self.u8()? != 0)
    }

    fn u16(&mut self) -> Result<u16, ProtocolError> {
        self.need(2)?;
        Ok(self.buf.get_u16_le())
    }

    fn i16(&mut self) -> Result<i16, ProtocolError> {
        self.need(2)?;
        Ok(self.buf.get_i16_le())
    }

    fn u32(&mut self) -> Result<u32, ProtocolError> {
        self.need(4)?;
        Ok(self.buf.get_u32_le())
    }

    fn i32(&mut self) -> Result<i32, ProtocolError> {
        self.need(4)?;
        Ok(self.buf.get_i32_le())
    }

    fn i64(&mut self) -> Result<i64, ProtocolError> {
        self.need(8)?;
        Ok(self.buf.get_i64_le())
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], ProtocolError> {
        self.need(N)?;
        let mut out = [0_u8; N];
        self.buf.copy_to_slice(&mut out);
        Ok(out)
    }

    fn bd_addr(&mut self) -> Result<BdAddr, ProtocolError> {
        Ok(BdAddr::from_wire(self.array::<6>()?))
    }

    fn string(&mut self) -> Result<String, ProtocolError> {
        let len = usize::from(self.u8()?).min(STRING_FIELD_LEN);
        let field = self.array::<STRING_FIELD_LEN>()?;
        Ok(String::from_utf8_lossy(&field[..len]).into_owned())
    }

    fn enum_u8<E>(&mut self, field: &'static str) -> Result<E, ProtocolError>
    where
        E: TryFromPrimitive<Primitive = u8>,
    {
        let raw = self.u8()?;
        E::try_from_primitive(raw).map_err(|_| ProtocolError::InvalidValue {
            field,
            value: raw.into(),
        })
    }

    fn button_event<K>(&mut self) -> Result<(ChannelId, ButtonEvent<K>), ProtocolError>
    where
        K: TryFrom<ClickType>,
    {
        let conn_id = ChannelId::new(self.u32()?);
        let click_type: ClickType = self.enum_u8("click_type")?;
        let click_type = K::try_from(click_type).map_err(|_| ProtocolError::InvalidValue {
            field: "click_type",
            value: u8::from(click_type).into(),
        })?;
        let was_queued = self.bool()?;
        let time_diff = self.i32()?;

        Ok((conn_id, ButtonEvent::new(click_type, was_queued, time_diff)))
    }
}
