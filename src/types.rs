//! Protocol value types shared by the codec, the components and the client.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};
use uuid::Uuid;

/// Bluetooth device address of a Flic button or of the daemon's controller.
///
/// Stored most-significant byte first, which is also the textual order
/// (`08:09:0a:0b:0c:0d`). The wire carries the bytes reversed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct BdAddr([u8; 6]);

impl BdAddr {
    pub const fn new(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    pub const fn octets(self) -> [u8; 6] {
        self.0
    }

    pub(crate) fn from_wire(mut bytes: [u8; 6]) -> Self {
        bytes.reverse();
        Self(bytes)
    }

    pub(crate) fn to_wire(self) -> [u8; 6] {
        let mut bytes = self.0;
        bytes.reverse();
        bytes
    }
}

impl fmt::Display for BdAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid bluetooth address `{0}`; expected six colon-separated hex octets")]
pub struct BdAddrParseError(String);

impl FromStr for BdAddr {
    type Err = BdAddrParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || BdAddrParseError(s.to_string());
        let mut octets = [0_u8; 6];
        let mut parts = s.split(':');

        for octet in &mut octets {
            let part = parts.next().ok_or_else(invalid)?;
            if part.len() != 2 {
                return Err(invalid());
            }
            *octet = u8::from_str_radix(part, 16).map_err(|_| invalid())?;
        }

        if parts.next().is_some() {
            return Err(invalid());
        }

        Ok(Self(octets))
    }
}

macro_rules! handle_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl $name {
            pub const fn new(raw: u32) -> Self {
                Self(raw)
            }

            pub const fn get(self) -> u32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "#{}"), self.0)
            }
        }
    };
}

handle_id!(
    /// Handle of a connection channel (`conn_id` on the wire).
    ChannelId,
    "channel"
);
handle_id!(
    /// Handle of a raw advertisement scanner (`scan_id` on the wire).
    ScannerId,
    "scanner"
);
handle_id!(
    /// Handle of a scan wizard (`scan_wizard_id` on the wire).
    ScanWizardId,
    "scan-wizard"
);
handle_id!(
    /// Handle of a battery status listener (`listener_id` on the wire).
    BatteryListenerId,
    "battery-listener"
);

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    TryFromPrimitive,
    IntoPrimitive,
    Display,
    EnumString,
    IntoStaticStr,
    EnumIter,
)]
#[repr(u8)]
pub enum LatencyMode {
    #[strum(serialize = "NormalLatency")]
    Normal = 0,
    #[strum(serialize = "LowLatency")]
    Low = 1,
    #[strum(serialize = "HighLatency")]
    High = 2,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    TryFromPrimitive,
    IntoPrimitive,
    Display,
    EnumString,
    IntoStaticStr,
    EnumIter,
)]
#[repr(u8)]
pub enum ConnectionStatus {
    Disconnected = 0,
    Connected = 1,
    Ready = 2,
}

// Written out by hand: num_enum reads a `#[default]` variant as the catch-all
// for unknown bytes.
impl Default for LatencyMode {
    fn default() -> Self {
        Self::Normal
    }
}

impl Default for ConnectionStatus {
    fn default() -> Self {
        Self::Disconnected
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    TryFromPrimitive,
    IntoPrimitive,
    Display,
    EnumString,
    IntoStaticStr,
    EnumIter,
)]
#[repr(u8)]
pub enum CreateConnectionChannelError {
    NoError = 0,
    MaxPendingConnectionsReached = 1,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    TryFromPrimitive,
    IntoPrimitive,
    Display,
    EnumString,
    IntoStaticStr,
    EnumIter,
)]
#[repr(u8)]
pub enum DisconnectReason {
    Unspecified = 0,
    ConnectionEstablishmentFailed = 1,
    TimedOut = 2,
    BondingKeysMismatch = 3,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    TryFromPrimitive,
    IntoPrimitive,
    Display,
    EnumString,
    IntoStaticStr,
    EnumIter,
)]
#[repr(u8)]
pub enum RemovedReason {
    RemovedByThisClient = 0,
    ForceDisconnectedByThisClient = 1,
    ForceDisconnectedByOtherClient = 2,
    ButtonIsPrivate = 3,
    VerifyTimeout = 4,
    InternetBackendError = 5,
    InvalidData = 6,
    CouldntLoadDevice = 7,
    DeletedByThisClient = 8,
    DeletedByOtherClient = 9,
    ButtonBelongsToOtherPartner = 10,
    DeletedFromButton = 11,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    TryFromPrimitive,
    IntoPrimitive,
    Display,
    EnumString,
    IntoStaticStr,
    EnumIter,
)]
#[repr(u8)]
pub enum BdAddrType {
    #[strum(serialize = "PublicBdAddrType")]
    Public = 0,
    #[strum(serialize = "RandomBdAddrType")]
    Random = 1,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    TryFromPrimitive,
    IntoPrimitive,
    Display,
    EnumString,
    IntoStaticStr,
    EnumIter,
)]
#[repr(u8)]
pub enum ScanWizardResult {
    #[strum(serialize = "WizardSuccess")]
    Success = 0,
    #[strum(serialize = "WizardCancelledByUser")]
    CancelledByUser = 1,
    #[strum(serialize = "WizardFailedTimeout")]
    FailedTimeout = 2,
    #[strum(serialize = "WizardButtonIsPrivate")]
    ButtonIsPrivate = 3,
    #[strum(serialize = "WizardBluetoothUnavailable")]
    BluetoothUnavailable = 4,
    #[strum(serialize = "WizardInternetBackendError")]
    InternetBackendError = 5,
    #[strum(serialize = "WizardInvalidData")]
    InvalidData = 6,
    #[strum(serialize = "WizardButtonBelongsToOtherPartner")]
    ButtonBelongsToOtherPartner = 7,
    #[strum(serialize = "WizardButtonAlreadyConnectedToOtherDevice")]
    ButtonAlreadyConnectedToOtherDevice = 8,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    TryFromPrimitive,
    IntoPrimitive,
    Display,
    EnumString,
    IntoStaticStr,
    EnumIter,
)]
#[repr(u8)]
pub enum BluetoothControllerState {
    Detached = 0,
    Resetting = 1,
    Attached = 2,
}

/// Every click type the daemon can put in a button event.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    TryFromPrimitive,
    IntoPrimitive,
    Display,
    EnumString,
    IntoStaticStr,
    EnumIter,
)]
#[repr(u8)]
pub enum ClickType {
    #[strum(serialize = "ButtonDown")]
    Down = 0,
    #[strum(serialize = "ButtonUp")]
    Up = 1,
    #[strum(serialize = "ButtonClick")]
    Click = 2,
    #[strum(serialize = "ButtonSingleClick")]
    SingleClick = 3,
    #[strum(serialize = "ButtonDoubleClick")]
    DoubleClick = 4,
    #[strum(serialize = "ButtonHold")]
    Hold = 5,
}

/// Click-type subset carried by one event family.
///
/// Fails with the offending [`ClickType`] when it does not belong to the family.
macro_rules! click_family {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $serialized:tt),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr, EnumIter,
        )]
        pub enum $name {
            $(
                #[strum(serialize = $serialized)]
                $variant,
            )+
        }

        impl From<$name> for ClickType {
            fn from(value: $name) -> Self {
                match value {
                    $($name::$variant => ClickType::$variant,)+
                }
            }
        }

        impl TryFrom<ClickType> for $name {
            type Error = ClickType;

            fn try_from(value: ClickType) -> Result<Self, Self::Error> {
                match value {
                    $(ClickType::$variant => Ok(Self::$variant),)+
                    #[allow(unreachable_patterns)]
                    other => Err(other),
                }
            }
        }
    };
}

click_family!(
    /// Raw edge of a button press.
    UpOrDown {
        Down => "ButtonDown",
        Up => "ButtonUp",
    }
);
click_family!(ClickOrHold {
    Click => "ButtonClick",
    Hold => "ButtonHold",
});
click_family!(SingleOrDoubleClick {
    SingleClick => "ButtonSingleClick",
    DoubleClick => "ButtonDoubleClick",
});
click_family!(SingleOrDoubleClickOrHold {
    SingleClick => "ButtonSingleClick",
    DoubleClick => "ButtonDoubleClick",
    Hold => "ButtonHold",
});

/// One button event as delivered to channel listeners.
///
/// `time_diff` is the age in seconds the daemon attached to the event; it is
/// only meaningful when `was_queued` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonEvent<K> {
    pub click_type: K,
    pub was_queued: bool,
    pub time_diff: i32,
}

impl<K> ButtonEvent<K> {
    pub fn new(click_type: K, was_queued: bool, time_diff: i32) -> Self {
        Self {
            click_type,
            was_queued,
            time_diff,
        }
    }
}

/// Answer to [`crate::FlicClient::get_info`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    pub bluetooth_controller_state: BluetoothControllerState,
    pub my_bd_addr: BdAddr,
    pub my_bd_addr_type: BdAddrType,
    pub max_pending_connections: u8,
    /// Negative when the controller limit is unknown.
    pub max_concurrently_connected_buttons: i16,
    pub current_pending_connections: u8,
    pub currently_no_space_for_new_connection: bool,
    pub verified_buttons: Vec<BdAddr>,
}

/// Answer to [`crate::FlicClient::get_button_info`].
///
/// Buttons the daemon has not verified report no uuid, color or serial number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonInfo {
    pub bd_addr: BdAddr,
    pub uuid: Option<Uuid>,
    pub color: Option<String>,
    pub serial_number: Option<String>,
    pub flic_version: u8,
    pub firmware_version: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvertisementPacket {
    pub bd_addr: BdAddr,
    pub name: String,
    pub rssi: i8,
    pub is_private: bool,
    pub already_verified: bool,
    pub already_connected_to_this_device: bool,
    pub already_connected_to_other_device: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatteryStatus {
    /// `None` when the daemon has no reading yet.
    pub percentage: Option<u8>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonDeleted {
    pub bd_addr: BdAddr,
    pub deleted_by_this_client: bool,
}

/// Last notification a registered component receives when its client shuts down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Closed {
    /// Set when the session ended on an I/O or protocol error rather than a
    /// local close or a clean end of stream.
    pub had_error: bool,
}
