//! Rust client for flicd, the Flic button daemon.
//!
//! The recommended API surface is:
//! - [`FlicClient`] for the session with the daemon and its event loop
//! - [`ConnectionChannel`] for receiving button presses
//! - [`Scanner`] and [`ScanWizard`] for finding buttons
//! - [`BatteryStatusListener`] for battery levels
//! - [`transport`] for the underlying byte stream
//!
//! Components are configured and given listeners before being handed to the
//! client, which returns a handle for later access and removal. All events
//! are delivered synchronously from [`FlicClient::poll`] or [`FlicClient::run`].
//!
//! [`protocol`] exposes the raw wire codec for advanced use cases, such as
//! standing in for the daemon in tests.

mod battery;
mod channel;
mod click;
mod client;
mod framing;
mod listeners;
/// Wire format of the flicd protocol: opcodes, field layouts and framing.
pub mod protocol;
mod registry;
mod scanner;
/// Byte-stream adapters for reaching a flicd daemon.
pub mod transport;
mod types;

pub use battery::{BatteryListeners, BatteryStatusListener};
pub use channel::{
    ChannelListeners, ClickSource, ConnectionChannel, CreateResponse, Lifecycle, StatusChange,
};
pub use click::{ClickEngine, ClickEvent, DEFAULT_DOUBLE_CLICK_WINDOW};
/// Errors returned by client operations.
pub use client::ClientError;
/// The client, its options, and its client-wide listeners.
pub use client::{ClientListeners, ClientOptions, FlicClient};
pub use client::{DEFAULT_PORT, DEFAULT_READ_BUFFER_SIZE};
pub use framing::{FrameDecoder, FramingError};
pub use listeners::Listeners;
pub use registry::RequestId;
pub use scanner::{
    FoundButton, ScanWizard, ScanWizardListeners, Scanner, ScannerListeners, WizardCompletion,
    WizardState,
};
pub use types::{
    AdvertisementPacket, BatteryListenerId, BatteryStatus, BdAddr, BdAddrParseError, BdAddrType,
    BluetoothControllerState, ButtonDeleted, ButtonEvent, ButtonInfo, ChannelId, ClickOrHold,
    ClickType, Closed, ConnectionStatus, CreateConnectionChannelError, DisconnectReason,
    LatencyMode, RemovedReason, ScanWizardId, ScanWizardResult, ScannerId, ServerInfo,
    SingleOrDoubleClick, SingleOrDoubleClickOrHold, UpOrDown,
};
