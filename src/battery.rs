//! Battery level subscriptions.

use crate::listeners::Listeners;
use crate::types::{BatteryStatus, BdAddr, Closed};

#[derive(Debug, Default)]
pub struct BatteryListeners {
    pub battery_status: Listeners<BatteryStatus>,
    pub closed: Listeners<Closed>,
}

/// Follows the battery level of one button, whether or not it is connected.
///
/// The daemon reports the last known level right after registration and
/// then on every change.
#[derive(Debug)]
pub struct BatteryStatusListener {
    bd_addr: BdAddr,
    last: Option<BatteryStatus>,
    active: bool,
    listeners: BatteryListeners,
}

impl BatteryStatusListener {
    pub fn new(bd_addr: BdAddr) -> Self {
        Self {
            bd_addr,
            last: None,
            active: false,
            listeners: BatteryListeners::default(),
        }
    }

    pub fn bd_addr(&self) -> BdAddr {
        self.bd_addr
    }

    pub fn last_status(&self) -> Option<BatteryStatus> {
        self.last
    }

    pub fn listeners(&mut self) -> &mut BatteryListeners {
        &mut self.listeners
    }

    pub(crate) fn activate(&mut self) {
        self.active = true;
    }

    pub(crate) fn deactivate(&mut self) {
        self.active = false;
    }

    pub(crate) fn handle_status(&mut self, status: BatteryStatus) {
        self.last = Some(status);
        self.listeners.battery_status.emit(&status);
    }

    pub(crate) fn apply_closed(&mut self, closed: Closed) {
        if self.active {
            self.active = false;
            self.listeners.closed.emit(&closed);
        }
    }
}
