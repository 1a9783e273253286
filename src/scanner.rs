//! Raw advertisement scanners and the guided scan wizard.

use tracing::{debug, warn};

use crate::listeners::Listeners;
use crate::types::{AdvertisementPacket, BdAddr, Closed, ScanWizardResult};

#[derive(Debug, Default)]
pub struct ScannerListeners {
    pub advertisement_packet: Listeners<AdvertisementPacket>,
    pub closed: Listeners<Closed>,
}

/// Receives every Flic advertisement the daemon sees while registered.
#[derive(Debug, Default)]
pub struct Scanner {
    active: bool,
    listeners: ScannerListeners,
}

impl Scanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn listeners(&mut self) -> &mut ScannerListeners {
        &mut self.listeners
    }

    pub(crate) fn activate(&mut self) {
        self.active = true;
    }

    pub(crate) fn deactivate(&mut self) {
        self.active = false;
    }

    pub(crate) fn handle_advertisement(&mut self, packet: &AdvertisementPacket) {
        if self.active {
            self.listeners.advertisement_packet.emit(packet);
        }
    }

    pub(crate) fn apply_closed(&mut self, closed: Closed) {
        if self.active {
            self.active = false;
            self.listeners.closed.emit(&closed);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WizardState {
    #[default]
    Idle,
    Scanning,
    /// A public button was found and the daemon is connecting to it.
    Connecting,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundButton {
    pub bd_addr: BdAddr,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardCompletion {
    pub result: ScanWizardResult,
    /// The public button the wizard settled on, if it got that far.
    pub button: Option<FoundButton>,
}

#[derive(Debug, Default)]
pub struct ScanWizardListeners {
    pub found_private_button: Listeners<()>,
    pub found_public_button: Listeners<FoundButton>,
    pub button_connected: Listeners<FoundButton>,
    pub completed: Listeners<WizardCompletion>,
    pub closed: Listeners<Closed>,
}

/// Finds one new button, connects to it and has the daemon verify it.
///
/// On [`ScanWizardResult::Success`] the button is verified and can be used
/// with a [`crate::ConnectionChannel`].
#[derive(Debug, Default)]
pub struct ScanWizard {
    state: WizardState,
    found: Option<FoundButton>,
    listeners: ScanWizardListeners,
}

impl ScanWizard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> WizardState {
        self.state
    }

    pub fn found_button(&self) -> Option<&FoundButton> {
        self.found.as_ref()
    }

    pub fn listeners(&mut self) -> &mut ScanWizardListeners {
        &mut self.listeners
    }

    pub(crate) fn start(&mut self) {
        self.state = WizardState::Scanning;
        self.found = None;
    }

    /// The daemon may give up on one button and report another, so finds are
    /// accepted while connecting too.
    fn is_searching(&self) -> bool {
        matches!(self.state, WizardState::Scanning | WizardState::Connecting)
    }

    pub(crate) fn handle_found_private(&mut self) {
        if !self.is_searching() {
            warn!(state = ?self.state, "private button reported outside scanning");
            return;
        }
        self.listeners.found_private_button.emit(&());
    }

    pub(crate) fn handle_found_public(&mut self, bd_addr: BdAddr, name: String) {
        if !self.is_searching() {
            warn!(state = ?self.state, %bd_addr, "public button reported outside scanning");
            return;
        }
        let found = FoundButton { bd_addr, name };
        self.state = WizardState::Connecting;
        self.listeners.found_public_button.emit(&found);
        self.found = Some(found);
    }

    pub(crate) fn handle_button_connected(&mut self) {
        match (&self.state, &self.found) {
            (WizardState::Connecting, Some(found)) => {
                self.listeners.button_connected.emit(found);
            }
            _ => warn!(state = ?self.state, "button connected reported without a found button"),
        }
    }

    pub(crate) fn handle_completed(&mut self, result: ScanWizardResult) {
        if self.state == WizardState::Completed {
            return;
        }
        debug!(%result, "scan wizard completed");
        self.state = WizardState::Completed;
        self.listeners.completed.emit(&WizardCompletion {
            result,
            button: self.found.clone(),
        });
    }

    /// Local cancel: terminal without a completion event.
    pub(crate) fn cancel(&mut self) {
        self.state = WizardState::Completed;
    }

    pub(crate) fn apply_closed(&mut self, closed: Closed) {
        if matches!(self.state, WizardState::Scanning | WizardState::Connecting) {
            self.state = WizardState::Completed;
            self.listeners.closed.emit(&closed);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use pretty_assertions::assert_eq;

    use super::*;

    fn packet(name: &str) -> AdvertisementPacket {
        AdvertisementPacket {
            bd_addr: BdAddr::new([1, 2, 3, 4, 5, 6]),
            name: name.to_string(),
            rssi: -60,
            is_private: false,
            already_verified: true,
            already_connected_to_this_device: false,
            already_connected_to_other_device: false,
        }
    }

    #[test]
    fn scanner_only_forwards_while_active() {
        let names = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&names);
        let mut scanner = Scanner::new();
        scanner
            .listeners()
            .advertisement_packet
            .on(move |p| sink.lock().unwrap().push(p.name.clone()));

        scanner.handle_advertisement(&packet("early"));
        scanner.activate();
        scanner.handle_advertisement(&packet("F023abc"));
        scanner.deactivate();
        scanner.handle_advertisement(&packet("late"));

        assert_eq!(*names.lock().unwrap(), vec!["F023abc".to_string()]);
    }

    #[test]
    fn wizard_walks_through_its_states() {
        let completions = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&completions);
        let mut wizard = ScanWizard::new();
        wizard
            .listeners()
            .completed
            .on(move |c| sink.lock().unwrap().push(c.clone()));

        wizard.start();
        assert_eq!(wizard.state(), WizardState::Scanning);
        wizard.handle_found_private();
        wizard.handle_found_public(
            BdAddr::new([0x80, 0xe4, 0xda, 0x71, 0x2a, 0x1c]),
            "F023x".into(),
        );
        assert_eq!(wizard.state(), WizardState::Connecting);
        wizard.handle_button_connected();
        wizard.handle_completed(ScanWizardResult::Success);
        wizard.handle_completed(ScanWizardResult::Success);

        let expected = WizardCompletion {
            result: ScanWizardResult::Success,
            button: Some(FoundButton {
                bd_addr: BdAddr::new([0x80, 0xe4, 0xda, 0x71, 0x2a, 0x1c]),
                name: "F023x".into(),
            }),
        };
        assert_eq!(*completions.lock().unwrap(), vec![expected]);
        assert_eq!(wizard.state(), WizardState::Completed);
    }

    #[test]
    fn later_public_button_replaces_the_earlier_one() {
        let first = BdAddr::new([0x80, 0xe4, 0xda, 0x71, 0x2a, 0x1c]);
        let second = BdAddr::new([0x80, 0xe4, 0xda, 0x71, 0x2a, 0x1d]);
        let reported = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&reported);
        let mut wizard = ScanWizard::new();
        wizard
            .listeners()
            .found_public_button
            .on(move |found| sink.lock().unwrap().push(found.bd_addr));

        wizard.start();
        wizard.handle_found_public(first, "F023a".into());
        wizard.handle_found_private();
        wizard.handle_found_public(second, "F023b".into());

        assert_eq!(*reported.lock().unwrap(), vec![first, second]);
        assert_eq!(wizard.state(), WizardState::Connecting);
        assert_eq!(wizard.found_button().map(|found| found.bd_addr), Some(second));

        wizard.handle_completed(ScanWizardResult::Success);
        wizard.handle_found_public(first, "F023a".into());
        assert_eq!(reported.lock().unwrap().len(), 2);
    }

    #[test]
    fn wizard_timeout_without_button_reports_none() {
        let completions = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&completions);
        let mut wizard = ScanWizard::new();
        wizard
            .listeners()
            .completed
            .on(move |c| sink.lock().unwrap().push(c.button.clone()));

        wizard.start();
        wizard.handle_completed(ScanWizardResult::FailedTimeout);

        assert_eq!(*completions.lock().unwrap(), vec![None]);
    }

    #[test]
    fn closed_reaches_only_running_wizards() {
        let count = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&count);
        let mut wizard = ScanWizard::new();
        wizard.listeners().closed.on(move |_| *counter.lock().unwrap() += 1);

        wizard.start();
        wizard.apply_closed(Closed { had_error: true });
        wizard.apply_closed(Closed { had_error: true });

        assert_eq!(*count.lock().unwrap(), 1);
    }
}
