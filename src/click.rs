//! Click disambiguation.
//!
//! Turns raw up/down edges into the click/hold and single/double click
//! families. Hold is never timed here: the firmware decides when a press
//! becomes a hold and the daemon reports it, so [`ClickEngine::hold`] is fed
//! from those reports. The only timer is the double-click window, which the
//! owner services through [`ClickEngine::deadline`] and [`ClickEngine::poll`].

use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::types::{
    ButtonEvent, ClickOrHold, SingleOrDoubleClick, SingleOrDoubleClickOrHold, UpOrDown,
};

pub const DEFAULT_DOUBLE_CLICK_WINDOW: Duration = Duration::from_millis(500);

/// One synthesized event, in the order it must reach listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickEvent {
    UpOrDown(ButtonEvent<UpOrDown>),
    ClickOrHold(ButtonEvent<ClickOrHold>),
    SingleOrDoubleClick(ButtonEvent<SingleOrDoubleClick>),
    SingleOrDoubleClickOrHold(ButtonEvent<SingleOrDoubleClickOrHold>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Pressed { second: bool, held: bool },
    AwaitingSecond { deadline: Instant, time_diff: i32 },
}

#[derive(Debug, Clone)]
pub struct ClickEngine {
    window: Duration,
    state: State,
}

impl ClickEngine {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            state: State::Idle,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// When the pending single click must be decided, if one is pending.
    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            State::AwaitingSecond { deadline, .. } => Some(deadline),
            State::Idle | State::Pressed { .. } => None,
        }
    }

    pub fn is_pressed(&self) -> bool {
        matches!(self.state, State::Pressed { .. })
    }

    pub fn edge(&mut self, edge: ButtonEvent<UpOrDown>, now: Instant) -> Vec<ClickEvent> {
        let mut out = self.poll(now);
        if edge.was_queued {
            // A backlog arrives after the fact; nothing live can still be pending.
            out.extend(self.flush());
        }
        out.push(ClickEvent::UpOrDown(edge));

        let ButtonEvent {
            click_type,
            was_queued,
            time_diff,
        } = edge;

        match (click_type, self.state) {
            (UpOrDown::Down, State::Idle) => {
                self.state = State::Pressed {
                    second: false,
                    held: false,
                };
            }
            (UpOrDown::Down, State::AwaitingSecond { .. }) => {
                self.state = State::Pressed {
                    second: true,
                    held: false,
                };
            }
            (UpOrDown::Down, State::Pressed { .. }) => {
                debug!("down edge while already pressed; starting a new press");
                self.state = State::Pressed {
                    second: false,
                    held: false,
                };
            }
            (UpOrDown::Up, State::Pressed { held: true, second }) => {
                self.state = State::Idle;
                if second {
                    out.extend(double_click(was_queued, time_diff));
                } else {
                    out.push(single_or_double(
                        SingleOrDoubleClick::SingleClick,
                        was_queued,
                        time_diff,
                    ));
                }
            }
            (UpOrDown::Up, State::Pressed { held: false, second }) => {
                out.push(ClickEvent::ClickOrHold(ButtonEvent::new(
                    ClickOrHold::Click,
                    was_queued,
                    time_diff,
                )));
                if second {
                    self.state = State::Idle;
                    out.extend(double_click(was_queued, time_diff));
                } else if was_queued {
                    self.state = State::Idle;
                    out.extend(single_click(true, time_diff));
                } else {
                    self.state = State::AwaitingSecond {
                        deadline: now + self.window,
                        time_diff,
                    };
                }
            }
            (UpOrDown::Up, State::Idle | State::AwaitingSecond { .. }) => {
                trace!("up edge with no press in progress");
            }
        }

        out
    }

    /// Applies the daemon's hold classification to the press in progress.
    ///
    /// Both hold-carrying families report the same hold; only the first one
    /// for a press has any effect.
    pub fn hold(&mut self, was_queued: bool, time_diff: i32) -> Vec<ClickEvent> {
        let State::Pressed {
            second,
            held: false,
        } = self.state
        else {
            trace!(state = ?self.state, "ignoring hold outside an unheld press");
            return Vec::new();
        };

        self.state = State::Pressed { second, held: true };
        let mut out = vec![ClickEvent::ClickOrHold(ButtonEvent::new(
            ClickOrHold::Hold,
            was_queued,
            time_diff,
        ))];
        if !second {
            out.push(ClickEvent::SingleOrDoubleClickOrHold(ButtonEvent::new(
                SingleOrDoubleClickOrHold::Hold,
                was_queued,
                time_diff,
            )));
        }
        out
    }

    /// Emits the pending single click once its window has closed.
    pub fn poll(&mut self, now: Instant) -> Vec<ClickEvent> {
        match self.state {
            State::AwaitingSecond { deadline, .. } if now >= deadline => self.flush(),
            _ => Vec::new(),
        }
    }

    /// Emits the pending single click regardless of the window.
    pub fn flush(&mut self) -> Vec<ClickEvent> {
        let State::AwaitingSecond { time_diff, .. } = self.state else {
            return Vec::new();
        };
        self.state = State::Idle;
        single_click(false, time_diff).to_vec()
    }
}

impl Default for ClickEngine {
    fn default() -> Self {
        Self::new(DEFAULT_DOUBLE_CLICK_WINDOW)
    }
}

fn single_or_double(kind: SingleOrDoubleClick, was_queued: bool, time_diff: i32) -> ClickEvent {
    ClickEvent::SingleOrDoubleClick(ButtonEvent::new(kind, was_queued, time_diff))
}

fn single_click(was_queued: bool, time_diff: i32) -> [ClickEvent; 2] {
    [
        single_or_double(SingleOrDoubleClick::SingleClick, was_queued, time_diff),
        ClickEvent::SingleOrDoubleClickOrHold(ButtonEvent::new(
            SingleOrDoubleClickOrHold::SingleClick,
            was_queued,
            time_diff,
        )),
    ]
}

fn double_click(was_queued: bool, time_diff: i32) -> [ClickEvent; 2] {
    [
        single_or_double(SingleOrDoubleClick::DoubleClick, was_queued, time_diff),
        ClickEvent::SingleOrDoubleClickOrHold(ButtonEvent::new(
            SingleOrDoubleClickOrHold::DoubleClick,
            was_queued,
            time_diff,
        )),
    ]
}
