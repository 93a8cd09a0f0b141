use log::error;
use uuid::Uuid;

use super::alert::AlertHandle;
use crate::domain::order::Order;

pub const DEFAULT_COUNTDOWN_SECS: u32 = 15;

/// One open notification: the order on screen, its countdown and its alert.
#[derive(Debug)]
pub struct NotificationSession {
    order: Order,
    seconds_left: u32,
    halted: bool,
    alert: AlertHandle,
}

impl NotificationSession {
    pub fn order(&self) -> &Order {
        &self.order
    }

    pub fn seconds_left(&self) -> u32 {
        self.seconds_left
    }

    /// A halted session no longer counts down; it waits for a decision or a dismiss.
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn alert_playing(&self) -> bool {
        self.alert.is_playing()
    }

    fn into_order(mut self) -> Order {
        self.alert.stop();
        self.order
    }
}

#[derive(Debug)]
pub enum TimerState {
    Idle,
    Active(NotificationSession),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    Opened,
    AlreadyOpen,
    Busy { active: Uuid },
}

#[derive(Debug, PartialEq)]
pub enum TickOutcome {
    Idle,
    Halted,
    Counting(u32),
    Expired(Order),
}

#[derive(Debug)]
pub struct NotificationTimer {
    countdown: u32,
    state: TimerState,
}

impl NotificationTimer {
    pub fn new(countdown: u32) -> Self {
        Self {
            countdown,
            state: TimerState::Idle,
        }
    }

    pub fn active(&self) -> Option<&NotificationSession> {
        match &self.state {
            TimerState::Active(session) => Some(session),
            TimerState::Idle => None,
        }
    }

    pub fn active_order_id(&self) -> Option<Uuid> {
        self.active().map(|s| s.order.id)
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, TimerState::Active(_))
    }

    /// `start_alert` only runs when a session is actually opened.
    pub fn open(&mut self, order: Order, start_alert: impl FnOnce() -> AlertHandle) -> OpenOutcome {
        if let TimerState::Active(session) = &self.state {
            if session.order.id == order.id {
                return OpenOutcome::AlreadyOpen;
            }
            error!(
                "Refusing to open order {} while order {} is on screen",
                order.id, session.order.id
            );
            return OpenOutcome::Busy {
                active: session.order.id,
            };
        }
        self.state = TimerState::Active(NotificationSession {
            order,
            seconds_left: self.countdown,
            halted: false,
            alert: start_alert(),
        });
        OpenOutcome::Opened
    }

    pub fn tick(&mut self) -> TickOutcome {
        let TimerState::Active(session) = &mut self.state else {
            return TickOutcome::Idle;
        };
        if session.halted {
            return TickOutcome::Halted;
        }
        session.seconds_left = session.seconds_left.saturating_sub(1);
        if session.seconds_left > 0 {
            return TickOutcome::Counting(session.seconds_left);
        }
        match self.take() {
            Some(order) => TickOutcome::Expired(order),
            None => TickOutcome::Idle,
        }
    }

    /// Stops the countdown and the alert but keeps the session open.
    pub fn halt(&mut self) -> bool {
        match &mut self.state {
            TimerState::Active(session) => {
                session.halted = true;
                session.alert.stop();
                true
            }
            TimerState::Idle => false,
        }
    }

    /// Ends the session (resolved or dismissed) and releases its alert.
    pub fn close(&mut self) -> Option<Order> {
        self.take()
    }

    fn take(&mut self) -> Option<Order> {
        match std::mem::replace(&mut self.state, TimerState::Idle) {
            TimerState::Active(session) => Some(session.into_order()),
            TimerState::Idle => None,
        }
    }
}
