//! Per-zone sleep timer.
//!
//! ```text
//!            set(n), 0 < n ≤ 420
//!   ┌──────┐ ─────────────────────► ┌─────────────────────┐
//!   │ Idle │                        │ Running { remaining }│ ── tick ──┐
//!   └──────┘ ◄───────────────────── └─────────────────────┘ ◄─────────┘
//!        set(0): Cancelled
//!        remaining hits 0: Expired (exactly once)
//! ```
//!
//! `tick` takes the elapsed time since the previous tick. Whole minutes are
//! subtracted; the sub-minute remainder carries into the next tick so a
//! fast poll loop still counts real time.

use core::time::Duration;

use crate::error::{LgapError, Result};

/// Longest timer accepted (minutes).
pub const MAX_TIMER_MINUTES: u16 = 420;

const MS_PER_MINUTE: u128 = 60_000;

/// Timer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SleepTimerState {
    #[default]
    Idle,
    Running {
        remaining_minutes: u16,
    },
}

/// Observable outcome of a `set` or `tick`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerEvent {
    /// Timer (re)armed
    Started { minutes: u16 },
    /// Whole minutes elapsed, still running
    Countdown { remaining_minutes: u16 },
    /// Stopped by `set(0)`. The unit is left alone.
    Cancelled,
    /// Reached zero. The unit should be switched off.
    Expired,
}

/// Sleep timer of one zone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SleepTimer {
    state: SleepTimerState,
    carry: Duration,
}

impl SleepTimer {
    pub const fn new() -> Self {
        Self {
            state: SleepTimerState::Idle,
            carry: Duration::ZERO,
        }
    }

    /// Current state.
    pub const fn state(&self) -> SleepTimerState {
        self.state
    }

    /// True while counting down.
    pub const fn is_running(&self) -> bool {
        matches!(self.state, SleepTimerState::Running { .. })
    }

    /// Whole minutes left, 0 when idle.
    pub const fn remaining_minutes(&self) -> u16 {
        match self.state {
            SleepTimerState::Idle => 0,
            SleepTimerState::Running { remaining_minutes } => remaining_minutes,
        }
    }

    /// Minutes left including the part of the current minute already spent.
    pub fn remaining_exact(&self) -> f32 {
        let whole = f32::from(self.remaining_minutes());
        if whole == 0.0 {
            return 0.0;
        }
        let spent = self.carry.as_millis() as f32 / MS_PER_MINUTE as f32;
        (whole - spent).max(0.0)
    }

    /// Arm (`1..=420`) or cancel (`0`) the timer.
    ///
    /// # Errors
    ///
    /// `InvalidTimerValue` above 420 minutes; the timer is left untouched.
    ///
    /// # Examples
    ///
    /// ```
    /// use core::time::Duration;
    /// use lgap_bus::sleep_timer::{SleepTimer, TimerEvent};
    ///
    /// let mut timer = SleepTimer::new();
    /// timer.set(90).unwrap();
    /// assert_eq!(
    ///     timer.tick(Duration::from_secs(30 * 60)),
    ///     Some(TimerEvent::Countdown { remaining_minutes: 60 })
    /// );
    /// assert_eq!(timer.set(0).unwrap(), Some(TimerEvent::Cancelled));
    /// assert!(timer.set(421).is_err());
    /// ```
    pub fn set(&mut self, minutes: u16) -> Result<Option<TimerEvent>> {
        if minutes > MAX_TIMER_MINUTES {
            return Err(LgapError::InvalidTimerValue { minutes });
        }

        self.carry = Duration::ZERO;
        if minutes == 0 {
            let was_running = self.is_running();
            self.state = SleepTimerState::Idle;
            return Ok(was_running.then_some(TimerEvent::Cancelled));
        }

        self.state = SleepTimerState::Running {
            remaining_minutes: minutes,
        };
        Ok(Some(TimerEvent::Started { minutes }))
    }

    /// Advance the timer by `elapsed`.
    ///
    /// Returns `Expired` exactly once per arming; ticking an idle timer does
    /// nothing.
    pub fn tick(&mut self, elapsed: Duration) -> Option<TimerEvent> {
        let SleepTimerState::Running { remaining_minutes } = self.state else {
            return None;
        };

        let total = self.carry.saturating_add(elapsed);
        let whole = total.as_millis() / MS_PER_MINUTE;
        self.carry = total.saturating_sub(Duration::from_millis((whole * MS_PER_MINUTE) as u64));
        if whole == 0 {
            return None;
        }

        let whole = u16::try_from(whole).unwrap_or(u16::MAX);
        let remaining = remaining_minutes.saturating_sub(whole);
        if remaining == 0 {
            self.state = SleepTimerState::Idle;
            self.carry = Duration::ZERO;
            Some(TimerEvent::Expired)
        } else {
            self.state = SleepTimerState::Running {
                remaining_minutes: remaining,
            };
            Some(TimerEvent::Countdown {
                remaining_minutes: remaining,
            })
        }
    }
}
