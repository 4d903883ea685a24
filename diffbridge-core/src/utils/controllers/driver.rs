//! Backend-independent motor driver.
//!
//! `MotorDriver` turns per-channel speed commands into calls on a
//! [`MotorBackend`], without callers knowing which physical driver is fitted.

use serde::{Deserialize, Serialize};

use crate::utils::config::MAX_SPEED;

/// One independently commandable motor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotorChannel {
    Left,
    Right,
}

impl MotorChannel {
    pub const ALL: [MotorChannel; 2] = [MotorChannel::Left, MotorChannel::Right];

    /// Map a raw dispatcher index (0 = left, 1 = right) to a channel.
    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(MotorChannel::Left),
            1 => Some(MotorChannel::Right),
            _ => None,
        }
    }

    pub const fn index(self) -> usize {
        match self {
            MotorChannel::Left => 0,
            MotorChannel::Right => 1,
        }
    }
}

/// Rotation direction derived from the sign of a [`Speed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Reverse,
}

/// Signed motor speed in `-MAX_SPEED..=MAX_SPEED`.
///
/// Out-of-range values are clamped to the nearest bound on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Speed(i16);

impl Speed {
    pub const STOP: Speed = Speed(0);
    pub const MAX: Speed = Speed(MAX_SPEED);
    pub const MIN: Speed = Speed(-MAX_SPEED);

    pub fn new(raw: i32) -> Self {
        Speed(raw.clamp(-(MAX_SPEED as i32), MAX_SPEED as i32) as i16)
    }

    pub const fn get(self) -> i16 {
        self.0
    }

    /// Throttle magnitude, `0..=MAX_SPEED`.
    pub const fn magnitude(self) -> u8 {
        self.0.unsigned_abs() as u8
    }

    pub const fn direction(self) -> Direction {
        if self.0 < 0 {
            Direction::Reverse
        } else {
            Direction::Forward
        }
    }

    pub const fn is_stopped(self) -> bool {
        self.0 == 0
    }
}

impl From<i32> for Speed {
    fn from(raw: i32) -> Self {
        Speed::new(raw)
    }
}

/// Capability set every physical drive variant provides.
pub trait MotorBackend {
    type Error: core::fmt::Debug;

    /// Put every output into its idle state. Called once, before any speed.
    fn init(&mut self) -> Result<(), Self::Error>;

    /// Apply an already clamped speed to one channel.
    ///
    /// On error the channel should be left stopped.
    fn set_speed(
        &mut self,
        channel: MotorChannel,
        speed: Speed,
    ) -> Result<(), Self::Error>;

    /// Power the driver stage on or off without touching commanded speeds.
    fn set_enabled(
        &mut self,
        enabled: bool,
    ) -> Result<(), Self::Error>;
}

/// An initialized motor driver.
///
/// A value of this type only exists after [`MotorDriver::init_motor_controller`]
/// succeeded, so speed commands can never reach an unconfigured backend.
pub struct MotorDriver<B> {
    backend: B,
    speeds: [Speed; 2],
}

impl<B: MotorBackend> MotorDriver<B> {
    /// Configure all outputs of `backend` into the stopped state.
    pub fn init_motor_controller(mut backend: B) -> Result<Self, B::Error> {
        backend.init()?;
        tracing::info!("motor controller initialized");
        Ok(Self {
            backend,
            speeds: [Speed::STOP; 2],
        })
    }

    /// Command a single channel.
    ///
    /// Direction and magnitude outputs are written inside one critical
    /// section, so interrupt handlers never observe a half-applied update.
    pub fn set_motor_speed(
        &mut self,
        channel: MotorChannel,
        speed: Speed,
    ) -> Result<(), B::Error> {
        critical_section::with(|_| self.apply(channel, speed))
    }

    /// Command both channels; both updates complete before returning.
    pub fn set_motor_speeds(
        &mut self,
        left: Speed,
        right: Speed,
    ) -> Result<(), B::Error> {
        critical_section::with(|_| {
            self.apply(MotorChannel::Left, left)?;
            self.apply(MotorChannel::Right, right)
        })
    }

    /// Command a channel by its raw dispatcher index.
    ///
    /// An unknown index is a caller bug: it trips a debug assertion, and is
    /// logged and ignored in release builds.
    pub fn set_motor_speed_index(
        &mut self,
        index: u8,
        speed: Speed,
    ) -> Result<(), B::Error> {
        match MotorChannel::from_index(index) {
            Some(channel) => self.set_motor_speed(channel, speed),
            None => {
                debug_assert!(false, "invalid motor channel index {}", index);
                tracing::warn!(index, "ignoring speed for unknown motor channel");
                Ok(())
            }
        }
    }

    pub fn stop(&mut self) -> Result<(), B::Error> {
        self.set_motor_speeds(Speed::STOP, Speed::STOP)
    }

    pub fn set_enabled(
        &mut self,
        enabled: bool,
    ) -> Result<(), B::Error> {
        self.backend.set_enabled(enabled)?;
        tracing::info!(enabled, "motor driver power changed");
        Ok(())
    }

    /// Last speed commanded on `channel`, after clamping.
    ///
    /// After a failed write this reads [`Speed::STOP`].
    pub fn speed(
        &self,
        channel: MotorChannel,
    ) -> Speed {
        self.speeds[channel.index()]
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    fn apply(
        &mut self,
        channel: MotorChannel,
        speed: Speed,
    ) -> Result<(), B::Error> {
        if let Err(e) = self.backend.set_speed(channel, speed) {
            // Backends stop a channel whose update failed.
            self.speeds[channel.index()] = Speed::STOP;
            tracing::warn!(?channel, "motor speed write failed, channel stopped");
            return Err(e);
        }
        self.speeds[channel.index()] = speed;
        tracing::debug!(?channel, speed = speed.get(), "motor speed set");
        Ok(())
    }
}
