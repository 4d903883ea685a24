//! Module Exports
//!
//! - `driver`: backend-independent `MotorDriver` and the `MotorBackend` trait
//! - `l298`: dual H-bridge PWM backend
//! - `ac`: indexed AC motor backend and its PCA9685 controller

pub mod ac;
pub mod driver;
pub mod l298;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use serde::{Deserialize, Serialize};

pub use driver::{Direction, MotorBackend, MotorChannel, MotorDriver, Speed};

/// Channel used to receive motor commands (`MotorCommand` messages).
pub static MOTOR_CHANNEL: embassy_sync::channel::Channel<CriticalSectionRawMutex, MotorCommand, 16> =
    embassy_sync::channel::Channel::new();

/// Commands accepted from the serial dispatcher.
///
/// Serialized as JSON with tag `"mc"`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "mc", rename_all = "snake_case")] // mc = motor command
pub enum MotorCommand {
    /// Set both speeds (left, right).
    M { l: i32, r: i32 },
    /// Set one speed by raw channel index.
    S { c: u8, s: i32 },
    /// Stop both motors.
    Stop,
    /// Power the driver stage.
    Enable,
    /// Cut power to the driver stage.
    Disable,
}

/// Executes `MotorCommand`s against an initialized driver.
pub struct MotorController<B> {
    pub driver: MotorDriver<B>,
}

impl<B: MotorBackend> MotorController<B> {
    pub fn new(driver: MotorDriver<B>) -> Self {
        Self { driver }
    }

    /// Run one command. Speeds are clamped, never rejected.
    pub fn execute_command(
        &mut self,
        command: MotorCommand,
    ) -> Result<(), B::Error> {
        match command {
            MotorCommand::M { l, r } => self.driver.set_motor_speeds(Speed::new(l), Speed::new(r)),
            MotorCommand::S { c, s } => self.driver.set_motor_speed_index(c, Speed::new(s)),
            MotorCommand::Stop => self.driver.stop(),
            MotorCommand::Enable => self.driver.set_enabled(true),
            MotorCommand::Disable => self.driver.set_enabled(false),
        }
    }

    /// Execute a command and log the outcome.
    pub fn dispatch(
        &mut self,
        command: MotorCommand,
    ) {
        tracing::info!("Received motor command: {:?}", command);
        match self.execute_command(command) {
            Ok(()) => tracing::info!(
                left = self.driver.speed(MotorChannel::Left).get(),
                right = self.driver.speed(MotorChannel::Right).get(),
                "Motor command executed"
            ),
            Err(e) => tracing::error!("Motor command failed: {:?}", e),
        }
    }
}
