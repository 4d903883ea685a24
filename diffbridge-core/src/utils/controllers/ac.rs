//! Indexed AC motor backend.
//!
//! Each channel is addressed by a small [`MotorIndex`] on an external
//! controller. The backend forwards direction and magnitude to that index; a
//! PCA9685 over I2C is provided as the stock controller.

use core::cell::RefCell;

use embedded_hal::i2c::I2c;
use embedded_hal_bus::i2c::RefCellDevice;
use pwm_pca9685::{Address as PwmAddress, Channel, Error as PwmError, Pca9685};

use super::driver::{Direction, MotorBackend, MotorChannel, Speed};
use crate::utils::config::{AcChannelPins, AcPins, MotorIndex, MAX_SPEED, PCA9685_PRESCALE};

/// A motor controller whose outputs are addressed by index.
pub trait IndexedController {
    type Error: core::fmt::Debug;

    /// One-time setup of the controller itself.
    fn configure(&mut self) -> Result<(), Self::Error>;

    /// Bring the output at `index` to the stopped state.
    fn init_index(
        &mut self,
        index: MotorIndex,
    ) -> Result<(), Self::Error>;

    fn drive_index(
        &mut self,
        index: MotorIndex,
        speed: Speed,
    ) -> Result<(), Self::Error>;

    fn set_output_enabled(
        &mut self,
        enabled: bool,
    ) -> Result<(), Self::Error>;
}

/// Two-channel AC motor driver on top of an [`IndexedController`].
pub struct AcMotorDriver<C> {
    controller: C,
    pins: AcPins,
}

impl<C: IndexedController> AcMotorDriver<C> {
    pub fn new(
        controller: C,
        pins: AcPins,
    ) -> Self {
        Self { controller, pins }
    }

    fn channel_pins(
        &self,
        channel: MotorChannel,
    ) -> AcChannelPins {
        match channel {
            MotorChannel::Left => self.pins.left,
            MotorChannel::Right => self.pins.right,
        }
    }
}

impl<C: IndexedController> MotorBackend for AcMotorDriver<C> {
    type Error = C::Error;

    fn init(&mut self) -> Result<(), Self::Error> {
        self.controller.configure()?;
        for channel in MotorChannel::ALL {
            let pins = self.channel_pins(channel);
            self.controller.init_index(pins.index)?;
            tracing::info!(
                ?channel,
                pin = pins.pin.get(),
                index = pins.index.get(),
                "AC motor channel ready"
            );
        }
        Ok(())
    }

    fn set_speed(
        &mut self,
        channel: MotorChannel,
        speed: Speed,
    ) -> Result<(), Self::Error> {
        let index = self.channel_pins(channel).index;
        self.controller.drive_index(index, speed)
    }

    fn set_enabled(
        &mut self,
        enabled: bool,
    ) -> Result<(), Self::Error> {
        self.controller.set_output_enabled(enabled)
    }
}

/// Errors that can occur when driving motors through a PCA9685.
#[derive(Debug)]
pub enum ControllerError<E: core::fmt::Debug> {
    PwmError(PwmError<E>),
    UnmappedIndex(u8),
}

/// PCA9685 used as an indexed controller.
///
/// Index `n` owns the channel pair `(C{2n}, C{2n+1})`: the first carries the
/// direction as a steady level (full on = reverse), the second the duty cycle.
pub struct Pca9685Controller<'a, I2C: 'static> {
    pub pwm: Pca9685<RefCellDevice<'a, I2C>>,
}

impl<'a, I2C, E> Pca9685Controller<'a, I2C>
where
    I2C: I2c<Error = E> + 'static,
    E: core::fmt::Debug,
{
    pub const MAX_DUTY: u16 = 4095;

    pub fn new(
        i2c_bus: &'a RefCell<I2C>,
        address: u8,
    ) -> Result<Self, ControllerError<E>> {
        let pwm = Pca9685::new(RefCellDevice::new(i2c_bus), PwmAddress::from(address))
            .map_err(ControllerError::PwmError)?;
        Ok(Self { pwm })
    }

    fn channels_for(index: MotorIndex) -> Result<(Channel, Channel), ControllerError<E>> {
        let pair = match index.get() {
            0 => (Channel::C0, Channel::C1),
            1 => (Channel::C2, Channel::C3),
            2 => (Channel::C4, Channel::C5),
            3 => (Channel::C6, Channel::C7),
            4 => (Channel::C8, Channel::C9),
            5 => (Channel::C10, Channel::C11),
            6 => (Channel::C12, Channel::C13),
            7 => (Channel::C14, Channel::C15),
            other => return Err(ControllerError::UnmappedIndex(other)),
        };
        Ok(pair)
    }

    fn write_pair(
        &mut self,
        index: MotorIndex,
        phase: u16,
        duty: u16,
    ) -> Result<(), ControllerError<E>> {
        let (phase_channel, enable_channel) = Self::channels_for(index)?;
        self.pwm
            .set_channel_on_off(phase_channel, 0, phase)
            .map_err(ControllerError::PwmError)?;
        self.pwm
            .set_channel_on_off(enable_channel, 0, duty)
            .map_err(ControllerError::PwmError)
    }
}

impl<'a, I2C, E> IndexedController for Pca9685Controller<'a, I2C>
where
    I2C: I2c<Error = E> + 'static,
    E: core::fmt::Debug,
{
    type Error = ControllerError<E>;

    fn configure(&mut self) -> Result<(), Self::Error> {
        self.pwm.enable().map_err(ControllerError::PwmError)?;
        tracing::info!("PWM enabled");
        self.pwm
            .set_prescale(PCA9685_PRESCALE)
            .map_err(ControllerError::PwmError)?;
        tracing::info!(prescale = PCA9685_PRESCALE, "PWM prescale set");
        Ok(())
    }

    fn init_index(
        &mut self,
        index: MotorIndex,
    ) -> Result<(), Self::Error> {
        self.write_pair(index, 0, 0)
    }

    fn drive_index(
        &mut self,
        index: MotorIndex,
        speed: Speed,
    ) -> Result<(), Self::Error> {
        let (phase_channel, enable_channel) = Self::channels_for(index)?;
        match speed.direction() {
            Direction::Forward => self
                .pwm
                .set_channel_full_off(phase_channel)
                .map_err(ControllerError::PwmError)?,
            Direction::Reverse => {
                // Full-off wins over full-on, so clear it after raising the line.
                self.pwm
                    .set_channel_full_on(phase_channel, 0)
                    .map_err(ControllerError::PwmError)?;
                self.pwm
                    .set_channel_off(phase_channel, 0)
                    .map_err(ControllerError::PwmError)?;
            }
        }
        let duty =
            (u32::from(speed.magnitude()) * u32::from(Self::MAX_DUTY) / MAX_SPEED as u32) as u16;
        self.pwm
            .set_channel_on_off(enable_channel, 0, duty)
            .map_err(ControllerError::PwmError)
    }

    fn set_output_enabled(
        &mut self,
        enabled: bool,
    ) -> Result<(), Self::Error> {
        if enabled {
            self.pwm.enable().map_err(ControllerError::PwmError)
        } else {
            self.pwm.disable().map_err(ControllerError::PwmError)
        }
    }
}
