//! Dual H-bridge PWM backend (L298 and compatible boards).
//!
//! Each channel has a forward PWM pin, a backward PWM pin and an enable pin.
//! Only one PWM pin of a channel is ever driven; the other is held at zero
//! duty so the bridge is never shorted.

use embedded_hal::{digital::OutputPin, pwm::SetDutyCycle};

use super::driver::{Direction, MotorBackend, MotorChannel, Speed};
use crate::utils::config::MAX_SPEED;

/// Errors raised by the pins of an H-bridge.
#[derive(Debug)]
pub enum HBridgeError<P: core::fmt::Debug, E: core::fmt::Debug> {
    Pwm(P),
    Enable(E),
}

/// The outputs of one H-bridge channel.
pub struct HBridgeChannel<P, E> {
    pub forward: P,
    pub backward: P,
    pub enable: E,
}

impl<P, E> HBridgeChannel<P, E> {
    pub fn new(
        forward: P,
        backward: P,
        enable: E,
    ) -> Self {
        Self {
            forward,
            backward,
            enable,
        }
    }
}

/// Two-channel H-bridge driver.
pub struct L298<P, E> {
    left: HBridgeChannel<P, E>,
    right: HBridgeChannel<P, E>,
}

impl<P, E> L298<P, E>
where
    P: SetDutyCycle,
    E: OutputPin,
{
    pub fn new(
        left: HBridgeChannel<P, E>,
        right: HBridgeChannel<P, E>,
    ) -> Self {
        Self { left, right }
    }

    pub fn channel(
        &self,
        channel: MotorChannel,
    ) -> &HBridgeChannel<P, E> {
        match channel {
            MotorChannel::Left => &self.left,
            MotorChannel::Right => &self.right,
        }
    }

    fn channel_mut(
        &mut self,
        channel: MotorChannel,
    ) -> &mut HBridgeChannel<P, E> {
        match channel {
            MotorChannel::Left => &mut self.left,
            MotorChannel::Right => &mut self.right,
        }
    }
}

impl<P, E> MotorBackend for L298<P, E>
where
    P: SetDutyCycle,
    E: OutputPin,
{
    type Error = HBridgeError<P::Error, E::Error>;

    fn init(&mut self) -> Result<(), Self::Error> {
        for ch in [&mut self.left, &mut self.right] {
            ch.forward
                .set_duty_cycle_fully_off()
                .map_err(HBridgeError::Pwm)?;
            ch.backward
                .set_duty_cycle_fully_off()
                .map_err(HBridgeError::Pwm)?;
            ch.enable.set_high().map_err(HBridgeError::Enable)?;
        }
        tracing::info!("H-bridge outputs idle, drivers enabled");
        Ok(())
    }

    fn set_speed(
        &mut self,
        channel: MotorChannel,
        speed: Speed,
    ) -> Result<(), Self::Error> {
        let ch = self.channel_mut(channel);
        let duty = u16::from(speed.magnitude());
        let (active, idle) = match speed.direction() {
            Direction::Forward => (&mut ch.forward, &mut ch.backward),
            Direction::Reverse => (&mut ch.backward, &mut ch.forward),
        };

        // Release the opposing side before driving the active one.
        idle.set_duty_cycle_fully_off().map_err(HBridgeError::Pwm)?;
        if duty == 0 {
            return active.set_duty_cycle_fully_off().map_err(HBridgeError::Pwm);
        }
        if let Err(e) = active.set_duty_cycle_fraction(duty, MAX_SPEED as u16) {
            // Leave the channel stopped rather than at its previous duty.
            let _ = active.set_duty_cycle_fully_off();
            return Err(HBridgeError::Pwm(e));
        }
        Ok(())
    }

    fn set_enabled(
        &mut self,
        enabled: bool,
    ) -> Result<(), Self::Error> {
        for ch in [&mut self.left, &mut self.right] {
            if enabled {
                ch.enable.set_high().map_err(HBridgeError::Enable)?;
            } else {
                ch.enable.set_low().map_err(HBridgeError::Enable)?;
            }
        }
        Ok(())
    }
}
