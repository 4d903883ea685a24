//! Pin tables and build-time backend selection.
//!
//! Exactly one of the `l298` and `esda-ac` features must be enabled. The
//! chosen table is exposed as [`ACTIVE`] and is fixed for the lifetime of the
//! firmware; changing a pin means rebuilding.

#[cfg(all(feature = "l298", feature = "esda-ac"))]
compile_error!("features `l298` and `esda-ac` are mutually exclusive; enable exactly one motor driver");

#[cfg(not(any(feature = "l298", feature = "esda-ac")))]
compile_error!("no motor driver selected; enable either the `l298` or the `esda-ac` feature");

/// Largest speed magnitude accepted by the drive layer (8-bit PWM).
pub const MAX_SPEED: i16 = 255;

/// Default I2C address of the PCA9685 used as indexed motor controller.
pub const PCA9685_ADDRESS: u8 = 0x55;

/// PCA9685 prescale register value (roughly 60Hz output).
pub const PCA9685_PRESCALE: u8 = 100;

/// A physical output pin number on the microcontroller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PinId(u8);

impl PinId {
    pub const fn new(pin: u8) -> Self {
        Self(pin)
    }

    pub const fn get(self) -> u8 {
        self.0
    }
}

/// Channel index on an external, index-addressed motor controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MotorIndex(u8);

impl MotorIndex {
    pub const fn new(index: u8) -> Self {
        Self(index)
    }

    pub const fn get(self) -> u8 {
        self.0
    }
}

/// Pins of one H-bridge half of a dual driver board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HBridgePins {
    pub forward: PinId,
    pub backward: PinId,
    pub enable: PinId,
}

/// Pin table of the L298 dual H-bridge variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct L298Pins {
    pub left: HBridgePins,
    pub right: HBridgePins,
}

/// One channel of the AC motor variant: its driver pin and controller index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcChannelPins {
    pub pin: PinId,
    pub index: MotorIndex,
}

/// Pin table of the ESDA AC motor variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcPins {
    pub left: AcChannelPins,
    pub right: AcChannelPins,
}

/// The pin table of one backend variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMapping {
    L298(L298Pins),
    EsdaAc(AcPins),
}

pub const L298_PINS: L298Pins = L298Pins {
    left: HBridgePins {
        forward: PinId::new(10),
        backward: PinId::new(6),
        enable: PinId::new(13),
    },
    right: HBridgePins {
        forward: PinId::new(9),
        backward: PinId::new(5),
        enable: PinId::new(12),
    },
};

pub const ESDA_AC_PINS: AcPins = AcPins {
    left: AcChannelPins {
        pin: PinId::new(11),
        index: MotorIndex::new(1),
    },
    right: AcChannelPins {
        pin: PinId::new(12),
        index: MotorIndex::new(2),
    },
};

/// Pin table of the backend selected for this build.
#[cfg(all(feature = "l298", not(feature = "esda-ac")))]
pub const ACTIVE: PinMapping = PinMapping::L298(L298_PINS);

/// Pin table of the backend selected for this build.
#[cfg(all(feature = "esda-ac", not(feature = "l298")))]
pub const ACTIVE: PinMapping = PinMapping::EsdaAc(ESDA_AC_PINS);
