use diffbridge_core::utils::config::{PinMapping, ACTIVE, ESDA_AC_PINS, L298_PINS, MAX_SPEED};
use diffbridge_core::utils::controllers::{
    Direction, MotorBackend, MotorChannel, MotorCommand, MotorController, MotorDriver, Speed,
};

/// Backend that records every call it receives.
#[derive(Default)]
struct LogBackend {
    initialized: bool,
    enabled: bool,
    writes: Vec<(MotorChannel, Speed)>,
}

impl MotorBackend for LogBackend {
    type Error = ();

    fn init(&mut self) -> Result<(), Self::Error> {
        self.initialized = true;
        self.enabled = true;
        Ok(())
    }

    fn set_speed(
        &mut self,
        channel: MotorChannel,
        speed: Speed,
    ) -> Result<(), Self::Error> {
        assert!(self.initialized, "speed written before init");
        self.writes.push((channel, speed));
        Ok(())
    }

    fn set_enabled(
        &mut self,
        enabled: bool,
    ) -> Result<(), Self::Error> {
        self.enabled = enabled;
        Ok(())
    }
}

fn controller() -> MotorController<LogBackend> {
    MotorController::new(MotorDriver::init_motor_controller(LogBackend::default()).unwrap())
}

#[test]
fn speed_clamps_instead_of_wrapping() {
    assert_eq!(Speed::new(9999), Speed::MAX);
    assert_eq!(Speed::new(-9999), Speed::MIN);
    assert_eq!(Speed::new(i32::MAX).get(), MAX_SPEED);
    assert_eq!(Speed::new(i32::MIN).get(), -MAX_SPEED);
    assert_eq!(Speed::new(256).get(), 255);
    assert_eq!(Speed::from(-42).get(), -42);
}

#[test]
fn speed_sign_and_magnitude() {
    let reverse = Speed::new(-100);
    assert_eq!(reverse.direction(), Direction::Reverse);
    assert_eq!(reverse.magnitude(), 100);

    let forward = Speed::new(200);
    assert_eq!(forward.direction(), Direction::Forward);
    assert_eq!(forward.magnitude(), 200);

    assert!(Speed::STOP.is_stopped());
    assert_eq!(Speed::MIN.magnitude(), 255);
}

#[test]
fn channel_indices() {
    assert_eq!(MotorChannel::from_index(0), Some(MotorChannel::Left));
    assert_eq!(MotorChannel::from_index(1), Some(MotorChannel::Right));
    assert_eq!(MotorChannel::from_index(2), None);
    for channel in MotorChannel::ALL {
        assert_eq!(MotorChannel::from_index(channel.index() as u8), Some(channel));
    }
}

#[test]
fn set_motor_speeds_writes_both_channels() {
    let mut ctrl = controller();
    ctrl.driver
        .set_motor_speeds(Speed::new(-100), Speed::new(200))
        .unwrap();

    let writes = &ctrl.driver.backend().writes;
    assert_eq!(writes.len(), 2);
    assert!(writes.contains(&(MotorChannel::Left, Speed::new(-100))));
    assert!(writes.contains(&(MotorChannel::Right, Speed::new(200))));
}

#[test]
fn speed_command_json() {
    let cmd: MotorCommand = serde_json::from_str(r#"{"mc":"m","l":-100,"r":200}"#).unwrap();
    assert_eq!(cmd, MotorCommand::M { l: -100, r: 200 });

    let cmd: MotorCommand = serde_json::from_str(r#"{"mc":"s","c":1,"s":50}"#).unwrap();
    assert_eq!(cmd, MotorCommand::S { c: 1, s: 50 });

    let cmd: MotorCommand = serde_json::from_str(r#"{"mc":"stop"}"#).unwrap();
    assert_eq!(cmd, MotorCommand::Stop);

    assert!(serde_json::from_str::<MotorCommand>(r#"{"mc":"x"}"#).is_err());
}

#[test]
fn commands_drive_the_driver() {
    let mut ctrl = controller();

    ctrl.execute_command(MotorCommand::M { l: 300, r: -20 })
        .unwrap();
    assert_eq!(ctrl.driver.speed(MotorChannel::Left), Speed::MAX);
    assert_eq!(ctrl.driver.speed(MotorChannel::Right), Speed::new(-20));

    ctrl.execute_command(MotorCommand::S { c: 0, s: 10 })
        .unwrap();
    assert_eq!(ctrl.driver.speed(MotorChannel::Left), Speed::new(10));

    ctrl.execute_command(MotorCommand::Disable).unwrap();
    assert!(!ctrl.driver.backend().enabled);
    ctrl.execute_command(MotorCommand::Enable).unwrap();
    assert!(ctrl.driver.backend().enabled);

    ctrl.dispatch(MotorCommand::Stop);
    for channel in MotorChannel::ALL {
        assert_eq!(ctrl.driver.speed(channel), Speed::STOP);
    }
    let backend = ctrl.driver.into_backend();
    assert_eq!(
        &backend.writes[backend.writes.len() - 2..],
        &[
            (MotorChannel::Left, Speed::STOP),
            (MotorChannel::Right, Speed::STOP)
        ]
    );
}

#[test]
fn pin_tables() {
    assert_eq!(L298_PINS.right.backward.get(), 5);
    assert_eq!(L298_PINS.left.backward.get(), 6);
    assert_eq!(L298_PINS.right.forward.get(), 9);
    assert_eq!(L298_PINS.left.forward.get(), 10);
    assert_eq!(L298_PINS.right.enable.get(), 12);
    assert_eq!(L298_PINS.left.enable.get(), 13);

    assert_eq!(ESDA_AC_PINS.left.pin.get(), 11);
    assert_eq!(ESDA_AC_PINS.right.pin.get(), 12);
    assert_eq!(ESDA_AC_PINS.left.index.get(), 1);
    assert_eq!(ESDA_AC_PINS.right.index.get(), 2);
}

#[test]
fn active_mapping_matches_feature() {
    #[cfg(feature = "l298")]
    assert_eq!(ACTIVE, PinMapping::L298(L298_PINS));
    #[cfg(feature = "esda-ac")]
    assert_eq!(ACTIVE, PinMapping::EsdaAc(ESDA_AC_PINS));
}
