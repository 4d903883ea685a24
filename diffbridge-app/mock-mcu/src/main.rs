use clap::Parser;
use core::cell::RefCell;
use diffbridge_core::mk_static;
use diffbridge_core::utils::config::{HBridgePins, PinId, PinMapping, ACTIVE, PCA9685_ADDRESS};
use diffbridge_core::utils::controllers::{
    ac::{AcMotorDriver, ControllerError, Pca9685Controller},
    l298::{HBridgeChannel, HBridgeError, L298},
    MotorBackend, MotorChannel, MotorCommand, MotorController, MotorDriver, Speed, MOTOR_CHANNEL,
};
use embassy_executor::{Executor, Spawner};
use embedded_hal::{digital, i2c, pwm};
use static_cell::StaticCell;
use std::convert::Infallible;
use std::fmt;
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser)]
#[clap(version = "1.0")]
struct Opts
{
    /// Motor command as JSON, e.g. '{"mc":"m","l":-100,"r":200}' (repeatable)
    #[clap(long = "cmd")]
    commands: Vec<String>,
    /// File with one JSON motor command per line
    #[clap(long)]
    script: Option<PathBuf>,
}

/// PWM output that logs every duty change.
struct LoggedPwm {
    pin: PinId,
}

impl pwm::ErrorType for LoggedPwm {
    type Error = Infallible;
}

impl pwm::SetDutyCycle for LoggedPwm {
    fn max_duty_cycle(&self) -> u16 {
        255
    }

    fn set_duty_cycle(
        &mut self,
        duty: u16,
    ) -> Result<(), Self::Error> {
        info!(pin = self.pin.get(), duty, "PWM");
        Ok(())
    }
}

/// Digital output that logs every level change.
struct LoggedPin {
    pin: PinId,
}

impl digital::ErrorType for LoggedPin {
    type Error = Infallible;
}

impl digital::OutputPin for LoggedPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        info!(pin = self.pin.get(), "LOW");
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        info!(pin = self.pin.get(), "HIGH");
        Ok(())
    }
}

/// I2C bus that logs writes and answers reads with zeros.
struct LoggedI2c;

impl i2c::ErrorType for LoggedI2c {
    type Error = Infallible;
}

impl i2c::I2c for LoggedI2c {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [i2c::Operation<'_>],
    ) -> Result<(), Self::Error> {
        for op in operations {
            match op {
                i2c::Operation::Write(bytes) => info!("I2C 0x{:02X} <- {:02X?}", address, bytes),
                i2c::Operation::Read(buf) => buf.fill(0),
            }
        }
        Ok(())
    }
}

fn h_bridge(pins: HBridgePins) -> HBridgeChannel<LoggedPwm, LoggedPin> {
    HBridgeChannel::new(
        LoggedPwm { pin: pins.forward },
        LoggedPwm { pin: pins.backward },
        LoggedPin { pin: pins.enable },
    )
}

/// Read commands from the CLI and the optional script, in that order.
fn load_commands(opts: &Opts) -> Result<Vec<MotorCommand>, String> {
    let mut lines: Vec<String> = opts.commands.clone();
    if let Some(path) = &opts.script {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
        lines.extend(
            text.lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && !l.starts_with('#'))
                .map(String::from),
        );
    }
    lines
        .iter()
        .map(|l| serde_json::from_str(l).map_err(|e| format!("bad command {}: {}", l, e)))
        .collect()
}

/// The backend selected by `ACTIVE`, built on logging fake hardware.
enum MockBackend {
    L298(L298<LoggedPwm, LoggedPin>),
    EsdaAc(AcMotorDriver<Pca9685Controller<'static, LoggedI2c>>),
}

#[derive(Debug)]
enum MockError {
    HBridge(HBridgeError<Infallible, Infallible>),
    Controller(ControllerError<Infallible>),
}

impl fmt::Display for MockError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            MockError::HBridge(e) => write!(f, "H-bridge: {:?}", e),
            MockError::Controller(e) => write!(f, "PCA9685: {:?}", e),
        }
    }
}

impl MotorBackend for MockBackend {
    type Error = MockError;

    fn init(&mut self) -> Result<(), Self::Error> {
        match self {
            MockBackend::L298(b) => b.init().map_err(MockError::HBridge),
            MockBackend::EsdaAc(b) => b.init().map_err(MockError::Controller),
        }
    }

    fn set_speed(
        &mut self,
        channel: MotorChannel,
        speed: Speed,
    ) -> Result<(), Self::Error> {
        match self {
            MockBackend::L298(b) => b.set_speed(channel, speed).map_err(MockError::HBridge),
            MockBackend::EsdaAc(b) => b.set_speed(channel, speed).map_err(MockError::Controller),
        }
    }

    fn set_enabled(
        &mut self,
        enabled: bool,
    ) -> Result<(), Self::Error> {
        match self {
            MockBackend::L298(b) => b.set_enabled(enabled).map_err(MockError::HBridge),
            MockBackend::EsdaAc(b) => b.set_enabled(enabled).map_err(MockError::Controller),
        }
    }
}

#[embassy_executor::task]
async fn motor_task(
    mut ctrl: MotorController<MockBackend>,
    count: usize,
) {
    for _ in 0..count {
        let cmd = MOTOR_CHANNEL.receiver().receive().await;
        ctrl.dispatch(cmd);
    }
    info!("All motor commands dispatched");
    std::process::exit(0);
}

#[embassy_executor::task]
async fn main_task(
    spawner: Spawner,
    commands: Vec<MotorCommand>,
) {
    let backend = match ACTIVE {
        PinMapping::L298(pins) => {
            info!("Using L298 dual H-bridge driver");
            MockBackend::L298(L298::new(h_bridge(pins.left), h_bridge(pins.right)))
        }
        PinMapping::EsdaAc(pins) => {
            info!("Using ESDA AC motor driver");
            let i2c_bus = mk_static!(RefCell<LoggedI2c>, RefCell::new(LoggedI2c));
            let controller = match Pca9685Controller::new(i2c_bus, PCA9685_ADDRESS) {
                Ok(c) => c,
                Err(e) => {
                    error!("PCA9685 setup failed: {:?}", e);
                    std::process::exit(1);
                }
            };
            MockBackend::EsdaAc(AcMotorDriver::new(controller, pins))
        }
    };

    let driver = match MotorDriver::init_motor_controller(backend) {
        Ok(d) => d,
        Err(e) => {
            error!("Motor controller init failed: {}", e);
            std::process::exit(1);
        }
    };
    let count = commands.len();
    spawner
        .spawn(motor_task(MotorController::new(driver), count))
        .unwrap();

    for cmd in commands {
        MOTOR_CHANNEL.sender().send(cmd).await;
    }
}

static EXECUTOR: StaticCell<Executor> = StaticCell::new();

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let opts: Opts = Opts::parse();
    let commands = match load_commands(&opts) {
        Ok(c) => c,
        Err(e) => {
            error!("{}", e);
            std::process::exit(2);
        }
    };
    if commands.is_empty() {
        info!("No motor commands given");
        return;
    }

    let executor = EXECUTOR.init(Executor::new());
    executor.run(|spawner| {
        spawner.spawn(main_task(spawner, commands)).unwrap();
    });
}
