pub mod frame;

pub use frame::*;
pub use level_traits::{LevelError, Quaternion, SensorPack, SensorSource, Vector3};

use bitflags::bitflags;
use clap::ValueEnum;
use level::LatestReadings;
use std::io::{Read, Write};
use std::sync::{mpsc, Arc, RwLock};
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};

const REG_SAVE: u8 = 0x00;
const REG_CONTENT: u8 = 0x02;
const REG_RATE: u8 = 0x03;
const REG_UNLOCK: u8 = 0x69;

bitflags! {
    /// Output content register: which frame kinds the device streams.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct OutputContent: u16 {
        const TIME = 1 << 0;
        const ACCELERATION = 1 << 1;
        const GYRO = 1 << 2;
        const ANGLE = 1 << 3;
        const MAGNETOMETER = 1 << 4;
        const PORT = 1 << 5;
        const PRESSURE = 1 << 6;
        const GPS = 1 << 7;
        const VELOCITY = 1 << 8;
        const QUATERNION = 1 << 9;
        const GPS_ACCURACY = 1 << 10;
    }
}

impl OutputContent {
    /// Everything the level needs: acceleration, magnetic field, and gravity via the quaternion.
    pub fn level() -> Self {
        OutputContent::ACCELERATION | OutputContent::MAGNETOMETER | OutputContent::QUATERNION
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputRate {
    #[value(name = "0.2")]
    Hz0_2,
    #[value(name = "0.5")]
    Hz0_5,
    #[value(name = "1")]
    Hz1,
    #[value(name = "2")]
    Hz2,
    #[value(name = "5")]
    Hz5,
    #[value(name = "10")]
    Hz10,
    #[value(name = "20")]
    Hz20,
    #[value(name = "50")]
    Hz50,
    #[value(name = "100")]
    Hz100,
    #[value(name = "200")]
    Hz200,
    Single,
    Off,
}

impl OutputRate {
    pub fn to_byte(&self) -> u8 {
        match self {
            OutputRate::Hz0_2 => 0x01,
            OutputRate::Hz0_5 => 0x02,
            OutputRate::Hz1 => 0x03,
            OutputRate::Hz2 => 0x04,
            OutputRate::Hz5 => 0x05,
            OutputRate::Hz10 => 0x06,
            OutputRate::Hz20 => 0x07,
            OutputRate::Hz50 => 0x08,
            OutputRate::Hz100 => 0x09,
            OutputRate::Hz200 => 0x0B,
            OutputRate::Single => 0x0C,
            OutputRate::Off => 0x0D,
        }
    }
}

/// Command packet: `FF AA <register> <low> <high>`.
pub fn command(register: u8, value: u16) -> [u8; 5] {
    let [low, high] = value.to_le_bytes();
    [0xFF, 0xAA, register, low, high]
}

/// Feeds one decoded frame into the latest-value cells.
pub fn apply_frame(readings: &mut LatestReadings, frame: &ReadFrame) {
    match *frame {
        ReadFrame::Acceleration { x, y, z, temp: _ } => {
            readings.update_acceleration(Vector3 { x, y, z });
        }
        ReadFrame::Magnetometer { x, y, z, temp: _ } => {
            readings.update_magnetic_field(Vector3 { x, y, z });
        }
        ReadFrame::Quaternion { w, x, y, z } => match (Quaternion { w, x, y, z }).gravity() {
            Some(gravity) => readings.update_gravity(gravity),
            None => warn!(
                "Dropping quaternion frame without orientation: ({}, {}, {}, {})",
                w, x, y, z
            ),
        },
    }
}

pub struct HiwonderImu {
    port: Box<dyn serialport::SerialPort>,
    frame_parser: FrameParser,
}

impl HiwonderImu {
    pub fn new(interface: &str, baud_rate: u32, rate: OutputRate) -> Result<Self, LevelError> {
        let port = serialport::new(interface, baud_rate)
            .timeout(Duration::from_millis(500))
            .open()?;

        let mut imu = HiwonderImu {
            port,
            frame_parser: FrameParser::new(Some(512)),
        };

        imu.initialize(rate)?;
        Ok(imu)
    }

    fn initialize(&mut self, rate: OutputRate) -> Result<(), LevelError> {
        self.write_command(&command(REG_UNLOCK, 0xB588))?;
        self.write_command(&command(REG_CONTENT, OutputContent::level().bits()))?;
        self.write_command(&command(REG_SAVE, 0x0000))?;
        self.set_rate(rate)?;
        self.frame_parser.clear();
        debug!("Hiwonder IMU initialized at {:?}", rate);
        Ok(())
    }

    fn write_command(&mut self, command: &[u8]) -> Result<(), LevelError> {
        self.port
            .write_all(command)
            .map_err(|e| LevelError::WriteError(format!("Failed to write command: {}", e)))?;
        // The device needs time to apply each register write.
        thread::sleep(Duration::from_millis(30));
        Ok(())
    }

    pub fn set_rate(&mut self, rate: OutputRate) -> Result<(), LevelError> {
        self.write_command(&command(REG_RATE, rate.to_byte() as u16))
    }

    pub fn read_frames(&mut self) -> Result<Vec<ReadFrame>, LevelError> {
        let mut buffer = [0u8; 1024];
        match self.port.read(&mut buffer) {
            Ok(0) => Ok(vec![]),
            Ok(n) => Ok(self.frame_parser.parse(&buffer[..n])),
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(vec![]),
            Err(e) => Err(LevelError::ReadError(format!("Failed to read data: {}", e))),
        }
    }
}

#[derive(Debug)]
pub enum HiwonderCommand {
    Reset,
    Stop,
    SetRate(OutputRate),
}

/// Streams acceleration, magnetic field and gravity from a Hiwonder IMU.
pub struct HiwonderSource {
    readings: Arc<RwLock<LatestReadings>>,
    command_tx: mpsc::Sender<HiwonderCommand>,
    running: Arc<RwLock<bool>>,
}

impl HiwonderSource {
    pub fn new(interface: &str, baud_rate: u32, rate: OutputRate) -> Result<Self, LevelError> {
        let readings = Arc::new(RwLock::new(LatestReadings::new()));
        let running = Arc::new(RwLock::new(true));
        let (command_tx, command_rx) = mpsc::channel();

        let source = HiwonderSource {
            readings: Arc::clone(&readings),
            command_tx,
            running: Arc::clone(&running),
        };

        source.start_reading_thread(interface, baud_rate, rate, command_rx)?;

        Ok(source)
    }

    fn start_reading_thread(
        &self,
        interface: &str,
        baud_rate: u32,
        rate: OutputRate,
        command_rx: mpsc::Receiver<HiwonderCommand>,
    ) -> Result<(), LevelError> {
        let readings = Arc::clone(&self.readings);
        let running = Arc::clone(&self.running);
        let interface = interface.to_string();

        let (init_tx, init_rx) = mpsc::channel();

        thread::spawn(move || {
            // Open the device inside the thread and report the result back
            let mut imu = match HiwonderImu::new(&interface, baud_rate, rate) {
                Ok(imu) => {
                    let _ = init_tx.send(Ok(()));
                    imu
                }
                Err(e) => {
                    let _ = init_tx.send(Err(e));
                    return;
                }
            };
            info!("Reading Hiwonder IMU on {} at {} baud", interface, baud_rate);
            let mut current_rate = rate;

            while let Ok(guard) = running.read() {
                if !*guard {
                    break;
                }
                drop(guard);

                if let Ok(command) = command_rx.try_recv() {
                    match command {
                        HiwonderCommand::Reset => {
                            if let Err(e) = imu.initialize(current_rate) {
                                error!("Failed to reset IMU: {}", e);
                            }
                            match readings.write() {
                                Ok(mut r) => r.reset(),
                                Err(e) => error!("Failed to clear readings: {}", e),
                            }
                        }
                        HiwonderCommand::Stop => {
                            if let Ok(mut guard) = running.write() {
                                *guard = false;
                            }
                            break;
                        }
                        HiwonderCommand::SetRate(rate) => match imu.set_rate(rate) {
                            Ok(()) => current_rate = rate,
                            Err(e) => error!("Failed to set rate: {}", e),
                        },
                    }
                }

                match imu.read_frames() {
                    Ok(frames) if !frames.is_empty() => match readings.write() {
                        Ok(mut r) => {
                            for frame in &frames {
                                apply_frame(&mut r, frame);
                            }
                        }
                        Err(e) => {
                            error!("Failed to write readings: {}", e);
                            break;
                        }
                    },
                    Ok(_) => (),
                    Err(e) => error!("Error reading from IMU: {}", e),
                }

                // Max output rate is 200 Hz
                thread::sleep(Duration::from_millis(5));
            }
            debug!("Hiwonder reading thread exiting");
        });

        init_rx
            .recv()
            .map_err(|_| {
                LevelError::DeviceError("Failed to receive initialization result".to_string())
            })?
    }

    pub fn reset(&self) -> Result<(), LevelError> {
        self.command_tx.send(HiwonderCommand::Reset)?;
        Ok(())
    }

    pub fn set_rate(&self, rate: OutputRate) -> Result<(), LevelError> {
        self.command_tx.send(HiwonderCommand::SetRate(rate))?;
        Ok(())
    }
}

impl SensorSource for HiwonderSource {
    fn get_data(&self) -> Result<SensorPack, LevelError> {
        self.readings
            .write()?
            .take()
            .ok_or_else(|| LevelError::ReadError("No new data available".to_string()))
    }

    fn stop(&self) -> Result<(), LevelError> {
        if let Ok(mut running) = self.running.write() {
            *running = false;
        }
        // The thread may already be gone.
        let _ = self.command_tx.send(HiwonderCommand::Stop);
        Ok(())
    }
}

impl Drop for HiwonderSource {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}
