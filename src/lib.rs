//! # Urg Driver
//!
//! `urg` is a driver for Hokuyo URG series laser range finders speaking the
//! SCIP 2.0 protocol. It negotiates a session over RS-232 or TCP/IP,
//! discovers the sensor's geometry, commands distance, intensity and
//! multi-echo scans, and decodes the ASCII range frames with checksum
//! verification.
//!
//! ```ignore
//! # use urg::{MeasurementType, UrgDevice};
//! # fn main() -> urg::Result<()> {
//! let mut device = UrgDevice::open_serial("/dev/ttyACM0", 115200)?;
//! device.start_measurement(MeasurementType::Distance, 1, 0)?;
//! let mut time_stamp = 0;
//! let distances = device.get_distance(Some(&mut time_stamp))?;
//! for (index, distance) in distances.iter().enumerate() {
//!     println!("{:.3} rad: {} mm", device.index_to_radian(index as i32)?, distance);
//! }
//! # Ok(())
//! # }
//! ```

pub mod base;
pub mod checksum;
pub mod codec;
mod cmds;
mod internals;
mod params;
mod parsers;
mod protocol;
pub mod types;
pub mod utils;

pub use crate::base::serial::{find_ports, is_urg_port};
pub use crate::base::{Channel, Connection, Error, Result, SerialConnection, TcpipConnection};
pub use crate::params::SensorParameters;
pub use crate::types::{MeasurementType, SensorState};

use crate::internals::{
    IndicatedSettings, ReceivedSettings, BAUDRATE_CANDIDATES, ETHERNET_BAUDRATE, MAX_ECHO_SIZE,
    MAX_TIMEOUT_MS, PP_RESPONSE_LINES, STOP_MAX_READ_TIMES, VV_RESPONSE_LINES,
};
use crate::parsers::echoback::parse_echoback;
use crate::parsers::range_data::RangeDataParser;
use log::{trace, warn};
use std::time::Duration;

/// URG device driver.
///
/// A device owns its byte transport for the lifetime of the session. All I/O
/// runs inline on the caller's thread; blocking happens only inside
/// transport reads, each bounded by a millisecond timeout.
pub struct UrgDevice {
    channel: Option<Channel>,
    sensor_timeout_ms: u64,
    is_receiving: bool,
    is_laser_on: bool,
    remain_scan_times: i32,
    skip_scan: i32,
    measurement_type: MeasurementType,
    sensor: SensorParameters,
    indicated: IndicatedSettings,
    received: ReceivedSettings,
    product_type: String,
    product_version: String,
    product_serial_id: String,
    is_booting: bool,
}

impl UrgDevice {
    /// Opens a sensor on a serial device, bringing it to an idle SCIP 2.0
    /// session at `baudrate` no matter what state it was left in.
    pub fn open_serial(device: &str, baudrate: u32) -> Result<UrgDevice> {
        let connection = SerialConnection::open(device, baudrate)?;
        UrgDevice::connect(Box::new(connection), baudrate)
    }

    /// Opens an Ethernet sensor. These run SCIP at a fixed internal rate, so
    /// no baud rate is taken.
    pub fn open_tcp(address: &str, port: u16) -> Result<UrgDevice> {
        let connection = TcpipConnection::open(address, port)?;
        UrgDevice::connect(Box::new(connection), ETHERNET_BAUDRATE)
    }

    /// Opens a sensor over an already-established transport. The device
    /// takes ownership for the session and releases it on `close`.
    pub fn with_connection(connection: Box<dyn Connection>, baudrate: u32) -> Result<UrgDevice> {
        UrgDevice::connect(connection, baudrate)
    }

    fn connect(connection: Box<dyn Connection>, baudrate: u32) -> Result<UrgDevice> {
        let mut device = UrgDevice {
            channel: Some(Channel::new(connection)),
            sensor_timeout_ms: MAX_TIMEOUT_MS,
            // The sensor may still be streaming a measurement from a
            // previous session; assume so until a full block is consumed.
            is_receiving: true,
            is_laser_on: false,
            remain_scan_times: 0,
            skip_scan: 0,
            measurement_type: MeasurementType::Distance,
            sensor: SensorParameters::default(),
            indicated: IndicatedSettings::default(),
            received: ReceivedSettings::default(),
            product_type: String::new(),
            product_version: String::new(),
            product_serial_id: String::new(),
            is_booting: false,
        };

        if let Err(err) = device.initialize(baudrate) {
            device.close();
            return Err(err);
        }
        Ok(device)
    }

    fn initialize(&mut self, baudrate: u32) -> Result<()> {
        self.connect_urg_device(baudrate)?;
        self.update_sensor_parameter()
    }

    /// Releases the transport. Further calls fail with a not-connected
    /// error until a new device is opened.
    pub fn close(&mut self) {
        if let Some(mut channel) = self.channel.take() {
            channel.close();
        }
        self.product_type.clear();
        self.product_version.clear();
        self.product_serial_id.clear();
        self.is_receiving = false;
        self.is_laser_on = false;
    }

    /// Returns `true` while the session is usable.
    pub fn is_open(&self) -> bool {
        self.channel.as_ref().map_or(false, Channel::is_open)
    }

    /// Returns `true` when the last measurement failed because the sensor
    /// answered that it is still booting.
    pub fn is_booting(&self) -> bool {
        self.is_booting
    }

    /// Overrides the response timeout. Zero restores the default derived
    /// from the scan period at the next parameter discovery.
    pub fn set_timeout_msec(&mut self, msec: u64) {
        self.indicated.timeout_ms = msec;
        if msec > 0 {
            self.sensor_timeout_ms = msec;
        }
    }

    /// Restricts measurements to `first_step..=last_step`, collapsing
    /// `skip_step` adjacent steps (0 or 1 means none).
    pub fn set_scanning_parameter(
        &mut self,
        first_step: i32,
        last_step: i32,
        skip_step: i32,
    ) -> Result<()> {
        if first_step > last_step
            || first_step < self.sensor.first_index
            || last_step > self.sensor.last_index
            || !(0..=99).contains(&skip_step)
        {
            return Err(Error::InvalidParameter);
        }

        self.indicated.first_step = first_step;
        self.indicated.last_step = last_step;
        self.indicated.skip_step = skip_step;
        Ok(())
    }

    /// Starts a measurement session.
    ///
    /// `scan_times` of 1 performs a single scan; values of 100 and above are
    /// transmitted as an endless stream, since the wire format cannot count
    /// that high. `skip_scan` rotations are skipped between emitted frames.
    pub fn start_measurement(
        &mut self,
        kind: MeasurementType,
        scan_times: i32,
        skip_scan: i32,
    ) -> Result<()> {
        if !self.is_open() {
            return Err(Error::NotConnected);
        }
        if !(0..=9).contains(&skip_scan) {
            self.send_qt_and_drain(self.sensor_timeout_ms);
            return Err(Error::InvalidParameter);
        }

        let (single_scan_ch, continuous_scan_ch, scan_type_ch) = match kind {
            MeasurementType::Distance => ('G', 'M', 'D'),
            MeasurementType::DistanceIntensity => ('G', 'M', 'E'),
            MeasurementType::Multiecho => ('H', 'N', 'D'),
            MeasurementType::MultiechoIntensity => ('H', 'N', 'E'),
        };

        self.send_distance_command(
            scan_times,
            skip_scan,
            single_scan_ch,
            continuous_scan_ch,
            scan_type_ch,
        )?;
        self.measurement_type = kind;
        Ok(())
    }

    /// Receives one distance frame from a [`MeasurementType::Distance`]
    /// session. Values are millimeters, indexed from the first measured
    /// step; `time_stamp` receives the 24-bit sensor clock when given.
    pub fn get_distance(&mut self, time_stamp: Option<&mut i64>) -> Result<Vec<i64>> {
        self.ensure_measurement(MeasurementType::Distance)?;
        let size = self.max_data_size()?;
        let mut data = vec![0i64; size];
        let steps = self.receive_data(Some(&mut data), None, time_stamp)?;
        data.truncate(steps);
        Ok(data)
    }

    /// Receives one frame of distances paired with reflection intensities.
    pub fn get_distance_intensity(
        &mut self,
        time_stamp: Option<&mut i64>,
    ) -> Result<(Vec<i64>, Vec<u16>)> {
        self.ensure_measurement(MeasurementType::DistanceIntensity)?;
        let size = self.max_data_size()?;
        let mut data = vec![0i64; size];
        let mut intensity = vec![0u16; size];
        let steps = self.receive_data(Some(&mut data), Some(&mut intensity), time_stamp)?;
        data.truncate(steps);
        intensity.truncate(steps);
        Ok((data, intensity))
    }

    /// Receives one multi-echo distance frame. The result holds
    /// [`max_echo_size`](UrgDevice::max_echo_size) slots per step; echoes
    /// the sensor omitted are zero.
    pub fn get_multiecho(&mut self, time_stamp: Option<&mut i64>) -> Result<Vec<i64>> {
        self.ensure_measurement(MeasurementType::Multiecho)?;
        let size = self.max_data_size()? * MAX_ECHO_SIZE;
        let mut data = vec![0i64; size];
        let steps = self.receive_data(Some(&mut data), None, time_stamp)?;
        data.truncate(steps * MAX_ECHO_SIZE);
        Ok(data)
    }

    /// Receives one multi-echo frame of (distance, intensity) pairs.
    pub fn get_multiecho_intensity(
        &mut self,
        time_stamp: Option<&mut i64>,
    ) -> Result<(Vec<i64>, Vec<u16>)> {
        self.ensure_measurement(MeasurementType::MultiechoIntensity)?;
        let size = self.max_data_size()? * MAX_ECHO_SIZE;
        let mut data = vec![0i64; size];
        let mut intensity = vec![0u16; size];
        let steps = self.receive_data(Some(&mut data), Some(&mut intensity), time_stamp)?;
        data.truncate(steps * MAX_ECHO_SIZE);
        intensity.truncate(steps * MAX_ECHO_SIZE);
        Ok((data, intensity))
    }

    /// Stops a running measurement, absorbing residual frames until the
    /// sensor acknowledges the quit command.
    pub fn stop_measurement(&mut self) -> Result<()> {
        if !self.is_open() {
            return Err(Error::NotConnected);
        }

        let written = self.channel_mut()?.write(cmds::CMD_QUIT.as_bytes())?;
        if written != cmds::CMD_QUIT.len() {
            return Err(Error::Send);
        }

        let mut last_error = Error::Unknown;
        for _ in 0..STOP_MAX_READ_TIMES {
            // Frames already in flight keep arriving until the sensor sees
            // the QT; the acknowledgement block decodes as zero steps.
            match self.receive_data(None, None, None) {
                Ok(0) => {
                    self.is_laser_on = false;
                    self.is_receiving = false;
                    return Ok(());
                }
                Ok(_) => {}
                Err(err) => last_error = err,
            }
        }
        Err(last_error)
    }

    /// Reboots the sensor and closes the session. The command only takes
    /// effect on its second issue.
    pub fn reboot(&mut self) -> Result<()> {
        if !self.is_open() {
            return Err(Error::NotConnected);
        }

        for _ in 0..2 {
            if self
                .scip_transact(cmds::CMD_REBOOT, cmds::EXPECTED_RB, self.sensor_timeout_ms)
                .is_err()
            {
                return Err(Error::InvalidResponse { status: None });
            }
        }
        self.close();
        Ok(())
    }

    /// Stops any measurement and puts the sensor to sleep.
    pub fn sleep(&mut self) -> Result<()> {
        let _ = self.stop_measurement();
        self.scip_transact(cmds::CMD_SLEEP, cmds::EXPECTED_OK, self.sensor_timeout_ms)?;
        Ok(())
    }

    /// Wakes a sleeping sensor; any quit command does.
    pub fn wakeup(&mut self) -> Result<()> {
        self.stop_measurement()
    }

    /// Queries the sensor's operating state.
    pub fn sensor_state(&mut self) -> Result<SensorState> {
        if !self.is_open() {
            return Err(Error::NotConnected);
        }
        let lines = self.scip_transact(cmds::CMD_STATE, cmds::EXPECTED_OK, self.sensor_timeout_ms)?;
        Ok(parse_state(&lines))
    }

    /// Adjusting the sensor clock is not supported by this driver; the call
    /// always fails.
    pub fn set_sensor_time_stamp(&mut self, _time_stamp: i64) -> Result<()> {
        Err(Error::Unknown)
    }

    /// Product type from the `MODL` parameter, or an empty string while
    /// closed.
    pub fn sensor_product_type(&self) -> &str {
        if self.is_open() {
            &self.product_type
        } else {
            ""
        }
    }

    /// Firmware version, queried from the sensor on first access.
    pub fn sensor_product_version(&mut self) -> Result<String> {
        self.require_open()?;
        if self.product_version.is_empty() {
            self.update_version_information()?;
        }
        Ok(self.product_version.clone())
    }

    /// Serial id, queried from the sensor on first access.
    pub fn serial_id(&mut self) -> Result<String> {
        self.require_open()?;
        if self.product_serial_id.is_empty() {
            self.update_version_information()?;
        }
        Ok(self.product_serial_id.clone())
    }

    /// Geometry and timing discovered at open.
    pub fn sensor_parameters(&self) -> Result<&SensorParameters> {
        self.require_open()?;
        Ok(&self.sensor)
    }

    /// First valid step index.
    pub fn min_step(&self) -> Result<i32> {
        self.require_open()?;
        Ok(self.sensor.first_index)
    }

    /// Last valid step index.
    pub fn max_step(&self) -> Result<i32> {
        self.require_open()?;
        Ok(self.sensor.last_index)
    }

    /// Step pointing along the sensor's forward axis.
    pub fn front_step(&self) -> Result<i32> {
        self.require_open()?;
        Ok(self.sensor.front_index)
    }

    /// Steps in a full revolution.
    pub fn total_steps(&self) -> Result<i32> {
        self.require_open()?;
        Ok(self.sensor.area_resolution)
    }

    /// Smallest measurable distance in millimeters.
    pub fn min_distance(&self) -> Result<i64> {
        self.require_open()?;
        Ok(self.sensor.min_distance)
    }

    /// Largest measurable distance in millimeters.
    pub fn max_distance(&self) -> Result<i64> {
        self.require_open()?;
        Ok(self.sensor.max_distance)
    }

    /// Duration of one scan in microseconds.
    pub fn scan_usec(&self) -> Result<i64> {
        self.require_open()?;
        Ok(self.sensor.scan_usec)
    }

    /// Steps a full-range frame can hold.
    pub fn max_data_size(&self) -> Result<usize> {
        self.require_open()?;
        Ok((self.sensor.last_index + 1) as usize)
    }

    /// Echo slots per step in multi-echo frames.
    pub fn max_echo_size(&self) -> Result<usize> {
        self.require_open()?;
        Ok(MAX_ECHO_SIZE)
    }

    /// Angle of `step` in radians from the forward axis.
    pub fn step_to_radian(&self, step: i32) -> Result<f64> {
        self.require_open()?;
        Ok(utils::step_to_radian(
            &self.sensor,
            self.indicated.first_step,
            step,
        ))
    }

    /// Angle of `step` in degrees from the forward axis.
    pub fn step_to_degree(&self, step: i32) -> Result<f64> {
        Ok(self.step_to_radian(step)?.to_degrees())
    }

    /// Nearest step for an angle in radians.
    pub fn radian_to_step(&self, radian: f64) -> Result<i32> {
        self.require_open()?;
        Ok(utils::radian_to_step(
            &self.sensor,
            self.indicated.first_step,
            radian,
        ))
    }

    /// Nearest step for an angle in degrees.
    pub fn degree_to_step(&self, degree: f64) -> Result<i32> {
        self.radian_to_step(degree.to_radians())
    }

    /// Angle of a data-array index in radians. In multi-echo sessions the
    /// index space is step-major with one slot per echo.
    pub fn index_to_radian(&self, index: i32) -> Result<f64> {
        let step = if self.received.is_multiecho {
            index / MAX_ECHO_SIZE as i32
        } else {
            index
        };
        self.step_to_radian(step)
    }

    /// Angle of a data-array index in degrees.
    pub fn index_to_degree(&self, index: i32) -> Result<f64> {
        Ok(self.index_to_radian(index)?.to_degrees())
    }

    /// Data-array index nearest to an angle in radians.
    pub fn radian_to_index(&self, radian: f64) -> Result<i32> {
        let step = self.radian_to_step(radian)?;
        Ok(if self.received.is_multiecho {
            step * MAX_ECHO_SIZE as i32
        } else {
            step
        })
    }

    /// Data-array index nearest to an angle in degrees.
    pub fn degree_to_index(&self, degree: f64) -> Result<i32> {
        self.radian_to_index(degree.to_radians())
    }

    fn require_open(&self) -> Result<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(Error::NotConnected)
        }
    }

    fn channel_mut(&mut self) -> Result<&mut Channel> {
        self.channel.as_mut().ok_or(Error::NotConnected)
    }

    fn read_line(&mut self, timeout_ms: u64) -> Result<Option<Vec<u8>>> {
        self.channel_mut()?
            .read_line(Duration::from_millis(timeout_ms))
    }

    fn drain(&mut self, timeout_ms: u64) {
        if let Some(channel) = self.channel.as_mut() {
            channel.drain(Duration::from_millis(timeout_ms));
        }
    }

    /// Issues one command and consumes its response block, keeping the
    /// receiving flag in step with what was actually read off the wire.
    fn scip_transact(
        &mut self,
        command: &str,
        expected: &[&str],
        timeout_ms: u64,
    ) -> Result<Vec<String>> {
        let channel = self.channel.as_mut().ok_or(Error::NotConnected)?;
        let result = protocol::transact(channel, command, expected, Duration::from_millis(timeout_ms));
        match &result {
            // A rejected status still means a complete block was consumed.
            Ok(_) | Err(Error::InvalidResponse { status: Some(_) }) => self.is_receiving = false,
            _ => {}
        }
        result
    }

    fn send_qt_and_drain(&mut self, timeout_ms: u64) {
        if !self.is_receiving {
            return;
        }
        if let Some(channel) = self.channel.as_mut() {
            let _ = channel.write(cmds::CMD_QUIT.as_bytes());
            channel.drain(Duration::from_millis(timeout_ms));
        }
        self.is_receiving = false;
    }

    /// Brings the sensor from any plausible prior state into a clean
    /// SCIP 2.0 idle session at `urg_baudrate`.
    fn connect_urg_device(&mut self, urg_baudrate: u32) -> Result<()> {
        let mut candidates = BAUDRATE_CANDIDATES;
        if let Some(index) = candidates.iter().position(|rate| *rate == urg_baudrate) {
            candidates.swap(0, index);
        }

        for baudrate in candidates {
            self.channel_mut()?.change_baudrate(baudrate)?;
            trace!("probing sensor at {} baud", baudrate);

            match self.scip_transact(cmds::CMD_QUIT, cmds::EXPECTED_OK, MAX_TIMEOUT_MS) {
                Ok(lines) => match lines.first().map(String::as_str) {
                    Some("E") => {
                        // A SCIP 1.1 answer; switch the firmware over.
                        self.drain(MAX_TIMEOUT_MS);
                        let _ =
                            self.scip_transact(cmds::CMD_SCIP20, cmds::EXPECTED_OK, MAX_TIMEOUT_MS);
                        self.drain(MAX_TIMEOUT_MS);
                        return self.change_sensor_baudrate(baudrate, urg_baudrate);
                    }
                    Some("00P") => {
                        return self.change_sensor_baudrate(baudrate, urg_baudrate);
                    }
                    _ => {}
                },
                Err(Error::InvalidResponse { status: Some(code) }) if code == "0E" => {
                    // Time-adjustment mode; TM2 returns the sensor to idle.
                    let _ = self.scip_transact(cmds::CMD_TM_QUIT, cmds::EXPECTED_OK, MAX_TIMEOUT_MS);
                    return self.change_sensor_baudrate(baudrate, urg_baudrate);
                }
                Err(Error::InvalidResponse { status: None }) => {
                    // The echo-back did not match: the sensor is mid-stream
                    // emitting range data. Stop it and reuse this rate.
                    self.is_receiving = true;
                    self.send_qt_and_drain(MAX_TIMEOUT_MS);
                    return self.change_sensor_baudrate(baudrate, urg_baudrate);
                }
                Err(_) => {
                    self.drain(MAX_TIMEOUT_MS);
                }
            }
        }

        Err(Error::NotDetectBaudrate)
    }

    fn change_sensor_baudrate(&mut self, current_baudrate: u32, next_baudrate: u32) -> Result<()> {
        if current_baudrate == next_baudrate {
            return Ok(());
        }

        let command = cmds::baudrate_command(next_baudrate);
        match self.scip_transact(&command, cmds::EXPECTED_SS, self.sensor_timeout_ms) {
            Ok(_) => {}
            // 0F identifies an Ethernet sensor whose rate is fixed.
            Err(Error::InvalidResponse { status: Some(code) }) if code == "0F" => return Ok(()),
            Err(_) => return Err(Error::InvalidParameter),
        }

        self.channel_mut()?.change_baudrate(next_baudrate)?;
        // Wait out one timeout so the sensor can reconfigure its UART.
        self.drain(MAX_TIMEOUT_MS);
        Ok(())
    }

    fn update_sensor_parameter(&mut self) -> Result<()> {
        let lines = self.scip_transact(cmds::CMD_PARAMETER, cmds::EXPECTED_OK, MAX_TIMEOUT_MS)?;
        if lines.len() < PP_RESPONSE_LINES {
            self.send_qt_and_drain(MAX_TIMEOUT_MS);
            return Err(Error::InvalidResponse { status: None });
        }

        let (sensor, product_type) = params::parse_pp_lines(&lines)?;
        self.sensor = sensor;
        if let Some(product_type) = product_type {
            self.product_type = product_type;
        }

        if self.indicated.timeout_ms > 0 {
            self.sensor_timeout_ms = self.indicated.timeout_ms;
        } else {
            // Roughly sixteen scan periods.
            self.sensor_timeout_ms = (self.sensor.scan_usec >> 6).max(1) as u64;
        }

        self.set_scanning_parameter(self.sensor.first_index, self.sensor.last_index, 1)
    }

    fn update_version_information(&mut self) -> Result<()> {
        let lines = self.scip_transact(cmds::CMD_VERSION, cmds::EXPECTED_OK, MAX_TIMEOUT_MS)?;
        if lines.len() < VV_RESPONSE_LINES {
            self.send_qt_and_drain(MAX_TIMEOUT_MS);
            return Err(Error::InvalidResponse { status: None });
        }

        let (version, serial_id) = params::parse_vv_lines(&lines);
        if let Some(version) = version {
            self.product_version = version;
        }
        if let Some(serial_id) = serial_id {
            self.product_serial_id = serial_id;
        }
        Ok(())
    }

    fn ensure_measurement(&self, kind: MeasurementType) -> Result<()> {
        if !self.is_open() {
            return Err(Error::NotConnected);
        }
        if self.measurement_type != kind {
            warn!(
                "measurement type mismatch: session carries {:?}, caller asked for {:?}",
                self.measurement_type, kind
            );
            return Err(Error::InvalidParameter);
        }
        Ok(())
    }

    fn turn_on_laser(&mut self) -> Result<()> {
        if self.is_laser_on {
            return Ok(());
        }
        self.scip_transact(cmds::CMD_LASER_ON, cmds::EXPECTED_BM, self.sensor_timeout_ms)?;
        self.is_laser_on = true;
        Ok(())
    }

    fn send_distance_command(
        &mut self,
        scan_times: i32,
        skip_scan: i32,
        single_scan_ch: char,
        continuous_scan_ch: char,
        scan_type_ch: char,
    ) -> Result<()> {
        self.indicated.scan_times = scan_times.max(0);
        self.remain_scan_times = self.indicated.scan_times;
        self.skip_scan = skip_scan.max(0);
        if scan_times >= 100 {
            // Beyond 99 the wire format can only express "forever".
            self.indicated.scan_times = 0;
        }

        let command = if self.remain_scan_times == 1 {
            self.turn_on_laser()?;
            cmds::single_scan_command(
                single_scan_ch,
                scan_type_ch,
                self.indicated.first_step,
                self.indicated.last_step,
                self.indicated.skip_step,
            )
        } else {
            self.is_receiving = true;
            cmds::continuous_scan_command(
                continuous_scan_ch,
                scan_type_ch,
                self.indicated.first_step,
                self.indicated.last_step,
                self.indicated.skip_step,
                skip_scan,
                self.indicated.scan_times,
            )
        };

        let written = self.channel_mut()?.write(command.as_bytes())?;
        if written != command.len() {
            return Err(Error::Send);
        }
        Ok(())
    }

    /// Receives one response block of the running measurement, filling any
    /// of the provided outputs. Returns the number of decoded steps; a quit
    /// acknowledgement decodes as zero.
    fn receive_data(
        &mut self,
        mut range: Option<&mut [i64]>,
        mut intensity: Option<&mut [u16]>,
        mut time_stamp: Option<&mut i64>,
    ) -> Result<usize> {
        self.is_booting = false;

        // Skipped rotations delay the next frame; wait them out.
        let extended_timeout_ms = self.sensor_timeout_ms
            + 2 * (self.sensor.scan_usec * i64::from(self.skip_scan) / 1000).max(0) as u64;

        loop {
            let Some(echo) = self.read_line(extended_timeout_ms)? else {
                return Err(Error::NoResponse);
            };
            let echoback = parse_echoback(&echo);

            let Some(status) = self.read_line(self.sensor_timeout_ms)? else {
                return Err(Error::NoResponse);
            };
            if status.len() != 3 {
                self.send_qt_and_drain(self.sensor_timeout_ms);
                return Err(Error::InvalidResponse { status: None });
            }
            if status[2] != checksum::line_checksum(&status[..2]) {
                self.send_qt_and_drain(self.sensor_timeout_ms);
                return Err(Error::Checksum);
            }

            let Some(info) = echoback else {
                // A quit acknowledgement; one empty line closes the block.
                return match self.read_line(self.sensor_timeout_ms)? {
                    Some(line) if line.is_empty() => Ok(0),
                    _ => Err(Error::InvalidResponse { status: None }),
                };
            };

            if status.starts_with(b"10") {
                self.is_booting = true;
                // Not ready to measure yet; absorb the terminating empty
                // line before reporting.
                match self.read_line(self.sensor_timeout_ms)? {
                    Some(line) if line.is_empty() => {}
                    _ => self.send_qt_and_drain(self.sensor_timeout_ms),
                }
                return Err(Error::InvalidState);
            }

            if self.indicated.scan_times != 1 && status.starts_with(b"00") {
                // The acknowledgement of the continuous command, not data;
                // the next block carries the first frame.
                match self.read_line(self.sensor_timeout_ms)? {
                    Some(line) if line.is_empty() => continue,
                    _ => {
                        self.send_qt_and_drain(self.sensor_timeout_ms);
                        return Err(Error::InvalidResponse { status: None });
                    }
                }
            }

            // Single scans deliver data under 00, continuous ones under 99.
            let data_status: &[u8] = if self.indicated.scan_times == 1 {
                b"00"
            } else {
                b"99"
            };
            if !status.starts_with(data_status) {
                self.send_qt_and_drain(self.sensor_timeout_ms);
                return Err(Error::InvalidResponse {
                    status: Some(String::from_utf8_lossy(&status[..2]).into_owned()),
                });
            }

            self.received.is_multiecho = info.kind.is_multiecho();
            self.received.range_data_byte = info.range_data_byte;
            self.received.first_index = info.first_index;
            self.received.last_index = info.last_index;
            self.received.skip_step = info.skip_step;
            trace!(
                "receiving {:?} over steps {}..{} (skip {})",
                info.kind,
                self.received.first_index,
                self.received.last_index,
                self.received.skip_step
            );

            if let Some(stamp_line) = self.read_line(self.sensor_timeout_ms)? {
                if stamp_line.len() >= 4 {
                    if let Some(stamp) = time_stamp.as_deref_mut() {
                        *stamp = codec::decode(&stamp_line[..4]);
                    }
                }
            }

            let max_steps = (self.received.last_index - self.received.first_index).max(0) as usize;
            let mut parser =
                RangeDataParser::new(info.kind, self.received.range_data_byte, max_steps);
            let data_timeout_ms = self.sensor_timeout_ms
                + (i64::from(self.skip_scan) * self.sensor.scan_usec / 1000).max(0) as u64;

            let steps = loop {
                let Some(line) = self.read_line(data_timeout_ms)? else {
                    break parser.steps();
                };
                if line.is_empty() {
                    break parser.steps();
                }
                if let Err(err) =
                    parser.push_line(&line, range.as_deref_mut(), intensity.as_deref_mut())
                {
                    self.send_qt_and_drain(data_timeout_ms);
                    return Err(err);
                }
            };

            if self.indicated.scan_times > 1 && self.remain_scan_times > 0 {
                self.remain_scan_times -= 1;
                if self.remain_scan_times <= 0 {
                    // The requested number of frames has arrived.
                    if let Err(err) = self.stop_measurement() {
                        warn!("failed to stop after the last frame: {}", err);
                    }
                }
            }

            return Ok(steps);
        }
    }
}

impl Drop for UrgDevice {
    fn drop(&mut self) {
        // Ask a still-streaming sensor to stop; a dead link at teardown is
        // not worth reporting.
        if self.is_receiving && self.is_open() {
            if let Some(channel) = self.channel.as_mut() {
                let _ = channel.write(cmds::CMD_QUIT.as_bytes());
            }
        }
    }
}

fn parse_state(lines: &[String]) -> SensorState {
    const STATE_CODES: [(&str, SensorState); 14] = [
        ("000", SensorState::Idle),
        ("001", SensorState::Booting),
        ("002", SensorState::TimeAdjustment),
        ("003", SensorState::SingleScan),
        ("004", SensorState::MultiScan),
        ("005", SensorState::Sleep),
        ("006", SensorState::WakingUp),
        ("050", SensorState::LnBooting),
        ("051", SensorState::LnMeasurement),
        ("052", SensorState::LnResponding),
        ("053", SensorState::LnResponding),
        ("900", SensorState::ErrorDetected),
        ("901", SensorState::FirmwareUpdate),
        ("902", SensorState::Development),
    ];

    // The first entry is the status line; the state is reported on one of
    // the payload lines as a three-digit code with a readable label.
    for line in lines.iter().skip(1) {
        let value = line.strip_prefix("STAT:").unwrap_or(line);
        for (code, state) in STATE_CODES {
            if value.starts_with(code) {
                return state;
            }
        }
    }
    SensorState::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::testing::{data_line, field_line, ScriptedConnection};
    use std::cell::RefCell;
    use std::rc::Rc;

    const BAUD: u32 = 115200;

    fn qt_ack() -> Vec<u8> {
        let mut bytes = b"QT\n".to_vec();
        bytes.extend(data_line(b"00"));
        bytes.push(b'\n');
        bytes
    }

    fn bm_ack() -> Vec<u8> {
        let mut bytes = b"BM\n".to_vec();
        bytes.extend(data_line(b"00"));
        bytes.push(b'\n');
        bytes
    }

    fn short_response(echo: &[u8], status: &[u8]) -> Vec<u8> {
        let mut bytes = echo.to_vec();
        bytes.push(b'\n');
        bytes.extend(data_line(status));
        bytes.push(b'\n');
        bytes
    }

    fn pp_response() -> Vec<u8> {
        let mut bytes = b"PP\n".to_vec();
        bytes.extend(data_line(b"00"));
        for field in [
            "MODL:UTM-30LX(Hokuyo Automatic Co.,Ltd.)",
            "DMIN:23",
            "DMAX:60000",
            "ARES:1440",
            "AMIN:0",
            "AMAX:1080",
            "AFRT:540",
            "SCAN:2400",
        ] {
            bytes.extend(field_line(field));
        }
        bytes.push(b'\n');
        bytes
    }

    fn scan_block(echo: &[u8], status: &[u8], time_stamp: i64, payload: &[u8]) -> Vec<u8> {
        let mut bytes = echo.to_vec();
        bytes.push(b'\n');
        bytes.extend(data_line(status));
        bytes.extend(data_line(&codec::encode(time_stamp, 4)));
        bytes.extend(data_line(payload));
        bytes.push(b'\n');
        bytes
    }

    fn open_device() -> (Rc<RefCell<ScriptedConnection>>, UrgDevice) {
        let connection = Rc::new(RefCell::new(ScriptedConnection::new(BAUD)));
        {
            let mut sensor = connection.borrow_mut();
            sensor.reply(BAUD, b"QT\n", &qt_ack());
            sensor.reply(BAUD, b"PP\n", &pp_response());
        }
        let device = UrgDevice::with_connection(Box::new(connection.clone()), BAUD).unwrap();
        (connection, device)
    }

    #[test]
    fn open_discovers_sensor_parameters() {
        let (connection, device) = open_device();

        assert!(device.is_open());
        assert_eq!(device.sensor_product_type(), "UTM-30LX");
        assert_eq!(device.min_step().unwrap(), 0);
        assert_eq!(device.max_step().unwrap(), 1080);
        assert_eq!(device.front_step().unwrap(), 540);
        assert_eq!(device.total_steps().unwrap(), 1440);
        assert_eq!(device.min_distance().unwrap(), 23);
        assert_eq!(device.max_distance().unwrap(), 60000);
        assert_eq!(device.scan_usec().unwrap(), 25000);
        assert_eq!(device.max_data_size().unwrap(), 1081);
        // Derived from the 25 ms scan period.
        assert_eq!(device.sensor_timeout_ms, 390);
        assert_eq!(connection.borrow().written, b"QT\nPP\n");
    }

    #[test]
    fn version_information_is_queried_lazily() {
        let (connection, mut device) = open_device();
        {
            let mut response = b"VV\n".to_vec();
            response.extend(data_line(b"00"));
            for field in [
                "VEND:Hokuyo Automatic Co.,Ltd.",
                "PROD:SOKUIKI Sensor UTM-30LX",
                "FIRM:1.20.02(16/Jul./2013)",
                "PROT:SCIP 2.0",
                "SERI:H1620245",
            ] {
                response.extend(field_line(field));
            }
            response.push(b'\n');
            connection.borrow_mut().reply(BAUD, b"VV\n", &response);
        }

        assert_eq!(device.sensor_product_version().unwrap(), "1.20.02");
        assert_eq!(device.serial_id().unwrap(), "H1620245");
        // The single staged response satisfied both accessors.
        assert_eq!(device.serial_id().unwrap(), "H1620245");
    }

    #[test]
    fn single_distance_scan() {
        let (connection, mut device) = open_device();
        device.set_scanning_parameter(0, 10, 0).unwrap();

        let mut payload = Vec::new();
        for step in 0..11i64 {
            payload.extend(codec::encode(1000 + step, 3));
        }
        {
            let mut sensor = connection.borrow_mut();
            sensor.reply(BAUD, b"BM\n", &bm_ack());
            sensor.reply(
                BAUD,
                b"GD0000001000\n",
                &scan_block(b"GD0000001000", b"00", 654321, &payload),
            );
        }

        device
            .start_measurement(MeasurementType::Distance, 1, 0)
            .unwrap();
        let mut time_stamp = 0i64;
        let data = device.get_distance(Some(&mut time_stamp)).unwrap();

        assert_eq!(data.len(), 11);
        assert_eq!(data[0], 1000);
        assert_eq!(data[10], 1010);
        assert_eq!(time_stamp, 654321);
        assert!(device.is_laser_on);
        assert!(!device.is_receiving);
        assert!(connection.borrow().written.ends_with(b"BM\nGD0000001000\n"));
    }

    #[test]
    fn continuous_multiecho_intensity_scan() {
        let (connection, mut device) = open_device();
        device.set_scanning_parameter(0, 2, 0).unwrap();

        let command = b"NE0000000200100\n";
        let mut payload = Vec::new();
        payload.extend(codec::encode(1500, 3));
        payload.extend(codec::encode(70, 3));
        payload.push(b'&');
        payload.extend(codec::encode(1510, 3));
        payload.extend(codec::encode(71, 3));
        payload.extend(codec::encode(1600, 3));
        payload.extend(codec::encode(80, 3));
        payload.extend(codec::encode(1700, 3));
        payload.extend(codec::encode(90, 3));
        {
            let mut sensor = connection.borrow_mut();
            // The command acknowledgement precedes the first data block.
            let mut response = short_response(command.strip_suffix(b"\n").unwrap(), b"00");
            response.extend(scan_block(b"NE0000000200100", b"99", 777, &payload));
            sensor.reply(BAUD, command, &response);
        }

        device
            .start_measurement(MeasurementType::MultiechoIntensity, 100, 1)
            .unwrap();
        let (ranges, intensities) = device.get_multiecho_intensity(None).unwrap();

        assert_eq!(ranges, vec![1500, 1510, 0, 1600, 0, 0, 1700, 0, 0]);
        assert_eq!(intensities, vec![70, 71, 0, 80, 0, 0, 90, 0, 0]);
        assert!(device.is_receiving);
    }

    #[test]
    fn checksum_failure_aborts_and_leaves_the_session_reusable() {
        let (connection, mut device) = open_device();
        device.set_scanning_parameter(0, 10, 0).unwrap();

        let command = b"MD0000001000000\n";
        let mut payload = Vec::new();
        for step in 0..11i64 {
            payload.extend(codec::encode(2000 + step, 3));
        }
        let mut corrupted = data_line(&payload);
        let checksum_index = corrupted.len() - 2;
        corrupted[checksum_index] ^= 0x01;
        {
            let mut sensor = connection.borrow_mut();
            let mut response = short_response(command.strip_suffix(b"\n").unwrap(), b"00");
            response.extend(b"MD0000001000000\n");
            response.extend(data_line(b"99"));
            response.extend(data_line(&codec::encode(5, 4)));
            response.extend(&corrupted);
            response.push(b'\n');
            sensor.reply(BAUD, command, &response);
            sensor.reply(BAUD, b"QT\n", &qt_ack());
        }

        device
            .start_measurement(MeasurementType::Distance, 0, 0)
            .unwrap();
        let result = device.get_distance(None);

        assert!(matches!(result, Err(Error::Checksum)));
        assert!(!device.is_receiving);
        assert!(connection.borrow().written.ends_with(b"QT\n"));
        // The abort drained the residue; nothing is left mid-block.
        assert_eq!(connection.borrow().remaining(BAUD), 0);

        connection.borrow_mut().reply(BAUD, b"BM\n", &bm_ack());
        device
            .start_measurement(MeasurementType::Distance, 1, 0)
            .unwrap();
    }

    #[test]
    fn mid_line_stall_keeps_the_steps_already_decoded() {
        let (connection, mut device) = open_device();
        device.set_scanning_parameter(0, 10, 0).unwrap();

        let mut first = Vec::new();
        for step in 0..6i64 {
            first.extend(codec::encode(5000 + step, 3));
        }
        let mut second = Vec::new();
        for step in 6..11i64 {
            second.extend(codec::encode(5000 + step, 3));
        }
        {
            let mut sensor = connection.borrow_mut();
            sensor.reply(BAUD, b"BM\n", &bm_ack());
            let mut response = b"GD0000001000\n".to_vec();
            response.extend(data_line(b"00"));
            response.extend(data_line(&codec::encode(9, 4)));
            response.extend(data_line(&first));
            // The second data line stalls before its terminating LF.
            let mut truncated = data_line(&second);
            truncated.pop();
            response.extend(truncated);
            sensor.reply(BAUD, b"GD0000001000\n", &response);
        }

        device
            .start_measurement(MeasurementType::Distance, 1, 0)
            .unwrap();
        let data = device.get_distance(None).unwrap();

        // The stalled line is dropped; the completed lines still count.
        assert_eq!(data, vec![5000, 5001, 5002, 5003, 5004, 5005]);
    }

    #[test]
    fn autobaud_skips_a_candidate_that_stalls_mid_line() {
        let connection = Rc::new(RefCell::new(ScriptedConnection::new(19200)));
        {
            let mut sensor = connection.borrow_mut();
            // The requested rate answers a lone byte and stalls; the probe
            // must treat that as no response, not as a mid-stream sensor.
            sensor.reply(115200, b"QT\n", b"Q");
            sensor.reply(19200, b"QT\n", &qt_ack());
            sensor.reply(19200, b"SS115200\n", &short_response(b"SS115200", b"00"));
            sensor.reply(115200, b"PP\n", &pp_response());
        }

        let device = UrgDevice::with_connection(Box::new(connection.clone()), 115200).unwrap();

        assert!(device.is_open());
        let written = String::from_utf8(connection.borrow().written.clone()).unwrap();
        assert!(written.contains("SS115200\n"));
        // One probe per candidate rate; no extra quit-and-drain recovery.
        assert_eq!(written.matches("QT\n").count(), 3);
    }

    #[test]
    fn autobaud_finds_a_scip11_sensor_on_another_rate() {
        let connection = Rc::new(RefCell::new(ScriptedConnection::new(19200)));
        {
            let mut sensor = connection.borrow_mut();
            sensor.reply(19200, b"QT\n", b"QT\nE\n\n");
            let mut scip20 = b"SCIP2.0\n".to_vec();
            scip20.extend(data_line(b"00"));
            scip20.push(b'\n');
            sensor.reply(19200, b"SCIP2.0\n", &scip20);
            sensor.reply(
                19200,
                b"SS115200\n",
                &short_response(b"SS115200", b"00"),
            );
            sensor.reply(115200, b"PP\n", &pp_response());
        }

        let device = UrgDevice::with_connection(Box::new(connection.clone()), 115200).unwrap();

        assert!(device.is_open());
        let written = String::from_utf8(connection.borrow().written.clone()).unwrap();
        assert!(written.contains("SCIP2.0\n"));
        assert!(written.contains("SS115200\n"));
    }

    #[test]
    fn bootstrap_leaves_time_adjustment_mode() {
        let connection = Rc::new(RefCell::new(ScriptedConnection::new(BAUD)));
        {
            let mut sensor = connection.borrow_mut();
            sensor.reply(BAUD, b"QT\n", &short_response(b"QT", b"0E"));
            sensor.reply(BAUD, b"TM2\n", &short_response(b"TM2", b"00"));
            sensor.reply(BAUD, b"PP\n", &pp_response());
        }

        let device = UrgDevice::with_connection(Box::new(connection.clone()), BAUD).unwrap();

        assert!(device.is_open());
        assert!(String::from_utf8_lossy(&connection.borrow().written).contains("TM2\n"));
    }

    #[test]
    fn bootstrap_stops_a_streaming_sensor() {
        let connection = Rc::new(RefCell::new(ScriptedConnection::new(BAUD)));
        {
            let mut sensor = connection.borrow_mut();
            // Mid-stream range data instead of a QT echo-back.
            let mut garbage = data_line(&codec::encode(1234, 3));
            garbage.extend(data_line(&codec::encode(99, 3)));
            garbage.push(b'\n');
            sensor.reply(BAUD, b"QT\n", &garbage);
            sensor.reply(BAUD, b"QT\n", &qt_ack());
            sensor.reply(BAUD, b"PP\n", &pp_response());
        }

        let device = UrgDevice::with_connection(Box::new(connection.clone()), BAUD).unwrap();

        assert!(device.is_open());
        let written = connection.borrow().written.clone();
        let quits = written.windows(3).filter(|bytes| bytes == b"QT\n").count();
        assert_eq!(quits, 2);
    }

    #[test]
    fn state_not_ready_sets_the_booting_flag() {
        let (connection, mut device) = open_device();
        device.set_scanning_parameter(0, 10, 0).unwrap();
        {
            let mut sensor = connection.borrow_mut();
            sensor.reply(BAUD, b"BM\n", &bm_ack());
            sensor.reply(
                BAUD,
                b"GD0000001000\n",
                &short_response(b"GD0000001000", b"10"),
            );
        }

        device
            .start_measurement(MeasurementType::Distance, 1, 0)
            .unwrap();
        let result = device.get_distance(None);

        assert!(matches!(result, Err(Error::InvalidState)));
        assert!(device.is_booting());
    }

    #[test]
    fn stop_measurement_absorbs_residual_frames() {
        let (connection, mut device) = open_device();
        device.set_scanning_parameter(0, 2, 0).unwrap();

        let command = b"ND0000000200000\n";
        {
            let mut sensor = connection.borrow_mut();
            sensor.reply(
                BAUD,
                command,
                &short_response(command.strip_suffix(b"\n").unwrap(), b"00"),
            );
            // One frame still in flight when the quit arrives.
            let mut payload = Vec::new();
            payload.extend(codec::encode(3000, 3));
            payload.push(b'&');
            payload.extend(codec::encode(3010, 3));
            payload.extend(codec::encode(3100, 3));
            payload.extend(codec::encode(3200, 3));
            let mut response = scan_block(b"ND0000000200000", b"99", 42, &payload);
            response.extend(qt_ack());
            sensor.reply(BAUD, b"QT\n", &response);
        }

        device
            .start_measurement(MeasurementType::Multiecho, 100, 0)
            .unwrap();
        device.stop_measurement().unwrap();

        assert!(!device.is_receiving);
        assert!(!device.is_laser_on);
        assert_eq!(connection.borrow().remaining(BAUD), 0);
    }

    #[test]
    fn counted_scans_stop_themselves() {
        let (connection, mut device) = open_device();
        device.set_scanning_parameter(0, 2, 0).unwrap();

        let command = b"MD0000000200002\n";
        let mut payload = Vec::new();
        for step in 0..3i64 {
            payload.extend(codec::encode(4000 + step, 3));
        }
        {
            let mut sensor = connection.borrow_mut();
            let mut response = short_response(command.strip_suffix(b"\n").unwrap(), b"00");
            response.extend(scan_block(b"MD0000000200002", b"99", 10, &payload));
            response.extend(scan_block(b"MD0000000200001", b"99", 11, &payload));
            sensor.reply(BAUD, command, &response);
            sensor.reply(BAUD, b"QT\n", &qt_ack());
        }

        device
            .start_measurement(MeasurementType::Distance, 2, 0)
            .unwrap();
        assert_eq!(device.get_distance(None).unwrap().len(), 3);
        assert!(device.is_receiving);
        assert_eq!(device.get_distance(None).unwrap().len(), 3);
        assert!(!device.is_receiving);
        assert!(connection.borrow().written.ends_with(b"QT\n"));
    }

    #[test]
    fn legacy_gs_echo_selects_two_byte_ranges() {
        let (connection, mut device) = open_device();
        device.set_scanning_parameter(0, 3, 0).unwrap();

        let mut payload = Vec::new();
        for step in 0..4i64 {
            payload.extend(codec::encode(300 + step, 2));
        }
        {
            let mut sensor = connection.borrow_mut();
            sensor.reply(BAUD, b"BM\n", &bm_ack());
            // The sensor answers in the legacy two-byte encoding.
            sensor.reply(
                BAUD,
                b"GD0000000300\n",
                &scan_block(b"GS0000000300", b"00", 1, &payload),
            );
        }

        device
            .start_measurement(MeasurementType::Distance, 1, 0)
            .unwrap();
        let data = device.get_distance(None).unwrap();
        assert_eq!(data, vec![300, 301, 302, 303]);
    }

    #[test]
    fn sensor_state_parses_the_reply_table() {
        let (connection, mut device) = open_device();
        {
            let mut response = b"%ST\n".to_vec();
            response.extend(data_line(b"00"));
            response.extend(field_line("000 Idle"));
            response.push(b'\n');
            connection.borrow_mut().reply(BAUD, b"%ST\n", &response);
        }

        assert_eq!(device.sensor_state().unwrap(), SensorState::Idle);
    }

    #[test]
    fn reboot_issues_the_command_twice_and_closes() {
        let (connection, mut device) = open_device();
        {
            let mut sensor = connection.borrow_mut();
            sensor.reply(BAUD, b"RB\n", &short_response(b"RB", b"01"));
            sensor.reply(BAUD, b"RB\n", &short_response(b"RB", b"00"));
        }

        device.reboot().unwrap();

        assert!(!device.is_open());
        let written = connection.borrow().written.clone();
        let reboots = written.windows(3).filter(|bytes| bytes == b"RB\n").count();
        assert_eq!(reboots, 2);
    }

    #[test]
    fn closed_devices_refuse_everything() {
        let (_connection, mut device) = open_device();
        device.close();

        assert!(!device.is_open());
        assert!(matches!(
            device.start_measurement(MeasurementType::Distance, 1, 0),
            Err(Error::NotConnected)
        ));
        assert!(matches!(device.get_distance(None), Err(Error::NotConnected)));
        assert!(matches!(device.min_step(), Err(Error::NotConnected)));
        assert!(matches!(device.stop_measurement(), Err(Error::NotConnected)));
        assert_eq!(device.sensor_product_type(), "");
    }

    #[test]
    fn out_of_range_arguments_are_rejected() {
        let (_connection, mut device) = open_device();

        assert!(matches!(
            device.set_scanning_parameter(10, 5, 0),
            Err(Error::InvalidParameter)
        ));
        assert!(matches!(
            device.set_scanning_parameter(-1, 5, 0),
            Err(Error::InvalidParameter)
        ));
        assert!(matches!(
            device.set_scanning_parameter(0, 2000, 0),
            Err(Error::InvalidParameter)
        ));
        assert!(matches!(
            device.set_scanning_parameter(0, 10, 100),
            Err(Error::InvalidParameter)
        ));
        assert!(matches!(
            device.start_measurement(MeasurementType::Distance, 1, 10),
            Err(Error::InvalidParameter)
        ));
        assert!(device.set_sensor_time_stamp(0).is_err());
    }

    #[test]
    fn angle_conversions_follow_the_front_step() {
        let (_connection, device) = open_device();

        assert_eq!(device.step_to_radian(540).unwrap(), 0.0);
        assert_eq!(device.radian_to_step(0.0).unwrap(), 540);
        assert!((device.step_to_degree(900).unwrap() - 90.0).abs() < 1e-9);
        assert_eq!(device.degree_to_step(90.0).unwrap(), 900);
    }

    #[test]
    fn wrong_get_call_for_the_running_type_is_rejected() {
        let (connection, mut device) = open_device();
        device.set_scanning_parameter(0, 2, 0).unwrap();
        {
            let mut sensor = connection.borrow_mut();
            let command = b"MD0000000200000\n";
            sensor.reply(
                BAUD,
                command,
                &short_response(command.strip_suffix(b"\n").unwrap(), b"00"),
            );
        }

        device
            .start_measurement(MeasurementType::Distance, 0, 0)
            .unwrap();
        assert!(matches!(
            device.get_multiecho(None),
            Err(Error::InvalidParameter)
        ));
    }
}
