pub mod frame;
pub mod registers;

use crate::max31855::registers::*;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::{MODE_0, Mode, Operation, SpiBus, SpiDevice};
use embedded_hal_bus::spi::ExclusiveDevice;

pub use frame::{FaultStatus, Frame};

/// Clock idles low, data sampled on the leading edge.
pub const MODE: Mode = MODE_0;
pub const DEFAULT_FREQUENCY_HZ: u32 = MAX_SCK_HZ;

/// Bus settings the MAX31855 needs. The driver cannot program the bus
/// itself; the HAL SPI peripheral should be set up from these values before
/// it is handed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    pub frequency_hz: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_FREQUENCY_HZ)
    }
}

impl Config {
    pub const fn new(frequency_hz: u32) -> Self {
        Self { frequency_hz }
    }

    pub const fn mode(&self) -> Mode {
        MODE
    }
}

/// MAX31855 on an SPI device.
///
/// The device owns the chip-select line. Every read is one transaction:
/// CS low, a short setup delay, four bytes clocked in MSB first, CS high.
/// Nothing is retried and nothing is cached between reads.
pub struct Max31855<SPI> {
    spi: SPI,
    config: Config,
}

impl<BUS, CS, D> Max31855<ExclusiveDevice<BUS, CS, D>>
where
    BUS: SpiBus,
    CS: OutputPin,
    D: DelayNs,
{
    /// Take sole ownership of a bus and a chip-select pin.
    ///
    /// The pin is driven high (deselected) before this returns, so the chip
    /// never sees a partial frame ahead of the first read.
    pub fn from_bus(bus: BUS, cs: CS, delay: D, config: Config) -> Result<Self, CS::Error> {
        let spi = ExclusiveDevice::new(bus, cs, delay)?;
        Ok(Self::with_config(spi, config))
    }
}

impl<SPI> Max31855<SPI>
where
    SPI: SpiDevice,
{
    pub fn new(spi: SPI) -> Self {
        Self::with_config(spi, Config::default())
    }

    pub fn with_config(spi: SPI, config: Config) -> Self {
        if config.frequency_hz > MAX_SCK_HZ {
            warn!(
                "MAX31855 SCK {} Hz exceeds the {} Hz maximum",
                config.frequency_hz,
                MAX_SCK_HZ
            );
        }
        Self { spi, config }
    }

    /// Always returns `true`.
    ///
    /// The MAX31855 has no ID register, so there is nothing to probe: a
    /// missing chip only shows up as implausible frames.
    pub fn begin(&mut self) -> bool {
        debug!("MAX31855 ready, SCK {} Hz", self.config.frequency_hz);
        true
    }

    pub fn config(&self) -> Config {
        self.config
    }

    /// Give back the SPI device.
    pub fn release(self) -> SPI {
        self.spi
    }

    /// Read one raw 32-bit frame.
    ///
    /// Bus errors reported by the HAL are returned. A glitch the HAL does not
    /// see is indistinguishable from valid data; only the frame's own fault
    /// bits can be trusted.
    pub fn read_raw_data(&mut self) -> Result<u32, SPI::Error> {
        // Zeros are shifted out, the chip ignores its input
        let mut buffer = [0u8; FRAME_LEN];

        self.spi.transaction(&mut [
            Operation::DelayNs(CS_SETUP_NS),
            Operation::TransferInPlace(&mut buffer),
        ])?;

        let raw = u32::from_be_bytes(buffer);
        trace!("MAX31855 frame {:#x}", raw);
        Ok(raw)
    }

    /// Read and decode one frame. Use this when the temperature and the
    /// fault bits must come from the same conversion.
    pub fn read_frame(&mut self) -> Result<Frame, SPI::Error> {
        self.read_raw_data().map(Frame)
    }

    /// Thermocouple temperature in °C, NaN if the chip flags a fault.
    pub fn read_celsius(&mut self) -> Result<f32, SPI::Error> {
        Ok(self.read_frame()?.celsius())
    }

    /// Fault subtype bits: bit 0 open circuit, bit 1 short to GND, bit 2
    /// short to VCC.
    ///
    /// This is a separate transaction from `read_celsius`, and the bits are
    /// returned even when the fault flag (bit 16) is clear.
    pub fn read_error(&mut self) -> Result<u8, SPI::Error> {
        Ok(self.read_frame()?.error_code())
    }

    pub fn read_fault_status(&mut self) -> Result<FaultStatus, SPI::Error> {
        Ok(self.read_frame()?.fault_status())
    }

    /// Cold-junction (die) temperature in °C.
    pub fn read_internal_celsius(&mut self) -> Result<f32, SPI::Error> {
        Ok(self.read_frame()?.internal_celsius())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::spi::{ErrorKind, ErrorType, Phase, Polarity};
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as PinState, Transaction as PinTransaction,
    };
    use embedded_hal_mock::eh1::spi::{Mock as SpiMock, Transaction as SpiTransaction};
    use embedded_hal_mock::eh1::MockError;
    use std::io;

    fn frame_read(response: [u8; 4]) -> Vec<SpiTransaction<u8>> {
        vec![
            SpiTransaction::transaction_start(),
            SpiTransaction::delay(CS_SETUP_NS),
            SpiTransaction::transfer_in_place(vec![0x00; 4], response.to_vec()),
            SpiTransaction::transaction_end(),
        ]
    }

    #[test]
    fn read_raw_data_assembles_big_endian() {
        let spi = SpiMock::new(&frame_read([0x12, 0x34, 0x56, 0x78]));
        let mut sensor = Max31855::new(spi);

        assert_eq!(sensor.read_raw_data().unwrap(), 0x1234_5678);

        sensor.release().done();
    }

    #[test]
    fn read_celsius() {
        let mut expectations = frame_read([0x0C, 0x9C, 0x00, 0x00]);
        expectations.extend(frame_read([0xFF, 0xFC, 0x00, 0x00]));
        expectations.extend(frame_read([0x06, 0x40, 0x00, 0x00]));
        let spi = SpiMock::new(&expectations);
        let mut sensor = Max31855::new(spi);

        assert_eq!(sensor.read_celsius().unwrap(), 201.75);
        assert_eq!(sensor.read_celsius().unwrap(), -0.25);
        assert_eq!(sensor.read_celsius().unwrap(), 100.0);

        sensor.release().done();
    }

    #[test]
    fn read_celsius_is_nan_on_fault() {
        let mut expectations = frame_read([0x00, 0x01, 0x00, 0x00]);
        expectations.extend(frame_read([0x0C, 0x9D, 0x19, 0x01]));
        let spi = SpiMock::new(&expectations);
        let mut sensor = Max31855::new(spi);

        assert!(sensor.read_celsius().unwrap().is_nan());
        assert!(sensor.read_celsius().unwrap().is_nan());

        sensor.release().done();
    }

    #[test]
    fn read_error_issues_its_own_transaction() {
        let mut expectations = frame_read([0x00, 0x01, 0x00, 0x00]);
        expectations.extend(frame_read([0x00, 0x01, 0x00, 0x01]));
        // Subtype bits without the fault flag are still reported
        expectations.extend(frame_read([0x0C, 0x9C, 0x00, 0x06]));
        let spi = SpiMock::new(&expectations);
        let mut sensor = Max31855::new(spi);

        assert_eq!(sensor.read_error().unwrap(), 0);
        assert_eq!(sensor.read_error().unwrap(), 1);
        assert_eq!(sensor.read_error().unwrap(), 6);

        sensor.release().done();
    }

    #[test]
    fn read_frame_gives_consistent_snapshot() {
        let spi = SpiMock::new(&frame_read([0x0C, 0x9D, 0x19, 0x04]));
        let mut sensor = Max31855::new(spi);

        let frame = sensor.read_frame().unwrap();
        assert!(frame.celsius().is_nan());
        assert_eq!(frame.thermocouple_counts(), 807);
        assert_eq!(frame.internal_celsius(), 25.0);
        assert_eq!(frame.error_code(), 4);
        assert!(frame.fault_status().short_to_vcc);

        sensor.release().done();
    }

    #[test]
    fn read_fault_status_and_internal() {
        let mut expectations = frame_read([0x00, 0x01, 0x19, 0x02]);
        expectations.extend(frame_read([0x0C, 0x9C, 0xFF, 0xF0]));
        let spi = SpiMock::new(&expectations);
        let mut sensor = Max31855::new(spi);

        let status = sensor.read_fault_status().unwrap();
        assert!(status.fault);
        assert!(status.short_to_gnd);
        assert!(!status.open_circuit);
        assert_eq!(sensor.read_internal_celsius().unwrap(), -0.0625);

        sensor.release().done();
    }

    #[test]
    fn begin_and_config() {
        let expectations: [SpiTransaction<u8>; 0] = [];
        let spi = SpiMock::new(&expectations);
        let mut sensor = Max31855::new(spi);

        assert!(sensor.begin());
        assert_eq!(sensor.config().frequency_hz, 5_000_000);
        assert_eq!(sensor.config().mode().polarity, Polarity::IdleLow);
        assert_eq!(
            sensor.config().mode().phase,
            Phase::CaptureOnFirstTransition
        );

        let mut sensor = Max31855::with_config(sensor.release(), Config::new(1_000_000));
        assert!(sensor.begin());
        assert_eq!(sensor.config(), Config::new(1_000_000));

        sensor.release().done();
    }

    /// Bus that answers every 4-byte transfer with the next scripted frame
    /// and counts the transfers.
    struct ScriptedBus {
        frames: Vec<u32>,
        transfers: usize,
    }

    impl ScriptedBus {
        fn new(frames: &[u32]) -> Self {
            Self {
                frames: frames.to_vec(),
                transfers: 0,
            }
        }
    }

    impl ErrorType for ScriptedBus {
        type Error = ErrorKind;
    }

    impl SpiBus for ScriptedBus {
        fn read(&mut self, _words: &mut [u8]) -> Result<(), Self::Error> {
            Err(ErrorKind::Other)
        }

        fn write(&mut self, _words: &[u8]) -> Result<(), Self::Error> {
            Err(ErrorKind::Other)
        }

        fn transfer(&mut self, _read: &mut [u8], _write: &[u8]) -> Result<(), Self::Error> {
            Err(ErrorKind::Other)
        }

        fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
            assert_eq!(words, &[0u8; 4]);
            let frame = self.frames.get(self.transfers).ok_or(ErrorKind::Other)?;
            words.copy_from_slice(&frame.to_be_bytes());
            self.transfers += 1;
            Ok(())
        }

        fn flush(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    #[test]
    fn chip_select_high_after_construction() {
        let cs = PinMock::new(&[PinTransaction::set(PinState::High)]);

        let sensor = Max31855::from_bus(
            ScriptedBus::new(&[]),
            cs.clone(),
            NoopDelay::new(),
            Config::default(),
        )
        .unwrap();
        drop(sensor);

        let mut cs = cs;
        cs.done();
    }

    #[test]
    fn chip_select_framed_around_each_read() {
        let cs = PinMock::new(&[
            PinTransaction::set(PinState::High),
            // read_celsius
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
            // read_error
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
        ]);

        let mut sensor = Max31855::from_bus(
            ScriptedBus::new(&[0x0C9C_0000, 0x0001_0001]),
            cs.clone(),
            NoopDelay::new(),
            Config::default(),
        )
        .unwrap();

        assert_eq!(sensor.read_celsius().unwrap(), 201.75);
        assert_eq!(sensor.read_error().unwrap(), 1);
        assert_eq!(sensor.release().bus().transfers, 2);

        let mut cs = cs;
        cs.done();
    }

    #[test]
    fn bus_error_still_releases_chip_select() {
        let cs = PinMock::new(&[
            PinTransaction::set(PinState::High),
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
        ]);

        // No scripted frames, so the transfer fails
        let mut sensor = Max31855::from_bus(
            ScriptedBus::new(&[]),
            cs.clone(),
            NoopDelay::new(),
            Config::default(),
        )
        .unwrap();

        sensor.read_celsius().unwrap_err();

        let mut cs = cs;
        cs.done();
    }

    #[test]
    fn chip_select_error_fails_construction() {
        let cs = PinMock::new(&[
            PinTransaction::set(PinState::High).with_error(MockError::Io(io::ErrorKind::Other))
        ]);

        let result = Max31855::from_bus(
            ScriptedBus::new(&[]),
            cs.clone(),
            NoopDelay::new(),
            Config::default(),
        );
        assert!(result.is_err());

        let mut cs = cs;
        cs.done();
    }
}
