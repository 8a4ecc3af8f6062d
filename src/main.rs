#![deny(unsafe_code)]
#![no_std]
#![no_main]

use {defmt_rtt as _, panic_probe as _};

use max31855_rs::{Config as SensorConfig, Max31855, log_frame};

use defmt::{error, info, warn};

use embassy_executor::Spawner;
use embassy_stm32::Config;
use embassy_stm32::gpio::{Level, Output, Speed};
use embassy_stm32::rcc::{
    AHBPrescaler, APBPrescaler, Hse, HseMode, Pll, PllDiv, PllMul, PllPreDiv, PllSource, Sysclk,
    VoltageScale,
};
use embassy_stm32::spi::{MODE_0, Spi};
use embassy_stm32::time::Hertz;
use embassy_time::{Delay, Timer};

const SENSOR_NUM: u8 = 1;
const READ_INTERVAL_MS: u64 = 500;

#[embassy_executor::main]
async fn main(_spawner: Spawner) -> ! {
    let mut config = Config::default();
    config.rcc.hsi = None;
    config.rcc.hse = Some(Hse {
        freq: Hertz(25_000_000),
        mode: HseMode::Oscillator,
    });
    config.rcc.pll1 = Some(Pll {
        source: PllSource::HSE,
        prediv: PllPreDiv::DIV5,
        mul: PllMul::MUL100,
        divp: Some(PllDiv::DIV2),
        divq: Some(PllDiv::DIV10),
        divr: Some(PllDiv::DIV2),
    });
    config.rcc.apb3_pre = APBPrescaler::DIV2; // 125 MHz
    config.rcc.ahb_pre = AHBPrescaler::DIV1;
    config.rcc.apb1_pre = APBPrescaler::DIV2; // 125 MHz
    config.rcc.apb2_pre = APBPrescaler::DIV2; // 125 MHz
    config.rcc.sys = Sysclk::PLL1_P;
    config.rcc.voltage_scale = VoltageScale::Scale0;
    let p = embassy_stm32::init(config);
    info!("MAX31855 demo starting");

    let sensor_config = SensorConfig::default();

    let mut spi_config = embassy_stm32::spi::Config::default();
    spi_config.mode = MODE_0; // CPOL=0, CPHA=0
    spi_config.frequency = Hertz(sensor_config.frequency_hz);
    // MOSI is wired but the MAX31855 ignores it
    let spi = Spi::new_blocking(p.SPI1, p.PB3, p.PB5, p.PB4, spi_config);

    let cs = Output::new(p.PA15, Level::High, Speed::VeryHigh);

    let mut sensor = Max31855::from_bus(spi, cs, Delay, sensor_config).unwrap();
    if sensor.begin() {
        info!("Sensor {} - configured at {} Hz", SENSOR_NUM, sensor_config.frequency_hz);
    }

    // The subtype bits are only meaningful with the fault flag, but report
    // whatever the chip shows at power-up.
    match sensor.read_error() {
        Ok(0) => info!("Sensor {} - no fault bits at startup", SENSOR_NUM),
        Ok(code) => warn!("Sensor {} - startup fault code {=u8}", SENSOR_NUM, code),
        Err(_) => error!("Sensor {} - SPI read failed", SENSOR_NUM),
    }

    loop {
        match sensor.read_frame() {
            Ok(frame) => {
                log_frame(SENSOR_NUM, &frame);
            }
            Err(_) => error!("Sensor {} - SPI read failed", SENSOR_NUM),
        }

        Timer::after_millis(READ_INTERVAL_MS).await;
    }
}
