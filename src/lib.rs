#![cfg_attr(not(test), no_std)]

mod fmt;

pub mod max31855;

pub use max31855::{Config, FaultStatus, Frame, Max31855};

/// Log faults for a sensor
pub fn log_faults(sensor_num: u8, faults: &FaultStatus) {
    if faults.open_circuit {
        warn!("Sensor {} - Open circuit fault", sensor_num);
    }
    if faults.short_to_gnd {
        warn!("Sensor {} - Thermocouple shorted to GND", sensor_num);
    }
    if faults.short_to_vcc {
        warn!("Sensor {} - Thermocouple shorted to VCC", sensor_num);
    }
    if faults.fault && faults.code() == 0 {
        warn!("Sensor {} - Fault flag set without a fault type", sensor_num);
    }
}

/// Log one frame: the thermocouple and cold-junction temperatures, or the
/// faults when the chip reports any.
///
/// Returns the thermocouple temperature so callers can log and use the same
/// reading.
pub fn log_frame(sensor_num: u8, frame: &Frame) -> f32 {
    let celsius = frame.celsius();
    let status = frame.fault_status();

    if status.has_fault() {
        log_faults(sensor_num, &status);
    }

    if celsius.is_nan() {
        info!(
            "Sensor {} - TC=fault CJ={} C (raw {:#x})",
            sensor_num,
            frame.internal_celsius(),
            frame.raw()
        );
    } else {
        info!(
            "Sensor {} - TC={} C CJ={} C",
            sensor_num,
            celsius,
            frame.internal_celsius()
        );
    }

    celsius
}
