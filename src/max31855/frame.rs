use crate::max31855::registers::*;

/// One 32-bit frame as shifted out by the MAX31855.
///
/// A frame only describes the instant it was read. Nothing here caches it;
/// every driver read produces a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Frame(pub u32);

impl Frame {
    /// Assemble a frame from the four bytes received on the bus, first byte
    /// most significant.
    pub const fn from_bytes(bytes: [u8; FRAME_LEN]) -> Self {
        Self(u32::from_be_bytes(bytes))
    }

    pub const fn raw(&self) -> u32 {
        self.0
    }

    /// Bit 16: set when any fault subtype is present.
    pub const fn has_fault(&self) -> bool {
        (self.0 & FAULT) != 0
    }

    /// Thermocouple temperature in 0.25 °C counts (bits 31:18, sign-extended).
    pub const fn thermocouple_counts(&self) -> i16 {
        let field = ((self.0 >> TC_SHIFT) & TC_MASK) as u16;
        if field & TC_SIGN != 0 {
            (field | TC_SIGN_EXTEND) as i16
        } else {
            field as i16
        }
    }

    /// Thermocouple temperature in °C, or NaN when the fault flag is set.
    pub fn celsius(&self) -> f32 {
        if self.has_fault() {
            return f32::NAN;
        }
        self.thermocouple_counts() as f32 * TC_LSB_CELSIUS
    }

    /// Internal (cold-junction) temperature in 0.0625 °C counts (bits 15:4,
    /// sign-extended).
    pub const fn internal_counts(&self) -> i16 {
        let field = ((self.0 >> INT_SHIFT) & INT_MASK) as u16;
        if field & INT_SIGN != 0 {
            (field | INT_SIGN_EXTEND) as i16
        } else {
            field as i16
        }
    }

    /// Internal temperature in °C. The chip keeps measuring its die
    /// temperature during thermocouple faults, so this is not gated on bit 16.
    pub fn internal_celsius(&self) -> f32 {
        self.internal_counts() as f32 * INT_LSB_CELSIUS
    }

    /// Fault subtype bits 2:0, whatever the state of the fault flag.
    pub const fn error_code(&self) -> u8 {
        (self.0 & FAULT_CODE_MASK) as u8
    }

    pub const fn fault_status(&self) -> FaultStatus {
        FaultStatus::from_frame(self.0)
    }
}

impl From<u32> for Frame {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FaultStatus {
    pub fault: bool,        // Any fault (bit 16)
    pub short_to_vcc: bool, // SCV (bit 2)
    pub short_to_gnd: bool, // SCG (bit 1)
    pub open_circuit: bool, // OC (bit 0)
}

impl FaultStatus {
    pub const fn from_frame(raw: u32) -> Self {
        Self {
            fault: (raw & FAULT) != 0,
            short_to_vcc: (raw & SCV) != 0,
            short_to_gnd: (raw & SCG) != 0,
            open_circuit: (raw & OC) != 0,
        }
    }

    pub const fn has_fault(&self) -> bool {
        self.fault || self.short_to_vcc || self.short_to_gnd || self.open_circuit
    }

    /// The 3-bit code as returned by `Max31855::read_error`.
    pub const fn code(&self) -> u8 {
        (self.short_to_vcc as u8) << 2 | (self.short_to_gnd as u8) << 1 | self.open_circuit as u8
    }
}
