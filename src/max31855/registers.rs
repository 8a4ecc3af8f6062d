#![allow(dead_code)]
// MAX31855 32-bit frame layout (read-only, MSB first)
pub const FRAME_LEN: usize = 4; // Bytes clocked per read

// Thermocouple temperature, bits 31:18 (14-bit two's complement)
pub const TC_SHIFT: u32 = 18;
pub const TC_MASK: u32 = 0x3FFF;
pub const TC_SIGN: u16 = 1 << 13; // Sign bit within the 14-bit field
pub const TC_SIGN_EXTEND: u16 = 0xC000; // Fill for bits 15:14 of an i16
pub const TC_LSB_CELSIUS: f32 = 0.25;

pub const RESERVED_17: u32 = 1 << 17; // Reserved, always reads 0

pub const FAULT: u32 = 1 << 16; // Any of SCV, SCG, OC is set

// Internal (cold-junction) temperature, bits 15:4 (12-bit two's complement)
pub const INT_SHIFT: u32 = 4;
pub const INT_MASK: u32 = 0x0FFF;
pub const INT_SIGN: u16 = 1 << 11; // Sign bit within the 12-bit field
pub const INT_SIGN_EXTEND: u16 = 0xF000; // Fill for bits 15:12 of an i16
pub const INT_LSB_CELSIUS: f32 = 0.0625;

pub const RESERVED_3: u32 = 1 << 3; // Reserved, always reads 0

// Fault subtype bits 2:0
pub const SCV: u32 = 1 << 2; // Thermocouple shorted to VCC
pub const SCG: u32 = 1 << 1; // Thermocouple shorted to GND
pub const OC: u32 = 1 << 0; // Thermocouple open (no connection)
pub const FAULT_CODE_MASK: u32 = SCV | SCG | OC;

// Bus timing
pub const CS_SETUP_NS: u32 = 1_000; // CS low to first SCK edge
pub const MAX_SCK_HZ: u32 = 5_000_000; // fSCL max
