//! AD5933 impedance converter: register map, sweep control and result
//! decoding.
//!
//! Chip documentation: AD5933 data sheet, "Register Map" and "Serial Bus
//! Interface" sections.

mod config;
mod control;
mod decode;
mod impedance;
mod registers;
mod session;
mod status;
mod sweep;

pub mod consts {
	/// fixed 7-bit bus address
	pub const DEVICE_ADDRESS: u8 = 0x0d;

	pub const INTERNAL_CLOCK_HZ: u32 = 16_776_000;

	// register map; multi-byte registers are big-endian starting here
	pub const CONTROL_REGISTER:             u8 = 0x80; // 2 bytes
	pub const START_FREQUENCY_REGISTER:     u8 = 0x82; // 3 bytes
	pub const FREQUENCY_INCREMENT_REGISTER: u8 = 0x85; // 3 bytes
	pub const INCREMENT_COUNT_REGISTER:     u8 = 0x88; // 2 bytes
	pub const SETTLING_CYCLES_REGISTER:     u8 = 0x8a; // 2 bytes
	pub const STATUS_REGISTER:              u8 = 0x8f;
	pub const TEMPERATURE_REGISTER:         u8 = 0x92; // 2 bytes
	pub const REAL_DATA_REGISTER:           u8 = 0x94; // 2 bytes
	pub const IMAGINARY_DATA_REGISTER:      u8 = 0x96; // 2 bytes

	// command codes, sent as first byte of a write
	pub const BLOCK_WRITE_OPCODE:     u8 = 0xa0;
	pub const BLOCK_READ_OPCODE:      u8 = 0xa1;
	pub const ADDRESS_POINTER_OPCODE: u8 = 0xb0;

	pub const MAX_FREQUENCY_CODE: u32 = 0xff_ffff;
	pub const MAX_INCREMENT_COUNT: u16 = 511;
	pub const MAX_SETTLING_CYCLES: u16 = 511;
}

pub use self::config::{
	ClockSource,
	EncodedSweep,
	PgaGain,
	SettlingMultiplier,
	SweepConfiguration,
	VoltageRange,
};

pub use self::control::{
	ControlWord,
	Function,
};

pub use self::decode::{
	DecodedSample,
	RawSample,
	decode,
	decode_temperature,
	to_binary_digits,
};

pub use self::impedance::{
	GainFactor,
	magnitude,
	phase,
};

pub use self::registers::{
	RegisterAccessor,
	RegisterAddress,
};

pub use self::session::{
	Sweep,
	SweepOutcome,
	SweepReport,
	SweepSession,
};

pub use self::status::StatusFlags;

pub use self::sweep::{
	SampleReadMode,
	SweepController,
	SweepPolicy,
	SweepState,
};

use crate::twi::BusAddress;

pub fn device_address() -> BusAddress {
	BusAddress(consts::DEVICE_ADDRESS)
}
