use std::fmt;

use super::config::{
	ClockSource,
	PgaGain,
	VoltageRange,
};

// control register, high byte (0x80)
const FUNCTION_SHIFT: u8 = 12;
const FUNCTION_MASK:  u16 = 0xf000;
const RANGE_MASK:     u16 = 0x0600;
const PGA_GAIN_X1:    u16 = 0x0100;
// control register, low byte (0x81)
const RESET:          u16 = 0x0010;
const EXTERNAL_CLOCK: u16 = 0x0008;

/// Control register function codes (D15..D12).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Function {
	InitializeWithStartFrequency,
	StartSweep,
	IncrementFrequency,
	RepeatFrequency,
	MeasureTemperature,
	PowerDown,
	Standby,
}

impl Function {
	pub fn code(&self) -> u8 {
		match *self {
			Function::InitializeWithStartFrequency => 0x1,
			Function::StartSweep => 0x2,
			Function::IncrementFrequency => 0x3,
			Function::RepeatFrequency => 0x4,
			Function::MeasureTemperature => 0x9,
			Function::PowerDown => 0xa,
			Function::Standby => 0xb,
		}
	}

	pub fn from_code(code: u8) -> Option<Self> {
		match code {
			0x1 => Some(Function::InitializeWithStartFrequency),
			0x2 => Some(Function::StartSweep),
			0x3 => Some(Function::IncrementFrequency),
			0x4 => Some(Function::RepeatFrequency),
			0x9 => Some(Function::MeasureTemperature),
			0xa => Some(Function::PowerDown),
			0xb => Some(Function::Standby),
			_ => None,
		}
	}
}

/// 16-bit control register value; high byte at 0x80, low byte at 0x81.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ControlWord(pub u16);

impl ControlWord {
	pub fn new(function: Function, range: VoltageRange, gain: PgaGain, clock: ClockSource) -> Self {
		*ControlWord(0)
			.set_function(function)
			.set_range(range)
			.set_gain(gain)
			.set_clock(clock)
	}

	pub fn from_bytes(high: u8, low: u8) -> Self {
		ControlWord(u16::from(high) << 8 | u16::from(low))
	}

	pub fn high(&self) -> u8 {
		(self.0 >> 8) as u8
	}

	pub fn low(&self) -> u8 {
		self.0 as u8
	}

	pub fn function(&self) -> Option<Function> {
		Function::from_code(((self.0 & FUNCTION_MASK) >> FUNCTION_SHIFT) as u8)
	}
	pub fn set_function(&mut self, function: Function) -> &mut Self {
		self.0 = (self.0 & !FUNCTION_MASK) | (u16::from(function.code()) << FUNCTION_SHIFT);
		self
	}

	pub fn range(&self) -> VoltageRange {
		VoltageRange::from_bits(self.high())
	}
	pub fn set_range(&mut self, range: VoltageRange) -> &mut Self {
		self.0 = (self.0 & !RANGE_MASK) | (u16::from(range.bits()) << 8);
		self
	}

	pub fn gain(&self) -> PgaGain {
		if 0 != self.0 & PGA_GAIN_X1 { PgaGain::X1 } else { PgaGain::X5 }
	}
	pub fn set_gain(&mut self, gain: PgaGain) -> &mut Self {
		self.0 = match gain {
			PgaGain::X1 => self.0 | PGA_GAIN_X1,
			PgaGain::X5 => self.0 & !PGA_GAIN_X1,
		};
		self
	}

	pub fn is_external_clock(&self) -> bool {
		0 != self.0 & EXTERNAL_CLOCK
	}
	pub fn set_clock(&mut self, clock: ClockSource) -> &mut Self {
		self.0 = match clock {
			ClockSource::Internal => self.0 & !EXTERNAL_CLOCK,
			ClockSource::External(_) => self.0 | EXTERNAL_CLOCK,
		};
		self
	}

	pub fn is_reset(&self) -> bool {
		0 != self.0 & RESET
	}
}

impl fmt::Display for ControlWord {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "0x{:04x}", self.0)
	}
}

impl fmt::Debug for ControlWord {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f,
			"0x{:04x} (function: {:?}, range: {:?}, gain: {:?}",
			self.0,
			self.function(),
			self.range(),
			self.gain(),
		)?;
		if self.is_external_clock() { write!(f, " [EXTCLK]")?; }
		if self.is_reset() { write!(f, " [RESET]")?; }
		write!(f, ")")
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn matches_known_command_bytes() {
		// standby, 2 Vpp, x1
		let standby = ControlWord::new(Function::Standby, VoltageRange::Vpp2, PgaGain::X1, ClockSource::Internal);
		assert_eq!((standby.high(), standby.low()), (0xb1, 0x00));

		let sweep = *ControlWord(standby.0).set_function(Function::StartSweep);
		assert_eq!(sweep.high(), 0x21);

		let increment = ControlWord::new(Function::IncrementFrequency, VoltageRange::Vpp1, PgaGain::X5, ClockSource::External(16_000_000));
		assert_eq!((increment.high(), increment.low()), (0x36, 0x08));
	}

	#[test]
	fn decodes_fields() {
		let word = ControlWord::from_bytes(0x95, 0x18);
		assert_eq!(word.function(), Some(Function::MeasureTemperature));
		assert_eq!(word.range(), VoltageRange::Mvpp400);
		assert_eq!(word.gain(), PgaGain::X1);
		assert!(word.is_external_clock());
		assert!(word.is_reset());
		assert_eq!(ControlWord::from_bytes(0x00, 0x00).function(), None);
	}
}
