use std::str::FromStr;
use std::time::Duration;

use crate::error::SweepError;

use super::consts::*;
use super::control::{
	ControlWord,
	Function,
};

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum ClockSource {
	/// on-chip oscillator, 16.776 MHz
	Internal,
	/// MCLK pin, with its frequency in Hz
	External(u32),
}

impl ClockSource {
	pub fn frequency(&self) -> u32 {
		match *self {
			ClockSource::Internal => INTERNAL_CLOCK_HZ,
			ClockSource::External(hz) => hz,
		}
	}
}

impl FromStr for ClockSource {
	type Err = failure::Error;

	// "internal" or "external=<Hz>"
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		if s == "internal" {
			return Ok(ClockSource::Internal);
		}
		if s.starts_with("external=") {
			let hz_s = &s["external=".len()..];
			let hz = with_context!(("invalid external clock frequency {:?}", hz_s),
				Ok(hz_s.parse::<u32>()?)
			)?;
			return Ok(ClockSource::External(hz));
		}
		bail!("unknown clock source {:?} (expected internal or external=<Hz>)", s);
	}
}

/// Peak-to-peak excitation voltage.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum VoltageRange {
	Vpp2,
	Vpp1,
	Mvpp400,
	Mvpp200,
}

impl VoltageRange {
	/// D10..D9 of the control register, as placed in the high byte
	pub(super) fn bits(&self) -> u8 {
		match *self {
			VoltageRange::Vpp2 => 0b00 << 1,
			VoltageRange::Mvpp200 => 0b01 << 1,
			VoltageRange::Mvpp400 => 0b10 << 1,
			VoltageRange::Vpp1 => 0b11 << 1,
		}
	}

	pub(super) fn from_bits(high: u8) -> Self {
		match (high >> 1) & 0x3 {
			0b00 => VoltageRange::Vpp2,
			0b01 => VoltageRange::Mvpp200,
			0b10 => VoltageRange::Mvpp400,
			0b11 => VoltageRange::Vpp1,
			_ => unreachable!(),
		}
	}
}

impl FromStr for VoltageRange {
	type Err = failure::Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"2v" => Ok(VoltageRange::Vpp2),
			"1v" => Ok(VoltageRange::Vpp1),
			"400mv" => Ok(VoltageRange::Mvpp400),
			"200mv" => Ok(VoltageRange::Mvpp200),
			_ => bail!("unknown voltage range {:?} (expected 2v, 1v, 400mv or 200mv)", s),
		}
	}
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum PgaGain {
	X1,
	X5,
}

impl FromStr for PgaGain {
	type Err = failure::Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"x1" | "1" => Ok(PgaGain::X1),
			"x5" | "5" => Ok(PgaGain::X5),
			_ => bail!("unknown PGA gain {:?} (expected x1 or x5)", s),
		}
	}
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum SettlingMultiplier {
	X1,
	X2,
	X4,
}

impl SettlingMultiplier {
	// D10..D9 of the settling register
	fn bits(&self) -> u16 {
		match *self {
			SettlingMultiplier::X1 => 0b00,
			SettlingMultiplier::X2 => 0b01,
			SettlingMultiplier::X4 => 0b11,
		}
	}

	pub fn factor(&self) -> u64 {
		match *self {
			SettlingMultiplier::X1 => 1,
			SettlingMultiplier::X2 => 2,
			SettlingMultiplier::X4 => 4,
		}
	}
}

impl FromStr for SettlingMultiplier {
	type Err = failure::Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"x1" | "1" => Ok(SettlingMultiplier::X1),
			"x2" | "2" => Ok(SettlingMultiplier::X2),
			"x4" | "4" => Ok(SettlingMultiplier::X4),
			_ => bail!("unknown settling multiplier {:?} (expected x1, x2 or x4)", s),
		}
	}
}

/// Register contents for one sweep, big-endian as the device expects them.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct EncodedSweep {
	pub start_frequency: [u8; 3],
	pub frequency_increment: [u8; 3],
	pub increment_count: [u8; 2],
	pub settling_cycles: [u8; 2],
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct SweepConfiguration {
	/// Hz
	pub start_frequency: u32,
	/// Hz
	pub increment_frequency: u32,
	/// the sweep measures `increment_count + 1` points
	pub increment_count: u16,
	pub settling_cycles: u16,
	pub settling_multiplier: SettlingMultiplier,
	pub clock_source: ClockSource,
	pub voltage_range: VoltageRange,
	pub pga_gain: PgaGain,
}

impl Default for SweepConfiguration {
	fn default() -> Self {
		SweepConfiguration {
			start_frequency: 80_000,
			increment_frequency: 1_000,
			increment_count: 40,
			settling_cycles: 15,
			settling_multiplier: SettlingMultiplier::X1,
			clock_source: ClockSource::Internal,
			voltage_range: VoltageRange::Vpp2,
			pga_gain: PgaGain::X1,
		}
	}
}

fn invalid(msg: String) -> SweepError {
	SweepError::ConfigurationInvalid(msg)
}

impl SweepConfiguration {
	pub fn points(&self) -> u32 {
		u32::from(self.increment_count) + 1
	}

	/// nominal excitation frequency of point `index`, in Hz
	pub fn frequency_at(&self, index: u16) -> u64 {
		u64::from(self.start_frequency) + u64::from(index) * u64::from(self.increment_frequency)
	}

	/// excitation cycles the device waits at point `index` before sampling
	pub fn settling_time(&self, index: u16) -> Duration {
		let hz = self.frequency_at(index);
		if hz == 0 {
			return Duration::from_secs(0);
		}
		let cycles = u64::from(self.settling_cycles) * self.settling_multiplier.factor();
		Duration::from_micros(cycles * 1_000_000 / hz)
	}

	/// 24-bit frequency code: `hz / (MCLK / 4) * 2^27`, truncated
	pub fn frequency_code(&self, hz: u32) -> Result<u32, SweepError> {
		let mclk = self.clock_source.frequency();
		if mclk == 0 {
			return Err(invalid("clock frequency must not be zero".into()));
		}
		let code = (u64::from(hz) << 29) / u64::from(mclk);
		if code > u64::from(MAX_FREQUENCY_CODE) {
			return Err(invalid(format!("frequency {} Hz doesn't fit the 24-bit frequency register at MCLK {} Hz", hz, mclk)));
		}
		Ok(code as u32)
	}

	pub fn validate(&self) -> Result<(), SweepError> {
		self.encode().map(|_| ())
	}

	pub fn encode(&self) -> Result<EncodedSweep, SweepError> {
		if self.increment_count > MAX_INCREMENT_COUNT {
			return Err(invalid(format!("increment count {} exceeds {}", self.increment_count, MAX_INCREMENT_COUNT)));
		}
		if self.settling_cycles > MAX_SETTLING_CYCLES {
			return Err(invalid(format!("settling cycles {} exceed {}", self.settling_cycles, MAX_SETTLING_CYCLES)));
		}

		let start = self.frequency_code(self.start_frequency)?;
		let increment = self.frequency_code(self.increment_frequency)?;
		let end = u64::from(start) + u64::from(self.increment_count) * u64::from(increment);
		if end > u64::from(MAX_FREQUENCY_CODE) {
			return Err(invalid(format!(
				"sweep end {} Hz doesn't fit the 24-bit frequency register",
				self.frequency_at(self.increment_count),
			)));
		}

		let settling = (self.settling_multiplier.bits() << 9) | self.settling_cycles;

		Ok(EncodedSweep {
			start_frequency: [(start >> 16) as u8, (start >> 8) as u8, start as u8],
			frequency_increment: [(increment >> 16) as u8, (increment >> 8) as u8, increment as u8],
			increment_count: [(self.increment_count >> 8) as u8, self.increment_count as u8],
			settling_cycles: [(settling >> 8) as u8, settling as u8],
		})
	}

	pub fn control(&self, function: Function) -> ControlWord {
		ControlWord::new(function, self.voltage_range, self.pga_gain, self.clock_source)
	}
}
