use std::fmt;

const TEMPERATURE_VALID: u8 = 0x01;
const DATA_VALID:        u8 = 0x02;
const SWEEP_COMPLETE:    u8 = 0x04;

/// Status register (0x8f). Read fresh on every poll.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct StatusFlags(pub u8);

impl StatusFlags {
	pub fn is_temperature_valid(&self) -> bool {
		0 != self.0 & TEMPERATURE_VALID
	}
	pub fn is_data_valid(&self) -> bool {
		0 != self.0 & DATA_VALID
	}
	pub fn is_sweep_complete(&self) -> bool {
		0 != self.0 & SWEEP_COMPLETE
	}

	pub fn set_temperature_valid(&mut self, valid: bool) -> &mut Self {
		self.set(TEMPERATURE_VALID, valid)
	}
	pub fn set_data_valid(&mut self, valid: bool) -> &mut Self {
		self.set(DATA_VALID, valid)
	}
	pub fn set_sweep_complete(&mut self, complete: bool) -> &mut Self {
		self.set(SWEEP_COMPLETE, complete)
	}

	fn set(&mut self, flag: u8, on: bool) -> &mut Self {
		if on {
			self.0 |= flag;
		} else {
			self.0 &= !flag;
		}
		self
	}
}

impl fmt::Debug for StatusFlags {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "0x{:02x} (", self.0)?;
		if self.is_temperature_valid() { write!(f, " [TEMP]")?; }
		if self.is_data_valid() { write!(f, " [DATA]")?; }
		if self.is_sweep_complete() { write!(f, " [DONE]")?; }
		write!(f, " )")
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn reads_bits() {
		let status = StatusFlags(0x06);
		assert!(status.is_data_valid());
		assert!(status.is_sweep_complete());
		assert!(!status.is_temperature_valid());
		assert_eq!(format!("{:?}", status), "0x06 ( [DATA] [DONE] )");
	}
}
