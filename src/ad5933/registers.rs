use std::fmt;

use crate::error::BusError;
use crate::twi::{
	Direction,
	TwiEngine,
	TwiHardware,
};

use super::consts::*;

/// Address into the converter's register map.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RegisterAddress(pub u8);

impl RegisterAddress {
	pub const CONTROL: RegisterAddress = RegisterAddress(CONTROL_REGISTER);
	pub const START_FREQUENCY: RegisterAddress = RegisterAddress(START_FREQUENCY_REGISTER);
	pub const FREQUENCY_INCREMENT: RegisterAddress = RegisterAddress(FREQUENCY_INCREMENT_REGISTER);
	pub const INCREMENT_COUNT: RegisterAddress = RegisterAddress(INCREMENT_COUNT_REGISTER);
	pub const SETTLING_CYCLES: RegisterAddress = RegisterAddress(SETTLING_CYCLES_REGISTER);
	pub const STATUS: RegisterAddress = RegisterAddress(STATUS_REGISTER);
	pub const TEMPERATURE: RegisterAddress = RegisterAddress(TEMPERATURE_REGISTER);
	pub const REAL_DATA: RegisterAddress = RegisterAddress(REAL_DATA_REGISTER);
	pub const IMAGINARY_DATA: RegisterAddress = RegisterAddress(IMAGINARY_DATA_REGISTER);

	pub fn offset(&self, n: u8) -> RegisterAddress {
		RegisterAddress(self.0.wrapping_add(n))
	}
}

impl fmt::Debug for RegisterAddress {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "RegisterAddress(0x{:02x})", self.0)
	}
}

impl fmt::Display for RegisterAddress {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "0x{:02x}", self.0)
	}
}

/// Register-level commands of the converter.
///
/// Reads rely on the device advancing its address pointer after every byte
/// it sends within one read transaction: `read_word` and `read_block` fetch
/// contiguous registers without setting the pointer again, so the result
/// registers (0x94..0x97) come out of a single measurement.
///
/// Errors come straight from the bus; nothing here retries.
pub trait RegisterAccessor {
	/// point the device's address pointer at `reg`
	fn set_pointer(&mut self, reg: RegisterAddress) -> Result<(), BusError>;

	fn write_register(&mut self, reg: RegisterAddress, value: u8) -> Result<(), BusError>;

	/// write `bytes` to `reg`, `reg + 1`, ...
	fn write_block(&mut self, reg: RegisterAddress, bytes: &[u8]) -> Result<(), BusError>;

	fn read_byte(&mut self, reg: RegisterAddress) -> Result<u8, BusError>;

	/// read `target.len()` contiguous registers starting at `reg`
	fn read_block(&mut self, reg: RegisterAddress, target: &mut [u8]) -> Result<(), BusError>;

	/// big-endian pair at `reg`, `reg + 1`, read in one transaction
	fn read_word(&mut self, reg: RegisterAddress) -> Result<u16, BusError>;
}

impl<H: TwiHardware> RegisterAccessor for TwiEngine<H> {
	fn set_pointer(&mut self, reg: RegisterAddress) -> Result<(), BusError> {
		trace!("AD5933: pointer -> {}", reg);
		let mut tx = self.begin(Direction::Write)?;
		tx.write(ADDRESS_POINTER_OPCODE)?;
		tx.write(reg.0)?;
		tx.end()
	}

	fn write_register(&mut self, reg: RegisterAddress, value: u8) -> Result<(), BusError> {
		trace!("AD5933: write {} = 0x{:02x}", reg, value);
		let mut tx = self.begin(Direction::Write)?;
		tx.write(reg.0)?;
		tx.write(value)?;
		tx.end()
	}

	fn write_block(&mut self, reg: RegisterAddress, bytes: &[u8]) -> Result<(), BusError> {
		assert!(bytes.len() <= usize::from(u8::max_value()));
		trace!("AD5933: block write {} = {:02x?}", reg, bytes);
		self.set_pointer(reg)?;
		let mut tx = self.begin(Direction::Write)?;
		tx.write(BLOCK_WRITE_OPCODE)?;
		tx.write(bytes.len() as u8)?;
		tx.write_all(bytes)?;
		tx.end()
	}

	fn read_byte(&mut self, reg: RegisterAddress) -> Result<u8, BusError> {
		self.set_pointer(reg)?;
		let mut tx = self.begin(Direction::Read)?;
		let value = tx.read(false)?;
		tx.end()?;
		trace!("AD5933: read {} = 0x{:02x}", reg, value);
		Ok(value)
	}

	fn read_block(&mut self, reg: RegisterAddress, target: &mut [u8]) -> Result<(), BusError> {
		assert!(!target.is_empty() && target.len() <= usize::from(u8::max_value()));
		self.set_pointer(reg)?;
		let mut tx = self.begin(Direction::Write)?;
		tx.write(BLOCK_READ_OPCODE)?;
		tx.write(target.len() as u8)?;
		tx.restart(Direction::Read)?;
		tx.read_into(target)?;
		tx.end()?;
		trace!("AD5933: block read {} = {:02x?}", reg, target);
		Ok(())
	}

	fn read_word(&mut self, reg: RegisterAddress) -> Result<u16, BusError> {
		self.set_pointer(reg)?;
		let mut tx = self.begin(Direction::Read)?;
		let high = tx.read(true)?;
		let low = tx.read(false)?;
		tx.end()?;
		trace!("AD5933: read {} = 0x{:02x}{:02x}", reg, high, low);
		Ok(u16::from(high) << 8 | u16::from(low))
	}
}
