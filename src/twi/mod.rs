//! Master side of a two-wire (TWI / I²C) bus peripheral.
//!
//! The peripheral executes one bus phase per command and reports the
//! outcome through a status code, raising its interrupt flag when done:
//!
//! - START: `0x08` (or `0x10` for a repeated START)
//! - address + write: `0x18` ACK, `0x20` NACK
//! - address + read: `0x40` ACK, `0x48` NACK
//! - data written: `0x28` ACK, `0x30` NACK
//! - data received: `0x50` when we ACKed it, `0x58` when we NACKed it
//!
//! STOP does not raise the interrupt flag; the peripheral clears its STOP
//! request once the condition is on the wire.
//!
//! Only one transaction is in flight per engine: a `Transaction` borrows
//! the engine mutably and sends STOP when dropped.

use std::fmt;

mod completion;
mod engine;
mod hardware;
mod status;

pub use self::completion::{
	Completion,
	InterruptHandler,
};

pub use self::engine::{
	CompletionMode,
	EngineState,
	Transaction,
	TwiEngine,
};

pub use self::hardware::{
	TwiCommand,
	TwiHardware,
	reliable_sleep,
};

pub use self::status::TwiStatus;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Direction {
	Write,
	Read,
}

/// Bus phase, used to report where a transaction failed.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Phase {
	Start,
	Address,
	Data,
	Stop,
}

impl fmt::Display for Phase {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		let name = match *self {
			Phase::Start => "START",
			Phase::Address => "address",
			Phase::Data => "data",
			Phase::Stop => "STOP",
		};
		f.write_str(name)
	}
}

/// 7-bit target address
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BusAddress(pub(crate) u8);

impl BusAddress {
	pub fn new(address: u8) -> crate::AResult<Self> {
		ensure!(address <= 0x7f, "bus address 0x{:02x} doesn't fit in 7 bits", address);
		Ok(BusAddress(address))
	}

	pub fn address(&self) -> u8 {
		self.0
	}

	/// address byte sent after START: address in the upper 7 bits, R/W in bit 0
	pub fn header(&self, direction: Direction) -> u8 {
		let rw = match direction {
			Direction::Write => 0,
			Direction::Read => 1,
		};
		(self.0 << 1) | rw
	}
}

impl fmt::Debug for BusAddress {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "BusAddress(0x{:02x})", self.0)
	}
}

impl fmt::Display for BusAddress {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "0x{:02x}", self.0)
	}
}
