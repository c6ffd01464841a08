use failure::Fail;

use crate::ad5933::SweepState;
use crate::twi::Phase;

/// Failure of a single bus transaction.
///
/// The engine and the register accessor report these without retrying;
/// whoever sequences the transactions decides whether a retry is safe.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Fail)]
pub enum BusError {
	/// bus did not signal completion of a phase within the configured budget
	#[fail(display = "bus timeout")]
	Timeout,
	#[fail(display = "device did not acknowledge {} phase", _0)]
	NotAcknowledged(Phase),
	#[fail(display = "unexpected bus status 0x{:02x} in {} phase", status, phase)]
	ProtocolViolation {
		phase: Phase,
		status: u8,
	},
}

#[derive(Clone, PartialEq, Eq, Debug, Fail)]
pub enum SweepError {
	#[fail(display = "{}", _0)]
	Bus(#[fail(cause)] BusError),
	#[fail(display = "invalid sweep configuration: {}", _0)]
	ConfigurationInvalid(String),
	/// a previous bus error left the controller faulted; `reset()` first
	#[fail(display = "controller faulted, reset required")]
	Faulted,
	#[fail(display = "cannot {} while {:?}", operation, state)]
	InvalidState {
		state: SweepState,
		operation: &'static str,
	},
}

impl SweepError {
	pub fn bus_error(&self) -> Option<BusError> {
		match *self {
			SweepError::Bus(e) => Some(e),
			_ => None,
		}
	}
}

impl From<BusError> for SweepError {
	fn from(e: BusError) -> Self {
		SweepError::Bus(e)
	}
}
