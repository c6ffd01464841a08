//! Simulated bus peripheral with a converter attached.
//!
//! `SimulatedBus` implements `TwiHardware` by decoding the byte stream the
//! way the converter does (pointer set, block write, block read, single
//! register write) against a register-level device model. Completion is
//! signalled synchronously: the interrupt flag is up (and an attached
//! interrupt handler called) when `execute` returns, unless a fault was
//! injected.
//!
//! Sweep points take `ready_after` status reads to measure; results come
//! from a `SampleSource`.

mod bus;
mod device;
mod load;

pub use self::bus::{
	SimulatedBus,
	TransactionRecord,
};

pub use self::device::{
	SampleSource,
	Scripted,
};

pub use self::load::RcLoad;
