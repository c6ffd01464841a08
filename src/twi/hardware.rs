use std::thread;
use std::time::{
	Duration,
	Instant,
};

use super::InterruptHandler;

const POLL_INTERVAL: Duration = Duration::from_micros(5);

pub fn reliable_sleep(mut duration: Duration) {
	loop {
		let now = Instant::now();
		thread::sleep(duration);
		let elapsed = now.elapsed();
		if elapsed >= duration {
			return;
		}
		duration -= elapsed;
	}
}

/// One bus phase for the peripheral to execute.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum TwiCommand {
	/// (repeated) START condition
	Start,
	/// shift out an address or data byte
	Transmit(u8),
	/// shift in a data byte and answer with ACK (`true`) or NACK
	Receive { ack: bool },
	Stop,
}

/// Register-level access to the bus peripheral.
///
/// Implementations only move bytes and flags; sequencing and status
/// interpretation belong to `TwiEngine`.
pub trait TwiHardware {
	/// start executing `command`; completion raises the interrupt flag
	/// (except for `Stop`)
	fn execute(&mut self, command: TwiCommand);

	/// interrupt flag: set once the last command completed
	fn interrupt_flag(&mut self) -> bool;

	/// status code of the last completed phase
	fn status(&mut self) -> u8;

	/// data register (received byte after `Receive`)
	fn data(&mut self) -> u8;

	/// whether the STOP requested last has been put on the wire
	fn stop_complete(&mut self) -> bool {
		true
	}

	/// route completions into `handler` instead of (only) the interrupt
	/// flag. Returns false if the peripheral can't signal interrupts.
	fn attach_interrupt(&mut self, _handler: InterruptHandler) -> bool {
		false
	}

	fn detach_interrupt(&mut self) {
	}

	/// wait between two polls of the interrupt flag
	fn delay(&mut self) {
		reliable_sleep(POLL_INTERVAL);
	}
}

impl<'a, H: TwiHardware + ?Sized> TwiHardware for &'a mut H {
	fn execute(&mut self, command: TwiCommand) {
		(**self).execute(command)
	}

	fn interrupt_flag(&mut self) -> bool {
		(**self).interrupt_flag()
	}

	fn status(&mut self) -> u8 {
		(**self).status()
	}

	fn data(&mut self) -> u8 {
		(**self).data()
	}

	fn stop_complete(&mut self) -> bool {
		(**self).stop_complete()
	}

	fn attach_interrupt(&mut self, handler: InterruptHandler) -> bool {
		(**self).attach_interrupt(handler)
	}

	fn detach_interrupt(&mut self) {
		(**self).detach_interrupt()
	}

	fn delay(&mut self) {
		(**self).delay()
	}
}
