use std::time::{
	Duration,
	Instant,
};

use crate::error::BusError;

use super::{
	BusAddress,
	Completion,
	Direction,
	InterruptHandler,
	Phase,
	TwiCommand,
	TwiHardware,
	TwiStatus,
};

/// How the engine learns that a bus phase completed.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum CompletionMode {
	/// spin on the interrupt flag, giving up after `max_polls` checks
	Polled { max_polls: u32 },
	/// sleep until the interrupt handler fills the completion slot
	Interrupt { deadline: Duration },
}

impl Default for CompletionMode {
	fn default() -> Self {
		CompletionMode::Polled { max_polls: 0xffff }
	}
}

impl std::str::FromStr for CompletionMode {
	type Err = failure::Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"polled" => Ok(CompletionMode::default()),
			"interrupt" => Ok(CompletionMode::Interrupt { deadline: Duration::from_millis(100) }),
			_ => bail!("unknown completion mode {:?} (expected polled or interrupt)", s),
		}
	}
}

/// Where the engine is within the current transaction.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum EngineState {
	Idle,
	Started,
	Transferring(Direction),
	Stopping,
}

enum Wait {
	Polled { max_polls: u32 },
	Interrupt { handler: InterruptHandler, deadline: Duration },
}

/// Exclusive owner of one bus peripheral.
pub struct TwiEngine<H: TwiHardware> {
	hardware: H,
	target: BusAddress,
	wait: Wait,
	state: EngineState,
}

impl<H: TwiHardware> TwiEngine<H> {
	pub fn new(mut hardware: H, target: BusAddress, mode: CompletionMode) -> crate::AResult<Self> {
		let wait = match mode {
			CompletionMode::Polled { max_polls } => {
				ensure!(max_polls > 0, "poll budget must not be zero");
				Wait::Polled { max_polls }
			},
			CompletionMode::Interrupt { deadline } => {
				let handler = InterruptHandler::new();
				ensure!(hardware.attach_interrupt(handler.clone()), "bus peripheral can't signal completion by interrupt");
				Wait::Interrupt { handler, deadline }
			},
		};

		Ok(TwiEngine {
			hardware,
			target,
			wait,
			state: EngineState::Idle,
		})
	}

	pub fn target(&self) -> BusAddress {
		self.target
	}

	pub fn state(&self) -> EngineState {
		self.state
	}

	pub fn hardware(&self) -> &H {
		&self.hardware
	}

	pub fn hardware_mut(&mut self) -> &mut H {
		&mut self.hardware
	}

	/// START and address the target; the returned transaction sends STOP
	/// when ended or dropped, also if addressing failed.
	pub fn begin(&mut self, direction: Direction) -> Result<Transaction<H>, BusError> {
		let mut tx = Transaction {
			engine: self,
			direction,
			open: true,
		};
		tx.engine.start()?;
		tx.engine.send_header(direction)?;
		Ok(tx)
	}

	// execute `command` and wait for the peripheral to report completion
	fn complete(&mut self, command: TwiCommand) -> Result<Completion, BusError> {
		match self.wait {
			Wait::Polled { max_polls } => {
				self.hardware.execute(command);
				for _ in 0..max_polls {
					if self.hardware.interrupt_flag() {
						return Ok(Completion {
							status: self.hardware.status(),
							data: self.hardware.data(),
						});
					}
					self.hardware.delay();
				}
			},
			Wait::Interrupt { ref handler, deadline } => {
				let seen = handler.phase();
				self.hardware.execute(command);
				if let Some(completion) = handler.wait_after(seen, deadline) {
					return Ok(completion);
				}
			},
		}
		debug!("TWI: timeout waiting for {:?} to complete", command);
		Err(BusError::Timeout)
	}

	fn start(&mut self) -> Result<(), BusError> {
		let completion = self.complete(TwiCommand::Start)?;
		let status = TwiStatus::from_register(completion.status);
		trace!("TWI: START -> {:?}", status);
		if !status.is_start() {
			return Err(BusError::ProtocolViolation { phase: Phase::Start, status: status.code() });
		}
		self.state = EngineState::Started;
		Ok(())
	}

	fn send_header(&mut self, direction: Direction) -> Result<(), BusError> {
		let completion = self.complete(TwiCommand::Transmit(self.target.header(direction)))?;
		let status = TwiStatus::from_register(completion.status);
		trace!("TWI: address {} {:?} -> {:?}", self.target, direction, status);
		match (direction, status) {
			(Direction::Write, TwiStatus::MT_SLA_ACK) | (Direction::Read, TwiStatus::MR_SLA_ACK) => {
				self.state = EngineState::Transferring(direction);
				Ok(())
			},
			(_, TwiStatus::MT_SLA_NACK) | (_, TwiStatus::MR_SLA_NACK) => Err(BusError::NotAcknowledged(Phase::Address)),
			(_, status) => Err(BusError::ProtocolViolation { phase: Phase::Address, status: status.code() }),
		}
	}

	fn send_byte(&mut self, byte: u8) -> Result<(), BusError> {
		let completion = self.complete(TwiCommand::Transmit(byte))?;
		let status = TwiStatus::from_register(completion.status);
		trace!("TWI: sent 0x{:02x} -> {:?}", byte, status);
		match status {
			TwiStatus::MT_DATA_ACK => Ok(()),
			TwiStatus::MT_DATA_NACK => Err(BusError::NotAcknowledged(Phase::Data)),
			status => Err(BusError::ProtocolViolation { phase: Phase::Data, status: status.code() }),
		}
	}

	fn receive_byte(&mut self, ack: bool) -> Result<u8, BusError> {
		let completion = self.complete(TwiCommand::Receive { ack })?;
		let status = TwiStatus::from_register(completion.status);
		trace!("TWI: received 0x{:02x} -> {:?}", completion.data, status);
		let expected = if ack { TwiStatus::MR_DATA_ACK } else { TwiStatus::MR_DATA_NACK };
		if status != expected {
			return Err(BusError::ProtocolViolation { phase: Phase::Data, status: status.code() });
		}
		Ok(completion.data)
	}

	fn stop(&mut self) -> Result<(), BusError> {
		self.state = EngineState::Stopping;
		self.hardware.execute(TwiCommand::Stop);
		trace!("TWI: STOP");

		let done = match self.wait {
			Wait::Polled { max_polls } => {
				let mut done = false;
				for _ in 0..max_polls {
					if self.hardware.stop_complete() {
						done = true;
						break;
					}
					self.hardware.delay();
				}
				done
			},
			Wait::Interrupt { deadline, .. } => {
				// STOP raises no interrupt
				let end = Instant::now() + deadline;
				loop {
					if self.hardware.stop_complete() {
						break true;
					}
					if Instant::now() >= end {
						break false;
					}
					self.hardware.delay();
				}
			},
		};

		// the peripheral owns the bus again either way
		self.state = EngineState::Idle;
		if done {
			Ok(())
		} else {
			debug!("TWI: timeout waiting for STOP");
			Err(BusError::Timeout)
		}
	}
}

impl<H: TwiHardware> Drop for TwiEngine<H> {
	fn drop(&mut self) {
		if let Wait::Interrupt { .. } = self.wait {
			self.hardware.detach_interrupt();
		}
	}
}

fn misuse(what: &str) -> BusError {
	debug!("TWI: {}", what);
	BusError::ProtocolViolation { phase: Phase::Data, status: TwiStatus::NO_INFO.code() }
}

/// One START..STOP bracketed exchange with the target.
pub struct Transaction<'a, H: TwiHardware + 'a> {
	engine: &'a mut TwiEngine<H>,
	direction: Direction,
	open: bool,
}

impl<'a, H: TwiHardware> Transaction<'a, H> {
	pub fn direction(&self) -> Direction {
		self.direction
	}

	/// write mode: send `byte`, returns `None`. read mode: ignore `byte`
	/// and return the received byte, ACKing it.
	pub fn transfer_byte(&mut self, byte: Option<u8>) -> Result<Option<u8>, BusError> {
		match self.direction {
			Direction::Write => {
				let byte = byte.ok_or_else(|| misuse("write transfer without data byte"))?;
				self.engine.send_byte(byte)?;
				Ok(None)
			},
			Direction::Read => Ok(Some(self.engine.receive_byte(true)?)),
		}
	}

	pub fn write(&mut self, byte: u8) -> Result<(), BusError> {
		if self.direction != Direction::Write {
			return Err(misuse("write in read transaction"));
		}
		self.engine.send_byte(byte)
	}

	pub fn write_all(&mut self, bytes: &[u8]) -> Result<(), BusError> {
		for &b in bytes {
			self.write(b)?;
		}
		Ok(())
	}

	/// receive a byte; `ack == false` tells the device it was the last one
	pub fn read(&mut self, ack: bool) -> Result<u8, BusError> {
		if self.direction != Direction::Read {
			return Err(misuse("read in write transaction"));
		}
		self.engine.receive_byte(ack)
	}

	/// fill `target`, ACKing every byte but the last
	pub fn read_into(&mut self, target: &mut [u8]) -> Result<(), BusError> {
		let len = target.len();
		for (i, t) in target.iter_mut().enumerate() {
			*t = self.read(i + 1 < len)?;
		}
		Ok(())
	}

	/// repeated START, addressing the target again in `direction`
	pub fn restart(&mut self, direction: Direction) -> Result<(), BusError> {
		self.engine.start()?;
		self.direction = direction;
		self.engine.send_header(direction)
	}

	pub fn end(mut self) -> Result<(), BusError> {
		self.open = false;
		self.engine.stop()
	}
}

impl<'a, H: TwiHardware> Drop for Transaction<'a, H> {
	fn drop(&mut self) {
		if self.open {
			if let Err(e) = self.engine.stop() {
				warn!("TWI: failed to release bus: {}", e);
			}
		}
	}
}
