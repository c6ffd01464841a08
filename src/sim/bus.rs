use crate::ad5933::consts::*;
use crate::twi::{
	Direction,
	InterruptHandler,
	TwiCommand,
	TwiHardware,
	TwiStatus,
};

use super::device::{
	DeviceModel,
	SampleSource,
};

// what the next written byte means to the device
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
enum WriteCommand {
	Command,
	Pointer,
	BlockWriteCount,
	BlockWrite { remaining: u8 },
	BlockReadCount,
	Register(u8),
	Done,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
enum BusPhase {
	Idle,
	Started,
	Write(WriteCommand),
	Read,
	// address NACKed, waiting for STOP
	Rejected,
}

/// One START..STOP exchange as seen on the simulated wire.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct TransactionRecord {
	/// address headers, including the one after a repeated START
	pub headers: Vec<u8>,
	pub written: Vec<u8>,
	pub read: Vec<u8>,
	pub nacked: bool,
	pub stopped: bool,
}

/// Bus peripheral with an AD5933 attached, for tests and demos.
pub struct SimulatedBus {
	device: DeviceModel,
	phase: BusPhase,
	flag: bool,
	status: u8,
	data: u8,
	handler: Option<InterruptHandler>,
	log: Vec<TransactionRecord>,
	// fault injection
	stalled: bool,
	swallow: u32,
	nack_transaction: Option<usize>,
	nack_data_byte: Option<usize>,
	status_override: Option<(usize, u8)>,
	// bus phases and data bytes executed so far
	commands: usize,
	data_bytes: usize,
}

impl SimulatedBus {
	pub fn new<S: SampleSource + 'static>(source: S) -> Self {
		SimulatedBus {
			device: DeviceModel::new(Box::new(source)),
			phase: BusPhase::Idle,
			flag: false,
			status: TwiStatus::NO_INFO.code(),
			data: 0,
			handler: None,
			log: Vec::new(),
			stalled: false,
			swallow: 0,
			nack_transaction: None,
			nack_data_byte: None,
			status_override: None,
			commands: 0,
			data_bytes: 0,
		}
	}

	/// status reads the device needs before a measurement is valid
	pub fn with_ready_after(mut self, status_reads: u32) -> Self {
		self.device.ready_after = status_reads;
		self
	}

	/// whether the last point reports data-valid and sweep-complete
	/// together (otherwise sweep-complete is never set)
	pub fn with_complete_on_last_point(mut self, together: bool) -> Self {
		self.device.complete_with_last_data = together;
		self
	}

	pub fn with_temperature(mut self, celsius: f64) -> Self {
		self.device.temperature = celsius;
		self
	}

	/// never assert data-valid for sweep points
	pub fn never_ready(mut self) -> Self {
		self.device.faults.never_ready = true;
		self
	}

	/// NACK the address phase when the result registers of `point` are
	/// about to be read
	pub fn nack_readout_at(mut self, point: u16) -> Self {
		self.device.faults.nack_readout_at = Some(point);
		self
	}

	/// NACK the address phase of the `n`th transaction (1-based)
	pub fn nack_transaction(mut self, n: usize) -> Self {
		self.nack_transaction = Some(n);
		self
	}

	/// NACK the `n`th data byte written (1-based, address bytes not
	/// counted); the device drops the byte
	pub fn nack_data_byte(mut self, n: usize) -> Self {
		self.nack_data_byte = Some(n);
		self
	}

	/// report `status` instead of the real outcome for the `n`th bus
	/// phase (1-based, STOP not counted)
	pub fn override_status_at(mut self, n: usize, status: u8) -> Self {
		self.status_override = Some((n, status));
		self
	}

	/// report sweep-complete together with the data of `point`
	pub fn complete_at(mut self, point: u16) -> Self {
		self.device.faults.complete_at = Some(point);
		self
	}

	/// stop signalling completion of any bus phase
	pub fn set_stalled(&mut self, stalled: bool) {
		self.stalled = stalled;
	}

	/// drop the completion signal of the next `count` bus phases
	pub fn swallow_completions(&mut self, count: u32) {
		self.swallow = count;
	}

	pub fn transactions(&self) -> &[TransactionRecord] {
		&self.log
	}

	pub fn clear_transactions(&mut self) {
		self.log.clear();
	}

	pub fn starts(&self) -> usize {
		self.log.len()
	}

	pub fn stops(&self) -> usize {
		self.log.iter().filter(|t| t.stopped).count()
	}

	pub fn has_interrupt_handler(&self) -> bool {
		self.handler.is_some()
	}

	pub fn register(&self, reg: u8) -> u8 {
		self.device.register(reg)
	}

	pub fn pointer(&self) -> u8 {
		self.device.pointer()
	}

	/// sweep point the device is at
	pub fn point(&self) -> u16 {
		self.device.point()
	}

	fn record(&mut self) -> &mut TransactionRecord {
		if self.log.is_empty() {
			self.log.push(TransactionRecord::default());
		}
		let last = self.log.len() - 1;
		&mut self.log[last]
	}

	fn complete(&mut self, status: TwiStatus, data: u8) {
		let status = match self.status_override {
			Some((n, code)) if n == self.commands => TwiStatus(code),
			_ => status,
		};
		self.status = status.code();
		self.data = data;
		if self.stalled {
			return;
		}
		if self.swallow > 0 {
			self.swallow -= 1;
			return;
		}
		self.flag = true;
		if let Some(ref handler) = self.handler {
			handler.on_interrupt(self.status, self.data);
		}
	}

	fn address(&mut self, header: u8) -> TwiStatus {
		let direction = if 0 != header & 1 { Direction::Read } else { Direction::Write };
		let index = self.log.len();
		self.record().headers.push(header);

		let forced_nack = self.nack_transaction == Some(index);
		let ack = header >> 1 == DEVICE_ADDRESS && !forced_nack && self.device.acknowledge_address();
		if !ack {
			self.record().nacked = true;
			self.phase = BusPhase::Rejected;
			return match direction {
				Direction::Write => TwiStatus::MT_SLA_NACK,
				Direction::Read => TwiStatus::MR_SLA_NACK,
			};
		}
		match direction {
			Direction::Write => {
				self.phase = BusPhase::Write(WriteCommand::Command);
				TwiStatus::MT_SLA_ACK
			},
			Direction::Read => {
				self.phase = BusPhase::Read;
				TwiStatus::MR_SLA_ACK
			},
		}
	}

	fn write(&mut self, command: WriteCommand, byte: u8) -> WriteCommand {
		self.record().written.push(byte);
		match command {
			WriteCommand::Command => match byte {
				ADDRESS_POINTER_OPCODE => WriteCommand::Pointer,
				BLOCK_WRITE_OPCODE => WriteCommand::BlockWriteCount,
				BLOCK_READ_OPCODE => WriteCommand::BlockReadCount,
				reg => WriteCommand::Register(reg),
			},
			WriteCommand::Pointer => {
				self.device.set_pointer(byte);
				WriteCommand::Done
			},
			WriteCommand::BlockWriteCount => WriteCommand::BlockWrite { remaining: byte },
			WriteCommand::BlockWrite { remaining } if remaining > 0 => {
				let reg = self.device.pointer();
				self.device.write(reg, byte);
				self.device.set_pointer(reg.wrapping_add(1));
				WriteCommand::BlockWrite { remaining: remaining - 1 }
			},
			WriteCommand::Register(reg) => {
				self.device.write(reg, byte);
				WriteCommand::Done
			},
			// count of a block read, or bytes the device ignores
			_ => WriteCommand::Done,
		}
	}
}

impl TwiHardware for SimulatedBus {
	fn execute(&mut self, command: TwiCommand) {
		self.flag = false;
		if command != TwiCommand::Stop {
			self.commands += 1;
		}
		match (command, self.phase) {
			(TwiCommand::Start, BusPhase::Idle) => {
				self.log.push(TransactionRecord::default());
				self.phase = BusPhase::Started;
				self.complete(TwiStatus::START, 0);
			},
			(TwiCommand::Start, _) => {
				self.phase = BusPhase::Started;
				self.complete(TwiStatus::REPEATED_START, 0);
			},
			(TwiCommand::Transmit(header), BusPhase::Started) => {
				let status = self.address(header);
				self.complete(status, 0);
			},
			(TwiCommand::Transmit(byte), BusPhase::Write(command)) => {
				self.data_bytes += 1;
				if self.nack_data_byte == Some(self.data_bytes) {
					self.record().written.push(byte);
					self.record().nacked = true;
					self.phase = BusPhase::Rejected;
					self.complete(TwiStatus::MT_DATA_NACK, 0);
					return;
				}
				let next = self.write(command, byte);
				self.phase = BusPhase::Write(next);
				self.complete(TwiStatus::MT_DATA_ACK, 0);
			},
			(TwiCommand::Receive { ack }, BusPhase::Read) => {
				let byte = self.device.read_next();
				self.record().read.push(byte);
				let status = if ack { TwiStatus::MR_DATA_ACK } else { TwiStatus::MR_DATA_NACK };
				self.complete(status, byte);
			},
			(TwiCommand::Stop, _) => {
				if self.phase != BusPhase::Idle {
					self.record().stopped = true;
				}
				self.phase = BusPhase::Idle;
			},
			(_, _) => self.complete(TwiStatus::NO_INFO, 0),
		}
	}

	fn interrupt_flag(&mut self) -> bool {
		self.flag
	}

	fn status(&mut self) -> u8 {
		self.status
	}

	fn data(&mut self) -> u8 {
		self.data
	}

	fn stop_complete(&mut self) -> bool {
		!self.stalled
	}

	fn attach_interrupt(&mut self, handler: InterruptHandler) -> bool {
		self.handler = Some(handler);
		true
	}

	fn detach_interrupt(&mut self) {
		self.handler = None;
	}

	fn delay(&mut self) {
	}
}
