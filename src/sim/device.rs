use crate::ad5933::consts::*;
use crate::ad5933::{
	Function,
	StatusFlags,
};

/// Produces the response of the simulated load at one sweep point.
pub trait SampleSource {
	/// `(real, imaginary)` for point `point`, measured at the 24-bit
	/// frequency code `frequency_code`
	fn sample(&mut self, point: u16, frequency_code: u32) -> (i16, i16);
}

impl<F: FnMut(u16, u32) -> (i16, i16)> SampleSource for F {
	fn sample(&mut self, point: u16, frequency_code: u32) -> (i16, i16) {
		self(point, frequency_code)
	}
}

/// Fixed per-point responses; points past the end read as zero.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct Scripted(pub Vec<(i16, i16)>);

impl SampleSource for Scripted {
	fn sample(&mut self, point: u16, _frequency_code: u32) -> (i16, i16) {
		self.0.get(usize::from(point)).cloned().unwrap_or((0, 0))
	}
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
enum Measurement {
	Idle,
	Sweep,
	Temperature,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct DeviceFaults {
	pub never_ready: bool,
	pub nack_readout_at: Option<u16>,
	pub complete_at: Option<u16>,
}

/// Register-level model of the converter.
pub struct DeviceModel {
	registers: [u8; 256],
	pointer: u8,
	point: u16,
	status: StatusFlags,
	measurement: Measurement,
	// status reads until the running measurement finishes
	countdown: u32,
	pub ready_after: u32,
	pub complete_with_last_data: bool,
	pub temperature: f64,
	pub faults: DeviceFaults,
	source: Box<dyn SampleSource>,
}

impl DeviceModel {
	pub fn new(source: Box<dyn SampleSource>) -> Self {
		DeviceModel {
			registers: [0u8; 256],
			pointer: 0,
			point: 0,
			status: StatusFlags::default(),
			measurement: Measurement::Idle,
			countdown: 0,
			ready_after: 2,
			complete_with_last_data: true,
			temperature: 25.0,
			faults: DeviceFaults::default(),
			source,
		}
	}

	pub fn pointer(&self) -> u8 {
		self.pointer
	}

	pub fn register(&self, reg: u8) -> u8 {
		if reg == STATUS_REGISTER {
			return self.status.0;
		}
		self.registers[usize::from(reg)]
	}

	pub fn point(&self) -> u16 {
		self.point
	}

	fn word(&self, reg: u8) -> u32 {
		u32::from(self.registers[usize::from(reg)]) << 8 | u32::from(self.registers[usize::from(reg) + 1])
	}

	fn triple(&self, reg: u8) -> u32 {
		u32::from(self.registers[usize::from(reg)]) << 16 | self.word(reg + 1)
	}

	fn increment_count(&self) -> u16 {
		(self.word(INCREMENT_COUNT_REGISTER) & 0x1ff) as u16
	}

	pub fn set_pointer(&mut self, reg: u8) {
		self.pointer = reg;
	}

	/// whether the device answers its address right now; an injected
	/// readout NACK fires once
	pub fn acknowledge_address(&mut self) -> bool {
		let reading_result = self.pointer >= REAL_DATA_REGISTER && self.pointer <= IMAGINARY_DATA_REGISTER + 1;
		match self.faults.nack_readout_at {
			Some(point) if reading_result && self.point == point && self.status.is_data_valid() => {
				self.faults.nack_readout_at = None;
				false
			},
			_ => true,
		}
	}

	pub fn write(&mut self, reg: u8, value: u8) {
		match reg {
			STATUS_REGISTER => (), // read only
			CONTROL_REGISTER => {
				self.registers[usize::from(reg)] = value;
				self.control(value >> 4);
			},
			_ => {
				self.registers[usize::from(reg)] = value;
				if reg == CONTROL_REGISTER + 1 && 0 != value & 0x10 {
					self.measurement = Measurement::Idle;
					self.status = StatusFlags::default();
				}
			},
		}
	}

	/// next byte of a read transaction; the pointer auto-increments
	pub fn read_next(&mut self) -> u8 {
		let reg = self.pointer;
		if reg == STATUS_REGISTER {
			self.tick();
		}
		let value = self.register(reg);
		self.pointer = self.pointer.wrapping_add(1);
		value
	}

	fn control(&mut self, function: u8) {
		match Function::from_code(function) {
			Some(Function::InitializeWithStartFrequency) => {
				self.point = 0;
				self.status = StatusFlags::default();
				self.measurement = Measurement::Idle;
			},
			Some(Function::StartSweep) | Some(Function::RepeatFrequency) => self.measure(Measurement::Sweep),
			Some(Function::IncrementFrequency) => {
				if self.point < self.increment_count() {
					self.point += 1;
				}
				self.measure(Measurement::Sweep);
			},
			Some(Function::MeasureTemperature) => self.measure(Measurement::Temperature),
			Some(Function::PowerDown) | Some(Function::Standby) | None => {
				self.status = StatusFlags::default();
				self.measurement = Measurement::Idle;
			},
		}
	}

	fn measure(&mut self, measurement: Measurement) {
		self.status.set_data_valid(false).set_temperature_valid(false);
		self.measurement = measurement;
		self.countdown = self.ready_after;
	}

	// one status read worth of time passes
	fn tick(&mut self) {
		if self.measurement == Measurement::Idle {
			return;
		}
		if self.countdown > 1 {
			self.countdown -= 1;
			return;
		}

		match self.measurement {
			Measurement::Sweep => {
				if self.faults.never_ready {
					return;
				}
				let code = self.triple(START_FREQUENCY_REGISTER)
					+ u32::from(self.point) * self.triple(FREQUENCY_INCREMENT_REGISTER);
				let (real, imag) = self.source.sample(self.point, code);
				let r = real.to_be_bytes();
				let i = imag.to_be_bytes();
				let base = usize::from(REAL_DATA_REGISTER);
				self.registers[base..base + 4].copy_from_slice(&[r[0], r[1], i[0], i[1]]);

				let last = self.point >= self.increment_count() && self.complete_with_last_data;
				let early = self.faults.complete_at == Some(self.point);
				self.status.set_data_valid(true);
				if last || early {
					self.status.set_sweep_complete(true);
				}
			},
			Measurement::Temperature => {
				let code = ((self.temperature * 32.0).round() as i32 & 0x3fff) as u16;
				let base = usize::from(TEMPERATURE_REGISTER);
				self.registers[base] = (code >> 8) as u8;
				self.registers[base + 1] = code as u8;
				self.status.set_temperature_valid(true);
			},
			Measurement::Idle => (),
		}
		self.measurement = Measurement::Idle;
	}
}
