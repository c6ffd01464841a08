use std::str::FromStr;
use std::time::Duration;

use crate::error::{
	BusError,
	SweepError,
};
use crate::twi::{
	TwiEngine,
	TwiHardware,
	reliable_sleep,
};

use super::config::SweepConfiguration;
use super::control::Function;
use super::decode::{
	RawSample,
	decode_temperature,
};
use super::registers::{
	RegisterAccessor,
	RegisterAddress,
};
use super::status::StatusFlags;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum SweepState {
	Uninitialized,
	Standby,
	Initialized,
	Sweeping,
	/// sample of the current point captured, frequency not advanced yet
	PointReady,
	Complete,
	Faulted,
}

/// How the four result registers are fetched for each point.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum SampleReadMode {
	/// one block read of 0x94..0x97
	Block,
	/// two auto-incremented word reads: real, then imaginary
	Paired,
}

impl FromStr for SampleReadMode {
	type Err = failure::Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"block" => Ok(SampleReadMode::Block),
			"paired" => Ok(SampleReadMode::Paired),
			_ => bail!("unknown sample read mode {:?} (expected block or paired)", s),
		}
	}
}

// conversion after settling: 1024 samples at 1 MSPS
const CONVERSION_TIME: Duration = Duration::from_micros(1024);

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct SweepPolicy {
	/// minimum status reads before giving up on data-valid; raised per
	/// point to cover twice the settling and conversion time
	pub status_polls: u32,
	/// pause between two status reads
	pub poll_interval: Duration,
	/// bus timeouts tolerated per point; only reads are retried
	pub retry_budget: u32,
	pub read_mode: SampleReadMode,
}

impl Default for SweepPolicy {
	fn default() -> Self {
		SweepPolicy {
			status_polls: 1000,
			poll_interval: Duration::from_millis(1),
			retry_budget: 3,
			read_mode: SampleReadMode::Block,
		}
	}
}

/// Drives the converter through configuration and a frequency sweep.
///
/// Any bus error leaves the controller `Faulted`; it then refuses bus
/// access until `reset()`.
pub struct SweepController<H: TwiHardware> {
	bus: TwiEngine<H>,
	policy: SweepPolicy,
	state: SweepState,
	config: Option<SweepConfiguration>,
	point: u16,
	retries_left: u32,
}

impl<H: TwiHardware> SweepController<H> {
	pub fn new(bus: TwiEngine<H>, policy: SweepPolicy) -> Self {
		SweepController {
			bus,
			policy,
			state: SweepState::Uninitialized,
			config: None,
			point: 0,
			retries_left: policy.retry_budget,
		}
	}

	pub fn state(&self) -> SweepState {
		self.state
	}

	pub fn policy(&self) -> &SweepPolicy {
		&self.policy
	}

	pub fn config(&self) -> Option<&SweepConfiguration> {
		self.config.as_ref()
	}

	/// index of the point currently measured (or last captured)
	pub fn point(&self) -> u16 {
		self.point
	}

	pub fn bus(&self) -> &TwiEngine<H> {
		&self.bus
	}

	pub fn bus_mut(&mut self) -> &mut TwiEngine<H> {
		&mut self.bus
	}

	/// forget all device state; the next sweep reprograms from scratch
	pub fn reset(&mut self) {
		debug!("AD5933: reset controller (was {:?})", self.state);
		self.state = SweepState::Uninitialized;
		self.config = None;
		self.point = 0;
	}

	fn check(&self, operation: &'static str, allowed: &[SweepState]) -> Result<(), SweepError> {
		if self.state == SweepState::Faulted {
			return Err(SweepError::Faulted);
		}
		if !allowed.contains(&self.state) {
			return Err(SweepError::InvalidState { state: self.state, operation });
		}
		Ok(())
	}

	fn transition(&mut self, state: SweepState) {
		debug!("AD5933: {:?} -> {:?}", self.state, state);
		self.state = state;
	}

	fn fault<T>(&mut self, result: Result<T, BusError>) -> Result<T, SweepError> {
		result.map_err(|e| {
			error!("AD5933: bus error in state {:?} at point {}: {}", self.state, self.point, e);
			self.state = SweepState::Faulted;
			SweepError::Bus(e)
		})
	}

	fn active_config(&self) -> SweepConfiguration {
		self.config.unwrap_or_default()
	}

	// control high byte only; clock and reset bits in the low byte stay
	fn command(&mut self, function: Function) -> Result<(), BusError> {
		let word = self.active_config().control(function);
		debug!("AD5933: command {:?}", word);
		self.bus.write_register(RegisterAddress::CONTROL, word.high())
	}

	// retry reads that timed out, within the budget left for this point
	fn with_retries<T, F>(&mut self, what: &str, mut f: F) -> Result<T, BusError>
	where
		F: FnMut(&mut TwiEngine<H>) -> Result<T, BusError>,
	{
		loop {
			match f(&mut self.bus) {
				Err(BusError::Timeout) if self.retries_left > 0 => {
					self.retries_left -= 1;
					warn!("AD5933: timeout during {}, retrying ({} retries left)", what, self.retries_left);
				},
				r => return r,
			}
		}
	}

	fn read_status(&mut self) -> Result<StatusFlags, BusError> {
		self.with_retries("status read", |bus| bus.read_byte(RegisterAddress::STATUS)).map(StatusFlags)
	}

	// status reads needed to cover `expected` twice over, at least the
	// configured minimum
	fn poll_budget(&self, expected: Duration) -> u32 {
		let interval = self.policy.poll_interval.as_micros();
		if interval == 0 {
			return self.policy.status_polls;
		}
		let polls = 2 * expected.as_micros() / interval + 1;
		if polls > u128::from(u32::max_value()) {
			return u32::max_value();
		}
		self.policy.status_polls.max(polls as u32)
	}

	fn wait_for<F>(&mut self, what: &str, polls: u32, ready: F) -> Result<StatusFlags, BusError>
	where
		F: Fn(StatusFlags) -> bool,
	{
		for i in 0..polls {
			if i > 0 && self.policy.poll_interval > Duration::from_secs(0) {
				reliable_sleep(self.policy.poll_interval);
			}
			let status = self.read_status()?;
			if ready(status) {
				trace!("AD5933: status {:?} after {} reads", status, i + 1);
				return Ok(status);
			}
		}
		warn!("AD5933: {} not signalled after {} status reads", what, polls);
		Err(BusError::Timeout)
	}

	fn read_sample(&mut self) -> Result<RawSample, BusError> {
		match self.policy.read_mode {
			SampleReadMode::Block => {
				let mut bytes = [0u8; 4];
				self.with_retries("sample read", |bus| bus.read_block(RegisterAddress::REAL_DATA, &mut bytes))?;
				Ok(RawSample::from_bytes(bytes))
			},
			SampleReadMode::Paired => {
				let real = self.with_retries("real read", |bus| bus.read_word(RegisterAddress::REAL_DATA))?;
				let imag = self.with_retries("imaginary read", |bus| bus.read_word(RegisterAddress::IMAGINARY_DATA))?;
				Ok(RawSample {
					real_high: (real >> 8) as u8,
					real_low: real as u8,
					imag_high: (imag >> 8) as u8,
					imag_low: imag as u8,
				})
			},
		}
	}

	/// Standby with clock source, range and gain of `config`.
	pub fn enter_standby(&mut self, config: &SweepConfiguration) -> Result<(), SweepError> {
		self.check("enter standby", &[
			SweepState::Uninitialized,
			SweepState::Standby,
			SweepState::Initialized,
			SweepState::Complete,
		])?;
		config.validate()?;

		let word = config.control(Function::Standby);
		debug!("AD5933: command {:?}", word);
		let result = self.bus.write_block(RegisterAddress::CONTROL, &[word.high(), word.low()]);
		self.fault(result)?;

		self.config = Some(*config);
		self.point = 0;
		self.transition(SweepState::Standby);
		Ok(())
	}

	/// Program the sweep registers and initialize with the start frequency.
	pub fn program(&mut self) -> Result<(), SweepError> {
		self.check("program sweep", &[SweepState::Standby])?;
		let encoded = self.active_config().encode()?;

		let result = (|| {
			self.bus.write_block(RegisterAddress::START_FREQUENCY, &encoded.start_frequency)?;
			self.bus.write_block(RegisterAddress::FREQUENCY_INCREMENT, &encoded.frequency_increment)?;
			self.bus.write_block(RegisterAddress::INCREMENT_COUNT, &encoded.increment_count)?;
			self.bus.write_block(RegisterAddress::SETTLING_CYCLES, &encoded.settling_cycles)?;
			self.command(Function::InitializeWithStartFrequency)
		})();
		self.fault(result)?;

		self.transition(SweepState::Initialized);
		Ok(())
	}

	pub fn start(&mut self) -> Result<(), SweepError> {
		self.check("start sweep", &[SweepState::Initialized])?;
		let result = self.command(Function::StartSweep);
		self.fault(result)?;

		self.point = 0;
		self.transition(SweepState::Sweeping);
		Ok(())
	}

	/// Measure the next point. Returns `None` once the sweep is complete.
	///
	/// The result registers are always read before completion is acted
	/// on: a status showing data-valid and sweep-complete together still
	/// yields that last point.
	pub fn next_point(&mut self) -> Result<Option<(u16, RawSample)>, SweepError> {
		if self.state == SweepState::Complete {
			return Ok(None);
		}
		self.check("measure point", &[SweepState::Sweeping, SweepState::PointReady])?;
		self.retries_left = self.policy.retry_budget;

		if self.state == SweepState::PointReady {
			let result = self.command(Function::IncrementFrequency);
			self.fault(result)?;
			self.point += 1;
			self.transition(SweepState::Sweeping);
		}

		let expected = self.active_config().settling_time(self.point) + CONVERSION_TIME;
		let polls = self.poll_budget(expected);
		let result = self.wait_for("data valid", polls, |s| s.is_data_valid());
		let status = self.fault(result)?;
		let result = self.read_sample();
		let sample = self.fault(result)?;

		let index = self.point;
		let last = self.active_config().increment_count;
		if status.is_sweep_complete() || index >= last {
			if index < last {
				warn!("AD5933: device reported sweep complete at point {} of {}", index, last);
			}
			self.transition(SweepState::Complete);
		} else {
			self.transition(SweepState::PointReady);
		}

		Ok(Some((index, sample)))
	}

	/// Back to standby, keeping the programmed configuration. Also ends a
	/// sweep early.
	pub fn standby(&mut self) -> Result<(), SweepError> {
		self.check("enter standby", &[
			SweepState::Uninitialized,
			SweepState::Standby,
			SweepState::Initialized,
			SweepState::Sweeping,
			SweepState::PointReady,
			SweepState::Complete,
		])?;
		let result = self.command(Function::Standby);
		self.fault(result)?;
		self.transition(SweepState::Standby);
		Ok(())
	}

	/// Power down; the device has to be configured again afterwards.
	pub fn power_down(&mut self) -> Result<(), SweepError> {
		self.check("power down", &[
			SweepState::Uninitialized,
			SweepState::Standby,
			SweepState::Initialized,
			SweepState::Complete,
		])?;
		let result = self.command(Function::PowerDown);
		self.fault(result)?;
		self.point = 0;
		self.transition(SweepState::Uninitialized);
		Ok(())
	}

	/// Die temperature in °C.
	pub fn measure_temperature(&mut self) -> Result<f64, SweepError> {
		self.check("measure temperature", &[
			SweepState::Uninitialized,
			SweepState::Standby,
			SweepState::Complete,
		])?;
		self.retries_left = self.policy.retry_budget;

		let result = (|| {
			self.command(Function::MeasureTemperature)?;
			let polls = self.poll_budget(CONVERSION_TIME);
			self.wait_for("temperature valid", polls, |s| s.is_temperature_valid())?;
			self.with_retries("temperature read", |bus| bus.read_word(RegisterAddress::TEMPERATURE))
		})();
		let word = self.fault(result)?;

		let temperature = decode_temperature((word >> 8) as u8, word as u8);
		debug!("AD5933: temperature {} °C", temperature);
		Ok(temperature)
	}
}
