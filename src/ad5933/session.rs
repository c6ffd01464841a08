use std::fmt;
use std::iter::FusedIterator;

use crate::error::SweepError;
use crate::sink::SampleSink;
use crate::twi::{
	TwiEngine,
	TwiHardware,
};

use super::config::SweepConfiguration;
use super::decode::DecodedSample;
use super::sweep::{
	SweepController,
	SweepPolicy,
	SweepState,
};

/// Top-level entry point: owns the controller (and with it the bus) and
/// hands out one sweep at a time.
pub struct SweepSession<H: TwiHardware> {
	controller: SweepController<H>,
}

impl<H: TwiHardware> SweepSession<H> {
	pub fn new(bus: TwiEngine<H>, policy: SweepPolicy) -> Self {
		SweepSession {
			controller: SweepController::new(bus, policy),
		}
	}

	pub fn state(&self) -> SweepState {
		self.controller.state()
	}

	pub fn controller(&self) -> &SweepController<H> {
		&self.controller
	}

	pub fn controller_mut(&mut self) -> &mut SweepController<H> {
		&mut self.controller
	}

	/// clear a fault; see `SweepController::reset`
	pub fn reset(&mut self) {
		self.controller.reset()
	}

	/// Configure the device and start sweeping.
	///
	/// The returned sequence measures one point per element; dropping it
	/// early leaves the device mid-sweep, use `Sweep::abort` instead.
	pub fn run(&mut self, config: &SweepConfiguration) -> Result<Sweep<H>, SweepError> {
		info!(
			"AD5933: sweep {} Hz + {} x {} Hz",
			config.start_frequency, config.increment_count, config.increment_frequency,
		);
		self.controller.enter_standby(config)?;
		self.controller.program()?;
		self.controller.start()?;

		Ok(Sweep {
			controller: &mut self.controller,
			done: false,
			yielded: 0,
		})
	}

	/// Run a whole sweep, handing every sample to `sink` as it arrives.
	pub fn run_into<S>(&mut self, config: &SweepConfiguration, sink: &mut S) -> Result<SweepReport, SweepError>
	where
		S: SampleSink + ?Sized,
	{
		let mut samples = Vec::new();
		let mut outcome = SweepOutcome::Completed;
		for sample in self.run(config)? {
			match sample {
				Ok(sample) => {
					sink.accept(&sample);
					samples.push(sample);
				},
				Err(e) => outcome = SweepOutcome::Aborted(e),
			}
		}
		Ok(SweepReport { samples, outcome })
	}
}

/// Lazy, finite sequence of the points of one sweep.
///
/// After an error the sequence ends; the error is the last element.
pub struct Sweep<'a, H: TwiHardware + 'a> {
	controller: &'a mut SweepController<H>,
	done: bool,
	yielded: usize,
}

impl<'a, H: TwiHardware> Sweep<'a, H> {
	pub fn samples_yielded(&self) -> usize {
		self.yielded
	}

	pub fn state(&self) -> SweepState {
		self.controller.state()
	}

	/// Stop between points and put the device into standby.
	pub fn abort(self) -> Result<(), SweepError> {
		info!("AD5933: aborting sweep after {} samples", self.yielded);
		self.controller.standby()
	}

	/// Consume the remaining points.
	pub fn finish(mut self) -> SweepReport {
		let mut samples = Vec::new();
		let mut outcome = SweepOutcome::Completed;
		while let Some(sample) = self.next() {
			match sample {
				Ok(sample) => samples.push(sample),
				Err(e) => outcome = SweepOutcome::Aborted(e),
			}
		}
		SweepReport { samples, outcome }
	}
}

impl<'a, H: TwiHardware> Iterator for Sweep<'a, H> {
	type Item = Result<DecodedSample, SweepError>;

	fn next(&mut self) -> Option<Self::Item> {
		if self.done {
			return None;
		}
		match self.controller.next_point() {
			Ok(Some((index, raw))) => {
				self.yielded += 1;
				Some(Ok(raw.decode(index)))
			},
			Ok(None) => {
				self.done = true;
				None
			},
			Err(e) => {
				self.done = true;
				Some(Err(e))
			},
		}
	}
}

impl<'a, H: TwiHardware> FusedIterator for Sweep<'a, H> {}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum SweepOutcome {
	Completed,
	Aborted(SweepError),
}

/// Samples of one sweep and how it ended.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SweepReport {
	pub samples: Vec<DecodedSample>,
	pub outcome: SweepOutcome,
}

impl SweepReport {
	pub fn is_complete(&self) -> bool {
		self.outcome == SweepOutcome::Completed
	}

	pub fn error(&self) -> Option<&SweepError> {
		match self.outcome {
			SweepOutcome::Completed => None,
			SweepOutcome::Aborted(ref e) => Some(e),
		}
	}
}

impl fmt::Display for SweepReport {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self.outcome {
			SweepOutcome::Completed => write!(f, "sweep completed with {} samples", self.samples.len()),
			SweepOutcome::Aborted(ref e) => write!(f, "sweep aborted after {} samples: {}", self.samples.len(), e),
		}
	}
}
