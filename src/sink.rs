//! Where decoded samples go for display; the sweep code never formats
//! results itself.

use crate::ad5933::{
	DecodedSample,
	to_binary_digits,
};

pub trait SampleSink {
	fn accept(&mut self, sample: &DecodedSample);
}

impl SampleSink for Vec<DecodedSample> {
	fn accept(&mut self, sample: &DecodedSample) {
		self.push(*sample);
	}
}

impl<'a, S: SampleSink + ?Sized> SampleSink for &'a mut S {
	fn accept(&mut self, sample: &DecodedSample) {
		(**self).accept(sample)
	}
}

/// Logs every sample at info level.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct LogSink {
	/// also log the raw bit patterns
	pub binary: bool,
}

impl SampleSink for LogSink {
	fn accept(&mut self, sample: &DecodedSample) {
		if self.binary {
			info!(
				"point {:3}: R={:6} ({}) I={:6} ({})",
				sample.frequency_index,
				sample.real,
				to_binary_digits(sample.real),
				sample.imaginary,
				to_binary_digits(sample.imaginary),
			);
		} else {
			info!("point {:3}: R={:6} I={:6}", sample.frequency_index, sample.real, sample.imaginary);
		}
	}
}
