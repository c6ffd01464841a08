use crate::error::SweepError;

use super::decode::DecodedSample;

pub fn magnitude(sample: &DecodedSample) -> f64 {
	f64::from(sample.real).hypot(f64::from(sample.imaginary))
}

/// radians
pub fn phase(sample: &DecodedSample) -> f64 {
	f64::from(sample.imaginary).atan2(f64::from(sample.real))
}

/// Scale from response magnitude to impedance, determined by measuring a
/// known resistor.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct GainFactor(pub f64);

impl GainFactor {
	pub fn calibrate(reference: &DecodedSample, reference_ohms: f64) -> Result<Self, SweepError> {
		let m = magnitude(reference);
		if m == 0.0 {
			return Err(SweepError::ConfigurationInvalid("calibration sample has zero magnitude".into()));
		}
		if !(reference_ohms > 0.0) {
			return Err(SweepError::ConfigurationInvalid(format!("invalid reference resistance {}", reference_ohms)));
		}
		Ok(GainFactor(1.0 / (reference_ohms * m)))
	}

	/// ohms; infinite for a zero response
	pub fn impedance(&self, sample: &DecodedSample) -> f64 {
		let m = magnitude(sample);
		if m == 0.0 {
			return std::f64::INFINITY;
		}
		1.0 / (self.0 * m)
	}
}
