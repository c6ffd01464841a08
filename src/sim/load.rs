use std::f64::consts::PI;

use super::device::SampleSource;

/// Series RC network as seen by the converter: the DFT result is
/// proportional to the load's admittance.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct RcLoad {
	pub resistance: f64,
	pub capacitance: f64,
	/// DFT counts per siemens
	pub scale: f64,
	/// MCLK the frequency codes were computed for
	pub clock_hz: u32,
}

impl RcLoad {
	pub fn new(resistance: f64, capacitance: f64, clock_hz: u32) -> Self {
		RcLoad {
			resistance,
			capacitance,
			scale: 1e9,
			clock_hz,
		}
	}

	pub fn frequency(&self, frequency_code: u32) -> f64 {
		f64::from(frequency_code) * f64::from(self.clock_hz) / f64::from(1u32 << 29)
	}

	/// `(real, imaginary)` admittance at `hz`
	pub fn admittance(&self, hz: f64) -> (f64, f64) {
		let reactance = if self.capacitance > 0.0 && hz > 0.0 {
			1.0 / (2.0 * PI * hz * self.capacitance)
		} else {
			0.0
		};
		let denominator = self.resistance * self.resistance + reactance * reactance;
		if denominator == 0.0 {
			return (0.0, 0.0);
		}
		(self.resistance / denominator, reactance / denominator)
	}
}

fn saturate(v: f64) -> i16 {
	if v >= f64::from(i16::max_value()) {
		i16::max_value()
	} else if v <= f64::from(i16::min_value()) {
		i16::min_value()
	} else {
		v.round() as i16
	}
}

impl SampleSource for RcLoad {
	fn sample(&mut self, _point: u16, frequency_code: u32) -> (i16, i16) {
		let (g, b) = self.admittance(self.frequency(frequency_code));
		(saturate(g * self.scale), saturate(b * self.scale))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn pure_resistor_has_no_imaginary_part() {
		let mut load = RcLoad::new(200_000.0, 0.0, 16_776_000);
		let (real, imag) = load.sample(0, 0x0e_a645);
		assert_eq!(real, 5000);
		assert_eq!(imag, 0);
	}

	#[test]
	fn capacitor_adds_positive_susceptance() {
		let mut load = RcLoad::new(100_000.0, 1e-9, 16_776_000);
		let (_, imag) = load.sample(0, 0x0e_a645);
		assert!(imag > 0);
	}

	#[test]
	fn saturates_small_loads() {
		let mut load = RcLoad::new(1.0, 0.0, 16_776_000);
		assert_eq!(load.sample(0, 0x0e_a645), (i16::max_value(), 0));
	}
}
