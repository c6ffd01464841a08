//! Conversion of raw result registers into signed values.

/// Combine a big-endian register pair as 16-bit two's complement.
pub fn decode(high: u8, low: u8) -> i16 {
	i16::from_be_bytes([high, low])
}

/// MSB-first '0'/'1' rendering, for diagnostic display only.
pub fn to_binary_digits(value: i16) -> String {
	format!("{:016b}", value as u16)
}

/// Temperature register pair: 14-bit two's complement in 1/32 °C.
pub fn decode_temperature(high: u8, low: u8) -> f64 {
	let raw = (i32::from(high) << 8 | i32::from(low)) & 0x3fff;
	let value = if raw & 0x2000 != 0 { raw - 0x4000 } else { raw };
	f64::from(value) / 32.0
}

/// Result registers of one sweep point, captured before the next
/// increment command.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct RawSample {
	pub real_high: u8,
	pub real_low: u8,
	pub imag_high: u8,
	pub imag_low: u8,
}

impl RawSample {
	/// bytes as read from 0x94..0x97
	pub fn from_bytes(bytes: [u8; 4]) -> Self {
		RawSample {
			real_high: bytes[0],
			real_low: bytes[1],
			imag_high: bytes[2],
			imag_low: bytes[3],
		}
	}

	pub fn decode(&self, frequency_index: u16) -> DecodedSample {
		DecodedSample {
			frequency_index,
			real: decode(self.real_high, self.real_low),
			imaginary: decode(self.imag_high, self.imag_low),
		}
	}
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct DecodedSample {
	pub frequency_index: u16,
	pub real: i16,
	pub imaginary: i16,
}
