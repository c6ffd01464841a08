use std::fmt;

// TWI status codes (upper five bits of the status register)
const START:            u8 = 0x08;
const REPEATED_START:   u8 = 0x10;
const MT_SLA_ACK:       u8 = 0x18;
const MT_SLA_NACK:      u8 = 0x20;
const MT_DATA_ACK:      u8 = 0x28;
const MT_DATA_NACK:     u8 = 0x30;
const ARBITRATION_LOST: u8 = 0x38;
const MR_SLA_ACK:       u8 = 0x40;
const MR_SLA_NACK:      u8 = 0x48;
const MR_DATA_ACK:      u8 = 0x50;
const MR_DATA_NACK:     u8 = 0x58;
const NO_INFO:          u8 = 0xf8;

const STATUS_MASK: u8 = 0xf8;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TwiStatus(pub u8);

impl TwiStatus {
	pub const START: TwiStatus = TwiStatus(START);
	pub const REPEATED_START: TwiStatus = TwiStatus(REPEATED_START);
	pub const MT_SLA_ACK: TwiStatus = TwiStatus(MT_SLA_ACK);
	pub const MT_SLA_NACK: TwiStatus = TwiStatus(MT_SLA_NACK);
	pub const MT_DATA_ACK: TwiStatus = TwiStatus(MT_DATA_ACK);
	pub const MT_DATA_NACK: TwiStatus = TwiStatus(MT_DATA_NACK);
	pub const ARBITRATION_LOST: TwiStatus = TwiStatus(ARBITRATION_LOST);
	pub const MR_SLA_ACK: TwiStatus = TwiStatus(MR_SLA_ACK);
	pub const MR_SLA_NACK: TwiStatus = TwiStatus(MR_SLA_NACK);
	pub const MR_DATA_ACK: TwiStatus = TwiStatus(MR_DATA_ACK);
	pub const MR_DATA_NACK: TwiStatus = TwiStatus(MR_DATA_NACK);
	/// "no relevant state information"; also used for engine misuse
	pub const NO_INFO: TwiStatus = TwiStatus(NO_INFO);

	/// drop the prescaler bits some peripherals report in the low bits
	pub fn from_register(value: u8) -> Self {
		TwiStatus(value & STATUS_MASK)
	}

	pub fn code(&self) -> u8 {
		self.0
	}

	pub fn is_start(&self) -> bool {
		self.0 == START || self.0 == REPEATED_START
	}

	pub fn is_nack(&self) -> bool {
		match self.0 {
			MT_SLA_NACK | MR_SLA_NACK | MT_DATA_NACK => true,
			_ => false,
		}
	}

	fn describe(&self) -> &'static str {
		match self.0 {
			START => "START sent",
			REPEATED_START => "repeated START sent",
			MT_SLA_ACK => "address+W ACK",
			MT_SLA_NACK => "address+W NACK",
			MT_DATA_ACK => "data sent, ACK",
			MT_DATA_NACK => "data sent, NACK",
			ARBITRATION_LOST => "arbitration lost",
			MR_SLA_ACK => "address+R ACK",
			MR_SLA_NACK => "address+R NACK",
			MR_DATA_ACK => "data received, ACK returned",
			MR_DATA_NACK => "data received, NACK returned",
			NO_INFO => "no state information",
			_ => "unknown",
		}
	}
}

impl fmt::Display for TwiStatus {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "0x{:02x}", self.0)
	}
}

impl fmt::Debug for TwiStatus {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "0x{:02x} ({})", self.0, self.describe())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn masks_prescaler_bits() {
		assert_eq!(TwiStatus::from_register(0x1b), TwiStatus::MT_SLA_ACK);
	}

	#[test]
	fn classifies_acknowledgements() {
		assert!(TwiStatus::REPEATED_START.is_start());
		assert!(TwiStatus::MR_SLA_NACK.is_nack());
		// NACK we sent ourselves on the last read byte is not a device NACK
		assert!(!TwiStatus::MR_DATA_NACK.is_nack());
		assert_eq!(format!("{:?}", TwiStatus::ARBITRATION_LOST), "0x38 (arbitration lost)");
	}
}
