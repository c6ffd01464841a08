use ad5933_sweep::ad5933::{
	self,
	RegisterAccessor,
	RegisterAddress,
};
use ad5933_sweep::sim::{
	Scripted,
	SimulatedBus,
	TransactionRecord,
};
use ad5933_sweep::twi::{
	CompletionMode,
	Direction,
	EngineState,
	Phase,
	TwiEngine,
};
use ad5933_sweep::BusError;

fn engine(bus: SimulatedBus) -> TwiEngine<SimulatedBus> {
	TwiEngine::new(bus, ad5933::device_address(), CompletionMode::default()).unwrap()
}

fn idle() -> SimulatedBus {
	SimulatedBus::new(Scripted::default())
}

#[test]
fn pointer_set_is_idempotent() {
	let mut bus = engine(idle());
	bus.set_pointer(RegisterAddress::STATUS).unwrap();
	bus.set_pointer(RegisterAddress::STATUS).unwrap();

	let sim = bus.hardware();
	assert_eq!(sim.pointer(), 0x8f);
	let record = TransactionRecord {
		headers: vec![0x1a],
		written: vec![0xb0, 0x8f],
		read: vec![],
		nacked: false,
		stopped: true,
	};
	assert_eq!(sim.transactions(), &[record.clone(), record][..]);
}

#[test]
fn block_write_stores_consecutive_registers() {
	let mut bus = engine(idle());
	bus.write_block(RegisterAddress::START_FREQUENCY, &[0x0e, 0xa6, 0x45]).unwrap();

	let sim = bus.hardware();
	assert_eq!((sim.register(0x82), sim.register(0x83), sim.register(0x84)), (0x0e, 0xa6, 0x45));
	assert_eq!(sim.transactions()[1].written, vec![0xa0, 3, 0x0e, 0xa6, 0x45]);
	assert_eq!(sim.starts(), 2);
	assert_eq!(sim.stops(), 2);
}

#[test]
fn block_read_uses_repeated_start() {
	let mut bus = engine(idle());
	bus.write_block(RegisterAddress::INCREMENT_COUNT, &[0x01, 0xff]).unwrap();
	bus.hardware_mut().clear_transactions();

	let mut target = [0u8; 2];
	bus.read_block(RegisterAddress::INCREMENT_COUNT, &mut target).unwrap();
	assert_eq!(target, [0x01, 0xff]);

	let read = &bus.hardware().transactions()[1];
	assert_eq!(read.headers, vec![0x1a, 0x1b]);
	assert_eq!(read.written, vec![0xa1, 2]);
	assert_eq!(read.read, vec![0x01, 0xff]);
	assert!(read.stopped);
}

#[test]
fn word_read_relies_on_auto_increment() {
	let mut bus = engine(idle());
	bus.write_block(RegisterAddress::SETTLING_CYCLES, &[0x06, 0x0f]).unwrap();
	assert_eq!(bus.read_word(RegisterAddress::SETTLING_CYCLES), Ok(0x060f));
	assert_eq!(bus.hardware().pointer(), 0x8c);
}

#[test]
fn single_register_write() {
	let mut bus = engine(idle());
	bus.write_register(RegisterAddress::CONTROL.offset(1), 0x08).unwrap();
	assert_eq!(bus.hardware().register(0x81), 0x08);
	assert_eq!(bus.read_byte(RegisterAddress(0x81)), Ok(0x08));
}

#[test]
fn address_nack_still_releases_bus() {
	let mut bus = engine(idle().nack_transaction(1));
	assert_eq!(
		bus.write_register(RegisterAddress::CONTROL, 0xb1),
		Err(BusError::NotAcknowledged(Phase::Address)),
	);
	assert_eq!(bus.state(), EngineState::Idle);

	let sim = bus.hardware();
	assert!(sim.transactions()[0].nacked);
	assert_eq!(sim.starts(), 1);
	assert_eq!(sim.stops(), 1);
	assert_eq!(sim.register(0x80), 0);
}

#[test]
fn wrong_target_is_not_acknowledged() {
	let target = ad5933_sweep::twi::BusAddress::new(0x0e).unwrap();
	let mut bus = TwiEngine::new(idle(), target, CompletionMode::default()).unwrap();
	assert_eq!(bus.read_byte(RegisterAddress::STATUS), Err(BusError::NotAcknowledged(Phase::Address)));
}

#[test]
fn lost_completion_times_out() {
	let mut bus = TwiEngine::new(idle(), ad5933::device_address(), CompletionMode::Polled { max_polls: 4 }).unwrap();
	bus.hardware_mut().swallow_completions(1);
	assert_eq!(bus.set_pointer(RegisterAddress::STATUS), Err(BusError::Timeout));
	assert_eq!(bus.hardware().stops(), 1);

	// next transaction is unaffected
	assert_eq!(bus.set_pointer(RegisterAddress::STATUS), Ok(()));
}

#[test]
fn stalled_bus_times_out_in_interrupt_mode() {
	let mode = CompletionMode::Interrupt { deadline: std::time::Duration::from_millis(10) };
	let mut bus = TwiEngine::new(idle(), ad5933::device_address(), mode).unwrap();
	bus.hardware_mut().set_stalled(true);
	assert_eq!(bus.read_byte(RegisterAddress::STATUS), Err(BusError::Timeout));
	assert_eq!(bus.state(), EngineState::Idle);

	bus.hardware_mut().set_stalled(false);
	assert!(bus.read_byte(RegisterAddress::STATUS).is_ok());
}

#[test]
fn transaction_direction_is_enforced() {
	let mut bus = engine(idle());
	{
		let mut tx = bus.begin(Direction::Read).unwrap();
		match tx.write(0x00) {
			Err(BusError::ProtocolViolation { phase: Phase::Data, status: 0xf8 }) => (),
			r => panic!("unexpected {:?}", r),
		}
		assert_eq!(tx.transfer_byte(None).map(|b| b.is_some()), Ok(true));
		tx.end().unwrap();
	}
	let mut tx = bus.begin(Direction::Write).unwrap();
	assert!(tx.transfer_byte(None).is_err());
	drop(tx);
	assert_eq!(bus.hardware().starts(), bus.hardware().stops());
}

#[test]
fn unexpected_hardware_status_is_a_protocol_violation() {
	// phases: START, address, register byte
	let mut bus = engine(idle().override_status_at(3, 0x38));
	assert_eq!(
		bus.write_register(RegisterAddress::CONTROL, 0xb1),
		Err(BusError::ProtocolViolation { phase: Phase::Data, status: 0x38 }),
	);
	assert_eq!(bus.state(), EngineState::Idle);
	let sim = bus.hardware();
	assert_eq!(sim.starts(), 1);
	assert_eq!(sim.stops(), 1);
}

#[test]
fn unexpected_start_status_is_a_protocol_violation() {
	let mut bus = engine(idle().override_status_at(1, 0xf8));
	assert_eq!(
		bus.set_pointer(RegisterAddress::STATUS),
		Err(BusError::ProtocolViolation { phase: Phase::Start, status: 0xf8 }),
	);
	assert_eq!(bus.hardware().starts(), bus.hardware().stops());
}

#[test]
fn data_nack_still_releases_bus() {
	let mut bus = engine(idle().nack_data_byte(2));
	assert_eq!(
		bus.write_register(RegisterAddress::CONTROL.offset(1), 0x08),
		Err(BusError::NotAcknowledged(Phase::Data)),
	);
	let sim = bus.hardware();
	assert!(sim.transactions()[0].nacked);
	assert_eq!(sim.starts(), 1);
	assert_eq!(sim.stops(), 1);
	assert_eq!(sim.register(0x81), 0);
}

#[test]
fn dropping_engine_detaches_interrupt_handler() {
	let mut sim = idle();
	{
		let mode = CompletionMode::Interrupt { deadline: std::time::Duration::from_secs(1) };
		let mut bus = TwiEngine::new(&mut sim, ad5933::device_address(), mode).unwrap();
		assert!(bus.hardware().has_interrupt_handler());
		bus.set_pointer(RegisterAddress::STATUS).unwrap();
	}
	assert!(!sim.has_interrupt_handler());
	assert_eq!(sim.pointer(), 0x8f);

	// polled engines leave the peripheral alone
	let bus = TwiEngine::new(&mut sim, ad5933::device_address(), CompletionMode::default()).unwrap();
	drop(bus);
	assert!(!sim.has_interrupt_handler());
}
