use std::time::Duration;

use ad5933_sweep::ad5933::{
	self,
	DecodedSample,
	SampleReadMode,
	SettlingMultiplier,
	SweepConfiguration,
	SweepPolicy,
	SweepSession,
	SweepState,
};
use ad5933_sweep::sim::{
	Scripted,
	SimulatedBus,
};
use ad5933_sweep::twi::{
	CompletionMode,
	Phase,
	TwiEngine,
};
use ad5933_sweep::{
	BusError,
	SweepError,
};

fn session_with(bus: SimulatedBus, mode: CompletionMode, policy: SweepPolicy) -> SweepSession<SimulatedBus> {
	let engine = TwiEngine::new(bus, ad5933::device_address(), mode).unwrap();
	SweepSession::new(engine, policy)
}

fn session(bus: SimulatedBus) -> SweepSession<SimulatedBus> {
	session_with(bus, CompletionMode::default(), SweepPolicy::default())
}

fn config(increment_count: u16) -> SweepConfiguration {
	SweepConfiguration {
		start_frequency: 30_000,
		increment_frequency: 1_000,
		increment_count,
		settling_cycles: 15,
		..Default::default()
	}
}

fn bus(session: &SweepSession<SimulatedBus>) -> &SimulatedBus {
	session.controller().bus().hardware()
}

fn sample(frequency_index: u16, real: i16, imaginary: i16) -> DecodedSample {
	DecodedSample { frequency_index, real, imaginary }
}

fn three_points() -> Scripted {
	Scripted(vec![(100, 50), (-100, -50), (0, 0)])
}

#[test]
fn sweep_yields_every_point_in_order() {
	let mut session = session(SimulatedBus::new(three_points()));
	let samples: Vec<_> = session.run(&config(2)).unwrap().collect::<Result<_, _>>().unwrap();

	assert_eq!(samples, vec![sample(0, 100, 50), sample(1, -100, -50), sample(2, 0, 0)]);
	assert_eq!(samples.len() as u32, config(2).points());
	assert_eq!(session.state(), SweepState::Complete);

	let bus = bus(&session);
	let regs: Vec<u8> = (0x82..=0x8b).map(|r| bus.register(r)).collect();
	assert_eq!(regs, vec![0x0e, 0xa6, 0x45, 0x00, 0x7d, 0x02, 0x00, 0x02, 0x00, 0x0f]);
	// last command was the increment to point 2
	assert_eq!(bus.register(0x80), 0x31);
	assert_eq!(bus.register(0x81), 0x00);
	assert_eq!(bus.point(), 2);
	assert_eq!(bus.starts(), bus.stops());
}

#[test]
fn sweep_ends_by_count_without_device_completion() {
	let sim = SimulatedBus::new(three_points()).with_complete_on_last_point(false);
	let mut session = session(sim);
	let report = session.run(&config(2)).unwrap().finish();

	assert!(report.is_complete());
	assert_eq!(report.samples.len(), 3);
	assert_eq!(session.state(), SweepState::Complete);
}

#[test]
fn completed_sweep_yields_nothing_more() {
	let mut session = session(SimulatedBus::new(three_points()));
	let mut sweep = session.run(&config(2)).unwrap();
	assert_eq!(sweep.by_ref().count(), 3);
	assert!(sweep.next().is_none());
	assert_eq!(sweep.samples_yielded(), 3);
	assert_eq!(session.controller_mut().next_point(), Ok(None));
}

#[test]
fn early_device_completion_ends_sweep() {
	let sim = SimulatedBus::new(three_points()).complete_at(1);
	let mut session = session(sim);
	let report = session.run(&config(4)).unwrap().finish();

	assert!(report.is_complete());
	assert_eq!(report.samples, vec![sample(0, 100, 50), sample(1, -100, -50)]);
	assert_eq!(session.state(), SweepState::Complete);
}

#[test]
fn nack_on_readout_faults_after_earlier_samples() {
	let sim = SimulatedBus::new(Scripted(vec![(1, 1), (2, 2), (3, 3), (4, 4), (5, 5)])).nack_readout_at(2);
	let mut session = session(sim);
	let results: Vec<_> = session.run(&config(4)).unwrap().collect();

	assert_eq!(results.len(), 3);
	assert_eq!(results[0], Ok(sample(0, 1, 1)));
	assert_eq!(results[1], Ok(sample(1, 2, 2)));
	assert_eq!(results[2], Err(SweepError::Bus(BusError::NotAcknowledged(Phase::Address))));
	assert_eq!(
		results[2].as_ref().err().and_then(SweepError::bus_error),
		Some(BusError::NotAcknowledged(Phase::Address)),
	);
	assert_eq!(session.state(), SweepState::Faulted);
	assert_eq!(bus(&session).starts(), bus(&session).stops());

	// refuses bus access until reset
	match session.run(&config(4)) {
		Err(e) => assert_eq!(e, SweepError::Faulted),
		Ok(_) => panic!("faulted session started a sweep"),
	}
	session.reset();
	assert_eq!(session.state(), SweepState::Uninitialized);

	let report = session.run(&config(4)).unwrap().finish();
	assert!(report.is_complete());
	assert_eq!(report.samples.len(), 5);
}

#[test]
fn device_that_never_measures_times_out() {
	let policy = SweepPolicy {
		status_polls: 10,
		..SweepPolicy::default()
	};
	let mut session = session_with(SimulatedBus::new(three_points()).never_ready(), CompletionMode::default(), policy);
	let report = session.run(&config(2)).unwrap().finish();

	assert!(report.samples.is_empty());
	assert_eq!(report.error(), Some(&SweepError::Bus(BusError::Timeout)));
	assert_eq!(session.state(), SweepState::Faulted);
	assert_eq!(report.to_string(), "sweep aborted after 0 samples: bus timeout");
}

#[test]
fn interrupt_completion_runs_the_same_sweep() {
	let mode = CompletionMode::Interrupt { deadline: Duration::from_secs(1) };
	let mut session = session_with(SimulatedBus::new(three_points()), mode, SweepPolicy::default());
	let samples: Vec<_> = session.run(&config(2)).unwrap().collect::<Result<_, _>>().unwrap();

	assert_eq!(samples, vec![sample(0, 100, 50), sample(1, -100, -50), sample(2, 0, 0)]);
}

#[test]
fn paired_reads_match_block_reads() {
	let policy = SweepPolicy {
		read_mode: SampleReadMode::Paired,
		..SweepPolicy::default()
	};
	let mut session = session_with(SimulatedBus::new(three_points()), CompletionMode::default(), policy);
	let samples: Vec<_> = session.run(&config(2)).unwrap().collect::<Result<_, _>>().unwrap();

	assert_eq!(samples, vec![sample(0, 100, 50), sample(1, -100, -50), sample(2, 0, 0)]);
}

#[test]
fn abort_between_points_returns_to_standby() {
	let mut session = session(SimulatedBus::new(three_points()));
	let mut sweep = session.run(&config(4)).unwrap();
	assert_eq!(sweep.next(), Some(Ok(sample(0, 100, 50))));
	assert_eq!(sweep.next(), Some(Ok(sample(1, -100, -50))));
	assert_eq!(sweep.state(), SweepState::PointReady);
	sweep.abort().unwrap();

	assert_eq!(session.state(), SweepState::Standby);
	let bus = bus(&session);
	assert_eq!(bus.register(0x80), 0xb1);
	// no increment after the last captured point
	assert_eq!(bus.point(), 1);
	assert_eq!(bus.starts(), bus.stops());
}

#[test]
fn session_can_sweep_again_after_completion() {
	let mut session = session(SimulatedBus::new(three_points()));
	assert!(session.run(&config(2)).unwrap().finish().is_complete());
	let report = session.run(&config(1)).unwrap().finish();
	assert_eq!(report.samples, vec![sample(0, 100, 50), sample(1, -100, -50)]);
}

#[test]
fn invalid_configuration_is_rejected_before_bus_access() {
	let mut session = session(SimulatedBus::new(three_points()));
	match session.run(&config(600)) {
		Err(SweepError::ConfigurationInvalid(_)) => (),
		Err(e) => panic!("unexpected error {}", e),
		Ok(_) => panic!("sweep started with 600 increments"),
	}
	assert_eq!(session.state(), SweepState::Uninitialized);
	assert_eq!(bus(&session).starts(), 0);
}

#[test]
fn operations_out_of_order_are_refused() {
	let mut session = session(SimulatedBus::new(three_points()));
	let controller = session.controller_mut();
	match controller.start() {
		Err(SweepError::InvalidState { state: SweepState::Uninitialized, .. }) => (),
		r => panic!("unexpected {:?}", r),
	}
	controller.enter_standby(&config(2)).unwrap();
	controller.program().unwrap();
	controller.start().unwrap();
	match controller.measure_temperature() {
		Err(SweepError::InvalidState { state: SweepState::Sweeping, .. }) => (),
		r => panic!("unexpected {:?}", r),
	}
	assert_eq!(controller.state(), SweepState::Sweeping);
}

#[test]
fn read_timeouts_are_retried_within_budget() {
	let mut session = session(SimulatedBus::new(three_points()));
	let controller = session.controller_mut();
	controller.enter_standby(&config(2)).unwrap();
	controller.program().unwrap();
	controller.start().unwrap();

	// every lost completion costs one status read attempt
	controller.bus_mut().hardware_mut().swallow_completions(3);
	let (index, raw) = controller.next_point().unwrap().unwrap();
	assert_eq!(raw.decode(index), sample(0, 100, 50));
	assert_eq!(controller.state(), SweepState::PointReady);
}

#[test]
fn exhausted_retry_budget_faults() {
	let mut session = session(SimulatedBus::new(three_points()));
	let controller = session.controller_mut();
	controller.enter_standby(&config(2)).unwrap();
	controller.program().unwrap();
	controller.start().unwrap();

	controller.bus_mut().hardware_mut().swallow_completions(4);
	assert_eq!(controller.next_point(), Err(SweepError::Bus(BusError::Timeout)));
	assert_eq!(controller.state(), SweepState::Faulted);
	let bus = controller.bus().hardware();
	assert_eq!(bus.starts(), bus.stops());
}

#[test]
fn temperature_is_measured_from_standby() {
	let sim = SimulatedBus::new(three_points()).with_temperature(-10.5);
	let mut session = session(sim);
	let controller = session.controller_mut();
	assert_eq!(controller.measure_temperature(), Ok(-10.5));

	controller.enter_standby(&config(2)).unwrap();
	assert_eq!(controller.measure_temperature(), Ok(-10.5));
	assert_eq!(controller.state(), SweepState::Standby);
}

#[test]
fn power_down_requires_new_configuration() {
	let mut session = session(SimulatedBus::new(three_points()));
	session.run(&config(2)).unwrap().finish();
	session.controller_mut().power_down().unwrap();

	assert_eq!(session.state(), SweepState::Uninitialized);
	assert_eq!(bus(&session).register(0x80), 0xa1);
	match session.controller_mut().program() {
		Err(SweepError::InvalidState { .. }) => (),
		r => panic!("unexpected {:?}", r),
	}
}

#[test]
fn run_into_feeds_sink_and_reports() {
	let mut session = session(SimulatedBus::new(three_points()));
	let mut seen: Vec<DecodedSample> = Vec::new();
	let report = session.run_into(&config(2), &mut seen).unwrap();

	assert_eq!(seen, report.samples);
	assert!(report.is_complete());
	assert_eq!(report.error(), None);
	assert_eq!(report.to_string(), "sweep completed with 3 samples");
}

#[test]
fn data_nack_faults_controller() {
	// first data byte is the pointer-set opcode of the standby write
	let mut session = session(SimulatedBus::new(three_points()).nack_data_byte(1));
	match session.run(&config(2)) {
		Err(e) => assert_eq!(e.bus_error(), Some(BusError::NotAcknowledged(Phase::Data))),
		Ok(_) => panic!("sweep started despite NACKed configuration"),
	}
	assert_eq!(session.state(), SweepState::Faulted);
	assert_eq!(bus(&session).starts(), 1);
	assert_eq!(bus(&session).stops(), 1);
}

#[test]
fn status_poll_budget_covers_settling_time() {
	let policy = SweepPolicy {
		status_polls: 1,
		..SweepPolicy::default()
	};
	let long_settling = SweepConfiguration {
		settling_cycles: 511,
		settling_multiplier: SettlingMultiplier::X4,
		..config(1)
	};

	// about 70 ms per point at 30 kHz: plenty of reads
	let sim = SimulatedBus::new(three_points()).with_ready_after(5);
	let mut session = session_with(sim, CompletionMode::default(), policy);
	let report = session.run(&long_settling).unwrap().finish();
	assert!(report.is_complete());
	assert_eq!(report.samples.len(), 2);

	// no settling: only conversion time, a few reads
	let short_settling = SweepConfiguration {
		settling_cycles: 0,
		..config(1)
	};
	let sim = SimulatedBus::new(three_points()).with_ready_after(5);
	let mut session = session_with(sim, CompletionMode::default(), policy);
	let report = session.run(&short_settling).unwrap().finish();
	assert_eq!(report.error(), Some(&SweepError::Bus(BusError::Timeout)));
}
