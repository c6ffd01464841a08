#[macro_use]
extern crate clap;
#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;

extern crate ad5933_sweep;
use ad5933_sweep::*;

use std::process::exit;
use std::time::Duration;

use ad5933_sweep::ad5933::{
	GainFactor,
	SampleReadMode,
	SweepConfiguration,
	SweepPolicy,
	SweepSession,
};
use ad5933_sweep::sim::{
	RcLoad,
	SimulatedBus,
};
use ad5933_sweep::sink::LogSink;
use ad5933_sweep::twi::{
	CompletionMode,
	TwiEngine,
};

fn get_param<T>(matches: &clap::ArgMatches, name: &str) -> AResult<T>
where
	T: std::str::FromStr,
	failure::Error: From<<T as std::str::FromStr>::Err>,
{
	let param = match matches.value_of(name) {
		Some(p) => p,
		None => bail!("missing parameter {}", name),
	};
	param.parse::<T>().map_err(|e| {
		let e = failure::Error::from(e);
		let msg = format!("invalid paramater {}: {}", name, e);
		e.context(msg).into()
	})
}

// accepts "0x1f", "1f" and "0b00011111"
fn parse_byte(s: &str) -> AResult<u8> {
	let v = if s.starts_with("0b") {
		u8::from_str_radix(&s[2..], 2)
	} else if s.starts_with("0x") {
		u8::from_str_radix(&s[2..], 16)
	} else {
		u8::from_str_radix(s, 16)
	};
	v.map_err(|e| {
		let e = failure::Error::from(e);
		let msg = format!("invalid register byte {:?}: {}", s, e);
		e.context(msg).into()
	})
}

fn sweep_config(matches: &clap::ArgMatches) -> AResult<SweepConfiguration> {
	Ok(SweepConfiguration {
		start_frequency: get_param(matches, "start")?,
		increment_frequency: get_param(matches, "increment")?,
		increment_count: get_param(matches, "count")?,
		settling_cycles: get_param(matches, "settling")?,
		settling_multiplier: get_param(matches, "multiplier")?,
		clock_source: get_param(matches, "clock")?,
		voltage_range: get_param(matches, "range")?,
		pga_gain: get_param(matches, "gain")?,
	})
}

fn open_session(matches: &clap::ArgMatches, bus: SimulatedBus) -> AResult<SweepSession<SimulatedBus>> {
	let mode: CompletionMode = get_param(matches, "mode")?;
	let read_mode: SampleReadMode = get_param(matches, "read")?;
	let engine = TwiEngine::new(bus, ad5933::device_address(), mode)?;
	let policy = SweepPolicy {
		status_polls: get_param(matches, "polls")?,
		poll_interval: Duration::from_micros(get_param(matches, "interval")?),
		read_mode,
		..SweepPolicy::default()
	};
	Ok(SweepSession::new(engine, policy))
}

fn sweep(matches: &clap::ArgMatches) -> AResult<()> {
	let config = sweep_config(matches)?;
	let resistance: f64 = get_param(matches, "resistance")?;
	let capacitance: f64 = get_param(matches, "capacitance")?;
	let load = RcLoad::new(resistance, capacitance, config.clock_source.frequency());

	let mut session = open_session(matches, SimulatedBus::new(load))?;
	info!("{} points, first settling time {:?}", config.points(), config.settling_time(0));
	let mut sink = LogSink { binary: matches.is_present("binary") };
	let report = session.run_into(&config, &mut sink)?;

	if matches.is_present("calibrate") {
		let reference: f64 = get_param(matches, "calibrate")?;
		if let Some(first) = report.samples.first() {
			let gain = GainFactor::calibrate(first, reference)?;
			info!("gain factor {:e} (point 0 taken as {} Ω)", gain.0, reference);
			for sample in &report.samples {
				info!(
					"{:>8} Hz: |Z| = {:.1} Ω, phase {:.2} rad",
					config.frequency_at(sample.frequency_index),
					gain.impedance(sample),
					ad5933::phase(sample),
				);
			}
		}
	}

	match report.error() {
		None => {
			info!("{}", report);
			Ok(())
		},
		Some(e) => match e.bus_error() {
			Some(bus) => bail!("{} (bus failure: {})", report, bus),
			None => bail!("{}", report),
		},
	}
}

fn temperature(matches: &clap::ArgMatches) -> AResult<()> {
	let celsius: f64 = get_param(matches, "celsius")?;
	let mut session = open_session(matches, SimulatedBus::new(ad5933_sweep::sim::Scripted::default()).with_temperature(celsius))?;
	let t = session.controller_mut().measure_temperature()?;
	println!("{:.2} °C", t);
	session.controller_mut().power_down()?;
	Ok(())
}

fn decode(matches: &clap::ArgMatches) -> AResult<()> {
	let (high, low) = match (matches.value_of("HIGH"), matches.value_of("LOW")) {
		(Some(high), Some(low)) => (parse_byte(high)?, parse_byte(low)?),
		_ => bail!("need both register bytes"),
	};
	let value = ad5933::decode(high, low);
	println!("{} ({})", value, ad5933::to_binary_digits(value));
	Ok(())
}

fn main_app() -> AResult<()> {
	let matches = clap_app!(@app (app_from_crate!())
		(@setting SubcommandRequiredElseHelp)
		(global_setting: clap::AppSettings::VersionlessSubcommands)
		(@subcommand sweep =>
			(about: "run a frequency sweep against a simulated RC load")
			(@arg start: --start [HZ] default_value("30000") "start frequency")
			(@arg increment: --increment [HZ] default_value("1000") "frequency increment")
			(@arg count: --count [N] default_value("10") "number of increments (0..511)")
			(@arg settling: --settling [CYCLES] default_value("15") "settling time cycles (0..511)")
			(@arg multiplier: --multiplier [M] default_value("x1") "settling cycles multiplier (x1, x2, x4)")
			(@arg clock: --clock [SOURCE] default_value("internal") "internal or external=<Hz>")
			(@arg range: --range [RANGE] default_value("2v") "output range (2v, 1v, 400mv, 200mv)")
			(@arg gain: --gain [GAIN] default_value("x1") "PGA gain (x1, x5)")
			(@arg mode: --mode [MODE] default_value("polled") "bus completion: polled or interrupt")
			(@arg read: --read [MODE] default_value("block") "result register reads: block or paired")
			(@arg polls: --polls [N] default_value("1000") "minimum status reads before a point times out")
			(@arg interval: --interval [US] default_value("1000") "microseconds between status reads")
			(@arg resistance: --resistance [OHMS] default_value("200000") "simulated load resistance")
			(@arg capacitance: --capacitance [FARAD] default_value("0") "simulated load capacitance in series")
			(@arg calibrate: --calibrate [OHMS] "take point 0 as reference resistor and print impedances")
			(@arg binary: -b --binary "also log raw bit patterns")
		)
		(@subcommand temperature =>
			(about: "measure the die temperature of a simulated device")
			(@arg celsius: --celsius [C] default_value("25") "simulated die temperature")
			(@arg mode: --mode [MODE] default_value("polled") "bus completion: polled or interrupt")
			(@arg read: --read [MODE] default_value("block") "result register reads: block or paired")
			(@arg polls: --polls [N] default_value("1000") "minimum status reads before the measurement times out")
			(@arg interval: --interval [US] default_value("1000") "microseconds between status reads")
		)
		(@subcommand decode =>
			(about: "decode a result register pair (hex, or binary with 0b prefix)")
			(@arg HIGH: +required "high byte")
			(@arg LOW: +required "low byte")
		)
	).get_matches();

	match matches.subcommand() {
		("sweep", Some(sub_m)) => {
			sweep(sub_m)
		},
		("temperature", Some(sub_m)) => {
			temperature(sub_m)
		},
		("decode", Some(sub_m)) => {
			decode(sub_m)
		},
		("", _) => bail!("no subcommand"),
		(cmd, _) => bail!("not implemented subcommand {:?}", cmd),
	}
}

fn main() {
	env_logger::from_env(env_logger::Env::default().default_filter_or("info")).init();

	if let Err(e) = main_app() {
		error!("Error: {}", e);
		exit(1);
	}
}
