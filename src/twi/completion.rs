use std::sync::{
	Arc,
	Condvar,
	Mutex,
	MutexGuard,
};
use std::time::{
	Duration,
	Instant,
};

/// What the interrupt handler captured for one completed bus phase.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Completion {
	pub status: u8,
	pub data: u8,
}

#[derive(Default)]
struct SlotState {
	// bumped once per interrupt
	phase: u32,
	completion: Option<Completion>,
}

#[derive(Default)]
struct CompletionSlot {
	state: Mutex<SlotState>,
	ready: Condvar,
}

impl CompletionSlot {
	fn lock(&self) -> MutexGuard<SlotState> {
		// the state is plain data; a panicking holder can't leave it torn
		self.state.lock().unwrap_or_else(|e| e.into_inner())
	}
}

/// Interrupt-side handle of the engine's single-slot completion variable.
///
/// `on_interrupt` only records the status and data byte and advances the
/// phase counter; it never issues bus commands itself.
#[derive(Clone, Default)]
pub struct InterruptHandler {
	slot: Arc<CompletionSlot>,
}

impl InterruptHandler {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn on_interrupt(&self, status: u8, data: u8) {
		let mut state = self.slot.lock();
		state.phase = state.phase.wrapping_add(1);
		state.completion = Some(Completion { status, data });
		self.slot.ready.notify_one();
	}

	pub(super) fn phase(&self) -> u32 {
		self.slot.lock().phase
	}

	/// wait until an interrupt arrives after phase `seen` was observed, or
	/// the deadline passes. Takes the completion out of the slot.
	pub(super) fn wait_after(&self, seen: u32, deadline: Duration) -> Option<Completion> {
		let end = Instant::now() + deadline;
		let mut state = self.slot.lock();
		loop {
			if state.phase != seen {
				return state.completion.take();
			}
			let now = Instant::now();
			if now >= end {
				return None;
			}
			state = match self.slot.ready.wait_timeout(state, end - now) {
				Ok((state, _)) => state,
				Err(e) => e.into_inner().0,
			};
		}
	}
}
