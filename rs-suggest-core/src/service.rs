use std::sync::Arc;
use std::time::Duration;

use log::debug;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::config::PredictorConfig;
use crate::error::Result;
use crate::model::prediction::Prediction;
use crate::model::session::PredictionSession;

/// Lifecycle of the debounce timer.
///
/// `Idle -> Scheduled -> Fired -> Idle`. Re-arming while `Scheduled` replaces
/// the timer and stays `Scheduled`. `Fired` holds until the next request: a
/// fast-path answer returns to `Idle`, any other request arms a new timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebouncePhase {
	Idle,
	Scheduled,
	Fired,
}

/// A request waiting for its timer.
struct PendingRequest {
	generation: u64,
	context_text: String,
	max_predictions: usize,
	/// Every caller coalesced into this request.
	waiters: Vec<oneshot::Sender<Vec<Prediction>>>,
	timer: JoinHandle<()>,
}

struct DebounceState {
	phase: DebouncePhase,
	generation: u64,
	pending: Option<PendingRequest>,
	last_fired: Option<String>,
}

struct Shared {
	session: Mutex<PredictionSession>,
	state: Mutex<DebounceState>,
	delay: Duration,
}

impl Shared {
	/// Runs the pipeline for the pending request armed as `generation`.
	///
	/// A timer whose request was replaced in the meantime does nothing.
	fn fire(&self, generation: u64) {
		let pending = {
			let mut state = self.state.lock();
			if state.pending.as_ref().map(|p| p.generation) != Some(generation) {
				return;
			}
			let Some(pending) = state.pending.take() else {
				return;
			};
			state.phase = DebouncePhase::Fired;
			state.last_fired = Some(pending.context_text.clone());
			pending
		};

		debug!(
			"Debounce fired for '{}' ({} waiters)",
			pending.context_text,
			pending.waiters.len()
		);
		let predictions = self
			.session
			.lock()
			.predict_next_words(&pending.context_text, pending.max_predictions);
		for waiter in pending.waiters {
			// A dropped receiver means the caller gave up
			let _ = waiter.send(predictions.clone());
		}
	}
}

/// Debounced front of a `PredictionSession`.
///
/// # Behavior
/// - A next-word request for the most recently fired context is answered at
///   once (through the session cache).
/// - Any other request cancels the pending timer, arms a new one for
///   `debounce_ms`, and resolves when that timer elapses.
/// - Callers superseded before the timer fires are coalesced: they all resolve
///   with the result computed for the latest context.
/// - Sequence, learning, confidence and cache operations are synchronous and
///   bypass the timer.
///
/// # Notes
/// - Must be used from within a tokio runtime; the timer is a spawned task.
/// - Cloning the service shares the session and the timer.
#[derive(Clone)]
pub struct DebouncedPredictionService {
	shared: Arc<Shared>,
}

impl DebouncedPredictionService {
	/// Creates a service over an empty model.
	///
	/// # Errors
	/// Returns an error if the configuration is invalid.
	pub fn new(config: PredictorConfig) -> Result<Self> {
		Ok(Self::from_session(PredictionSession::new(config)?))
	}

	/// Wraps an existing session. The delay comes from its configuration.
	pub fn from_session(session: PredictionSession) -> Self {
		let delay = Duration::from_millis(session.config().debounce_ms);
		Self {
			shared: Arc::new(Shared {
				session: Mutex::new(session),
				state: Mutex::new(DebounceState {
					phase: DebouncePhase::Idle,
					generation: 0,
					pending: None,
					last_fired: None,
				}),
				delay,
			}),
		}
	}

	/// Returns at most `max_predictions` ranked next words, once the debounce
	/// delay has elapsed without a newer request.
	///
	/// Resolves to an empty list if the request is cancelled.
	pub async fn predict_next_words(&self, context_text: &str, max_predictions: usize) -> Vec<Prediction> {
		let receiver = {
			let mut state = self.shared.state.lock();

			if state.last_fired.as_deref() == Some(context_text) {
				if state.phase == DebouncePhase::Fired {
					state.phase = DebouncePhase::Idle;
				}
				drop(state);
				debug!("Debounce fast path for '{}'", context_text);
				return self.shared.session.lock().predict_next_words(context_text, max_predictions);
			}

			let mut waiters = Vec::new();
			if let Some(previous) = state.pending.take() {
				debug!("Debounce cancelled pending request for '{}'", previous.context_text);
				previous.timer.abort();
				waiters = previous.waiters;
			}

			let (sender, receiver) = oneshot::channel();
			waiters.push(sender);

			state.generation += 1;
			let generation = state.generation;
			let shared = Arc::clone(&self.shared);
			let delay = self.shared.delay;
			let timer = tokio::spawn(async move {
				tokio::time::sleep(delay).await;
				shared.fire(generation);
			});

			debug!("Debounce scheduled for '{}' in {:?}", context_text, delay);
			state.phase = DebouncePhase::Scheduled;
			state.pending = Some(PendingRequest {
				generation,
				context_text: context_text.to_owned(),
				max_predictions,
				waiters,
				timer,
			});
			receiver
		};

		receiver.await.unwrap_or_default()
	}

	/// Cancels the pending timer, if any. Its waiters resolve to an empty list.
	pub fn cancel_pending(&self) {
		let mut state = self.shared.state.lock();
		if let Some(pending) = state.pending.take() {
			debug!("Debounce cancelled for '{}'", pending.context_text);
			pending.timer.abort();
			state.phase = DebouncePhase::Idle;
		}
	}

	/// Synchronous beam-search completion, see `PredictionSession::predict_next_sequence`.
	pub fn predict_next_sequence(&self, context_text: &str, sequence_length: usize) -> Vec<Prediction> {
		self.shared.session.lock().predict_next_sequence(context_text, sequence_length)
	}

	/// Folds finalized input into the model, see `PredictionSession::learn_from_input`.
	pub fn learn_from_input(&self, text: &str) -> usize {
		self.shared.session.lock().learn_from_input(text)
	}

	/// Confidence of the best next word, `0.0` if there is none.
	pub fn prediction_confidence(&self, context_text: &str) -> f64 {
		self.shared.session.lock().prediction_confidence(context_text)
	}

	pub fn clear_cache(&self) {
		self.shared.session.lock().clear_cache();
	}

	pub fn phase(&self) -> DebouncePhase {
		self.shared.state.lock().phase
	}

	/// Context of the last request whose timer fired.
	pub fn last_fired_context(&self) -> Option<String> {
		self.shared.state.lock().last_fired.clone()
	}

	/// Runs `f` with exclusive access to the underlying session.
	pub fn with_session<R>(&self, f: impl FnOnce(&mut PredictionSession) -> R) -> R {
		f(&mut self.shared.session.lock())
	}
}
