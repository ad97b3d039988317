use log::{debug, trace};

use super::estimator::ProbabilityEstimator;
use super::language_model::LanguageModel;
use super::next_word::{candidates, trailing_context};
use super::prediction::{Prediction, PredictionMetadata, confidence_from_probability, entropy_term};
use super::tokenizer::Tokenizer;

/// A partial completion explored by the beam search.
#[derive(Clone, Debug)]
struct Beam {
	sequence: Vec<String>,
	probability: f64,
	log_probability: f64,
	/// Running sum of `-p * ln(p)` over the step probabilities.
	entropy: f64,
}

impl Beam {
	fn root() -> Self {
		Self { sequence: Vec::new(), probability: 1.0, log_probability: 0.0, entropy: 0.0 }
	}

	fn extend(&self, token: &str, step_probability: f64) -> Self {
		let mut sequence = Vec::with_capacity(self.sequence.len() + 1);
		sequence.extend_from_slice(&self.sequence);
		sequence.push(token.to_owned());
		Self {
			sequence,
			probability: self.probability * step_probability,
			log_probability: self.log_probability + step_probability.ln(),
			entropy: self.entropy + entropy_term(step_probability),
		}
	}

	fn into_prediction(self, context: &[String]) -> Prediction {
		Prediction {
			text: self.sequence.join(" "),
			confidence: confidence_from_probability(self.probability),
			probability: self.probability,
			context: context.to_vec(),
			metadata: PredictionMetadata {
				tokens: self.sequence,
				log_probability: self.log_probability,
				entropy: self.entropy,
			},
		}
	}
}

/// Multi-token completion by beam search over the backoff estimator.
///
/// # Behavior
/// - Starts from a single empty beam with probability 1.
/// - At each step every beam is expanded with every candidate of positive
///   probability, given the original context followed by the beam's tokens.
/// - Only the `beam_width` most probable beams survive a step (stable sort,
///   ties keep expansion order).
/// - A beam with no positive candidate is dropped, never replaced. Every
///   returned completion therefore has exactly `sequence_length` tokens; when
///   all beams are dropped the result is empty.
pub struct SequencePredictor<'a> {
	model: &'a LanguageModel,
	estimator: &'a dyn ProbabilityEstimator,
	tokenizer: &'a Tokenizer,
	beam_width: usize,
}

impl<'a> SequencePredictor<'a> {
	pub fn new(
		model: &'a LanguageModel,
		estimator: &'a dyn ProbabilityEstimator,
		tokenizer: &'a Tokenizer,
		beam_width: usize,
	) -> Self {
		Self { model, estimator, tokenizer, beam_width: beam_width.max(1) }
	}

	/// Returns at most `beam_width` completions of `sequence_length` tokens,
	/// most probable first.
	pub fn predict(&self, context_text: &str, sequence_length: usize) -> Vec<Prediction> {
		let tokens = self.tokenizer.tokenize(context_text);
		let context = trailing_context(&tokens);

		let mut beams = vec![Beam::root()];
		for step in 0..sequence_length {
			beams = self.expand(context, &beams);
			if beams.is_empty() {
				debug!("Beam search exhausted at step {} of {}", step + 1, sequence_length);
				break;
			}
			trace!("Beam search step {}: {} beams kept", step + 1, beams.len());
		}

		beams
			.into_iter()
			.filter(|beam| !beam.sequence.is_empty())
			.map(|beam| beam.into_prediction(context))
			.collect()
	}

	/// Expands every beam by one token and keeps the best `beam_width`.
	fn expand(&self, context: &[String], beams: &[Beam]) -> Vec<Beam> {
		let mut expanded = Vec::new();

		for beam in beams {
			let effective: Vec<String> = context.iter().chain(&beam.sequence).cloned().collect();
			let step_context = trailing_context(&effective);
			let last = step_context.last().map(String::as_str);

			for token in candidates(self.model, last) {
				let probability = self.estimator.probability(self.model, token, step_context);
				if probability > 0.0 {
					expanded.push(beam.extend(token, probability));
				}
			}
		}

		expanded.sort_by(|a, b| b.probability.total_cmp(&a.probability));
		expanded.truncate(self.beam_width);
		expanded
	}
}
