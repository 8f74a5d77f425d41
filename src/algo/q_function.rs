use crate::{Error, Result};

/// An action-value function approximator
///
/// Maps a flat state encoding to one value per action, and can be fit towards target vectors.
/// Implementations must be deterministic for fixed parameters.
pub trait QFunction {
    /// Width of the vectors produced by [`forward`](QFunction::forward)
    fn num_actions(&self) -> usize;

    /// Estimate the value of each action in `state`
    fn forward(&self, state: &[f32]) -> Result<Vec<f32>>;

    /// Perform one training step moving the outputs for `states` towards `targets`
    ///
    /// **Returns** the loss of the step
    fn train(&mut self, states: &[&[f32]], targets: &[Vec<f32>]) -> Result<f32>;
}

/// Reject empty batches and batches whose pieces disagree in shape
pub(crate) fn check_batch(states: &[&[f32]], targets: &[Vec<f32>], num_actions: usize) -> Result<()> {
    if states.is_empty() || states.len() != targets.len() {
        return Err(Error::InvalidRequest(format!(
            "training batch needs matching non-empty states and targets, got {} and {}",
            states.len(),
            targets.len()
        )));
    }
    let width = states[0].len();
    if states.iter().any(|s| s.len() != width) {
        return Err(Error::InvalidRequest(String::from(
            "states in a training batch must share one length",
        )));
    }
    if let Some(t) = targets.iter().find(|t| t.len() != num_actions) {
        return Err(Error::InvalidRequest(format!(
            "target vector of width {} where {num_actions} actions are expected",
            t.len()
        )));
    }
    Ok(())
}
