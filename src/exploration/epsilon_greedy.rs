use rand::Rng;

use crate::{
    check_interval,
    decay::{Constant, Decay, Linear},
    util::argmax,
    Error, Result,
};

use super::Choice;

/// Epsilon greedy exploration policy with time-decaying epsilon threshold
///
/// Epsilon is evaluated per episode, never mid-episode.
#[derive(Debug, Clone)]
pub struct EpsilonGreedy<D: Decay> {
    epsilon: D,
}

impl<D: Decay> EpsilonGreedy<D> {
    /// Initialize epsilon greedy policy with a decay strategy
    pub fn new(decay: D) -> Self {
        Self { epsilon: decay }
    }

    /// The exploration rate for `episode`
    pub fn epsilon(&self, episode: u32) -> f32 {
        self.epsilon.evaluate(episode as f32)
    }
}

impl EpsilonGreedy<Linear> {
    /// Ramp epsilon from `start` down to `floor` by `1 / episodes` after each episode
    ///
    /// A `start` at or below `floor` is kept for every episode.
    pub fn linear(start: f32, floor: f32, episodes: u32) -> Result<Self> {
        check_interval!(start, 0.0, 1.0);
        check_interval!(floor, 0.0, 1.0);
        Ok(Self::new(Linear::over_episodes(episodes, start, floor)?))
    }
}

impl EpsilonGreedy<Constant> {
    /// A fixed exploration rate
    pub fn constant(epsilon: f32) -> Result<Self> {
        check_interval!(epsilon, 0.0, 1.0);
        Ok(Self::new(Constant::new(epsilon)))
    }
}

fn choose<R: Rng + ?Sized>(epsilon: f32, rng: &mut R) -> Choice {
    if rng.gen::<f32>() < epsilon {
        Choice::Explore
    } else {
        Choice::Exploit
    }
}

/// Pick an action index from `action_values`
///
/// With probability `epsilon` a uniformly random index, otherwise the index of the
/// largest value with ties going to the lowest index.
///
/// ### Errors
/// [`Error::InvariantViolation`] if `action_values` is empty
pub fn select_action<R: Rng + ?Sized>(
    action_values: &[f32],
    epsilon: f32,
    rng: &mut R,
) -> Result<usize> {
    if action_values.is_empty() {
        return Err(Error::InvariantViolation(String::from(
            "cannot select an action from an empty action-value vector",
        )));
    }
    Ok(match choose(epsilon, rng) {
        Choice::Explore => rng.gen_range(0..action_values.len()),
        Choice::Exploit => argmax(action_values).unwrap_or(0),
    })
}
