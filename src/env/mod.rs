use rand::Rng;

use crate::Result;

/// The outcome of a single [`Environment::step`]
#[derive(Debug, Clone, PartialEq)]
pub struct Step<S> {
    /// The state reached after the action, reported even when terminal
    pub next_state: S,
    /// The reward received for reaching `next_state`
    pub reward: f32,
    /// Whether `next_state` ends the episode
    pub terminal: bool,
}

/// Represents a Markov decision process, defining the dynamics of an environment
/// in which an agent can operate.
///
/// This base trait represents the common case of a discrete-time MDP with one agent
/// and a finite state space and action space.
pub trait Environment {
    /// A representation of the state of the environment to be passed to an agent
    type State: Clone;

    /// A representation of an action that an agent can take to affect the environment
    type Action: Clone;

    /// Update the environment in response to an action taken by an agent, producing a new state and associated reward
    fn step(&mut self, action: Self::Action) -> Result<Step<Self::State>>;

    /// Replace the environment with a fresh episode
    ///
    /// **Returns** the initial state
    fn reset<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Self::State>;
}

/// An environment with a finite action set
pub trait DiscreteActionSpace: Environment {
    /// Get the available actions for the current state
    ///
    /// The returned vec should never be empty, instead specify an action that represents doing nothing if necessary.
    fn actions(&self) -> Vec<Self::Action>;
}
