use std::{
    ops::ControlFlow,
    time::{Duration, Instant, SystemTime},
};

use log::{debug, info, warn};
use rand::Rng;

use crate::{
    check_interval,
    decay::{Decay, Linear},
    env::{DiscreteActionSpace, Step},
    exploration::{select_action, EpsilonGreedy},
    memory::{Exp, ReplayMemory},
    util::{argmax, max_value},
    Error, Result,
};

use super::QFunction;

/// How the agent turns experience into training steps
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrainingMode {
    /// Train on every transition as it happens
    Online { gamma: f32 },
    /// Store transitions in a [`ReplayMemory`] and, once it has filled up, train on a sampled batch after every step
    Replay {
        batch_size: usize,
        capacity: usize,
        gamma: f32,
    },
}

impl TrainingMode {
    /// Online training with discount factor 0.9
    pub fn online() -> Self {
        Self::Online { gamma: 0.9 }
    }

    /// Experience replay with a memory twice the batch size and discount factor 0.975
    pub fn replay(batch_size: usize) -> Self {
        Self::Replay {
            batch_size,
            capacity: 2 * batch_size,
            gamma: 0.975,
        }
    }
}

/// Configuration for the [`QAgent`]
#[derive(Debug, Clone)]
pub struct QAgentConfig<D: Decay> {
    pub mode: TrainingMode,
    pub exploration: EpsilonGreedy<D>,
    /// Call [`TrainingObserver::on_checkpoint`] every this many episodes
    pub checkpoint_every: Option<u32>,
}

impl<D: Decay> QAgentConfig<D> {
    pub fn new(mode: TrainingMode, exploration: EpsilonGreedy<D>) -> Self {
        Self {
            mode,
            exploration,
            checkpoint_every: None,
        }
    }

    pub fn with_checkpoint_every(mut self, episodes: u32) -> Self {
        self.checkpoint_every = Some(episodes);
        self
    }
}

/// Cumulative training counters, kept across training runs
#[derive(Debug, Clone, PartialEq)]
pub struct Stats {
    pub created: SystemTime,
    pub training_time: Duration,
    pub games: u64,
    pub moves: u64,
    pub total_loss: f64,
    pub last_loss: f32,
}

impl Stats {
    fn new() -> Self {
        Self {
            created: SystemTime::now(),
            training_time: Duration::ZERO,
            games: 0,
            moves: 0,
            total_loss: 0.0,
            last_loss: 0.0,
        }
    }

    /// Total loss per move, or 0 before any move
    pub fn average_loss(&self) -> f64 {
        if self.moves == 0 {
            0.0
        } else {
            self.total_loss / self.moves as f64
        }
    }
}

/// How an episode ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Terminal with a positive reward
    Won,
    /// Terminal with a non-positive reward
    Lost,
    /// Stopped by a move cap before reaching a terminal state
    TooManyMoves,
}

impl Outcome {
    fn from_terminal_reward(reward: f32) -> Self {
        if reward > 0.0 {
            Outcome::Won
        } else {
            Outcome::Lost
        }
    }
}

/// What happened during one training episode
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeSummary {
    /// Index of the episode within the current run
    pub episode: u32,
    pub moves: u32,
    /// Sum of rewards over the episode
    pub reward: f32,
    pub outcome: Outcome,
    /// Exploration rate used throughout the episode
    pub epsilon: f32,
    /// Mean loss of the training steps taken, if any
    pub loss: Option<f32>,
}

/// A greedy run through an environment
#[derive(Debug, Clone, PartialEq)]
pub struct Playthrough<A> {
    pub actions: Vec<A>,
    pub outcome: Outcome,
}

/// Hooks invoked by [`QAgent::train`] at episode boundaries
pub trait TrainingObserver {
    /// Called after every episode; [`ControlFlow::Break`] ends the run
    fn on_episode(&mut self, _summary: &EpisodeSummary) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }

    /// Called every `checkpoint_every` episodes and at the end of a run, at most once per episode
    fn on_checkpoint(&mut self, _stats: &Stats) {}
}

impl TrainingObserver for () {}

enum Learning<E: DiscreteActionSpace> {
    Online {
        gamma: f32,
    },
    Replay {
        memory: ReplayMemory<E>,
        batch_size: usize,
        gamma: f32,
    },
}

/// A Q-learning agent with an exchangeable action-value approximator
///
/// ### Generics
/// - `E`: The [`Environment`](crate::env::Environment) in which the agent will learn
///     - The action space must be discrete; actions convert to and from their index in the approximator's output.
///     - States must expose their numeric encoding through `AsRef<[f32]>`.
/// - `F`: The [`QFunction`] approximating action values
/// - `D`: The [`Decay`] schedule of the exploration rate
pub struct QAgent<E, F, D = Linear>
where
    E: DiscreteActionSpace,
    F: QFunction,
    D: Decay,
{
    q: F,
    learning: Learning<E>,
    exploration: EpsilonGreedy<D>,
    checkpoint_every: Option<u32>,
    stats: Stats,
    episode: u32, // episode within the current run
    batches: u64,
}

impl<E, F, D> QAgent<E, F, D>
where
    E: DiscreteActionSpace,
    E::State: AsRef<[f32]>,
    E::Action: Copy + Into<usize> + TryFrom<usize>,
    Error: From<<E::Action as TryFrom<usize>>::Error>,
    F: QFunction,
    D: Decay,
{
    /// Initialize a new `QAgent`
    ///
    /// ### Errors
    /// [`Error::Config`] if a discount factor is outside `[0, 1]`, the batch size is 0 or larger
    /// than the replay capacity, or checkpoints are requested every 0 episodes
    pub fn new(q: F, config: QAgentConfig<D>) -> Result<Self> {
        let learning = match config.mode {
            TrainingMode::Online { gamma } => {
                check_interval!(gamma, 0.0, 1.0);
                Learning::Online { gamma }
            }
            TrainingMode::Replay {
                batch_size,
                capacity,
                gamma,
            } => {
                check_interval!(gamma, 0.0, 1.0);
                if batch_size == 0 || batch_size > capacity {
                    return Err(Error::Config(format!(
                        "batch size {batch_size} must be in [1, {capacity}]"
                    )));
                }
                Learning::Replay {
                    memory: ReplayMemory::new(capacity),
                    batch_size,
                    gamma,
                }
            }
        };
        if config.checkpoint_every == Some(0) {
            return Err(Error::Config(String::from("`checkpoint_every` must be positive")));
        }

        Ok(Self {
            q,
            learning,
            exploration: config.exploration,
            checkpoint_every: config.checkpoint_every,
            stats: Stats::new(),
            episode: 0,
            batches: 0,
        })
    }

    pub fn q_function(&self) -> &F {
        &self.q
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Exploration rate for the next episode
    pub fn epsilon(&self) -> f32 {
        self.exploration.epsilon(self.episode)
    }

    /// The replay memory, if training with experience replay
    pub fn memory(&self) -> Option<&ReplayMemory<E>> {
        match &self.learning {
            Learning::Replay { memory, .. } => Some(memory),
            Learning::Online { .. } => None,
        }
    }

    /// Deploy the `QAgent` into the environment for one training episode
    pub fn go<R: Rng + ?Sized>(&mut self, env: &mut E, rng: &mut R) -> Result<EpisodeSummary> {
        let episode = self.episode;
        let epsilon = self.exploration.epsilon(episode);
        let num_actions = env.actions().len();

        let mut state = env.reset(rng)?;
        let mut moves = 0;
        let mut total_reward = 0.0;
        let mut losses = Vec::new();

        let outcome = loop {
            let q_values = action_values(&self.q, state.as_ref(), num_actions)?;
            let action = E::Action::try_from(select_action(&q_values, epsilon, rng)?)?;
            let Step {
                next_state,
                reward,
                terminal,
            } = env.step(action)?;
            moves += 1;
            self.stats.moves += 1;
            total_reward += reward;

            let exp = Exp {
                state,
                action,
                reward,
                next_state: next_state.clone(),
                terminal,
            };
            if let Some(loss) = self.learn(exp, num_actions, rng)? {
                self.record_loss(loss)?;
                losses.push(loss);
            }

            if terminal {
                break Outcome::from_terminal_reward(reward);
            }
            state = next_state;
        };

        self.stats.games += 1;
        self.episode += 1;

        let loss = (!losses.is_empty()).then(|| losses.iter().sum::<f32>() / losses.len() as f32);
        info!(
            "Game: {}. Moves: {moves}. Epsilon: {epsilon:.3}. {}",
            self.stats.games,
            if outcome == Outcome::Won { "WON!" } else { "" }
        );

        Ok(EpisodeSummary {
            episode,
            moves,
            reward: total_reward,
            outcome,
            epsilon,
            loss,
        })
    }

    /// Train for `episodes` episodes with the exploration schedule restarted at episode 0
    ///
    /// Stops early with the error of the first failing step, or when `observer` breaks.
    pub fn train<R, O>(
        &mut self,
        env: &mut E,
        episodes: u32,
        rng: &mut R,
        observer: &mut O,
    ) -> Result<Stats>
    where
        R: Rng + ?Sized,
        O: TrainingObserver + ?Sized,
    {
        self.episode = 0;
        let start = Instant::now();
        let run = self.run(env, episodes, rng, observer);
        let duration = start.elapsed();
        self.stats.training_time += duration;
        let checkpointed = run?;

        info!(
            "Avg loss: {}. Last: {}. Training duration: {duration:?}. Total: {:?}",
            self.stats.average_loss(),
            self.stats.last_loss,
            self.stats.training_time
        );
        if !checkpointed {
            observer.on_checkpoint(&self.stats);
        }

        Ok(self.stats.clone())
    }

    /// **Returns** whether the last completed episode already triggered a checkpoint
    fn run<R, O>(&mut self, env: &mut E, episodes: u32, rng: &mut R, observer: &mut O) -> Result<bool>
    where
        R: Rng + ?Sized,
        O: TrainingObserver + ?Sized,
    {
        let mut checkpointed = false;
        for _ in 0..episodes {
            let summary = self.go(env, rng)?;

            checkpointed = self
                .checkpoint_every
                .is_some_and(|every| self.episode % every == 0);
            if checkpointed {
                observer.on_checkpoint(&self.stats);
            }
            if observer.on_episode(&summary).is_break() {
                info!("Training stopped after {} episodes", self.episode);
                break;
            }
        }
        Ok(checkpointed)
    }

    /// Follow the greedy policy from `state` without learning, for at most `max_moves` moves
    pub fn play(&self, env: &mut E, state: E::State, max_moves: u32) -> Result<Playthrough<E::Action>> {
        let num_actions = env.actions().len();
        let mut state = state;
        let mut actions = Vec::new();

        while actions.len() < max_moves as usize {
            let q_values = action_values(&self.q, state.as_ref(), num_actions)?;
            let action = E::Action::try_from(argmax(&q_values).unwrap_or(0))?;
            let step = env.step(action)?;
            actions.push(action);
            if step.terminal {
                return Ok(Playthrough {
                    actions,
                    outcome: Outcome::from_terminal_reward(step.reward),
                });
            }
            state = step.next_state;
        }

        Ok(Playthrough {
            actions,
            outcome: Outcome::TooManyMoves,
        })
    }

    /// Perform the learning step for one new transition
    ///
    /// **Returns** the loss if a training step was taken
    fn learn<R: Rng + ?Sized>(
        &mut self,
        exp: Exp<E>,
        num_actions: usize,
        rng: &mut R,
    ) -> Result<Option<f32>> {
        match &mut self.learning {
            Learning::Online { gamma } => {
                let targets = targets(&self.q, &[&exp], *gamma, num_actions)?;
                self.q.train(&[exp.state.as_ref()], &targets).map(Some)
            }
            Learning::Replay {
                memory,
                batch_size,
                gamma,
            } => {
                // Training starts with the first push after the memory has filled up
                let was_full = memory.is_full();
                memory.push(exp);
                if !was_full {
                    return Ok(None);
                }

                let batch = memory.sample(*batch_size, rng)?;
                let targets = targets(&self.q, &batch, *gamma, num_actions)?;
                let states = batch.iter().map(|e| e.state.as_ref()).collect::<Vec<_>>();
                let loss = self.q.train(&states, &targets)?;

                self.batches += 1;
                debug!("Batch {}: loss {loss}", self.batches);
                Ok(Some(loss))
            }
        }
    }

    fn record_loss(&mut self, loss: f32) -> Result<()> {
        if !loss.is_finite() {
            warn!("Training step reported non-finite loss {loss}");
            return Err(Error::Approximator(format!("non-finite loss {loss}")));
        }
        self.stats.total_loss += loss as f64;
        self.stats.last_loss = loss;
        Ok(())
    }
}

/// Query `q` and check that it produced one value per action
fn action_values<F: QFunction>(q: &F, state: &[f32], num_actions: usize) -> Result<Vec<f32>> {
    let values = q.forward(state)?;
    if values.len() != num_actions {
        return Err(Error::InvariantViolation(format!(
            "approximator produced {} action values for {num_actions} actions",
            values.len()
        )));
    }
    Ok(values)
}

/// Build one target vector per experience
///
/// Each is the approximator's output for the experience's own state with the entry of its own
/// action replaced by the bootstrapped return: the reward alone if terminal, otherwise
/// `reward + gamma * max Q(next_state)`.
fn targets<E, F>(q: &F, batch: &[&Exp<E>], gamma: f32, num_actions: usize) -> Result<Vec<Vec<f32>>>
where
    E: DiscreteActionSpace,
    E::State: AsRef<[f32]>,
    E::Action: Copy + Into<usize>,
    F: QFunction,
{
    batch
        .iter()
        .map(|exp| {
            let mut y = action_values(q, exp.state.as_ref(), num_actions)?;
            let target = if exp.terminal {
                exp.reward
            } else {
                let next = action_values(q, exp.next_state.as_ref(), num_actions)?;
                exp.reward + gamma * max_value(&next)
            };

            let ix: usize = exp.action.into();
            let slot = y.get_mut(ix).ok_or_else(|| {
                Error::InvariantViolation(format!("action index {ix} outside [0, {num_actions})"))
            })?;
            *slot = target;
            Ok(y)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::{
        algo::QTable,
        decay::Constant,
        env::{tests::MockEnv, Environment},
        gym::{grid_world::NUM_ACTIONS, GridWorld, Layout},
    };

    type Calls = Rc<RefCell<Vec<(Vec<Vec<f32>>, Vec<Vec<f32>>)>>>;

    /// Returns fixed action values and records every training call
    struct Scripted {
        values: Vec<f32>,
        calls: Calls,
        loss: Result<f32>,
    }

    impl Scripted {
        fn new(values: Vec<f32>) -> (Self, Calls) {
            let calls = Calls::default();
            let q = Self {
                values,
                calls: Rc::clone(&calls),
                loss: Ok(0.5),
            };
            (q, calls)
        }
    }

    impl QFunction for Scripted {
        fn num_actions(&self) -> usize {
            self.values.len()
        }

        fn forward(&self, _state: &[f32]) -> Result<Vec<f32>> {
            Ok(self.values.clone())
        }

        fn train(&mut self, states: &[&[f32]], targets: &[Vec<f32>]) -> Result<f32> {
            self.calls.borrow_mut().push((
                states.iter().map(|s| s.to_vec()).collect(),
                targets.to_vec(),
            ));
            self.loss.clone()
        }
    }

    fn greedy(mode: TrainingMode) -> QAgentConfig<Constant> {
        QAgentConfig::new(mode, EpsilonGreedy::constant(0.0).unwrap())
    }

    #[test]
    fn online_targets() {
        let mut rng = StdRng::seed_from_u64(0);
        let (q, calls) = Scripted::new(vec![1.0, 2.0]);
        let mut agent = QAgent::<MockEnv, _, _>::new(q, greedy(TrainingMode::online())).unwrap();
        let mut env = MockEnv::new(3);

        let summary = agent.go(&mut env, &mut rng).unwrap();
        assert_eq!(summary.moves, 2, "greedy agent walks right to the end");
        assert_eq!(summary.outcome, Outcome::Won);
        assert_eq!(summary.reward, 4.0);

        let calls = calls.borrow();
        assert_eq!(calls.len(), 2, "one training step per move");
        assert_eq!(calls[0].0, vec![vec![0.0, 1.0]], "trained on the pre-move state");
        assert_eq!(calls[0].1, vec![vec![1.0, -1.0 + 0.9 * 2.0]], "bootstrapped target");
        assert_eq!(calls[1].0, vec![vec![1.0, 1.0]]);
        assert_eq!(calls[1].1, vec![vec![1.0, 5.0]], "terminal target is the reward");

        let stats = agent.stats();
        assert_eq!(stats.games, 1);
        assert_eq!(stats.moves, 2);
        assert_eq!(stats.total_loss, 1.0);
        assert_eq!(stats.last_loss, 0.5);
        assert_eq!(stats.average_loss(), 0.5);
    }

    #[test]
    fn replay_trains_only_after_memory_fills() {
        let mut rng = StdRng::seed_from_u64(1);
        let (q, calls) = Scripted::new(vec![0.0, 1.0]);
        let mut agent = QAgent::<MockEnv, _, _>::new(q, greedy(TrainingMode::replay(2))).unwrap();
        let mut env = MockEnv::new(10);

        let summary = agent.go(&mut env, &mut rng).unwrap();
        assert_eq!(summary.moves, 9);
        let memory = agent.memory().unwrap();
        assert_eq!(memory.capacity(), 4);
        assert!(memory.is_full());

        let calls = calls.borrow();
        assert_eq!(calls.len(), 9 - 4, "no training until the memory is full");
        for (states, targets) in calls.iter() {
            assert_eq!(states.len(), 2, "batch size");
            for (state, y) in states.iter().zip(targets) {
                let expected = if state[0] == 8.0 { 5.0 } else { -1.0 + 0.975 * 1.0 };
                assert_eq!(y, &vec![0.0, expected]);
            }
        }
        assert_eq!(agent.stats().moves, 9);
        assert_eq!(agent.stats().total_loss, 2.5);
    }

    #[test]
    fn targets_use_each_experience_action() {
        let (q, _) = Scripted::new(vec![3.0, 7.0]);
        let a = Exp::<MockEnv> {
            state: [0.0, 1.0],
            action: 0,
            reward: 5.0,
            next_state: [1.0, 1.0],
            terminal: true,
        };
        let b = Exp::<MockEnv> {
            state: [1.0, 1.0],
            action: 1,
            reward: -1.0,
            next_state: [2.0, 1.0],
            terminal: false,
        };
        let y = targets(&q, &[&a, &b], 0.5, 2).unwrap();
        assert_eq!(y, vec![vec![5.0, 7.0], vec![3.0, -1.0 + 0.5 * 7.0]]);

        let bad = Exp::<MockEnv> { action: 2, ..a };
        assert!(matches!(
            targets(&q, &[&bad], 0.5, 2),
            Err(Error::InvariantViolation(_))
        ));
    }

    #[test]
    fn wrong_output_width_is_invariant_violation() {
        let mut rng = StdRng::seed_from_u64(2);
        let (q, _) = Scripted::new(vec![0.0, 1.0, 2.0]);
        let mut agent = QAgent::<MockEnv, _, _>::new(q, greedy(TrainingMode::online())).unwrap();
        let result = agent.go(&mut MockEnv::new(3), &mut rng);
        assert!(matches!(result, Err(Error::InvariantViolation(_))));
    }

    #[test]
    fn approximator_failure_is_surfaced() {
        let mut rng = StdRng::seed_from_u64(3);
        let (mut q, _) = Scripted::new(vec![0.0, 1.0]);
        q.loss = Err(Error::Approximator(String::from("diverged")));
        let mut agent = QAgent::<MockEnv, _, _>::new(q, greedy(TrainingMode::online())).unwrap();
        let result = agent.train(&mut MockEnv::new(3), 5, &mut rng, &mut ());
        assert_eq!(result, Err(Error::Approximator(String::from("diverged"))));
        assert_eq!(agent.stats().games, 0, "episode did not complete");
    }

    #[test]
    fn non_finite_loss_stops_training() {
        let mut rng = StdRng::seed_from_u64(3);
        let (mut q, calls) = Scripted::new(vec![0.0, 1.0]);
        q.loss = Ok(f32::NAN);
        let mut agent = QAgent::<MockEnv, _, _>::new(q, greedy(TrainingMode::online())).unwrap();
        let result = agent.train(&mut MockEnv::new(3), 5, &mut rng, &mut ());
        assert!(matches!(result, Err(Error::Approximator(_))));
        assert_eq!(calls.borrow().len(), 1, "no training after the bad step");

        let stats = agent.stats();
        assert_eq!(stats.total_loss, 0.0, "bad loss not accumulated");
        assert!(stats.average_loss().is_finite());
    }

    #[test]
    fn config_validation() {
        let bad_gamma = TrainingMode::Online { gamma: 1.5 };
        let oversized = TrainingMode::Replay {
            batch_size: 8,
            capacity: 4,
            gamma: 0.9,
        };
        for mode in [bad_gamma, oversized, TrainingMode::replay(0)] {
            let (q, _) = Scripted::new(vec![0.0, 1.0]);
            let result = QAgent::<MockEnv, _, _>::new(q, greedy(mode));
            assert!(matches!(result, Err(Error::Config(_))), "{mode:?} rejected");
        }

        let (q, _) = Scripted::new(vec![0.0, 1.0]);
        let config = greedy(TrainingMode::online()).with_checkpoint_every(0);
        assert!(QAgent::<MockEnv, _, _>::new(q, config).is_err());
    }

    #[derive(Default)]
    struct Recorder {
        summaries: Vec<EpisodeSummary>,
        checkpoints: Vec<u64>,
        stop_after: Option<usize>,
    }

    impl TrainingObserver for Recorder {
        fn on_episode(&mut self, summary: &EpisodeSummary) -> ControlFlow<()> {
            self.summaries.push(summary.clone());
            match self.stop_after {
                Some(n) if self.summaries.len() >= n => ControlFlow::Break(()),
                _ => ControlFlow::Continue(()),
            }
        }

        fn on_checkpoint(&mut self, stats: &Stats) {
            self.checkpoints.push(stats.games);
        }
    }

    #[test]
    fn epsilon_decays_between_episodes() {
        let mut rng = StdRng::seed_from_u64(4);
        let q = QTable::new(NUM_ACTIONS, 0.5).unwrap();
        let config = QAgentConfig::new(
            TrainingMode::online(),
            EpsilonGreedy::linear(0.5, 0.05, 20).unwrap(),
        );
        let mut agent = QAgent::<GridWorld, _, _>::new(q, config).unwrap();
        let mut env = GridWorld::standard();
        let mut recorder = Recorder::default();

        agent.train(&mut env, 30, &mut rng, &mut recorder).unwrap();

        let epsilons: Vec<f32> = recorder.summaries.iter().map(|s| s.epsilon).collect();
        assert_eq!(epsilons.len(), 30);
        assert_eq!(epsilons[0], 0.5);
        assert!(epsilons.windows(2).all(|w| w[1] <= w[0]), "non-increasing");
        assert!(epsilons.iter().all(|&e| e >= 0.05), "floor respected");
        assert_eq!(epsilons[29], 0.05);
        assert!(recorder
            .summaries
            .iter()
            .all(|s| s.outcome != Outcome::TooManyMoves));
    }

    #[test]
    fn checkpoints_and_early_stop() {
        let mut rng = StdRng::seed_from_u64(5);
        let q = QTable::new(NUM_ACTIONS, 0.5).unwrap();
        let config = QAgentConfig::new(
            TrainingMode::replay(4),
            EpsilonGreedy::linear(1.0, 0.1, 20).unwrap(),
        )
        .with_checkpoint_every(5);
        let mut agent = QAgent::<GridWorld, _, _>::new(q, config).unwrap();
        let mut env = GridWorld::random_player(&mut rng).unwrap();

        let mut recorder = Recorder::default();
        let stats = agent.train(&mut env, 12, &mut rng, &mut recorder).unwrap();
        assert_eq!(stats.games, 12);
        assert_eq!(recorder.checkpoints, vec![5, 10, 12], "periodic and final");
        assert_eq!(env.layout(), Layout::RandomPlayer, "reset keeps the layout");

        let mut recorder = Recorder {
            stop_after: Some(3),
            ..Default::default()
        };
        let stats = agent.train(&mut env, 12, &mut rng, &mut recorder).unwrap();
        assert_eq!(recorder.summaries.len(), 3, "stopped at an episode boundary");
        assert_eq!(stats.games, 15, "games accumulate across runs");
    }

    #[test]
    fn final_checkpoint_not_repeated() {
        let mut rng = StdRng::seed_from_u64(8);
        let config = greedy(TrainingMode::online()).with_checkpoint_every(5);
        let (q, _) = Scripted::new(vec![0.0, 1.0]);
        let mut agent = QAgent::<MockEnv, _, _>::new(q, config).unwrap();
        let mut env = MockEnv::new(3);

        let mut recorder = Recorder::default();
        agent.train(&mut env, 10, &mut rng, &mut recorder).unwrap();
        assert_eq!(recorder.checkpoints, vec![5, 10], "one call for the last episode");

        let mut recorder = Recorder {
            stop_after: Some(5),
            ..Default::default()
        };
        agent.train(&mut env, 10, &mut rng, &mut recorder).unwrap();
        assert_eq!(recorder.checkpoints, vec![15], "break on a checkpoint episode");

        let mut recorder = Recorder::default();
        agent.train(&mut env, 0, &mut rng, &mut recorder).unwrap();
        assert_eq!(recorder.checkpoints, vec![15], "empty run still reports");
    }

    #[test]
    fn online_q_table_learns_standard_grid() {
        let mut rng = StdRng::seed_from_u64(6);
        let q = QTable::new(NUM_ACTIONS, 0.5).unwrap();
        let config = QAgentConfig::new(
            TrainingMode::online(),
            EpsilonGreedy::linear(1.0, 0.05, 1000).unwrap(),
        );
        let mut agent = QAgent::<GridWorld, _, _>::new(q, config).unwrap();
        let mut env = GridWorld::standard();

        agent.train(&mut env, 1000, &mut rng, &mut ()).unwrap();

        let state = env.reset(&mut rng).unwrap();
        let playthrough = agent.play(&mut env, state, 10).unwrap();
        assert_eq!(playthrough.outcome, Outcome::Won, "{playthrough:?}");
    }

    #[test]
    fn play_caps_moves() {
        let (q, _) = Scripted::new(vec![1.0, 0.0]);
        let agent = QAgent::<MockEnv, _, _>::new(q, greedy(TrainingMode::online())).unwrap();
        let mut env = MockEnv::new(3);
        let state = env.state();
        let playthrough = agent.play(&mut env, state, 4).unwrap();
        assert_eq!(playthrough.actions, vec![0; 4], "keeps pushing against the wall");
        assert_eq!(playthrough.outcome, Outcome::TooManyMoves);
    }
}
