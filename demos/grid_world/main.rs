use std::{fs::File, ops::ControlFlow};

use burn::{
    backend::{ndarray::NdArrayDevice, Autodiff, NdArray},
    optim::SgdConfig,
};
use grid_rl::{
    algo::{
        EpisodeSummary, Mlp, MlpConfig, MlpQFunction, Outcome, QAgent, QAgentConfig, QFunction, Stats,
        TrainingMode, TrainingObserver,
    },
    env::Environment,
    exploration::EpsilonGreedy,
    gym::{
        grid_world::{NUM_ACTIONS, STATE_LEN},
        GridWorld,
    },
};
use log::{info, warn, LevelFilter};
use once_cell::sync::Lazy;
use rand::{rngs::StdRng, SeedableRng};

type QBackend = Autodiff<NdArray>;

static DEVICE: Lazy<NdArrayDevice> = Lazy::new(NdArrayDevice::default);

const NUM_EPISODES: u32 = 2900;
const BATCH_SIZE: usize = 40;
const LEARNING_RATE: f64 = 0.01;
const MAX_PLAY_MOVES: u32 = 10;
const LOG_PATH: &str = "grid_world_training.csv";

/// Writes one CSV row per episode and flushes at checkpoints
struct CsvLog {
    writer: csv::Writer<File>,
    error: Option<csv::Error>,
}

impl CsvLog {
    fn create(path: &str) -> csv::Result<Self> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(["episode", "moves", "reward", "outcome", "epsilon", "loss"])?;
        Ok(Self {
            writer,
            error: None,
        })
    }
}

impl TrainingObserver for CsvLog {
    fn on_episode(&mut self, summary: &EpisodeSummary) -> ControlFlow<()> {
        let record = [
            summary.episode.to_string(),
            summary.moves.to_string(),
            summary.reward.to_string(),
            format!("{:?}", summary.outcome),
            summary.epsilon.to_string(),
            summary.loss.map(|l| l.to_string()).unwrap_or_default(),
        ];
        match self.writer.write_record(&record) {
            Ok(()) => ControlFlow::Continue(()),
            Err(e) => {
                self.error = Some(e);
                ControlFlow::Break(())
            }
        }
    }

    fn on_checkpoint(&mut self, stats: &Stats) {
        info!(
            "Checkpoint after {} games. Avg loss: {:.4}",
            stats.games,
            stats.average_loss()
        );
        if let Err(e) = self.writer.flush() {
            warn!("Could not flush {LOG_PATH}: {e}");
        }
    }
}

fn init_logging() {
    env_logger::builder()
        .format_target(false)
        .format_timestamp_secs()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let mut rng = StdRng::from_entropy();

    let mut env = GridWorld::random_player(&mut rng)?;
    println!("{env}");

    let q = MlpQFunction::<QBackend, _>::new(
        &MlpConfig::halfway(STATE_LEN, NUM_ACTIONS),
        SgdConfig::new().init::<QBackend, Mlp<QBackend>>(),
        LEARNING_RATE,
        &*DEVICE,
    );
    let config = QAgentConfig::new(
        TrainingMode::replay(BATCH_SIZE),
        EpsilonGreedy::linear(0.5, 0.05, NUM_EPISODES)?,
    )
    .with_checkpoint_every(500);
    let mut agent = QAgent::<GridWorld, _, _>::new(q, config)?;

    let state = env.reset(&mut rng)?;
    println!("Action values before training: {:?}", agent.q_function().forward(&state)?);

    let mut log = CsvLog::create(LOG_PATH)?;
    let stats = agent.train(&mut env, NUM_EPISODES, &mut rng, &mut log)?;
    if let Some(e) = log.error {
        return Err(e.into());
    }
    println!(
        "Trained {} games, {} moves in {:?}",
        stats.games, stats.moves, stats.training_time
    );

    let state = env.reset(&mut rng)?;
    println!("Action values after training: {:?}", agent.q_function().forward(&state)?);

    for game in 1..=3 {
        let mut env = GridWorld::random_player(&mut rng)?;
        let state = env.reset(&mut rng)?;
        println!("Game {game}\n{env}");
        let playthrough = agent.play(&mut env, state, MAX_PLAY_MOVES)?;
        for action in &playthrough.actions {
            print!("{action} ");
        }
        println!();
        println!("{env}");
        match playthrough.outcome {
            Outcome::Won => println!("Won!"),
            Outcome::Lost => println!("Lost."),
            Outcome::TooManyMoves => println!("Too many moves."),
        }
    }

    Ok(())
}
