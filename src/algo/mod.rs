/// Feed-forward network approximator built on burn
pub mod mlp;
mod q;
mod q_function;
mod q_table;

pub use mlp::{Mlp, MlpConfig, MlpQFunction};
pub use q::{
    EpisodeSummary, Outcome, Playthrough, QAgent, QAgentConfig, Stats, TrainingMode,
    TrainingObserver,
};
pub use q_function::QFunction;
pub use q_table::QTable;
