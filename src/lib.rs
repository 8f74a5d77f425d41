/// Q-learning agent and action-value approximators
pub mod algo;

/// Implementations of strategies for time-decaying hyperparameters
pub mod decay;

/// Data structures
pub mod ds;

/// Environment
pub mod env;

/// Exploration policies
pub mod exploration;

/// Testing environments
pub mod gym;

/// Experience replay
pub mod memory;

/// Conversions into burn tensors
pub mod traits;

mod error;
mod util;

pub use error::{Error, Result};
pub use util::{argmax, max_value};
