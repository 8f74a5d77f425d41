/// Errors reported by the environment, replay memory, exploration policy and agent
///
/// None of these are recovered from internally; they are returned to whoever drives the training loop.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A request that can never be satisfied with the current contents, e.g. sampling more experiences than stored
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// Internal state that should be impossible, e.g. two players on the grid or an out of range action index
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
    /// Failure surfaced from a [`QFunction`](crate::algo::QFunction), such as a diverged loss
    #[error("approximator failure: {0}")]
    Approximator(String),
    /// A hyperparameter outside of its legal range
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Convenience alias for results using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

impl From<std::convert::Infallible> for Error {
    fn from(value: std::convert::Infallible) -> Self {
        match value {}
    }
}
