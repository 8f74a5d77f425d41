use rand::Rng;

use crate::{ds::RingBuffer, env::Environment, Error, Result};

use super::Exp;

/// A fixed-size memory storage for reinforcement learning experiences
///
/// This structure uses a ring buffer to store experiences, which are tuples of (state, action, reward, next state, terminal).
/// Once it reaches its capacity each push overwrites the slot under the write cursor, which wraps
/// back to slot 0 after the first fill.
///
/// ### Type Parameters:
/// - `E`: Environment
pub struct ReplayMemory<E: Environment> {
    memory: RingBuffer<Exp<E>>,
}

impl<E: Environment> ReplayMemory<E> {
    /// **Panics** if `capacity` is 0
    pub fn new(capacity: usize) -> Self {
        Self {
            memory: RingBuffer::new(capacity),
        }
    }

    /// Number of stored experiences
    pub fn len(&self) -> usize {
        self.memory.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.memory.capacity()
    }

    pub fn is_full(&self) -> bool {
        self.memory.is_full()
    }

    /// Add a new experience to the memory
    ///
    /// **Returns** the slot it was written to
    pub fn push(&mut self, exp: Exp<E>) -> usize {
        self.memory.push(exp)
    }

    /// Get a slice view of the stored experiences in slot order
    pub fn view(&self) -> &[Exp<E>] {
        self.memory.view()
    }

    /// Draw `n` experiences uniformly at random, with replacement
    ///
    /// ### Errors
    /// [`Error::InvalidRequest`] if `n` exceeds the number of stored experiences
    pub fn sample<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Result<Vec<&Exp<E>>> {
        let len = self.len();
        if n > len {
            return Err(Error::InvalidRequest(format!(
                "cannot sample {n} experiences from a memory holding {len}"
            )));
        }
        Ok((0..n).map(|_| &self.memory[rng.gen_range(0..len)]).collect())
    }
}
