use std::collections::HashMap;

use crate::{check_interval, Error, Result};

use super::{q_function::check_batch, QFunction};

/// A tabular [`QFunction`] keyed by the exact state encoding
///
/// Unseen states evaluate to all zeros. Each training step blends a state's row towards its
/// target with learning rate `alpha`.
#[derive(Debug, Clone)]
pub struct QTable {
    q_table: HashMap<Vec<u32>, Vec<f32>>,
    num_actions: usize,
    alpha: f32, // learning rate
}

fn key(state: &[f32]) -> Vec<u32> {
    state.iter().map(|v| v.to_bits()).collect()
}

impl QTable {
    /// ### Parameters
    /// - `num_actions` - Width of every row, must be positive
    /// - `alpha` - The learning rate - must be between 0 and 1
    pub fn new(num_actions: usize, alpha: f32) -> Result<Self> {
        check_interval!(alpha, 0.0, 1.0);
        if num_actions == 0 {
            return Err(Error::Config(String::from("`num_actions` must be positive")));
        }
        Ok(Self {
            q_table: HashMap::new(),
            num_actions,
            alpha,
        })
    }

    /// Number of distinct states seen during training
    pub fn len(&self) -> usize {
        self.q_table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.q_table.is_empty()
    }
}

impl QFunction for QTable {
    fn num_actions(&self) -> usize {
        self.num_actions
    }

    fn forward(&self, state: &[f32]) -> Result<Vec<f32>> {
        Ok(self
            .q_table
            .get(&key(state))
            .cloned()
            .unwrap_or_else(|| vec![0.0; self.num_actions]))
    }

    /// **Returns** the mean squared error before the update
    fn train(&mut self, states: &[&[f32]], targets: &[Vec<f32>]) -> Result<f32> {
        check_batch(states, targets, self.num_actions)?;

        let mut squared_error = 0.0;
        for (state, target) in states.iter().zip(targets) {
            let row = self
                .q_table
                .entry(key(state))
                .or_insert_with(|| vec![0.0; self.num_actions]);
            for (q, &t) in row.iter_mut().zip(target) {
                let err = t - *q;
                squared_error += err * err;
                *q += self.alpha * err;
            }
        }

        Ok(squared_error / (states.len() * self.num_actions) as f32)
    }
}
