use crate::{Error, Result};

/// An implementation of a time-decaying value
pub trait Decay {
    /// Calculate value at time `t`
    fn evaluate(&self, t: f32) -> f32;
}

fn validate(rate: f32, vi: f32, vf: f32) -> Result<()> {
    ((rate >= 0.0 && vi > vf) || (rate < 0.0 && vi < vf))
        .then_some(())
        .ok_or_else(|| Error::Config(String::from("`vi - vf` must have same sign as `rate`")))
}

/// A constant value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constant {
    value: f32,
}

impl Constant {
    pub fn new(value: f32) -> Self {
        Self { value }
    }
}

impl Decay for Constant {
    fn evaluate(&self, _t: f32) -> f32 {
        self.value
    }
}

/// v(t) = max(v<sub>i</sub> - rt, v<sub>f</sub>)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Linear {
    rate: f32,
    vi: f32,
    vf: f32,
}

impl Linear {
    pub fn new(rate: f32, vi: f32, vf: f32) -> Result<Self> {
        validate(rate, vi, vf)?;
        Ok(Self { rate, vi, vf })
    }

    /// Ramp from `vi` down to the floor `vf` by `1 / episodes` per episode
    ///
    /// A start at or below the floor never decays and stays at `vi`.
    pub fn over_episodes(episodes: u32, vi: f32, vf: f32) -> Result<Self> {
        if episodes == 0 {
            return Err(Error::Config(String::from("`episodes` must be positive")));
        }
        if vi <= vf {
            return Ok(Self {
                rate: 0.0,
                vi,
                vf: vi,
            });
        }
        Self::new(1.0 / episodes as f32, vi, vf)
    }
}

impl Decay for Linear {
    fn evaluate(&self, t: f32) -> f32 {
        let &Self { rate, vi, vf } = self;
        (vi - rate * t).max(vf)
    }
}
