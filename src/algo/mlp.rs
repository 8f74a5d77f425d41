use burn::{
    nn::{
        loss::{MseLoss, Reduction},
        Linear, LinearConfig,
    },
    optim::{GradientsParams, Optimizer},
    prelude::*,
    tensor::{activation::relu, backend::AutodiffBackend, ElementConversion},
};
use log::warn;

use crate::{traits::ToTensor, Error};

use super::{q_function::check_batch, QFunction};

/// A feed-forward network with one hidden ReLU layer and a linear output per action
#[derive(Module, Debug)]
pub struct Mlp<B: Backend> {
    fc1: Linear<B>,
    fc2: Linear<B>,
}

#[derive(Config, Debug)]
pub struct MlpConfig {
    inputs: usize,
    hidden: usize,
    outputs: usize,
}

impl MlpConfig {
    /// Hidden width halfway between the input and output widths
    pub fn halfway(inputs: usize, outputs: usize) -> Self {
        Self::new(inputs, (inputs + outputs) / 2, outputs)
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> Mlp<B> {
        Mlp {
            fc1: LinearConfig::new(self.inputs, self.hidden).init(device),
            fc2: LinearConfig::new(self.hidden, self.outputs).init(device),
        }
    }
}

impl<B: Backend> Mlp<B> {
    pub fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = relu(self.fc1.forward(input));
        self.fc2.forward(x)
    }
}

/// A [`QFunction`] backed by an [`Mlp`] trained on mean squared error
///
/// ### Generics
/// - `B`: A burn autodiff backend
/// - `O`: An [`Optimizer`] for the network
pub struct MlpQFunction<B: AutodiffBackend, O> {
    model: Option<Mlp<B>>,
    optimizer: O,
    loss: MseLoss<B>,
    lr: f64,
    num_actions: usize,
    device: B::Device,
}

impl<B, O> MlpQFunction<B, O>
where
    B: AutodiffBackend,
    O: Optimizer<Mlp<B>, B>,
{
    /// Initialize a fresh network from `config`
    pub fn new(config: &MlpConfig, optimizer: O, lr: f64, device: &B::Device) -> Self {
        Self {
            model: Some(config.init(device)),
            optimizer,
            loss: MseLoss::new(),
            lr,
            num_actions: config.outputs,
            device: device.clone(),
        }
    }

    fn model(&self) -> crate::Result<&Mlp<B>> {
        self.model
            .as_ref()
            .ok_or_else(|| Error::Approximator(String::from("network lost during a failed update")))
    }
}

impl<B, O> QFunction for MlpQFunction<B, O>
where
    B: AutodiffBackend,
    O: Optimizer<Mlp<B>, B>,
{
    fn num_actions(&self) -> usize {
        self.num_actions
    }

    fn forward(&self, state: &[f32]) -> crate::Result<Vec<f32>> {
        let input: Tensor<B, 2> = [state].as_slice().to_tensor(&self.device);
        let output = self.model()?.forward(input).detach();
        Ok(output
            .into_data()
            .value
            .into_iter()
            .map(|v| v.elem::<f32>())
            .collect())
    }

    /// ### Errors
    /// [`Error::Approximator`] if the loss is not finite, in which case the parameters are left untouched
    fn train(&mut self, states: &[&[f32]], targets: &[Vec<f32>]) -> crate::Result<f32> {
        check_batch(states, targets, self.num_actions)?;

        let inputs: Tensor<B, 2> = states.to_tensor(&self.device);
        let targets: Tensor<B, 2> = targets.to_tensor(&self.device);

        let model = self.model.take().ok_or_else(|| {
            Error::Approximator(String::from("network lost during a failed update"))
        })?;
        let loss = self
            .loss
            .forward(model.forward(inputs), targets, Reduction::Mean);
        let value = loss.clone().into_scalar().elem::<f32>();

        if !value.is_finite() {
            warn!("non-finite loss {value}, skipping update");
            self.model = Some(model);
            return Err(Error::Approximator(format!("non-finite loss {value}")));
        }

        let grads = GradientsParams::from_grads(loss.backward(), &model);
        self.model = Some(self.optimizer.step(self.lr, model, grads));

        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use burn::{
        backend::{Autodiff, NdArray},
        optim::SgdConfig,
    };

    use super::*;

    type B = Autodiff<NdArray>;

    fn q_function() -> MlpQFunction<B, impl Optimizer<Mlp<B>, B>> {
        let device = Default::default();
        MlpQFunction::new(
            &MlpConfig::new(3, 8, 2),
            SgdConfig::new().init::<B, Mlp<B>>(),
            0.05,
            &device,
        )
    }

    #[test]
    fn forward_width() {
        let q = q_function();
        let out = q.forward(&[1.0, 0.0, 0.0]).unwrap();
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn training_reduces_loss() {
        let mut q = q_function();
        let a = [1.0, 0.0, 0.0];
        let b = [0.0, 1.0, 0.0];
        let states: [&[f32]; 2] = [&a, &b];
        let targets = vec![vec![1.0, -1.0], vec![-1.0, 1.0]];

        let first = q.train(&states, &targets).unwrap();
        let mut last = first;
        for _ in 0..200 {
            last = q.train(&states, &targets).unwrap();
        }
        assert!(first.is_finite() && last.is_finite());
        assert!(last < first, "loss went from {first} to {last}");
    }

    #[test]
    fn non_finite_targets_are_reported() {
        let mut q = q_function();
        let a = [1.0, 0.0, 0.0];
        let result = q.train(&[&a], &[vec![f32::NAN, 0.0]]);
        assert!(matches!(result, Err(Error::Approximator(_))));
        assert!(q.forward(&a).is_ok(), "network still usable");
    }

    #[test]
    fn halfway_config() {
        let config = MlpConfig::halfway(64, 4);
        assert_eq!(config.hidden, 34);
    }
}
