use burn::tensor::{backend::Backend, BasicOps, Float, Tensor};

/// A trait for converting items to tensors
///
/// Commonly implemented for batches of `T` to convert them to a tensor of dimension `D`
pub trait ToTensor<B: Backend, const D: usize, K: BasicOps<B>> {
    fn to_tensor(self, device: &B::Device) -> Tensor<B, D, K>;
}

/// A batch of equally long rows becomes a `[rows, cols]` float tensor
impl<B, T> ToTensor<B, 2, Float> for &[T]
where
    B: Backend,
    T: AsRef<[f32]>,
{
    fn to_tensor(self, device: &B::Device) -> Tensor<B, 2, Float> {
        let rows = self.len();
        let cols = self.first().map_or(0, |row| row.as_ref().len());
        let data = self
            .iter()
            .flat_map(|row| row.as_ref().iter().copied())
            .collect::<Vec<f32>>();
        Tensor::<B, 1>::from_floats(data.as_slice(), device).reshape([rows, cols])
    }
}
