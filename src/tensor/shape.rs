use super::Tensor;
use crate::errors::TensorError;
use ndarray::Axis;

impl Tensor {
    /// 将多个形状相同的张量沿新增的首个维度堆叠起来，返回一个新的张量。
    /// 如3个形状为`[2, 3]`的张量堆叠后形状为`[3, 2, 3]`。
    pub fn stack(tensors: &[&Self]) -> Self {
        assert!(!tensors.is_empty(), "{}", TensorError::EmptyList);
        let first_shape = tensors[0].shape();
        assert!(
            tensors.iter().all(|t| t.shape() == first_shape),
            "{}",
            TensorError::InconsistentShape
        );

        let data = tensors
            .iter()
            .flat_map(|t| t.data.iter())
            .copied()
            .collect::<Vec<_>>();
        let mut shape = first_shape.to_vec();
        shape.insert(0, tensors.len());

        Self::from_vec(data, &shape)
    }

    /// 批大小，即首个维度的长度。0阶张量视为批大小为1
    pub fn batch_size(&self) -> usize {
        self.shape().first().copied().unwrap_or(1)
    }

    /// 取出批中第`index`个样本（去掉首个维度后的张量）。
    /// 若原张量形状为`[N]`，则返回形状为`[]`的标量。
    pub fn batch_item(&self, index: usize) -> Self {
        assert!(
            self.dimension() >= 1 && index < self.batch_size(),
            "{}",
            TensorError::IncompatibleShape
        );
        Self {
            data: self.data.index_axis(Axis(0), index).to_owned(),
        }
    }
}
