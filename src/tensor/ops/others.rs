use crate::errors::{Operator, TensorError};
use crate::tensor::Tensor;
use approx::AbsDiffEq;
use ndarray::{Axis, Zip};

impl From<f32> for Tensor {
    /// 实现 From<f32> trait 用于将`f32`类型转换为形状为`[1]`的张量
    fn from(scalar: f32) -> Self {
        Tensor::new(&[scalar], &[1])
    }
}

impl PartialEq for Tensor {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl Tensor {
    /// 对张量中的所有元素求和并返回纯数
    pub fn sum(&self) -> f32 {
        let mut value = 0.0;
        Zip::from(&self.data).for_each(|a| value += a);
        value
    }

    /// 逐元素映射，返回一个新的张量
    pub fn map(&self, f: impl Fn(f32) -> f32) -> Tensor {
        Tensor {
            data: self.data.mapv(f),
        }
    }

    pub fn abs(&self) -> Tensor {
        self.map(f32::abs)
    }

    /// 逐元素取符号，0的符号仍为0（与`f32::signum`不同）
    pub fn sign(&self) -> Tensor {
        self.map(|x| if x > 0. { 1. } else if x < 0. { -1. } else { 0. })
    }

    /// 所有元素绝对值中的最大值；空张量返回0
    pub fn max_abs(&self) -> f32 {
        self.data.iter().fold(0., |acc: f32, x| acc.max(x.abs()))
    }

    /// 将每个元素夹到`[min, max]`闭区间内
    pub fn clamp(&self, min: f32, max: f32) -> Tensor {
        self.map(|x| x.clamp(min, max))
    }

    /// 将每个元素夹到以`reference`中对应元素为中心、半径为`bound`的闭区间内，
    /// 即逐元素`clamp(x, ref - bound, ref + bound)`。两张量形状须一致。
    pub fn clamp_ref(&self, reference: &Tensor, bound: f32) -> Tensor {
        assert!(
            self.is_same_shape(reference),
            "{}",
            TensorError::OperatorError {
                operator: Operator::Sub,
                tensor1_shape: self.shape().to_vec(),
                tensor2_shape: reference.shape().to_vec(),
            }
        );
        let mut data = self.data.clone();
        data.zip_mut_with(&reference.data, |x, &r| *x = x.clamp(r - bound, r + bound));
        Tensor { data }
    }

    /// 按批合并两个形状相同的张量：`mask[i]`为真时取`self`的第i个样本，否则取`other`的。
    /// `mask`的长度必须等于批大小（首个维度的长度）。
    pub fn fold_mask(&self, other: &Tensor, mask: &[bool]) -> Tensor {
        assert!(
            self.is_same_shape(other),
            "{}",
            TensorError::OperatorError {
                operator: Operator::FoldMask,
                tensor1_shape: self.shape().to_vec(),
                tensor2_shape: other.shape().to_vec(),
            }
        );
        assert!(
            self.dimension() >= 1 && mask.len() == self.batch_size(),
            "{}",
            TensorError::MaskLengthMismatch {
                mask_len: mask.len(),
                batch_size: self.batch_size(),
            }
        );

        let mut data = self.data.clone();
        for (i, mut item) in data.axis_iter_mut(Axis(0)).enumerate() {
            if !mask[i] {
                item.assign(&other.data.index_axis(Axis(0), i));
            }
        }
        Tensor { data }
    }

    /// 在容差`epsilon`内逐元素比较两个张量，形状不一致时直接返回false
    pub fn abs_diff_eq(&self, other: &Tensor, epsilon: f32) -> bool {
        self.is_same_shape(other)
            && self
                .data
                .iter()
                .zip(other.data.iter())
                .all(|(a, b)| a.abs_diff_eq(b, epsilon))
    }
}
