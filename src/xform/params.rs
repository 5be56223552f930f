use crate::errors::{Operator, TensorError};
use crate::tensor::Tensor;

/// 变换参数：当前参数值与累积梯度的组合。
///
/// 参数的任何修改（裁剪、投影、外部更新、合并）都会整体替换参数值并丢弃已有梯度，
/// 即修改后的参数与之前的梯度历史无关。
#[derive(Debug, Clone)]
pub struct XformParams {
    value: Tensor,
    grad: Option<Tensor>,
}

impl XformParams {
    pub(crate) fn new(value: Tensor) -> Self {
        Self { value, grad: None }
    }

    pub fn value(&self) -> &Tensor {
        &self.value
    }

    /// 自上次清零（或参数被替换）以来累积的梯度，从未反向传播过则为None
    pub fn grad(&self) -> Option<&Tensor> {
        self.grad.as_ref()
    }

    pub fn shape(&self) -> &[usize] {
        self.value.shape()
    }

    pub fn zero_grad(&mut self) {
        self.grad = None;
    }

    pub(crate) fn accumulate_grad(&mut self, grad: Tensor) {
        assert!(
            grad.is_same_shape(&self.value),
            "{}",
            TensorError::OperatorError {
                operator: Operator::Add,
                tensor1_shape: self.value.shape().to_vec(),
                tensor2_shape: grad.shape().to_vec(),
            }
        );
        self.grad = Some(match self.grad.take() {
            Some(accumulated) => accumulated + grad,
            None => grad,
        });
    }

    pub(crate) fn replace(&mut self, value: Tensor) {
        assert!(
            value.is_same_shape(&self.value),
            "{}",
            TensorError::IncompatibleShape
        );
        self.value = value;
        self.grad = None;
    }
}
