use thiserror::Error;
mod ops;
pub use self::ops::*;

/// 张量层面的错误。张量代码内部以`assert!`配合本枚举的信息直接panic，
/// 变换层面可恢复的错误见[`crate::xform::XformError`]。
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TensorError {
    // 数字比较用
    #[error("{value_name}须{operator}{threshold}")]
    ValueMustSatisfyComparison {
        value_name: String,
        operator: ComparisonOperator,
        threshold: usize,
    },
    // 张量二元运算
    #[error(
        "形状不一致，故无法{operator}：第一个张量的形状为{tensor1_shape:?}，第二个张量的形状为{tensor2_shape:?}"
    )]
    OperatorError {
        operator: Operator,
        tensor1_shape: Vec<usize>,
        tensor2_shape: Vec<usize>,
    },

    #[error("张量列表为空")]
    EmptyList,
    #[error("张量形状不一致")]
    InconsistentShape,
    #[error("张量形状不兼容")]
    IncompatibleShape,
    #[error("掩码长度{mask_len}与批大小{batch_size}不一致")]
    MaskLengthMismatch { mask_len: usize, batch_size: usize },
    #[error("采样形状不兼容：{0}")]
    SamplingShape(String),
    #[error("除数为零")]
    DivByZero,
}
