//! 空间变换相关错误类型定义

use thiserror::Error;

/// 空间变换操作的错误。所有错误都同步地返回给调用方（外部优化循环），本库内部不做任何重试或恢复
#[derive(Debug, Error, PartialEq, Eq)]
pub enum XformError {
    /// 该变换不具备此能力，或所给的Lp范数类型尚不支持
    #[error("尚未实现: {0}")]
    NotImplemented(String),

    /// 合并两个变换时前提条件不满足（种类、参数形状或掩码长度不一致）
    #[error("违反合并约定: {0}")]
    ContractViolation(String),

    /// 构造网格或形状时传入了不符合预期的输入
    #[error("输入类型有误: {0}")]
    TypeMisuse(String),

    /// 图像批、梯度或参数的形状与该变换实例不匹配
    #[error("形状不匹配: 期望 {expected:?}, 实际 {got:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    /// 参数取值非法，如`Lp::P(0)`或负的投影半径
    #[error("参数非法: {0}")]
    InvalidArgument(String),
}
