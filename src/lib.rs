//! # Only Warp
//!
//! `only_warp`用纯rust实现一组参数化的、可微的空间变换（全空间流场、仿射、旋转、平移），
//! 供外部的梯度优化循环（如空间对抗样本的构造）使用：
//! 前向扭曲图像批、反向求参数梯度、度量与恒等变换的Lp距离、把参数投影回约束范围，
//! 以及按样本掩码合并两组变换。
//!

pub mod errors;
pub mod sampling;
pub mod tensor;
pub mod utils;
pub mod xform;

pub use sampling::{PaddingMode, SampleOptions};
pub use tensor::{Lp, Tensor};
pub use xform::{
    AffineTransform, FullSpatial, ImgShape, RotationTransform, TraitXform, TranslationTransform,
    Xform, XformError, XformKind, XformParams,
};
