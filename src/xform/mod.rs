/*
 * @Description  : 参数化的可微空间变换。每种变换持有一组可学习参数，
 *                 提供前向扭曲、反向传播、到恒等变换的Lp距离、参数投影以及按掩码合并等操作。
 */

//! # 空间变换模块
//!
//! 变换种类（由通用到受限）：
//! - [`FullSpatial`]：逐像素的采样坐标（流场），参数形状`[N, H, W, 2]`
//! - [`AffineTransform`]：每个样本一个2×3仿射矩阵，参数形状`[N, 2, 3]`
//! - [`RotationTransform`]：每个样本一个旋转角（弧度），参数形状`[N]`
//! - [`TranslationTransform`]：每个样本一个平移量`(dx, dy)`，参数形状`[N, 2]`
//!
//! 所有种类都实现[`TraitXform`]，并可统一装进[`Xform`]枚举中使用。
//!
//! # 使用示例
//!
//! ```ignore
//! use only_warp::{Lp, Tensor, TraitXform, Xform, XformKind};
//!
//! let mut xform = Xform::new(XformKind::Rotation, [8, 3, 32, 32].into());
//! for _ in 0..steps {
//!     let warped = xform.forward(&images)?;
//!     let grad_output = classifier_loss_grad(&warped);
//!     xform.params_mut().zero_grad();
//!     xform.backward(&images, &grad_output)?;
//!     let grad = xform.params().grad().unwrap().sign();
//!     let updated = xform.params().value() + &(grad * step_size);
//!     xform.set_params(&updated)?;
//!     xform.project_params(Lp::Inf, 0.3)?;
//! }
//! ```

mod affine;
mod error;
mod full_spatial;
mod params;
mod rotation;
mod shape;
mod translation;


pub use affine::{
    AffineTransform, identity_matrices, rotation_matrices, rotation_matrices_backward,
    translation_matrices, translation_matrices_backward,
};
pub use error::XformError;
pub use full_spatial::FullSpatial;
pub use params::XformParams;
pub use rotation::RotationTransform;
pub use shape::ImgShape;
pub use translation::TranslationTransform;

use std::fmt::{self, Display};

use enum_dispatch::enum_dispatch;

use crate::sampling::SampleOptions;
use crate::tensor::{Lp, Tensor};

/// 变换种类的标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum XformKind {
    FullSpatial,
    Affine,
    Rotation,
    Translation,
}

impl Display for XformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            XformKind::FullSpatial => "FullSpatial",
            XformKind::Affine => "AffineTransform",
            XformKind::Rotation => "RotationTransform",
            XformKind::Translation => "TranslationTransform",
        };
        write!(f, "{}", name)
    }
}

impl XformKind {
    /// 该种类在给定图像批形状下的恒等参数（不带梯度），采样配置取默认值
    pub fn identity_params(&self, shape: ImgShape) -> Tensor {
        match self {
            XformKind::FullSpatial => FullSpatial::identity_params(shape),
            XformKind::Affine => AffineTransform::identity_params(shape),
            XformKind::Rotation => RotationTransform::identity_params(shape),
            XformKind::Translation => TranslationTransform::identity_params(shape),
        }
    }
}

#[enum_dispatch]
#[derive(Debug, Clone)]
pub enum Xform {
    FullSpatial,
    AffineTransform,
    RotationTransform,
    TranslationTransform,
}

impl Xform {
    /// 按种类构造一个恒等变换
    pub fn new(kind: XformKind, shape: ImgShape) -> Self {
        Self::with_options(kind, shape, SampleOptions::default())
    }

    pub fn with_options(kind: XformKind, shape: ImgShape, options: SampleOptions) -> Self {
        match kind {
            XformKind::FullSpatial => FullSpatial::new(shape).with_sample_options(options).into(),
            XformKind::Affine => AffineTransform::new(shape).with_sample_options(options).into(),
            XformKind::Rotation => {
                RotationTransform::new(shape).with_sample_options(options).into()
            }
            XformKind::Translation => {
                TranslationTransform::new(shape).with_sample_options(options).into()
            }
        }
    }
}

// 各种变换的公共接口
#[enum_dispatch(Xform)]
pub trait TraitXform {
    /*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓基本↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/
    fn kind(&self) -> XformKind;
    /// 构造时确定的图像批形状
    fn img_shape(&self) -> ImgShape;
    fn sample_options(&self) -> SampleOptions;
    fn params(&self) -> &XformParams;
    fn params_mut(&mut self) -> &mut XformParams;
    /// 本实例的恒等参数（与本实例的采样配置一致）
    fn identity(&self) -> Tensor;

    /// 用外部算出的新值整体替换参数（如优化器的一步更新），已累积的梯度随之丢弃
    fn set_params(&mut self, value: &Tensor) -> Result<(), XformError> {
        if value.shape() != self.params().shape() {
            return Err(XformError::ShapeMismatch {
                expected: self.params().shape().to_vec(),
                got: value.shape().to_vec(),
            });
        }
        tracing::trace!(kind = %self.kind(), "替换变换参数");
        self.params_mut().replace(value.clone());
        Ok(())
    }
    /*↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑基本↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑*/

    /*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓需各变换自行实现↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/
    /// 当前参数到恒等参数的距离：每个样本的差值展平后求Lp范数，再对整个批求和
    fn norm(&self, _lp: Lp) -> Result<f32, XformError> {
        Err(XformError::NotImplemented(format!("{}的norm", self.kind())))
    }

    /// 将`scale * norm(lp)`对参数的梯度累加到参数梯度上
    fn norm_backward(&mut self, _lp: Lp, _scale: f32) -> Result<(), XformError> {
        Err(XformError::NotImplemented(format!("{}的norm_backward", self.kind())))
    }

    /// 对图像批施加本变换，`images`的形状须与`img_shape`一致
    fn forward(&self, _images: &Tensor) -> Result<Tensor, XformError> {
        Err(XformError::NotImplemented(format!("{}的forward", self.kind())))
    }

    /// 已知损失对`forward(images)`输出的梯度`grad_output`，将损失对参数的梯度累加到参数梯度上
    fn backward(&mut self, _images: &Tensor, _grad_output: &Tensor) -> Result<(), XformError> {
        Err(XformError::NotImplemented(format!("{}的backward", self.kind())))
    }

    /// 将参数裁剪到合法范围内
    fn clip_params(&mut self) -> Result<(), XformError> {
        Err(XformError::NotImplemented(format!("{}的clip_params", self.kind())))
    }

    /// 将参数投影到以恒等参数为中心、Lp半径为`lp_bound`的范围内
    fn project_params(&mut self, lp: Lp, _lp_bound: f32) -> Result<(), XformError> {
        Err(XformError::NotImplemented(format!(
            "{}在{}下的project_params",
            self.kind(),
            lp
        )))
    }
    /*↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑需各变换自行实现↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑*/

    /// 与同种类、同参数形状的`other`按样本合并：`self_mask[i]`为真的样本取自`self`，否则取自`other`。
    /// 返回一个全新的实例（图像形状与采样配置沿用`self`，不带梯度），两个输入均不被修改。
    fn merge_xform(&self, other: &Xform, self_mask: &[bool]) -> Result<Xform, XformError> {
        if self.kind() != other.kind() {
            return Err(XformError::ContractViolation(format!(
                "只能合并同种类的变换，实际为{}和{}",
                self.kind(),
                other.kind()
            )));
        }
        let (self_params, other_params) = (self.params().value(), other.params().value());
        if !self_params.is_same_shape(other_params) {
            return Err(XformError::ContractViolation(format!(
                "两个变换的参数形状须一致，实际为{:?}和{:?}",
                self_params.shape(),
                other_params.shape()
            )));
        }
        if self_mask.len() != self_params.batch_size() {
            return Err(XformError::ContractViolation(format!(
                "掩码长度须等于批大小{}，实际为{}",
                self_params.batch_size(),
                self_mask.len()
            )));
        }

        tracing::debug!(
            kind = %self.kind(),
            from_self = self_mask.iter().filter(|&&keep| keep).count(),
            from_other = self_mask.iter().filter(|&&keep| !keep).count(),
            "合并变换参数"
        );
        let mut merged = Xform::with_options(self.kind(), self.img_shape(), self.sample_options());
        merged
            .params_mut()
            .replace(self_params.fold_mask(other_params, self_mask));
        Ok(merged)
    }
}

/*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓各变换共用的检查↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/
pub(crate) fn check_lp(lp: Lp) -> Result<(), XformError> {
    match lp {
        Lp::P(0) => Err(XformError::InvalidArgument(
            "Lp范数的p须为正整数".to_string(),
        )),
        _ => Ok(()),
    }
}

pub(crate) fn check_bound(lp_bound: f32) -> Result<(), XformError> {
    if lp_bound.is_finite() && lp_bound >= 0. {
        Ok(())
    } else {
        Err(XformError::InvalidArgument(format!(
            "投影半径须为非负有限数，实际为{lp_bound}"
        )))
    }
}

pub(crate) fn check_images(shape: ImgShape, images: &Tensor) -> Result<(), XformError> {
    if images.shape() == shape.dims() {
        Ok(())
    } else {
        Err(XformError::ShapeMismatch {
            expected: shape.dims().to_vec(),
            got: images.shape().to_vec(),
        })
    }
}

/// 反向传播时输入图像与输出梯度的形状都须与`img_shape`一致
pub(crate) fn check_backward_inputs(
    shape: ImgShape,
    images: &Tensor,
    grad_output: &Tensor,
) -> Result<(), XformError> {
    check_images(shape, images)?;
    check_images(shape, grad_output)
}
/*↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑各变换共用的检查↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑*/
