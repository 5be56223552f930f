use super::affine::{project_toward_identity, warp, warp_backward};
use super::{
    ImgShape, TraitXform, XformError, XformKind, XformParams, check_backward_inputs, check_bound,
    check_images, check_lp, rotation_matrices, rotation_matrices_backward,
};
use crate::sampling::SampleOptions;
use crate::tensor::{Lp, Tensor};

/// 仅含旋转的变换：每个样本一个参数，即绕图像中心的旋转角（弧度）。
///
/// 范数与投影直接在旋转角上计算：每个样本的差向量只有`[θ]`一个分量，
/// 故任意Lp下的范数都是`|θ|`，投影即把θ夹到`[-lp_bound, lp_bound]`。
#[derive(Debug, Clone)]
pub struct RotationTransform {
    img_shape: ImgShape,
    options: SampleOptions,
    xform_params: XformParams,
}

impl RotationTransform {
    pub fn new(shape: ImgShape) -> Self {
        Self {
            img_shape: shape,
            options: SampleOptions::default(),
            xform_params: XformParams::new(Self::identity_params(shape)),
        }
    }

    pub fn with_sample_options(mut self, options: SampleOptions) -> Self {
        self.options = options;
        self
    }

    /// 每个样本旋转角为0，形状`[N]`
    pub fn identity_params(shape: ImgShape) -> Tensor {
        Tensor::zeros(&[shape.n])
    }
}

impl TraitXform for RotationTransform {
    fn kind(&self) -> XformKind {
        XformKind::Rotation
    }

    fn img_shape(&self) -> ImgShape {
        self.img_shape
    }

    fn sample_options(&self) -> SampleOptions {
        self.options
    }

    fn params(&self) -> &XformParams {
        &self.xform_params
    }

    fn params_mut(&mut self) -> &mut XformParams {
        &mut self.xform_params
    }

    fn identity(&self) -> Tensor {
        Self::identity_params(self.img_shape)
    }

    fn norm(&self, lp: Lp) -> Result<f32, XformError> {
        check_lp(lp)?;
        Ok((self.xform_params.value() - self.identity()).summed_lp_norm(lp))
    }

    fn norm_backward(&mut self, lp: Lp, scale: f32) -> Result<(), XformError> {
        check_lp(lp)?;
        let diff = self.xform_params.value() - self.identity();
        self.xform_params
            .accumulate_grad(diff.batchwise_lp_norm_grad(lp) * scale);
        Ok(())
    }

    fn forward(&self, images: &Tensor) -> Result<Tensor, XformError> {
        check_images(self.img_shape, images)?;
        let theta = rotation_matrices(self.xform_params.value())?;
        Ok(warp(images, &theta, self.options))
    }

    fn backward(&mut self, images: &Tensor, grad_output: &Tensor) -> Result<(), XformError> {
        check_backward_inputs(self.img_shape, images, grad_output)?;
        let angles = self.xform_params.value();
        let theta = rotation_matrices(angles)?;
        let grad_theta = warp_backward(images, &theta, grad_output, self.options);
        let grad = rotation_matrices_backward(angles, &grad_theta);
        self.xform_params.accumulate_grad(grad);
        Ok(())
    }

    fn project_params(&mut self, lp: Lp, lp_bound: f32) -> Result<(), XformError> {
        check_lp(lp)?;
        check_bound(lp_bound)?;
        tracing::debug!(kind = %self.kind(), %lp, lp_bound, "投影变换参数");
        let projected =
            project_toward_identity(self.xform_params.value(), &self.identity(), lp, lp_bound);
        self.xform_params.replace(projected);
        Ok(())
    }
}
