use super::affine::{project_toward_identity, warp, warp_backward};
use super::{
    ImgShape, TraitXform, XformError, XformKind, XformParams, check_backward_inputs, check_bound,
    check_images, check_lp, translation_matrices, translation_matrices_backward,
};
use crate::sampling::SampleOptions;
use crate::tensor::{Lp, Tensor};

/// 仅含平移的变换：每个样本两个参数`(dx, dy)`，单位为归一化网格坐标
/// （align_corners下宽度方向相邻像素的间距为`2 / (W - 1)`）。
///
/// 范数与投影在二维平移向量上计算：无穷范数下分别夹住dx、dy，有限p时整体缩放。
#[derive(Debug, Clone)]
pub struct TranslationTransform {
    img_shape: ImgShape,
    options: SampleOptions,
    xform_params: XformParams,
}

impl TranslationTransform {
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

    /// 每个样本平移量为`(0, 0)`，形状`[N, 2]`
    pub fn identity_params(shape: ImgShape) -> Tensor {
        Tensor::zeros(&[shape.n, 2])
    }
}

impl TraitXform for TranslationTransform {
    fn kind(&self) -> XformKind {
        XformKind::Translation
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
        let theta = translation_matrices(self.xform_params.value())?;
        Ok(warp(images, &theta, self.options))
    }

    fn backward(&mut self, images: &Tensor, grad_output: &Tensor) -> Result<(), XformError> {
        check_backward_inputs(self.img_shape, images, grad_output)?;
        let theta = translation_matrices(self.xform_params.value())?;
        let grad_theta = warp_backward(images, &theta, grad_output, self.options);
        self.xform_params
            .accumulate_grad(translation_matrices_backward(&grad_theta));
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
