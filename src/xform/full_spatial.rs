/*
 * @Description  : 全空间变换：参数即每个输出像素的采样坐标（流场），
 *                 可表达任意形变。坐标为归一化坐标，合法范围为`[-1, 1]`。
 */

use super::{
    ImgShape, TraitXform, XformError, XformKind, XformParams, check_backward_inputs, check_bound,
    check_images, check_lp, identity_matrices,
};
use crate::sampling::{SampleOptions, affine_grid, grid_sample, grid_sample_backward};
use crate::tensor::{Lp, Tensor};

#[derive(Debug, Clone)]
pub struct FullSpatial {
    img_shape: ImgShape,
    options: SampleOptions,
    xform_params: XformParams,
}

impl FullSpatial {
    pub fn new(shape: ImgShape) -> Self {
        Self {
            img_shape: shape,
            options: SampleOptions::default(),
            xform_params: XformParams::new(Self::identity_params(shape)),
        }
    }

    /// 更换采样配置。恒等网格依赖`align_corners`，故参数随之重置为新配置下的恒等网格
    pub fn with_sample_options(mut self, options: SampleOptions) -> Self {
        self.options = options;
        self.xform_params = XformParams::new(Self::identity_grid(self.img_shape, options));
        self
    }

    /// 默认采样配置下的恒等网格，形状`[N, H, W, 2]`，最后一维为`(x, y)`
    pub fn identity_params(shape: ImgShape) -> Tensor {
        Self::identity_grid(shape, SampleOptions::default())
    }

    fn identity_grid(shape: ImgShape, options: SampleOptions) -> Tensor {
        affine_grid(&identity_matrices(shape.n), shape.dims(), options)
    }

    /// 裁剪到`[-1, 1]`后的参数
    fn clipped(&self) -> Tensor {
        self.xform_params.value().clamp(-1., 1.)
    }
}

impl TraitXform for FullSpatial {
    fn kind(&self) -> XformKind {
        XformKind::FullSpatial
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
        Self::identity_grid(self.img_shape, self.options)
    }

    /// 先把参数裁剪到`[-1, 1]`再与恒等网格作差，即超出图像范围的坐标不额外计入距离
    fn norm(&self, lp: Lp) -> Result<f32, XformError> {
        check_lp(lp)?;
        Ok((self.clipped() - self.identity()).summed_lp_norm(lp))
    }

    /// 被裁剪的元素对范数没有贡献，其梯度为0
    fn norm_backward(&mut self, lp: Lp, scale: f32) -> Result<(), XformError> {
        check_lp(lp)?;
        let diff = self.clipped() - self.identity();
        let in_range = self
            .xform_params
            .value()
            .map(|x| if (-1.0..=1.0).contains(&x) { 1. } else { 0. });
        let grad = diff.batchwise_lp_norm_grad(lp) * in_range * scale;
        self.xform_params.accumulate_grad(grad);
        Ok(())
    }

    fn forward(&self, images: &Tensor) -> Result<Tensor, XformError> {
        check_images(self.img_shape, images)?;
        Ok(grid_sample(images, self.xform_params.value(), self.options))
    }

    fn backward(&mut self, images: &Tensor, grad_output: &Tensor) -> Result<(), XformError> {
        check_backward_inputs(self.img_shape, images, grad_output)?;
        let grad_grid =
            grid_sample_backward(images, self.xform_params.value(), grad_output, self.options);
        self.xform_params.accumulate_grad(grad_grid);
        Ok(())
    }

    fn clip_params(&mut self) -> Result<(), XformError> {
        tracing::debug!(kind = %self.kind(), "裁剪变换参数到[-1, 1]");
        let clipped = self.clipped();
        self.xform_params.replace(clipped);
        Ok(())
    }

    /// 仅支持无穷范数：先裁剪，再把每个坐标夹到恒等网格对应坐标的`±lp_bound`之内
    fn project_params(&mut self, lp: Lp, lp_bound: f32) -> Result<(), XformError> {
        check_lp(lp)?;
        if lp != Lp::Inf {
            return Err(XformError::NotImplemented(format!(
                "{}在{}下的project_params",
                self.kind(),
                lp
            )));
        }
        check_bound(lp_bound)?;
        self.clip_params()?;
        tracing::debug!(kind = %self.kind(), %lp, lp_bound, "投影变换参数");
        let projected = self
            .xform_params
            .value()
            .clamp_ref(&self.identity(), lp_bound);
        self.xform_params.replace(projected);
        Ok(())
    }
}
