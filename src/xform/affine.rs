/*
 * @Description  : 仿射变换，以及由受限参数（旋转角、平移量）构造仿射矩阵的公共函数。
 *                 旋转、平移变换通过这些函数复用仿射网格与双线性采样，而非继承仿射变换本身。
 */

use super::{
    ImgShape, TraitXform, XformError, XformKind, XformParams, check_backward_inputs, check_bound,
    check_images, check_lp,
};
use crate::sampling::{
    SampleOptions, affine_grid, affine_grid_backward, grid_sample, grid_sample_backward,
};
use crate::tensor::{Lp, Tensor};

/// 仿射变换：每个样本6个参数（2×3矩阵），可同时表达旋转、缩放、错切与平移
#[derive(Debug, Clone)]
pub struct AffineTransform {
    img_shape: ImgShape,
    options: SampleOptions,
    xform_params: XformParams,
}

impl AffineTransform {
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

    /// 每个样本均为`[[1, 0, 0], [0, 1, 0]]`，形状`[N, 2, 3]`
    pub fn identity_params(shape: ImgShape) -> Tensor {
        identity_matrices(shape.n)
    }
}

impl TraitXform for AffineTransform {
    fn kind(&self) -> XformKind {
        XformKind::Affine
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
        Ok(warp(images, self.xform_params.value(), self.options))
    }

    fn backward(&mut self, images: &Tensor, grad_output: &Tensor) -> Result<(), XformError> {
        check_backward_inputs(self.img_shape, images, grad_output)?;
        let grad_theta =
            warp_backward(images, self.xform_params.value(), grad_output, self.options);
        self.xform_params.accumulate_grad(grad_theta);
        Ok(())
    }

    /// 仿射矩阵没有固有的合法范围，故无需先裁剪：
    /// 求出与恒等矩阵的差，对每个样本的6维差向量做Lp球投影，再把修正量加回参数
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

/*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓由受限参数构造仿射矩阵↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/
/// `n`个恒等仿射矩阵，形状`[n, 2, 3]`
pub fn identity_matrices(n: usize) -> Tensor {
    let identity = Tensor::new(&[1., 0., 0., 0., 1., 0.], &[2, 3]);
    Tensor::stack(&vec![&identity; n])
}

/// 由旋转角`[N]`（弧度）构造旋转矩阵`[[cos θ, -sin θ, 0], [sin θ, cos θ, 0]]`，形状`[N, 2, 3]`
pub fn rotation_matrices(angles: &Tensor) -> Result<Tensor, XformError> {
    if angles.dimension() != 1 {
        return Err(XformError::TypeMisuse(format!(
            "旋转角的形状须为[N]，实际为{:?}",
            angles.shape()
        )));
    }
    let data = angles
        .to_vec()
        .into_iter()
        .flat_map(|theta| {
            let (sin, cos) = theta.sin_cos();
            [cos, -sin, 0., sin, cos, 0.]
        })
        .collect::<Vec<_>>();
    Ok(Tensor::from_vec(data, &[angles.size(), 2, 3]))
}

/// `rotation_matrices`的反向传播：由损失对旋转矩阵的梯度`[N, 2, 3]`求损失对旋转角的梯度`[N]`
pub fn rotation_matrices_backward(angles: &Tensor, grad_theta: &Tensor) -> Tensor {
    let grad_theta = grad_theta.to_vec();
    let data = angles
        .to_vec()
        .into_iter()
        .zip(grad_theta.chunks(6))
        .map(|(theta, g)| {
            let (sin, cos) = theta.sin_cos();
            -sin * g[0] - cos * g[1] + cos * g[3] - sin * g[4]
        })
        .collect::<Vec<_>>();
    Tensor::from_vec(data, angles.shape())
}

/// 由平移量`[N, 2]`构造平移矩阵`[[1, 0, dx], [0, 1, dy]]`，形状`[N, 2, 3]`
pub fn translation_matrices(offsets: &Tensor) -> Result<Tensor, XformError> {
    if offsets.dimension() != 2 || offsets.shape()[1] != 2 {
        return Err(XformError::TypeMisuse(format!(
            "平移量的形状须为[N, 2]，实际为{:?}",
            offsets.shape()
        )));
    }
    let data = offsets
        .to_vec()
        .chunks(2)
        .flat_map(|d| [1., 0., d[0], 0., 1., d[1]])
        .collect::<Vec<_>>();
    Ok(Tensor::from_vec(data, &[offsets.batch_size(), 2, 3]))
}

/// `translation_matrices`的反向传播：平移量的梯度即矩阵第3列的梯度，形状`[N, 2]`
pub fn translation_matrices_backward(grad_theta: &Tensor) -> Tensor {
    let data = grad_theta
        .to_vec()
        .chunks(6)
        .flat_map(|g| [g[2], g[5]])
        .collect::<Vec<_>>();
    Tensor::from_vec(data, &[grad_theta.batch_size(), 2])
}
/*↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑由受限参数构造仿射矩阵↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑*/

/*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓仿射族共用的前向/反向/投影↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/
/// 由仿射矩阵`[N, 2, 3]`生成网格并双线性采样
pub(crate) fn warp(images: &Tensor, theta: &Tensor, options: SampleOptions) -> Tensor {
    let dims = image_dims(images);
    let grid = affine_grid(theta, dims, options);
    grid_sample(images, &grid, options)
}

/// `warp`的反向传播，返回损失对仿射矩阵的梯度`[N, 2, 3]`
pub(crate) fn warp_backward(
    images: &Tensor,
    theta: &Tensor,
    grad_output: &Tensor,
    options: SampleOptions,
) -> Tensor {
    let dims = image_dims(images);
    let grid = affine_grid(theta, dims, options);
    let grad_grid = grid_sample_backward(images, &grid, grad_output, options);
    affine_grid_backward(&grad_grid, options)
}

/// 将`params`投影到以`identity`为中心、每个样本Lp半径为`lp_bound`的范围内，返回投影后的参数
pub(crate) fn project_toward_identity(
    params: &Tensor,
    identity: &Tensor,
    lp: Lp,
    lp_bound: f32,
) -> Tensor {
    let diff = params - identity;
    let new_diff = diff.batchwise_lp_project(lp, lp_bound);
    params + &(new_diff - diff)
}

fn image_dims(images: &Tensor) -> [usize; 4] {
    let shape = images.shape();
    [shape[0], shape[1], shape[2], shape[3]]
}
/*↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑仿射族共用的前向/反向/投影↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑*/
