use super::SampleOptions;
use crate::errors::TensorError;
use crate::tensor::Tensor;

/// 双线性网格采样，参见PyTorch的`F.grid_sample`（`mode="bilinear"`）。
///
/// * `images` - 形状为`[N, C, H, W]`的图像批
/// * `grid` - 形状为`[N, Ho, Wo, 2]`的采样网格，坐标归一化到[-1, 1]
///
/// 返回形状为`[N, C, Ho, Wo]`的图像批。
pub fn grid_sample(images: &Tensor, grid: &Tensor, options: SampleOptions) -> Tensor {
    let dims = Dims::check(images, grid);
    let pixels = images.to_vec();
    let grid = grid.to_vec();

    let mut output = vec![0.; dims.n * dims.c * dims.out_h * dims.out_w];
    for b in 0..dims.n {
        for i in 0..dims.out_h {
            for j in 0..dims.out_w {
                let point = dims.locate(&grid, b, i, j, options);
                for ch in 0..dims.c {
                    let plane = dims.plane(&pixels, b, ch);
                    let [v00, v01, v10, v11] = point.corners(plane, dims.h, dims.w);
                    output[dims.out_offset(b, ch, i, j)] = v00 * point.wx0 * point.wy0
                        + v01 * point.wx1 * point.wy0
                        + v10 * point.wx0 * point.wy1
                        + v11 * point.wx1 * point.wy1;
                }
            }
        }
    }
    Tensor::from_vec(output, &[dims.n, dims.c, dims.out_h, dims.out_w])
}

/// `grid_sample`的反向传播：由损失对输出图像的梯度`grad_output`（形状同输出）
/// 求损失对采样网格的梯度（形状同`grid`）。
///
/// 双线性插值在像素整点处不可导，此处取右导数（与PyTorch一致）。
pub fn grid_sample_backward(
    images: &Tensor,
    grid: &Tensor,
    grad_output: &Tensor,
    options: SampleOptions,
) -> Tensor {
    let dims = Dims::check(images, grid);
    assert!(
        grad_output.shape() == [dims.n, dims.c, dims.out_h, dims.out_w],
        "{}",
        TensorError::SamplingShape(format!(
            "输出梯度的形状须为{:?}，实际为{:?}",
            [dims.n, dims.c, dims.out_h, dims.out_w],
            grad_output.shape()
        ))
    );
    let pixels = images.to_vec();
    let grad_output = grad_output.to_vec();
    let grid_data = grid.to_vec();

    let mut grad_grid = vec![0.; grid_data.len()];
    for b in 0..dims.n {
        for i in 0..dims.out_h {
            for j in 0..dims.out_w {
                let point = dims.locate(&grid_data, b, i, j, options);
                let (mut gx, mut gy) = (0., 0.);
                for ch in 0..dims.c {
                    let go = grad_output[dims.out_offset(b, ch, i, j)];
                    if go == 0. {
                        continue;
                    }
                    let plane = dims.plane(&pixels, b, ch);
                    let [v00, v01, v10, v11] = point.corners(plane, dims.h, dims.w);
                    gx += go * ((v01 - v00) * point.wy0 + (v11 - v10) * point.wy1);
                    gy += go * ((v10 - v00) * point.wx0 + (v11 - v01) * point.wx1);
                }
                let offset = dims.grid_offset(b, i, j);
                grad_grid[offset] = gx * point.dx_scale;
                grad_grid[offset + 1] = gy * point.dy_scale;
            }
        }
    }
    Tensor::from_vec(grad_grid, grid.shape())
}

/// 输入图像批与输出网格的各维大小
struct Dims {
    n: usize,
    c: usize,
    h: usize,
    w: usize,
    out_h: usize,
    out_w: usize,
}

impl Dims {
    fn check(images: &Tensor, grid: &Tensor) -> Self {
        let (image_shape, grid_shape) = (images.shape(), grid.shape());
        assert!(
            image_shape.len() == 4
                && grid_shape.len() == 4
                && grid_shape[3] == 2
                && image_shape[0] == grid_shape[0],
            "{}",
            TensorError::SamplingShape(format!(
                "图像批的形状须为[N, C, H, W]，网格的形状须为[N, Ho, Wo, 2]，实际分别为{image_shape:?}和{grid_shape:?}"
            ))
        );
        Self {
            n: image_shape[0],
            c: image_shape[1],
            h: image_shape[2],
            w: image_shape[3],
            out_h: grid_shape[1],
            out_w: grid_shape[2],
        }
    }

    fn plane<'a>(&self, pixels: &'a [f32], b: usize, ch: usize) -> &'a [f32] {
        let start = (b * self.c + ch) * self.h * self.w;
        &pixels[start..start + self.h * self.w]
    }

    fn out_offset(&self, b: usize, ch: usize, i: usize, j: usize) -> usize {
        ((b * self.c + ch) * self.out_h + i) * self.out_w + j
    }

    fn grid_offset(&self, b: usize, i: usize, j: usize) -> usize {
        ((b * self.out_h + i) * self.out_w + j) * 2
    }

    fn locate(
        &self,
        grid: &[f32],
        b: usize,
        i: usize,
        j: usize,
        options: SampleOptions,
    ) -> SamplePoint {
        let offset = self.grid_offset(b, i, j);
        let (ix, dx_scale) = options.unnormalize(grid[offset], self.w);
        let (iy, dy_scale) = options.unnormalize(grid[offset + 1], self.h);
        let (x0, y0) = (ix.floor(), iy.floor());
        let (wx1, wy1) = (ix - x0, iy - y0);
        SamplePoint {
            x0: x0 as isize,
            y0: y0 as isize,
            wx0: 1. - wx1,
            wx1,
            wy0: 1. - wy1,
            wy1,
            dx_scale,
            dy_scale,
        }
    }
}

/// 单个采样点：左上角邻居像素的坐标、双线性权重，以及像素坐标对归一化坐标的导数
struct SamplePoint {
    x0: isize,
    y0: isize,
    wx0: f32,
    wx1: f32,
    wy0: f32,
    wy1: f32,
    dx_scale: f32,
    dy_scale: f32,
}

impl SamplePoint {
    /// 四个邻居像素的值，顺序为`[左上, 右上, 左下, 右下]`，图像外的像素取0
    fn corners(&self, plane: &[f32], h: usize, w: usize) -> [f32; 4] {
        let pixel = |y: isize, x: isize| {
            if y >= 0 && x >= 0 && (y as usize) < h && (x as usize) < w {
                plane[y as usize * w + x as usize]
            } else {
                0.
            }
        };
        let (x1, y1) = (self.x0.saturating_add(1), self.y0.saturating_add(1));
        [
            pixel(self.y0, self.x0),
            pixel(self.y0, x1),
            pixel(y1, self.x0),
            pixel(y1, x1),
        ]
    }
}
