use super::SampleOptions;
use crate::errors::TensorError;
use crate::tensor::Tensor;

/// 由仿射矩阵生成采样网格，参见PyTorch的`F.affine_grid`。
///
/// * `theta` - 形状为`[N, 2, 3]`的仿射矩阵
/// * `dims` - 目标图像批的形状`[N, C, H, W]`
///
/// 返回形状为`[N, H, W, 2]`的网格，最后一维为`(x, y)`：
/// `x' = a00 * x + a01 * y + a02`，`y' = a10 * x + a11 * y + a12`，
/// 其中`(x, y)`为输出像素中心的归一化坐标。
pub fn affine_grid(theta: &Tensor, dims: [usize; 4], options: SampleOptions) -> Tensor {
    let [n, _, h, w] = dims;
    check_theta(theta, n);

    let theta = theta.to_vec();
    let mut grid = Vec::with_capacity(n * h * w * 2);
    for a in theta.chunks(6) {
        for i in 0..h {
            let y = options.base_coord(i, h);
            for j in 0..w {
                let x = options.base_coord(j, w);
                grid.push(a[0] * x + a[1] * y + a[2]);
                grid.push(a[3] * x + a[4] * y + a[5]);
            }
        }
    }
    Tensor::from_vec(grid, &[n, h, w, 2])
}

/// `affine_grid`的反向传播：由损失对网格的梯度`[N, H, W, 2]`求损失对仿射矩阵的梯度`[N, 2, 3]`
pub fn affine_grid_backward(grad_grid: &Tensor, options: SampleOptions) -> Tensor {
    let shape = grad_grid.shape();
    assert!(
        shape.len() == 4 && shape[3] == 2,
        "{}",
        TensorError::SamplingShape(format!("网格梯度的形状须为[N, H, W, 2]，实际为{shape:?}"))
    );
    let [n, h, w] = [shape[0], shape[1], shape[2]];

    let grad_grid = grad_grid.to_vec();
    let mut grad_theta = vec![0.; n * 6];
    for (b, g) in grad_theta.chunks_mut(6).enumerate() {
        for i in 0..h {
            let y = options.base_coord(i, h);
            for j in 0..w {
                let x = options.base_coord(j, w);
                let offset = ((b * h + i) * w + j) * 2;
                let (gx, gy) = (grad_grid[offset], grad_grid[offset + 1]);
                g[0] += gx * x;
                g[1] += gx * y;
                g[2] += gx;
                g[3] += gy * x;
                g[4] += gy * y;
                g[5] += gy;
            }
        }
    }
    Tensor::from_vec(grad_theta, &[n, 2, 3])
}

fn check_theta(theta: &Tensor, n: usize) {
    assert!(
        theta.shape() == [n, 2, 3],
        "{}",
        TensorError::SamplingShape(format!(
            "仿射矩阵的形状须为[{n}, 2, 3]，实际为{:?}",
            theta.shape()
        ))
    );
}
