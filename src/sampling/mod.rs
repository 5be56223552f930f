//! # 采样模块
//!
//! 提供空间变换所需的两个基础算子及其反向传播：
//! - [`affine_grid`]：由一批2×3仿射矩阵生成逐像素的采样网格（坐标归一化到[-1, 1]）
//! - [`grid_sample`]：在采样网格给出的坐标处对图像批做双线性插值
//!
//! 约定同PyTorch的`F.affine_grid`/`F.grid_sample`：网格最后一维为`(x, y)`，
//! `x`对应宽度方向，`y`对应高度方向；`(-1, -1)`为左上角。

mod bilinear;
mod grid;


pub use bilinear::{grid_sample, grid_sample_backward};
pub use grid::{affine_grid, affine_grid_backward};

/// 采样坐标落在图像外时的取值方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaddingMode {
    /// 图像外的像素视为0（默认）
    #[default]
    Zeros,
    /// 坐标先被夹到图像边界上，即取最近的边缘像素
    Border,
}

/// 采样配置。`affine_grid`与`grid_sample`须使用同一配置，恒等变换才能精确还原原图
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleOptions {
    /// 为真时，-1和1分别对应首、尾像素的中心；否则对应首、尾像素的外边缘
    pub align_corners: bool,
    pub padding_mode: PaddingMode,
}

impl Default for SampleOptions {
    fn default() -> Self {
        Self {
            align_corners: true,
            padding_mode: PaddingMode::Zeros,
        }
    }
}

impl SampleOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_align_corners(mut self, align_corners: bool) -> Self {
        self.align_corners = align_corners;
        self
    }

    pub fn with_padding_mode(mut self, padding_mode: PaddingMode) -> Self {
        self.padding_mode = padding_mode;
        self
    }

    /// 长度为`len`的轴上第`index`个像素中心的归一化坐标
    pub(crate) fn base_coord(&self, index: usize, len: usize) -> f32 {
        if self.align_corners {
            if len == 1 {
                0.
            } else {
                -1. + 2. * index as f32 / (len - 1) as f32
            }
        } else {
            (2 * index + 1) as f32 / len as f32 - 1.
        }
    }

    /// 将归一化坐标还原为像素坐标，返回`(像素坐标, d像素坐标/d归一化坐标)`；
    /// 边界填充模式下被夹住的坐标导数为0
    pub(crate) fn unnormalize(&self, coord: f32, len: usize) -> (f32, f32) {
        let (pixel, scale) = if self.align_corners {
            let scale = (len - 1) as f32 / 2.;
            ((coord + 1.) * scale, scale)
        } else {
            let scale = len as f32 / 2.;
            ((coord + 1.) * scale - 0.5, scale)
        };
        match self.padding_mode {
            PaddingMode::Zeros => (pixel, scale),
            PaddingMode::Border => {
                let max = (len - 1) as f32;
                if pixel < 0. {
                    (0., 0.)
                } else if pixel > max {
                    (max, 0.)
                } else {
                    (pixel, scale)
                }
            }
        }
    }
}
