use ndarray::{Array, IxDyn};
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::errors::TensorError;

pub mod ops {
    pub mod arith;
    pub mod index;
    pub mod norm;
    pub mod others;
}
pub use ops::norm::Lp;

mod property;
mod shape;

#[cfg(test)]
mod tests;

/// 定义张量的结构体。其可以是标量、向量、矩阵或更高维度的数组。
/// 注：只要通Tensor初始化的都是张量（即使标量也是张量）；
/// 而通常意义上的数字（类型为usize、i32、f64等）就只是纯数（number），在这里不被认为是张量。
///
/// 本库中图像批的约定形状为`[N, C, H, W]`，采样网格的约定形状为`[N, H, W, 2]`。
#[derive(Debug, Clone)]
pub struct Tensor {
    data: Array<f32, IxDyn>,
}

impl Tensor {
    /// 创建一个张量，若为标量，`shape`可以是[]、[1]、[1,1]、[1,1,1]...
    /// 若为向量，`shape`可以是[n]、[1,n]、[n,1]；
    /// 若为矩阵，`shape`可以是[n,m]；
    /// 若为更高维度的数组，`shape`可以是[c,n,m,...]；
    /// 注：`data`的长度必须和`shape`中所有元素的乘积相等，否则会panic。
    pub fn new(data: &[f32], shape: &[usize]) -> Tensor {
        let data = Array::from_shape_vec(IxDyn(shape), data.to_vec())
            .unwrap_or_else(|_| panic!("{}", TensorError::IncompatibleShape));
        Tensor { data }
    }

    /// 同`new`，但直接接管`Vec`的所有权，省去一次拷贝
    pub fn from_vec(data: Vec<f32>, shape: &[usize]) -> Tensor {
        let data = Array::from_shape_vec(IxDyn(shape), data)
            .unwrap_or_else(|_| panic!("{}", TensorError::IncompatibleShape));
        Tensor { data }
    }

    pub fn zeros(shape: &[usize]) -> Tensor {
        Tensor {
            data: Array::zeros(IxDyn(shape)),
        }
    }

    pub fn ones(shape: &[usize]) -> Tensor {
        Tensor {
            data: Array::ones(IxDyn(shape)),
        }
    }

    /// 创建一个所有元素均为`value`的张量
    pub fn full(value: f32, shape: &[usize]) -> Tensor {
        Tensor {
            data: Array::from_elem(IxDyn(shape), value),
        }
    }

    /// 使用固定种子创建随机张量（确保可重复性）
    pub fn new_random_seeded(min: f32, max: f32, shape: &[usize], seed: u64) -> Tensor {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::random_with_rng(min, max, shape, &mut rng)
    }
}

// 私有方法
impl Tensor {
    fn random_with_rng<R: Rng>(min: f32, max: f32, shape: &[usize], rng: &mut R) -> Tensor {
        let uniform = Uniform::from(min..=max);
        let data = (0..shape.iter().product::<usize>())
            .map(|_| uniform.sample(rng))
            .collect::<Vec<_>>();
        Tensor::from_vec(data, shape)
    }
}
