/*
 * @Description  : 按批（首个维度）计算Lp范数、Lp球投影及范数的梯度。
 *                 每个样本先被展平成向量，再对该向量求范数。
 */

use std::fmt::{self, Display};

use crate::errors::{ComparisonOperator, TensorError};
use crate::tensor::Tensor;

/// Lp范数的类型：有限的正整数p，或无穷范数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lp {
    P(u32),
    Inf,
}

impl Display for Lp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lp::P(p) => write!(f, "L{p}"),
            Lp::Inf => write!(f, "L∞"),
        }
    }
}

impl Lp {
    /// 单个向量的Lp范数：有限p为`(Σ|v_i|^p)^(1/p)`，无穷范数为`max|v_i|`。
    /// p≥2时先除以`max|v_i|`再求幂，大p下分量过小或过大也不会下溢为0或上溢为inf
    pub fn vector_norm(&self, v: &[f32]) -> f32 {
        let max_abs = v.iter().fold(0., |acc: f32, x| acc.max(x.abs()));
        match *self {
            Lp::Inf => max_abs,
            Lp::P(1) => v.iter().map(|x| x.abs()).sum(),
            Lp::P(p) => {
                assert_positive(p);
                if max_abs == 0. {
                    return 0.;
                }
                let scaled = v.iter().map(|x| x.abs() / max_abs);
                let root = if p == 2 {
                    scaled.map(|x| x * x).sum::<f32>().sqrt()
                } else {
                    let p = p as f32;
                    scaled.map(|x| x.powf(p)).sum::<f32>().powf(1. / p)
                };
                max_abs * root
            }
        }
    }

    /// 单个向量Lp范数对各分量的梯度。范数为0处取梯度为0（次梯度之一）；
    /// 无穷范数的梯度只落在绝对值最大的（首个）分量上。
    /// 有限p时`|v_i| / norm ≤ 1`，求幂只可能下溢到0，不会上溢。
    fn vector_norm_grad(&self, v: &[f32]) -> Vec<f32> {
        let norm = self.vector_norm(v);
        let mut grad = vec![0.; v.len()];
        if norm == 0. {
            return grad;
        }
        match *self {
            Lp::Inf => {
                if let Some((k, x)) = v
                    .iter()
                    .enumerate()
                    .find(|(_, x)| x.abs() == norm)
                {
                    grad[k] = x.signum();
                }
            }
            Lp::P(p) => {
                assert_positive(p);
                let p = p as f32;
                for (g, x) in grad.iter_mut().zip(v) {
                    if *x != 0. {
                        *g = x.signum() * (x.abs() / norm).powf(p - 1.);
                    }
                }
            }
        }
        grad
    }
}

fn assert_positive(p: u32) {
    assert!(
        p > 0,
        "{}",
        TensorError::ValueMustSatisfyComparison {
            value_name: "p".to_string(),
            operator: ComparisonOperator::GreaterThan,
            threshold: 0,
        }
    );
}

impl Tensor {
    /// 每个样本（沿首个维度）展平后的Lp范数，长度为批大小
    pub fn batchwise_lp_norms(&self, lp: Lp) -> Vec<f32> {
        self.batch_chunks()
            .iter()
            .map(|chunk| lp.vector_norm(chunk))
            .collect()
    }

    /// 每个样本的Lp范数之和，即整个批的“总扰动量”
    pub fn summed_lp_norm(&self, lp: Lp) -> f32 {
        self.batchwise_lp_norms(lp).iter().sum()
    }

    /// 将每个样本投影到以原点为中心、半径为`bound`的Lp球内：
    /// 无穷范数时逐元素夹到`[-bound, bound]`；有限p时，范数超出`bound`的样本整体缩放到球面上。
    pub fn batchwise_lp_project(&self, lp: Lp, bound: f32) -> Tensor {
        if let Lp::Inf = lp {
            return self.clamp(-bound, bound);
        }
        let data = self
            .batch_chunks()
            .into_iter()
            .flat_map(|chunk| {
                let norm = lp.vector_norm(&chunk);
                let scale = if norm > bound { bound / norm } else { 1. };
                chunk.into_iter().map(move |x| x * scale)
            })
            .collect::<Vec<_>>();
        Tensor::from_vec(data, self.shape())
    }

    /// `batchwise_lp_norms`的梯度：每个样本的范数对该样本各元素的偏导，形状与`self`一致。
    /// 由于各样本范数之和对某样本元素的偏导只与该样本有关，故这同时也是`summed_lp_norm`的梯度。
    pub fn batchwise_lp_norm_grad(&self, lp: Lp) -> Tensor {
        let data = self
            .batch_chunks()
            .iter()
            .flat_map(|chunk| lp.vector_norm_grad(chunk))
            .collect::<Vec<_>>();
        Tensor::from_vec(data, self.shape())
    }

    /// 按样本切分出的展平数据
    fn batch_chunks(&self) -> Vec<Vec<f32>> {
        assert!(self.dimension() >= 1, "{}", TensorError::IncompatibleShape);
        let batch_size = self.batch_size();
        if batch_size == 0 {
            return Vec::new();
        }
        let chunk_len = self.size() / batch_size;
        let data = self.to_vec();
        if chunk_len == 0 {
            return vec![Vec::new(); batch_size];
        }
        data.chunks(chunk_len).map(<[f32]>::to_vec).collect()
    }
}
