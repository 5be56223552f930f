/*
 * @Description  : 张量的四则运算，实现了两个张量“逐元素”（或张量与纯数）运算，并返回一个新的张量。
 *                 该运算支持以下情况：
 *                 1. 其中一个操作数为纯数而另一个为张量：则返回的张量形状与该张量相同。
 *                 2. 两个操作数均为张量：两者形状须严格一致，或其中之一为标量。
 *                 否则panic。
 */

use crate::errors::{Operator, TensorError};
use crate::tensor::Tensor;
use std::ops::{Add, Div, Mul, Sub};

impl Tensor {
    /// 两个张量逐元素运算的公共逻辑：形状一致时逐元素运算，其中之一为标量时广播该标量
    fn elementwise(
        &self,
        other: &Tensor,
        operator: Operator,
        f: impl Fn(f32, f32) -> f32,
    ) -> Tensor {
        if self.is_same_shape(other) {
            let mut data = self.data.clone();
            data.zip_mut_with(&other.data, |a, &b| *a = f(*a, b));
            Tensor { data }
        } else if let Some(rhs) = other.number() {
            Tensor {
                data: self.data.mapv(|a| f(a, rhs)),
            }
        } else if let Some(lhs) = self.number() {
            Tensor {
                data: other.data.mapv(|b| f(lhs, b)),
            }
        } else {
            panic!(
                "{}",
                TensorError::OperatorError {
                    operator,
                    tensor1_shape: self.shape().to_vec(),
                    tensor2_shape: other.shape().to_vec(),
                }
            )
        }
    }
}

macro_rules! impl_elementwise_op {
    ($trait:ident, $method:ident, $operator:expr, $f:expr) => {
        /*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓（不）带引用的张量 op（不）带引用的张量↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/
        impl $trait<&Tensor> for &Tensor {
            type Output = Tensor;

            fn $method(self, other: &Tensor) -> Tensor {
                self.elementwise(other, $operator, $f)
            }
        }
        impl $trait<Tensor> for Tensor {
            type Output = Tensor;

            fn $method(self, other: Tensor) -> Tensor {
                self.elementwise(&other, $operator, $f)
            }
        }
        impl $trait<&Tensor> for Tensor {
            type Output = Tensor;

            fn $method(self, other: &Tensor) -> Tensor {
                self.elementwise(other, $operator, $f)
            }
        }
        impl $trait<Tensor> for &Tensor {
            type Output = Tensor;

            fn $method(self, other: Tensor) -> Tensor {
                self.elementwise(&other, $operator, $f)
            }
        }
        /*↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑（不）带引用的张量 op（不）带引用的张量↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑*/

        /*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓（不）带引用的张量 op f32↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/
        impl $trait<f32> for &Tensor {
            type Output = Tensor;

            fn $method(self, scalar: f32) -> Tensor {
                let f = $f;
                Tensor {
                    data: self.data.mapv(|a| f(a, scalar)),
                }
            }
        }
        impl $trait<f32> for Tensor {
            type Output = Tensor;

            fn $method(self, scalar: f32) -> Tensor {
                $trait::$method(&self, scalar)
            }
        }
        /*↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑（不）带引用的张量 op f32↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑*/

        /*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓f32 op（不）带引用的张量↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/
        impl $trait<&Tensor> for f32 {
            type Output = Tensor;

            fn $method(self, tensor: &Tensor) -> Tensor {
                let f = $f;
                Tensor {
                    data: tensor.data.mapv(|b| f(self, b)),
                }
            }
        }
        impl $trait<Tensor> for f32 {
            type Output = Tensor;

            fn $method(self, tensor: Tensor) -> Tensor {
                $trait::$method(self, &tensor)
            }
        }
        /*↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑f32 op（不）带引用的张量↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑*/
    };
}

impl_elementwise_op!(Add, add, Operator::Add, |a: f32, b: f32| a + b);
impl_elementwise_op!(Sub, sub, Operator::Sub, |a: f32, b: f32| a - b);
impl_elementwise_op!(Mul, mul, Operator::Mul, |a: f32, b: f32| a * b);
impl_elementwise_op!(Div, div, Operator::Div, |a: f32, b: f32| {
    assert!(b != 0., "{}", TensorError::DivByZero);
    a / b
});
