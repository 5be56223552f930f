use std::fmt::{self, Display};

use super::XformError;
use crate::errors::{ComparisonOperator, TensorError};

/// 图像批的形状`(N, C, H, W)`，构造后不可变。
/// 它决定了变换实例的批大小和空间尺寸，也决定了各变换参数的形状。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImgShape {
    pub n: usize,
    pub c: usize,
    pub h: usize,
    pub w: usize,
}

impl ImgShape {
    /// 各维均须大于0，否则会panic
    pub fn new(n: usize, c: usize, h: usize, w: usize) -> Self {
        for (value_name, value) in [("n", n), ("c", c), ("h", h), ("w", w)] {
            assert!(
                value > 0,
                "{}",
                TensorError::ValueMustSatisfyComparison {
                    value_name: value_name.to_string(),
                    operator: ComparisonOperator::GreaterThan,
                    threshold: 0,
                }
            );
        }
        Self { n, c, h, w }
    }

    pub fn dims(&self) -> [usize; 4] {
        [self.n, self.c, self.h, self.w]
    }

    pub fn batch_size(&self) -> usize {
        self.n
    }
}

impl Display for ImgShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}, {}]", self.n, self.c, self.h, self.w)
    }
}

impl From<[usize; 4]> for ImgShape {
    fn from([n, c, h, w]: [usize; 4]) -> Self {
        Self::new(n, c, h, w)
    }
}

impl TryFrom<&[usize]> for ImgShape {
    type Error = XformError;

    /// 从任意张量形状构造，非4阶或含0的形状返回`TypeMisuse`
    fn try_from(shape: &[usize]) -> Result<Self, Self::Error> {
        match *shape {
            [n, c, h, w] if shape.iter().all(|&d| d > 0) => Ok(Self { n, c, h, w }),
            _ => Err(XformError::TypeMisuse(format!(
                "图像批的形状须为非空的[N, C, H, W]，实际为{shape:?}"
            ))),
        }
    }
}
