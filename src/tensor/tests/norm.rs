use approx::assert_abs_diff_eq;

use crate::tensor::{Lp, Tensor};

#[test]
fn test_batchwise_lp_norms() {
    // 2个样本，每个样本展平后为[3, -4]、[0, 1]
    let tensor = Tensor::new(&[3., -4., 0., 1.], &[2, 1, 2]);

    assert_eq!(tensor.batchwise_lp_norms(Lp::P(1)), vec![7., 1.]);
    assert_eq!(tensor.batchwise_lp_norms(Lp::P(2)), vec![5., 1.]);
    assert_eq!(tensor.batchwise_lp_norms(Lp::Inf), vec![4., 1.]);

    let l3 = tensor.batchwise_lp_norms(Lp::P(3));
    assert_abs_diff_eq!(l3[0], (27f32 + 64.).powf(1. / 3.), epsilon = 1e-5);
    assert_abs_diff_eq!(l3[1], 1., epsilon = 1e-6);
}

#[test]
fn test_summed_lp_norm() {
    let tensor = Tensor::new(&[3., -4., 0., 1.], &[2, 2]);
    assert_abs_diff_eq!(tensor.summed_lp_norm(Lp::P(2)), 6., epsilon = 1e-6);
    assert_abs_diff_eq!(tensor.summed_lp_norm(Lp::Inf), 5., epsilon = 1e-6);
    // 一维张量的每个样本即单个元素
    let angles = Tensor::new(&[0.5, -0.25], &[2]);
    assert_abs_diff_eq!(angles.summed_lp_norm(Lp::P(2)), 0.75, epsilon = 1e-6);
    assert_abs_diff_eq!(angles.summed_lp_norm(Lp::Inf), 0.75, epsilon = 1e-6);
}

#[test]
fn test_batchwise_lp_project_inf() {
    let tensor = Tensor::new(&[0.5, -0.05, -2., 0.1], &[2, 2]);
    let projected = tensor.batchwise_lp_project(Lp::Inf, 0.1);
    assert_eq!(projected, Tensor::new(&[0.1, -0.05, -0.1, 0.1], &[2, 2]));
}

#[test]
fn test_batchwise_lp_project_l2() {
    // 第0个样本范数为5，超出上界需缩放；第1个样本范数为0.5，保持不变
    let tensor = Tensor::new(&[3., 4., 0.3, -0.4], &[2, 2]);
    let projected = tensor.batchwise_lp_project(Lp::P(2), 1.);
    assert!(projected.abs_diff_eq(&Tensor::new(&[0.6, 0.8, 0.3, -0.4], &[2, 2]), 1e-6));
    for norm in projected.batchwise_lp_norms(Lp::P(2)) {
        assert!(norm <= 1. + 1e-6);
    }
}

#[test]
fn test_batchwise_lp_norm_grad() {
    let tensor = Tensor::new(&[3., -4., 0., 0.], &[2, 2]);

    let grad = tensor.batchwise_lp_norm_grad(Lp::P(2));
    assert!(grad.abs_diff_eq(&Tensor::new(&[0.6, -0.8, 0., 0.], &[2, 2]), 1e-6));

    let grad = tensor.batchwise_lp_norm_grad(Lp::P(1));
    assert_eq!(grad, Tensor::new(&[1., -1., 0., 0.], &[2, 2]));

    // 无穷范数的梯度只落在绝对值最大的元素上
    let grad = tensor.batchwise_lp_norm_grad(Lp::Inf);
    assert_eq!(grad, Tensor::new(&[0., -1., 0., 0.], &[2, 2]));
}

#[test]
fn test_batchwise_lp_norm_grad_matches_finite_difference() {
    let tensor = Tensor::new(
        &[0.3, -0.7, 0.2, 0.55, -0.9, 0.15, 0.4, -0.35, 0.05, 0.6, -0.25, 0.8],
        &[3, 4],
    );
    let eps = 1e-3;
    for lp in [Lp::P(1), Lp::P(2), Lp::P(3), Lp::Inf] {
        let grad = tensor.batchwise_lp_norm_grad(lp);
        for i in 0..3 {
            for j in 0..4 {
                let mut plus = tensor.clone();
                plus[[i, j]] += eps;
                let mut minus = tensor.clone();
                minus[[i, j]] -= eps;
                let numeric = (plus.summed_lp_norm(lp) - minus.summed_lp_norm(lp)) / (2. * eps);
                assert_abs_diff_eq!(grad[[i, j]], numeric, epsilon = 1e-2);
            }
        }
    }
}

#[test]
fn test_large_p_norm_without_underflow_or_overflow() {
    // 直接求`Σ|v_i|^p`时，前者下溢为0，后两者上溢为inf
    let small = Tensor::full(1e-3, &[1, 4]);
    assert_abs_diff_eq!(small.summed_lp_norm(Lp::P(16)) / 1e-3, 1.0905077, epsilon = 1e-5);

    let large = Tensor::new(&[100., -200.], &[1, 2]);
    assert_abs_diff_eq!(large.summed_lp_norm(Lp::P(30)), 200., epsilon = 1e-3);

    let huge = Tensor::new(&[1e30, -1e30], &[1, 2]);
    assert_abs_diff_eq!(huge.summed_lp_norm(Lp::P(20)) / 1e30, 1.0352649, epsilon = 1e-5);

    assert_eq!(Tensor::zeros(&[2, 3]).batchwise_lp_norms(Lp::P(30)), vec![0., 0.]);
}

#[test]
fn test_large_p_projection_and_grad() {
    let tensor = Tensor::full(0.01, &[2, 6]);
    for norm in tensor.batchwise_lp_norms(Lp::P(30)) {
        assert_abs_diff_eq!(norm, 0.010615449, epsilon = 1e-7);
    }

    let projected = tensor.batchwise_lp_project(Lp::P(30), 0.001);
    for norm in projected.batchwise_lp_norms(Lp::P(30)) {
        assert!(norm <= 0.001 * (1. + 1e-5), "{norm}");
    }
    assert!(projected.max_abs() <= 0.001);

    // 每个分量的梯度为`6^(-29/30)`，且满足`Σ v_i * g_i = norm`
    let grad = tensor.batchwise_lp_norm_grad(Lp::P(30));
    for g in grad.to_vec() {
        assert_abs_diff_eq!(g, 0.17692415, epsilon = 1e-5);
    }
    assert_abs_diff_eq!((&tensor * &grad).sum(), 2. * 0.010615449, epsilon = 1e-6);
}
