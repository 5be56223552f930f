/*
 * @Description  : 端到端测试：用符号梯度上升构造空间扰动（扭曲后的图像使一个玩具损失最大），
 *                 每步后把参数投影回约束范围，并按样本保留迄今损失最大的变换。
 *
 * 玩具损失为`sum(warped * template)`，其对扭曲后图像的梯度恒为`template`。
 * 图像为沿宽度方向的线性斜坡，`template`只覆盖内部像素，故损失对平移量是线性的，结果可精确预期。
 */

use approx::assert_abs_diff_eq;
use only_warp::{ImgShape, Lp, Tensor, TraitXform, Xform, XformError, XformKind};

const H: usize = 8;
const W: usize = 8;

/// 样本0为递增斜坡（列号），样本1为递减斜坡（7 - 列号）
fn ramp_images() -> Tensor {
    let mut images = Tensor::zeros(&[2, 1, H, W]);
    for i in 0..H {
        for j in 0..W {
            images[[0, 0, i, j]] = j as f32;
            images[[1, 0, i, j]] = (W - 1 - j) as f32;
        }
    }
    images
}

/// 只在第1~6行、第1~5列为1
fn interior_template() -> Tensor {
    let mut template = Tensor::zeros(&[2, 1, H, W]);
    for b in 0..2 {
        for i in 1..=6 {
            for j in 1..=5 {
                template[[b, 0, i, j]] = 1.;
            }
        }
    }
    template
}

fn per_example_losses(warped: &Tensor, template: &Tensor) -> Vec<f32> {
    let weighted = warped * template;
    (0..weighted.batch_size())
        .map(|b| weighted.batch_item(b).sum())
        .collect()
}

/// 运行`steps`步符号梯度上升，返回各样本损失最大的变换及其损失
fn signed_gradient_attack(
    kind: XformKind,
    images: &Tensor,
    template: &Tensor,
    step_size: f32,
    lp_bound: f32,
    steps: usize,
) -> Result<(Xform, Vec<f32>), XformError> {
    let shape = ImgShape::try_from(images.shape())?;
    let mut xform = Xform::new(kind, shape);
    let mut best = xform.clone();
    let mut best_losses = per_example_losses(&best.forward(images)?, template);

    for _ in 0..steps {
        xform.params_mut().zero_grad();
        xform.backward(images, template)?;
        let step = match xform.params().grad() {
            Some(grad) => grad.sign() * step_size,
            None => break,
        };
        let updated = xform.params().value() + &step;
        xform.set_params(&updated)?;
        xform.project_params(Lp::Inf, lp_bound)?;

        let losses = per_example_losses(&xform.forward(images)?, template);
        let improved = losses
            .iter()
            .zip(&best_losses)
            .map(|(now, best)| now > best)
            .collect::<Vec<_>>();
        best = xform.merge_xform(&best, &improved)?;
        for (best_loss, loss) in best_losses.iter_mut().zip(losses) {
            *best_loss = best_loss.max(loss);
        }
    }
    Ok((best, best_losses))
}

#[test]
fn test_translation_attack_reaches_bound() -> Result<(), XformError> {
    let images = ramp_images();
    let template = interior_template();
    let identity_losses = per_example_losses(&images, &template);
    assert_abs_diff_eq!(identity_losses[0], 90.);
    assert_abs_diff_eq!(identity_losses[1], 120.);

    let (best, best_losses) =
        signed_gradient_attack(XformKind::Translation, &images, &template, 0.1, 0.2, 5)?;

    // 宽度为8时，归一化平移0.2即0.7个像素；两个斜坡分别向相反方向平移
    assert!(
        best.params()
            .value()
            .abs_diff_eq(&Tensor::new(&[0.2, 0., -0.2, 0.], &[2, 2]), 1e-6)
    );
    assert_abs_diff_eq!(best_losses[0], 90. + 30. * 0.7, epsilon = 1e-3);
    assert_abs_diff_eq!(best_losses[1], 120. + 30. * 0.7, epsilon = 1e-3);
    assert_abs_diff_eq!(best.norm(Lp::Inf)?, 0.4, epsilon = 1e-6);

    let replayed = per_example_losses(&best.forward(&images)?, &template);
    assert_abs_diff_eq!(replayed[0], best_losses[0], epsilon = 1e-3);
    assert_abs_diff_eq!(replayed[1], best_losses[1], epsilon = 1e-3);
    Ok(())
}

#[test]
fn test_flow_field_attack_stays_within_bound() -> Result<(), XformError> {
    let images = ramp_images();
    let template = interior_template();
    let identity_losses = per_example_losses(&images, &template);

    let (best, best_losses) =
        signed_gradient_attack(XformKind::FullSpatial, &images, &template, 0.05, 0.1, 4)?;

    let deviation = best.params().value() - &best.identity();
    assert!(deviation.max_abs() <= 0.1 + 1e-6);
    assert!(best.params().value().max_abs() <= 1.);
    for (best_loss, identity_loss) in best_losses.iter().zip(&identity_losses) {
        assert!(best_loss > identity_loss);
    }
    Ok(())
}
