use crate::assert_panic;
use crate::errors::TensorError;
use crate::tensor::Tensor;

#[test]
fn test_clamp_is_idempotent() {
    let tensor = Tensor::new(&[-1.5, -0.2, 0.7, 3.], &[4]);
    let once = tensor.clamp(-1., 1.);
    assert_eq!(once, Tensor::new(&[-1., -0.2, 0.7, 1.], &[4]));
    assert_eq!(once.clamp(-1., 1.), once);
}

#[test]
fn test_clamp_ref() {
    let tensor = Tensor::new(&[0.5, 0.05, -1., 0.], &[2, 2]);
    let reference = Tensor::new(&[0., 0., -0.5, 0.2], &[2, 2]);
    let clamped = tensor.clamp_ref(&reference, 0.1);
    assert!(clamped.abs_diff_eq(&Tensor::new(&[0.1, 0.05, -0.6, 0.1], &[2, 2]), 1e-6));
}

#[test]
fn test_sign_and_max_abs() {
    let tensor = Tensor::new(&[-2., 0., 0.5], &[3]);
    assert_eq!(tensor.sign(), Tensor::new(&[-1., 0., 1.], &[3]));
    assert_eq!(tensor.max_abs(), 2.);
    assert_eq!(tensor.abs().sum(), 2.5);
}

#[test]
fn test_fold_mask() {
    let a = Tensor::new(&[1., 1., 2., 2., 3., 3.], &[3, 2]);
    let b = Tensor::new(&[-1., -1., -2., -2., -3., -3.], &[3, 2]);
    let folded = a.fold_mask(&b, &[true, false, true]);
    assert_eq!(folded, Tensor::new(&[1., 1., -2., -2., 3., 3.], &[3, 2]));
    // 输入不受影响
    assert_eq!(a, Tensor::new(&[1., 1., 2., 2., 3., 3.], &[3, 2]));
}

#[test]
fn test_fold_mask_with_wrong_mask_length() {
    let a = Tensor::zeros(&[2, 3]);
    let b = Tensor::ones(&[2, 3]);
    assert_panic!(
        a.fold_mask(&b, &[true]),
        TensorError::MaskLengthMismatch {
            mask_len: 1,
            batch_size: 2
        }
    );
}

#[test]
fn test_abs_diff_eq() {
    let a = Tensor::new(&[1., 2.], &[2]);
    let b = Tensor::new(&[1. + 1e-7, 2. - 1e-7], &[2]);
    assert!(a.abs_diff_eq(&b, 1e-5));
    assert!(!a.abs_diff_eq(&(&b + 1.), 1e-5));
    assert!(!a.abs_diff_eq(&Tensor::new(&[1., 2.], &[1, 2]), 1e-5));
}
