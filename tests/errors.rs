use tenperm::{
    create_trans_graph, transpose, Layout, TensorShape, TensorView, TensorViewMut, TransError,
    TransOptions, TransposeParameters,
};

fn bind(
    in_sizes: &[usize],
    out_sizes: &[usize],
    perm: &[usize],
) -> Result<(), TransError> {
    let a = vec![0.0f64; in_sizes.iter().product()];
    let mut b = vec![0.0f64; out_sizes.iter().product()];
    TransposeParameters::new(
        TensorView::new(&a, in_sizes)?,
        TensorViewMut::new(&mut b, out_sizes)?,
        perm,
        1.0,
        0.0,
    )
    .map(|_| ())
}

#[test]
fn test_order_one_rejected() {
    let err = bind(&[5], &[5], &[0]).unwrap_err();
    assert!(matches!(err, TransError::InvalidOrder(1)));
}

#[test]
fn test_order_mismatch_rejected() {
    let err = bind(&[2, 3], &[3, 2, 1], &[1, 0]).unwrap_err();
    assert!(matches!(
        err,
        TransError::SizeLengthMismatch {
            expected: 2,
            found: 3
        }
    ));
}

#[test]
fn test_invalid_permutations_rejected() {
    for perm in [&[0, 0, 1][..], &[0, 1, 3], &[0, 1], &[2, 1, 0, 3]] {
        let err = bind(&[2, 3, 4], &[4, 3, 2], perm).unwrap_err();
        assert!(matches!(err, TransError::InvalidPermutation(_)), "{perm:?}");
    }
}

#[test]
fn test_output_shape_mismatch_rejected() {
    let err = bind(&[2, 3, 4], &[3, 2, 4], &[2, 1, 0]).unwrap_err();
    match err {
        TransError::OutputShapeMismatch { expected, found } => {
            assert_eq!(expected, vec![4, 3, 2]);
            assert_eq!(found, vec![3, 2, 4]);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_layout_mismatch_rejected() {
    let a = vec![0.0f64; 6];
    let mut b = vec![0.0f64; 6];
    let in_shape = TensorShape::new(&[2, 3], Layout::ColMajor).unwrap();
    let out_shape = TensorShape::new(&[3, 2], Layout::RowMajor).unwrap();
    let err = TransposeParameters::new(
        TensorView::with_shape(&a, in_shape).unwrap(),
        TensorViewMut::with_shape(&mut b, out_shape).unwrap(),
        &[1, 0],
        1.0,
        0.0,
    )
    .unwrap_err();
    assert!(matches!(err, TransError::LayoutMismatch));
}

#[test]
fn test_shape_errors() {
    assert!(matches!(
        TensorShape::new(&[3, 0, 2], Layout::ColMajor),
        Err(TransError::ZeroSize { dim: 1 })
    ));
    assert!(matches!(
        TensorShape::with_outer(&[4, 4], &[4, 3], &[], Layout::ColMajor),
        Err(TransError::OuterSizeTooSmall {
            dim: 1,
            size: 4,
            outer: 3
        })
    ));
    assert!(matches!(
        TensorShape::with_outer(&[2, 2], &[4, 4], &[0, 3], Layout::ColMajor),
        Err(TransError::OffsetOutOfRange { dim: 1, .. })
    ));
    assert!(matches!(
        TensorShape::with_outer(&[2, 2], &[4], &[], Layout::ColMajor),
        Err(TransError::SizeLengthMismatch {
            expected: 2,
            found: 1
        })
    ));
    assert!(matches!(
        TensorShape::new(&[usize::MAX, 3], Layout::ColMajor),
        Err(TransError::Overflow)
    ));
}

#[test]
fn test_buffer_too_small() {
    let a = vec![0.0f64; 5];
    assert!(matches!(
        TensorView::new(&a, &[2, 3]),
        Err(TransError::BufferTooSmall {
            required: 6,
            len: 5
        })
    ));
    let mut b = vec![0.0f64; 11];
    let shape = TensorShape::with_outer(&[2, 2], &[3, 4], &[1, 2], Layout::ColMajor).unwrap();
    assert!(matches!(
        TensorViewMut::with_shape(&mut b, shape),
        Err(TransError::BufferTooSmall {
            required: 12,
            len: 11
        })
    ));
}

#[test]
fn test_null_pointer_rejected() {
    let shape = TensorShape::new(&[2, 2], Layout::ColMajor).unwrap();
    let view = unsafe { TensorView::<f64>::from_raw(std::ptr::null(), shape.clone()) };
    assert!(matches!(view, Err(TransError::NullPointer)));
    let view_mut = unsafe { TensorViewMut::<f64>::from_raw(std::ptr::null_mut(), shape) };
    assert!(matches!(view_mut, Err(TransError::NullPointer)));
}

#[test]
fn test_raw_views_transpose() {
    let a: Vec<f32> = (0..6).map(|i| i as f32).collect();
    let mut b = vec![0.0f32; 6];
    let in_shape = TensorShape::new(&[3, 2], Layout::ColMajor).unwrap();
    let out_shape = TensorShape::new(&[2, 3], Layout::ColMajor).unwrap();
    let input = unsafe { TensorView::from_raw(a.as_ptr(), in_shape) }.unwrap();
    let output = unsafe { TensorViewMut::from_raw(b.as_mut_ptr(), out_shape) }.unwrap();
    let mut graph =
        create_trans_graph(input, output, &[1, 0], 1.0, 0.0, &TransOptions::default()).unwrap();
    graph.exec();
    assert_eq!(graph.output(), &[0.0, 3.0, 1.0, 4.0, 2.0, 5.0]);
}

#[test]
fn test_one_shot_validates() {
    let a = vec![0.0f64; 6];
    let mut b = vec![0.0f64; 6];
    assert!(matches!(
        transpose(&a, &mut b, &[2, 3], &[1, 1], 1.0, 0.0),
        Err(TransError::InvalidPermutation(_))
    ));
    assert!(matches!(
        transpose(&a, &mut b, &[6], &[0], 1.0, 0.0),
        Err(TransError::InvalidOrder(1))
    ));
    let mut short = vec![0.0f64; 4];
    assert!(matches!(
        transpose(&a, &mut short, &[2, 3], &[1, 0], 1.0, 0.0),
        Err(TransError::BufferTooSmall { .. })
    ));
}

#[test]
fn test_error_messages() {
    assert_eq!(
        TransError::InvalidOrder(1).to_string(),
        "tensor order must be larger than 1, got 1"
    );
    assert_eq!(
        TransError::InvalidPermutation(vec![0, 0]).to_string(),
        "invalid permutation [0, 0]"
    );
    assert_eq!(
        TransError::Allocation(16).to_string(),
        "failed to allocate 16 scratch elements"
    );
}
