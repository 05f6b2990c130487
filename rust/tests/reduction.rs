use num_complex::Complex64;
use shardnum::reduce::{self, Axis, ReduceOp};
use shardnum::{DType, NdArray, Scalar};

fn base_cube() -> NdArray {
    NdArray::from_vec(
        vec![
            0i64, 1, 1, 1, 7, 0, 1, 0, 0, 1, //
            3, 0, 0, 3, 0, 0, 2, 2, 0, 19,
        ],
        &[2, 5, 2],
    )
    .unwrap()
}

fn scalar(array: NdArray) -> Scalar {
    array.item().unwrap()
}

#[test]
fn small_inputs_match_numpy() {
    let empty = NdArray::from(Vec::<f64>::new());
    assert_eq!(scalar(reduce::sum(&empty, Axis::All, false).unwrap()), Scalar::Float(0.0));

    let two_empty_rows = NdArray::zeros(&[2, 0], DType::Float64);
    assert_eq!(
        scalar(reduce::sum(&two_empty_rows, Axis::All, false).unwrap()),
        Scalar::Float(0.0)
    );

    assert_eq!(
        scalar(reduce::sum(&NdArray::from(vec![1i64]), Axis::All, false).unwrap()),
        Scalar::Int(1)
    );
    assert_eq!(
        scalar(reduce::sum(&NdArray::from(vec![0i64]), Axis::All, false).unwrap()),
        Scalar::Int(0)
    );
    assert_eq!(
        scalar(reduce::sum(&NdArray::from(1i64), Axis::All, false).unwrap()),
        Scalar::Int(1)
    );
    assert_eq!(
        scalar(reduce::sum(&NdArray::eye(3), Axis::All, false).unwrap()),
        Scalar::Float(3.0)
    );

    let x = NdArray::from(vec![1.0, 2.0, 3.0, 4.0]);
    let sum = reduce::sum(&x, Axis::All, false).unwrap();
    let add = reduce::reduce(ReduceOp::Add, &x, &Axis::All, false).unwrap();
    assert_eq!(sum, add);
    assert_eq!(scalar(sum), Scalar::Float(10.0));

    let x = NdArray::from(vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    assert_eq!(scalar(reduce::prod(&x, Axis::All, false).unwrap()), Scalar::Float(120.0));

    let x = NdArray::from(vec![1i64, 0, 2, -1, 0, 0, 8]);
    assert_eq!(scalar(reduce::sum(&x, Axis::All, false).unwrap()), Scalar::Int(10));

    let x = NdArray::from_vec(vec![0i64, 1, 0, 2, 0, 3], &[2, 3]).unwrap();
    assert_eq!(scalar(reduce::sum(&x, Axis::All, false).unwrap()), Scalar::Int(6));
}

#[test]
fn three_dimensional_axes() {
    let x = base_cube();
    assert_eq!(
        reduce::sum(&x, 0, false).unwrap().to_vec::<i64>(),
        vec![3, 1, 1, 4, 7, 0, 3, 2, 0, 20]
    );
    let by_rows = reduce::sum(&x, 1, false).unwrap();
    assert_eq!(by_rows.shape(), &[2, 2]);
    assert_eq!(by_rows.to_vec::<i64>(), vec![9, 3, 5, 24]);
    assert_eq!(
        reduce::sum(&x, 2, false).unwrap().to_vec::<i64>(),
        vec![1, 2, 7, 1, 1, 3, 3, 0, 4, 19]
    );
    assert_eq!(scalar(reduce::sum(&x, Axis::All, false).unwrap()), Scalar::Int(41));
}

#[test]
fn axis_inflated_two_thousand_times() {
    let base = base_cube();
    let copies: Vec<&NdArray> = std::iter::repeat(&base).take(2000).collect();
    let x = NdArray::concatenate(&copies, 1).unwrap();
    assert_eq!(x.shape(), &[2, 10_000, 2]);

    let axis0 = reduce::sum(&x, 0, false).unwrap();
    assert_eq!(axis0.shape(), &[10_000, 2]);
    let base_axis0 = reduce::sum(&base, 0, false).unwrap().to_vec::<i64>();
    let expected: Vec<i64> = base_axis0.iter().copied().cycle().take(20_000).collect();
    assert_eq!(axis0.to_vec::<i64>(), expected);

    let axis1 = reduce::sum(&x, 1, false).unwrap();
    assert_eq!(axis1.to_vec::<i64>(), vec![18_000, 6_000, 10_000, 48_000]);

    let axis2 = reduce::sum(&x, 2, false).unwrap();
    assert_eq!(axis2.shape(), &[2, 10_000]);
    let row0: Vec<i64> = axis2.to_vec::<i64>()[..10].to_vec();
    assert_eq!(row0, vec![1, 2, 7, 1, 1, 1, 2, 7, 1, 1]);

    assert_eq!(scalar(reduce::sum(&x, Axis::All, false).unwrap()), Scalar::Int(82_000));
}

#[test]
fn keepdims_keeps_reduced_axes_as_singletons() {
    let x = base_cube();
    for axis in 0..3isize {
        let kept = reduce::sum(&x, axis, true).unwrap();
        let dropped = reduce::sum(&x, axis, false).unwrap();
        let mut shape = x.shape().to_vec();
        shape[axis as usize] = 1;
        assert_eq!(kept.shape(), &shape[..]);
        assert_eq!(kept.to_vec::<i64>(), dropped.to_vec::<i64>());
    }
}

#[test]
fn many_axes_equal_repeated_single_axis_reductions() {
    let x = base_cube();
    let both = reduce::sum(&x, Axis::Many(vec![0, 2]), false).unwrap();
    let repeated = reduce::sum(&reduce::sum(&x, 2, false).unwrap(), 0, false).unwrap();
    assert_eq!(both, repeated);
    assert_eq!(both.to_vec::<i64>(), vec![4, 5, 7, 5, 20]);
}

#[test]
fn reductions_of_views_and_random_data_agree_with_a_plain_sum() {
    let values: Vec<f64> = (0..100)
        .map(|i| if i % 5 == 0 { 0.0 } else { ((i * 37) % 101) as f64 / 7.0 - 6.0 })
        .collect();
    let expected: f64 = values.iter().sum();
    let flat = NdArray::from(values);
    let total = reduce::sum(&flat, Axis::All, false).unwrap();
    assert!(total.allclose(&NdArray::from(expected), 1e-12, 1e-12));

    let square = flat.reshape(&[10, 10]).unwrap();
    let transposed_total = reduce::sum(&square.t(), Axis::All, false).unwrap();
    assert!(transposed_total.allclose(&NdArray::from(expected), 1e-12, 1e-12));
}

#[test]
fn extrema_and_logical_reductions() {
    let x = NdArray::from_vec(vec![3i64, -1, 4, 1, -5, 9], &[2, 3]).unwrap();
    assert_eq!(reduce::max(&x, 1, false).unwrap().to_vec::<i64>(), vec![4, 9]);
    assert_eq!(reduce::min(&x, 0, false).unwrap().to_vec::<i64>(), vec![1, -5, 4]);

    let flags = NdArray::from(vec![true, false, true]);
    let parity = reduce::reduce(ReduceOp::LogicalXor, &flags, &Axis::All, false).unwrap();
    assert_eq!(scalar(parity), Scalar::Bool(false));

    let empty = NdArray::zeros(&[0], DType::Int64);
    assert!(reduce::min(&empty, Axis::All, false).is_err());
    assert_eq!(
        scalar(reduce::any(&empty, Axis::All, false).unwrap()),
        Scalar::Bool(false)
    );
}

#[test]
fn invalid_axes_are_rejected() {
    let x = base_cube();
    assert!(reduce::sum(&x, 3, false).is_err());
    assert!(reduce::sum(&x, -4, false).is_err());
    assert!(reduce::sum(&x, Axis::Many(vec![1, 1]), false).is_err());
    assert!(reduce::sum(&NdArray::from(2.5), 0, false).is_err());
}

#[test]
fn float_sums_keep_infinities_and_signed_zeros() {
    let total = reduce::sum(&NdArray::from(vec![f64::INFINITY, 1.0]), Axis::All, false).unwrap();
    assert_eq!(scalar(total), Scalar::Float(f64::INFINITY));

    let opposed = vec![f64::INFINITY, f64::NEG_INFINITY];
    let total = reduce::sum(&NdArray::from(opposed), Axis::All, false).unwrap();
    assert!(scalar(total).to_f64().is_nan());

    let total = reduce::sum(&NdArray::from(vec![-0.0]), Axis::All, false).unwrap();
    assert!(scalar(total).to_f64().is_sign_negative());

    let rows = NdArray::from_vec(vec![1.0, f64::INFINITY, 2.0, 3.0], &[2, 2]).unwrap();
    let per_row = reduce::sum(&rows, 1, false).unwrap();
    assert_eq!(per_row.to_vec::<f64>(), vec![f64::INFINITY, 5.0]);
}

#[test]
fn complex_sums_with_an_infinite_component() {
    let lane = vec![
        Complex64::new(f64::INFINITY, 1.0),
        Complex64::new(1.0, 2.0),
        Complex64::new(-3.0, 0.5),
    ];
    let total = reduce::sum(&NdArray::from(lane), Axis::All, false).unwrap();
    assert_eq!(
        scalar(total),
        Scalar::Complex(Complex64::new(f64::INFINITY, 3.5))
    );
}
