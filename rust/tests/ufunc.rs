use shardnum::generators::{fractional_array, sequential_array};
use shardnum::ufunc::{self, BinaryOp, UnaryOp};
use shardnum::{ArrayError, DType, NdArray, SliceSpec};

#[test]
fn equal_into_its_own_float_input() {
    let a = fractional_array(&[4, 5]).unwrap();
    let expected: Vec<f64> = a
        .to_vec::<f64>()
        .iter()
        .map(|&v| if v == 0.5 { 1.0 } else { 0.0 })
        .collect();
    ufunc::binary_into(BinaryOp::Equal, &a, &NdArray::from(0.5), &a).unwrap();
    assert_eq!(a.to_vec::<f64>(), expected);
    assert_eq!(expected.iter().filter(|&&v| v == 1.0).count(), 1);
}

#[test]
fn logical_xor_of_boolean_arrays() {
    let a = NdArray::from(vec![true, true, false, false]);
    let b = NdArray::from(vec![true, false, true, false]);
    let result = ufunc::logical_xor(&a, &b).unwrap();
    assert_eq!(result.dtype(), DType::Bool);
    assert_eq!(result.to_vec::<bool>(), vec![false, true, true, false]);
}

#[test]
fn out_aliasing_a_transposed_view_matches_a_fresh_result() {
    let base = sequential_array(&[3, 3]).unwrap();
    let fresh = ufunc::add(&base, &base.t()).unwrap();

    ufunc::binary_into(BinaryOp::Add, &base, &base.t(), &base).unwrap();
    assert_eq!(base, fresh);
    assert_eq!(base.to_vec::<i64>(), vec![2, 6, 10, 6, 10, 14, 10, 14, 18]);
}

#[test]
fn unary_out_can_be_a_view_of_the_input() {
    let base = NdArray::from(vec![-1.0, -2.0, -3.0, -4.0]);
    let evens = base.slice(&[SliceSpec::new(None, None, 2)]).unwrap();
    ufunc::unary_into(UnaryOp::Absolute, &evens, &evens).unwrap();
    assert_eq!(base.to_vec::<f64>(), vec![1.0, -2.0, 3.0, -4.0]);
}

#[test]
fn in_place_integer_ops_refuse_float_results() {
    let x = sequential_array(&[2, 2]).unwrap();
    let err = ufunc::binary_into(BinaryOp::TrueDivide, &x, &NdArray::from(2i64), &x).unwrap_err();
    assert!(matches!(err, ArrayError::DTypeMismatch { .. }));
    assert_eq!(x.to_vec::<i64>(), vec![1, 2, 3, 4]);
}

#[test]
fn elementwise_catalogue() {
    let x = NdArray::from(vec![0.0, 1.0]);
    assert_eq!(ufunc::tanh(&x).unwrap().to_vec::<f64>()[0], 0.0);
    assert_eq!(ufunc::exp(&x).unwrap().to_vec::<f64>()[0], 1.0);
    assert_eq!(
        ufunc::greater(&x, &NdArray::from(0.5)).unwrap().to_vec::<bool>(),
        vec![false, true]
    );
    assert_eq!(
        ufunc::minimum(&x, &NdArray::from(0.5)).unwrap().to_vec::<f64>(),
        vec![0.0, 0.5]
    );
    assert_eq!(
        ufunc::subtract(&x, &NdArray::from(1i64)).unwrap().to_vec::<f64>(),
        vec![-1.0, 0.0]
    );
}
