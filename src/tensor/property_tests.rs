//! Property-based tests for shapes, sub-views and transforms
//!
//! Random extents and spans are checked against the plain nested-loop
//! definition of each operation.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::tensor::core::{Tensor, TensorView};
    use crate::tensor::shape::{DynamicShape, Shape};
    use crate::tensor::span::Span;
    use crate::tensor::storage::Storage;

    fn extents3() -> impl Strategy<Value = [usize; 3]> {
        [1usize..6, 1usize..6, 1usize..6]
    }

    // May be empty
    fn span_within(extent: usize) -> impl Strategy<Value = Span> {
        (0..extent, 1usize..4).prop_flat_map(move |(begin, stride)| {
            (begin..=extent).prop_map(move |end| Span::with_stride(begin, end, stride))
        })
    }

    // At least one full step fits, so the span visits something
    fn nonempty_span(extent: usize) -> impl Strategy<Value = Span> {
        (1usize..4).prop_flat_map(move |stride| {
            let stride = stride.min(extent);
            (0..=extent - stride).prop_flat_map(move |begin| {
                (begin + stride..=extent).prop_map(move |end| Span::with_stride(begin, end, stride))
            })
        })
    }

    fn sliced() -> impl Strategy<Value = ([usize; 3], [Span; 3])> {
        extents3().prop_flat_map(|e| {
            (Just(e), [span_within(e[0]), span_within(e[1]), span_within(e[2])])
        })
    }

    fn nested() -> impl Strategy<Value = ([usize; 3], [Span; 3], [Span; 3])> {
        extents3()
            .prop_flat_map(|e| {
                (Just(e), [nonempty_span(e[0]), nonempty_span(e[1]), nonempty_span(e[2])])
            })
            .prop_flat_map(|(e, outer)| {
                (
                    Just(e),
                    Just(outer),
                    [
                        nonempty_span(outer[0].len()),
                        nonempty_span(outer[1].len()),
                        nonempty_span(outer[2].len()),
                    ],
                )
            })
    }

    fn positions(span: Span) -> Vec<usize> {
        (0..span.len()).map(|i| span.begin + i * span.stride).collect()
    }

    fn iota(e: [usize; 3]) -> Vec<usize> {
        (0..e.iter().product()).collect()
    }

    #[test]
    fn test_proptest_smoke() {
        let shape = DynamicShape::new([2, 3, 4]).unwrap();
        assert_eq!(shape.evaluate((1, 2, 3)).unwrap().offset, 1 + 2 * 2 + 3 * 6);
    }

    proptest! {
        #[test]
        fn prop_evaluate_is_a_bijection(e in extents3()) {
            let shape = DynamicShape::new(e).unwrap();
            let mut offsets = Vec::new();
            for z in 0..e[2] {
                for y in 0..e[1] {
                    for x in 0..e[0] {
                        offsets.push(shape.evaluate([x, y, z]).unwrap().offset);
                    }
                }
            }
            offsets.sort_unstable();
            prop_assert_eq!(offsets, (0..shape.len()).collect::<Vec<_>>());
        }

        #[test]
        fn prop_flat_to_offset_round_trips(e in extents3()) {
            let shape = DynamicShape::new(e).unwrap();
            for z in 0..e[2] {
                for y in 0..e[1] {
                    for x in 0..e[0] {
                        let offset = shape.evaluate([x, y, z]).unwrap().offset;
                        prop_assert_eq!(shape.flat_to_offset(offset).unwrap(), offset);
                    }
                }
            }
        }

        #[test]
        fn prop_strided_iteration_visits_nested_loop((e, spans) in sliced()) {
            let data = iota(e);
            let t = TensorView::new(&data, e).unwrap();
            let sub = t.at((spans[0], spans[1], spans[2])).unwrap();

            let mut expected = Vec::new();
            for &z in &positions(spans[2]) {
                for &y in &positions(spans[1]) {
                    for &x in &positions(spans[0]) {
                        expected.push(x + e[0] * (y + e[1] * z));
                    }
                }
            }
            prop_assert_eq!(sub.len(), expected.len());
            prop_assert_eq!(sub.iter().unwrap().copied().collect::<Vec<_>>(), expected);
        }

        #[test]
        fn prop_subview_of_subview_is_composite((e, outer, inner) in nested()) {
            let data = iota(e);
            let t = TensorView::new(&data, e).unwrap();
            let first = t.at((outer[0], outer[1], outer[2])).unwrap();
            let second = first.at((inner[0], inner[1], inner[2])).unwrap();

            let coord = |axis: usize, i: usize| {
                outer[axis].begin + (inner[axis].begin + i * inner[axis].stride) * outer[axis].stride
            };
            let mut expected = Vec::new();
            for k in 0..inner[2].len() {
                for j in 0..inner[1].len() {
                    for i in 0..inner[0].len() {
                        expected.push(*t.at((coord(0, i), coord(1, j), coord(2, k))).unwrap());
                    }
                }
            }
            prop_assert_eq!(second.iter().unwrap().copied().collect::<Vec<_>>(), expected);
        }

        #[test]
        fn prop_reshape_is_idempotent(e in [1usize..8, 1usize..8], target in [1usize..8, 1usize..8]) {
            let mut t: Tensor<u8, 2> = Tensor::new(e).unwrap();
            t.reshape(target).unwrap();
            let once = t.clone();
            t.reshape(target).unwrap();
            prop_assert_eq!(t.extents(), target);
            prop_assert_eq!(t.len(), target[0] * target[1]);
            prop_assert_eq!(t.as_slice(), once.as_slice());
        }

        #[test]
        fn prop_transform_chain_composes(
            data in prop::collection::vec(-1000i64..1000, 1..40),
            a in -10i64..10,
            b in -5i64..5,
            c in -10i64..10,
        ) {
            let len = data.len();
            let t = TensorView::new(&data, [len]).unwrap();
            let first = t.map(move |x| x + a);
            let second = first.map(move |x| x * b);
            let third = second.map(move |x| x - c);
            prop_assert_eq!(third.storage().inner().len(), len);
            for (i, &x) in data.iter().enumerate() {
                prop_assert_eq!(third.get(i).unwrap(), (x + a) * b - c);
            }
        }
    }

    #[cfg(any(debug_assertions, feature = "bounds-check"))]
    proptest! {
        #[test]
        fn prop_one_past_the_end_names_axis(e in extents3(), axis in 0usize..3) {
            let t: Tensor<u8, 3> = Tensor::new(e).unwrap();
            let mut coords = [0; 3];
            coords[axis] = e[axis];
            prop_assert_eq!(t.at(coords).unwrap_err().axis(), Some(axis));

            let mut spans = [Span::new(0, 1); 3];
            spans[axis] = Span::new(0, e[axis] + 1);
            let err = t.at((spans[0], spans[1], spans[2])).unwrap_err();
            prop_assert_eq!(err.axis(), Some(axis));
        }
    }
}
