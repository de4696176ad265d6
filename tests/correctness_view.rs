//! View-algebra correctness: round trips, aliasing, zero-size behavior.

use stridense::{Matrix2, Matrix3, Property, Vector};

fn iota(rows: usize, cols: usize) -> Matrix2<f64> {
    Matrix2::from_fn([rows, cols], |[i, j]| (i * cols + j) as f64)
}

#[test]
fn test_flip_round_trip() {
    let m = iota(5, 7);
    let back = m.flip(0).unwrap().flip(0).unwrap();
    assert!(Property::default().equals(&back, &m));
    let back = m.flip(1).unwrap().flip(1).unwrap();
    assert!(Property::default().equals(&back, &m));
}

#[test]
fn test_dice_round_trip() {
    let m = iota(4, 6);
    assert!(Property::default().equals(&m.t().t(), &m));
    let p = Matrix3::from_fn([2, 3, 4], |[s, r, c]| (s * 100 + r * 10 + c) as f64);
    let back = p.permute([2, 0, 1]).permute([1, 2, 0]);
    for s in 0..2 {
        for r in 0..3 {
            for c in 0..4 {
                assert_eq!(back.get([s, r, c]), p.get([s, r, c]));
            }
        }
    }
}

#[test]
fn test_part_matches_sub_region() {
    let m = iota(6, 6);
    let p = m.part([1, 2], [3, 2]).unwrap();
    for i in 0..3 {
        for j in 0..2 {
            assert_eq!(p.get([i, j]), m.get([i + 1, j + 2]));
        }
    }
}

#[test]
fn test_strides_of_flip_composition() {
    let v = Vector::from_fn([12], |[i]| i as f64);
    let w = v.flip(0).unwrap().step_by([3]).unwrap();
    // flipped: 11..0, every 3rd: 11, 8, 5, 2
    assert_eq!(w.size(), [4]);
    assert_eq!(w.to_vec(), vec![11.0, 8.0, 5.0, 2.0]);
    // Flipping the subsampled view recovers ascending order.
    assert_eq!(w.flip(0).unwrap().to_vec(), vec![2.0, 5.0, 8.0, 11.0]);
}

#[test]
fn test_deep_view_composition_against_direct_indexing() {
    let m = iota(8, 8);
    // part -> dice -> flip -> step, checked cell by cell.
    let view = m
        .part([2, 1], [5, 6])
        .unwrap()
        .t()
        .flip(0)
        .unwrap()
        .step_by([2, 1])
        .unwrap();
    // After part: p[i][j] = m[2+i][1+j], 5x6. After t: 6x5. After flip(0):
    // row r of the 6 reversed. After step 2 on axis 0: rows 0,2,4 of that.
    for r in 0..3 {
        for c in 0..5 {
            let orig_col = 5 - 2 * r; // flipped then stepped axis
            assert_eq!(view.get([r, c]), m.get([2 + c, 1 + orig_col]));
        }
    }
}

#[test]
fn test_selection_shares_storage_and_writes_through() {
    let mut m = iota(4, 4);
    let sel = m.select([Some(&[3, 1]), Some(&[0, 2])]).unwrap();
    assert!(sel.shares_storage(&m));
    assert_eq!(sel.get([0, 1]), m.get([3, 2]));

    let mut row_view = m.row(3).unwrap();
    row_view.set([2], -1.0);
    assert_eq!(sel.get([0, 1]), -1.0);
}

#[test]
fn test_assign_from_aliased_dice_view() {
    // The aliasing law: assigning a matrix from its own transposed view
    // equals materializing the transpose first.
    let mut a = iota(5, 5);
    let expected = a.t().duplicate();
    let at = a.t();
    a.assign(&at).unwrap();
    assert!(Property::default().equals(&a, &expected));
}

#[test]
fn test_assign_from_aliased_overlapping_part() {
    let mut v = Vector::from_fn([6], |[i]| i as f64);
    let shifted = v.part([1], [5]).unwrap();
    let expected = shifted.duplicate();
    let mut head = v.part([0], [5]).unwrap();
    head.assign(&shifted).unwrap();
    for i in 0..5 {
        assert_eq!(head.get([i]), expected.get([i]));
    }
}

#[test]
fn test_zero_size_matrix_behavior() {
    let empty = Matrix2::<f64>::zeros([0, 4]);
    assert!(empty.is_empty());
    assert!(empty.aggregate(|a, b| a + b, |x| x).is_nan());
    assert_eq!(empty.cardinality(), 0);
    assert!(empty.non_zeros().is_empty());

    let empty_sel = iota(3, 3).select([Some(&[]), None]).unwrap();
    assert_eq!(empty_sel.size(), [0, 3]);
    assert!(empty_sel.aggregate(|a, b| a + b, |x| x).is_nan());
}

#[test]
fn test_3d_slice_and_part() {
    let p = Matrix3::from_fn([3, 4, 5], |[s, r, c]| (s * 20 + r * 5 + c) as f64);
    let inner = p.part([1, 1, 1], [2, 2, 2]).unwrap();
    assert_eq!(inner.get([0, 0, 0]), p.get([1, 1, 1]));
    assert_eq!(inner.get([1, 1, 1]), p.get([2, 2, 2]));

    let slice = p.slice_at(2).unwrap();
    assert_eq!(slice.size(), [4, 5]);
    assert_eq!(slice.get([3, 4]), p.get([2, 3, 4]));
}

#[test]
fn test_aggregate_is_shape_independent() {
    let m = iota(4, 4);
    let total = m.aggregate(|a, b| a + b, |x| x);
    let total_t = m.t().aggregate(|a, b| a + b, |x| x);
    assert_eq!(total, total_t);
    assert_eq!(total, (0..16).sum::<usize>() as f64);
}
