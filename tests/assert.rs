#![allow(dead_code)]

pub fn assert_floats_close(a: &[f64], b: &[f64], tolerance: f64) {
    assert_eq!(a.len(), b.len());
    assert!(
        a.iter()
            .zip(b.iter())
            .all(|(a, b)| (a - b).abs() <= tolerance * a.abs().max(b.abs()).max(1.0)),
        "{a:?} != {b:?}"
    );
}

pub fn assert_rows_close(a: &[Vec<f64>], b: &[Vec<f64>], tolerance: f64) {
    assert_eq!(a.len(), b.len());
    for (ra, rb) in a.iter().zip(b) {
        assert_floats_close(ra, rb, tolerance);
    }
}

pub fn assert_all_finite(rows: &[Vec<f64>]) {
    assert!(
        rows.iter().flatten().all(|v| v.is_finite()),
        "{rows:?} has non-finite values"
    );
}

pub fn assert_width(rows: &[Vec<f64>], width: usize) {
    assert!(rows.iter().all(|r| r.len() == width), "rows are not {width} wide");
}
