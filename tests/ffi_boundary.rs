//! Exercises the `extern "C"` API the way a JavaScript host would: ids in,
//! status codes out, values exchanged through caller-owned buffers.

use scranwasm::ffi::*;
use scranwasm::ErrorKind;
use std::io::Write;
use tempfile::NamedTempFile;

fn last_error() -> String {
    let mut buf = vec![0u8; scran_last_error_length()];
    let n = unsafe { scran_last_error_copy(buf.as_mut_ptr(), buf.len()) };
    buf.truncate(n);
    String::from_utf8(buf).unwrap()
}

fn check(status: i32) {
    assert_eq!(status, 0, "call failed: {}", last_error());
}

fn dense(nrow: usize, ncol: usize, values: &[f64], column_major: bool) -> u32 {
    let mut id = 0;
    check(unsafe { scran_create_dense(nrow, ncol, values.as_ptr(), values.len(), column_major, &mut id) });
    assert_ne!(id, 0);
    id
}

fn row(id: u32, i: usize, ncol: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; ncol];
    check(unsafe { scran_row(id, i, out.as_mut_ptr(), out.len()) });
    out
}

fn column(id: u32, j: usize, nrow: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; nrow];
    check(unsafe { scran_column(id, j, out.as_mut_ptr(), out.len()) });
    out
}

fn dims(id: u32) -> (usize, usize) {
    let (mut nrow, mut ncol) = (0, 0);
    check(unsafe { scran_nrow(id, &mut nrow) });
    check(unsafe { scran_ncol(id, &mut ncol) });
    (nrow, ncol)
}

#[test]
fn test_delayed_pipeline_through_ids() {
    // [[1, 2, 3], [4, 5, 6]]
    let base = dense(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], false);

    let cols = [2u32, 0];
    let mut sub = 0;
    check(unsafe { scran_subset_columns(base, cols.as_ptr(), cols.len(), &mut sub) });
    assert_eq!(dims(sub), (2, 2));

    let op = "*";
    let factors = [10.0, 100.0];
    let mut scaled = 0;
    check(unsafe {
        scran_vector_op(sub, op.as_ptr(), op.len(), factors.as_ptr(), factors.len(), true, false, &mut scaled)
    });
    assert_eq!(row(scaled, 1, 2), vec![600.0, 400.0]);

    let mut t = 0;
    check(unsafe { scran_transpose(scaled, &mut t) });
    assert_eq!(dims(t), (2, 2));
    assert_eq!(column(t, 0, 2), vec![30.0, 10.0]);

    // Freeing the parents leaves derived handles usable
    check(scran_free(base));
    check(scran_free(sub));
    check(scran_free(scaled));
    assert_eq!(row(t, 0, 2), vec![30.0, 600.0]);
    check(scran_free(t));

    assert_eq!(scran_free(t), ErrorKind::UnknownHandle as i32);
}

#[test]
fn test_sparse_constructors_agree() {
    // [[0, 5], [7, 0], [0, 0]]
    let rows = [1u32, 0];
    let cols = [0u32, 1];
    let values = [7.0, 5.0];
    let mut from_triplets = 0;
    check(unsafe {
        scran_create_sparse_triplets(3, 2, rows.as_ptr(), cols.as_ptr(), values.as_ptr(), 2, false, &mut from_triplets)
    });

    let csc_values = [7.0, 5.0];
    let csc_indices = [1u32, 0];
    let csc_pointers = [0u32, 1, 2];
    let mut from_csc = 0;
    check(unsafe {
        scran_create_compressed_sparse(
            3,
            2,
            csc_values.as_ptr(),
            csc_indices.as_ptr(),
            2,
            csc_pointers.as_ptr(),
            3,
            false,
            &mut from_csc,
        )
    });

    for id in [from_triplets, from_csc] {
        let mut sparse = 0;
        check(unsafe { scran_is_sparse(id, &mut sparse) });
        assert_eq!(sparse, 1);
        assert_eq!(column(id, 0, 3), vec![0.0, 7.0, 0.0]);
        assert_eq!(row(id, 0, 2), vec![0.0, 5.0]);
        check(scran_free(id));
    }

    // Pointers that do not end at nnz
    let bad_pointers = [0u32, 1, 3];
    let mut id = 0;
    let status = unsafe {
        scran_create_compressed_sparse(
            3,
            2,
            csc_values.as_ptr(),
            csc_indices.as_ptr(),
            2,
            bad_pointers.as_ptr(),
            3,
            false,
            &mut id,
        )
    };
    assert_eq!(status, ErrorKind::Construction as i32);
}

#[test]
fn test_reconciled_bind_and_identity_errors() {
    // Reference rows carry identities [10, 20, 30]
    let a = dense(3, 1, &[1.0, 2.0, 3.0], false);
    let a_ids = [10u32, 20, 30];
    let mut a_tagged = 0;
    check(unsafe { scran_with_row_identities(a, a_ids.as_ptr(), 3, &mut a_tagged) });

    // Same genes in a different order
    let b = dense(3, 1, &[30.0, 10.0, 20.0], false);
    let b_ids = [30u32, 10, 20];
    let mut b_tagged = 0;
    check(unsafe { scran_with_row_identities(b, b_ids.as_ptr(), 3, &mut b_tagged) });

    let ids = [a_tagged, b_tagged];
    let mut bound = 0;
    check(unsafe { scran_bind_columns(ids.as_ptr(), 2, true, &mut bound) });
    assert_eq!(column(bound, 1, 3), vec![10.0, 20.0, 30.0]);

    let mut copied = [0u32; 3];
    check(unsafe { scran_identities(bound, copied.as_mut_ptr(), 3) });
    assert_eq!(copied, a_ids);

    // A gene missing from the reference
    let c_ids = [10u32, 20, 40];
    let mut c_tagged = 0;
    check(unsafe { scran_with_row_identities(b, c_ids.as_ptr(), 3, &mut c_tagged) });
    let ids = [a_tagged, c_tagged];
    let status = unsafe { scran_bind_columns(ids.as_ptr(), 2, true, &mut bound) };
    assert_eq!(status, ErrorKind::Reconciliation as i32);
    let message = last_error();
    assert!(message.contains("40"), "{}", message);
    assert!(message.contains("matrix 1"), "{}", message);

    // Unknown ids are reported before any binding happens
    let ids = [a_tagged, 0];
    let status = unsafe { scran_bind_columns(ids.as_ptr(), 2, false, &mut bound) };
    assert_eq!(status, ErrorKind::UnknownHandle as i32);

    // Empty list
    let status = unsafe { scran_bind_rows(std::ptr::null(), 0, &mut bound) };
    assert_eq!(status, ErrorKind::Validation as i32);
}

#[test]
fn test_out_of_bounds_and_bad_names() {
    let id = dense(2, 2, &[1.0, 2.0, 3.0, 4.0], true);
    let mut out = [0.0; 2];
    assert_eq!(
        unsafe { scran_row(id, 2, out.as_mut_ptr(), 2) },
        ErrorKind::OutOfBounds as i32
    );
    assert!(last_error().contains("Row index 2"));
    assert_eq!(
        unsafe { scran_column(id, 0, out.as_mut_ptr(), 1) },
        ErrorKind::Construction as i32
    );

    let subset = [5u32];
    let mut derived = 0;
    assert_eq!(
        unsafe { scran_subset_rows(id, subset.as_ptr(), 1, &mut derived) },
        ErrorKind::Validation as i32
    );

    let op = "%%";
    assert_eq!(
        unsafe { scran_scalar_op(id, op.as_ptr(), op.len(), 2.0, false, &mut derived) },
        ErrorKind::Validation as i32
    );
    assert!(last_error().contains("%%"));

    let bytes = [0xffu8, 0xfe];
    assert_eq!(
        unsafe { scran_scalar_op(id, bytes.as_ptr(), bytes.len(), 2.0, false, &mut derived) },
        ErrorKind::Validation as i32
    );
    check(scran_free(id));
}

#[test]
fn test_read_from_path_and_buffer() {
    let text = "%%MatrixMarket matrix coordinate integer general\n2 2 2\n1 1 300\n2 2 4\n";
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(text.as_bytes()).unwrap();
    let path = file.path().to_str().unwrap();

    let mut from_path = 0;
    check(unsafe { scran_read_matrix_market(path.as_ptr(), path.len(), true, &mut from_path) });
    let mut reorganized = 0;
    check(unsafe { scran_is_reorganized(from_path, &mut reorganized) });
    assert_eq!(reorganized, 1);
    let mut identities = [0u32; 2];
    check(unsafe { scran_identities(from_path, identities.as_mut_ptr(), 2) });
    assert_eq!(identities, [1, 0]);

    let mut from_buffer = 0;
    check(unsafe { scran_read_matrix_market_buffer(text.as_ptr(), text.len(), false, &mut from_buffer) });
    assert_eq!(row(from_buffer, 0, 2), vec![300.0, 0.0]);

    let mut clone = 0;
    check(unsafe { scran_clone(from_buffer, &mut clone) });
    assert_ne!(clone, from_buffer);
    check(scran_free(from_buffer));
    assert_eq!(row(clone, 1, 2), vec![0.0, 4.0]);

    let missing = "/definitely/not/here.mtx";
    let status = unsafe { scran_read_matrix_market(missing.as_ptr(), missing.len(), false, &mut clone) };
    assert_eq!(status, ErrorKind::Io as i32);
    assert!(last_error().contains(missing));

    // The failed read did not touch the clone's slot
    assert_eq!(row(clone, 0, 2), vec![300.0, 0.0]);
    check(scran_free(clone));
    check(scran_free(from_path));
}
