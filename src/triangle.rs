/// Copy the strictly-lower triangle of a row-major `m x m` buffer into the
/// strictly-upper triangle, so `out[i, j] = out[j, i]` exactly.
pub(crate) fn mirror_lower<T: Copy>(out: &mut [T], m: usize) {
    debug_assert_eq!(out.len(), m * m);
    for i in 0..m {
        for j in (i + 1)..m {
            out[i * m + j] = out[j * m + i];
        }
    }
}
