//! Disjoint ownership of output rows.
//!
//! Every parallel task writes only into the chunk handed to it by
//! [`RowBlocks::split_mut`]. Chunks come from repeated `split_at_mut`, so no
//! two tasks can alias an output element.

use std::ops::Range;

/// Contiguous ranges covering `0..len`, each owned by exactly one task.
#[derive(Debug, Clone)]
pub(crate) struct RowBlocks {
    ranges: Vec<Range<usize>>,
}

impl RowBlocks {
    pub(crate) fn new(len: usize, block: usize) -> Self {
        let block = block.max(1);
        let ranges = (0..len)
            .step_by(block)
            .map(|start| start..(start + block).min(len))
            .collect();
        Self { ranges }
    }

    #[cfg(test)]
    pub(crate) fn ranges(&self) -> &[Range<usize>] {
        &self.ranges
    }

    pub(crate) fn len(&self) -> usize {
        self.ranges.len()
    }

    /// True when the ranges are non-empty, ordered, non-overlapping and cover `0..len`.
    pub(crate) fn is_disjoint_cover(&self, len: usize) -> bool {
        let mut next = 0;
        for r in &self.ranges {
            if r.start != next || r.end <= r.start {
                return false;
            }
            next = r.end;
        }
        next == len
    }

    /// Split a row-major buffer with rows of `row_len` elements into one
    /// mutable chunk per range.
    pub(crate) fn split_mut<'a, T>(
        &self,
        buf: &'a mut [T],
        row_len: usize,
    ) -> Vec<(Range<usize>, &'a mut [T])> {
        debug_assert!(self.is_disjoint_cover(buf.len() / row_len.max(1)));
        let mut rest = buf;
        let mut chunks = Vec::with_capacity(self.ranges.len());
        for r in &self.ranges {
            let (head, tail) = std::mem::take(&mut rest).split_at_mut(r.len() * row_len);
            chunks.push((r.clone(), head));
            rest = tail;
        }
        chunks
    }
}
