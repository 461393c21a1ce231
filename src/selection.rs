//! Row and column subsets.

use crate::error::{Axis, Result, SandwichError};

/// Either every index in `0..n` or an explicit strictly ascending subset.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Selection<'a> {
    All(usize),
    Subset(&'a [usize]),
}

impl<'a> Selection<'a> {
    /// Validate `subset` against `bound` for `axis`.
    pub(crate) fn checked(subset: &'a [usize], bound: usize, axis: Axis) -> Result<Self> {
        if let Some(&index) = subset.iter().find(|&&i| i >= bound) {
            return Err(SandwichError::SubsetIndex { axis, index, bound });
        }
        if !is_strictly_sorted(subset) {
            return Err(SandwichError::UnsortedSubset { axis });
        }
        Ok(Selection::Subset(subset))
    }

    pub(crate) fn len(&self) -> usize {
        match self {
            Selection::All(n) => *n,
            Selection::Subset(s) => s.len(),
        }
    }

    /// Original index of the `pos`-th selected entry.
    #[inline(always)]
    pub(crate) fn get(&self, pos: usize) -> usize {
        match self {
            Selection::All(_) => pos,
            Selection::Subset(s) => s[pos],
        }
    }

    /// Boolean membership mask over `0..bound`, or `None` when everything is selected.
    pub(crate) fn mask(&self, bound: usize) -> Option<Vec<bool>> {
        match self {
            Selection::All(_) => None,
            Selection::Subset(s) => {
                let mut included = vec![false; bound];
                for &i in s.iter() {
                    included[i] = true;
                }
                Some(included)
            }
        }
    }

    /// Map from original index to output position, or `None` when the
    /// selection is the identity.
    pub(crate) fn position_map(&self, bound: usize) -> Option<Vec<Option<usize>>> {
        match self {
            Selection::All(_) => None,
            Selection::Subset(s) => {
                let mut map = vec![None; bound];
                for (pos, &i) in s.iter().enumerate() {
                    map[i] = Some(pos);
                }
                Some(map)
            }
        }
    }
}

pub(crate) fn is_strictly_sorted(a: &[usize]) -> bool {
    a.windows(2).all(|w| w[0] < w[1])
}
