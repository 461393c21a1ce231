//! Blocking and threading parameters.

use std::env;
use std::str::FromStr;

/// Rows of `X` packed per cache block in the dense kernel.
pub const DEFAULT_ROW_BLOCK: usize = 512;
/// Output rows owned by one dense task; also the inner column tile width.
pub const DEFAULT_TILE: usize = 64;
/// Output columns owned by one sparse task.
pub const DEFAULT_SPARSE_COL_BLOCK: usize = 16;

/// Tuning knobs for [`crate::Sandwich`].
///
/// Block sizes are performance parameters only; results do not depend on them
/// beyond floating-point summation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandwichConfig {
    /// Dedicated worker count. `None` runs on rayon's global pool.
    pub num_threads: Option<usize>,
    pub row_block: usize,
    pub tile: usize,
    pub sparse_col_block: usize,
}

impl Default for SandwichConfig {
    fn default() -> Self {
        Self {
            num_threads: None,
            row_block: DEFAULT_ROW_BLOCK,
            tile: DEFAULT_TILE,
            sparse_col_block: DEFAULT_SPARSE_COL_BLOCK,
        }
    }
}

impl SandwichConfig {
    /// Defaults overridden by `SANDWICH_NUM_THREADS`, `SANDWICH_ROW_BLOCK`,
    /// `SANDWICH_TILE` and `SANDWICH_SPARSE_COL_BLOCK`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(n) = read_var::<usize>("SANDWICH_NUM_THREADS") {
            config.num_threads = Some(n);
        }
        if let Some(b) = read_var("SANDWICH_ROW_BLOCK") {
            config.row_block = b;
        }
        if let Some(b) = read_var("SANDWICH_TILE") {
            config.tile = b;
        }
        if let Some(b) = read_var("SANDWICH_SPARSE_COL_BLOCK") {
            config.sparse_col_block = b;
        }
        config.normalized()
    }

    pub fn with_num_threads(mut self, n: usize) -> Self {
        self.num_threads = Some(n);
        self
    }

    pub fn with_row_block(mut self, block: usize) -> Self {
        self.row_block = block;
        self
    }

    pub fn with_tile(mut self, tile: usize) -> Self {
        self.tile = tile;
        self
    }

    pub fn with_sparse_col_block(mut self, block: usize) -> Self {
        self.sparse_col_block = block;
        self
    }

    /// Clamp every block size to at least 1.
    pub(crate) fn normalized(mut self) -> Self {
        self.row_block = self.row_block.max(1);
        self.tile = self.tile.max(1);
        self.sparse_col_block = self.sparse_col_block.max(1);
        self
    }
}

fn read_var<T: FromStr>(name: &str) -> Option<T> {
    let raw = env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            log::warn!("ignoring {}={:?}: not a valid value", name, raw);
            None
        }
    }
}
