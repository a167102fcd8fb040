//! The parallel evaluation driver.
//!
//! Partitions the output over its outer axes into independent tiles and
//! dispatches them across a rayon worker pool. The flat output buffer is
//! split with `par_chunks_mut`, whose slabs are exactly the disjoint
//! per-outer-coordinate tiles, so workers never contend on output cells.
//! Each worker owns its scratch (cursors, chunk pool, random state),
//! created lazily via `for_each_init`. The first worker error wins and
//! cancels the remaining tiles cooperatively.

use crate::core::error::{CalcError, CalcResult};
use crate::core::types::{DataType, Scalar};
use crate::eval::evaluate::{evaluate, EvalRef};
use crate::eval::progress::{ProgressCallback, ProgressTracker, ProgressUpdate};
use crate::eval::scratch::WorkerScratch;
use crate::expr::geometry::OutputGeometry;
use crate::expr::node::{Expr, LeafPlan};
use crate::image::header::ImageHeader;
use parking_lot::Mutex;
use rayon::prelude::*;
use std::sync::Arc;

/// Options controlling the evaluation run.
pub struct EvalOptions {
    /// Worker pool size. `Some(0)` means one worker; `None` uses
    /// hardware parallelism.
    pub nthreads: Option<usize>,
    /// Output datatype override; must match the expression's
    /// complex-ness.
    pub datatype: Option<DataType>,
    /// Permit overwriting an existing output file.
    pub force: bool,
    /// Progress callback.
    pub progress: Option<Arc<ProgressCallback>>,
}

impl std::fmt::Debug for EvalOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvalOptions")
            .field("nthreads", &self.nthreads)
            .field("datatype", &self.datatype)
            .field("force", &self.force)
            .field("progress", &self.progress.as_ref().map(|_| "<callback>"))
            .finish()
    }
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            nthreads: None,
            datatype: None,
            force: false,
            progress: None,
        }
    }
}

impl EvalOptions {
    /// Create default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the worker pool size (0 means one worker).
    pub fn with_nthreads(mut self, nthreads: usize) -> Self {
        self.nthreads = Some(nthreads);
        self
    }

    /// Override the output datatype.
    pub fn with_datatype(mut self, datatype: DataType) -> Self {
        self.datatype = Some(datatype);
        self
    }

    /// Permit overwriting the output path.
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Attach a progress callback.
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(Box::new(callback)));
        self
    }
}

/// Pick the output datatype: the override when given (validated against
/// the root's complex-ness), else complex or real 32-bit float.
pub fn negotiate_datatype(
    root_complex: bool,
    requested: Option<DataType>,
) -> CalcResult<DataType> {
    match requested {
        Some(datatype) => {
            if datatype.is_complex() != root_complex {
                Err(CalcError::DatatypeMismatch {
                    requested: datatype.name(),
                    kind: if root_complex { "complex" } else { "real" },
                })
            } else {
                Ok(datatype)
            }
        }
        None => Ok(if root_complex {
            DataType::CFloat32
        } else {
            DataType::Float32
        }),
    }
}

/// Evaluate an image-mode expression over its full output geometry.
///
/// Returns the negotiated output header and the evaluated voxel buffer
/// (axis 0 fastest). Writing the buffer to disk is the caller's business,
/// so a failed run never leaves a partial file behind.
pub fn evaluate_image(
    root: &Expr,
    plan: &[LeafPlan],
    geometry: &OutputGeometry,
    options: &EvalOptions,
) -> CalcResult<(ImageHeader, Vec<Scalar>)> {
    let datatype = negotiate_datatype(root.is_complex(), options.datatype)?;

    let inner = geometry.inner_sizes();
    let tile_len = geometry.tile_len();
    let outer_sizes = geometry.outer_sizes().to_vec();
    let tile_count = geometry.outer_count();
    let mut buffer = vec![Scalar::new(0.0, 0.0); tile_len * tile_count];

    let mut tracker = ProgressTracker::new(tile_count);
    if let Some(callback) = &options.progress {
        let callback = callback.clone();
        tracker = tracker.with_callback(Box::new(move |update| callback(update)));
    }
    tracker.start(&root.provenance());

    let first_error: Mutex<Option<CalcError>> = Mutex::new(None);
    {
        let tracker = &tracker;
        let first_error = &first_error;
        let outer_sizes = &outer_sizes;
        let mut run = || {
            buffer
                .par_chunks_mut(tile_len)
                .enumerate()
                .for_each_init(
                    || WorkerScratch::new(plan, inner),
                    |scratch, (tile_index, tile)| {
                        if tracker.is_cancelled() {
                            return;
                        }
                        let outer = outer_coords(tile_index, outer_sizes);
                        match evaluate(root, scratch, &outer) {
                            Ok(EvalRef::Slot(slot)) => {
                                tile.copy_from_slice(scratch.chunk_data(slot));
                            }
                            Ok(EvalRef::Value(v)) => tile.fill(v),
                            Err(e) => {
                                let mut guard = first_error.lock();
                                if guard.is_none() {
                                    *guard = Some(e);
                                }
                                tracker.cancel();
                                return;
                            }
                        }
                        tracker.tile_completed();
                    },
                );
        };
        match options.nthreads {
            Some(n) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(n.max(1))
                    .build()
                    .map_err(|e| CalcError::Range {
                        detail: format!("could not build worker pool: {e}"),
                    })?;
                pool.install(run);
            }
            None => run(),
        }
    }

    if let Some(error) = first_error.into_inner() {
        tracker.report_error(error.to_string());
        return Err(error);
    }
    if tracker.is_cancelled() {
        return Err(CalcError::Cancelled);
    }
    tracker.complete();

    let header = ImageHeader {
        sizes: geometry.sizes.clone(),
        spacing: geometry.spacing.clone(),
        datatype,
    };
    Ok((header, buffer))
}

/// Decompose an outer linear index into outer coordinates, axis 2
/// fastest.
fn outer_coords(mut index: usize, outer_sizes: &[usize]) -> Vec<usize> {
    outer_sizes
        .iter()
        .map(|&s| {
            let c = index % s;
            index /= s;
            c
        })
        .collect()
}
