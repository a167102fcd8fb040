//! Per-worker scratch storage.
//!
//! Each worker owns one slot per expression leaf, in the traversal order
//! fixed by [`Expr::assign_slots`]: a chunk-sized buffer for image and
//! random leaves, a broadcast value for scalar leaves. Image slots carry
//! the worker's private cursor over the shared image; the random state is
//! a per-worker generator seeded from entropy.
//!
//! [`Expr::assign_slots`]: crate::expr::node::Expr::assign_slots

use crate::core::chunk::Chunk;
use crate::core::types::{re, Real, Scalar};
use crate::expr::node::{LeafPlan, RandomKind};
use crate::image::volume::VoxelCursor;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

enum SlotSource {
    Image(VoxelCursor),
    Random(RandomKind),
    Literal,
}

struct Slot {
    source: SlotSource,
    chunk: Chunk,
}

/// One worker's private evaluation state.
pub struct WorkerScratch {
    slots: Vec<Slot>,
    rng: StdRng,
    inner: [usize; 2],
}

impl WorkerScratch {
    /// Instantiate scratch for one worker from the leaf plan and the
    /// inner-axes sizes of the output.
    pub fn new(plan: &[LeafPlan], inner: [usize; 2]) -> Self {
        let tile_len = inner[0] * inner[1];
        let slots = plan
            .iter()
            .map(|leaf| match leaf {
                LeafPlan::Image(image) => Slot {
                    source: SlotSource::Image(VoxelCursor::new(image.clone())),
                    chunk: Chunk::with_len(tile_len),
                },
                LeafPlan::Random(kind) => Slot {
                    source: SlotSource::Random(*kind),
                    chunk: Chunk::with_len(tile_len),
                },
                LeafPlan::Scalar(value) => Slot {
                    source: SlotSource::Literal,
                    chunk: Chunk::broadcast(*value),
                },
            })
            .collect();
        Self {
            slots,
            rng: StdRng::from_entropy(),
            inner,
        }
    }

    /// Cells per tile.
    pub fn tile_len(&self) -> usize {
        self.inner[0] * self.inner[1]
    }

    /// Value of cell `n` in the given slot.
    #[inline]
    pub fn get(&self, slot: usize, n: usize) -> Scalar {
        self.slots[slot].chunk.get(n)
    }

    /// Overwrite cell `n` in the given slot.
    #[inline]
    pub fn set(&mut self, slot: usize, n: usize, v: Scalar) {
        self.slots[slot].chunk.set(n, v);
    }

    /// The tile payload of a (non-broadcast) slot.
    pub fn chunk_data(&self, slot: usize) -> &[Scalar] {
        self.slots[slot].chunk.data()
    }

    /// Refill an image slot for the given outer position.
    ///
    /// Axes where the image has size 1 broadcast: the cursor stays at 0
    /// there. The fill is row-major over the inner axes with axis 0
    /// fastest, the order every consumer of chunks relies on.
    pub fn refresh_image(&mut self, slot: usize, outer: &[usize]) {
        let inner = self.inner;
        let s = &mut self.slots[slot];
        let SlotSource::Image(cursor) = &mut s.source else {
            return;
        };
        for a in 2..cursor.ndim() {
            if cursor.size(a) > 1 {
                cursor.index(a, outer[a - 2]);
            }
        }
        let track_x = cursor.size(0) > 1;
        let track_y = cursor.ndim() > 1 && cursor.size(1) > 1;
        let data = s.chunk.data_mut();
        let mut n = 0;
        for y in 0..inner[1] {
            if track_y {
                cursor.index(1, y);
            }
            for x in 0..inner[0] {
                if track_x {
                    cursor.index(0, x);
                }
                data[n] = cursor.value();
                n += 1;
            }
        }
    }

    /// Refill a random slot with fresh draws from the worker's generator.
    pub fn fill_random(&mut self, slot: usize) {
        let s = &mut self.slots[slot];
        let SlotSource::Random(kind) = &s.source else {
            return;
        };
        let kind = *kind;
        let data = s.chunk.data_mut();
        match kind {
            RandomKind::Uniform => {
                for v in data.iter_mut() {
                    *v = re(self.rng.gen::<Real>());
                }
            }
            RandomKind::Normal => {
                for v in data.iter_mut() {
                    *v = re(self.rng.sample(StandardNormal));
                }
            }
        }
    }
}
