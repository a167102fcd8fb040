//! Tile-sized value buffers.
//!
//! A [`Chunk`] carries the values of one expression leaf (or one
//! intermediate result) over a single output tile. A chunk either holds a
//! full tile worth of values, or is a *broadcast* chunk: an empty payload
//! plus one stored value standing in for every cell of the tile. Chunks
//! live in per-worker scratch storage and are reused across tiles.

use crate::core::types::Scalar;

/// A tile of scalars, or a single value broadcast over the tile.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Tile payload; empty for a broadcast chunk.
    data: Vec<Scalar>,
    /// The broadcast value. Only meaningful when `data` is empty.
    value: Scalar,
}

impl Chunk {
    /// Create a broadcast chunk holding a single value.
    pub fn broadcast(value: Scalar) -> Self {
        Self {
            data: Vec::new(),
            value,
        }
    }

    /// Create a full chunk of `len` zeroed cells.
    pub fn with_len(len: usize) -> Self {
        Self {
            data: vec![Scalar::new(0.0, 0.0); len],
            value: Scalar::new(0.0, 0.0),
        }
    }

    /// Whether this chunk stands for a single value broadcast over the tile.
    #[inline]
    pub fn is_broadcast(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of cells in the payload (0 for a broadcast chunk).
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when the payload is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Value at cell `n`; a broadcast chunk returns its stored value for
    /// every index.
    #[inline]
    pub fn get(&self, n: usize) -> Scalar {
        if self.data.is_empty() {
            self.value
        } else {
            self.data[n]
        }
    }

    /// Write cell `n`. Must not be called on a broadcast chunk.
    #[inline]
    pub fn set(&mut self, n: usize, v: Scalar) {
        self.data[n] = v;
    }

    /// The payload slice (empty for a broadcast chunk).
    #[inline]
    pub fn data(&self) -> &[Scalar] {
        &self.data
    }

    /// Mutable payload slice.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [Scalar] {
        &mut self.data
    }
}
