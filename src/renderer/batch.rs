// renderer/batch.rs
use super::vertex::{Triangle, Vertex};

pub const DEFAULT_TRIS_CAPACITY: usize = 2048;

/// Fixed capacity triangle buffer. Filled between flushes and emptied by them.
pub struct TrisBuffer {
    tris: Box<[Triangle]>,
    len: usize,
}

impl TrisBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            tris: vec![Triangle::default(); capacity.max(1)].into_boxed_slice(),
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.tris.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.tris.len()
    }

    /// Hands the triangle back when there is no room left.
    pub fn try_push(&mut self, tri: Triangle) -> Result<(), Triangle> {
        if self.is_full() {
            return Err(tri);
        }
        self.tris[self.len] = tri;
        self.len += 1;
        Ok(())
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.tris[..self.len]
    }

    pub fn vertices(&self) -> &[Vertex] {
        bytemuck::cast_slice(self.triangles())
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }
}

impl Default for TrisBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_TRIS_CAPACITY)
    }
}
