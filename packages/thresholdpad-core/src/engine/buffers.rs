//! Fixed-capacity storage for the five named engine buffers.

use zeroize::Zeroize;

use super::{BufferName, EngineFault, EngineResult};

/// The engine's shared buffers.
///
/// Each buffer is allocated once at its full capacity. A high-water mark per
/// buffer records how far it has been written so [`EngineBuffers::scrub`] only
/// touches bytes that may hold residue.
pub struct EngineBuffers {
    slots: [Box<[u8]>; 5],
    dirty: [usize; 5],
}

impl EngineBuffers {
    /// Allocate all five buffers, zero-filled
    pub fn new() -> Self {
        Self {
            slots: BufferName::ALL.map(|name| vec![0u8; name.capacity()].into_boxed_slice()),
            dirty: [0; 5],
        }
    }

    /// Copy `bytes` into `buffer` from offset zero.
    pub fn write(&mut self, buffer: BufferName, bytes: &[u8]) -> EngineResult<()> {
        let capacity = buffer.capacity();
        if bytes.len() > capacity {
            return Err(EngineFault::Overflow {
                buffer,
                len: bytes.len(),
                capacity,
            });
        }
        let i = buffer.index();
        self.slots[i][..bytes.len()].copy_from_slice(bytes);
        self.dirty[i] = self.dirty[i].max(bytes.len());
        Ok(())
    }

    /// Borrow the first `len` bytes of `buffer`.
    pub fn get(&self, buffer: BufferName, len: usize) -> EngineResult<&[u8]> {
        let capacity = buffer.capacity();
        if len > capacity {
            return Err(EngineFault::Overflow {
                buffer,
                len,
                capacity,
            });
        }
        Ok(&self.slots[buffer.index()][..len])
    }

    /// Borrow the whole of `buffer`.
    pub fn full(&self, buffer: BufferName) -> &[u8] {
        &self.slots[buffer.index()]
    }

    /// How many leading bytes of `buffer` may be non-zero
    pub fn dirty_len(&self, buffer: BufferName) -> usize {
        self.dirty[buffer.index()]
    }

    /// Zero every byte written since the last scrub.
    pub fn scrub(&mut self) {
        for (slot, dirty) in self.slots.iter_mut().zip(self.dirty.iter_mut()) {
            slot[..*dirty].zeroize();
            *dirty = 0;
        }
    }
}

impl Default for EngineBuffers {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for EngineBuffers {
    fn drop(&mut self) {
        self.scrub();
    }
}
