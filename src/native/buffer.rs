// In: src/native/buffer.rs

use arrow::buffer::Buffer;

use crate::protocol::InterchangeBuffer;

/// An Arrow `Buffer` exposed through the interchange buffer contract.
#[derive(Debug, Clone)]
pub struct ArrowBuffer {
    buffer: Buffer,
}

impl ArrowBuffer {
    pub fn new(buffer: Buffer) -> Self {
        Self { buffer }
    }

    pub fn inner(&self) -> &Buffer {
        &self.buffer
    }
}

// SAFETY: an Arrow `Buffer` is immutable and keeps its allocation alive for as
// long as any clone of it exists; this handle owns one such clone.
unsafe impl InterchangeBuffer for ArrowBuffer {
    fn bufsize(&self) -> usize {
        self.buffer.len()
    }

    fn ptr(&self) -> usize {
        self.buffer.as_ptr() as usize
    }
}

impl From<Buffer> for ArrowBuffer {
    fn from(buffer: Buffer) -> Self {
        Self::new(buffer)
    }
}
