/// Fixed-capacity row buffer with commit and rollback.
///
/// This module provides the BoundedBuffer that rows are encoded into before
/// they are handed to an ingestion sink. The buffer tracks two cursors:
///
/// * `write_pos` - offset of the next free byte
/// * `committed_pos` - end of the last row known to be complete
///
/// At all times `0 <= committed_pos <= write_pos <= capacity`. Bytes in
/// `[0, committed_pos)` are whole rows awaiting flush; bytes in
/// `[committed_pos, write_pos)` belong to a row still being written.

/// A fixed-capacity, append-only byte region with rollback.
///
/// The storage is allocated once and reused for the buffer's whole lifetime;
/// `reset` only rewinds the cursors.
///
/// # Thread Safety
///
/// BoundedBuffer is owned by a single worker. It is never shared between
/// concurrent exports; see [`ExportContext`](crate::ExportContext).
///
/// # Examples
///
/// ```
/// # use kusto_log_exporter::BoundedBuffer;
/// let mut buffer = BoundedBuffer::new(16);
///
/// buffer.try_append(b"a,b\r\n").unwrap();
/// buffer.commit();
///
/// // A row that cannot be finished is discarded
/// buffer.try_append(b"partial").unwrap();
/// assert!(buffer.try_append(b"far too long for it").is_err());
/// buffer.rollback();
///
/// assert_eq!(buffer.committed_range(), b"a,b\r\n");
/// ```
pub struct BoundedBuffer {
    bytes: Box<[u8]>,
    write_pos: usize,
    committed_pos: usize,
}

impl BoundedBuffer {
    /// Creates an empty buffer holding at most `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        Self {
            bytes: vec![0u8; capacity].into_boxed_slice(),
            write_pos: 0,
            committed_pos: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    /// Bytes still available for appending.
    pub fn remaining(&self) -> usize {
        self.capacity() - self.write_pos
    }

    pub fn write_pos(&self) -> usize {
        self.write_pos
    }

    pub fn committed_pos(&self) -> usize {
        self.committed_pos
    }

    /// Rewinds both cursors to the start. The storage is kept.
    pub fn reset(&mut self) {
        self.write_pos = 0;
        self.committed_pos = 0;
    }

    /// Appends `data` at the write cursor.
    ///
    /// Fails without touching the buffer when `data` does not fit in the
    /// remaining capacity. Returns the number of bytes still free.
    pub fn try_append(&mut self, data: &[u8]) -> Result<usize, crate::EncodeError> {
        let remaining = self.remaining();
        if data.len() > remaining {
            return Err(crate::EncodeError::Overflow {
                needed: data.len(),
                remaining,
            });
        }

        let end = self.write_pos + data.len();
        self.bytes[self.write_pos..end].copy_from_slice(data);
        self.write_pos = end;
        Ok(self.remaining())
    }

    /// Marks everything written so far as complete rows.
    pub fn commit(&mut self) {
        self.committed_pos = self.write_pos;
    }

    /// Discards the in-progress row.
    pub fn rollback(&mut self) {
        self.write_pos = self.committed_pos;
    }

    /// True when not a single further byte can be appended.
    pub fn is_saturated(&self) -> bool {
        self.write_pos == self.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.committed_pos == 0
    }

    /// The exact byte range eligible for flush.
    pub fn committed_range(&self) -> &[u8] {
        &self.bytes[..self.committed_pos]
    }

    /// Bytes of the row currently being written.
    pub fn pending_range(&self) -> &[u8] {
        &self.bytes[self.committed_pos..self.write_pos]
    }
}

impl std::fmt::Debug for BoundedBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedBuffer")
            .field("capacity", &self.capacity())
            .field("write_pos", &self.write_pos)
            .field("committed_pos", &self.committed_pos)
            .finish()
    }
}
