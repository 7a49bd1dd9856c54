//! Chunked full-screen image upload.
//!
//! Splits a packed BGR24 frame into protocol-sized chunks and drives the
//! start/data/end report sequence, each chunk sent and completed before the
//! next. A single-flight slot serializes concurrent callers: a second
//! caller blocks on the slot's condition variable up to the bounded wait
//! window and then fails with `Busy` instead of queueing.

use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::error::{PadError, Result};
use crate::protocol::codec;
use crate::protocol::{IMAGE_FORMAT_BGR24, REPORT_IMAGE_DATA, REPORT_IMAGE_END, REPORT_IMAGE_START};
use crate::transport::Transport;

/// Default image chunk size in bytes. The framed 0x26 report is chunk + 2
/// bytes, which keeps the declared-length field within one byte.
pub const DEFAULT_CHUNK_SIZE: usize = 253;

/// Bounded wait for the upload slot: 500 ms poll interval, 20 attempts.
const SLOT_POLL_INTERVAL: Duration = Duration::from_millis(500);
const SLOT_MAX_POLLS: u32 = 20;

/// Single-flight slot. Waiters are woken by the condition variable rather
/// than sleep-polling, with the same total wait budget.
struct UploadSlot {
    busy: Mutex<bool>,
    freed: Condvar,
    wait_budget: Duration,
}

struct SlotGuard<'a> {
    slot: &'a UploadSlot,
}

impl UploadSlot {
    fn new(wait_budget: Duration) -> Self {
        Self {
            busy: Mutex::new(false),
            freed: Condvar::new(),
            wait_budget,
        }
    }

    fn acquire(&self) -> Result<SlotGuard<'_>> {
        let deadline = Instant::now() + self.wait_budget;
        let mut busy = self.lock_busy();
        while *busy {
            let now = Instant::now();
            if now >= deadline {
                return Err(PadError::Busy);
            }
            let (guard, _timeout) = self
                .freed
                .wait_timeout(busy, deadline - now)
                .unwrap_or_else(|e| e.into_inner());
            busy = guard;
        }
        *busy = true;
        Ok(SlotGuard { slot: self })
    }

    fn lock_busy(&self) -> MutexGuard<'_, bool> {
        self.busy.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        *self.slot.lock_busy() = false;
        self.slot.freed.notify_all();
    }
}

pub struct ImageUploader {
    slot: UploadSlot,
}

impl Default for ImageUploader {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageUploader {
    pub fn new() -> Self {
        Self::with_wait_budget(SLOT_POLL_INTERVAL * SLOT_MAX_POLLS)
    }

    /// Construct with a custom slot wait budget (tests use short windows).
    pub fn with_wait_budget(wait_budget: Duration) -> Self {
        Self { slot: UploadSlot::new(wait_budget) }
    }

    /// Upload a packed BGR24 frame. `bitmap.len()` must equal
    /// `width * height * 3`.
    ///
    /// The transport lock is held for the whole start/data/end sequence so
    /// chunk writes from different uploads can never interleave; the slot
    /// is what gives waiting callers the bounded wait-then-`Busy` contract.
    pub fn upload<T: Transport>(
        &self,
        transport: &Mutex<T>,
        chunk_size: usize,
        bitmap: &[u8],
        width: usize,
        height: usize,
    ) -> Result<()> {
        if bitmap.len() != width * height * 3 {
            return Err(PadError::InvalidParameter(format!(
                "bitmap is {} bytes, expected {} ({}x{} BGR24)",
                bitmap.len(),
                width * height * 3,
                width,
                height
            )));
        }
        if chunk_size == 0 || chunk_size > 0xff {
            return Err(PadError::InvalidParameter(format!(
                "image chunk size must be 1..=255, got {}",
                chunk_size
            )));
        }

        let _guard = self.slot.acquire()?;
        let mut transport = transport.lock().unwrap_or_else(|e| e.into_inner());

        let chunk_count = bitmap.len().div_ceil(chunk_size);
        log::info!(
            "Uploading {}x{} image ({} bytes, {} chunks)",
            width,
            height,
            bitmap.len(),
            chunk_count
        );

        transport.send_feature_report(REPORT_IMAGE_START, &codec::encode_image_start(IMAGE_FORMAT_BGR24))?;
        for chunk in bitmap.chunks(chunk_size) {
            let frame = codec::encode_image_chunk(chunk)?;
            transport.send_feature_report(REPORT_IMAGE_DATA, &frame)?;
        }
        transport.send_feature_report(REPORT_IMAGE_END, &codec::encode_image_end())?;

        log::debug!("Image upload complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockTransport;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_rejects_size_mismatch_before_io() {
        let uploader = ImageUploader::new();
        let transport = Mutex::new(MockTransport::connected());
        let err = uploader.upload(&transport, 253, &[0u8; 10], 4, 4);
        assert!(matches!(err, Err(PadError::InvalidParameter(_))));
        assert!(transport.lock().unwrap().writes.lock().unwrap().is_empty());
    }

    #[test]
    fn test_chunks_reassemble_exactly() {
        let uploader = ImageUploader::new();
        let mock = MockTransport::connected();
        let writes = mock.writes_handle();
        let transport = Mutex::new(mock);

        let width = 7;
        let height = 5;
        let bitmap: Vec<u8> = (0..width * height * 3).map(|i| i as u8).collect();
        let chunk_size = 16;
        uploader.upload(&transport, chunk_size, &bitmap, width, height).unwrap();

        let writes = writes.lock().unwrap();
        assert_eq!(writes.first().unwrap(), &(REPORT_IMAGE_START, vec![IMAGE_FORMAT_BGR24]));
        assert_eq!(writes.last().unwrap(), &(REPORT_IMAGE_END, vec![0]));

        let data: Vec<&(u8, Vec<u8>)> =
            writes.iter().filter(|(id, _)| *id == REPORT_IMAGE_DATA).collect();
        assert_eq!(data.len(), bitmap.len().div_ceil(chunk_size));

        let mut reassembled = Vec::new();
        for (_, frame) in &data {
            let declared = frame[0] as usize;
            assert_eq!(frame[1], 0);
            assert_eq!(frame.len(), declared + 2);
            reassembled.extend_from_slice(&frame[2..2 + declared]);
        }
        assert_eq!(reassembled, bitmap);
    }

    #[test]
    fn test_second_caller_waits_then_succeeds() {
        let uploader = Arc::new(ImageUploader::new());
        let mut mock = MockTransport::connected();
        mock.write_delay = Some(Duration::from_millis(5));
        let writes = mock.writes_handle();
        let transport = Arc::new(Mutex::new(mock));

        let bitmap = Arc::new(vec![0u8; 4 * 4 * 3]);
        let mut handles = Vec::new();
        for _ in 0..2 {
            let uploader = uploader.clone();
            let transport = transport.clone();
            let bitmap = bitmap.clone();
            handles.push(thread::spawn(move || {
                uploader.upload(&transport, 8, &bitmap, 4, 4)
            }));
        }
        for handle in handles {
            handle.join().unwrap().unwrap();
        }

        // Two full, non-interleaved sequences: start, chunks, end, twice.
        let writes = writes.lock().unwrap();
        let ids: Vec<u8> = writes.iter().map(|(id, _)| *id).collect();
        let chunks = 48usize.div_ceil(8);
        let mut expected = Vec::new();
        for _ in 0..2 {
            expected.push(REPORT_IMAGE_START);
            expected.extend(std::iter::repeat(REPORT_IMAGE_DATA).take(chunks));
            expected.push(REPORT_IMAGE_END);
        }
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_slot_timeout_is_busy() {
        let uploader = Arc::new(ImageUploader::with_wait_budget(Duration::from_millis(50)));
        let mut mock = MockTransport::connected();
        mock.write_delay = Some(Duration::from_millis(120));
        let transport = Arc::new(Mutex::new(mock));
        let bitmap = Arc::new(vec![0u8; 2 * 2 * 3]);

        let first = {
            let (uploader, transport, bitmap) = (uploader.clone(), transport.clone(), bitmap.clone());
            thread::spawn(move || uploader.upload(&transport, 12, &bitmap, 2, 2))
        };
        // Let the first caller claim the slot.
        thread::sleep(Duration::from_millis(20));
        let second = uploader.upload(&transport, 12, &bitmap, 2, 2);
        assert!(matches!(second, Err(PadError::Busy)));
        first.join().unwrap().unwrap();
    }
}
