use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;

use crate::error::RenderError;
use crate::gpu::{BufferSetId, BufferSlot, DrawCall, GpuBackend};
use crate::render_type::RenderType;

/// Something the recording backend was asked to do.
#[derive(Debug, Clone, PartialEq)]
pub enum GpuEvent {
    Create {
        set: BufferSetId,
        render_type: RenderType,
        byte_budget: usize,
    },
    Upload {
        set: BufferSetId,
        slot: BufferSlot,
        offset: usize,
        len: usize,
    },
    Draw {
        set: BufferSetId,
        call: DrawCall,
    },
    Delete {
        set: BufferSetId,
    },
}

#[derive(Debug)]
struct RecordedSet {
    render_type: RenderType,
    byte_budget: usize,
    contents: HashMap<BufferSlot, Vec<u8>>,
}

/// Headless backend that records every call.
///
/// Tests inspect the event log and the last bytes uploaded to each buffer;
/// the CLI prints [`RecordingGpu::summary`].
#[derive(Debug, Default)]
pub struct RecordingGpu {
    next_id: u64,
    sets: BTreeMap<BufferSetId, RecordedSet>,
    events: Vec<GpuEvent>,
    fail_creates: bool,
}

impl RecordingGpu {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `create_dynamic` fail, to exercise error paths.
    pub fn set_fail_creates(&mut self, fail: bool) {
        self.fail_creates = fail;
    }

    pub fn events(&self) -> &[GpuEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<GpuEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn live_sets(&self) -> usize {
        self.sets.len()
    }

    pub fn render_type_of(&self, set: BufferSetId) -> Option<RenderType> {
        self.sets.get(&set).map(|s| s.render_type)
    }

    /// Bytes most recently uploaded to `slot` of `set`.
    pub fn contents(&self, set: BufferSetId, slot: BufferSlot) -> Option<&[u8]> {
        self.sets
            .get(&set)
            .and_then(|s| s.contents.get(&slot))
            .map(Vec::as_slice)
    }

    pub fn draws(&self) -> impl Iterator<Item = (BufferSetId, &DrawCall)> {
        self.events.iter().filter_map(|e| match e {
            GpuEvent::Draw { set, call } => Some((*set, call)),
            _ => None,
        })
    }

    pub fn draw_count(&self) -> usize {
        self.draws().count()
    }

    /// Total bytes uploaded across the recorded events.
    pub fn uploaded_bytes(&self) -> usize {
        self.events
            .iter()
            .map(|e| match e {
                GpuEvent::Upload { len, .. } => *len,
                _ => 0,
            })
            .sum()
    }

    /// Human-readable account of the recorded events and live buffer sets.
    pub fn summary(&self) -> String {
        let mut creates = 0;
        let mut uploads = 0;
        let mut draws = 0;
        let mut deletes = 0;
        for e in &self.events {
            match e {
                GpuEvent::Create { .. } => creates += 1,
                GpuEvent::Upload { .. } => uploads += 1,
                GpuEvent::Draw { .. } => draws += 1,
                GpuEvent::Delete { .. } => deletes += 1,
            }
        }

        let mut out = String::new();
        let _ = writeln!(
            out,
            "=== GPU (creates={creates}, uploads={uploads}, draws={draws}, deletes={deletes}) ==="
        );
        let _ = writeln!(out, "Uploaded: {} bytes", self.uploaded_bytes());
        let _ = writeln!(out, "Live buffer sets: {}", self.sets.len());
        for (id, set) in &self.sets {
            let mut slots: Vec<_> = set
                .contents
                .iter()
                .map(|(slot, bytes)| format!("{slot:?}={}", bytes.len()))
                .collect();
            slots.sort();
            let _ = writeln!(
                out,
                "  [{:>3}] {:?} budget={} {}",
                id.0,
                set.render_type,
                set.byte_budget,
                slots.join(" ")
            );
        }
        out
    }
}

impl GpuBackend for RecordingGpu {
    fn create_dynamic(
        &mut self,
        render_type: RenderType,
        byte_budget: usize,
    ) -> Result<BufferSetId, RenderError> {
        if self.fail_creates {
            return Err(RenderError::Gpu(format!(
                "buffer creation disabled for {render_type:?}"
            )));
        }
        self.next_id += 1;
        let set = BufferSetId(self.next_id);
        self.sets.insert(
            set,
            RecordedSet {
                render_type,
                byte_budget,
                contents: HashMap::new(),
            },
        );
        self.events.push(GpuEvent::Create {
            set,
            render_type,
            byte_budget,
        });
        Ok(set)
    }

    fn upload(&mut self, set: BufferSetId, slot: BufferSlot, offset: usize, bytes: &[u8]) {
        let Some(recorded) = self.sets.get_mut(&set) else {
            tracing::error!(?set, ?slot, "upload to unknown buffer set");
            return;
        };
        if offset + bytes.len() > recorded.byte_budget {
            tracing::error!(
                ?set,
                ?slot,
                len = bytes.len(),
                budget = recorded.byte_budget,
                "upload exceeds buffer budget"
            );
            return;
        }
        let buf = recorded.contents.entry(slot).or_default();
        buf.truncate(offset);
        buf.resize(offset, 0);
        buf.extend_from_slice(bytes);
        self.events.push(GpuEvent::Upload {
            set,
            slot,
            offset,
            len: bytes.len(),
        });
    }

    fn draw(&mut self, set: BufferSetId, call: &DrawCall) {
        self.events.push(GpuEvent::Draw { set, call: *call });
    }

    fn delete(&mut self, set: BufferSetId) {
        if self.sets.remove(&set).is_some() {
            self.events.push(GpuEvent::Delete { set });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_uploads_and_contents() {
        let mut gpu = RecordingGpu::new();
        let set = gpu.create_dynamic(RenderType::Triangles, 64).unwrap();
        gpu.upload(set, BufferSlot::Vertex, 0, &[1, 2, 3]);
        gpu.upload(set, BufferSlot::Vertex, 0, &[9]);

        assert_eq!(gpu.contents(set, BufferSlot::Vertex), Some(&[9u8][..]));
        assert_eq!(gpu.uploaded_bytes(), 4);
        assert_eq!(gpu.events().len(), 3);
    }

    #[test]
    fn oversized_upload_is_refused() {
        let mut gpu = RecordingGpu::new();
        let set = gpu.create_dynamic(RenderType::Lines, 4).unwrap();
        gpu.upload(set, BufferSlot::Index, 0, &[0; 8]);
        assert!(gpu.contents(set, BufferSlot::Index).is_none());
        assert_eq!(gpu.uploaded_bytes(), 0);
    }

    #[test]
    fn failing_creates_report_gpu_error() {
        let mut gpu = RecordingGpu::new();
        gpu.set_fail_creates(true);
        assert!(matches!(
            gpu.create_dynamic(RenderType::Lines, 4),
            Err(RenderError::Gpu(_))
        ));
    }

    #[test]
    fn summary_lists_live_sets() {
        let mut gpu = RecordingGpu::new();
        let a = gpu.create_dynamic(RenderType::Spheres, 128).unwrap();
        let b = gpu.create_dynamic(RenderType::Lines, 128).unwrap();
        gpu.upload(a, BufferSlot::Instance, 0, &[0; 36]);
        gpu.delete(b);

        let out = gpu.summary();
        assert!(out.contains("creates=2"));
        assert!(out.contains("deletes=1"));
        assert!(out.contains("Live buffer sets: 1"));
        assert!(out.contains("Instance=36"));
    }
}
