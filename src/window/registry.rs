use std::collections::BTreeMap;

use super::{AppKind, Position, Size, WindowId};
use crate::constants::Z_FLOOR;
use crate::origin::Origin;

/// Behavior switches for the registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryPolicy {
    /// When set, activating a window through `open` minimizes every other
    /// visible window so at most one window is on screen at a time.
    pub exclusive_focus: bool,
}

/// State of one launchable sub-application window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowRecord {
    pub id: WindowId,
    pub kind: AppKind,
    pub title: String,
    pub remote_url: String,
    pub remote_origin: Origin,
    pub position: Position,
    pub size: Size,
    is_open: bool,
    is_minimized: bool,
    z_index: u32,
    minimized_seq: u64,
}

impl WindowRecord {
    /// Build a closed record. It becomes visible on the first `open`.
    pub fn new(
        id: WindowId,
        kind: AppKind,
        title: impl Into<String>,
        remote_url: impl Into<String>,
        remote_origin: Origin,
    ) -> Self {
        Self {
            id,
            kind,
            title: title.into(),
            remote_url: remote_url.into(),
            remote_origin,
            position: Position::default(),
            size: Size::default(),
            is_open: false,
            is_minimized: false,
            z_index: 0,
            minimized_seq: 0,
        }
    }

    pub fn with_geometry(mut self, position: Position, size: Size) -> Self {
        self.position = position;
        self.size = size;
        self
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn is_minimized(&self) -> bool {
        self.is_minimized
    }

    pub fn is_visible(&self) -> bool {
        self.is_open && !self.is_minimized
    }

    pub fn z_index(&self) -> u32 {
        self.z_index
    }
}

/// Lifecycle notifications drained by the shell to mount and unmount
/// surfaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEvent {
    Opened(WindowId),
    Closed(WindowId),
}

/// Authoritative collection of window records.
///
/// Every operation is total: unknown ids and transitions that do not apply
/// to the record's current state are ignored, since stale UI callbacks
/// (double clicks, late taskbar clicks) routinely produce them.
#[derive(Debug, Clone)]
pub struct WindowRegistry {
    records: BTreeMap<WindowId, WindowRecord>,
    policy: RegistryPolicy,
    // Last z value handed out; only ever grows.
    z_top: u32,
    minimize_seq: u64,
    events: Vec<RegistryEvent>,
}

impl Default for WindowRegistry {
    fn default() -> Self {
        Self::new(RegistryPolicy::default())
    }
}

impl WindowRegistry {
    pub fn new(policy: RegistryPolicy) -> Self {
        Self {
            records: BTreeMap::new(),
            policy,
            z_top: Z_FLOOR,
            minimize_seq: 0,
            events: Vec::new(),
        }
    }

    pub fn policy(&self) -> RegistryPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: RegistryPolicy) {
        self.policy = policy;
    }

    /// Add a launchable record. An existing record with the same id is
    /// replaced only while it is closed, so configuration reloads cannot
    /// clobber a live window.
    pub fn register(&mut self, mut record: WindowRecord) -> bool {
        if self.records.get(&record.id).is_some_and(|r| r.is_open) {
            return false;
        }
        record.is_open = false;
        record.is_minimized = false;
        self.records.insert(record.id.clone(), record);
        true
    }

    pub fn get(&self, id: &WindowId) -> Option<&WindowRecord> {
        self.records.get(id)
    }

    pub fn records(&self) -> impl Iterator<Item = &WindowRecord> {
        self.records.values()
    }

    /// Current top of the z counter.
    pub fn z_top(&self) -> u32 {
        self.z_top
    }

    fn next_z(&mut self) -> u32 {
        self.z_top = self.z_top.saturating_add(1);
        self.z_top
    }

    /// Activate-or-collapse, the launcher affordance:
    /// closed → open on top; open and focused → minimize;
    /// minimized → restore; open behind another window → focus.
    pub fn open(&mut self, id: &WindowId) {
        let Some(record) = self.records.get(id) else {
            tracing::debug!(window_id = %id, "open ignored for unknown window");
            return;
        };
        if !record.is_open {
            let z = self.next_z();
            if let Some(record) = self.records.get_mut(id) {
                record.is_open = true;
                record.is_minimized = false;
                record.z_index = z;
            }
            tracing::debug!(window_id = %id, z, "opened window");
            self.events.push(RegistryEvent::Opened(id.clone()));
            self.apply_exclusive_focus(id);
        } else if record.is_minimized {
            self.restore(id);
            self.apply_exclusive_focus(id);
        } else if self.focused_id().as_ref() == Some(id) {
            self.minimize(id);
        } else {
            self.focus(id);
            self.apply_exclusive_focus(id);
        }
    }

    fn apply_exclusive_focus(&mut self, keep: &WindowId) {
        if !self.policy.exclusive_focus {
            return;
        }
        let others: Vec<WindowId> = self
            .records
            .values()
            .filter(|r| r.is_visible() && r.id != *keep)
            .map(|r| r.id.clone())
            .collect();
        for other in others {
            self.minimize(&other);
        }
    }

    pub fn close(&mut self, id: &WindowId) {
        let Some(record) = self.records.get_mut(id) else {
            return;
        };
        if !record.is_open {
            return;
        }
        record.is_open = false;
        record.is_minimized = false;
        tracing::debug!(window_id = %id, "closed window");
        self.events.push(RegistryEvent::Closed(id.clone()));
    }

    pub fn minimize(&mut self, id: &WindowId) {
        self.minimize_seq = self.minimize_seq.saturating_add(1);
        let seq = self.minimize_seq;
        let Some(record) = self.records.get_mut(id) else {
            return;
        };
        if !record.is_open || record.is_minimized {
            return;
        }
        record.is_minimized = true;
        record.minimized_seq = seq;
        tracing::debug!(window_id = %id, "minimized window");
    }

    pub fn restore(&mut self, id: &WindowId) {
        if !self
            .records
            .get(id)
            .is_some_and(|r| r.is_open && r.is_minimized)
        {
            return;
        }
        let z = self.next_z();
        if let Some(record) = self.records.get_mut(id) {
            record.is_minimized = false;
            record.z_index = z;
            tracing::debug!(window_id = %id, z, "restored window");
        }
    }

    pub fn focus(&mut self, id: &WindowId) {
        if !self.records.get(id).is_some_and(WindowRecord::is_visible) {
            return;
        }
        // Focusing the window already on top keeps its z so repeated header
        // clicks do not burn counter values.
        if self.focused_id().as_ref() == Some(id) {
            return;
        }
        let z = self.next_z();
        if let Some(record) = self.records.get_mut(id) {
            record.z_index = z;
        }
    }

    /// Store a new frame position for an open window.
    pub fn move_to(&mut self, id: &WindowId, position: Position) {
        if let Some(record) = self.records.get_mut(id)
            && record.is_open
        {
            record.position = position;
        }
    }

    /// Open, non-minimized records in draw order (ascending z).
    pub fn visible(&self) -> Vec<&WindowRecord> {
        let mut visible: Vec<&WindowRecord> =
            self.records.values().filter(|r| r.is_visible()).collect();
        visible.sort_by_key(|r| r.z_index);
        visible
    }

    /// Open, minimized records, most recently minimized first.
    pub fn minimized(&self) -> Vec<&WindowRecord> {
        let mut minimized: Vec<&WindowRecord> = self
            .records
            .values()
            .filter(|r| r.is_open && r.is_minimized)
            .collect();
        minimized.sort_by(|a, b| b.minimized_seq.cmp(&a.minimized_seq));
        minimized
    }

    /// The visible record that holds the highest z.
    pub fn focused(&self) -> Option<&WindowRecord> {
        self.records
            .values()
            .filter(|r| r.is_visible())
            .max_by_key(|r| r.z_index)
    }

    fn focused_id(&self) -> Option<WindowId> {
        self.focused().map(|r| r.id.clone())
    }

    /// Drain lifecycle events queued since the last call.
    pub fn take_events(&mut self) -> Vec<RegistryEvent> {
        std::mem::take(&mut self.events)
    }
}
