//! # Device Lifecycle Tracker
//!
//! Keeps the set of attached devices and selects the single active device
//! whose input drives the rover.
//!
//! Every device keeps the id its provider knows it by (`source`: the
//! instance id when there is one, else the enumeration index). The tracker id
//! starts from that value and is bumped to the next free value on collision,
//! so a tracker id always names exactly one attached device while reads and
//! detach events still go through the provider's id.
//!
//! ## Selection
//!
//! While no device has been selected, the last-attached device is the
//! pending control source, so a batch of simultaneous attaches ends with the
//! last one active. The loop selects the active device when it reads the
//! first frame from it; later attaches then leave it alone.

use std::collections::BTreeMap;

use tracing::{debug, info};

use super::{Device, DeviceId, RawDevice};

/// Attached devices and the active one.
#[derive(Debug, Default)]
pub struct DeviceTracker {
    devices: BTreeMap<DeviceId, Device>,
    active: Option<DeviceId>,
    /// Whether the active device has been bound as control source.
    selected: bool,
}

impl DeviceTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a newly attached device.
    ///
    /// The device becomes active unless a device is already selected.
    pub fn on_attach(&mut self, raw: RawDevice) -> &Device {
        let source = raw
            .instance_id
            .unwrap_or(DeviceId(u32::try_from(raw.index).unwrap_or(u32::MAX)));
        let id = self.next_free_id(source);
        if id != source {
            debug!("Controller id {} is taken, tracking as {}", source, id);
        }

        let device = Device {
            id,
            source,
            name: raw.name,
            guid: raw.guid,
            axis_count: raw.axis_count,
            button_count: raw.button_count,
            hat_count: raw.hat_count,
        };

        info!(
            "Controller {} attached: {} ({} axes, {} buttons, {} hats)",
            id, device.name, device.axis_count, device.button_count, device.hat_count
        );
        match &device.guid {
            Some(guid) => debug!("Controller {} GUID: {}", id, guid),
            None => debug!("Controller {} does not report a GUID", id),
        }

        if !self.selected {
            info!("Controller {} is now the active control source", id);
            self.active = Some(id);
        }

        self.devices.entry(id).or_insert(device)
    }

    /// Handles a provider detach event for the provider id `source`.
    ///
    /// When several attached devices share that provider id, the one with
    /// the lowest tracker id is removed.
    pub fn on_detach(&mut self, source: DeviceId) -> Option<Device> {
        let id = self
            .devices
            .values()
            .find(|device| device.source == source)
            .map(|device| device.id);

        match id {
            Some(id) => self.remove(id),
            None => {
                debug!("Ignoring detach of unknown controller {}", source);
                None
            }
        }
    }

    /// Removes a device by tracker id, e.g. after a failed read.
    ///
    /// Removing the active device leaves no active device until the next
    /// attach; remaining devices are not promoted.
    pub fn remove(&mut self, id: DeviceId) -> Option<Device> {
        let removed = self.devices.remove(&id);

        if let Some(device) = &removed {
            info!(
                "Controller {} detached: {} ({} remaining)",
                id,
                device.name,
                self.devices.len()
            );
        }

        if self.active == Some(id) {
            info!("Active controller lost, waiting for a controller to attach");
            self.active = None;
            self.selected = false;
        }

        removed
    }

    /// Binds the active device as control source and returns it.
    pub fn select_active(&mut self) -> Option<&Device> {
        let device = self.active.and_then(|id| self.devices.get(&id))?;
        if !self.selected {
            debug!("Controller {} selected", device.id);
            self.selected = true;
        }
        Some(device)
    }

    /// The device currently feeding the mapper.
    #[must_use]
    pub fn active_device(&self) -> Option<&Device> {
        self.active.and_then(|id| self.devices.get(&id))
    }

    /// Whether the active device has been bound by [`select_active`](Self::select_active).
    #[must_use]
    pub fn is_selected(&self) -> bool {
        self.selected
    }

    /// All attached devices ordered by id.
    pub fn devices(&self) -> impl Iterator<Item = &Device> {
        self.devices.values()
    }

    /// Number of attached devices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Whether no device is attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    fn next_free_id(&self, preferred: DeviceId) -> DeviceId {
        let mut candidate = preferred.0;
        while self.devices.contains_key(&DeviceId(candidate)) {
            candidate = candidate.wrapping_add(1);
        }
        DeviceId(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(instance_id: Option<u32>, index: usize, name: &str) -> RawDevice {
        RawDevice {
            instance_id: instance_id.map(DeviceId),
            index,
            name: name.to_string(),
            guid: None,
            axis_count: 6,
            button_count: 11,
            hat_count: 1,
        }
    }

    #[test]
    fn test_first_attach_becomes_active() {
        let mut tracker = DeviceTracker::new();
        assert!(tracker.active_device().is_none());

        let id = tracker.on_attach(raw(Some(5), 0, "Xbox Controller")).id;

        assert_eq!(id, DeviceId(5));
        assert_eq!(tracker.active_device().map(|d| d.id), Some(DeviceId(5)));
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_falls_back_to_enumeration_index() {
        let mut tracker = DeviceTracker::new();
        let id = tracker.on_attach(raw(None, 2, "Generic Pad")).id;
        assert_eq!(id, DeviceId(2));
    }

    #[test]
    fn test_colliding_id_takes_next_free() {
        let mut tracker = DeviceTracker::new();
        tracker.on_attach(raw(None, 0, "First"));
        tracker.on_attach(raw(Some(1), 1, "Second"));
        let id = tracker.on_attach(raw(None, 0, "Third")).id;

        assert_eq!(id, DeviceId(2));
        assert_eq!(tracker.len(), 3);
    }

    #[test]
    fn test_bumped_device_keeps_provider_id() {
        let mut tracker = DeviceTracker::new();
        tracker.on_attach(raw(Some(0), 0, "First"));
        tracker.select_active();
        let bumped = tracker.on_attach(raw(None, 0, "Second")).clone();

        assert_eq!(bumped.id, DeviceId(1));
        assert_eq!(bumped.source, DeviceId(0));
    }

    #[test]
    fn test_detach_event_uses_provider_id() {
        let mut tracker = DeviceTracker::new();
        tracker.on_attach(raw(None, 3, "Index Pad"));
        tracker.on_attach(raw(Some(3), 0, "Instance Pad"));

        // Tracker ids 3 and 4, both known to the provider as #3.
        let removed = tracker.on_detach(DeviceId(3)).unwrap();
        assert_eq!(removed.id, DeviceId(3));
        assert_eq!(tracker.devices().map(|d| d.id).collect::<Vec<_>>(), vec![DeviceId(4)]);
    }

    #[test]
    fn test_remove_by_tracker_id() {
        let mut tracker = DeviceTracker::new();
        tracker.on_attach(raw(Some(7), 0, "First"));
        tracker.on_attach(raw(None, 7, "Second"));

        let removed = tracker.remove(DeviceId(8)).unwrap();

        assert_eq!(removed.name, "Second");
        assert_eq!(removed.source, DeviceId(7));
        assert!(tracker.active_device().is_none());
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_last_attached_wins_while_none_selected() {
        let mut tracker = DeviceTracker::new();
        tracker.on_attach(raw(Some(0), 0, "First"));
        tracker.on_attach(raw(Some(1), 1, "Second"));

        assert!(!tracker.is_selected());
        assert_eq!(tracker.active_device().map(|d| d.id), Some(DeviceId(1)));
    }

    #[test]
    fn test_attach_does_not_steal_selected_device() {
        let mut tracker = DeviceTracker::new();
        tracker.on_attach(raw(Some(0), 0, "First"));
        assert_eq!(tracker.select_active().map(|d| d.id), Some(DeviceId(0)));

        tracker.on_attach(raw(Some(1), 1, "Second"));

        assert!(tracker.is_selected());
        assert_eq!(tracker.active_device().map(|d| d.id), Some(DeviceId(0)));
    }

    #[test]
    fn test_select_without_devices() {
        let mut tracker = DeviceTracker::new();
        assert!(tracker.select_active().is_none());
        assert!(!tracker.is_selected());
    }

    #[test]
    fn test_detach_active_clears_active() {
        let mut tracker = DeviceTracker::new();
        tracker.on_attach(raw(Some(0), 0, "First"));
        tracker.select_active();
        tracker.on_attach(raw(Some(1), 1, "Second"));

        let removed = tracker.on_detach(DeviceId(0));

        assert_eq!(removed.map(|d| d.name), Some("First".to_string()));
        assert!(tracker.active_device().is_none());
        assert!(!tracker.is_selected());
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_attach_after_detach_becomes_active() {
        let mut tracker = DeviceTracker::new();
        tracker.on_attach(raw(Some(0), 0, "First"));
        tracker.select_active();
        tracker.on_attach(raw(Some(1), 1, "Second"));
        tracker.on_detach(DeviceId(0));

        tracker.on_attach(raw(Some(2), 0, "Third"));

        assert_eq!(tracker.active_device().map(|d| d.id), Some(DeviceId(2)));
    }

    #[test]
    fn test_detach_inactive_keeps_active() {
        let mut tracker = DeviceTracker::new();
        tracker.on_attach(raw(Some(0), 0, "First"));
        tracker.select_active();
        tracker.on_attach(raw(Some(1), 1, "Second"));

        tracker.on_detach(DeviceId(1));

        assert_eq!(tracker.active_device().map(|d| d.id), Some(DeviceId(0)));
    }

    #[test]
    fn test_detach_unknown_is_noop() {
        let mut tracker = DeviceTracker::new();
        tracker.on_attach(raw(Some(0), 0, "First"));

        assert!(tracker.on_detach(DeviceId(9)).is_none());
        assert_eq!(tracker.len(), 1);
        assert!(tracker.active_device().is_some());
    }

    #[test]
    fn test_guid_is_kept() {
        let mut tracker = DeviceTracker::new();
        let mut device = raw(Some(0), 0, "Pad");
        device.guid = Some("030000005e0400008e02000014010000".to_string());

        let tracked = tracker.on_attach(device);
        assert_eq!(
            tracked.guid.as_deref(),
            Some("030000005e0400008e02000014010000")
        );
    }
}
