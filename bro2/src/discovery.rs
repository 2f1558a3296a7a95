//! Device discovery
//!
//! Discovery is driven by the caller: a [`Probe`] sends the broadcast query
//! and hands back replies, and [`discover`] collects them into a
//! [`DeviceRegistry`] until a deadline passes.
//!
//! ```text
//! discover()
//!   ├─ probe.broadcast()
//!   └─ loop until deadline / registry full
//!        ├─ probe.next_response() ──► Some(device) ──► registry.insert()
//!        └─                       └─► None ──► sleep(poll interval)
//! ```

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{Instant, sleep, timeout};
use tracing::{debug, info};

use bro2_types::{DeviceName, DiscoveredDevice};

use crate::error::Result;

/// Default registry size
pub const DEFAULT_REGISTRY_CAPACITY: usize = 64;

/// Delay between polls when no reply is pending
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Source of discovery replies
#[async_trait]
pub trait Probe: Send {
    /// Send the discovery query
    async fn broadcast(&mut self) -> Result<()>;

    /// Next reply, or `None` if nothing is pending right now
    async fn next_response(&mut self) -> Result<Option<DiscoveredDevice>>;
}

/// Devices found so far, at most one entry per host
#[derive(Debug, Clone)]
pub struct DeviceRegistry {
    devices: Vec<DiscoveredDevice>,
    capacity: usize,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_REGISTRY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            devices: Vec::new(),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.devices.len() >= self.capacity
    }

    /// Record a device
    ///
    /// Returns `true` if the host was new. A reply from a known host
    /// refreshes its model and timestamp. New hosts are dropped once the
    /// registry is full.
    pub fn insert(&mut self, device: DiscoveredDevice) -> bool {
        if let Some(known) = self.devices.iter_mut().find(|d| d.host == device.host) {
            *known = device;
            return false;
        }

        if self.is_full() {
            debug!(host = %device.host, "Registry full, dropping device");
            return false;
        }

        self.devices.push(device);
        true
    }

    /// Look up a device by host
    pub fn get(&self, host: &str) -> Option<&DiscoveredDevice> {
        self.devices.iter().find(|d| d.host == host)
    }

    /// Frontend names of all known devices
    pub fn names(&self) -> Vec<DeviceName> {
        self.devices.iter().map(DiscoveredDevice::name).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DiscoveredDevice> {
        self.devices.iter()
    }

    pub fn clear(&mut self) {
        self.devices.clear();
    }
}

impl Default for DeviceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Broadcast once and collect replies until `wait` has elapsed
///
/// Stops early when the registry is full. Returns the number of new hosts.
pub async fn discover<P>(probe: &mut P, registry: &mut DeviceRegistry, wait: Duration) -> Result<usize>
where
    P: Probe + ?Sized,
{
    let deadline = Instant::now() + wait;
    let mut added = 0;

    probe.broadcast().await?;

    while !registry.is_full() {
        let left = deadline.saturating_duration_since(Instant::now());
        if left.is_zero() {
            break;
        }

        match timeout(left, probe.next_response()).await {
            Ok(Ok(Some(device))) => {
                debug!(%device, "Discovery reply");
                if registry.insert(device) {
                    added += 1;
                }
            }
            Ok(Ok(None)) => sleep(POLL_INTERVAL.min(left)).await,
            Ok(Err(e)) => return Err(e),
            Err(_) => break,
        }
    }

    info!("Discovery finished: {} new, {} known", added, registry.len());
    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    use pretty_assertions::assert_eq;

    use crate::Error;

    struct FakeProbe {
        replies: VecDeque<Option<DiscoveredDevice>>,
        broadcasts: usize,
    }

    impl FakeProbe {
        fn new(replies: Vec<Option<DiscoveredDevice>>) -> Self {
            Self {
                replies: replies.into(),
                broadcasts: 0,
            }
        }
    }

    #[async_trait]
    impl Probe for FakeProbe {
        async fn broadcast(&mut self) -> Result<()> {
            self.broadcasts += 1;
            Ok(())
        }

        async fn next_response(&mut self) -> Result<Option<DiscoveredDevice>> {
            Ok(self.replies.pop_front().flatten())
        }
    }

    struct BrokenProbe;

    #[async_trait]
    impl Probe for BrokenProbe {
        async fn broadcast(&mut self) -> Result<()> {
            Ok(())
        }

        async fn next_response(&mut self) -> Result<Option<DiscoveredDevice>> {
            Err(Error::Disconnected)
        }
    }

    fn found(host: &str) -> Option<DiscoveredDevice> {
        Some(DiscoveredDevice::new(host, "MFC-7860DW"))
    }

    #[test]
    fn test_registry_dedup() {
        let mut registry = DeviceRegistry::new();
        assert!(registry.insert(DiscoveredDevice::new("10.0.0.5", "DCP-7055")));
        assert!(!registry.insert(DiscoveredDevice::new("10.0.0.5", "DCP-7065DN")));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("10.0.0.5").unwrap().model, "DCP-7065DN");
        assert_eq!(registry.names()[0].to_string(), "bro2:10.0.0.5");
    }

    #[test]
    fn test_registry_bounded() {
        let mut registry = DeviceRegistry::with_capacity(1);
        assert!(registry.insert(DiscoveredDevice::new("10.0.0.5", "A")));
        assert!(!registry.insert(DiscoveredDevice::new("10.0.0.6", "B")));
        assert!(registry.is_full());
        assert!(registry.get("10.0.0.6").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_discover_until_deadline() {
        let mut probe = FakeProbe::new(vec![
            found("10.0.0.5"),
            None,
            found("10.0.0.6"),
            found("10.0.0.5"),
        ]);
        let mut registry = DeviceRegistry::new();

        let added = discover(&mut probe, &mut registry, Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(added, 2);
        assert_eq!(probe.broadcasts, 1);
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_discover_stops_when_full() {
        let mut probe = FakeProbe::new(vec![found("10.0.0.5"), found("10.0.0.6"), found("10.0.0.7")]);
        let mut registry = DeviceRegistry::with_capacity(2);

        let added = discover(&mut probe, &mut registry, Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(added, 2);
        assert_eq!(probe.replies.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_discover_zero_wait() {
        let mut probe = FakeProbe::new(vec![found("10.0.0.5")]);
        let mut registry = DeviceRegistry::new();

        let added = discover(&mut probe, &mut registry, Duration::ZERO).await.unwrap();
        assert_eq!(added, 0);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_discover_probe_error() {
        let mut registry = DeviceRegistry::new();
        let result = discover(&mut BrokenProbe, &mut registry, Duration::from_secs(1)).await;
        assert!(matches!(result, Err(Error::Disconnected)));
    }
}
