//! Zone registry: one bus, many zones, one handler per zone.

use heapless::Vec;

use crate::addressing::ZoneNumber;
use crate::config::PowerConfig;
use crate::error::{LgapError, Result};
use crate::power::TotalPower;
use crate::protocol::zone_frame::ZoneFrame;
use crate::publisher::StatePublisher;
use crate::zone::handler::ZoneHandler;
use crate::zone::MAX_ZONES;

/// Owns every zone handler and routes frames to them.
#[derive(Debug, Default)]
pub struct ZoneRegistry {
    handlers: Vec<ZoneHandler, MAX_ZONES>,
    unroutable: u32,
}

impl ZoneRegistry {
    pub const fn new() -> Self {
        Self {
            handlers: Vec::new(),
            unroutable: 0,
        }
    }

    /// Add a handler.
    ///
    /// # Errors
    ///
    /// `DuplicateZone` if the zone already has a handler, `RegistryFull` past
    /// [`MAX_ZONES`]. Both are configuration errors and must stop start-up.
    pub fn register(&mut self, handler: ZoneHandler) -> Result<()> {
        let zone = handler.zone();
        if self.contains(zone) {
            lgap_log!(error, "Zone {} registered twice", zone.raw());
            return Err(LgapError::DuplicateZone { zone: zone.raw() });
        }
        self.handlers
            .push(handler)
            .map_err(|_| LgapError::RegistryFull)?;
        lgap_log!(debug, "Registered zone {}", zone.raw());
        Ok(())
    }

    /// Route `frame` to its zone's handler.
    ///
    /// # Errors
    ///
    /// `UnroutableFrame` when no handler owns the zone. Nothing else is touched.
    pub fn dispatch<P: StatePublisher + ?Sized>(
        &mut self,
        frame: &ZoneFrame,
        power: &PowerConfig,
        now_ms: u64,
        publisher: &mut P,
    ) -> Result<()> {
        match self.get_mut(frame.zone) {
            Some(handler) => {
                handler.apply_frame(frame, power, now_ms, publisher);
                Ok(())
            }
            None => {
                self.unroutable = self.unroutable.saturating_add(1);
                Err(LgapError::UnroutableFrame {
                    zone: frame.zone.raw(),
                })
            }
        }
    }

    pub fn contains(&self, zone: ZoneNumber) -> bool {
        self.get(zone).is_some()
    }

    pub fn get(&self, zone: ZoneNumber) -> Option<&ZoneHandler> {
        self.handlers.iter().find(|h| h.zone() == zone)
    }

    pub fn get_mut(&mut self, zone: ZoneNumber) -> Option<&mut ZoneHandler> {
        self.handlers.iter_mut().find(|h| h.zone() == zone)
    }

    /// Handler at registration position `index`.
    pub fn get_index(&self, index: usize) -> Option<&ZoneHandler> {
        self.handlers.get(index)
    }

    pub fn get_index_mut(&mut self, index: usize) -> Option<&mut ZoneHandler> {
        self.handlers.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ZoneHandler> {
        self.handlers.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ZoneHandler> {
        self.handlers.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Frames dropped because no handler owned their zone.
    pub fn unroutable_count(&self) -> u32 {
        self.unroutable
    }

    /// Sum of every handler's latest estimate.
    pub fn total_power(&self) -> TotalPower {
        self.handlers.iter().map(ZoneHandler::power_kw).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::climate::ClimateCall;
    use crate::config::ZoneConfig;
    use crate::publisher::{NoopPublisher, RecordingPublisher};
    use crate::protocol::constants::FLAG_POWER;
    use crate::zone;

    fn handler(zone: ZoneNumber, id: &str) -> ZoneHandler {
        ZoneHandler::new(ZoneConfig::new(zone, id).unwrap()).unwrap()
    }

    fn status(zone: ZoneNumber, mode: u8, load: u8) -> ZoneFrame {
        let mut f = ZoneFrame::response(zone);
        f.flags = FLAG_POWER;
        f.operation = mode;
        f.zone_active_load = load;
        f.room_temp_raw = 129;
        f
    }

    #[test]
    fn test_duplicate_zone_rejected() {
        let mut registry = ZoneRegistry::new();
        registry.register(handler(zone!(0), "a")).unwrap();
        let err = registry.register(handler(zone!(0), "b")).unwrap_err();
        assert!(matches!(err, LgapError::DuplicateZone { zone: 0 }));
        assert!(err.is_fatal());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unroutable_zone_leaves_others_untouched() {
        let mut registry = ZoneRegistry::new();
        registry.register(handler(zone!(0), "a")).unwrap();
        registry.register(handler(zone!(1), "b")).unwrap();
        let mut publisher = RecordingPublisher::new();

        let err = registry
            .dispatch(&status(zone!(3), 0, 200), &PowerConfig::default(), 0, &mut publisher)
            .unwrap_err();
        assert!(matches!(err, LgapError::UnroutableFrame { zone: 3 }));
        assert!(!err.is_fatal());
        assert_eq!(registry.unroutable_count(), 1);

        for h in registry.iter() {
            assert_eq!(h.frames_seen(), 0);
            assert!(h.last_frame().is_none());
        }
        assert!(publisher.sensor_updates().is_empty());
    }

    #[test]
    fn test_dispatch_reaches_only_owner() {
        let mut registry = ZoneRegistry::new();
        registry.register(handler(zone!(0), "a")).unwrap();
        registry.register(handler(zone!(1), "b")).unwrap();

        registry
            .dispatch(&status(zone!(1), 0, 255), &PowerConfig::default(), 0, &mut NoopPublisher)
            .unwrap();
        assert_eq!(registry.get(zone!(0)).unwrap().frames_seen(), 0);
        assert_eq!(registry.get(zone!(1)).unwrap().frames_seen(), 1);
    }

    #[test]
    fn test_total_power_sums_latest_estimates() {
        let mut registry = ZoneRegistry::new();
        registry.register(handler(zone!(0), "a")).unwrap();
        registry.register(handler(zone!(1), "b")).unwrap();
        registry.register(handler(zone!(2), "c")).unwrap();

        // Cooling ceilings chosen so the load bytes map to round numbers
        let power = PowerConfig {
            cooling_max_kw: 5.1,
            heating_max_kw: 5.1,
            multiplier: 1.0,
        };
        registry
            .dispatch(&status(zone!(0), 0, 60), &power, 0, &mut NoopPublisher)
            .unwrap();
        registry
            .dispatch(&status(zone!(1), 2, 200), &power, 0, &mut NoopPublisher)
            .unwrap();
        registry
            .dispatch(&status(zone!(2), 0, 170), &power, 0, &mut NoopPublisher)
            .unwrap();

        // 1.2 (cool) + 0.0 (fan only) + 3.4 (cool)
        assert!((registry.total_power().kw() - 4.6).abs() < 1e-4);

        // One zone reporting again is enough to move the total
        registry
            .dispatch(&status(zone!(2), 0, 0), &power, 10, &mut NoopPublisher)
            .unwrap();
        assert!((registry.total_power().kw() - 1.2).abs() < 1e-4);
    }

    #[test]
    fn test_registry_full() {
        let mut registry = ZoneRegistry::new();
        for raw in 0..MAX_ZONES as u8 {
            let mut id = heapless::String::<8>::new();
            core::fmt::Write::write_fmt(&mut id, format_args!("z{raw}")).unwrap();
            registry
                .register(handler(ZoneNumber::new(raw).unwrap(), &id))
                .unwrap();
        }
        assert_eq!(registry.len(), MAX_ZONES);
        let err = registry.register(handler(zone!(40), "extra")).unwrap_err();
        assert!(matches!(err, LgapError::RegistryFull));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_pending_control_survives_dispatch() {
        let mut registry = ZoneRegistry::new();
        registry.register(handler(zone!(0), "a")).unwrap();
        registry
            .get_mut(zone!(0))
            .unwrap()
            .control(&ClimateCall::new().with_target(25.0), &mut NoopPublisher);
        registry
            .dispatch(&status(zone!(0), 0, 0), &PowerConfig::default(), 0, &mut NoopPublisher)
            .unwrap();
        assert_eq!(registry.get(zone!(0)).unwrap().climate().target, 25);
    }
}
