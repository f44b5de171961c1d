//! Host publication seam.
//!
//! The bus never talks to the automation platform directly. Everything it
//! wants the host to see goes through [`StatePublisher`]: sensor readings by
//! resolved entity, and the climate state of a zone.
//!
//! [`RecordingPublisher`] keeps everything it is given, for tests and for
//! hosts that poll rather than subscribe.

extern crate alloc;

use alloc::vec::Vec;

use crate::addressing::ZoneNumber;
use crate::climate::ClimateState;
use crate::entity::{EntityDescriptor, EntityId};

/// Receives every state change the bus produces.
pub trait StatePublisher {
    /// A sensor or number entity has a new value.
    fn publish_sensor(&mut self, entity: &EntityDescriptor, value: f32);

    /// A zone's climate state changed.
    fn publish_climate(&mut self, zone: ZoneNumber, state: &ClimateState);
}

impl<P: StatePublisher + ?Sized> StatePublisher for &mut P {
    fn publish_sensor(&mut self, entity: &EntityDescriptor, value: f32) {
        (**self).publish_sensor(entity, value);
    }

    fn publish_climate(&mut self, zone: ZoneNumber, state: &ClimateState) {
        (**self).publish_climate(zone, state);
    }
}

/// Publisher that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPublisher;

impl StatePublisher for NoopPublisher {
    fn publish_sensor(&mut self, _entity: &EntityDescriptor, _value: f32) {}

    fn publish_climate(&mut self, _zone: ZoneNumber, _state: &ClimateState) {}
}

/// Publisher that records every call in order.
///
/// # Examples
///
/// ```
/// use lgap_bus::publisher::{RecordingPublisher, StatePublisher};
/// use lgap_bus::climate::ClimateState;
/// use lgap_bus::zone;
///
/// let mut publisher = RecordingPublisher::new();
/// publisher.publish_climate(zone!(1), &ClimateState::default());
/// assert_eq!(publisher.climate_updates().len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    sensors: Vec<(EntityId, f32)>,
    climate: Vec<(ZoneNumber, ClimateState)>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every sensor value published, oldest first.
    pub fn sensor_updates(&self) -> &[(EntityId, f32)] {
        &self.sensors
    }

    /// Every climate state published, oldest first.
    pub fn climate_updates(&self) -> &[(ZoneNumber, ClimateState)] {
        &self.climate
    }

    /// Most recent value published for entity `id`.
    pub fn last_value(&self, id: &str) -> Option<f32> {
        self.sensors
            .iter()
            .rev()
            .find(|(entity, _)| entity.as_str() == id)
            .map(|(_, v)| *v)
    }

    /// Number of values published for entity `id`.
    pub fn count(&self, id: &str) -> usize {
        self.sensors
            .iter()
            .filter(|(entity, _)| entity.as_str() == id)
            .count()
    }

    /// Most recent climate state published for `zone`.
    pub fn last_climate(&self, zone: ZoneNumber) -> Option<&ClimateState> {
        self.climate
            .iter()
            .rev()
            .find(|(z, _)| *z == zone)
            .map(|(_, s)| s)
    }

    /// Forget everything recorded so far.
    pub fn clear(&mut self) {
        self.sensors.clear();
        self.climate.clear();
    }
}

impl StatePublisher for RecordingPublisher {
    fn publish_sensor(&mut self, entity: &EntityDescriptor, value: f32) {
        self.sensors.push((entity.id.clone(), value));
    }

    fn publish_climate(&mut self, zone: ZoneNumber, state: &ClimateState) {
        self.climate.push((zone, *state));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{resolve_or_generate, ZoneField};
    use crate::zone;

    #[test]
    fn test_recording_publisher() {
        let entity =
            resolve_or_generate(None, "Den", "den", &ZoneField::Power.template()).unwrap();
        let mut publisher = RecordingPublisher::new();
        publisher.publish_sensor(&entity, 1.5);
        publisher.publish_sensor(&entity, 2.5);

        assert_eq!(publisher.count("den_power"), 2);
        assert_eq!(publisher.last_value("den_power"), Some(2.5));
        assert_eq!(publisher.last_value("den_pipe_in"), None);

        publisher.publish_climate(zone!(4), &ClimateState::default());
        assert!(publisher.last_climate(zone!(4)).is_some());
        assert!(publisher.last_climate(zone!(5)).is_none());

        publisher.clear();
        assert!(publisher.sensor_updates().is_empty());
    }

    #[test]
    fn test_publisher_through_mut_ref() {
        fn publish(mut p: impl StatePublisher) {
            p.publish_climate(zone!(0), &ClimateState::default());
        }

        let mut publisher = RecordingPublisher::new();
        publish(&mut publisher);
        assert_eq!(publisher.climate_updates().len(), 1);
    }
}
