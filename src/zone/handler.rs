//! State of one zone.
//!
//! A [`ZoneHandler`] owns everything the bus knows about one indoor unit:
//! the climate state, the last status frame, the sleep timer, the latest
//! power estimate and the resolved entity table. It is created from a
//! [`ZoneConfig`] at start-up and lives as long as the bus.
//!
//! While a host write is pending, status frames only refresh measurements;
//! the unit's stale control values must not overwrite what the host just
//! asked for.

use core::time::Duration;

use crate::addressing::ZoneNumber;
use crate::climate::{clamp_target, ClimateCall, ClimateMode, ClimateState};
use crate::config::{PowerConfig, ZoneConfig};
use crate::entity::{ZoneEntities, ZoneField};
use crate::error::Result;
use crate::power;
use crate::protocol::command::{Request, RequestKind};
use crate::protocol::zone_frame::ZoneFrame;
use crate::publisher::StatePublisher;
use crate::sleep_timer::{SleepTimer, TimerEvent};

/// Fields republished verbatim from every status frame.
const FRAME_FIELDS: [ZoneField; 13] = [
    ZoneField::LoadByte,
    ZoneField::PipeIn,
    ZoneField::PipeOut,
    ZoneField::Byte3,
    ZoneField::Byte5,
    ZoneField::Byte11,
    ZoneField::Byte12,
    ZoneField::ZoneLoadIndex,
    ZoneField::OduActiveLoad,
    ZoneField::ZoneActiveLoad,
    ZoneField::ZonePowerState,
    ZoneField::ZoneDesignLoad,
    ZoneField::OduTotalLoad,
];

/// Per-zone handler.
#[derive(Debug, Clone)]
pub struct ZoneHandler {
    config: ZoneConfig,
    entities: ZoneEntities,
    climate: ClimateState,
    write_pending: bool,
    last_frame: Option<ZoneFrame>,
    timer: SleepTimer,
    power_kw: f32,
    last_temperature_publish_ms: Option<u64>,
    frames_seen: u32,
    /// Mode code the unit last ran in, sent again when powering it off
    last_mode_code: u8,
}

impl ZoneHandler {
    /// Build a handler, resolving every entity binding.
    pub fn new(config: ZoneConfig) -> Result<Self> {
        config.validate()?;
        let name = config.display_name()?;
        let entities = ZoneEntities::resolve(&name, &config.id, |field| config.binding(field))?;

        Ok(Self {
            config,
            entities,
            climate: ClimateState::default(),
            write_pending: false,
            last_frame: None,
            timer: SleepTimer::new(),
            power_kw: 0.0,
            last_temperature_publish_ms: None,
            frames_seen: 0,
            last_mode_code: 0,
        })
    }

    pub fn zone(&self) -> ZoneNumber {
        self.config.zone
    }

    pub fn config(&self) -> &ZoneConfig {
        &self.config
    }

    pub fn entities(&self) -> &ZoneEntities {
        &self.entities
    }

    pub fn climate(&self) -> &ClimateState {
        &self.climate
    }

    /// A host change has not been sent to the unit yet.
    pub fn write_pending(&self) -> bool {
        self.write_pending
    }

    /// Most recent status frame.
    pub fn last_frame(&self) -> Option<&ZoneFrame> {
        self.last_frame.as_ref()
    }

    pub fn timer(&self) -> &SleepTimer {
        &self.timer
    }

    /// Latest power estimate (kW).
    pub fn power_kw(&self) -> f32 {
        self.power_kw
    }

    /// Status frames applied so far.
    pub fn frames_seen(&self) -> u32 {
        self.frames_seen
    }

    /// Apply one status frame and publish what it changed.
    pub fn apply_frame<P: StatePublisher + ?Sized>(
        &mut self,
        frame: &ZoneFrame,
        power_config: &PowerConfig,
        now_ms: u64,
        publisher: &mut P,
    ) {
        self.frames_seen = self.frames_seen.saturating_add(1);
        let zone = self.zone();

        if frame.error_code() != 0 {
            lgap_log!(warn, "Zone {} error code: {}", zone.raw(), frame.error_code());
        }

        let mut changed = false;
        if !self.write_pending {
            changed |= self.take_control_state(frame);
        }

        let current = frame.room_temperature();
        if self.climate.current != Some(current) {
            let due = match self.last_temperature_publish_ms {
                None => true,
                Some(last) => {
                    now_ms.saturating_sub(last) >= u64::from(self.config.temperature_publish_ms)
                }
            };
            if due {
                lgap_log!(debug, "Zone {} temperature now {}", zone.raw(), current);
                self.climate.current = Some(current);
                self.last_temperature_publish_ms = Some(now_ms);
                changed = true;
            }
        }

        if changed {
            publisher.publish_climate(zone, &self.climate);
        }

        for field in FRAME_FIELDS {
            if let (Some(entity), Some(value)) = (self.entities.get(field), field.value_from(frame)) {
                publisher.publish_sensor(entity, value);
            }
        }

        self.power_kw = power::estimate(frame, self.climate.mode, power_config);
        if let Some(entity) = self.entities.get(ZoneField::Power) {
            publisher.publish_sensor(entity, self.power_kw);
        }

        self.last_frame = Some(*frame);
    }

    fn take_control_state(&mut self, frame: &ZoneFrame) -> bool {
        let before = self.climate;

        if ClimateMode::from_code(frame.mode_code()).is_some() {
            self.last_mode_code = frame.mode_code();
        } else if frame.power_on() {
            lgap_log!(warn, "Invalid mode received: {}", frame.mode_code());
        }
        self.climate.mode = frame.mode();
        self.climate.swing = frame.swing();
        if let Some(fan) = frame.fan() {
            self.climate.fan = fan;
        }
        self.climate.target = frame.target_temperature();

        self.climate != before
    }

    /// Apply a host control request. Returns whether anything changed.
    pub fn control<P: StatePublisher + ?Sized>(
        &mut self,
        call: &ClimateCall,
        publisher: &mut P,
    ) -> bool {
        let before = self.climate;

        if let Some(mode) = call.mode {
            self.climate.mode = mode;
            if let Some(code) = mode.code() {
                self.last_mode_code = code;
            }
        }
        if let Some(fan) = call.fan {
            self.climate.fan = fan;
        }
        if let Some(swing) = call.swing {
            self.climate.swing = swing;
        }
        if let Some(target) = call.target {
            self.climate.target = clamp_target(self.climate.mode, target);
        }

        let changed = self.climate != before;
        if changed {
            lgap_log!(
                info,
                "Zone {} control change: mode {}, target {}",
                self.zone().raw(),
                self.climate.mode.as_str(),
                self.climate.target
            );
            self.write_pending = true;
            publisher.publish_climate(self.zone(), &self.climate);
        }
        changed
    }

    /// Arm or cancel the sleep timer from a host write.
    ///
    /// # Errors
    ///
    /// `InvalidTimerValue` above 420 minutes; nothing is published.
    pub fn set_sleep_timer<P: StatePublisher + ?Sized>(
        &mut self,
        minutes: u16,
        publisher: &mut P,
    ) -> Result<()> {
        match self.timer.set(minutes)? {
            Some(TimerEvent::Started { minutes }) => {
                lgap_log!(info, "Zone {} sleep timer set for {} minutes", self.zone().raw(), minutes);
                self.publish_timer(f32::from(minutes), f32::from(minutes), publisher);
            }
            Some(TimerEvent::Cancelled) => {
                lgap_log!(info, "Zone {} sleep timer cancelled", self.zone().raw());
                self.publish_timer(0.0, 0.0, publisher);
            }
            _ => {}
        }
        Ok(())
    }

    /// Advance the sleep timer. On expiry the zone is commanded off.
    pub fn tick<P: StatePublisher + ?Sized>(
        &mut self,
        elapsed: Duration,
        publisher: &mut P,
    ) -> Option<TimerEvent> {
        let event = self.timer.tick(elapsed)?;
        match event {
            TimerEvent::Expired => {
                lgap_log!(info, "Zone {} sleep timer expired, turning unit off", self.zone().raw());
                self.control(&ClimateCall::new().with_mode(ClimateMode::Off), publisher);
                self.publish_timer(0.0, 0.0, publisher);
            }
            TimerEvent::Countdown { .. } => {
                if let Some(entity) = self.entities.get(ZoneField::TimerRemaining) {
                    publisher.publish_sensor(entity, self.timer.remaining_exact());
                }
            }
            TimerEvent::Started { .. } | TimerEvent::Cancelled => {}
        }
        Some(event)
    }

    fn publish_timer<P: StatePublisher + ?Sized>(
        &self,
        setting: f32,
        remaining: f32,
        publisher: &mut P,
    ) {
        if let Some(entity) = self.entities.get(ZoneField::SleepTimer) {
            publisher.publish_sensor(entity, setting);
        }
        if let Some(entity) = self.entities.get(ZoneField::TimerRemaining) {
            publisher.publish_sensor(entity, remaining);
        }
    }

    /// Next poll request for this zone: a write if one is pending, else a read.
    pub fn next_request(&self, request_id: u8) -> Request {
        let request = if self.write_pending {
            Request::write(self.zone(), request_id, self.climate)
        } else {
            Request::read(self.zone(), request_id, self.climate)
        };
        request.with_idle_mode_code(self.last_mode_code)
    }
    /// Record that `kind` went out on the wire.
    pub fn request_sent(&mut self, kind: RequestKind) {
        if kind == RequestKind::Write {
            self.write_pending = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::climate::{FanMode, SwingMode};
    use crate::protocol::constants::{
        FLAG_POWER, FLAG_WRITE, MODE_MASK, OFFSET_FLAGS, OFFSET_OPERATION,
    };
    use crate::protocol::frame::LeadBytes;
    use crate::publisher::RecordingPublisher;
    use crate::zone;

    fn handler() -> ZoneHandler {
        let config = ZoneConfig::new(zone!(1), "zone_1_climate")
            .unwrap()
            .with_temperature_publish_ms(1_000);
        ZoneHandler::new(config).unwrap()
    }

    fn status(mode: u8, load: u8, room_raw: u8) -> ZoneFrame {
        let mut f = ZoneFrame::response(zone!(1));
        f.flags = FLAG_POWER;
        f.operation = mode | (3 << 4);
        f.target_code = 7;
        f.room_temp_raw = room_raw;
        f.zone_active_load = load;
        f
    }

    #[test]
    fn test_apply_frame_updates_and_publishes() {
        let mut h = handler();
        let mut p = RecordingPublisher::new();
        h.apply_frame(&status(0, 255, 129), &PowerConfig::default(), 0, &mut p);

        assert_eq!(h.climate().mode, ClimateMode::Cool);
        assert_eq!(h.climate().fan, FanMode::High);
        assert_eq!(h.climate().target, 22);
        assert_eq!(h.climate().current, Some(21));
        assert!((h.power_kw() - 5.86).abs() < 1e-4);

        assert_eq!(p.climate_updates().len(), 1);
        assert_eq!(p.last_value("zone_1_climate_load_byte"), Some(255.0));
        assert_eq!(p.last_value("zone_1_climate_odu_total_load"), Some(0.0));
        assert!(p.last_value("zone_1_climate_power").is_some());
    }

    #[test]
    fn test_temperature_publish_is_rate_limited() {
        let mut h = handler();
        let mut p = RecordingPublisher::new();
        let config = PowerConfig::default();

        h.apply_frame(&status(0, 0, 129), &config, 0, &mut p);
        h.apply_frame(&status(0, 0, 126), &config, 500, &mut p);
        assert_eq!(h.climate().current, Some(21));

        h.apply_frame(&status(0, 0, 126), &config, 1_000, &mut p);
        assert_eq!(h.climate().current, Some(22));
    }

    #[test]
    fn test_pending_write_shields_control_state() {
        let mut h = handler();
        let mut p = RecordingPublisher::new();
        let config = PowerConfig::default();

        assert!(h.control(&ClimateCall::new().with_mode(ClimateMode::Heat), &mut p));
        assert!(h.write_pending());

        // Unit still reports cool until it has seen our write
        h.apply_frame(&status(0, 100, 129), &config, 0, &mut p);
        assert_eq!(h.climate().mode, ClimateMode::Heat);

        let request = h.next_request(7);
        assert_eq!(request.kind, RequestKind::Write);
        h.request_sent(request.kind);
        assert!(!h.write_pending());
        assert_eq!(h.next_request(8).kind, RequestKind::Read);

        h.apply_frame(&status(0, 100, 129), &config, 10, &mut p);
        assert_eq!(h.climate().mode, ClimateMode::Cool);
    }

    #[test]
    fn test_power_off_keeps_last_mode_on_the_wire() {
        let mut h = handler();
        let mut p = RecordingPublisher::new();
        let leads = LeadBytes::default();

        h.control(&ClimateCall::new().with_mode(ClimateMode::Heat), &mut p);
        h.request_sent(RequestKind::Write);
        h.control(&ClimateCall::new().with_mode(ClimateMode::Off), &mut p);

        let request = h.next_request(2);
        assert_eq!(request.kind, RequestKind::Write);
        let bytes = *request.encode(&leads).as_bytes();
        assert_eq!(bytes[OFFSET_FLAGS], FLAG_WRITE);
        assert_eq!(bytes[OFFSET_OPERATION] & MODE_MASK, 4);
    }

    #[test]
    fn test_power_off_uses_mode_reported_by_unit() {
        let mut h = handler();
        let mut p = RecordingPublisher::new();

        // Unit reports dry, then the sleep timer switches it off
        h.apply_frame(&status(1, 0, 129), &PowerConfig::default(), 0, &mut p);
        h.set_sleep_timer(1, &mut p).unwrap();
        assert_eq!(h.tick(Duration::from_secs(60), &mut p), Some(TimerEvent::Expired));

        let bytes = *h.next_request(3).encode(&LeadBytes::default()).as_bytes();
        assert_eq!(bytes[OFFSET_FLAGS] & FLAG_POWER, 0);
        assert_eq!(bytes[OFFSET_OPERATION] & MODE_MASK, 1);
    }

    #[test]
    fn test_control_clamps_target() {
        let mut h = handler();
        let mut p = RecordingPublisher::new();
        h.control(&ClimateCall::new().with_mode(ClimateMode::Cool).with_target(16.0), &mut p);
        assert_eq!(h.climate().target, 18);

        h.control(&ClimateCall::new().with_mode(ClimateMode::Heat).with_target(16.0), &mut p);
        assert_eq!(h.climate().target, 16);
    }

    #[test]
    fn test_unchanged_control_is_not_pending() {
        let mut h = handler();
        let mut p = RecordingPublisher::new();
        assert!(!h.control(&ClimateCall::new().with_swing(SwingMode::Off), &mut p));
        assert!(!h.write_pending());
        assert!(p.climate_updates().is_empty());
    }

    #[test]
    fn test_sleep_timer_expiry_turns_unit_off() {
        let mut h = handler();
        let mut p = RecordingPublisher::new();
        h.control(&ClimateCall::new().with_mode(ClimateMode::Cool), &mut p);
        h.request_sent(RequestKind::Write);

        h.set_sleep_timer(1, &mut p).unwrap();
        assert_eq!(p.last_value("zone_1_climate_sleep_timer"), Some(1.0));

        assert_eq!(h.tick(Duration::from_secs(60), &mut p), Some(TimerEvent::Expired));
        assert_eq!(h.climate().mode, ClimateMode::Off);
        assert!(h.write_pending());
        assert_eq!(p.last_value("zone_1_climate_sleep_timer"), Some(0.0));
        assert_eq!(p.last_value("zone_1_climate_timer_remaining"), Some(0.0));

        assert_eq!(h.tick(Duration::from_secs(60), &mut p), None);
    }

    #[test]
    fn test_sleep_timer_cancel_keeps_unit_on() {
        let mut h = handler();
        let mut p = RecordingPublisher::new();
        h.control(&ClimateCall::new().with_mode(ClimateMode::Cool), &mut p);
        h.request_sent(RequestKind::Write);

        h.set_sleep_timer(30, &mut p).unwrap();
        h.set_sleep_timer(0, &mut p).unwrap();
        assert_eq!(h.climate().mode, ClimateMode::Cool);
        assert!(!h.write_pending());
        assert_eq!(p.last_value("zone_1_climate_timer_remaining"), Some(0.0));
    }

    #[test]
    fn test_invalid_timer_publishes_nothing() {
        let mut h = handler();
        let mut p = RecordingPublisher::new();
        assert!(h.set_sleep_timer(500, &mut p).is_err());
        assert!(p.sensor_updates().is_empty());
    }
}
