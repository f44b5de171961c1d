//! Bus coordinator.
//!
//! [`BusCoordinator`] owns the serial port, the framer and the zone registry
//! and drives them from a single non-blocking [`poll`](BusCoordinator::poll)
//! call. Nothing here blocks or locks; the host calls `poll` from its main
//! loop (or lets [`run`](BusCoordinator::run) do it under Embassy).
//!
//! ```text
//! poll(now)
//!   1. read_available ──► Framer ──► decode ──► ZoneRegistry::dispatch
//!                                      │ request lead
//!                                      └──► echo counter
//!   2. tick every sleep timer with (now - last poll)
//!   3. total power ──► publisher (when it changed)
//!   4. loop_wait elapsed and no reply outstanding?
//!        └─► next zone, round-robin ──► Request ──► transmit (pin guarded)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use lgap_bus::coordinator::BusCoordinator;
//! use lgap_bus::config::{BusConfig, ZoneConfig};
//! use lgap_bus::publisher::RecordingPublisher;
//! use lgap_bus::serial::MockSerial;
//! use lgap_bus::zone;
//!
//! let config = BusConfig::new("lgap").unwrap();
//! let mut bus = BusCoordinator::new(config, MockSerial::new(), RecordingPublisher::new()).unwrap();
//! bus.add_zone(ZoneConfig::new(zone!(0), "lounge").unwrap()).unwrap();
//!
//! // First poll sends a read request to zone 0
//! bus.poll(0);
//! assert_eq!(bus.stats().requests_sent, 1);
//! assert_eq!(bus.serial().written().len(), 16);
//! ```

use core::fmt::Write as _;
use core::time::Duration;

use embedded_hal::digital::OutputPin;

use crate::addressing::ZoneNumber;
use crate::climate::ClimateCall;
use crate::config::{BusConfig, ZoneConfig};
use crate::entity::{copy_str, EntityDescriptor, EntityId, EntityKind, UNIT_KILOWATT};
use crate::error::{LgapError, Result};
use crate::protocol::command::{RequestIds, RequestKind};
use crate::protocol::frame::{Direction, Frame};
use crate::protocol::framer::{Framer, FramerStats};
use crate::protocol::zone_frame::{decode, ZoneFrame};
use crate::publisher::StatePublisher;
use crate::serial::flow_control::{transmit, NoFlowControl};
use crate::serial::transport::SerialPort;
use crate::zone::{ZoneHandler, ZoneRegistry};

/// Bytes pulled from the port per read.
const READ_CHUNK: usize = 32;
/// Upper bound on reads per poll, so a chattering line cannot starve the rest.
const MAX_READS_PER_POLL: usize = 8;

/// Generated total power entity name.
const TOTAL_POWER_NAME: &str = "Total System Power";
/// Generated total power id suffix.
const TOTAL_POWER_KEY: &str = "total_power";

/// Counters kept by the coordinator. They only ever go up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusStats {
    /// Response frames dispatched to a zone
    pub frames: u32,
    /// Request-lead frames seen (our own echo or another master)
    pub echoes: u32,
    /// Framed but undecodable
    pub malformed: u32,
    /// Responses for zones nobody registered
    pub unroutable: u32,
    /// Failed reads, writes or flow-control changes
    pub transport_errors: u32,
    /// Requests put on the wire
    pub requests_sent: u32,
    /// Requests that were writes
    pub writes_sent: u32,
    /// Polls that gave up waiting for a reply
    pub response_timeouts: u32,
    pub framer: FramerStats,
}

/// What one call to [`BusCoordinator::poll`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PollSummary {
    /// Frames dispatched this call
    pub dispatched: u32,
    /// Request sent this call, if any
    pub sent: Option<(ZoneNumber, RequestKind)>,
}

/// LGAP bus master.
///
/// Generic over the serial port `S`, the state publisher `H`, and the RS-485
/// flow-control pin `P` (none by default).
#[derive(Debug)]
pub struct BusCoordinator<S, H, P = NoFlowControl>
where
    S: SerialPort,
    H: StatePublisher,
    P: OutputPin,
{
    config: BusConfig,
    serial: S,
    pin: P,
    publisher: H,
    framer: Framer,
    registry: ZoneRegistry,
    request_ids: RequestIds,
    total_power: EntityDescriptor,
    last_total_kw: Option<f32>,
    stats: BusStats,
    last_poll_ms: Option<u64>,
    last_request_ms: Option<u64>,
    awaiting: Option<ZoneNumber>,
    next_zone: usize,
}

impl<S, H> BusCoordinator<S, H, NoFlowControl>
where
    S: SerialPort,
    H: StatePublisher,
{
    /// Coordinator for a bus without a flow-control line.
    ///
    /// # Errors
    ///
    /// `Config` if `config` does not validate.
    pub fn new(config: BusConfig, serial: S, publisher: H) -> Result<Self> {
        Self::with_flow_control(config, serial, NoFlowControl, publisher)
    }
}

impl<S, H, P> BusCoordinator<S, H, P>
where
    S: SerialPort,
    H: StatePublisher,
    P: OutputPin,
{
    /// Coordinator driving `pin` high for every transmit.
    ///
    /// # Errors
    ///
    /// `Config` if `config` does not validate.
    pub fn with_flow_control(config: BusConfig, serial: S, mut pin: P, publisher: H) -> Result<Self> {
        config.validate()?;
        let total_power = total_power_entity(&config)?;

        // Receive until the first transmit
        if pin.set_low().is_err() {
            lgap_log!(warn, "Could not release flow-control pin at start-up");
        }

        lgap_log!(
            info,
            "LGAP bus {} ready (tx lead {}, rx lead {})",
            config.id.as_str(),
            config.leads.tx,
            config.leads.rx
        );

        Ok(Self {
            framer: Framer::new(config.leads, u64::from(config.receive_wait_ms)),
            config,
            serial,
            pin,
            publisher,
            registry: ZoneRegistry::new(),
            request_ids: RequestIds::new(),
            total_power,
            last_total_kw: None,
            stats: BusStats::default(),
            last_poll_ms: None,
            last_request_ms: None,
            awaiting: None,
            next_zone: 0,
        })
    }

    /// Register a zone.
    ///
    /// # Errors
    ///
    /// `DuplicateZone`, `RegistryFull`, or `Config` for a bad zone
    /// configuration. All of them should stop start-up.
    pub fn add_zone(&mut self, config: ZoneConfig) -> Result<()> {
        self.registry.register(ZoneHandler::new(config)?)
    }

    /// Host write to a zone's sleep timer number.
    ///
    /// # Errors
    ///
    /// `InvalidTimerValue` above 420 minutes, `UnroutableFrame` for an
    /// unregistered zone.
    pub fn set_sleep_timer(&mut self, zone: ZoneNumber, minutes: u16) -> Result<()> {
        let handler = self
            .registry
            .get_mut(zone)
            .ok_or(LgapError::UnroutableFrame { zone: zone.raw() })?;
        handler.set_sleep_timer(minutes, &mut self.publisher)
    }

    /// Host climate control for a zone. The change goes out as a write
    /// request on the zone's next turn. Returns whether anything changed.
    ///
    /// # Errors
    ///
    /// `UnroutableFrame` for an unregistered zone.
    pub fn control(&mut self, zone: ZoneNumber, call: &ClimateCall) -> Result<bool> {
        let handler = self
            .registry
            .get_mut(zone)
            .ok_or(LgapError::UnroutableFrame { zone: zone.raw() })?;
        Ok(handler.control(call, &mut self.publisher))
    }

    /// Run one iteration of the bus loop at time `now_ms`.
    ///
    /// Never fails: every runtime error is logged and counted in
    /// [`stats`](Self::stats).
    pub fn poll(&mut self, now_ms: u64) -> PollSummary {
        let mut summary = PollSummary {
            dispatched: self.receive(now_ms),
            sent: None,
        };

        let elapsed = self
            .last_poll_ms
            .map_or(0, |last| now_ms.saturating_sub(last));
        self.last_poll_ms = Some(now_ms);
        if elapsed > 0 {
            for handler in self.registry.iter_mut() {
                handler.tick(Duration::from_millis(elapsed), &mut self.publisher);
            }
        }

        self.publish_total_power();

        if self.request_due(now_ms) {
            summary.sent = self.send_next_request(now_ms);
        }

        summary
    }

    fn receive(&mut self, now_ms: u64) -> u32 {
        let Self {
            config,
            serial,
            publisher,
            framer,
            registry,
            stats,
            awaiting,
            ..
        } = self;

        let mut dispatched = 0;
        let mut buf = [0u8; READ_CHUNK];

        for _ in 0..MAX_READS_PER_POLL {
            let n = match serial.read_available(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => {
                    lgap_log!(warn, "Serial read failed: {}", e);
                    stats.transport_errors = stats.transport_errors.saturating_add(1);
                    break;
                }
            };

            for frame in framer.feed(&buf[..n], now_ms) {
                if route_frame(config, registry, stats, publisher, awaiting, &frame, now_ms) {
                    dispatched += 1;
                }
            }
        }

        if let Some(anomaly) = framer.take_anomaly() {
            lgap_log!(debug, "Framer: {}", anomaly);
        }
        stats.framer = framer.stats();
        stats.unroutable = registry.unroutable_count();

        dispatched
    }

    fn publish_total_power(&mut self) {
        let total = self.registry.total_power().kw();
        if self.last_total_kw != Some(total) {
            self.last_total_kw = Some(total);
            self.publisher.publish_sensor(&self.total_power, total);
        }
    }

    fn request_due(&mut self, now_ms: u64) -> bool {
        if self.registry.is_empty() {
            return false;
        }
        let Some(last) = self.last_request_ms else {
            return true;
        };
        let since = now_ms.saturating_sub(last);
        if since < u64::from(self.config.loop_wait_ms) {
            return false;
        }
        match self.awaiting {
            None => true,
            Some(zone) if since >= u64::from(self.config.receive_wait_ms) => {
                lgap_log!(debug, "No reply from zone {} within {} ms", zone.raw(), since);
                self.stats.response_timeouts = self.stats.response_timeouts.saturating_add(1);
                self.awaiting = None;
                true
            }
            Some(_) => false,
        }
    }

    fn send_next_request(&mut self, now_ms: u64) -> Option<(ZoneNumber, RequestKind)> {
        let index = self.next_zone % self.registry.len();
        self.next_zone = (index + 1) % self.registry.len();
        self.last_request_ms = Some(now_ms);

        let request_id = self.request_ids.next_id();
        let handler = self.registry.get_index_mut(index)?;
        let request = handler.next_request(request_id);
        let frame = request.encode(&self.config.leads);

        match transmit(&mut self.serial, &mut self.pin, frame.as_bytes()) {
            Ok(()) => {
                handler.request_sent(request.kind);
                self.stats.requests_sent = self.stats.requests_sent.saturating_add(1);
                if request.kind == RequestKind::Write {
                    self.stats.writes_sent = self.stats.writes_sent.saturating_add(1);
                }
                if self.config.debug {
                    lgap_log!(
                        debug,
                        "Sent {} request {} to zone {}",
                        if request.kind == RequestKind::Write { "write" } else { "read" },
                        request_id,
                        request.zone.raw()
                    );
                }
                self.awaiting = Some(request.zone);
                Some((request.zone, request.kind))
            }
            Err(e) => {
                lgap_log!(warn, "Request to zone {} failed: {}", request.zone.raw(), e);
                self.stats.transport_errors = self.stats.transport_errors.saturating_add(1);
                None
            }
        }
    }

    /// Counters since creation.
    pub fn stats(&self) -> BusStats {
        self.stats
    }

    pub fn config(&self) -> &BusConfig {
        &self.config
    }

    pub fn registry(&self) -> &ZoneRegistry {
        &self.registry
    }

    /// Handler for `zone`, if registered.
    pub fn zone(&self, zone: ZoneNumber) -> Option<&ZoneHandler> {
        self.registry.get(zone)
    }

    /// Resolved total power entity.
    pub fn total_power_entity(&self) -> &EntityDescriptor {
        &self.total_power
    }

    pub fn serial(&self) -> &S {
        &self.serial
    }

    pub fn serial_mut(&mut self) -> &mut S {
        &mut self.serial
    }

    pub fn pin(&self) -> &P {
        &self.pin
    }

    pub fn publisher(&self) -> &H {
        &self.publisher
    }

    pub fn publisher_mut(&mut self) -> &mut H {
        &mut self.publisher
    }

    /// Poll forever, every [`BusConfig::poll_interval_ms`].
    #[cfg(feature = "embassy")]
    pub async fn run(&mut self) -> ! {
        use embassy_time::{Duration as EmbassyDuration, Instant, Timer};

        let period = EmbassyDuration::from_millis(u64::from(self.config.poll_interval_ms()));
        loop {
            self.poll(Instant::now().as_millis());
            Timer::after(period).await;
        }
    }
}

/// Decode and route one framed message. Returns whether it reached a zone.
fn route_frame<H: StatePublisher + ?Sized>(
    config: &BusConfig,
    registry: &mut ZoneRegistry,
    stats: &mut BusStats,
    publisher: &mut H,
    awaiting: &mut Option<ZoneNumber>,
    frame: &Frame,
    now_ms: u64,
) -> bool {
    let decoded: ZoneFrame = match decode(frame, &config.leads) {
        Ok(decoded) => decoded,
        Err(e) => {
            lgap_log!(warn, "Dropping malformed frame: {}", e);
            stats.malformed = stats.malformed.saturating_add(1);
            return false;
        }
    };

    if decoded.direction == Direction::Request {
        lgap_log!(trace, "Request frame for zone {} ignored", decoded.zone.raw());
        stats.echoes = stats.echoes.saturating_add(1);
        return false;
    }

    if config.debug {
        lgap_log!(
            debug,
            "Zone {} status: flags {}, op {}, target {}, load {}",
            decoded.zone.raw(),
            decoded.flags,
            decoded.operation,
            decoded.target_code,
            decoded.load_byte()
        );
    }

    if *awaiting == Some(decoded.zone) {
        *awaiting = None;
    }

    match registry.dispatch(&decoded, &config.power, now_ms, publisher) {
        Ok(()) => {
            stats.frames = stats.frames.saturating_add(1);
            true
        }
        Err(e) => {
            lgap_log!(debug, "{}", e);
            false
        }
    }
}

/// Explicit total power entity, or `<bus id>_total_power` / "Total System Power".
fn total_power_entity(config: &BusConfig) -> Result<EntityDescriptor> {
    let (id, name, generated) = match &config.total_power {
        Some(binding) => {
            let name = match &binding.name {
                Some(name) => name.clone(),
                None => copy_str(TOTAL_POWER_NAME)?,
            };
            (binding.id.clone(), name, false)
        }
        None => {
            let mut id = EntityId::new();
            write!(id, "{}_{}", config.id, TOTAL_POWER_KEY)
                .map_err(|_| LgapError::name_too_long())?;
            (id, copy_str(TOTAL_POWER_NAME)?, true)
        }
    };

    Ok(EntityDescriptor {
        id,
        name,
        unit: Some(UNIT_KILOWATT),
        accuracy_decimals: 2,
        kind: EntityKind::Sensor,
        generated,
    })
}
