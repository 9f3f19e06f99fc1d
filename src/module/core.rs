// 4.0 module/core.rs: main module struct. holds the deed registry, the approval
// store, the audit log and the logical clock.

use super::results::DeedError;
use crate::approvals::AuthorizationStore;
use crate::config::ModuleConfig;
use crate::events::{Event, EventEmitter, EventId, EventPayload};
use crate::registry::{Deed, DeedRegistry};
use crate::types::{Address, PositionId, Timestamp};
use tracing::trace;

/** 4.1: deed module. all state lives here */
#[derive(Debug)]
pub struct DeedModule {
    pub(super) config: ModuleConfig,
    pub(super) registry: DeedRegistry,
    pub(super) approvals: AuthorizationStore,
    pub(super) events: Vec<Event>,
    pub(super) next_event_id: u64,
    pub(super) current_time: Timestamp,
}

impl DeedModule {
    pub fn new(config: ModuleConfig) -> Result<Self, DeedError> {
        config.validate()?;
        Ok(Self {
            config,
            registry: DeedRegistry::new(),
            approvals: AuthorizationStore::new(),
            events: Vec::new(),
            next_event_id: 1,
            current_time: Timestamp::from_millis(0),
        })
    }

    pub fn config(&self) -> &ModuleConfig {
        &self.config
    }

    pub fn address(&self) -> Address {
        self.config.module_address
    }

    pub fn engine(&self) -> Address {
        self.config.engine
    }

    pub fn set_time(&mut self, timestamp: Timestamp) {
        self.current_time = timestamp;
    }

    pub fn time(&self) -> Timestamp {
        self.current_time
    }

    pub fn advance_time(&mut self, millis: i64) {
        self.current_time = Timestamp::from_millis(self.current_time.as_millis() + millis);
    }

    // read-only queries. also what the engine uses to learn who to credit.

    pub fn holder_of(&self, position_id: PositionId) -> Result<Address, DeedError> {
        Ok(self.registry.holder_of(position_id)?)
    }

    pub fn deed(&self, position_id: PositionId) -> Option<&Deed> {
        self.registry.get(position_id)
    }

    pub fn is_tracked(&self, position_id: PositionId) -> bool {
        self.registry.contains(position_id)
    }

    pub fn deeds_of(&self, holder: Address) -> Vec<PositionId> {
        self.registry.deeds_of(holder)
    }

    // counts deeds for fully closed positions too; see DeedRegistry::balance_of
    pub fn balance_of(&self, holder: Address) -> usize {
        self.registry.balance_of(holder)
    }

    pub fn deed_count(&self) -> usize {
        self.registry.len()
    }

    pub fn is_approved_closer(&self, grantor: Address, candidate: Address) -> bool {
        self.approvals.is_approved_closer(grantor, candidate)
    }

    pub fn is_approved_recipient(&self, grantor: Address, candidate: Address) -> bool {
        self.approvals.is_approved_recipient(grantor, candidate)
    }

    pub fn approved_closers(&self, grantor: Address) -> Vec<Address> {
        self.approvals.closers_of(grantor)
    }

    pub fn approved_recipients(&self, grantor: Address) -> Vec<Address> {
        self.approvals.recipients_of(grantor)
    }

    pub fn recent_events(&self, count: usize) -> &[Event] {
        let start = self.events.len().saturating_sub(count);
        &self.events[start..]
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Push every retained event newer than `after` into `sink`. Returns the
    /// id of the last event forwarded, for the next call.
    pub fn export_events<E: EventEmitter>(&self, after: Option<EventId>, sink: &mut E) -> Option<EventId> {
        let mut last = after;
        for event in self.events.iter().filter(|e| after.map_or(true, |a| e.id > a)) {
            sink.emit(event.clone());
            last = Some(event.id);
        }
        last
    }

    pub(super) fn emit_event(&mut self, payload: EventPayload) {
        let event = Event::new(EventId(self.next_event_id), self.current_time, payload);
        self.next_event_id += 1;

        trace!(event_id = event.id.0, payload = ?event.payload, "deed event");

        self.events.push(event);

        if self.events.len() > self.config.max_events {
            let drain_count = self.events.len() - self.config.max_events;
            self.events.drain(0..drain_count);
        }
    }
}
