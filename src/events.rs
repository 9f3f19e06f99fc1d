// 5.0: every state change and every authorization decision produces an event.
// used for audit trails and for notifying whoever indexes deed ownership.
// the EventPayload enum lists all event types.

use crate::module::DenyReason;
use crate::types::{Address, Amount, PositionId, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub u64);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub timestamp: Timestamp,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(id: EventId, timestamp: Timestamp, payload: EventPayload) -> Self {
        Self {
            id,
            timestamp,
            payload,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventPayload {
    // Deed events
    DeedMinted(DeedMintedEvent),
    DeedReassigned(DeedReassignedEvent),
    DeedReleased(DeedReleasedEvent),

    // Approval events
    CloserApproval(ApprovalEvent),
    RecipientApproval(ApprovalEvent),

    // Bridge decisions
    CloseAuthorized(CloseAuthorizedEvent),
    CloseDenied(CloseDeniedEvent),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeedMintedEvent {
    pub position_id: PositionId,
    pub holder: Address,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeedReassignedEvent {
    pub position_id: PositionId,
    pub from: Address,
    pub to: Address,
}

// deed destroyed; the engine now records `to` as owner directly
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeedReleasedEvent {
    pub position_id: PositionId,
    pub from: Address,
    pub to: Address,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalEvent {
    pub grantor: Address,
    pub grantee: Address,
    pub approved: bool,
    pub changed: bool,
}

// permit issued. records the decision only; the engine may still revert
// the close for its own reasons after this is logged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloseAuthorizedEvent {
    pub position_id: PositionId,
    pub holder: Address,
    pub closer: Address,
    pub recipient: Address,
    pub amount: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloseDeniedEvent {
    pub position_id: PositionId,
    pub holder: Address,
    pub closer: Address,
    pub recipient: Address,
    pub reason: DenyReason,
}

pub trait EventEmitter {
    fn emit(&mut self, event: Event);
}

#[derive(Debug, Default)]
pub struct EventCollector {
    events: Vec<Event>,
    next_id: u64,
}

impl EventCollector {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            next_id: 1,
        }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn next_id(&mut self) -> EventId {
        let id = EventId(self.next_id);
        self.next_id += 1;
        id
    }
}

impl EventEmitter for EventCollector {
    fn emit(&mut self, event: Event) {
        self.events.push(event);
    }
}
