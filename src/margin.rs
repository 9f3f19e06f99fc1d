//! Margin engine boundary.
//!
//! The engine owns loan accounting, custody and closing. This module only ever
//! asks it for one thing: move its own ownership record for a position.

use crate::types::{Address, PositionId};

/// What the deed layer consumes from the external margin engine.
pub trait MarginEngine {
    /// The engine's own address. Bridge callbacks must come from here.
    fn address(&self) -> Address;

    /// Reassign the engine's ownership record for `position_id` to `new_owner`.
    /// Called by the current owner of record, which for routed positions is
    /// the deed module itself.
    fn transfer_position(
        &mut self,
        caller: Address,
        position_id: PositionId,
        new_owner: Address,
    ) -> Result<(), MarginEngineError>;

    /// Current owner of record inside the engine, if the position is open.
    fn position_owner(&self, position_id: PositionId) -> Option<Address>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MarginEngineError {
    #[error("Position {0} not open in margin engine")]
    PositionNotFound(PositionId),

    #[error("{caller} is not the engine owner of position {position_id}")]
    NotOwner {
        position_id: PositionId,
        caller: Address,
    },

    #[error("Margin engine rejected the request: {0}")]
    Rejected(String),
}
