//! Deed registry.
//!
//! Maps a position handle to the address currently holding its deed. The
//! registry is a pass-through layer: canonical ownership always lives in the
//! margin engine, and a deed exists only while a position is routed through
//! this module.

use crate::types::{Address, PositionId, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deed {
    pub position_id: PositionId,
    pub holder: Address,
    pub minted_at: Timestamp,
}

#[derive(Debug, Clone, Default)]
pub struct DeedRegistry {
    deeds: HashMap<PositionId, Deed>,
}

impl DeedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn holder_of(&self, position_id: PositionId) -> Result<Address, RegistryError> {
        self.deeds
            .get(&position_id)
            .map(|deed| deed.holder)
            .ok_or(RegistryError::NotFound(position_id))
    }

    pub fn get(&self, position_id: PositionId) -> Option<&Deed> {
        self.deeds.get(&position_id)
    }

    pub fn contains(&self, position_id: PositionId) -> bool {
        self.deeds.contains_key(&position_id)
    }

    pub fn len(&self) -> usize {
        self.deeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deeds.is_empty()
    }

    /// Record a new deed. Only the ownership-receipt path calls this.
    pub fn assign(
        &mut self,
        position_id: PositionId,
        holder: Address,
        now: Timestamp,
    ) -> Result<&Deed, RegistryError> {
        if self.deeds.contains_key(&position_id) {
            return Err(RegistryError::AlreadyAssigned(position_id));
        }
        let deed = Deed {
            position_id,
            holder,
            minted_at: now,
        };
        Ok(self.deeds.entry(position_id).or_insert(deed))
    }

    /// Check that `caller` holds the deed. Used before any holder-gated action.
    pub fn ensure_holder(&self, position_id: PositionId, caller: Address) -> Result<(), RegistryError> {
        let holder = self.holder_of(position_id)?;
        if holder != caller {
            return Err(RegistryError::Unauthorized {
                position_id,
                caller,
            });
        }
        Ok(())
    }

    /// Move the deed to `new_holder` without releasing it. The position stays
    /// routed through this module. Returns the previous holder.
    pub fn reassign(
        &mut self,
        position_id: PositionId,
        caller: Address,
        new_holder: Address,
    ) -> Result<Address, RegistryError> {
        self.ensure_holder(position_id, caller)?;
        if new_holder.is_zero() {
            return Err(RegistryError::InvalidHolder {
                position_id,
                holder: new_holder,
            });
        }
        let deed = self
            .deeds
            .get_mut(&position_id)
            .ok_or(RegistryError::NotFound(position_id))?;
        let previous = deed.holder;
        deed.holder = new_holder;
        Ok(previous)
    }

    /// Destroy the deed. Callers must have already had the engine take the
    /// position back; this is the tail of a transfer out.
    pub fn release(&mut self, position_id: PositionId) -> Result<Deed, RegistryError> {
        self.deeds
            .remove(&position_id)
            .ok_or(RegistryError::NotFound(position_id))
    }

    /// Includes deeds whose positions the engine has already fully closed and
    /// removed; those stay until the holder transfers them out.
    pub fn deeds_of(&self, holder: Address) -> Vec<PositionId> {
        let mut ids: Vec<PositionId> = self
            .deeds
            .values()
            .filter(|deed| deed.holder == holder)
            .map(|deed| deed.position_id)
            .collect();
        ids.sort();
        ids
    }

    /// Counts every deed the holder has, including ones for positions the
    /// engine has already fully closed and removed.
    pub fn balance_of(&self, holder: Address) -> usize {
        self.deeds.values().filter(|deed| deed.holder == holder).count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("No deed for position {0}")]
    NotFound(PositionId),

    #[error("Position {0} already has a deed")]
    AlreadyAssigned(PositionId),

    #[error("{holder} cannot hold the deed for position {position_id}")]
    InvalidHolder {
        position_id: PositionId,
        holder: Address,
    },

    #[error("{caller} does not hold the deed for position {position_id}")]
    Unauthorized {
        position_id: PositionId,
        caller: Address,
    },
}
