// 7.0 simulator.rs: MOCKED margin engine. tracks owners and principal only, no
// interest, no collateral, no order routing. a close pays the closed principal
// straight to the recipient. used by the sim binary and integration tests.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::margin::{MarginEngine, MarginEngineError};
use crate::module::{CloseDecision, DeedError, DeedModule, DenyReason};
use crate::types::{Address, Amount, PositionId, Timestamp};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatedPosition {
    pub id: PositionId,
    pub owner: Address,
    pub principal: Amount,
    pub opened_at: Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloseOutcome {
    pub closed: Amount,
    pub remaining: Amount,
    pub fully_closed: bool,
}

#[derive(Debug)]
pub struct SimulatedMarginEngine {
    address: Address,
    positions: HashMap<PositionId, SimulatedPosition>,
    payouts: HashMap<Address, Amount>,
    next_nonce: u64,
    fail_next_transfer: bool,
    current_time: Timestamp,
}

impl SimulatedMarginEngine {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            positions: HashMap::new(),
            payouts: HashMap::new(),
            next_nonce: 1,
            fail_next_transfer: false,
            current_time: Timestamp::from_millis(0),
        }
    }

    pub fn set_time(&mut self, timestamp: Timestamp) {
        self.current_time = timestamp;
    }

    // ids come from a nonce so runs are reproducible
    pub fn open_position(&mut self, trader: Address, principal: Amount) -> PositionId {
        let id = PositionId::from_low_u64(self.next_nonce);
        self.next_nonce += 1;
        self.positions.insert(
            id,
            SimulatedPosition {
                id,
                owner: trader,
                principal,
                opened_at: self.current_time,
            },
        );
        debug!(position = %id, trader = %trader, %principal, "position opened");
        id
    }

    pub fn position(&self, id: PositionId) -> Option<&SimulatedPosition> {
        self.positions.get(&id)
    }

    pub fn open_positions(&self) -> usize {
        self.positions.len()
    }

    pub fn paid_out(&self, recipient: Address) -> Amount {
        self.payouts.get(&recipient).copied().unwrap_or_else(Amount::zero)
    }

    /// Make the next `transfer_position` call fail once.
    pub fn fail_next_transfer(&mut self) {
        self.fail_next_transfer = true;
    }

    /// `trader` routes its position through the deed module. The engine moves
    /// ownership to the module, then notifies it. If the module refuses, the
    /// hand-off is undone.
    pub fn hand_to_module(
        &mut self,
        module: &mut DeedModule,
        trader: Address,
        id: PositionId,
    ) -> Result<(), SimulationError> {
        let position = self
            .positions
            .get_mut(&id)
            .ok_or(SimulationError::PositionNotFound(id))?;
        if position.owner != trader {
            return Err(SimulationError::NotOwner { id, caller: trader });
        }

        position.owner = module.address();
        if let Err(e) = module.on_ownership_received(self.address, trader, id) {
            position.owner = trader;
            return Err(e.into());
        }

        info!(position = %id, trader = %trader, "position handed to deed module");
        Ok(())
    }

    /// Close up to `requested` of a position's principal, paying it to
    /// `recipient`. Positions owned by the deed module ask it for a decision
    /// first; a deny leaves everything untouched.
    pub fn close_position(
        &mut self,
        module: &mut DeedModule,
        closer: Address,
        recipient: Address,
        id: PositionId,
        requested: Amount,
    ) -> Result<CloseOutcome, SimulationError> {
        let position = self
            .positions
            .get(&id)
            .ok_or(SimulationError::PositionNotFound(id))?;
        if requested.is_zero() {
            return Err(SimulationError::ZeroClose(id));
        }
        let wanted = requested.min(position.principal);

        let closed = if position.owner == module.address() {
            match module.authorize_close(self.address, id, closer, recipient, wanted)? {
                CloseDecision::Permit { amount } => amount,
                CloseDecision::Deny { reason } => return Err(SimulationError::Denied(reason)),
            }
        } else if position.owner == closer {
            wanted
        } else {
            return Err(SimulationError::NotOwner { id, caller: closer });
        };

        Ok(self.settle_close(id, recipient, closed))
    }

    fn settle_close(&mut self, id: PositionId, recipient: Address, closed: Amount) -> CloseOutcome {
        let remaining = match self.positions.get_mut(&id) {
            Some(position) => {
                position.principal = position.principal.saturating_sub(closed);
                position.principal
            }
            None => Amount::zero(),
        };

        let paid = self.paid_out(recipient).add(closed);
        self.payouts.insert(recipient, paid);

        // a full close removes the position here; any deed is left to its holder
        let fully_closed = remaining.is_zero();
        if fully_closed {
            self.positions.remove(&id);
        }

        info!(position = %id, recipient = %recipient, %closed, %remaining, "position closed");
        CloseOutcome {
            closed,
            remaining,
            fully_closed,
        }
    }
}

impl MarginEngine for SimulatedMarginEngine {
    fn address(&self) -> Address {
        self.address
    }

    fn transfer_position(
        &mut self,
        caller: Address,
        position_id: PositionId,
        new_owner: Address,
    ) -> Result<(), MarginEngineError> {
        if std::mem::take(&mut self.fail_next_transfer) {
            return Err(MarginEngineError::Rejected("injected failure".to_string()));
        }
        let position = self
            .positions
            .get_mut(&position_id)
            .ok_or(MarginEngineError::PositionNotFound(position_id))?;
        if position.owner != caller {
            return Err(MarginEngineError::NotOwner {
                position_id,
                caller,
            });
        }
        position.owner = new_owner;
        Ok(())
    }

    fn position_owner(&self, position_id: PositionId) -> Option<Address> {
        self.positions.get(&position_id).map(|p| p.owner)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimulationError {
    #[error("Position {0} not open")]
    PositionNotFound(PositionId),

    #[error("{caller} does not own position {id}")]
    NotOwner { id: PositionId, caller: Address },

    #[error("Close of zero principal requested for position {0}")]
    ZeroClose(PositionId),

    #[error("Close denied by deed module: {0:?}")]
    Denied(DenyReason),

    #[error("Deed module error: {0}")]
    Deed(#[from] DeedError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModuleConfig;
    use rust_decimal_macros::dec;

    fn addr(n: u64) -> Address {
        Address::from_low_u64(n)
    }

    fn setup() -> (SimulatedMarginEngine, DeedModule) {
        let engine = SimulatedMarginEngine::new(addr(0xe4));
        let module = DeedModule::new(ModuleConfig::new(addr(0xd00d), addr(0xe4))).unwrap();
        (engine, module)
    }

    fn amt(v: rust_decimal::Decimal) -> Amount {
        Amount::new(v).unwrap()
    }

    #[test]
    fn open_assigns_distinct_ids() {
        let (mut engine, _) = setup();
        let a = engine.open_position(addr(1), amt(dec!(10)));
        let b = engine.open_position(addr(1), amt(dec!(10)));
        assert_ne!(a, b);
        assert_eq!(engine.open_positions(), 2);
        assert_eq!(engine.position_owner(a), Some(addr(1)));
    }

    #[test]
    fn direct_owner_closes_without_module() {
        let (mut engine, mut module) = setup();
        let id = engine.open_position(addr(1), amt(dec!(10)));

        let out = engine
            .close_position(&mut module, addr(1), addr(1), id, amt(dec!(4)))
            .unwrap();
        assert_eq!(out.remaining.value(), dec!(6));
        assert!(!out.fully_closed);
        assert!(module.events().is_empty());

        let err = engine
            .close_position(&mut module, addr(2), addr(2), id, amt(dec!(1)))
            .unwrap_err();
        assert!(matches!(err, SimulationError::NotOwner { .. }));
    }

    #[test]
    fn hand_off_only_by_owner() {
        let (mut engine, mut module) = setup();
        let id = engine.open_position(addr(1), amt(dec!(10)));

        let err = engine.hand_to_module(&mut module, addr(2), id).unwrap_err();
        assert!(matches!(err, SimulationError::NotOwner { .. }));

        engine.hand_to_module(&mut module, addr(1), id).unwrap();
        assert_eq!(engine.position_owner(id), Some(module.address()));
        assert_eq!(module.holder_of(id).unwrap(), addr(1));
    }

    #[test]
    fn close_is_capped_at_principal() {
        let (mut engine, mut module) = setup();
        let id = engine.open_position(addr(1), amt(dec!(10)));
        engine.hand_to_module(&mut module, addr(1), id).unwrap();

        let out = engine
            .close_position(&mut module, addr(1), addr(1), id, amt(dec!(50)))
            .unwrap();
        assert_eq!(out.closed.value(), dec!(10));
        assert!(out.fully_closed);
        assert_eq!(engine.paid_out(addr(1)).value(), dec!(10));
        assert!(engine.position(id).is_none());
    }

    #[test]
    fn zero_close_rejected() {
        let (mut engine, mut module) = setup();
        let id = engine.open_position(addr(1), amt(dec!(10)));
        let err = engine
            .close_position(&mut module, addr(1), addr(1), id, Amount::zero())
            .unwrap_err();
        assert_eq!(err, SimulationError::ZeroClose(id));
    }

    #[test]
    fn injected_failure_fires_once() {
        let (mut engine, _) = setup();
        let id = engine.open_position(addr(1), amt(dec!(10)));
        engine.fail_next_transfer();

        assert!(engine.transfer_position(addr(1), id, addr(2)).is_err());
        engine.transfer_position(addr(1), id, addr(2)).unwrap();
        assert_eq!(engine.position_owner(id), Some(addr(2)));
    }
}
