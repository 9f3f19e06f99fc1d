//! Holder-facing surface: approvals, deed reassignment and transfer out.
//!
//! `caller` is always the address the request is made under. Approvals are
//! granted by the caller; transfers are gated on the caller holding the deed.

use super::core::DeedModule;
use super::results::DeedError;
use crate::events::{ApprovalEvent, DeedReassignedEvent, DeedReleasedEvent, EventPayload};
use crate::margin::MarginEngine;
use crate::registry::RegistryError;
use crate::types::{Address, ApprovalKind, PositionId};
use tracing::{info, warn};

impl DeedModule {
    /// Allow or disallow `closer` to close any position the caller holds.
    pub fn set_closer_approval(
        &mut self,
        caller: Address,
        closer: Address,
        approved: bool,
    ) -> Result<(), DeedError> {
        self.set_approval(ApprovalKind::Closer, caller, closer, approved)
    }

    /// Allow or disallow `recipient` to receive close proceeds for the caller.
    pub fn set_recipient_approval(
        &mut self,
        caller: Address,
        recipient: Address,
        approved: bool,
    ) -> Result<(), DeedError> {
        self.set_approval(ApprovalKind::Recipient, caller, recipient, approved)
    }

    fn set_approval(
        &mut self,
        kind: ApprovalKind,
        caller: Address,
        grantee: Address,
        approved: bool,
    ) -> Result<(), DeedError> {
        let changed = match self.approvals.set(kind, caller, grantee, approved) {
            Ok(changed) => changed,
            Err(e) => {
                warn!(grantor = %caller, %kind, "self-approval rejected");
                return Err(e.into());
            }
        };

        info!(grantor = %caller, grantee = %grantee, %kind, approved, changed, "approval set");
        let event = ApprovalEvent {
            grantor: caller,
            grantee,
            approved,
            changed,
        };
        self.emit_event(match kind {
            ApprovalKind::Closer => EventPayload::CloserApproval(event),
            ApprovalKind::Recipient => EventPayload::RecipientApproval(event),
        });
        Ok(())
    }

    // neither the zero address nor this module can hold or receive a position
    fn ensure_destination(&self, position_id: PositionId, new_holder: Address) -> Result<(), DeedError> {
        if new_holder.is_zero() || new_holder == self.config.module_address {
            warn!(position = %position_id, to = %new_holder, "invalid deed destination");
            return Err(RegistryError::InvalidHolder {
                position_id,
                holder: new_holder,
            }
            .into());
        }
        Ok(())
    }

    /// Hand the deed to another holder. The position stays routed through this
    /// module and the engine is not involved.
    pub fn reassign_deed(
        &mut self,
        caller: Address,
        position_id: PositionId,
        new_holder: Address,
    ) -> Result<(), DeedError> {
        self.registry.ensure_holder(position_id, caller)?;
        self.ensure_destination(position_id, new_holder)?;
        let from = self.registry.reassign(position_id, caller, new_holder)?;

        info!(position = %position_id, from = %from, to = %new_holder, "deed reassigned");
        self.emit_event(EventPayload::DeedReassigned(DeedReassignedEvent {
            position_id,
            from,
            to: new_holder,
        }));
        Ok(())
    }

    /// Transfer the position out of this module to `new_holder`.
    ///
    /// The engine reassigns its own ownership record first; the deed is only
    /// destroyed once that succeeds, so an engine failure leaves the registry
    /// exactly as it was.
    pub fn transfer<E: MarginEngine + ?Sized>(
        &mut self,
        engine: &mut E,
        caller: Address,
        position_id: PositionId,
        new_holder: Address,
    ) -> Result<(), DeedError> {
        if engine.address() != self.config.engine {
            return Err(DeedError::UntrustedCaller {
                caller: engine.address(),
                engine: self.config.engine,
            });
        }

        self.registry.ensure_holder(position_id, caller)?;
        self.ensure_destination(position_id, new_holder)?;

        if let Err(e) = engine.transfer_position(self.config.module_address, position_id, new_holder) {
            warn!(position = %position_id, error = %e, "engine refused transfer, deed kept");
            return Err(e.into());
        }

        let deed = self.registry.release(position_id)?;

        info!(position = %position_id, from = %deed.holder, to = %new_holder, "deed released");
        self.emit_event(EventPayload::DeedReleased(DeedReleasedEvent {
            position_id,
            from: deed.holder,
            to: new_holder,
        }));
        Ok(())
    }
}
