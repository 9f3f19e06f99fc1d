//! Margin engine callbacks.
//!
//! Both entry points may only be invoked by the engine address fixed in the
//! module config. Neither keeps per-close state: each authorization is a pure
//! decision over the current registry and approval store.

use super::core::DeedModule;
use super::results::{CloseDecision, DeedError, DenyReason};
use crate::events::{CloseAuthorizedEvent, CloseDeniedEvent, DeedMintedEvent, EventPayload};
use crate::types::{Address, Amount, ApprovalKind, PositionId};
use tracing::{debug, info, warn};

impl DeedModule {
    fn ensure_engine(&self, caller: Address, entry_point: &'static str) -> Result<(), DeedError> {
        if caller != self.config.engine {
            warn!(caller = %caller, entry_point, "bridge call from untrusted caller");
            return Err(DeedError::UntrustedCaller {
                caller,
                engine: self.config.engine,
            });
        }
        Ok(())
    }

    /// The engine has made this module the owner of `position_id` on behalf of
    /// `previous_trader`, who becomes the deed holder.
    pub fn on_ownership_received(
        &mut self,
        caller: Address,
        previous_trader: Address,
        position_id: PositionId,
    ) -> Result<(), DeedError> {
        self.ensure_engine(caller, "ownership_received")?;

        let now = self.current_time;
        if let Err(e) = self.registry.assign(position_id, previous_trader, now) {
            warn!(position = %position_id, error = %e, "engine handed off a tracked position");
            return Err(e.into());
        }

        info!(position = %position_id, holder = %previous_trader, "deed minted");
        self.emit_event(EventPayload::DeedMinted(DeedMintedEvent {
            position_id,
            holder: previous_trader,
        }));
        Ok(())
    }

    /// Decide whether `closer` may close `position_id` with proceeds going to
    /// `recipient`. Each party passes if it is the holder or has the matching
    /// approval from the holder; both must pass.
    ///
    /// A permit covers the full requested amount. An untracked position is an
    /// error, so the engine rejects the close.
    pub fn authorize_close(
        &mut self,
        caller: Address,
        position_id: PositionId,
        closer: Address,
        recipient: Address,
        requested: Amount,
    ) -> Result<CloseDecision, DeedError> {
        self.ensure_engine(caller, "authorize_close")?;

        let holder = self.registry.holder_of(position_id)?;
        let closer_ok =
            closer == holder || self.approvals.is_approved(ApprovalKind::Closer, holder, closer);
        let recipient_ok = recipient == holder
            || self.approvals.is_approved(ApprovalKind::Recipient, holder, recipient);

        debug!(
            position = %position_id,
            holder = %holder,
            closer = %closer,
            recipient = %recipient,
            closer_ok,
            recipient_ok,
            "close authorization evaluated"
        );

        match DenyReason::from_checks(closer_ok, recipient_ok) {
            None => {
                self.emit_event(EventPayload::CloseAuthorized(CloseAuthorizedEvent {
                    position_id,
                    holder,
                    closer,
                    recipient,
                    amount: requested,
                }));
                Ok(CloseDecision::Permit { amount: requested })
            }
            Some(reason) => {
                warn!(position = %position_id, ?reason, "close denied");
                if self.config.record_denials {
                    self.emit_event(EventPayload::CloseDenied(CloseDeniedEvent {
                        position_id,
                        holder,
                        closer,
                        recipient,
                        reason,
                    }));
                }
                Ok(CloseDecision::Deny { reason })
            }
        }
    }
}
