// 3.0: delegated authorization store. per-holder boolean flags for who may close
// the holder's positions and who may receive the payout. approvals are per grantor,
// not per position, so they cover every deed the grantor holds now or later.
// flags are toggled, never deleted: writing false stores false.

use crate::types::{Address, ApprovalKind};
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct AuthorizationStore {
    closers: HashMap<(Address, Address), bool>,
    recipients: HashMap<(Address, Address), bool>,
}

impl AuthorizationStore {
    pub fn new() -> Self {
        Self::default()
    }

    // 3.1: returns whether the stored flag changed. last write wins.
    pub fn set(
        &mut self,
        kind: ApprovalKind,
        grantor: Address,
        grantee: Address,
        approved: bool,
    ) -> Result<bool, ApprovalError> {
        match kind {
            ApprovalKind::Closer => self.set_closer_approval(grantor, grantee, approved),
            ApprovalKind::Recipient => Ok(self.set_recipient_approval(grantor, grantee, approved)),
        }
    }

    pub fn set_closer_approval(
        &mut self,
        grantor: Address,
        closer: Address,
        approved: bool,
    ) -> Result<bool, ApprovalError> {
        if grantor == closer {
            return Err(ApprovalError::SelfApproval(grantor));
        }
        Ok(write_flag(&mut self.closers, grantor, closer, approved))
    }

    // recipient self-approval is allowed; the holder is always a valid recipient anyway.
    pub fn set_recipient_approval(&mut self, grantor: Address, recipient: Address, approved: bool) -> bool {
        write_flag(&mut self.recipients, grantor, recipient, approved)
    }

    pub fn is_approved(&self, kind: ApprovalKind, grantor: Address, candidate: Address) -> bool {
        match kind {
            ApprovalKind::Closer => self.is_approved_closer(grantor, candidate),
            ApprovalKind::Recipient => self.is_approved_recipient(grantor, candidate),
        }
    }

    pub fn is_approved_closer(&self, grantor: Address, candidate: Address) -> bool {
        read_flag(&self.closers, grantor, candidate)
    }

    pub fn is_approved_recipient(&self, grantor: Address, candidate: Address) -> bool {
        read_flag(&self.recipients, grantor, candidate)
    }

    pub fn closers_of(&self, grantor: Address) -> Vec<Address> {
        granted(&self.closers, grantor)
    }

    pub fn recipients_of(&self, grantor: Address) -> Vec<Address> {
        granted(&self.recipients, grantor)
    }
}

fn write_flag(
    flags: &mut HashMap<(Address, Address), bool>,
    grantor: Address,
    grantee: Address,
    approved: bool,
) -> bool {
    let previous = flags.insert((grantor, grantee), approved).unwrap_or(false);
    previous != approved
}

fn read_flag(flags: &HashMap<(Address, Address), bool>, grantor: Address, grantee: Address) -> bool {
    flags.get(&(grantor, grantee)).copied().unwrap_or(false)
}

fn granted(flags: &HashMap<(Address, Address), bool>, grantor: Address) -> Vec<Address> {
    let mut out: Vec<Address> = flags
        .iter()
        .filter(|((g, _), approved)| *g == grantor && **approved)
        .map(|((_, grantee), _)| *grantee)
        .collect();
    out.sort();
    out
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApprovalError {
    #[error("{0} cannot approve itself as a closer")]
    SelfApproval(Address),
}
