// 4.0.2: result types and errors for deed module operations.

use crate::approvals::ApprovalError;
use crate::config::ConfigError;
use crate::margin::MarginEngineError;
use crate::registry::RegistryError;
use crate::types::{Address, Amount};
use serde::{Deserialize, Serialize};

/// Outcome of a close authorization. The engine must abort the close on `Deny`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CloseDecision {
    Permit { amount: Amount },
    Deny { reason: DenyReason },
}

impl CloseDecision {
    pub fn is_permit(&self) -> bool {
        matches!(self, CloseDecision::Permit { .. })
    }

    pub fn permitted_amount(&self) -> Option<Amount> {
        match self {
            CloseDecision::Permit { amount } => Some(*amount),
            CloseDecision::Deny { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DenyReason {
    CloserNotApproved,
    RecipientNotApproved,
    Both,
}

impl DenyReason {
    // None when both checks pass
    pub fn from_checks(closer_ok: bool, recipient_ok: bool) -> Option<Self> {
        match (closer_ok, recipient_ok) {
            (true, true) => None,
            (false, true) => Some(DenyReason::CloserNotApproved),
            (true, false) => Some(DenyReason::RecipientNotApproved),
            (false, false) => Some(DenyReason::Both),
        }
    }
}

/// Flat error taxonomy callers can match on without caring which layer failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Unauthorized,
    InvalidHolder,
    AlreadyAssigned,
    SelfApproval,
    UntrustedCaller,
    Engine,
    Config,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeedError {
    #[error("Untrusted caller {caller}: only the margin engine {engine} may call this")]
    UntrustedCaller { caller: Address, engine: Address },

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Approval error: {0}")]
    Approval(#[from] ApprovalError),

    #[error("Margin engine error: {0}")]
    Engine(#[from] MarginEngineError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl DeedError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DeedError::UntrustedCaller { .. } => ErrorKind::UntrustedCaller,
            DeedError::Registry(RegistryError::NotFound(_)) => ErrorKind::NotFound,
            DeedError::Registry(RegistryError::AlreadyAssigned(_)) => ErrorKind::AlreadyAssigned,
            DeedError::Registry(RegistryError::Unauthorized { .. }) => ErrorKind::Unauthorized,
            DeedError::Registry(RegistryError::InvalidHolder { .. }) => ErrorKind::InvalidHolder,
            DeedError::Approval(ApprovalError::SelfApproval(_)) => ErrorKind::SelfApproval,
            DeedError::Engine(_) => ErrorKind::Engine,
            DeedError::Config(_) => ErrorKind::Config,
        }
    }

    // a bug in the calling engine, not something the caller can fix by retrying
    pub fn is_protocol_violation(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::AlreadyAssigned | ErrorKind::UntrustedCaller
        )
    }
}
