// 4.0: deed module. owns the registry, the approval store and the audit log.
// every entry point takes &mut self, so calls are serialized: one indivisible
// step at a time, no locks.

mod bridge;
mod core;
mod holders;
mod results;

pub use self::core::DeedModule;
pub use results::{CloseDecision, DeedError, DenyReason, ErrorKind};
