// deed-core: transferable deeds over margin engine positions.
// decides who may close a routed position and who may receive its payout.
// all computation is deterministic with no external I/O.
//
// file map (search X.0 for structs, X.1+ for logic):
//   1.x  types.rs: primitives: Address, PositionId, Amount, Timestamp
//   2.x  registry.rs: deed registry, position -> holder
//   3.x  approvals.rs: closer/recipient approval flags per grantor
//   4.x  module/: deed module: holder surface, engine bridge, results
//   5.x  events.rs: audit events for every state change and decision
//   6.x  config.rs: trusted engine address, retention, env presets
//   7.x  simulator.rs: in-memory margin engine (mocked)
//   margin.rs: the engine boundary trait

pub mod approvals;
pub mod config;
pub mod events;
pub mod margin;
pub mod module;
pub mod registry;
pub mod simulator;
pub mod types;

// re exports for convenience
pub use approvals::*;
pub use events::*;
pub use margin::*;
pub use module::*;
pub use registry::*;
pub use types::*;
pub use config::{ConfigError, Environment, ModuleConfig};
pub use simulator::{CloseOutcome, SimulatedMarginEngine, SimulatedPosition, SimulationError};
