//! Domain layer: pure state, no I/O.

pub mod agent_table;

pub use agent_table::AgentTable;
