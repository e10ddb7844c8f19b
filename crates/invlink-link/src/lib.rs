//! Reassembly engine and control loop for the inverter radio link.
//!
//! This is the protocol engine proper. [`ReassemblyEngine`] turns
//! CRC-validated fragments back into whole telemetry messages, re-requesting
//! the ones that went missing; [`InverterLink`] drives the half-duplex
//! channel — a periodic time-sync sender and a continuous receive poller
//! sharing one radio behind one lock.

pub mod config;
pub mod error;
pub mod gateway;
pub mod reassembly;
pub mod telemetry;

pub use config::LinkConfig;
pub use error::{LinkError, Result};
pub use gateway::InverterLink;
pub use reassembly::{Accepted, ReassemblyEngine, Tick};
pub use telemetry::TelemetryReading;
