//! # calc_core - Electrical Field Calculation Engine
//!
//! `calc_core` is the computational heart of Wireline: the calculators an
//! electrician reaches for on a job site, backed by NEC reference tables.
//! All inputs and outputs are JSON-serializable, so the same engine serves
//! the CLI, a mobile front end or any other caller.
//!
//! ## Design Philosophy
//!
//! - **Table-backed**: reference data lives behind the [`reference::ReferenceStore`]
//!   trait and is read through [`reference::ReferenceLookup`]
//! - **JSON-First**: every input, result and error implements Serialize/Deserialize
//! - **Rich Errors**: validation, lookup misses and derived failures are
//!   distinct [`CalcError`] variants
//! - **Full results**: every intermediate value is reported, not just the answer
//!
//! ## Quick Start
//!
//! ```rust
//! use calc_core::calculations::voltage_drop::{calculate, ResistanceBasis, VoltageDropInput};
//! use calc_core::conductors::{ConductorMaterial, ConductorSize, Phase};
//! use calc_core::reference::ReferenceLookup;
//! use calc_core::settings::EngineSettings;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let lookup = ReferenceLookup::bundled().unwrap();
//! let input = VoltageDropInput {
//!     label: "Panel B feeder".to_string(),
//!     material: ConductorMaterial::Copper,
//!     size: ConductorSize::Awg(10),
//!     phase: Phase::Single,
//!     system_voltage: 240.0,
//!     load_current_a: 24.0,
//!     one_way_length_ft: 100.0,
//!     basis: ResistanceBasis::Dc,
//!     parallel_sets: 1,
//! };
//! let result = calculate(&input, &lookup, &EngineSettings::default()).await.unwrap();
//! assert!(result.voltage_drop_percent < 3.0);
//! # });
//! ```
//!
//! ## Modules
//!
//! - [`calculations`] - Every calculator, plus [`calculations::CalculationItem`] dispatch
//! - [`reference`] - Reference tables, the store trait and the lookup layer
//! - [`conductors`] - Conductor sizes, materials and other typed table keys
//! - [`catalog`] - Standard device, transformer and service ratings
//! - [`engine`] - Lookup plus settings in one handle
//! - [`session`] - Observable latest-result holder
//! - [`settings`] - TOML engine settings
//! - [`units`] - Type-safe unit wrappers
//! - [`errors`] - Structured error types

pub mod calculations;
pub mod catalog;
pub mod conductors;
pub mod engine;
pub mod errors;
pub mod reference;
pub mod session;
pub mod settings;
pub mod units;

// Re-export commonly used types at crate root for convenience
pub use calculations::{calculate_item, parse_form, CalculationItem, CalculationOutput, CalculationReport};
pub use engine::Engine;
pub use errors::{CalcError, CalcResult};
pub use reference::{MemoryReferenceStore, ReferenceLookup, ReferenceStore};
pub use session::{CalculationSession, Outcome};
pub use settings::EngineSettings;
