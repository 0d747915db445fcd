//! # plumb_core - Water-Supply Calculation Engine
//!
//! `plumb_core` is the computational heart of Plumbline. It sizes pipe
//! sections of cold and hot water networks and derives building-level flows
//! and heat loads following SP 30.13330. All inputs and outputs are
//! JSON-serializable.
//!
//! ## Design Philosophy
//!
//! - **Stateless**: Pure functions over an immutable reference dataset
//! - **JSON-First**: All inputs and outputs implement Serialize/Deserialize
//! - **Rich Errors**: Structured error types naming the field or section at fault
//!
//! ## Quick Start
//!
//! ```rust
//! use plumb_core::calculations::{calculate_sections, PipeSection, SectionRequest};
//! use plumb_core::reference::ReferenceDataset;
//!
//! let dataset = ReferenceDataset::standard().unwrap();
//! let request = SectionRequest::new(1, vec![PipeSection::new(1, 50.0, 25)]);
//! let batch = calculate_sections(dataset, &request).unwrap();
//!
//! let json = serde_json::to_string_pretty(&batch).unwrap();
//! assert!(json.contains("\"velocity\""));
//! ```
//!
//! ## Modules
//!
//! - [`reference`] - Consumer profiles and design curves
//! - [`interpolation`] - Piecewise-linear table lookup
//! - [`equations`] - The design formulas
//! - [`calculations`] - Section and building load calculators
//! - [`project`] - Session container with sections and settings
//! - [`report`] - Table headers, CSV export and text rendering
//! - [`units`] - Type-safe unit wrappers
//! - [`errors`] - Structured error types

pub mod calculations;
pub mod equations;
pub mod errors;
pub mod interpolation;
pub mod project;
pub mod reference;
pub mod report;
pub mod units;

// Re-export commonly used types at crate root for convenience
pub use calculations::{BatchPolicy, VelocityMode};
pub use errors::{CalcError, CalcResult};
pub use project::{GlobalSettings, Project, ProjectMetadata};
pub use reference::{ReferenceDataset, Stream};
