//! stackflow Cloud Declarations
//!
//! Provider-neutral building blocks for describing a cloud deployment as a
//! resource graph and handing it to an external provisioning engine.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                 stackflow CLI                    │
//! │           (preview / export / up)                │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │               stackflow-cloud                    │
//! │  ┌──────────────┐  ┌──────────────────────────┐ │
//! │  │    Stack     │  │  Output<T> (write-once)  │ │
//! │  └──────┬───────┘  └──────────────────────────┘ │
//! │  ┌──────▼───────┐  ┌──────────────────────────┐ │
//! │  │   Document   │  │  HandoffStore / Report   │ │
//! │  └──────┬───────┘  └──────────────────────────┘ │
//! └─────────┼───────────────────────────────────────┘
//!           │ trait Engine
//! ┌─────────▼─────────┐
//! │ external engine   │
//! └───────────────────┘
//! ```
//!
//! Ordering, diffing, retries and the cloud API calls themselves all belong
//! to the engine.

pub mod document;
pub mod engine;
pub mod error;
pub mod output;
pub mod report;
pub mod stack;
pub mod store;
pub mod urn;

// Re-exports
pub use document::{DeploymentDocument, DocumentFormat, DocumentSummary, ResourceEntry};
pub use engine::{CommandEngine, Engine, FileEngine};
pub use error::{CloudError, Result};
pub use output::{FileAsset, Output, PropertyMap, PropertyRef, PropertyValue};
pub use report::{EngineReport, ResourceFailure, ResourceState, ResourceStatus};
pub use stack::{ResourceDeclaration, ResourceHandle, Stack};
pub use store::{HandoffStore, StateLock};
pub use urn::Urn;
