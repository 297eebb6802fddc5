//! # riskit-core
//!
//! Provider-agnostic structured generation for the RiskIT dashboard.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                 StructuredGenerationService                  │
//! │  ┌─────────────┐  ┌──────────────────┐  ┌─────────────────┐  │
//! │  │ KeyResolver │──│ StructuredProvider│──│   normalize()   │  │
//! │  │ (credential)│  │    (Strategy)     │  │ (JSON repair)   │  │
//! │  └─────────────┘  └──────────────────┘  └─────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `StructuredProvider` trait lets Groq and Gemini be swapped without
//! touching prompt construction or result parsing.

pub mod credential;
pub mod error;
pub mod normalize;
pub mod provider;
pub mod schema;

pub use credential::{Credential, CredentialProvider, EngineStatus, KeyResolver, ProviderKind};
pub use error::{GenerationError, ParseError, Result};
pub use normalize::{normalize, normalize_into};
pub use provider::{
    GenerationOptions, GenerationRequest, GenerationResult, GroundingSource, ProviderInfo,
    StructuredProvider, UseCase,
};
pub use schema::{OutputSchema, SchemaType};
