//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use userlink_core::prelude::*;
//! ```

// Core pass
pub use crate::error::{LookupFailure, UserlinkError, UserlinkResult};
pub use crate::process::{process, RewrittenDocument};

// Resolvers
pub use crate::resolver::{Directory, MemoResolver, Resolution, Resolver, DEFAULT_UNKNOWN_MARKER};

// Batch driver
pub use crate::batch::{Batch, BatchReport, DocumentStatus};

// Configuration
pub use crate::config::{load_config, UserlinkConfig};
