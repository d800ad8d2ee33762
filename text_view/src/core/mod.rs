// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// Attach.
pub mod decl_macros;
pub mod error;
pub mod geometry;
pub mod log;

// Re-export.
pub use error::*;
pub use geometry::*;
pub use log::*;
