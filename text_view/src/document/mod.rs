// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// Attach.
pub mod attributes;
pub mod document_model;
pub mod location;
pub mod text_content_storage;

// Re-export.
pub use attributes::*;
pub use document_model::*;
pub use location::*;
pub use text_content_storage::*;
