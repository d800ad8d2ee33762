// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// Attach.
pub mod completion_provider;
pub mod completion_session;

// Re-export.
pub use completion_provider::*;
pub use completion_session::*;
