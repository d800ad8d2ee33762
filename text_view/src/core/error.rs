// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Error kinds for the text view core.
//!
//! Layout, viewport, and navigation never fail outward. They clamp, return [`None`],
//! or do nothing. The variants here describe those quiet paths so they can be logged
//! with structure, and they are returned from the few strict entry points (config
//! parsing, logging setup, validated edits, completion delivery).

/// Alias used at the fallible edges of the crate.
pub type CommonResult<T> = miette::Result<T>;

#[derive(thiserror::Error, Debug, Clone, PartialEq, miette::Diagnostic)]
pub enum TextViewError {
    #[error("📍 Location offset {offset} is outside of the document (length {document_length})")]
    #[diagnostic(
        code(r3bl_text_view::out_of_range_location),
        help("Locations are clamped to the document range before they are used")
    )]
    OutOfRangeLocation {
        offset: usize,
        document_length: usize,
    },

    #[error("📐 No layout geometry is available for offset {offset}")]
    #[diagnostic(
        code(r3bl_text_view::no_geometry_available),
        help("Call `ensure_layout` for the range before asking for geometry")
    )]
    NoGeometryAvailable { offset: usize },

    #[error("↩️ Invalid undo state: {reason}")]
    #[diagnostic(code(r3bl_text_view::invalid_undo_state))]
    InvalidUndoState { reason: String },

    #[error("🛑 Operation with generation {generation} was cancelled or superseded")]
    #[diagnostic(code(r3bl_text_view::cancelled))]
    Cancelled { generation: u64 },

    #[error("⚙️ Invalid configuration: {reason}")]
    #[diagnostic(
        code(r3bl_text_view::invalid_configuration),
        help("Check the JSON against the fields of `TextViewConfig`")
    )]
    InvalidConfiguration { reason: String },
}
