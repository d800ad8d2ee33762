// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::ops::Range;

use crate::{AttributeRun, TextAttributes};

/// Vertical metrics of a line.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LineMetrics {
    pub ascent: f64,
    pub descent: f64,
    pub leading: f64,
}

impl LineMetrics {
    #[must_use]
    pub fn height(&self) -> f64 { self.ascent + self.descent + self.leading }

    #[must_use]
    pub fn max(self, other: LineMetrics) -> LineMetrics {
        LineMetrics {
            ascent: self.ascent.max(other.ascent),
            descent: self.descent.max(other.descent),
            leading: self.leading.max(other.leading),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaretEdge {
    Leading,
    Trailing,
}

/// Horizontal caret position at one edge of a grapheme. `byte_index` is the start of the
/// grapheme (relative to the paragraph) for both edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaretOffset {
    pub byte_index: usize,
    pub x: f64,
    pub edge: CaretEdge,
}

impl CaretOffset {
    #[must_use]
    pub fn is_leading(&self) -> bool { self.edge == CaretEdge::Leading }
}

/// One wrapped line as returned by a [`TextShaper`]. Byte ranges are relative to the
/// paragraph text. The range of the last line includes the line break, the caret
/// offsets never do.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapedLine {
    pub byte_range: Range<usize>,
    pub width: f64,
    pub metrics: LineMetrics,
    pub caret_offsets: Vec<CaretOffset>,
}

/// Shaping and font metrics. A pure function of (text, attributes, width).
pub trait TextShaper: std::fmt::Debug {
    /// `available_width` is [`f64::MAX`] when wrapping is disabled.
    fn shape_paragraph(
        &self,
        text: &str,
        runs: &[AttributeRun],
        available_width: f64,
    ) -> Vec<ShapedLine>;

    fn line_metrics(&self, attributes: &TextAttributes) -> LineMetrics;
}
