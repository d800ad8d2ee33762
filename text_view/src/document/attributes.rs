// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use serde::{Deserialize, Serialize};

pub const DEFAULT_FONT_SIZE: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Styling that affects layout (font size, line height) or drawing (color, link).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextAttributes {
    pub font_size: f64,
    pub line_height_multiple: f64,
    pub foreground: Option<Color>,
    pub link: Option<String>,
}

impl Default for TextAttributes {
    fn default() -> Self {
        Self {
            font_size: DEFAULT_FONT_SIZE,
            line_height_multiple: 1.0,
            foreground: None,
            link: None,
        }
    }
}

impl TextAttributes {
    #[must_use]
    pub fn with_font_size(mut self, font_size: f64) -> Self {
        self.font_size = font_size;
        self
    }

    #[must_use]
    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }
}

/// A run of `len` bytes sharing the same attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeRun {
    pub len: usize,
    pub attributes: TextAttributes,
}

/// Text plus attribute runs that cover it exactly.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AttributedString {
    text: String,
    runs: Vec<AttributeRun>,
}

impl AttributedString {
    #[must_use]
    pub fn new(text: impl Into<String>, attributes: TextAttributes) -> Self {
        let text = text.into();
        let runs = if text.is_empty() {
            vec![]
        } else {
            vec![AttributeRun {
                len: text.len(),
                attributes,
            }]
        };
        Self { text, runs }
    }

    #[must_use]
    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, TextAttributes::default())
    }

    /// Builds from explicit runs. Runs that don't add up to the text length are
    /// repaired by trimming or extending the last run.
    #[must_use]
    pub fn from_runs(text: impl Into<String>, runs: Vec<AttributeRun>) -> Self {
        let text = text.into();
        let mut runs: Vec<AttributeRun> = runs.into_iter().filter(|it| it.len > 0).collect();
        let total: usize = runs.iter().map(|it| it.len).sum();
        match total.cmp(&text.len()) {
            std::cmp::Ordering::Less => match runs.last_mut() {
                Some(last) => last.len += text.len() - total,
                None => runs.push(AttributeRun {
                    len: text.len(),
                    attributes: TextAttributes::default(),
                }),
            },
            std::cmp::Ordering::Greater => {
                let mut remaining = text.len();
                runs.retain_mut(|run| {
                    if remaining == 0 {
                        return false;
                    }
                    run.len = run.len.min(remaining);
                    remaining -= run.len;
                    true
                });
            }
            std::cmp::Ordering::Equal => {}
        }
        Self { text, runs }
    }

    #[must_use]
    pub fn text(&self) -> &str { &self.text }

    #[must_use]
    pub fn runs(&self) -> &[AttributeRun] { &self.runs }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.text.is_empty() }

    #[must_use]
    pub fn len(&self) -> usize { self.text.len() }

    /// Attributes of the run covering `byte_index`.
    #[must_use]
    pub fn attributes_at(&self, byte_index: usize) -> Option<&TextAttributes> {
        let mut start = 0;
        for run in &self.runs {
            if byte_index < start + run.len {
                return Some(&run.attributes);
            }
            start += run.len;
        }
        None
    }
}

/// Replaces the `removed` byte span in `runs` with `inserted`, then merges
/// neighbors that share attributes.
pub(crate) fn splice_runs(
    runs: &[AttributeRun],
    removed: std::ops::Range<usize>,
    inserted: &[AttributeRun],
) -> Vec<AttributeRun> {
    let mut return_it: Vec<AttributeRun> = Vec::with_capacity(runs.len() + inserted.len());
    let mut inserted_done = false;
    let mut start = 0;

    for run in runs {
        let end = start + run.len;

        // Part of this run before the removed span.
        if start < removed.start {
            let len = end.min(removed.start) - start;
            push_merged(&mut return_it, len, &run.attributes);
        }

        if !inserted_done && end >= removed.start {
            for it in inserted {
                push_merged(&mut return_it, it.len, &it.attributes);
            }
            inserted_done = true;
        }

        // Part of this run after the removed span.
        if end > removed.end {
            let len = end - start.max(removed.end);
            push_merged(&mut return_it, len, &run.attributes);
        }

        start = end;
    }

    if !inserted_done {
        for it in inserted {
            push_merged(&mut return_it, it.len, &it.attributes);
        }
    }

    return_it
}

fn push_merged(runs: &mut Vec<AttributeRun>, len: usize, attributes: &TextAttributes) {
    if len == 0 {
        return;
    }
    match runs.last_mut() {
        Some(last) if last.attributes == *attributes => last.len += len,
        _ => runs.push(AttributeRun {
            len,
            attributes: attributes.clone(),
        }),
    }
}

/// Runs restricted to the `range` byte span.
pub(crate) fn slice_runs(runs: &[AttributeRun], range: std::ops::Range<usize>) -> Vec<AttributeRun> {
    let mut return_it = vec![];
    let mut start = 0;
    for run in runs {
        let end = start + run.len;
        let lo = start.max(range.start);
        let hi = end.min(range.end);
        if lo < hi {
            push_merged(&mut return_it, hi - lo, &run.attributes);
        }
        start = end;
    }
    return_it
}
