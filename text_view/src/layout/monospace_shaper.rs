// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Deterministic shaper where every terminal column is half the font size wide.
//!
//! ```text
//! font_size = 10  →  advance = 5 per column, ascent = 7.5, descent = 2.5
//!
//! "Hello world" at width 40:
//! ┌────────────────────────────────────────┐
//! │H e l l o ␣                             │ ← trailing space hangs
//! │w o r l d                               │
//! └────────────────────────────────────────┘
//! ```
//!
//! Wrapping is greedy on word boundaries. A word wider than the line is broken at
//! grapheme cluster boundaries.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::{AttributeRun, CaretEdge, CaretOffset, LineMetrics, ShapedLine, TextAttributes,
            TextShaper, strip_line_break};

pub const TAB_WIDTH_IN_COLUMNS: usize = 4;

#[derive(Debug, Clone, Copy, Default)]
pub struct MonospaceShaper;

#[derive(Debug, Clone)]
struct Cluster {
    byte_index: usize,
    width: f64,
    metrics: LineMetrics,
    is_whitespace: bool,
}

impl TextShaper for MonospaceShaper {
    fn shape_paragraph(
        &self,
        text: &str,
        runs: &[AttributeRun],
        available_width: f64,
    ) -> Vec<ShapedLine> {
        let content = strip_line_break(text);
        let clusters = self.clusters(content, runs);

        // Cluster index where each line starts.
        let mut line_starts: Vec<usize> = vec![0];
        let mut x = 0.0;
        let mut cluster_index = 0;

        for (segment_start, segment) in content.split_word_bound_indices() {
            let first = cluster_index;
            while cluster_index < clusters.len()
                && clusters[cluster_index].byte_index < segment_start + segment.len()
            {
                cluster_index += 1;
            }
            let segment_clusters = first..cluster_index;
            let segment_width: f64 =
                clusters[segment_clusters.clone()].iter().map(|it| it.width).sum();
            let is_whitespace = clusters[segment_clusters.clone()]
                .iter()
                .all(|it| it.is_whitespace);
            let line_is_empty = line_starts.last() == Some(&first);

            if is_whitespace || x + segment_width <= available_width {
                x += segment_width;
                continue;
            }

            if !line_is_empty {
                line_starts.push(first);
                x = 0.0;
            }

            if segment_width <= available_width {
                x += segment_width;
                continue;
            }

            // Word wider than the line, break it at grapheme boundaries.
            for index in segment_clusters {
                let width = clusters[index].width;
                if x + width > available_width && line_starts.last() != Some(&index) {
                    line_starts.push(index);
                    x = 0.0;
                }
                x += width;
            }
        }

        let default_metrics = self.line_metrics(&attributes_at(runs, content.len()));

        line_starts
            .iter()
            .enumerate()
            .map(|(line_index, &start)| {
                let end = line_starts.get(line_index + 1).copied().unwrap_or(clusters.len());
                let line_clusters = &clusters[start..end];
                let byte_start = line_clusters.first().map_or(
                    if start == 0 { 0 } else { content.len() },
                    |it| it.byte_index,
                );
                let byte_end = match clusters.get(end) {
                    Some(next) => next.byte_index,
                    None => text.len(),
                };

                let mut caret_offsets = Vec::with_capacity(line_clusters.len() * 2);
                let mut x = 0.0;
                let mut metrics: Option<LineMetrics> = None;
                for cluster in line_clusters {
                    caret_offsets.push(CaretOffset {
                        byte_index: cluster.byte_index,
                        x,
                        edge: CaretEdge::Leading,
                    });
                    x += cluster.width;
                    caret_offsets.push(CaretOffset {
                        byte_index: cluster.byte_index,
                        x,
                        edge: CaretEdge::Trailing,
                    });
                    metrics = Some(metrics.map_or(cluster.metrics, |it| it.max(cluster.metrics)));
                }

                ShapedLine {
                    byte_range: byte_start..byte_end,
                    width: x,
                    metrics: metrics.unwrap_or(default_metrics),
                    caret_offsets,
                }
            })
            .collect()
    }

    fn line_metrics(&self, attributes: &TextAttributes) -> LineMetrics {
        let font_size = attributes.font_size.max(1.0);
        LineMetrics {
            ascent: 0.75 * font_size,
            descent: 0.25 * font_size,
            leading: ((attributes.line_height_multiple - 1.0) * font_size).max(0.0),
        }
    }
}

impl MonospaceShaper {
    #[must_use]
    pub fn advance(attributes: &TextAttributes) -> f64 { attributes.font_size.max(1.0) / 2.0 }

    #[allow(clippy::cast_precision_loss)]
    fn clusters(&self, content: &str, runs: &[AttributeRun]) -> Vec<Cluster> {
        content
            .grapheme_indices(true)
            .map(|(byte_index, grapheme)| {
                let attributes = attributes_at(runs, byte_index);
                let columns = if grapheme == "\t" {
                    TAB_WIDTH_IN_COLUMNS
                } else {
                    grapheme.width()
                };
                Cluster {
                    byte_index,
                    width: columns as f64 * Self::advance(&attributes),
                    metrics: self.line_metrics(&attributes),
                    is_whitespace: grapheme.chars().all(char::is_whitespace),
                }
            })
            .collect()
    }
}

fn attributes_at(runs: &[AttributeRun], byte_index: usize) -> TextAttributes {
    let mut start = 0;
    for run in runs {
        if byte_index < start + run.len {
            return run.attributes.clone();
        }
        start += run.len;
    }
    runs.last()
        .map(|it| it.attributes.clone())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn plain_runs(text: &str) -> Vec<AttributeRun> {
        vec![AttributeRun {
            len: text.len(),
            attributes: TextAttributes::default(),
        }]
    }

    fn shape(text: &str, width: f64) -> Vec<ShapedLine> {
        MonospaceShaper.shape_paragraph(text, &plain_runs(text), width)
    }

    fn ranges(lines: &[ShapedLine]) -> Vec<std::ops::Range<usize>> {
        lines.iter().map(|it| it.byte_range.clone()).collect()
    }

    #[test]
    fn test_no_wrap_single_line() {
        let lines = shape("Hello world\n", f64::MAX);
        assert_eq!(ranges(&lines), vec![0..12]);
        assert_eq!(lines[0].width, 55.0);
        assert_eq!(lines[0].metrics.height(), 10.0);
        // Line break has no caret offsets.
        assert_eq!(lines[0].caret_offsets.len(), 22);
    }

    #[test_case("Hello world", 40.0, vec![0..6, 6..11] ; "word wrap with hanging space")]
    #[test_case("abcdefghij", 20.0, vec![0..4, 4..8, 8..10] ; "long word broken at graphemes")]
    #[test_case("ab cdefghij", 20.0, vec![0..3, 3..7, 7..11] ; "long word after short word")]
    #[test_case("\n", 20.0, vec![0..1] ; "empty paragraph")]
    fn test_wrapping(text: &str, width: f64, expected: Vec<std::ops::Range<usize>>) {
        assert_eq!(ranges(&shape(text, width)), expected);
    }

    #[test]
    fn test_caret_offsets_are_monotonic() {
        let lines = shape("a\tb", f64::MAX);
        let xs: Vec<f64> = lines[0]
            .caret_offsets
            .iter()
            .filter(|it| it.is_leading())
            .map(|it| it.x)
            .collect();
        assert_eq!(xs, vec![0.0, 5.0, 25.0]);
    }

    #[test]
    fn test_mixed_font_sizes_take_max_metrics() {
        let runs = vec![
            AttributeRun {
                len: 1,
                attributes: TextAttributes::default(),
            },
            AttributeRun {
                len: 1,
                attributes: TextAttributes::default().with_font_size(20.0),
            },
        ];
        let lines = MonospaceShaper.shape_paragraph("ab", &runs, f64::MAX);
        assert_eq!(lines[0].metrics.height(), 20.0);
        assert_eq!(lines[0].width, 15.0);
    }
}
