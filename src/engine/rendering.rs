//! Plain-text grid rendering.
//!
//! No color, no box drawing: headers, a dashed underline, and two-space
//! gutters. Styling is the binary's business; everything here has to stay
//! copy-pasteable into a terminal or an email.

pub enum Alignment {
    Left,
    Right,
    Center,
}

/// Pads `value` to `width`. Widths are in characters, not bytes; sparkline
/// glyphs are multi-byte and would wreck byte-based alignment.
pub fn pad(value: &str, width: usize, alignment: Alignment) -> String {
    let missing = width.saturating_sub(display_width(value));

    match alignment {
        Alignment::Left => format!("{}{}", value, " ".repeat(missing)),
        Alignment::Right => format!("{}{}", " ".repeat(missing), value),
        Alignment::Center => {
            let left = missing / 2;
            format!("{}{}{}", " ".repeat(left), value, " ".repeat(missing - left))
        }
    }
}

/// The widest cell at each index across all rows. Rows may have different
/// lengths; short rows simply don't vote on the later columns.
pub fn indexed_maximums(rows: &[Vec<String>]) -> Vec<usize> {
    let mut widths = Vec::new();

    for row in rows {
        for (idx, value) in row.iter().enumerate() {
            if widths.len() <= idx {
                widths.resize(idx + 1, 0);
            }
            widths[idx] = widths[idx].max(display_width(value));
        }
    }

    widths
}

/// Renders headers and rows as an aligned grid:
///
/// ```text
/// day  count
/// ---  -----
/// mon  14
/// tue  3
/// ```
pub fn render_grid(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut all: Vec<Vec<String>> = Vec::with_capacity(rows.len() + 1);
    all.push(headers.to_vec());
    all.extend(rows.iter().cloned());

    let widths = indexed_maximums(&all);

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(render_line(headers, &widths));
    lines.push(render_line(
        &widths
            .iter()
            .take(headers.len())
            .map(|width| "-".repeat(*width))
            .collect::<Vec<_>>(),
        &widths,
    ));
    for row in rows {
        lines.push(render_line(row, &widths));
    }

    lines.join("\n")
}

fn render_line(cells: &[String], widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .enumerate()
        .map(|(idx, cell)| pad(cell, widths.get(idx).copied().unwrap_or(0), Alignment::Left))
        .collect();

    padded.join("  ").trim_end().to_owned()
}

fn display_width(value: &str) -> usize {
    value.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn grids_align_on_the_widest_cell() {
        let grid = render_grid(
            &strings(&["a", "b"]),
            &[strings(&["1", "x"]), strings(&["23", "yy"])],
        );

        assert_eq!(grid, "a   b\n--  --\n1   x\n23  yy");
    }

    #[test]
    fn glyph_cells_count_characters_not_bytes() {
        let grid = render_grid(&strings(&["mon", "tue"]), &[strings(&["▁", "█"])]);

        assert_eq!(grid, "mon  tue\n---  ---\n▁    █");
    }

    #[test]
    fn padding_respects_alignment() {
        assert_eq!(pad("ab", 4, Alignment::Left), "ab  ");
        assert_eq!(pad("ab", 4, Alignment::Right), "  ab");
        assert_eq!(pad("ab", 5, Alignment::Center), " ab  ");
        assert_eq!(pad("abcdef", 2, Alignment::Left), "abcdef");
    }

    #[test]
    fn maximums_are_tracked_per_index() {
        let widths = indexed_maximums(&[strings(&["a", "bbb"]), strings(&["aa", "b", "cc"])]);

        assert_eq!(widths, vec![2, 3, 2]);
    }
}
