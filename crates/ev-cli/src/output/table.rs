#[derive(Clone, Copy, Debug)]
pub struct TableOptions {
    pub max_width: Option<usize>,
    pub color: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

/// One table column. `shrink` columns give up width first when the table
/// is wider than the terminal.
#[derive(Clone, Copy, Debug)]
pub struct Column {
    pub header: &'static str,
    pub align: Align,
    pub shrink: bool,
}

impl Column {
    #[must_use]
    pub const fn left(header: &'static str) -> Self {
        Self {
            header,
            align: Align::Left,
            shrink: false,
        }
    }

    #[must_use]
    pub const fn right(header: &'static str) -> Self {
        Self {
            header,
            align: Align::Right,
            shrink: false,
        }
    }

    #[must_use]
    pub const fn wrapping(header: &'static str) -> Self {
        Self {
            header,
            align: Align::Left,
            shrink: true,
        }
    }
}

const MIN_SHRUNK_WIDTH: usize = 12;
const GAP: &str = "  ";

/// Render rows under `columns`, truncating cells that do not fit.
#[must_use]
pub fn render_table(columns: &[Column], rows: &[Vec<String>], options: TableOptions) -> String {
    if rows.is_empty() {
        return String::from("(no rows)");
    }

    let mut widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(index, column)| {
            rows.iter()
                .filter_map(|row| row.get(index))
                .map(|cell| display_width(cell))
                .max()
                .unwrap_or(0)
                .max(display_width(column.header))
        })
        .collect();
    fit_widths(&mut widths, columns, options.max_width);

    let header = columns
        .iter()
        .zip(&widths)
        .map(|(column, width)| pad(column.header, *width, column.align))
        .collect::<Vec<_>>()
        .join(GAP);
    let divider = "-".repeat(display_width(header.trim_end()));

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(header.trim_end().to_string());
    lines.push(divider);
    for row in rows {
        let line = columns
            .iter()
            .zip(&widths)
            .enumerate()
            .map(|(index, (column, width))| {
                let cell = row.get(index).map_or("-", String::as_str);
                let text = pad(&truncate(cell, *width), *width, column.align);
                if options.color {
                    colorize_status(&text)
                } else {
                    text
                }
            })
            .collect::<Vec<_>>()
            .join(GAP);
        lines.push(line.trim_end().to_string());
    }
    lines.join("\n")
}

fn display_width(value: &str) -> usize {
    value.chars().count()
}

fn fit_widths(widths: &mut [usize], columns: &[Column], max_width: Option<usize>) {
    let Some(max_width) = max_width else {
        return;
    };
    let gaps = widths.len().saturating_sub(1) * GAP.len();
    let mut total = widths.iter().sum::<usize>() + gaps;

    while total > max_width {
        let widest = widths
            .iter()
            .enumerate()
            .filter(|(index, width)| {
                columns.get(*index).is_some_and(|c| c.shrink) && **width > MIN_SHRUNK_WIDTH
            })
            .max_by_key(|(_, width)| **width)
            .map(|(index, _)| index);
        let Some(index) = widest else {
            break;
        };
        widths[index] -= 1;
        total -= 1;
    }
}

fn truncate(value: &str, width: usize) -> String {
    let flat = value.replace(['\n', '\r'], " ");
    if display_width(&flat) <= width {
        return flat;
    }
    let mut out: String = flat.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn pad(value: &str, width: usize, align: Align) -> String {
    let fill = " ".repeat(width.saturating_sub(display_width(value)));
    match align {
        Align::Left => format!("{value}{fill}"),
        Align::Right => format!("{fill}{value}"),
    }
}

fn colorize_status(cell: &str) -> String {
    let code = match cell.trim() {
        "compliant" => "32",
        "non_compliant" => "31",
        "ambiguous" => "33",
        "unevaluated" => "2",
        _ => return cell.to_string(),
    };
    format!("\u{1b}[{code}m{cell}\u{1b}[0m")
}
