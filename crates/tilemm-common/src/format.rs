use core::fmt::Write;

/// Number of leading and trailing rows/columns shown by [format_matrix].
const PREVIEW: usize = 3;

/// Format a row-major matrix for logging.
///
/// Large matrices only show their first and last rows and columns, separated by `...`.
pub fn format_matrix(data: &[f32], rows: usize, cols: usize, name: &str) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "{name} ({rows}, {cols})");

    for row in preview_indices(rows) {
        let Some(row) = row else {
            output.push_str("  ...\n");
            continue;
        };

        output.push_str("  [");
        for (position, col) in preview_indices(cols).into_iter().enumerate() {
            if position > 0 {
                output.push_str(", ");
            }
            match col {
                Some(col) => {
                    let _ = write!(output, "{:9.4}", data[row * cols + col]);
                }
                None => output.push_str("..."),
            }
        }
        output.push_str("]\n");
    }

    output
}

fn preview_indices(len: usize) -> Vec<Option<usize>> {
    if len <= 2 * PREVIEW {
        return (0..len).map(Some).collect();
    }

    (0..PREVIEW)
        .map(Some)
        .chain(core::iter::once(None))
        .chain((len - PREVIEW..len).map(Some))
        .collect()
}
