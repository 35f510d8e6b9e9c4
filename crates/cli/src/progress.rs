//! Terminal load bar.

use std::io::Write;

use engine::ProgressReporter;

/// Number of bar columns.
pub const BAR_WIDTH: u64 = 20;

/// Moves the cursor to the start of the previous line and clears to the end
/// of the screen, so the next report overwrites the bar.
const REDRAW: &str = "\x1b[F\x1b[J";

/// Draws `NNN% [=====     ]  label` lines.
///
/// While a file is incomplete each line is followed by [`REDRAW`]; the
/// final report for a file leaves the line in place.
pub struct LoadBar<W: Write> {
    writer: W,
    last: Option<(u64, String)>,
}

impl<W: Write> LoadBar<W> {
    /// Creates a bar drawing into `writer`.
    pub const fn new(writer: W) -> Self {
        Self { writer, last: None }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Renders one report, including the trailing newline and redraw sequence.
#[must_use]
pub fn render_bar(bytes_so_far: u64, total: u64, label: &str) -> String {
    let done = bytes_so_far.min(total);
    let (percent, filled) = if total == 0 {
        (100, BAR_WIDTH)
    } else {
        (
            u128::from(done) * 100 / u128::from(total),
            u64::try_from(u128::from(done) * u128::from(BAR_WIDTH) / u128::from(total))
                .unwrap_or(BAR_WIDTH),
        )
    };

    let mut line = format!("{percent:>3}% [");
    for column in 0..BAR_WIDTH {
        line.push(if column < filled { '=' } else { ' ' });
    }
    line.push_str("]  ");
    line.push_str(label);
    line.push('\n');
    if bytes_so_far < total {
        line.push_str(REDRAW);
    }
    line
}

impl<W: Write> ProgressReporter for LoadBar<W> {
    fn report(&mut self, bytes_so_far: u64, total: u64, label: &str) {
        let percent = if total == 0 {
            100
        } else {
            bytes_so_far.min(total).saturating_mul(100) / total
        };
        if let Some((last_percent, last_label)) = &self.last
            && *last_percent == percent
            && last_label == label
            && bytes_so_far < total
        {
            return;
        }
        self.last = Some((percent, label.to_owned()));

        let _ = self
            .writer
            .write_all(render_bar(bytes_so_far, total, label).as_bytes());
        let _ = self.writer.flush();
    }
}
