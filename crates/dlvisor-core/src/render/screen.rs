use std::io::{self, Write};

use crossterm::cursor::MoveToPreviousLine;
use crossterm::queue;
use crossterm::terminal::{self, Clear, ClearType};

use super::truncate::truncate_visible;

const FALLBACK_WIDTH: usize = 80;

/// How many rows a redraw may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Height {
    Detect,
    Fixed(usize),
    Unbounded,
}

/// In-place editable block of terminal lines.
///
/// `redraw` moves the cursor back over exactly the lines the previous redraw
/// printed, clears to the end of the screen and prints the current content.
/// Lines are cut to the terminal width so nothing wraps and the count stays
/// exact. A block taller than the terminal cannot be reached by the cursor,
/// so redraws then show the first line plus the newest lines that fit, and
/// `finish` prints the whole block once at the end.
///
/// Terminals without ANSI cursor support get the block over-printed.
#[derive(Debug)]
pub struct Screen<W: Write> {
    out: W,
    lines: Vec<String>,
    drawn: usize,
    windowed: bool,
    width: Option<usize>,
    height: Height,
}

impl<W: Write> Screen<W> {
    /// Screen that detects the terminal size at every redraw.
    pub fn new(out: W) -> Self {
        Self {
            out,
            lines: Vec::new(),
            drawn: 0,
            windowed: false,
            width: None,
            height: Height::Detect,
        }
    }

    /// Screen with a fixed width and no height limit (tests, non-tty output).
    pub fn with_width(out: W, width: usize) -> Self {
        Self {
            width: Some(width),
            height: Height::Unbounded,
            ..Self::new(out)
        }
    }

    /// Screen with a fixed width and height.
    pub fn with_size(out: W, width: usize, height: usize) -> Self {
        Self {
            width: Some(width),
            height: Height::Fixed(height),
            ..Self::new(out)
        }
    }

    /// Override the detected width; the height is still detected.
    pub fn set_width(&mut self, width: usize) {
        self.width = Some(width);
    }

    pub fn append(&mut self, text: impl Into<String>) -> usize {
        self.lines.push(text.into());
        self.lines.len() - 1
    }

    /// Replace line `index`. Returns false when no such line exists.
    pub fn replace(&mut self, index: usize, text: impl Into<String>) -> bool {
        match self.lines.get_mut(index) {
            Some(line) => {
                *line = text.into();
                true
            }
            None => false,
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Physical lines printed by the last redraw.
    pub fn drawn(&self) -> usize {
        self.drawn
    }

    pub fn redraw(&mut self) -> io::Result<()> {
        let shown = window(self.lines.len(), self.current_rows());
        self.draw(&shown)
    }

    /// Print every line, including those a height-limited redraw left out.
    /// Does nothing when the last redraw already showed everything.
    pub fn finish(&mut self) -> io::Result<()> {
        if !self.windowed {
            return Ok(());
        }
        let all: Vec<usize> = (0..self.lines.len()).collect();
        self.draw(&all)
    }

    fn draw(&mut self, shown: &[usize]) -> io::Result<()> {
        if self.drawn > 0 {
            let up = u16::try_from(self.drawn).unwrap_or(u16::MAX);
            queue!(self.out, MoveToPreviousLine(up), Clear(ClearType::FromCursorDown))?;
        }
        let width = self.current_width();
        for &index in shown {
            let cut = truncate_visible(&self.lines[index], width);
            self.out.write_all(cut.as_bytes())?;
            self.out.write_all(b"\n")?;
        }
        self.out.flush()?;
        self.drawn = shown.len();
        self.windowed = shown.len() < self.lines.len();
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn current_width(&self) -> usize {
        if let Some(width) = self.width {
            return width;
        }
        match terminal::size() {
            Ok((cols, _)) if cols > 0 => usize::from(cols),
            _ => FALLBACK_WIDTH,
        }
    }

    fn current_rows(&self) -> Option<usize> {
        match self.height {
            Height::Fixed(rows) => Some(rows),
            Height::Unbounded => None,
            Height::Detect => match terminal::size() {
                Ok((_, rows)) if rows > 0 => Some(usize::from(rows)),
                _ => None,
            },
        }
    }
}

/// Indices of the lines a redraw shows with `rows` terminal rows: all of
/// them when they fit, otherwise line 0 and the newest lines. One row stays
/// free for the cursor below the block.
fn window(total: usize, rows: Option<usize>) -> Vec<usize> {
    match rows {
        Some(rows) if total > 0 && total >= rows => {
            let tail = rows.saturating_sub(2);
            std::iter::once(0).chain(total - tail..total).collect()
        }
        _ => (0..total).collect(),
    }
}
