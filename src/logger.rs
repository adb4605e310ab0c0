//! Logging utilities with colored output and progress bars.
//!
//! This module provides:
//! - `log!` macro for formatted terminal output with colored prefixes
//! - `ProgressBars` for displaying one bar per build stage
//!
//! # Example
//!
//! ```ignore
//! log!("content"; "found {} documents", count);
//!
//! if let Some(progress) = ProgressBars::new_filtered(&[("content", 100), ("archive", 12)]) {
//!     progress.inc("content");
//!     progress.finish();
//! }
//! ```

use colored::{ColoredString, Colorize};
use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType, size},
};
use std::{
    io::{IsTerminal, Write, stdout},
    sync::{
        Mutex, OnceLock,
        atomic::{AtomicUsize, Ordering},
    },
};

/// Cached terminal width (fetched once on first use)
static TERMINAL_WIDTH: OnceLock<u16> = OnceLock::new();

/// Active progress bar count (for log coordination)
static BAR_COUNT: AtomicUsize = AtomicUsize::new(0);

// ============================================================================
// Layout Constants
// ============================================================================
//
// Progress bar format: "[module] [████░░░░] 42/100"
//                       ^------^ ^-------^ ^----^
//                       prefix   bar       count

/// Brackets around the module name plus the space after: "[" "]" " "
const PREFIX_OVERHEAD: usize = 3;
/// Bar wrapper " []" plus the space before the count
const BAR_OVERHEAD: usize = 4;
const MIN_BAR_WIDTH: usize = 10;
const MAX_BAR_WIDTH: usize = 40;

#[inline]
const fn calc_prefix_len(module_len: usize) -> usize {
    module_len + PREFIX_OVERHEAD
}

/// Get terminal width, cached after first call.
/// Falls back to 120 columns if detection fails.
fn get_terminal_width() -> u16 {
    *TERMINAL_WIDTH.get_or_init(|| size().map(|(w, _)| w).unwrap_or(120))
}

// ============================================================================
// Log Macro
// ============================================================================

/// Log a message with a colored module prefix.
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

// ============================================================================
// Progress Bars
// ============================================================================

/// One progress bar per stage, each on its own terminal line.
///
/// Bars are looked up by stage name. Terminal updates from worker threads
/// are serialized through a mutex.
pub struct ProgressBars {
    bars: Vec<ProgressBar>,
    lock: Mutex<()>,
}

struct ProgressBar {
    name: &'static str,
    prefix: ColoredString,
    total: usize,
    current: AtomicUsize,
    row: usize,
}

impl ProgressBars {
    fn new(stages: &[(&'static str, usize)]) -> Self {
        // Reserve terminal lines for progress bars
        let mut stdout = stdout().lock();
        for _ in 0..stages.len() {
            writeln!(stdout).ok();
        }
        stdout.flush().ok();

        BAR_COUNT.store(stages.len(), Ordering::SeqCst);

        let bars = stages
            .iter()
            .enumerate()
            .map(|(row, &(name, total))| ProgressBar {
                name,
                prefix: colorize_prefix(name),
                total,
                current: AtomicUsize::new(0),
                row,
            })
            .collect();

        Self {
            bars,
            lock: Mutex::new(()),
        }
    }

    /// Create bars for stages with a non-zero count.
    ///
    /// Returns `None` when stdout is not a terminal or when there is at
    /// most one item in total.
    pub fn new_filtered(stages: &[(&'static str, usize)]) -> Option<Self> {
        if !stdout().is_terminal() {
            return None;
        }

        let filtered: Vec<_> = stages
            .iter()
            .filter(|(_, count)| *count > 0)
            .copied()
            .collect();
        let total: usize = filtered.iter().map(|(_, c)| c).sum();

        if total <= 1 {
            return None;
        }

        Some(Self::new(&filtered))
    }

    /// Increment the bar registered under `name`.
    pub fn inc(&self, name: &str) {
        if let Some(bar) = self.bars.iter().find(|bar| bar.name == name) {
            let current = bar.current.fetch_add(1, Ordering::Relaxed) + 1;
            self.display(bar, current);
        }
    }

    /// Render a progress bar at its designated row.
    fn display(&self, bar: &ProgressBar, current: usize) {
        let _guard = self.lock.lock().ok();

        let progress_text = format!("{}/{}", current, bar.total);
        let (filled, empty) = bar_split(
            current,
            bar.total,
            get_terminal_width() as usize,
            calc_prefix_len(bar.name.len()) + BAR_OVERHEAD + progress_text.len(),
        );
        let progress_bar: String = "█".repeat(filled) + &"░".repeat(empty);

        let mut stdout = stdout().lock();
        #[allow(clippy::cast_possible_truncation)] // Safe: bars count is always small
        let lines_up = (self.bars.len() - bar.row) as u16;
        execute!(stdout, cursor::MoveUp(lines_up)).ok();
        execute!(stdout, Clear(ClearType::CurrentLine)).ok();
        write!(stdout, "{} [{}] {}", bar.prefix, progress_bar, progress_text).ok();
        execute!(stdout, cursor::MoveDown(lines_up)).ok();
        write!(stdout, "\r").ok();
        stdout.flush().ok();
    }

    /// Clear all progress bars from the terminal.
    #[allow(clippy::cast_possible_truncation)] // Safe: bars count is always small
    pub fn finish(&self) {
        if BAR_COUNT.swap(0, Ordering::SeqCst) == 0 {
            return;
        }
        let _guard = self.lock.lock().ok();

        let mut stdout = stdout().lock();
        let bars_len = self.bars.len() as u16;

        execute!(stdout, cursor::MoveUp(bars_len)).ok();
        for _ in &self.bars {
            execute!(stdout, Clear(ClearType::CurrentLine)).ok();
            execute!(stdout, cursor::MoveDown(1)).ok();
        }
        execute!(stdout, cursor::MoveUp(bars_len)).ok();
        stdout.flush().ok();
    }
}

impl Drop for ProgressBars {
    fn drop(&mut self) {
        self.finish();
    }
}

/// Split the available width into (filled, empty) cells.
fn bar_split(current: usize, total: usize, width: usize, overhead: usize) -> (usize, usize) {
    let bar_width = width.saturating_sub(overhead).clamp(MIN_BAR_WIDTH, MAX_BAR_WIDTH);
    let filled = if total > 0 {
        (current.min(total) * bar_width) / total
    } else {
        0
    };
    (filled, bar_width - filled)
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Log a message with a colored module prefix.
///
/// Single-line messages are truncated to fit the terminal width.
#[inline]
#[allow(clippy::cast_possible_truncation)] // Safe: bars count is always small
pub fn log(module: &str, message: &str) {
    let prefix = colorize_prefix(module);
    let width = get_terminal_width() as usize;

    let mut stdout = stdout().lock();

    let bar_count = BAR_COUNT.load(Ordering::SeqCst);
    if bar_count > 0 {
        execute!(stdout, cursor::MoveUp(bar_count as u16)).ok();
        execute!(stdout, Clear(ClearType::FromCursorDown)).ok();
    }

    let message = if message.contains('\n') {
        message
    } else {
        truncate_str(message, width.saturating_sub(calc_prefix_len(module.len())))
    };
    writeln!(stdout, "{prefix} {message}").ok();

    for _ in 0..bar_count {
        writeln!(stdout).ok();
    }

    stdout.flush().ok();
}

/// Apply color to a module prefix based on module type.
#[inline]
fn colorize_prefix(module: &str) -> ColoredString {
    let prefix = format!("[{module}]");
    match module.to_ascii_lowercase().as_str() {
        "error" => prefix.bright_red().bold(),
        "warn" | "skip" => prefix.bright_magenta().bold(),
        "feed" | "sitemap" => prefix.bright_blue().bold(),
        "build" => prefix.bright_green().bold(),
        _ => prefix.bright_yellow().bold(),
    }
}

/// Truncate a string to fit within `max_len` bytes.
///
/// Ensures the result is valid UTF-8 by finding the nearest character boundary.
#[inline]
fn truncate_str(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        return s;
    }
    let mut end = max_len;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

// ============================================================================
// Tests
// ============================================================================
