//! ANSI styling for terminal output.

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const RED: &str = "\x1b[91m";
const GREEN: &str = "\x1b[92m";
const YELLOW: &str = "\x1b[93m";
const MAGENTA: &str = "\x1b[95m";
const CYAN: &str = "\x1b[96m";

/// Escape codes for one run; all empty when color is off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub reset: &'static str,
    pub bold: &'static str,
    pub dim: &'static str,
    pub red: &'static str,
    pub green: &'static str,
    pub yellow: &'static str,
    pub magenta: &'static str,
    pub cyan: &'static str,
}

impl Palette {
    pub fn new(use_color: bool) -> Self {
        if use_color {
            Palette {
                reset: RESET,
                bold: BOLD,
                dim: DIM,
                red: RED,
                green: GREEN,
                yellow: YELLOW,
                magenta: MAGENTA,
                cyan: CYAN,
            }
        } else {
            Palette::plain()
        }
    }

    pub fn plain() -> Self {
        Palette {
            reset: "",
            bold: "",
            dim: "",
            red: "",
            green: "",
            yellow: "",
            magenta: "",
            cyan: "",
        }
    }

    /// `name (pid N)` with the name in cyan and the pid in yellow.
    pub fn process_label(&self, name: &str, pid: impl std::fmt::Display) -> String {
        format!(
            "{}{name}{} (pid {}{pid}{})",
            self.cyan, self.reset, self.yellow, self.reset
        )
    }
}
