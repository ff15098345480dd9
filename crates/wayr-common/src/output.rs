//! Output mode and color specifications.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// How a resolved process is rendered on stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Full human-readable report (default)
    #[default]
    Report,

    /// One line: the ancestry chain ending at the process
    Short,

    /// pstree-style descendant tree from the topmost ancestor
    Tree,

    /// Pretty-printed JSON object per process
    Json,

    /// Advisory warnings only
    Warnings,
}

impl OutputMode {
    /// Mode selected by the CLI flags. When several are given, warnings
    /// beats json, json beats short, and short beats tree.
    pub fn from_flags(warnings: bool, json: bool, short: bool, tree: bool) -> Self {
        if warnings {
            OutputMode::Warnings
        } else if json {
            OutputMode::Json
        } else if short {
            OutputMode::Short
        } else if tree {
            OutputMode::Tree
        } else {
            OutputMode::Report
        }
    }
}

impl std::fmt::Display for OutputMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputMode::Report => write!(f, "report"),
            OutputMode::Short => write!(f, "short"),
            OutputMode::Tree => write!(f, "tree"),
            OutputMode::Json => write!(f, "json"),
            OutputMode::Warnings => write!(f, "warnings"),
        }
    }
}

/// When to emit ANSI color codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorChoice {
    /// Color when stdout is a terminal
    #[default]
    Auto,

    /// Always color
    Always,

    /// Never color
    Never,
}

impl ColorChoice {
    pub fn resolve(self, is_terminal: bool) -> bool {
        match self {
            ColorChoice::Auto => is_terminal,
            ColorChoice::Always => true,
            ColorChoice::Never => false,
        }
    }
}

impl std::fmt::Display for ColorChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColorChoice::Auto => write!(f, "auto"),
            ColorChoice::Always => write!(f, "always"),
            ColorChoice::Never => write!(f, "never"),
        }
    }
}
