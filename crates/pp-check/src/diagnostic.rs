use pp_core::Color;
use serde::Serialize;

/// Verdict shown next to one measured value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticMark {
    Pass,
    Fail,
    /// Nothing was measured.
    NoValue,
}

impl DiagnosticMark {
    pub fn from_pass(pass: bool) -> Self {
        if pass { Self::Pass } else { Self::Fail }
    }

    pub fn color(self) -> Color {
        match self {
            Self::Pass => Color::Green,
            Self::Fail => Color::Red,
            Self::NoValue => Color::Aluminium,
        }
    }
}

/// One numbered line of a checker's report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Fixed slot number; renderers place the line by it.
    pub index: u8,
    pub label: &'static str,
    pub value: i32,
    pub has_value: bool,
    pub mark: DiagnosticMark,
}

impl Diagnostic {
    pub fn measured(index: u8, label: &'static str, value: i32, pass: bool) -> Self {
        Self {
            index,
            label,
            value,
            has_value: true,
            mark: DiagnosticMark::from_pass(pass),
        }
    }

    pub fn empty(index: u8, label: &'static str) -> Self {
        Self {
            index,
            label,
            value: 0,
            has_value: false,
            mark: DiagnosticMark::NoValue,
        }
    }
}
