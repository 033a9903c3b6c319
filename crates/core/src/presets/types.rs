//! Types for the preset and capability tables.

use serde::Serialize;

/// Value marking a preset that takes its number from the probed source.
pub const SOURCE: &str = "source";

/// Value marking a preset whose number is typed by the user.
pub const CUSTOM: &str = "custom";

/// A named numeric choice offered to the user.
///
/// `value == "source"` means "use the probed value", `value == "custom"` means
/// the user supplies a raw number, anything else carries a fixed `amount`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NumericPreset {
    pub label: &'static str,
    pub value: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
}

impl NumericPreset {
    pub(crate) const fn source(label: &'static str) -> Self {
        Self {
            label,
            value: SOURCE,
            amount: None,
        }
    }

    pub(crate) const fn custom() -> Self {
        Self {
            label: "Custom",
            value: CUSTOM,
            amount: None,
        }
    }

    pub(crate) const fn fixed(label: &'static str, value: &'static str, amount: f64) -> Self {
        Self {
            label,
            value,
            amount: Some(amount),
        }
    }

    pub fn is_source(&self) -> bool {
        self.value == SOURCE
    }

    pub fn is_custom(&self) -> bool {
        self.value == CUSTOM
    }
}

/// A container identifier and the extension its files carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FormatOption {
    pub label: &'static str,
    pub value: &'static str,
    pub ext: &'static str,
}

impl FormatOption {
    pub(crate) const fn new(
        label: &'static str,
        value: &'static str,
        ext: &'static str,
    ) -> Self {
        Self { label, value, ext }
    }
}

/// A resolution preset before it is applied to a source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResolutionPreset {
    /// Keep the probed dimensions.
    Source,
    /// Scale both source dimensions by `percent / 100`.
    Scale { percent: u32 },
    /// User-typed width and height.
    Custom,
}

impl ResolutionPreset {
    /// Stable identifier used by callers to refer to this preset.
    pub fn value(&self) -> String {
        match self {
            Self::Source => SOURCE.to_string(),
            Self::Scale { percent } => format!("{}%", percent),
            Self::Custom => CUSTOM.to_string(),
        }
    }

    /// Human readable label.
    pub fn label(&self) -> String {
        match self {
            Self::Source => "Source".to_string(),
            Self::Scale { percent } => format!("{}%", percent),
            Self::Custom => "Custom".to_string(),
        }
    }

    /// Parses an identifier produced by [`ResolutionPreset::value`].
    pub fn from_value(value: &str) -> Option<Self> {
        match value {
            SOURCE => Some(Self::Source),
            CUSTOM => Some(Self::Custom),
            other => other
                .strip_suffix('%')
                .and_then(|p| p.parse::<u32>().ok())
                .filter(|p| *p > 0)
                .map(|percent| Self::Scale { percent }),
        }
    }
}
