use crate::color::RgbaColor;

#[derive(
    strum::AsRefStr,
    strum::EnumIter,
    PartialEq,
    Eq,
    Copy,
    Clone,
    Hash,
    Debug,
    Default,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    #[default]
    Brush,
    Eraser,
    Move,
    Rect,
    /// Pan and zoom only.
    View,
    Bbox,
    ColorPicker,
}

#[derive(Copy, Clone, PartialEq, Debug, serde::Serialize, serde::Deserialize)]
pub struct WidthSettings {
    /// Diameter, in logical pixels.
    pub width: f32,
}

#[derive(Copy, Clone, PartialEq, Debug, serde::Serialize, serde::Deserialize)]
pub struct ToolState {
    pub selected: Tool,
    /// The tool to return to once a temporary tool (ie. view while space is held) is released.
    pub selected_buffer: Option<Tool>,
    pub fill: RgbaColor,
    pub brush: WidthSettings,
    pub eraser: WidthSettings,
}
impl Default for ToolState {
    fn default() -> Self {
        Self {
            selected: Tool::default(),
            selected_buffer: None,
            fill: RgbaColor::rgb(31, 160, 224),
            brush: WidthSettings { width: 50.0 },
            eraser: WidthSettings { width: 50.0 },
        }
    }
}

/// Tool widths must be finite and strictly positive.
pub(super) fn valid_width(width: f32) -> bool {
    width.is_finite() && width > 0.0
}
