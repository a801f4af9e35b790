use plotters::style::{RGBAColor, RGBColor};

/// Chart theme configuration
pub struct ChartTheme {
    pub background_color: RGBColor,
    pub text_color: RGBColor,
    pub grid_color: RGBAColor,
    pub axis_color: RGBColor,
    pub bar_color: RGBColor,
}

impl Default for ChartTheme {
    fn default() -> Self {
        Self {
            background_color: RGBColor(255, 255, 255),
            text_color: RGBColor(36, 41, 47),
            grid_color: RGBAColor(36, 41, 47, 0.12),
            axis_color: RGBColor(87, 96, 106),
            bar_color: RGBColor(9, 105, 218),
        }
    }
}

/// Chart style configuration
pub struct ChartStyle {
    pub width: u32,
    pub height: u32,
    pub font_size: u32,
    pub caption_size: u32,
    pub margin: u32,
    pub label_area_size: u32,
    pub bar_margin: u32,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            width: 720,
            height: 360,
            font_size: 14,
            caption_size: 22,
            margin: 12,
            label_area_size: 48,
            bar_margin: 8,
        }
    }
}
