// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Disview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of disview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::env;

use ratatui::style::{Color, Modifier, Style};
use thiserror::Error;

pub(crate) const ENV_TUI_PALETTE: &str = "DISVIEW_TUI_PALETTE";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum ThemeMode {
    #[default]
    Dark,
    Light,
}

impl ThemeMode {
    pub(crate) fn toggled(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Light => "light",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct TuiTheme {
    palette: Option<TuiPalette>,
    mode: ThemeMode,
}

impl TuiTheme {
    pub(crate) fn from_env() -> Result<Self, ThemeError> {
        let palette = palette_override_from_env()?;
        Ok(Self {
            palette,
            mode: ThemeMode::Dark,
        })
    }

    pub(crate) fn mode(&self) -> ThemeMode {
        self.mode
    }

    /// Switches between dark and light. A palette override swaps its fg and bg.
    pub(crate) fn toggle_mode(&mut self) -> ThemeMode {
        self.mode = self.mode.toggled();
        self.mode
    }

    pub(crate) fn base_style(&self) -> Style {
        match (&self.palette, self.mode) {
            (Some(palette), ThemeMode::Dark) => Style::default().fg(palette.fg).bg(palette.bg),
            (Some(palette), ThemeMode::Light) => Style::default().fg(palette.bg).bg(palette.fg),
            (None, ThemeMode::Dark) => Style::default(),
            (None, ThemeMode::Light) => Style::default().fg(Color::Black).bg(Color::White),
        }
    }

    fn ansi_color(&self, color: Ansi16) -> Color {
        match &self.palette {
            Some(palette) => palette.ansi_color(color.idx()),
            None => color.into(),
        }
    }

    /// Dimmed text; bright black disappears on a light background.
    fn muted(&self) -> Color {
        match self.mode {
            ThemeMode::Dark => self.ansi_color(Ansi16::BrightBlack),
            ThemeMode::Light => self.ansi_color(Ansi16::Blue),
        }
    }

    pub(crate) fn panel_border_style(&self, focused: bool) -> Style {
        if focused {
            self.base_style().fg(self.ansi_color(Ansi16::Yellow))
        } else {
            self.base_style()
        }
    }

    pub(crate) fn selection_style(&self) -> Style {
        self.base_style()
            .add_modifier(Modifier::REVERSED | Modifier::BOLD)
    }

    pub(crate) fn error_style(&self) -> Style {
        self.base_style().fg(self.ansi_color(Ansi16::Red))
    }

    pub(crate) fn address_style(&self) -> Style {
        self.base_style().fg(self.ansi_color(Ansi16::Green))
    }

    pub(crate) fn bytes_style(&self) -> Style {
        self.base_style().fg(self.muted())
    }

    pub(crate) fn comment_style(&self) -> Style {
        self.base_style()
            .fg(self.muted())
            .add_modifier(Modifier::ITALIC)
    }

    pub(crate) fn header_style(&self) -> Style {
        self.base_style()
            .fg(self.ansi_color(Ansi16::Magenta))
            .add_modifier(Modifier::BOLD)
    }

    pub(crate) fn label_style(&self) -> Style {
        self.base_style()
            .fg(self.ansi_color(Ansi16::Cyan))
            .add_modifier(Modifier::BOLD)
    }

    /// The jump target line inside the preview.
    pub(crate) fn target_style(&self) -> Style {
        self.base_style()
            .fg(self.ansi_color(Ansi16::Black))
            .bg(self.ansi_color(Ansi16::Yellow))
            .add_modifier(Modifier::BOLD)
    }

    pub(crate) fn bar_style(&self) -> Style {
        self.base_style().fg(self.ansi_color(Ansi16::Cyan))
    }

    pub(crate) fn footer_key_style(&self) -> Style {
        self.base_style().fg(self.ansi_color(Ansi16::Cyan))
    }

    pub(crate) fn footer_label_style(&self) -> Style {
        self.base_style().fg(self.muted())
    }
}

#[derive(Debug, Clone)]
struct TuiPalette {
    fg: Color,
    bg: Color,
    ansi: [Color; 16],
}

impl TuiPalette {
    const CSV_LEN: usize = 18;

    fn parse_csv(value: &str) -> Result<Self, String> {
        let parts: Vec<&str> = value.split(',').map(|part| part.trim()).collect();
        if parts.len() != Self::CSV_LEN {
            return Err(format!(
                "expected {} comma-separated colors (fg,bg,black,red,green,yellow,blue,magenta,cyan,white,bright_black,bright_red,bright_green,bright_yellow,bright_blue,bright_magenta,bright_cyan,bright_white), got {}",
                Self::CSV_LEN,
                parts.len()
            ));
        }

        let fg = parse_palette_color(parts[0])?;
        let bg = parse_palette_color(parts[1])?;

        let mut ansi = [Color::Reset; 16];
        for (idx, part) in parts.iter().skip(2).enumerate() {
            ansi[idx] = parse_palette_color(part)?;
        }

        Ok(Self { fg, bg, ansi })
    }

    fn ansi_color(&self, idx: usize) -> Color {
        self.ansi[idx]
    }
}

fn palette_override_from_env() -> Result<Option<TuiPalette>, ThemeError> {
    let value = match env::var(ENV_TUI_PALETTE) {
        Ok(value) => value,
        Err(env::VarError::NotPresent) => return Ok(None),
        Err(env::VarError::NotUnicode(_)) => {
            return Err(ThemeError::InvalidEnv {
                name: ENV_TUI_PALETTE.to_owned(),
                value: "<non-unicode>".to_owned(),
            });
        }
    };

    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let parsed = TuiPalette::parse_csv(trimmed).map_err(|error| ThemeError::InvalidEnv {
        name: ENV_TUI_PALETTE.to_owned(),
        value: format!("{trimmed} ({error})"),
    })?;

    Ok(Some(parsed))
}

fn parse_palette_color(value: &str) -> Result<Color, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("empty color".to_owned());
    }

    let lower = trimmed.to_ascii_lowercase();
    if let Some(rest) = lower.strip_prefix("rgb:") {
        let parts: Vec<&str> = rest.split('/').collect();
        if parts.len() != 3 {
            return Err(format!("invalid rgb: value: {trimmed}"));
        }
        let r = parse_hex_channel(parts[0])?;
        let g = parse_hex_channel(parts[1])?;
        let b = parse_hex_channel(parts[2])?;
        return Ok(Color::Rgb(r, g, b));
    }

    let hex = trimmed
        .strip_prefix('#')
        .or_else(|| trimmed.strip_prefix("0x"))
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if hex.len() != 6 || !hex.chars().all(|ch| ch.is_ascii_hexdigit()) {
        return Err(format!("invalid hex color: {trimmed} (expected #RRGGBB)"));
    }
    let rgb = u32::from_str_radix(hex, 16).map_err(|_| format!("invalid hex color: {trimmed}"))?;
    let r = ((rgb >> 16) & 0xFF) as u8;
    let g = ((rgb >> 8) & 0xFF) as u8;
    let b = (rgb & 0xFF) as u8;
    Ok(Color::Rgb(r, g, b))
}

fn parse_hex_channel(value: &str) -> Result<u8, String> {
    let value = value.trim();
    match value.len() {
        2 => u8::from_str_radix(value, 16).map_err(|_| format!("invalid rgb: component {value}")),
        4 => u16::from_str_radix(value, 16)
            .map(|parsed| (parsed >> 8) as u8)
            .map_err(|_| format!("invalid rgb: component {value}")),
        _ => Err(format!(
            "invalid rgb: component {value} (expected 2 or 4 hex digits)"
        )),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ansi16 {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    BrightBlack,
}

impl Ansi16 {
    const fn idx(self) -> usize {
        match self {
            Self::Black => 0,
            Self::Red => 1,
            Self::Green => 2,
            Self::Yellow => 3,
            Self::Blue => 4,
            Self::Magenta => 5,
            Self::Cyan => 6,
            Self::BrightBlack => 8,
        }
    }
}

impl From<Ansi16> for Color {
    fn from(value: Ansi16) -> Self {
        match value {
            Ansi16::Black => Color::Black,
            Ansi16::Red => Color::Red,
            Ansi16::Green => Color::Green,
            Ansi16::Yellow => Color::Yellow,
            Ansi16::Blue => Color::Blue,
            Ansi16::Magenta => Color::Magenta,
            Ansi16::Cyan => Color::Cyan,
            Ansi16::BrightBlack => Color::DarkGray,
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum ThemeError {
    #[error("invalid env {name}={value}")]
    InvalidEnv { name: String, value: String },
}

#[cfg(test)]
mod tests {
    use ratatui::style::Color;

    use super::{parse_palette_color, ThemeMode, TuiPalette, TuiTheme};

    #[test]
    fn palette_override_parses_valid_csv() {
        let palette = TuiPalette::parse_csv(
            "#111111,#222222,#000000,#ff0000,#00ff00,#ffff00,#0000ff,#ff00ff,#00ffff,#ffffff,#1a1a1a,#ff1111,#11ff11,#ffff11,#1111ff,#ff11ff,#11ffff,#fefefe",
        )
        .expect("palette");

        assert_eq!(palette.fg, Color::Rgb(0x11, 0x11, 0x11));
        assert_eq!(palette.bg, Color::Rgb(0x22, 0x22, 0x22));
        assert_eq!(palette.ansi_color(1), Color::Rgb(0xff, 0, 0));
        assert_eq!(palette.ansi_color(15), Color::Rgb(0xfe, 0xfe, 0xfe));
    }

    #[test]
    fn palette_override_rejects_invalid_csv() {
        let err = TuiPalette::parse_csv("nope").unwrap_err();
        assert!(err.contains("expected"));
    }

    #[test]
    fn rgb_colors_accept_short_and_long_channels() {
        assert_eq!(
            parse_palette_color("rgb:ff/80/00").expect("color"),
            Color::Rgb(0xff, 0x80, 0)
        );
        assert_eq!(
            parse_palette_color("rgb:ffff/8080/0000").expect("color"),
            Color::Rgb(0xff, 0x80, 0)
        );
    }

    #[test]
    fn toggling_mode_changes_base_style() {
        let mut theme = TuiTheme::default();
        let dark = theme.base_style();
        assert_eq!(theme.toggle_mode(), ThemeMode::Light);
        assert_ne!(theme.base_style(), dark);
        assert_eq!(theme.toggle_mode(), ThemeMode::Dark);
        assert_eq!(theme.base_style(), dark);
    }
}
