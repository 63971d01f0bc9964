//! Color constants for the terminal user interface.

use ratatui::style::Color;

/// Titles, spinner, beacon tags.
pub const PRIMARY: Color = Color::Indexed(86);
/// Field labels, direction tags.
pub const SECONDARY: Color = Color::Indexed(212);
/// Hints, placeholders, help lines.
pub const MUTED: Color = Color::Indexed(241);
/// Completion banners.
pub const SUCCESS: Color = Color::Indexed(82);
/// Error banners and the waste marker.
pub const ERROR: Color = Color::Indexed(196);
/// Urgency column in the focus view.
pub const URGENCY: Color = Color::Indexed(214);
/// Project column and scheduled dates.
pub const PROJECT: Color = Color::Indexed(6);
