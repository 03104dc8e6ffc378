//! Icon names stored on categories and payment methods, rendered as glyphs.

use unicode_segmentation::UnicodeSegmentation;

pub const FALLBACK_ICON: &str = "circle";
pub const FALLBACK_COLOR: &str = "#6B7280";
pub const DEFAULT_CATEGORY_ICON: &str = "✨";

pub const CATEGORY_COLORS: [&str; 14] = [
    "#EF4444", "#F97316", "#F59E0B", "#EAB308", "#22C55E", "#10B981", "#14B8A6", "#06B6D4",
    "#3B82F6", "#6366F1", "#8B5CF6", "#EC4899", "#6B7280", "#78716C",
];

const NAMED: &[(&str, &str)] = &[
    ("utensils", "🍴"),
    ("car", "🚗"),
    ("shopping-bag", "🛍️"),
    ("home", "🏠"),
    ("music", "🎵"),
    ("heart-pulse", "💊"),
    ("book-open", "📖"),
    ("banknote", "💵"),
    ("plus-circle", "➕"),
    ("minus-circle", "➖"),
    ("credit-card", "💳"),
    ("circle", "●"),
    ("wallet", "👛"),
    ("coffee", "☕"),
    ("plane", "✈️"),
    ("gift", "🎁"),
    ("smartphone", "📱"),
    ("dumbbell", "🏋️"),
    ("scissors", "✂️"),
    ("baby", "🍼"),
];

/// Known icon names map to a glyph; anything else (an emoji typed by the
/// user) renders as itself, and an empty name as a dot.
pub fn glyph(icon: &str) -> &str {
    if icon.is_empty() {
        return "●";
    }
    NAMED
        .iter()
        .find(|(name, _)| *name == icon)
        .map(|(_, glyph)| *glyph)
        .unwrap_or(icon)
}

/// Keeps only the last grapheme typed into the icon field, so emoji built
/// from several code points survive whole.
pub fn last_grapheme(input: &str) -> Option<String> {
    input.trim().graphemes(true).next_back().map(str::to_string)
}

pub fn is_palette_color(color: &str) -> bool {
    CATEGORY_COLORS.contains(&color)
}
