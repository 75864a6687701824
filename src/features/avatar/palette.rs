/// 背景色板（进程生命周期内不可变，顺序固定）
pub const BACKGROUND_COLORS: [&str; 12] = [
    "#FF9933", // Saffron
    "#FFD700", // Gold
    "#A569BD", // Purple
    "#1ABC9C", // Turquoise
    "#2C3E50", // Dark blue
    "#E74C3C", // Red
    "#F39C12", // Orange
    "#27AE60", // Green
    "#8E44AD", // Deep purple
    "#D35400", // Dark orange
    "#2980B9", // Blue
    "#C0392B", // Dark red
];

/// 色板描述（`/colors` 返回）
pub const PALETTE_DESCRIPTION: &str = "Spiritual and cultural color palette for MyTempleYatra";

/// 单次生成允许的最大变体数，等于色板大小，保证颜色不重复。
pub const MAX_VARIANTS: usize = BACKGROUND_COLORS.len();

/// 解析 `#RRGGBB` 为 RGB 分量。
pub fn parse_hex(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

#[cfg(test)]
mod tests {
    use super::{BACKGROUND_COLORS, parse_hex};
    use std::collections::HashSet;

    #[test]
    fn palette_has_twelve_distinct_parseable_colors() {
        let unique: HashSet<_> = BACKGROUND_COLORS.iter().collect();
        assert_eq!(unique.len(), 12);
        assert!(BACKGROUND_COLORS.iter().all(|c| parse_hex(c).is_some()));
    }

    #[test]
    fn parse_hex_reads_channels() {
        assert_eq!(parse_hex("#FF9933"), Some((0xFF, 0x99, 0x33)));
        assert_eq!(parse_hex("FF9933"), None);
        assert_eq!(parse_hex("#FFF"), None);
        assert_eq!(parse_hex("#GG0000"), None);
    }
}
