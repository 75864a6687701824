use resvg::tiny_skia::{Color, Pixmap, Transform};
use resvg::usvg::{self, Options as UsvgOptions, fontdb};
use std::path::PathBuf;
use std::sync::Arc;

use super::initials::Initials;
use super::palette::parse_hex;
use crate::error::StoreError;

// 常量定义
pub const CANVAS_SIZE: u32 = 400;
pub const FONT_SIZE: f32 = 180.0;
pub const TEXT_COLOR: &str = "#FFFFFF";
/// 视觉上字形基线偏下，整体上移以居中
pub const VERTICAL_BIAS: f32 = 20.0;
const GENERIC_FAMILY: &str = "sans-serif";

/// 把首字母绘制到固定尺寸画布上的能力（存储层只依赖该接口）。
pub trait AvatarRenderer: Send + Sync {
    /// 返回编码好的 PNG 字节。
    fn render(&self, initials: &Initials, background: &str) -> Result<Vec<u8>, StoreError>;
}

/// 字体候选项，按优先级依次尝试。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontCandidate {
    /// 指定字体文件
    File(PathBuf),
    /// 系统字体库（兜底，永不失败）
    System,
}

impl FontCandidate {
    /// 由配置的路径列表构造候选链，末尾总是追加系统字体兜底。
    pub fn chain_from_paths<S: AsRef<str>>(paths: &[S]) -> Vec<FontCandidate> {
        paths
            .iter()
            .map(|p| FontCandidate::File(PathBuf::from(p.as_ref())))
            .chain(std::iter::once(FontCandidate::System))
            .collect()
    }

    fn load(&self) -> Option<ResolvedFont> {
        match self {
            FontCandidate::File(path) => {
                if !path.is_file() {
                    return None;
                }
                let mut db = fontdb::Database::new();
                if let Err(e) = db.load_font_file(path) {
                    tracing::debug!("加载字体文件失败 '{}': {}", path.display(), e);
                    return None;
                }
                let family = first_family(&db)?;
                Some(ResolvedFont {
                    db: Arc::new(db),
                    family,
                    origin: path.display().to_string(),
                })
            }
            FontCandidate::System => {
                let mut db = fontdb::Database::new();
                db.load_system_fonts();
                let family =
                    preferred_system_family(&db).unwrap_or_else(|| GENERIC_FAMILY.to_string());
                Some(ResolvedFont {
                    db: Arc::new(db),
                    family,
                    origin: "system".to_string(),
                })
            }
        }
    }
}

/// 解析后的字体：字体库 + 绘制时使用的 family 名称。
#[derive(Clone)]
pub struct ResolvedFont {
    db: Arc<fontdb::Database>,
    family: String,
    origin: String,
}

impl ResolvedFont {
    pub fn family(&self) -> &str {
        &self.family
    }

    /// 字体来源（文件路径或 `system`）
    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn face_count(&self) -> usize {
        self.db.len()
    }
}

/// 按顺序尝试候选字体，返回首个可用者；全部失败时退回空的系统字体库。
///
/// 该过程不会失败：最差情况下只是排版质量下降。
pub fn resolve_font(candidates: &[FontCandidate]) -> ResolvedFont {
    if let Some(font) = candidates.iter().find_map(FontCandidate::load) {
        tracing::info!(
            "字体已解析: family='{}', 来源={}, faces={}",
            font.family,
            font.origin,
            font.face_count()
        );
        return font;
    }

    tracing::warn!("未找到可用字体，使用空字体库（首字母可能无法显示）");
    ResolvedFont {
        db: Arc::new(fontdb::Database::new()),
        family: GENERIC_FAMILY.to_string(),
        origin: "none".to_string(),
    }
}

fn first_family(db: &fontdb::Database) -> Option<String> {
    db.faces()
        .find_map(|face| face.families.first().map(|(name, _)| name.clone()))
}

fn preferred_system_family(db: &fontdb::Database) -> Option<String> {
    let query = fontdb::Query {
        families: &[fontdb::Family::SansSerif],
        weight: fontdb::Weight::BOLD,
        stretch: fontdb::Stretch::Normal,
        style: fontdb::Style::Normal,
    };
    db.query(&query)
        .and_then(|id| db.face(id))
        .and_then(|face| face.families.first().map(|(name, _)| name.clone()))
        .or_else(|| first_family(db))
}

/// 基于 usvg 排版 + tiny-skia 栅格化的首字母头像渲染器。
pub struct InitialsRenderer {
    font: ResolvedFont,
    optimize_speed: bool,
}

impl InitialsRenderer {
    pub fn new(font: ResolvedFont, optimize_speed: bool) -> Self {
        Self {
            font,
            optimize_speed,
        }
    }

    /// 按候选链解析字体后构造渲染器。
    pub fn from_candidates(candidates: &[FontCandidate], optimize_speed: bool) -> Self {
        Self::new(resolve_font(candidates), optimize_speed)
    }

    pub fn font(&self) -> &ResolvedFont {
        &self.font
    }

    /// 仅包含文字的 SVG：文字放在原点附近，真实位置由测得的包围盒决定。
    fn text_svg(&self, text: &str) -> String {
        format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{size}" height="{size}" viewBox="0 0 {size} {size}"><text x="0" y="{baseline}" font-family="{font_family}" font-size="{font_size}" font-weight="bold" fill="{fill}">{text}</text></svg>"#,
            size = CANVAS_SIZE,
            baseline = FONT_SIZE,
            font_family = escape_attr(&format!(
                "{}, {GENERIC_FAMILY}",
                css_quote_family(&self.font.family)
            )),
            font_size = FONT_SIZE,
            fill = TEXT_COLOR,
            text = escape_xml(text),
        )
    }

    fn encode_png(&self, pixmap: &Pixmap) -> Result<Vec<u8>, StoreError> {
        let (w, h) = (pixmap.width(), pixmap.height());
        let mut out = Vec::with_capacity((w * h) as usize);
        let mut encoder = png::Encoder::new(&mut out, w, h);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        if self.optimize_speed {
            encoder.set_compression(png::Compression::Fast);
            encoder.set_filter(png::FilterType::NoFilter);
        } else {
            encoder.set_compression(png::Compression::Default);
            encoder.set_filter(png::FilterType::Paeth);
        }
        let mut writer = encoder
            .write_header()
            .map_err(|e| StoreError::Render(format!("PNG write_header error: {e}")))?;
        writer
            .write_image_data(pixmap.data())
            .map_err(|e| StoreError::Render(format!("PNG write_image_data error: {e}")))?;
        writer
            .finish()
            .map_err(|e| StoreError::Render(format!("PNG finish error: {e}")))?;
        Ok(out)
    }
}

impl AvatarRenderer for InitialsRenderer {
    fn render(&self, initials: &Initials, background: &str) -> Result<Vec<u8>, StoreError> {
        let (r, g, b) = parse_hex(background)
            .ok_or_else(|| StoreError::Render(format!("invalid background color '{background}'")))?;

        let mut pixmap = Pixmap::new(CANVAS_SIZE, CANVAS_SIZE)
            .ok_or_else(|| StoreError::Render("Failed to create pixmap".to_string()))?;
        pixmap.fill(Color::from_rgba8(r, g, b, 255));

        let speed = self.optimize_speed;
        let opts = UsvgOptions {
            fontdb: self.font.db.clone(),
            font_family: self.font.family.clone(),
            font_size: FONT_SIZE,
            shape_rendering: if speed {
                usvg::ShapeRendering::OptimizeSpeed
            } else {
                usvg::ShapeRendering::GeometricPrecision
            },
            text_rendering: if speed {
                usvg::TextRendering::OptimizeSpeed
            } else {
                usvg::TextRendering::OptimizeLegibility
            },
            ..Default::default()
        };

        let svg = self.text_svg(initials.as_str());
        let tree = usvg::Tree::from_data(svg.as_bytes(), &opts)
            .map_err(|e| StoreError::Render(format!("Failed to parse SVG: {e}")))?;

        // 以字形实际包围盒居中，再整体上移
        let bbox = tree.root().abs_bounding_box();
        let canvas = CANVAS_SIZE as f32;
        let transform = if bbox.width() > 0.0 && bbox.height() > 0.0 {
            let dx = (canvas - bbox.width()) / 2.0 - bbox.x();
            let dy = (canvas - bbox.height()) / 2.0 - bbox.y() - VERTICAL_BIAS;
            Transform::from_translate(dx, dy)
        } else {
            Transform::default()
        };
        resvg::render(&tree, transform, &mut pixmap.as_mut());

        self.encode_png(&pixmap)
    }
}

/// CSS 字体名加引号：优先单引号，名称本身含单引号时改用双引号
fn css_quote_family(family: &str) -> String {
    if family.contains('\'') {
        format!("\"{}\"", family.replace('"', ""))
    } else {
        format!("'{family}'")
    }
}

/// 双引号属性值转义（保留单引号，供 CSS 字符串使用）
fn escape_attr(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

    fn decode(bytes: &[u8]) -> (png::OutputInfo, Vec<u8>) {
        let decoder = png::Decoder::new(bytes);
        let mut reader = decoder.read_info().expect("png header");
        let mut buf = vec![0; reader.output_buffer_size()];
        let info = reader.next_frame(&mut buf).expect("png frame");
        buf.truncate(info.buffer_size());
        (info, buf)
    }

    #[test]
    fn candidate_chain_always_ends_with_system_fallback() {
        let chain = FontCandidate::chain_from_paths(&["/nope/a.ttf", "b.ttf"]);
        assert_eq!(chain.len(), 3);
        assert_eq!(chain.last(), Some(&FontCandidate::System));
    }

    #[test]
    fn missing_font_files_fall_through_to_next_candidate() {
        let font = resolve_font(&[
            FontCandidate::File(PathBuf::from("/definitely/not/here.ttf")),
            FontCandidate::System,
        ]);
        assert_eq!(font.origin(), "system");
        assert!(!font.family().is_empty());
    }

    #[test]
    fn render_produces_square_png_with_background_corners() {
        let renderer = InitialsRenderer::from_candidates(&[FontCandidate::System], true);
        let initials = Initials::from_names("Arjun", "Sharma").expect("initials");
        let bytes = renderer.render(&initials, "#2980B9").expect("render");
        assert!(bytes.starts_with(PNG_MAGIC));

        let (info, pixels) = decode(&bytes);
        assert_eq!((info.width, info.height), (CANVAS_SIZE, CANVAS_SIZE));
        assert_eq!(info.color_type, png::ColorType::Rgba);
        // 左上角远离文字区域，应为纯背景色
        assert_eq!(&pixels[0..4], &[0x29, 0x80, 0xB9, 0xFF]);
    }

    #[test]
    fn render_rejects_malformed_color() {
        let renderer = InitialsRenderer::new(resolve_font(&[]), true);
        let initials = Initials::from_names("a", "b").expect("initials");
        assert!(matches!(
            renderer.render(&initials, "blue"),
            Err(StoreError::Render(_))
        ));
    }

    #[test]
    fn text_markup_is_escaped() {
        let renderer = InitialsRenderer::new(resolve_font(&[]), true);
        let svg = renderer.text_svg("<&");
        assert!(svg.contains("&lt;&amp;"));
    }

    #[test]
    fn family_with_apostrophe_keeps_css_quoting() {
        let font = ResolvedFont {
            db: Arc::new(fontdb::Database::new()),
            family: "O'Neil Sans".to_string(),
            origin: "test".to_string(),
        };
        let renderer = InitialsRenderer::new(font, true);
        let svg = renderer.text_svg("ON");
        assert!(
            svg.contains(r#"font-family="&quot;O'Neil Sans&quot;, sans-serif""#),
            "{svg}"
        );
        assert!(!svg.contains("&apos;"));

        let plain = InitialsRenderer::new(resolve_font(&[]), true);
        assert!(plain.text_svg("AB").contains(r#"font-family="'sans-serif', sans-serif""#));

        let tree = usvg::Tree::from_data(svg.as_bytes(), &UsvgOptions::default());
        assert!(tree.is_ok());
    }
}
