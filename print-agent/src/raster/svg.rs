//! SVG drawing of a typeset page

use std::fmt::Write;

use super::layout::{BarSpan, Block, CHAR_WIDTH, Glyph, LINE_HEIGHT, Line, Page};

const FONT_SIZE: u32 = 22;
/// Distance from the baseline to the bottom of a line
const DESCENT: u32 = 7;
const STROKE: u32 = 2;

/// Draw a page as a standalone SVG document
pub fn to_svg(page: &Page) -> String {
    let width = page.width_dots();
    let height = page.height_dots();

    let mut body = String::new();
    let mut y = 0;
    for block in &page.blocks {
        match block {
            Block::Text(line) => {
                draw_line(&mut body, line, y);
                y += line.height * LINE_HEIGHT;
            }
            Block::Image(picture) => {
                let _ = write!(
                    body,
                    r#"<image x="{}" y="{}" width="{}" height="{}" xlink:href="data:image/png;base64,{}"/>"#,
                    picture.x, y, picture.width, picture.height, picture.base64
                );
                y += picture.height;
            }
        }
    }

    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{w}" height="{h}" viewBox="0 0 {w} {h}"><rect width="{w}" height="{h}" fill="#fff"/><g font-family="monospace" font-size="{size}" fill="#000">{body}</g></svg>"##,
        w = width,
        h = height,
        size = FONT_SIZE,
        body = body,
    )
}

fn draw_line(out: &mut String, line: &Line, top: u32) {
    let height = line.height * LINE_HEIGHT;
    let middle = top + height / 2;

    for rule in &line.rules {
        let _ = write!(
            out,
            r##"<path d="M{} {}H{}" stroke="#000" stroke-width="{}"/>"##,
            rule.from * CHAR_WIDTH as f32,
            middle,
            rule.to * CHAR_WIDTH as f32,
            STROKE
        );
    }

    for bar in &line.bars {
        let (y0, y1) = match bar.span {
            BarSpan::Full => (top, top + height),
            BarSpan::Upper => (top, middle),
            BarSpan::Lower => (middle, top + height),
        };
        let x = bar.column as u32 * CHAR_WIDTH + CHAR_WIDTH / 2;
        let _ = write!(
            out,
            r##"<path d="M{} {}V{}" stroke="#000" stroke-width="{}"/>"##,
            x, y0, y1, STROKE
        );
    }

    for glyph in &line.glyphs {
        draw_glyph(out, glyph, top, height);
    }
}

fn draw_glyph(out: &mut String, glyph: &Glyph, top: u32, height: u32) {
    let left = glyph.column as u32 * CHAR_WIDTH;
    let width = glyph.cells as u32 * CHAR_WIDTH;
    let style = glyph.style;

    if style.invert {
        let _ = write!(
            out,
            r##"<rect x="{}" y="{}" width="{}" height="{}" fill="#000"/>"##,
            left, top, width, height
        );
    }
    if style.underline {
        let _ = write!(
            out,
            r##"<path d="M{} {}h{}" stroke="#000" stroke-width="{}"/>"##,
            left,
            top + height - STROKE,
            width,
            STROKE
        );
    }
    if glyph.is_blank() {
        return;
    }

    let center = left + width / 2;
    let baseline = top + height - DESCENT;
    let mut attrs = String::from(r#" text-anchor="middle""#);
    if style.bold {
        attrs.push_str(r#" font-weight="bold""#);
    }
    if style.invert {
        attrs.push_str(r##" fill="#fff""##);
    }

    if style.wide || style.tall {
        let _ = write!(
            out,
            r#"<text x="0" y="0" transform="translate({} {}) scale({} {})"{}>{}</text>"#,
            center,
            baseline,
            if style.wide { 2 } else { 1 },
            if style.tall { 2 } else { 1 },
            attrs,
            escape_xml(&glyph.text)
        );
    } else {
        let _ = write!(
            out,
            r#"<text x="{}" y="{}"{}>{}</text>"#,
            center,
            baseline,
            attrs,
            escape_xml(&glyph.text)
        );
    }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::layout::typeset;

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("<a & 'b'>"), "&lt;a &amp; &apos;b&apos;&gt;");
    }

    #[test]
    fn test_canvas_size() {
        let page = typeset("|a|\n-\n", 32).unwrap();
        let svg = to_svg(&page);
        assert!(svg.starts_with("<svg "));
        assert!(svg.contains(r#"width="384" height="60""#));
        assert!(svg.contains(r##"<rect width="384" height="60" fill="#fff"/>"##));
    }

    #[test]
    fn test_glyph_placement() {
        let page = typeset("{width:4; border:none}\n|\"<b |", 4).unwrap();
        let svg = to_svg(&page);
        assert!(svg.contains(r#"<text x="6" y="23" text-anchor="middle" font-weight="bold">&lt;</text>"#));
        assert!(svg.contains(r#"<text x="18" y="23" text-anchor="middle" font-weight="bold">b</text>"#));
    }

    #[test]
    fn test_scaled_glyph_uses_transform() {
        let page = typeset("|^^^X|", 4).unwrap();
        let svg = to_svg(&page);
        assert!(svg.contains(r#"transform="translate(24 53) scale(2 2)""#));
    }

    #[test]
    fn test_rule_spans_canvas() {
        let page = typeset("-", 32).unwrap();
        assert!(to_svg(&page).contains(r#"d="M0 15H384""#));
    }
}
