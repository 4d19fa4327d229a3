//! Receipt markup builder
//!
//! Writes the line-oriented receipt markup consumed by [`crate::raster`]:
//!
//! ```text
//! {border:space; width:18,2,12; text:wrap}   property line
//! |"Món |"SL| "Thành tiền|                   row: left | center | right
//! -                                          horizontal rule
//! =                                          cut
//! ```
//!
//! Inside a column, a trailing space aligns left, a leading space aligns right,
//! and no space centers. `"` starts bold, `^` enlarges, `~` is a hard space,
//! `\` escapes the next character.

/// Characters with a meaning inside a column
const SPECIAL_CHARS: [char; 9] = ['\\', '|', '{', '}', '~', '_', '"', '^', '`'];

/// Column text alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

/// Character size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextSize {
    #[default]
    Normal,
    /// Double width and double height
    Double,
}

impl TextSize {
    fn marker(self) -> &'static str {
        match self {
            TextSize::Normal => "",
            TextSize::Double => "^^^",
        }
    }
}

/// One column of a row
#[derive(Debug, Clone, Default)]
pub struct Cell {
    text: String,
    align: Align,
    bold: bool,
    size: TextSize,
    indent: usize,
}

impl Cell {
    pub fn left(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            align: Align::Left,
            ..Default::default()
        }
    }

    pub fn center(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            align: Align::Center,
            ..Default::default()
        }
    }

    pub fn right(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            align: Align::Right,
            ..Default::default()
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn size(mut self, size: TextSize) -> Self {
        self.size = size;
        self
    }

    /// Prefix the text with hard spaces
    pub fn indent(mut self, spaces: usize) -> Self {
        self.indent = spaces;
        self
    }

    fn write(&self, out: &mut String) {
        if self.align == Align::Right {
            out.push(' ');
        }
        out.push_str(&"~".repeat(self.indent));
        if self.bold {
            out.push('"');
        }
        out.push_str(self.size.marker());
        out.push_str(&escape(self.text.trim()));
        if self.align == Align::Left {
            out.push(' ');
        }
    }
}

/// Escape user text so it prints literally
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\r' | '\n' | '\t' => out.push(' '),
            c if SPECIAL_CHARS.contains(&c) => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out
}

/// Markup document builder
#[derive(Debug, Default)]
pub struct MarkupBuilder {
    buf: String,
}

impl MarkupBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single full-width column, wrapped
    pub fn full_width(&mut self) -> &mut Self {
        self.buf.push_str("{width:auto; text:wrap}\n");
        self
    }

    /// Fixed column widths, space border, wrapped
    pub fn columns(&mut self, widths: &[usize]) -> &mut Self {
        let widths: Vec<String> = widths.iter().map(|w| w.to_string()).collect();
        self.buf.push_str(&format!(
            "{{border:space; width:{}; text:wrap}}\n",
            widths.join(",")
        ));
        self
    }

    /// Full-width block framed by a line border, with the given alignment
    pub fn boxed(&mut self, align: Align) -> &mut Self {
        let align = match align {
            Align::Left => "left",
            Align::Center => "center",
            Align::Right => "right",
        };
        self.buf.push_str(&format!(
            "{{width:auto; border:line; align:{}}}\n",
            align
        ));
        self
    }

    /// A row of columns
    pub fn row(&mut self, cells: &[Cell]) -> &mut Self {
        self.buf.push('|');
        for cell in cells {
            cell.write(&mut self.buf);
            self.buf.push('|');
        }
        self.buf.push('\n');
        self
    }

    /// Horizontal rule
    pub fn rule(&mut self) -> &mut Self {
        self.buf.push_str("-\n");
        self
    }

    /// Empty line
    pub fn blank(&mut self) -> &mut Self {
        self.buf.push('\n');
        self
    }

    /// Embedded base64 PNG
    pub fn image(&mut self, base64_png: &str) -> &mut Self {
        self.buf.push_str(&format!("{{image:{}}}\n", base64_png));
        self
    }

    /// Paper cut (end of receipt)
    pub fn cut(&mut self) -> &mut Self {
        self.buf.push_str("=\n");
        self
    }

    pub fn finalize(self) -> String {
        self.buf
    }
}
