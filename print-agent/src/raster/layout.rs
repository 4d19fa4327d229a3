//! Markup typesetting
//!
//! Lays receipt markup out on a grid of `cpl` character cells. The result is a
//! list of [`Block`]s, top to bottom, that [`super::svg`] draws.

use std::io::Cursor;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::ImageReader;
use tracing::debug;
use unicode_width::UnicodeWidthChar;

use crate::core::{RenderError, RenderResult};

/// Width of one character cell in dots
pub const CHAR_WIDTH: u32 = 12;
/// Height of one text line in dots
pub const LINE_HEIGHT: u32 = 30;

const HARD_SPACE: char = '\u{a0}';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Center,
    Right,
}

impl Align {
    fn offset(self, free: usize) -> usize {
        match self {
            Align::Left => 0,
            Align::Center => free / 2,
            Align::Right => free,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Border {
    None,
    Space(usize),
    Line,
}

impl Border {
    /// Cells between two columns
    fn gap(self) -> usize {
        match self {
            Border::None => 0,
            Border::Space(n) => n,
            Border::Line => 1,
        }
    }

    /// Cells on each outer edge
    fn edge(self) -> usize {
        match self {
            Border::Line => 1,
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnWidth {
    Auto,
    Fixed(usize),
}

/// Properties in effect for the following rows
#[derive(Debug, Clone)]
struct State {
    widths: Vec<ColumnWidth>,
    border: Border,
    align: Align,
    wrap: bool,
}

impl Default for State {
    fn default() -> Self {
        Self {
            widths: Vec::new(),
            border: Border::Space(1),
            align: Align::Center,
            wrap: true,
        }
    }
}

/// Character decoration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Style {
    pub bold: bool,
    pub underline: bool,
    pub invert: bool,
    pub wide: bool,
    pub tall: bool,
}

/// One character (with any combining marks) placed on the grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Glyph {
    /// First cell, counted from the left edge
    pub column: usize,
    /// Number of cells covered
    pub cells: usize,
    pub text: String,
    pub style: Style,
}

impl Glyph {
    pub fn is_blank(&self) -> bool {
        self.text.chars().all(|c| c == ' ' || c == HARD_SPACE)
    }
}

/// Horizontal line through the middle of a text line, in cell units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rule {
    pub from: f32,
    pub to: f32,
}

/// Part of a text line a vertical bar covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarSpan {
    Full,
    Upper,
    Lower,
}

/// Vertical line through the center of a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bar {
    pub column: usize,
    pub span: BarSpan,
}

/// One text line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Line {
    /// 1 or 2 (double-height characters)
    pub height: u32,
    pub glyphs: Vec<Glyph>,
    pub rules: Vec<Rule>,
    pub bars: Vec<Bar>,
}

impl Line {
    fn blank() -> Self {
        Self {
            height: 1,
            ..Default::default()
        }
    }
}

/// Embedded PNG image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Picture {
    pub base64: String,
    pub x: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Text(Line),
    Image(Picture),
}

/// Typeset receipt
#[derive(Debug, Clone)]
pub struct Page {
    pub cpl: usize,
    pub blocks: Vec<Block>,
}

impl Page {
    pub fn width_dots(&self) -> u32 {
        self.cpl as u32 * CHAR_WIDTH
    }

    pub fn height_dots(&self) -> u32 {
        self.blocks
            .iter()
            .map(|block| match block {
                Block::Text(line) => line.height * LINE_HEIGHT,
                Block::Image(picture) => picture.height,
            })
            .sum()
    }
}

/// Typeset markup for a line of `cpl` characters
pub fn typeset(markup: &str, cpl: usize) -> RenderResult<Page> {
    if cpl == 0 {
        return Err(RenderError::Markup("line width must be positive".into()));
    }

    let mut setter = Typesetter::new(cpl);
    for raw in markup.lines() {
        let line = raw.trim();
        if line == "=" {
            break;
        }
        setter.feed(line)?;
    }
    setter.close_box();

    Ok(Page {
        cpl,
        blocks: setter.blocks,
    })
}

struct Typesetter {
    cpl: usize,
    state: State,
    /// Bar columns of the line-bordered table currently drawn
    open_box: Option<Vec<usize>>,
    blocks: Vec<Block>,
}

impl Typesetter {
    fn new(cpl: usize) -> Self {
        Self {
            cpl,
            state: State::default(),
            open_box: None,
            blocks: Vec::new(),
        }
    }

    fn feed(&mut self, line: &str) -> RenderResult<()> {
        if line.is_empty() {
            self.close_box();
            self.blocks.push(Block::Text(Line::blank()));
        } else if line == "-" {
            self.close_box();
            self.blocks.push(Block::Text(Line {
                height: 1,
                rules: vec![Rule {
                    from: 0.0,
                    to: self.cpl as f32,
                }],
                ..Default::default()
            }));
        } else if line.starts_with('{') && line.ends_with('}') {
            self.close_box();
            self.apply_properties(&line[1..line.len() - 1])?;
        } else {
            self.row(line);
        }
        Ok(())
    }

    fn apply_properties(&mut self, body: &str) -> RenderResult<()> {
        for declaration in body.split(';') {
            let Some((key, value)) = declaration.split_once(':') else {
                continue;
            };
            let value = value.trim();
            match key.trim() {
                "width" | "w" => self.state.widths = parse_widths(value)?,
                "border" | "b" => self.state.border = parse_border(value)?,
                "align" | "a" => self.state.align = parse_align(value)?,
                "text" | "t" => self.state.wrap = value != "nowrap",
                "image" | "i" => {
                    let picture = self.picture(value)?;
                    self.blocks.push(Block::Image(picture));
                }
                other => debug!(key = other, "Ignoring unknown markup property"),
            }
        }
        Ok(())
    }

    fn picture(&self, encoded: &str) -> RenderResult<Picture> {
        let encoded: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = STANDARD
            .decode(&encoded)
            .map_err(|e| RenderError::Markup(format!("invalid image data: {}", e)))?;
        let (width, height) = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| RenderError::Markup(format!("unreadable image: {}", e)))?
            .into_dimensions()
            .map_err(|e| RenderError::Markup(format!("unreadable image: {}", e)))?;

        let canvas = self.cpl as u32 * CHAR_WIDTH;
        let (width, height) = if width > canvas {
            (canvas, (height as u64 * canvas as u64 / width as u64).max(1) as u32)
        } else {
            (width, height)
        };
        let x = self.state.align.offset((canvas - width) as usize) as u32;

        Ok(Picture {
            base64: encoded,
            x,
            width,
            height,
        })
    }

    fn row(&mut self, line: &str) {
        let columns = split_columns(line);
        if columns.is_empty() {
            self.close_box();
            self.blocks.push(Block::Text(Line::blank()));
            return;
        }

        let count = if self.state.widths.is_empty() {
            columns.len()
        } else {
            self.state.widths.len()
        };
        let widths = self.resolve_widths(count);
        let border = self.state.border;

        let table = widths.iter().sum::<usize>()
            + border.gap() * (count - 1)
            + border.edge() * 2;
        let offset = self.state.align.offset(self.cpl.saturating_sub(table));

        let mut starts = Vec::with_capacity(count);
        let mut x = offset + border.edge();
        for width in &widths {
            starts.push(x);
            x += width + border.gap();
        }

        let bars: Vec<usize> = if border == Border::Line {
            std::iter::once(offset)
                .chain(starts.iter().zip(&widths).map(|(start, width)| start + width))
                .collect()
        } else {
            Vec::new()
        };

        let cells: Vec<Vec<Vec<Glyph>>> = (0..count)
            .map(|i| {
                let cell = columns.get(i).map(|raw| parse_cell(raw)).unwrap_or_default();
                layout_cell(&cell, widths[i], starts[i], self.state.wrap)
            })
            .collect();
        let line_count = cells.iter().map(Vec::len).max().unwrap_or(0).max(1);

        if border == Border::Line {
            self.open_box(&bars);
        } else {
            self.close_box();
        }

        for k in 0..line_count {
            let glyphs: Vec<Glyph> = cells
                .iter()
                .filter_map(|lines| lines.get(k))
                .flatten()
                .cloned()
                .collect();
            let height = if glyphs.iter().any(|g| g.style.tall) { 2 } else { 1 };
            self.blocks.push(Block::Text(Line {
                height,
                glyphs,
                rules: Vec::new(),
                bars: bars
                    .iter()
                    .map(|&column| Bar {
                        column,
                        span: BarSpan::Full,
                    })
                    .collect(),
            }));
        }
    }

    /// Column widths for a row, shrinking from the last column on overflow
    fn resolve_widths(&self, count: usize) -> Vec<usize> {
        let border = self.state.border;
        let available = self
            .cpl
            .saturating_sub(border.gap() * (count - 1) + border.edge() * 2);

        let declared: Vec<ColumnWidth> = if self.state.widths.is_empty() {
            vec![ColumnWidth::Auto; count]
        } else {
            self.state.widths.clone()
        };

        let fixed: usize = declared
            .iter()
            .map(|width| match width {
                ColumnWidth::Fixed(n) => *n,
                ColumnWidth::Auto => 0,
            })
            .sum();
        let autos = declared.iter().filter(|s| **s == ColumnWidth::Auto).count();
        let rest = available.saturating_sub(fixed);
        let mut extra = if autos > 0 { rest % autos } else { 0 };

        let mut widths: Vec<usize> = declared
            .iter()
            .map(|width| match width {
                ColumnWidth::Fixed(n) => *n,
                ColumnWidth::Auto => {
                    let bonus = if extra > 0 {
                        extra -= 1;
                        1
                    } else {
                        0
                    };
                    rest / autos + bonus
                }
            })
            .collect();

        let mut overflow = widths.iter().sum::<usize>().saturating_sub(available);
        for width in widths.iter_mut().rev() {
            if overflow == 0 {
                break;
            }
            let cut = overflow.min(width.saturating_sub(1));
            *width -= cut;
            overflow -= cut;
        }
        widths
    }

    fn open_box(&mut self, bars: &[usize]) {
        if self.open_box.as_deref() == Some(bars) {
            return;
        }
        self.close_box();
        self.blocks.push(Block::Text(box_edge(bars, BarSpan::Lower)));
        self.open_box = Some(bars.to_vec());
    }

    fn close_box(&mut self) {
        if let Some(bars) = self.open_box.take() {
            self.blocks.push(Block::Text(box_edge(&bars, BarSpan::Upper)));
        }
    }
}

/// Top (`Lower` bars) or bottom (`Upper` bars) edge of a bordered table
fn box_edge(bars: &[usize], span: BarSpan) -> Line {
    let first = bars.first().copied().unwrap_or(0) as f32;
    let last = bars.last().copied().unwrap_or(0) as f32;
    Line {
        height: 1,
        glyphs: Vec::new(),
        rules: vec![Rule {
            from: first + 0.5,
            to: last + 0.5,
        }],
        bars: bars.iter().map(|&column| Bar { column, span }).collect(),
    }
}

fn parse_widths(value: &str) -> RenderResult<Vec<ColumnWidth>> {
    if value.is_empty() || value == "auto" || value == "*" {
        return Ok(Vec::new());
    }
    value
        .split(',')
        .map(|part| match part.trim() {
            "auto" | "*" => Ok(ColumnWidth::Auto),
            n => n
                .parse()
                .map(ColumnWidth::Fixed)
                .map_err(|_| RenderError::Markup(format!("invalid column width: {}", n))),
        })
        .collect()
}

fn parse_border(value: &str) -> RenderResult<Border> {
    match value {
        "space" => Ok(Border::Space(1)),
        "line" => Ok(Border::Line),
        "none" | "0" => Ok(Border::None),
        n => n
            .parse()
            .map(Border::Space)
            .map_err(|_| RenderError::Markup(format!("invalid border: {}", n))),
    }
}

fn parse_align(value: &str) -> RenderResult<Align> {
    match value {
        "left" => Ok(Align::Left),
        "center" => Ok(Align::Center),
        "right" => Ok(Align::Right),
        other => Err(RenderError::Markup(format!("invalid align: {}", other))),
    }
}

/// Split a row on unescaped `|`, dropping the optional outer separators
fn split_columns(line: &str) -> Vec<String> {
    let mut columns = vec![String::new()];
    let mut ends_with_separator = false;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        ends_with_separator = c == '|';
        if c == '|' {
            columns.push(String::new());
            continue;
        }
        if let Some(current) = columns.last_mut() {
            current.push(c);
            if c == '\\'
                && let Some(escaped) = chars.next()
            {
                current.push(escaped);
            }
        }
    }

    if line.starts_with('|') {
        columns.remove(0);
    }
    if ends_with_separator {
        columns.pop();
    }
    columns
}

/// A column's content before layout
#[derive(Debug, Default)]
struct Cell {
    align: Option<Align>,
    chars: Vec<StyledChar>,
}

#[derive(Debug, Clone)]
struct StyledChar {
    text: String,
    width: usize,
    style: Style,
}

impl StyledChar {
    fn cells(&self) -> usize {
        if self.style.wide {
            self.width * 2
        } else {
            self.width
        }
    }

    fn is_break(&self) -> bool {
        self.text == " "
    }
}

/// Whether the text ends in a space that is not escaped by a backslash
fn ends_with_open_space(text: &str) -> bool {
    let Some(body) = text.strip_suffix(' ') else {
        return false;
    };
    body.chars().rev().take_while(|&c| c == '\\').count() % 2 == 0
}

fn parse_cell(raw: &str) -> Cell {
    let leading = raw.starts_with(' ');
    let trailing = ends_with_open_space(raw);
    let align = match (leading, trailing) {
        (false, true) => Align::Left,
        (true, false) => Align::Right,
        _ => Align::Center,
    };

    let mut style = Style::default();
    let mut out: Vec<StyledChar> = Vec::new();
    let mut body = raw.trim_start_matches(' ');
    while ends_with_open_space(body) {
        body = &body[..body.len() - 1];
    }
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    push_char(&mut out, escaped, style);
                }
            }
            '"' => style.bold = !style.bold,
            '_' => style.underline = !style.underline,
            '`' => style.invert = !style.invert,
            '^' => {
                let mut level = 1;
                while chars.next_if_eq(&'^').is_some() {
                    level += 1;
                }
                let (wide, tall) = match level {
                    1 => (true, false),
                    2 => (false, true),
                    _ => (true, true),
                };
                if style.wide == wide && style.tall == tall {
                    style.wide = false;
                    style.tall = false;
                } else {
                    style.wide = wide;
                    style.tall = tall;
                }
            }
            '~' => push_char(&mut out, HARD_SPACE, style),
            c => push_char(&mut out, c, style),
        }
    }

    Cell {
        align: Some(align),
        chars: out,
    }
}

fn push_char(out: &mut Vec<StyledChar>, c: char, style: Style) {
    if c.is_control() {
        return;
    }
    let width = if c == HARD_SPACE {
        1
    } else {
        c.width().unwrap_or(0)
    };
    if width == 0 {
        // combining mark joins the previous character
        if let Some(prev) = out.last_mut() {
            prev.text.push(c);
        }
        return;
    }
    out.push(StyledChar {
        text: c.to_string(),
        width,
        style,
    });
}

/// Break a cell into lines no wider than `width` and place them on the grid
fn layout_cell(cell: &Cell, width: usize, start: usize, wrap: bool) -> Vec<Vec<Glyph>> {
    if width == 0 {
        return Vec::new();
    }

    let mut lines: Vec<Vec<StyledChar>> = Vec::new();
    let mut current: Vec<StyledChar> = Vec::new();
    let mut used = 0;

    for sc in &cell.chars {
        let cells = sc.cells();
        if cells > width {
            continue;
        }
        if used + cells > width {
            if !wrap {
                break;
            }
            if sc.is_break() {
                lines.push(trim_end(std::mem::take(&mut current)));
                used = 0;
                continue;
            }
            let carry = match current.iter().rposition(StyledChar::is_break) {
                Some(i) if current[..i].iter().any(|c| !c.is_break()) => current.split_off(i + 1),
                _ => Vec::new(),
            };
            lines.push(trim_end(std::mem::replace(&mut current, carry)));
            used = current.iter().map(StyledChar::cells).sum();
        }
        current.push(sc.clone());
        used += cells;
    }
    lines.push(trim_end(current));

    let align = cell.align.unwrap_or(Align::Left);
    lines
        .into_iter()
        .map(|line| {
            let used: usize = line.iter().map(StyledChar::cells).sum();
            let mut column = start + align.offset(width - used);
            line.into_iter()
                .map(|sc| {
                    let glyph = Glyph {
                        column,
                        cells: sc.cells(),
                        text: sc.text,
                        style: sc.style,
                    };
                    column += glyph.cells;
                    glyph
                })
                .collect()
        })
        .collect()
}

fn trim_end(mut line: Vec<StyledChar>) -> Vec<StyledChar> {
    while line.last().is_some_and(StyledChar::is_break) {
        line.pop();
    }
    line
}
