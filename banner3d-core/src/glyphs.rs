//! Glyph table marking which grid cells spell the banner text
//!
//! Glyphs are small hand-drawn bitmaps in a plain text format:
//!
//! ```text
//! // comment
//! glyph 'C'
//! ..##
//! .#..
//! end
//! ```
//!
//! `#` lights a cell and `.` leaves it dark. The first row is the lowest Z.
use std::collections::BTreeMap;
use std::path::Path;

use nom::{
    branch::alt,
    bytes::complete::{is_a, tag},
    character::complete::{anychar, char, line_ending, multispace1, not_line_ending, space0, space1},
    combinator::{eof, value},
    multi::{many0, many0_count, many1},
    sequence::{delimited, pair, preceded},
    IResult,
};

use crate::error::{BannerError, Result};

const BUILTIN_GLYPHS: &str = include_str!("../fonts/banner.glyphs");

/// Text spelled by the default banner
pub const DEFAULT_TEXT: &str = "C K B";
/// Grid cell `(x, z)` of the first glyph's top-left corner
pub const DEFAULT_ORIGIN: (u32, u32) = (15, 19);

/// One character's lit cells, relative to its top-left corner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Glyph {
    pub ch: char,
    pub width: u32,
    pub height: u32,
    /// `(dx, dz)` pairs ordered by column, then row
    pub cells: Vec<(u32, u32)>,
}

impl Glyph {
    fn from_rows(ch: char, rows: &[&str]) -> Result<Self> {
        let width = rows.first().map_or(0, |row| row.len());
        if let Some(row) = rows.iter().find(|row| row.len() != width) {
            return Err(BannerError::InvalidFont {
                glyph: ch,
                message: format!("row {row:?} is not {width} cells wide"),
            });
        }

        let mut cells = Vec::new();
        for dx in 0..width {
            for (dz, row) in rows.iter().enumerate() {
                if row.as_bytes()[dx] == b'#' {
                    cells.push((dx as u32, dz as u32));
                }
            }
        }

        Ok(Self {
            ch,
            width: width as u32,
            height: rows.len() as u32,
            cells,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Font {
    glyphs: BTreeMap<char, Glyph>,
}

impl Font {
    /// The embedded table: `C`, `K`, `B` and space.
    pub fn builtin() -> Result<Self> {
        Self::parse(BUILTIN_GLYPHS)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::parse(&source)
    }

    pub fn parse(source: &str) -> Result<Self> {
        let raw = match glyph_file(source) {
            Ok((_, raw)) => raw,
            Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
                let offset = source.len() - e.input.len();
                return Err(BannerError::FontParse {
                    line: source[..offset].matches('\n').count() + 1,
                    message: format!("expected a glyph definition, found {:?}", first_line(e.input)),
                });
            }
            Err(nom::Err::Incomplete(_)) => {
                return Err(BannerError::FontParse {
                    line: source.lines().count(),
                    message: "unexpected end of input".to_string(),
                });
            }
        };

        let mut glyphs = BTreeMap::new();
        for RawGlyph { ch, rows } in raw {
            let glyph = Glyph::from_rows(ch, &rows)?;
            if glyphs.insert(ch, glyph).is_some() {
                return Err(BannerError::InvalidFont {
                    glyph: ch,
                    message: "defined more than once".to_string(),
                });
            }
        }

        log::debug!("parsed glyph table with {} glyphs", glyphs.len());
        Ok(Self { glyphs })
    }

    pub fn glyph(&self, ch: char) -> Option<&Glyph> {
        self.glyphs.get(&ch)
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Place `text` left to right starting at `origin`, returning `(x, z)` cells.
    pub fn layout(&self, text: &str, origin: (u32, u32), letter_spacing: u32) -> Result<Vec<(u32, u32)>> {
        let mut cells = Vec::new();
        let mut cursor = origin.0;
        for (i, ch) in text.chars().enumerate() {
            let glyph = self.glyph(ch).ok_or(BannerError::UnknownGlyph(ch))?;
            if i > 0 {
                cursor = cursor.saturating_add(letter_spacing);
            }
            cells.extend(
                glyph
                    .cells
                    .iter()
                    .map(|&(dx, dz)| (cursor.saturating_add(dx), origin.1.saturating_add(dz))),
            );
            cursor = cursor.saturating_add(glyph.width);
        }
        Ok(cells)
    }
}

/// Grid indexes (`z * columns + x`) of every lit cell spelling `text`.
///
/// A cell outside the `columns` x `rows` grid is an error.
pub fn text_cell_indexes(
    rows: u32,
    columns: u32,
    text: &str,
    font: &Font,
    origin: (u32, u32),
    letter_spacing: u32,
) -> Result<Vec<usize>> {
    font.layout(text, origin, letter_spacing)?
        .into_iter()
        .map(|(x, z)| {
            if x >= columns || z >= rows {
                return Err(BannerError::GlyphOutOfBounds {
                    x,
                    z,
                    rows,
                    columns,
                });
            }
            Ok(z as usize * columns as usize + x as usize)
        })
        .collect()
}

struct RawGlyph<'a> {
    ch: char,
    rows: Vec<&'a str>,
}

fn first_line(input: &str) -> &str {
    input.lines().next().unwrap_or("")
}

fn comment(input: &str) -> IResult<&str, ()> {
    value((), pair(tag("//"), not_line_ending))(input)
}

fn blank(input: &str) -> IResult<&str, ()> {
    value((), many0_count(alt((value((), multispace1), comment))))(input)
}

fn line_end(input: &str) -> IResult<&str, ()> {
    value((), pair(space0, alt((line_ending, eof))))(input)
}

fn header(input: &str) -> IResult<&str, char> {
    delimited(
        pair(tag("glyph"), space1),
        delimited(char('\''), anychar, char('\'')),
        line_end,
    )(input)
}

fn row(input: &str) -> IResult<&str, &str> {
    delimited(space0, is_a("#."), line_end)(input)
}

fn glyph(input: &str) -> IResult<&str, RawGlyph<'_>> {
    let (input, ch) = header(input)?;
    let (input, rows) = many1(row)(input)?;
    let (input, _) = preceded(space0, tag("end"))(input)?;
    let (input, _) = line_end(input)?;
    Ok((input, RawGlyph { ch, rows }))
}

fn glyph_file(input: &str) -> IResult<&str, Vec<RawGlyph<'_>>> {
    let (input, glyphs) = many0(preceded(blank, glyph))(input)?;
    let (input, _) = preceded(blank, eof)(input)?;
    Ok((input, glyphs))
}
