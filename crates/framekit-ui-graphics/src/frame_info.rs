//! Decoder for the packed frame geometry encoding.
//!
//! Style sheets targeting hosts without native rounded corners publish the
//! frame geometry of every `base-ui` style as a single string, for example
//! `dh-2-2-2-2-1-1-1-1-3-3-3-3`:
//!
//! * first character: `d` (div based) or `t` (table based) frame markup,
//! * second character: `h` (horizontal) or `v` (vertical) orientation,
//! * four corner radii, clockwise from the top-left corner,
//! * four border widths, top/right/bottom/left,
//! * four paddings, top/right/bottom/left.

use std::fmt;
use std::str::FromStr;

use crate::geometry::{CornerRadii, Sides};

const FIELD_COUNT: usize = 13;

/// Markup used to draw the frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FrameShape {
    Div,
    Table,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FrameOrientation {
    Horizontal,
    Vertical,
}

/// Decoded frame geometry shared by every node using the same style.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameInfo {
    pub shape: FrameShape,
    pub orientation: FrameOrientation,
    pub radius: CornerRadii,
    pub border: Sides,
    pub padding: Sides,
    /// Space taken by the frame on each side: `max(border, adjoining radii)`.
    pub extent: Sides,
}

impl FrameInfo {
    pub fn new(
        shape: FrameShape,
        orientation: FrameOrientation,
        radius: CornerRadii,
        border: Sides,
        padding: Sides,
    ) -> Self {
        let corners = radius.adjoining();
        let extent = Sides::new(
            border.top.max(corners.top),
            border.right.max(corners.right),
            border.bottom.max(corners.bottom),
            border.left.max(corners.left),
        );
        Self {
            shape,
            orientation,
            radius,
            border,
            padding,
            extent,
        }
    }

    /// Parses an encoded frame string. Surrounding quotes, as returned by
    /// computed `font-family` values, are ignored.
    pub fn decode(encoded: &str) -> Result<Self, FrameInfoParseError> {
        let trimmed = encoded.trim().trim_matches(|c| c == '"' || c == '\'');
        if trimmed.is_empty() {
            return Err(FrameInfoParseError::Empty);
        }
        let fields: Vec<&str> = trimmed.split('-').collect();
        if fields.len() != FIELD_COUNT {
            return Err(FrameInfoParseError::FieldCount {
                found: fields.len(),
            });
        }

        let mut prefix = fields[0].chars();
        let shape = match prefix.next() {
            Some('d') => FrameShape::Div,
            Some('t') => FrameShape::Table,
            other => return Err(FrameInfoParseError::Shape(other)),
        };
        let orientation = match prefix.next() {
            Some('h') => FrameOrientation::Horizontal,
            Some('v') => FrameOrientation::Vertical,
            other => return Err(FrameInfoParseError::Orientation(other)),
        };

        let mut values = [0u32; FIELD_COUNT - 1];
        for (index, field) in fields[1..].iter().enumerate() {
            values[index] = field
                .parse::<u32>()
                .map_err(|_| FrameInfoParseError::Number {
                    index: index + 1,
                    value: (*field).to_string(),
                })?;
        }

        Ok(Self::new(
            shape,
            orientation,
            CornerRadii::new(values[0], values[1], values[2], values[3]),
            Sides::new(values[4], values[5], values[6], values[7]),
            Sides::new(values[8], values[9], values[10], values[11]),
        ))
    }

    pub fn is_table(&self) -> bool {
        self.shape == FrameShape::Table
    }

    pub fn is_vertical(&self) -> bool {
        self.orientation == FrameOrientation::Vertical
    }

    /// Total horizontal frame extent.
    pub fn width(&self) -> u32 {
        self.extent.width()
    }

    /// Total vertical frame extent.
    pub fn height(&self) -> u32 {
        self.extent.height()
    }

    pub fn max_width(&self) -> u32 {
        self.extent.max()
    }

    /// Frame regions that need markup. A side without extent is skipped.
    pub fn has_top(&self) -> bool {
        self.extent.top > 0
    }

    pub fn has_right(&self) -> bool {
        self.extent.right > 0
    }

    pub fn has_bottom(&self) -> bool {
        self.extent.bottom > 0
    }

    pub fn has_left(&self) -> bool {
        self.extent.left > 0
    }

    /// Re-encodes the geometry in the packed form accepted by [`FrameInfo::decode`].
    pub fn encode(&self) -> String {
        let shape = match self.shape {
            FrameShape::Div => 'd',
            FrameShape::Table => 't',
        };
        let orientation = match self.orientation {
            FrameOrientation::Horizontal => 'h',
            FrameOrientation::Vertical => 'v',
        };
        let mut out = format!("{shape}{orientation}");
        for value in self
            .radius
            .to_array()
            .iter()
            .chain(self.border.to_array().iter())
            .chain(self.padding.to_array().iter())
        {
            out.push('-');
            out.push_str(&value.to_string());
        }
        out
    }
}

impl FromStr for FrameInfo {
    type Err = FrameInfoParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FrameInfoParseError {
    Empty,
    FieldCount { found: usize },
    Shape(Option<char>),
    Orientation(Option<char>),
    Number { index: usize, value: String },
}

impl fmt::Display for FrameInfoParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameInfoParseError::Empty => write!(f, "frame encoding is empty"),
            FrameInfoParseError::FieldCount { found } => {
                write!(f, "frame encoding has {found} fields; expected {FIELD_COUNT}")
            }
            FrameInfoParseError::Shape(found) => {
                write!(f, "unknown frame shape {found:?}; expected 'd' or 't'")
            }
            FrameInfoParseError::Orientation(found) => {
                write!(f, "unknown frame orientation {found:?}; expected 'h' or 'v'")
            }
            FrameInfoParseError::Number { index, value } => {
                write!(f, "frame field {index} is not a non-negative integer: {value:?}")
            }
        }
    }
}

impl std::error::Error for FrameInfoParseError {}
