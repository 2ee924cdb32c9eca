// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! DDE clipboard data formats.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// A standard clipboard format used to encode DDE item data.
///
/// Formats can be parsed from their `CF_*` name (the prefix is optional and
/// matching is case-insensitive) or from their numeric code.
///
/// # Examples
///
/// ```
/// use dde_session::types::Format;
///
/// let text: Format = "CF_TEXT".parse().unwrap();
/// assert_eq!(text, Format::Text);
/// assert_eq!(text.code(), 1);
///
/// let unicode: Format = "unicodetext".parse().unwrap();
/// assert_eq!(unicode, Format::UnicodeText);
///
/// assert_eq!("13".parse::<Format>().unwrap(), Format::UnicodeText);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(try_from = "FormatSpec", into = "String")]
pub enum Format {
    /// `CF_TEXT`: ANSI text.
    #[default]
    Text,
    /// `CF_BITMAP`
    Bitmap,
    /// `CF_METAFILEPICT`
    MetafilePict,
    /// `CF_SYLK`: Microsoft symbolic link format.
    Sylk,
    /// `CF_DIF`: Data interchange format.
    Dif,
    /// `CF_TIFF`
    Tiff,
    /// `CF_OEMTEXT`: text in the OEM character set.
    OemText,
    /// `CF_DIB`
    Dib,
    /// `CF_PALETTE`
    Palette,
    /// `CF_PENDATA`
    PenData,
    /// `CF_RIFF`
    Riff,
    /// `CF_WAVE`
    Wave,
    /// `CF_UNICODETEXT`: UTF-16 text.
    UnicodeText,
    /// `CF_ENHMETAFILE`
    EnhMetafile,
    /// `CF_HDROP`
    HDrop,
    /// `CF_LOCALE`
    Locale,
    /// `CF_DIBV5`
    DibV5,
}

const ALL_FORMATS: [Format; 17] = [
    Format::Text,
    Format::Bitmap,
    Format::MetafilePict,
    Format::Sylk,
    Format::Dif,
    Format::Tiff,
    Format::OemText,
    Format::Dib,
    Format::Palette,
    Format::PenData,
    Format::Riff,
    Format::Wave,
    Format::UnicodeText,
    Format::EnhMetafile,
    Format::HDrop,
    Format::Locale,
    Format::DibV5,
];

impl Format {
    /// Returns the numeric clipboard format code.
    #[must_use]
    pub const fn code(&self) -> u16 {
        match self {
            Self::Text => 1,
            Self::Bitmap => 2,
            Self::MetafilePict => 3,
            Self::Sylk => 4,
            Self::Dif => 5,
            Self::Tiff => 6,
            Self::OemText => 7,
            Self::Dib => 8,
            Self::Palette => 9,
            Self::PenData => 10,
            Self::Riff => 11,
            Self::Wave => 12,
            Self::UnicodeText => 13,
            Self::EnhMetafile => 14,
            Self::HDrop => 15,
            Self::Locale => 16,
            Self::DibV5 => 17,
        }
    }

    /// Returns the `CF_*` constant name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "CF_TEXT",
            Self::Bitmap => "CF_BITMAP",
            Self::MetafilePict => "CF_METAFILEPICT",
            Self::Sylk => "CF_SYLK",
            Self::Dif => "CF_DIF",
            Self::Tiff => "CF_TIFF",
            Self::OemText => "CF_OEMTEXT",
            Self::Dib => "CF_DIB",
            Self::Palette => "CF_PALETTE",
            Self::PenData => "CF_PENDATA",
            Self::Riff => "CF_RIFF",
            Self::Wave => "CF_WAVE",
            Self::UnicodeText => "CF_UNICODETEXT",
            Self::EnhMetafile => "CF_ENHMETAFILE",
            Self::HDrop => "CF_HDROP",
            Self::Locale => "CF_LOCALE",
            Self::DibV5 => "CF_DIBV5",
        }
    }

    /// Looks up a format by its numeric code.
    #[must_use]
    pub fn from_code(code: u16) -> Option<Self> {
        ALL_FORMATS.into_iter().find(|f| f.code() == code)
    }

    /// Returns true if values in this format are text.
    #[must_use]
    pub const fn is_text(&self) -> bool {
        matches!(self, Self::Text | Self::OemText | Self::UnicodeText)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(code) = trimmed.parse::<u16>() {
            return Self::from_code(code).ok_or_else(|| invalid_format(s));
        }

        let upper = trimmed.to_uppercase();
        let name = upper.strip_prefix("CF_").unwrap_or(&upper);
        ALL_FORMATS
            .into_iter()
            .find(|f| &f.as_str()[3..] == name)
            .ok_or_else(|| invalid_format(s))
    }
}

fn invalid_format(s: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: "format".to_string(),
        message: format!("unknown clipboard format '{s}'"),
    }
}

/// Shapes accepted when deserializing a [`Format`].
#[derive(Deserialize)]
#[serde(untagged)]
enum FormatSpec {
    Code(u16),
    Name(String),
}

impl TryFrom<FormatSpec> for Format {
    type Error = ConfigError;

    fn try_from(spec: FormatSpec) -> Result<Self, Self::Error> {
        match spec {
            FormatSpec::Code(code) => {
                Self::from_code(code).ok_or_else(|| invalid_format(&code.to_string()))
            }
            FormatSpec::Name(name) => name.parse(),
        }
    }
}

impl From<Format> for String {
    fn from(format: Format) -> Self {
        format.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_with_and_without_prefix() {
        assert_eq!("CF_TEXT".parse::<Format>().unwrap(), Format::Text);
        assert_eq!("text".parse::<Format>().unwrap(), Format::Text);
        assert_eq!("cf_dibv5".parse::<Format>().unwrap(), Format::DibV5);
    }

    #[test]
    fn parse_numeric_code() {
        assert_eq!("7".parse::<Format>().unwrap(), Format::OemText);
        assert!("0".parse::<Format>().is_err());
        assert!("18".parse::<Format>().is_err());
    }

    #[test]
    fn parse_unknown_name_fails() {
        let err = "CF_JPEG".parse::<Format>().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "format"));
    }

    #[test]
    fn codes_are_unique_and_sequential() {
        for (idx, format) in ALL_FORMATS.iter().enumerate() {
            assert_eq!(usize::from(format.code()), idx + 1);
            assert_eq!(Format::from_code(format.code()), Some(*format));
        }
    }

    #[test]
    fn deserialize_from_name_or_code() {
        let by_name: Format = serde_json::from_str("\"CF_UNICODETEXT\"").unwrap();
        let by_code: Format = serde_json::from_str("13").unwrap();
        assert_eq!(by_name, Format::UnicodeText);
        assert_eq!(by_code, Format::UnicodeText);
    }

    #[test]
    fn serialize_as_name() {
        let json = serde_json::to_string(&Format::Tiff).unwrap();
        assert_eq!(json, "\"CF_TIFF\"");
    }

    #[test]
    fn text_formats() {
        assert!(Format::Text.is_text());
        assert!(Format::UnicodeText.is_text());
        assert!(!Format::Bitmap.is_text());
    }
}
