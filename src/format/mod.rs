//! Export format codes and the process-wide format table
//!
//! Every format code maps to exactly one writer and one content type. The
//! mapping is static configuration shared by all views.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// One known export format
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum FormatCode {
    /// Comma-separated values
    Csv,
    /// Spreadsheet workbook
    Xls,
    /// JSON array of objects
    Json,
    /// YAML sequence of mappings
    Yaml,
    /// Tab-separated values
    Tsv,
}

/// Static description of a format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatSpec {
    /// Lower-case format code used in query strings
    pub code: &'static str,
    /// Content type sent with the exported file
    pub content_type: &'static str,
    /// File extension of the exported file
    pub extension: &'static str,
}

/// Format table, in `FormatCode::ALL` order
static FORMATS: [FormatSpec; 5] = [
    FormatSpec {
        code: "csv",
        content_type: "text/csv",
        extension: "csv",
    },
    FormatSpec {
        code: "xls",
        content_type: "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        extension: "xlsx",
    },
    FormatSpec {
        code: "json",
        content_type: "application/json",
        extension: "json",
    },
    FormatSpec {
        code: "yaml",
        content_type: "text/yaml",
        extension: "yaml",
    },
    FormatSpec {
        code: "tsv",
        content_type: "text/tab-separated-values",
        extension: "tsv",
    },
];

impl FormatCode {
    /// All known formats
    pub const ALL: [FormatCode; 5] = [
        FormatCode::Csv,
        FormatCode::Xls,
        FormatCode::Json,
        FormatCode::Yaml,
        FormatCode::Tsv,
    ];

    fn position(self) -> usize {
        match self {
            FormatCode::Csv => 0,
            FormatCode::Xls => 1,
            FormatCode::Json => 2,
            FormatCode::Yaml => 3,
            FormatCode::Tsv => 4,
        }
    }

    /// Static table entry for this format
    pub fn spec(self) -> &'static FormatSpec {
        &FORMATS[self.position()]
    }

    /// Lower-case format code
    pub fn code(self) -> &'static str {
        self.spec().code
    }

    /// Registered content type
    pub fn content_type(self) -> &'static str {
        self.spec().content_type
    }

    /// File extension for downloads
    pub fn extension(self) -> &'static str {
        self.spec().extension
    }

    /// Look up a format code in the known format table
    ///
    /// The lookup is exact: query parameters carry the lower-case code.
    ///
    /// # Arguments
    /// * `code` - Format code as received
    ///
    /// # Returns
    /// * `Option<FormatCode>` - The format, if known
    pub fn lookup(code: &str) -> Option<FormatCode> {
        FormatCode::ALL.into_iter().find(|f| f.code() == code)
    }
}

impl fmt::Display for FormatCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for FormatCode {
    type Err = ConfigError;

    /// Parse a declared format, ignoring case
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        FormatCode::lookup(&lowered).ok_or_else(|| ConfigError::InvalidValue {
            field: "format".to_string(),
            value: s.to_string(),
        })
    }
}
