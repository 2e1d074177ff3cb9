use thiserror::Error;

#[derive(Debug, Error)]
pub enum GiroError {
    #[error("{file}: expected 17 fields, found {found}: {line}")]
    FieldCount {
        file: String,
        found: usize,
        line: String,
    },

    #[error("{file}: malformed value date '{date}': {line}")]
    MalformedDate {
        file: String,
        date: String,
        line: String,
    },

    #[error("{file}: malformed amount '{amount}': {line}")]
    MalformedAmount {
        file: String,
        amount: String,
        line: String,
    },

    #[error("{file}: not valid UTF-8, convert the export to UTF-8 first")]
    Encoding { file: String },

    #[error("no input files matching giro-{account}-*-*.camtv2.csv in {dir}")]
    NoInputFiles { account: String, dir: String },

    #[error("no records for account {account} in {year} (sign: {sign})")]
    EmptyBase {
        account: String,
        year: i32,
        sign: String,
    },

    #[error("threshold must not be zero")]
    ZeroThreshold,

    #[error("unknown category: {0} (see `giro categories`)")]
    UnknownCategory(String),

    #[error("unknown sign: {0} (expected positiv, negativ or alle)")]
    UnknownSign(String),

    #[error("invalid year: {0} (expected four digits)")]
    InvalidYear(i32),

    #[error("invalid pattern for {title}: {source}")]
    InvalidPattern {
        title: String,
        #[source]
        source: regex::Error,
    },

    #[error("category `suche` requires --search")]
    MissingSearch,

    #[error("no account given: pass --account or set it in settings.json")]
    MissingAccount,

    #[error("{} categories failed: {}", .0.len(), .0.join(", "))]
    CompositeFailed(Vec<String>),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl GiroError {
    /// Pipeline stage an error belongs to, shown in the one-line diagnostic.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::FieldCount { .. }
            | Self::MalformedDate { .. }
            | Self::MalformedAmount { .. }
            | Self::Encoding { .. } => "parser",
            Self::NoInputFiles { .. } | Self::EmptyBase { .. } => "aggregator",
            Self::ZeroThreshold => "ranker",
            Self::UnknownCategory(_)
            | Self::UnknownSign(_)
            | Self::InvalidYear(_)
            | Self::InvalidPattern { .. }
            | Self::MissingSearch
            | Self::MissingAccount
            | Self::Settings(_) => "config",
            Self::CompositeFailed(_) => "composite",
            Self::Pdf(_) | Self::Csv(_) | Self::Other(_) => "report",
            Self::Io(_) => "io",
        }
    }
}

pub type Result<T> = std::result::Result<T, GiroError>;
