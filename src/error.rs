use thiserror::Error;

#[derive(Error, Debug)]
pub enum SheetSentryError {
    #[error("config error: {0}")]
    Config(String),

    #[error("spreadsheet id is not set. Set it with `sheet-sentry config --set-spreadsheet-id YOUR_ID`")]
    MissingSpreadsheetId,

    #[error("cookies are not set. Set them with `sheet-sentry config --set-cookies YOUR_COOKIES`")]
    MissingCookies,

    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("invalid rules: {0}")]
    InvalidRules(String),

    #[error("malformed document: {0}")]
    MalformedDocument(String),

    #[error("download failed: {0}")]
    Fetch(String),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SheetSentryError>;
