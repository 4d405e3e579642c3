use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum CollectError {
    Io(std::io::Error),
    NotFound(PathBuf),
    Config(String),
    Json(serde_json::Error),
    Parse(String),
    Fragment { path: PathBuf, lines: usize },
    Other(String),
}

impl fmt::Display for CollectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectError::Io(e) => write!(f, "IO error: {}", e),
            CollectError::NotFound(p) => write!(f, "File not found: {}", p.display()),
            CollectError::Config(e) => write!(f, "Config error: {}", e),
            CollectError::Json(e) => write!(f, "JSON error: {}", e),
            CollectError::Parse(e) => write!(f, "Parse error: {}", e),
            CollectError::Fragment { path, lines } => write!(
                f,
                "Trailing fragment of {} line(s) in {}",
                lines,
                path.display()
            ),
            CollectError::Other(e) => write!(f, "Error: {}", e),
        }
    }
}

impl std::error::Error for CollectError {}

impl From<std::io::Error> for CollectError {
    fn from(err: std::io::Error) -> Self {
        CollectError::Io(err)
    }
}

impl From<serde_json::Error> for CollectError {
    fn from(err: serde_json::Error) -> Self {
        CollectError::Json(err)
    }
}

impl From<regex::Error> for CollectError {
    fn from(err: regex::Error) -> Self {
        CollectError::Parse(err.to_string())
    }
}

impl From<String> for CollectError {
    fn from(err: String) -> Self {
        CollectError::Other(err)
    }
}

impl From<&str> for CollectError {
    fn from(err: &str) -> Self {
        CollectError::Other(err.to_string())
    }
}
