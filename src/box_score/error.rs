use thiserror::Error;

pub type PageResult<T> = std::result::Result<T, Mismatch>;

/// A landmark or ordinal offset that was not where the page layout says it should be.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
#[error("{field}: {detail}")]
pub struct Mismatch {
    pub field: String,
    pub detail: String,
}

impl Mismatch {
    pub fn new(field: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            detail: detail.into(),
        }
    }

    pub fn at(self, link: &str) -> ExtractError {
        ExtractError::StructuralMismatch {
            link: link.to_string(),
            source: self,
        }
    }
}

#[derive(Error, Debug)]
pub enum ExtractError {
    /// Fatal for the document; nothing from it is committed.
    #[error("Structural mismatch in {link} at {source}")]
    StructuralMismatch {
        link: String,
        #[source]
        source: Mismatch,
    },

    #[error("No boxscore registered for {0}")]
    UnregisteredBoxscore(String),
}

impl ExtractError {
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::StructuralMismatch { source, .. } => Some(&source.field),
            Self::UnregisteredBoxscore(_) => None,
        }
    }
}
