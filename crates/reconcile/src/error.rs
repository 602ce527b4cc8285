//! Errors raised while reconciling and applying

use crate::types::Stage;
use brewkit::Category;
use thiserror::Error;

/// Errors that can occur during a reconciliation run.
///
/// Nothing is retried or skipped: the first error ends the run and is
/// returned wrapped in [`Error::Stage`] with the stage, category and
/// package that were in progress.
#[derive(Debug, Error)]
pub enum Error {
    /// The state store could not be opened
    #[error("state provider failed to initialize: {message}")]
    ProviderInit { message: String },

    /// The state store failed while reading or writing
    #[error("state provider error: {message}")]
    Provider { message: String },

    /// A collection was passed for the wrong category
    #[error("collection '{label}' holds {found} dependencies but was passed as {expected}")]
    CategoryMismatch {
        label: String,
        expected: Category,
        found: Category,
    },

    /// A brew invocation or record parse failed
    #[error(transparent)]
    Brew(#[from] brewkit::Error),

    /// Failure with the point of the run it happened at
    #[error("{stage} failed{}: {source}", location(.category, .package))]
    Stage {
        stage: Stage,
        category: Option<Category>,
        package: Option<String>,
        #[source]
        source: Box<Error>,
    },
}

fn location(category: &Option<Category>, package: &Option<String>) -> String {
    match (category, package) {
        (Some(c), Some(p)) => format!(" for {p} ({c})"),
        (Some(c), None) => format!(" for {c}"),
        (None, Some(p)) => format!(" for {p}"),
        (None, None) => String::new(),
    }
}

impl Error {
    /// Create an initialization error
    pub fn init(message: impl Into<String>) -> Self {
        Self::ProviderInit {
            message: message.into(),
        }
    }

    /// Create a provider error
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider {
            message: message.into(),
        }
    }

    /// Attach the stage context
    pub fn at(self, stage: Stage, category: Option<Category>, package: Option<&str>) -> Self {
        Self::Stage {
            stage,
            category,
            package: package.map(str::to_string),
            source: Box::new(self),
        }
    }

    /// Stage the error happened in, if known
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// The innermost error, without stage context
    pub fn root(&self) -> &Error {
        match self {
            Self::Stage { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Result type for reconciliation
pub type Result<T> = std::result::Result<T, Error>;
