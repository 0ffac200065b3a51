//! Error types for the harness

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Playwright not found. Install with: npx playwright install")]
    PlaywrightNotFound,

    #[error("script failed for scenario '{scenario}': {message}")]
    Script { scenario: String, message: String },

    #[error("target application unreachable at {url} after {attempts} attempts")]
    TargetUnreachable { url: String, attempts: usize },

    #[error("app server failed to start: {0}")]
    ServerStartup(String),

    #[error("no mocked event source named '{0}' - call mock_event_source first")]
    UnknownSource(String),

    #[error("event branch not found: {concept} > {group}")]
    BranchNotFound { concept: String, group: String },

    #[error("no event instance labeled '{label}' under {concept} > {group}")]
    LabelNotFound {
        concept: String,
        group: String,
        label: String,
    },

    #[error("no event instance with id '{id}' under {concept} > {group}")]
    IdNotFound {
        concept: String,
        group: String,
        id: String,
    },

    #[error("event feed parse error for source '{feed}': {message}")]
    FeedParse { feed: String, message: String },

    #[error("baseline not found: {0}")]
    BaselineNotFound(String),

    #[error("screenshot mismatch: {name} differs by {diff_percent:.2}% (threshold: {threshold:.2}%)")]
    ScreenshotMismatch {
        name: String,
        diff_percent: f64,
        threshold: f64,
    },

    #[error("screenshot not found: {0}")]
    ScreenshotNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type HarnessResult<T> = Result<T, HarnessError>;
