use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarvestError {
    #[error("Anti-bot challenge detected at {url}")]
    ChallengeDetected { url: String },

    #[error("Request to {url} failed after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        last_error: String,
    },

    #[error("Unexpected response shape: {context}")]
    MalformedData { context: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, HarvestError>;

impl HarvestError {
    /// 給終端使用者看的說明，不含堆疊或內部細節
    pub fn user_friendly_message(&self) -> String {
        match self {
            HarvestError::ChallengeDetected { .. } => {
                "The site presented an anti-bot challenge that cannot be solved automatically."
                    .to_string()
            }
            HarvestError::RetriesExhausted { attempts, .. } => {
                format!("Could not reach the content API after {} attempts.", attempts)
            }
            HarvestError::MalformedData { .. } => {
                "The API returned data in an unexpected shape.".to_string()
            }
            HarvestError::CsvError(_) | HarvestError::IoError(_) => {
                "Failed to write the export file.".to_string()
            }
            HarvestError::InvalidConfigValueError { .. } => self.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            HarvestError::ChallengeDetected { .. } => {
                "Wait a while before running again, or lower the request rate."
            }
            HarvestError::RetriesExhausted { .. } => {
                "Check your network connection and retry later."
            }
            HarvestError::MalformedData { .. } => {
                "Retry later; if the problem persists the API may have changed."
            }
            HarvestError::CsvError(_) | HarvestError::IoError(_) => {
                "Check that the output directory exists and is writable."
            }
            HarvestError::InvalidConfigValueError { .. } => {
                "Adjust the command line arguments and run again."
            }
        }
    }
}
