//! Error types shared by the storage layer and the input forms.

/// Failure while reading or writing one of the data files.
#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Csv(csv::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Io(e) => write!(f, "I/O error: {e}"),
            StoreError::Csv(e) => write!(f, "CSV error: {e}"),
            StoreError::Json(e) => write!(f, "JSON error: {e}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io(e) => Some(e),
            StoreError::Csv(e) => Some(e),
            StoreError::Json(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e)
    }
}

impl From<csv::Error> for StoreError {
    fn from(e: csv::Error) -> Self {
        StoreError::Csv(e)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Json(e)
    }
}

/// Problems with user input that are reported inline and never written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    MissingField(&'static str),
    DuplicateExercise(String),
    InvalidCredentials,
    UsernameTaken(String),
    InvalidUsername(String),
    NoSharedPassword,
}

impl std::fmt::Display for FormError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormError::MissingField(field) => write!(f, "Please enter {field}."),
            FormError::DuplicateExercise(name) => write!(f, "Exercise already exists: {name}"),
            FormError::InvalidCredentials => write!(f, "Invalid username or password."),
            FormError::UsernameTaken(name) => write!(f, "Username already taken: {name}"),
            FormError::InvalidUsername(name) => write!(
                f,
                "Invalid username '{name}': use 1-32 letters, digits, '.', '_' or '-'."
            ),
            FormError::NoSharedPassword => write!(f, "No shared password is configured."),
        }
    }
}

impl std::error::Error for FormError {}
