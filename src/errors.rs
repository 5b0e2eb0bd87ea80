use std::fmt;

/// Main error type for the pokemon-arena core
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArenaError {
    /// Error while fetching or decoding remote catalog data
    Fetch(FetchError),
    /// Error starting a battle from the current slot and cache state
    BattleStart(BattleStartError),
    /// Error loading or saving persisted state
    Storage(StorageError),
    /// Error loading the arena configuration
    Config(ConfigError),
}

/// Errors produced by the catalog transport and the detail cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Transport-level failure before a response could be read
    Network(String),
    /// The API answered with a non-success status; carries the user-facing message
    Status(String),
    /// The response body could not be decoded into the expected shape
    Decode(String),
}

impl FetchError {
    /// Non-success status while fetching one detail document.
    pub fn detail_status(status: u16) -> Self {
        FetchError::Status(format!("Failed to load Pokemon detail (status {status})."))
    }

    /// Non-success status while fetching a catalog page.
    pub fn page_status(status: u16) -> Self {
        FetchError::Status(format!("Failed to load Pokemon (status {status})."))
    }
}

/// Reasons a battle cannot start from the current application state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BattleStartError {
    /// One or both slots are empty
    MissingSlot,
    /// A participant's detail document is still loading
    DetailsLoading,
    /// A participant's detail document never arrived
    DetailsUnavailable,
    /// A countdown or battle is already running
    InProgress,
}

/// Errors from the persistence collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The underlying key-value store failed
    Io(String),
    /// A persisted record could not be encoded or decoded
    Serde(String),
}

/// Errors loading the arena configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The configuration file could not be read
    Io(String),
    /// The configuration file is not valid TOML for `ArenaConfig`
    Parse(String),
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArenaError::Fetch(err) => write!(f, "Fetch error: {}", err),
            ArenaError::BattleStart(err) => write!(f, "Battle start error: {}", err),
            ArenaError::Storage(err) => write!(f, "Storage error: {}", err),
            ArenaError::Config(err) => write!(f, "Config error: {}", err),
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Network(details) => write!(f, "Network error: {}", details),
            FetchError::Status(message) => write!(f, "{}", message),
            FetchError::Decode(details) => write!(f, "Failed to parse Pokemon payload: {}", details),
        }
    }
}

impl fmt::Display for BattleStartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BattleStartError::MissingSlot => {
                write!(f, "Select both a challenger and an opponent to battle.")
            }
            BattleStartError::DetailsLoading => {
                write!(f, "Please wait for both Pokemon details to finish loading.")
            }
            BattleStartError::DetailsUnavailable => {
                write!(f, "Unable to start battle. Try re-opening each Pokemon detail.")
            }
            BattleStartError::InProgress => write!(f, "A battle is already in progress."),
        }
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Io(details) => write!(f, "Storage I/O error: {}", details),
            StorageError::Serde(details) => write!(f, "Storage encoding error: {}", details),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(details) => write!(f, "Failed to read config file: {}", details),
            ConfigError::Parse(details) => write!(f, "Invalid config file: {}", details),
        }
    }
}

impl std::error::Error for ArenaError {}
impl std::error::Error for FetchError {}
impl std::error::Error for BattleStartError {}
impl std::error::Error for StorageError {}
impl std::error::Error for ConfigError {}

impl From<FetchError> for ArenaError {
    fn from(err: FetchError) -> Self {
        ArenaError::Fetch(err)
    }
}

impl From<BattleStartError> for ArenaError {
    fn from(err: BattleStartError) -> Self {
        ArenaError::BattleStart(err)
    }
}

impl From<StorageError> for ArenaError {
    fn from(err: StorageError) -> Self {
        ArenaError::Storage(err)
    }
}

impl From<ConfigError> for ArenaError {
    fn from(err: ConfigError) -> Self {
        ArenaError::Config(err)
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Network(err.to_string())
    }
}

/// Type alias for Results using ArenaError
pub type ArenaResult<T> = Result<T, ArenaError>;

/// Type alias for Results using FetchError
pub type FetchResult<T> = Result<T, FetchError>;

/// Type alias for Results using StorageError
pub type StorageResult<T> = Result<T, StorageError>;
