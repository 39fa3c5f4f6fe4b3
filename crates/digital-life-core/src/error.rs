//! Error types.
//!
//! Only programmer-error contract violations and snapshot I/O are errors.
//! Expected runtime conditions (population ceiling, planet cap, operating on
//! a dead entity) are reported through `Option`/`bool` return values instead.

/// Invalid construction-time configuration
#[derive(Debug)]
pub enum ConfigError {
    /// A radius or distance was negative or not finite
    InvalidRadius { field: &'static str, value: f32 },
    /// `min_population` exceeds `max_population`
    PopulationBounds { min: usize, max: usize },
    /// `max_planets` must allow at least one planet
    ZeroPlanetCap,
    /// A per-tick probability fell outside [0, 1]
    InvalidProbability { field: &'static str, value: f64 },
    /// World dimensions must be positive
    InvalidWorldSize { width: f32, height: f32 },
    /// Malformed JSON configuration
    Json(serde_json::Error),
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Json(e)
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidRadius { field, value } => {
                write!(f, "Invalid radius for {}: {}", field, value)
            }
            ConfigError::PopulationBounds { min, max } => {
                write!(
                    f,
                    "Population floor {} is above population ceiling {}",
                    min, max
                )
            }
            ConfigError::ZeroPlanetCap => write!(f, "max_planets must be at least 1"),
            ConfigError::InvalidProbability { field, value } => {
                write!(f, "Probability {} out of range [0, 1]: {}", field, value)
            }
            ConfigError::InvalidWorldSize { width, height } => {
                write!(f, "Invalid world size {}x{}", width, height)
            }
            ConfigError::Json(e) => write!(f, "Config parse error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Errors that can occur during save/load
#[derive(Debug)]
pub enum SaveError {
    Io(std::io::Error),
    Bincode(Box<bincode::ErrorKind>),
    VersionMismatch { expected: u32, found: u32 },
    Config(ConfigError),
}

impl From<std::io::Error> for SaveError {
    fn from(e: std::io::Error) -> Self {
        SaveError::Io(e)
    }
}

impl From<Box<bincode::ErrorKind>> for SaveError {
    fn from(e: Box<bincode::ErrorKind>) -> Self {
        SaveError::Bincode(e)
    }
}

impl From<ConfigError> for SaveError {
    fn from(e: ConfigError) -> Self {
        SaveError::Config(e)
    }
}

impl std::fmt::Display for SaveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaveError::Io(e) => write!(f, "IO error: {}", e),
            SaveError::Bincode(e) => write!(f, "Serialization error: {}", e),
            SaveError::VersionMismatch { expected, found } => {
                write!(
                    f,
                    "Snapshot version mismatch: expected {}, found {}",
                    expected, found
                )
            }
            SaveError::Config(e) => write!(f, "Snapshot holds invalid config: {}", e),
        }
    }
}

impl std::error::Error for SaveError {}
