//! Startup errors.
//!
//! Only initialisation can fail.  Once the render loop is running every
//! per-frame path degrades to "no signal" instead of returning an error.

use thiserror::Error;

/// Result type alias for sound-grid operations.
pub type Result<T> = std::result::Result<T, SoundGridError>;

#[derive(Error, Debug)]
pub enum SoundGridError {
    /// Invalid grid spacing, canvas dimensions or tuning constants.
    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    /// A sound layer could not be loaded.  The layer count is fixed, so
    /// one missing layer aborts startup.
    #[error("Failed to load sound layer '{asset}': {reason}")]
    AssetLoad { asset: String, reason: String },

    /// The render window could not be opened.
    #[error("Window error: {reason}")]
    Window { reason: String },

    #[error("Cannot read config file {path}")]
    ConfigFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

impl SoundGridError {
    pub fn configuration(reason: impl Into<String>) -> Self {
        SoundGridError::Configuration { reason: reason.into() }
    }

    pub fn asset_load(asset: impl Into<String>, reason: impl Into<String>) -> Self {
        SoundGridError::AssetLoad { asset: asset.into(), reason: reason.into() }
    }

    /// Stable identifier for diagnostics.
    pub fn error_code(&self) -> &'static str {
        match self {
            SoundGridError::Configuration { .. } => "CONFIGURATION",
            SoundGridError::AssetLoad { .. }     => "ASSET_LOAD",
            SoundGridError::Window { .. }        => "WINDOW",
            SoundGridError::ConfigFile { .. }    => "CONFIG_FILE",
            SoundGridError::ConfigParse(_)       => "CONFIG_PARSE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_message_includes_reason() {
        let e = SoundGridError::configuration("spacing must be > 0");
        assert_eq!(e.error_code(), "CONFIGURATION");
        assert!(e.to_string().contains("spacing must be > 0"));
    }

    #[test]
    fn asset_load_names_the_layer() {
        let e = SoundGridError::asset_load("choir", "note 200 out of range");
        assert!(e.to_string().contains("'choir'"));
        assert_eq!(e.error_code(), "ASSET_LOAD");
    }

    #[test]
    fn parse_errors_convert() {
        let bad = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let e: SoundGridError = bad.into();
        assert_eq!(e.error_code(), "CONFIG_PARSE");
    }
}
