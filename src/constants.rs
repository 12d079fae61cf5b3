// src/constants.rs

/// The application name, used for config/cache directories and the keyring service.
pub const APP_NAME: &str = "snipforge";

/// The name of the configuration file inside the config directory.
pub const CONFIG_FILENAME: &str = "config.yaml";

/// The schema version this build reads and writes.
pub const CURRENT_CONFIG_VERSION: &str = "1.1.2";

/// Service name for entries in the OS keychain.
pub const KEYRING_SERVICE: &str = "snipforge";

/// Prefix of the private directory used to hand scripts to an external editor.
pub const TEMP_DIR_PREFIX: &str = "snipforge-";

/// Environment variable that redirects log output to a file while full-screen UIs are active.
pub const LOG_FILE_ENV: &str = "SNIPFORGE_LOG_FILE";

/// Spinner tick of the terminal UIs, in milliseconds.
pub const TICK_RATE_MS: u64 = 100;

/// Minimum terminal width at which the chat UI applies horizontal padding.
pub const RESPONSIVE_PADDING_MIN_WIDTH: u16 = 100;
