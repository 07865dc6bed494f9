/// Default robot address (VEX V5 brain over a USB/serial bridge)
pub const DEFAULT_ROBOT_ADDRESS: &str = "127.0.0.1";

/// Default TCP port the telemetry bridge listens on
pub const DEFAULT_PORT: u16 = 5809;

/// Delay between a transport failure and the next start attempt (milliseconds)
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 500;

/// Directory name under the platform config dir
pub const CONFIG_DIR_NAME: &str = "livefeed";

/// Preferences file name
pub const PREFERENCES_FILE_NAME: &str = "preferences.json";
