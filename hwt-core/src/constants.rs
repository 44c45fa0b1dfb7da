//! Constants and configuration values for hwtree
//!
//! Centralizes magic numbers, paths, persistence keys and defaults.

/// System paths
pub mod paths {
    /// Base path for hwmon devices
    pub const HWMON_BASE: &str = "/sys/class/hwmon";

    /// Application directory name under the user config dir
    pub const APP_DIR: &str = "hwtree";

    /// Settings file name
    pub const SETTINGS_FILE: &str = "settings.json";

    /// Log file name (TUI mode with --logging)
    pub const LOG_FILE: &str = "hwtree.log";

    /// User configuration directory (`$XDG_CONFIG_HOME/hwtree`, `~/.config/hwtree`)
    pub fn user_config_dir() -> Option<std::path::PathBuf> {
        let base = if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
            Some(std::path::PathBuf::from(xdg))
        } else if let Ok(home) = std::env::var("HOME") {
            Some(std::path::PathBuf::from(home).join(".config"))
        } else {
            dirs::config_dir()
        };
        base.map(|p| p.join(APP_DIR))
    }

    /// Linux procfs files
    pub mod proc {
        pub const HOSTNAME: &str = "/proc/sys/kernel/hostname";
        pub const ETC_HOSTNAME: &str = "/etc/hostname";
    }

    /// DMI board identification
    pub mod dmi {
        pub const BOARD_VENDOR: &str = "/sys/devices/virtual/dmi/id/board_vendor";
        pub const BOARD_NAME: &str = "/sys/devices/virtual/dmi/id/board_name";
        pub const PRODUCT_NAME: &str = "/sys/devices/virtual/dmi/id/product_name";
    }
}

/// Limits on user-created structures
pub mod limits {
    /// Maximum number of virtual sensor containers; indices are `0..MAX`
    pub const MAX_VIRTUAL_CONTAINERS: usize = 32;
}

/// Tick timing
pub mod timing {
    /// Default refresh interval (ms)
    pub const DEFAULT_REFRESH_MS: u64 = 1000;

    /// Smallest accepted refresh interval (ms)
    pub const MIN_REFRESH_MS: u64 = 100;

    /// Largest accepted refresh interval (ms)
    pub const MAX_REFRESH_MS: u64 = 10_000;

    /// Step used by the UI when adjusting the interval (ms)
    pub const REFRESH_STEP_MS: u64 = 250;
}

/// Settings keys
pub mod keys {
    /// Root segment of every virtual container identifier
    pub const VIRTUAL_ROOT: &str = "virtual";

    /// Per-container counter of allocated sensor slots
    pub const SENSOR_INDEX: &str = "sensorindex";

    /// Per-virtual-sensor type tag
    pub const SENSOR_TYPE: &str = "sensortype";

    // Per-node preference suffixes
    pub const HIDDEN: &str = "hidden";
    pub const COLLAPSED: &str = "collapsed";
    pub const NAME: &str = "name";
    pub const PLOT: &str = "plot";
    pub const OVERVIEW: &str = "overview";
    pub const PEN_COLOR: &str = "penColor";

    // Monitor configuration
    pub const REFRESH_RATE: &str = "refresh_rate";
    pub const SHOW_HIDDEN: &str = "show_hidden";
    pub const SHOW_PLOT: &str = "show_plot";
}

/// hwmon sysfs unit scaling
pub mod hwmon {
    /// tempN_input and inN_input are reported in milli-units
    pub const MILLI: f32 = 1000.0;

    /// powerN_input is reported in microwatts
    pub const MICRO: f32 = 1_000_000.0;

    /// pwmN raw range
    pub const PWM_MAX: f32 = 255.0;
}
