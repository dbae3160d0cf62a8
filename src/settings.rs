use std::path::PathBuf;
use std::time::Duration;

use crate::worker::ErrorPolicy;

/// The settings of the simulator
#[derive(Debug, Clone)]
pub struct Settings {
    /// Directory holding one image per layer.
    pub layer_dir: PathBuf,

    /// Delay between two render ticks.
    pub update_interval: Duration,

    /// How long shutdown waits for the worker thread. `None` waits forever.
    pub shutdown_timeout: Option<Duration>,

    /// Skip recompositing on ticks where no command arrived.
    pub skip_idle_redraw: bool,

    /// What the worker does when its work fails
    pub error_policy: ErrorPolicy,

    /// The window settings
    pub window: WindowSettings,
}

impl Settings {
    pub fn new<P: Into<PathBuf>>(layer_dir: P) -> Self {
        Self {
            layer_dir: layer_dir.into(),
            ..Self::default()
        }
    }

    pub fn with_update_interval(mut self, update_interval: Duration) -> Self {
        self.update_interval = update_interval;
        self
    }

    pub fn with_shutdown_timeout(mut self, shutdown_timeout: Option<Duration>) -> Self {
        self.shutdown_timeout = shutdown_timeout;
        self
    }

    pub fn with_skip_idle_redraw(mut self, skip_idle_redraw: bool) -> Self {
        self.skip_idle_redraw = skip_idle_redraw;
        self
    }

    pub fn with_error_policy(mut self, error_policy: ErrorPolicy) -> Self {
        self.error_policy = error_policy;
        self
    }

    pub fn with_window(mut self, window: WindowSettings) -> Self {
        self.window = window;
        self
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            layer_dir: PathBuf::from("images/output"),
            update_interval: Duration::from_millis(50),
            shutdown_timeout: Some(Duration::from_secs(5)),
            skip_idle_redraw: false,
            error_policy: ErrorPolicy::default(),
            window: WindowSettings::default(),
        }
    }
}

/// The options for the window showing the composite
#[derive(Debug, Clone)]
pub struct WindowSettings {
    pub title: String,

    /// Colour shown through transparent parts of the composite, as RGB.
    pub background: [u8; 3],
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            title: String::from("panelsim"),
            background: [0xf0, 0xf0, 0xf0],
        }
    }
}
