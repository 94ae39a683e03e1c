//! View configurations negotiated with a plugin's interface.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewConfiguration {
    pub width: f64,
    pub height: f64,
    /// Host draws the generic controls and the plugin only fills the rest.
    pub host_provides_controller: bool,
}

impl ViewConfiguration {
    pub fn new(width: f64, height: f64, host_provides_controller: bool) -> Self {
        Self {
            width,
            height,
            host_provides_controller,
        }
    }
}

/// The two layouts a session offers: compact (index 0) and expanded (index 1).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewConfigurations {
    pub compact: ViewConfiguration,
    pub expanded: ViewConfiguration,
}

impl Default for ViewConfigurations {
    fn default() -> Self {
        Self {
            compact: ViewConfiguration::new(400.0, 100.0, true),
            expanded: ViewConfiguration::new(800.0, 500.0, false),
        }
    }
}

impl ViewConfigurations {
    pub const COMPACT: usize = 0;
    pub const EXPANDED: usize = 1;

    pub fn get(&self, index: usize) -> Option<&ViewConfiguration> {
        match index {
            Self::COMPACT => Some(&self.compact),
            Self::EXPANDED => Some(&self.expanded),
            _ => None,
        }
    }

    pub fn to_vec(&self) -> Vec<ViewConfiguration> {
        vec![self.compact, self.expanded]
    }
}

/// Native UI handle (NSView*, HWND, etc.) cast to u64.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ViewHandle(pub u64);
