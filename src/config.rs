/// Settings shared by builds and layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Reuse render-component subtrees that no state update touched.
    pub reuse_enabled: bool,
    /// Read and write the layout cache.
    pub layout_cache_enabled: bool,
    /// Push creation validation frames during builds and layouts.
    pub validate_creation: bool,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            reuse_enabled: true,
            layout_cache_enabled: true,
            validate_creation: cfg!(debug_assertions),
        }
    }
}

impl Config {
    pub fn new() -> Config {
        Config::default()
    }

    pub fn reuse_enabled(mut self, enabled: bool) -> Config {
        self.reuse_enabled = enabled;
        self
    }

    pub fn layout_cache_enabled(mut self, enabled: bool) -> Config {
        self.layout_cache_enabled = enabled;
        self
    }

    pub fn validate_creation(mut self, enabled: bool) -> Config {
        self.validate_creation = enabled;
        self
    }
}
