//! Engine-wide settings.

/// Settings shared by every node rendered through one tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Prefix prepended to every generated class name.
    pub css_prefix: String,
    /// Computed style property the frame encoding is published through.
    pub frame_info_property: String,
    /// Log a warning when framing is requested and no encoding exists.
    pub warn_missing_frame: bool,
    /// First number handed out for generated node ids.
    pub auto_id_base: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            css_prefix: "x-".to_string(),
            frame_info_property: "font-family".to_string(),
            warn_missing_frame: true,
            auto_id_base: 1000,
        }
    }
}

impl EngineConfig {
    pub fn with_css_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.css_prefix = prefix.into();
        self
    }

    pub fn with_frame_info_property(mut self, property: impl Into<String>) -> Self {
        self.frame_info_property = property.into();
        self
    }

    pub fn with_missing_frame_warning(mut self, warn: bool) -> Self {
        self.warn_missing_frame = warn;
        self
    }

    pub fn with_auto_id_base(mut self, base: usize) -> Self {
        self.auto_id_base = base;
        self
    }

    pub fn prefixed(&self, name: &str) -> String {
        format!("{}{}", self.css_prefix, name)
    }
}
