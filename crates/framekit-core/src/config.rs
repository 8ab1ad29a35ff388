//! Configuration registration and the deferred configuration queue.
//!
//! Every widget type publishes one static [`ConfigTable`] that maps a
//! configuration key to the render state at which its setter becomes valid.
//! Setting a key on a node that has not reached that state buffers the
//! value in the node's [`DeferredConfigQueue`]; the tree replays the buffer
//! when the node advances.

use indexmap::IndexMap;

use crate::lifecycle::RenderState;
use crate::node::ComponentNode;
use crate::platform::{ElementId, Host};
use crate::value::Value;
use crate::RenderError;

/// Ui variant used when none is configured.
pub const DEFAULT_UI: &str = "default";

/// Applies a configuration value. Receives the new value and the value it
/// replaces (the value observed before any buffering started).
pub type ConfigSetter =
    fn(&mut ApplyContext<'_>, &Value, Option<&Value>) -> Result<(), RenderError>;

#[derive(Clone, Copy)]
pub struct ConfigEntry {
    pub key: &'static str,
    pub threshold: RenderState,
    pub setter: ConfigSetter,
}

impl std::fmt::Debug for ConfigEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigEntry")
            .field("key", &self.key)
            .field("threshold", &self.threshold)
            .finish()
    }
}

/// Static registration table: configuration key -> (threshold, setter).
#[derive(Clone, Debug, Default)]
pub struct ConfigTable {
    entries: IndexMap<&'static str, ConfigEntry>,
}

impl ConfigTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a table that inherits every entry of `base`.
    pub fn extending(base: &ConfigTable) -> Self {
        base.clone()
    }

    /// Registers or overrides a key.
    pub fn register(&mut self, key: &'static str, threshold: RenderState, setter: ConfigSetter) {
        self.entries.insert(
            key,
            ConfigEntry {
                key,
                threshold,
                setter,
            },
        );
    }

    pub fn get(&self, key: &str) -> Option<&ConfigEntry> {
        self.entries.get(key)
    }

    /// Threshold for `key`; unregistered keys apply immediately.
    pub fn threshold(&self, key: &str) -> RenderState {
        self.get(key)
            .map(|entry| entry.threshold)
            .unwrap_or(RenderState::Unrendered)
    }

    pub fn setter(&self, key: &str) -> ConfigSetter {
        self.get(key).map(|entry| entry.setter).unwrap_or(store_only)
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Declares a function returning a lazily built, process-wide [`ConfigTable`].
///
/// ```ignore
/// config_table! {
///     pub fn button_config() extends framekit_core::component_config_table {
///         "text" => (Rendered, apply_text),
///     }
/// }
/// ```
#[macro_export]
macro_rules! config_table {
    (
        $(#[$meta:meta])*
        $vis:vis fn $name:ident() $(extends $base:path)? {
            $($key:literal => ($threshold:ident, $setter:path)),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis fn $name() -> &'static $crate::ConfigTable {
            static TABLE: ::std::sync::OnceLock<$crate::ConfigTable> =
                ::std::sync::OnceLock::new();
            TABLE.get_or_init(|| {
                #[allow(unused_mut)]
                let mut table = $crate::config_table!(@base $($base)?);
                $(table.register($key, $crate::RenderState::$threshold, $setter);)*
                table
            })
        }
    };
    (@base) => {
        $crate::ConfigTable::new()
    };
    (@base $base:path) => {
        $crate::ConfigTable::extending($base())
    };
}

/// A buffered value plus the value it will replace.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingEntry {
    pub value: Value,
    pub previous: Option<Value>,
}

/// Per-node buffer of configuration values waiting for a render state.
///
/// Writes to the same key before a flush collapse to the last value; the
/// replaced value is captured once, on the first buffered write.
#[derive(Clone, Debug, Default)]
pub struct DeferredConfigQueue {
    buckets: [IndexMap<String, PendingEntry>; RenderState::COUNT],
}

impl DeferredConfigQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffer(
        &mut self,
        key: impl Into<String>,
        value: Value,
        threshold: RenderState,
        current: Option<Value>,
    ) {
        let bucket = &mut self.buckets[threshold.index()];
        match bucket.entry(key.into()) {
            indexmap::map::Entry::Occupied(mut entry) => {
                entry.get_mut().value = value;
            }
            indexmap::map::Entry::Vacant(entry) => {
                entry.insert(PendingEntry {
                    value,
                    previous: current,
                });
            }
        }
    }

    /// Latest buffered value for `key` in any bucket, highest threshold first.
    pub fn pending(&self, key: &str) -> Option<&Value> {
        self.buckets
            .iter()
            .rev()
            .find_map(|bucket| bucket.get(key))
            .map(|entry| &entry.value)
    }

    /// Removes every bucket up to and including `upto`, in ascending
    /// threshold order.
    pub fn drain_upto(&mut self, upto: RenderState) -> Vec<(String, PendingEntry)> {
        let mut drained = Vec::new();
        for bucket in self.buckets.iter_mut().take(upto.index() + 1) {
            drained.extend(bucket.drain(..));
        }
        drained
    }

    /// Drops any buffered value for `key`.
    pub fn discard(&mut self, key: &str) -> bool {
        let mut found = false;
        for bucket in &mut self.buckets {
            found |= bucket.shift_remove(key).is_some();
        }
        found
    }

    pub fn len(&self) -> usize {
        self.buckets.iter().map(IndexMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(IndexMap::is_empty)
    }

    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
    }
}

/// What a setter can touch while applying a value.
pub struct ApplyContext<'a> {
    pub node: &'a mut ComponentNode,
    pub host: &'a mut dyn Host,
    pub css_prefix: &'a str,
}

impl<'a> ApplyContext<'a> {
    pub fn element(&self) -> Option<ElementId> {
        self.node.element()
    }

    pub fn reference(&self, name: &str) -> Option<ElementId> {
        self.node.reference(name)
    }

    /// Prefixes a bare class name with the engine css prefix.
    pub fn prefixed(&self, name: &str) -> String {
        format!("{}{}", self.css_prefix, name)
    }

    /// Adds a class to the element, or to the pending root markup when the
    /// element does not exist yet.
    pub fn add_cls(&mut self, cls: &str) -> Result<(), RenderError> {
        match self.node.element() {
            Some(el) => Ok(self.host.add_class(el, cls)?),
            None => {
                self.node.proto_mut().add_class(cls);
                Ok(())
            }
        }
    }

    pub fn remove_cls(&mut self, cls: &str) -> Result<(), RenderError> {
        match self.node.element() {
            Some(el) => Ok(self.host.remove_class(el, cls)?),
            None => {
                self.node.proto_mut().remove_class(cls);
                Ok(())
            }
        }
    }

    pub fn set_style(&mut self, property: &str, value: &str) -> Result<(), RenderError> {
        match self.node.element() {
            Some(el) => Ok(self.host.set_style(el, property, value)?),
            None => {
                self.node.proto_mut().set_style(property, value);
                Ok(())
            }
        }
    }
}

/// Setter for keys that only live in the configuration map.
pub fn store_only(
    _cx: &mut ApplyContext<'_>,
    _value: &Value,
    _previous: Option<&Value>,
) -> Result<(), RenderError> {
    Ok(())
}

fn class_list(value: &Value) -> Vec<String> {
    match value {
        Value::Str(classes) => classes.split_whitespace().map(str::to_string).collect(),
        Value::List(items) => items.iter().map(ToString::to_string).collect(),
        _ => Vec::new(),
    }
}

fn apply_cls(
    cx: &mut ApplyContext<'_>,
    value: &Value,
    previous: Option<&Value>,
) -> Result<(), RenderError> {
    if let Some(previous) = previous {
        for cls in class_list(previous) {
            cx.remove_cls(&cls)?;
        }
    }
    for cls in class_list(value) {
        cx.add_cls(&cls)?;
    }
    Ok(())
}

fn apply_ui(
    cx: &mut ApplyContext<'_>,
    value: &Value,
    previous: Option<&Value>,
) -> Result<(), RenderError> {
    let base = cx.prefixed(cx.node.widget().base_cls());
    let previous = previous.and_then(Value::as_str).unwrap_or(DEFAULT_UI);
    cx.remove_cls(&format!("{base}-{previous}"))?;
    if let Some(ui) = value.as_str() {
        cx.add_cls(&format!("{base}-{ui}"))?;
    }
    Ok(())
}

/// Toggles the disabled class and aria state.
pub fn apply_disabled(
    cx: &mut ApplyContext<'_>,
    value: &Value,
    _previous: Option<&Value>,
) -> Result<(), RenderError> {
    let cls = cx.prefixed("item-disabled");
    if value.is_truthy() {
        cx.add_cls(&cls)?;
    } else {
        cx.remove_cls(&cls)?;
    }
    if let Some(el) = cx.element() {
        cx.host
            .set_attribute(el, "aria-disabled", if value.is_truthy() { "true" } else { "false" })?;
    }
    Ok(())
}

fn apply_hidden(
    cx: &mut ApplyContext<'_>,
    value: &Value,
    _previous: Option<&Value>,
) -> Result<(), RenderError> {
    cx.set_style("display", if value.is_truthy() { "none" } else { "" })
}

fn apply_style(
    cx: &mut ApplyContext<'_>,
    value: &Value,
    _previous: Option<&Value>,
) -> Result<(), RenderError> {
    let Some(style) = value.as_str() else {
        return Ok(());
    };
    for declaration in style.split(';') {
        if let Some((property, value)) = declaration.split_once(':') {
            cx.set_style(property.trim(), value.trim())?;
        }
    }
    Ok(())
}

fn css_length(value: &Value) -> Option<String> {
    match value {
        Value::Int(px) => Some(format!("{px}px")),
        Value::Float(px) => Some(format!("{px}px")),
        Value::Str(length) if !length.is_empty() => Some(length.clone()),
        _ => None,
    }
}

fn apply_width(
    cx: &mut ApplyContext<'_>,
    value: &Value,
    _previous: Option<&Value>,
) -> Result<(), RenderError> {
    cx.set_style("width", &css_length(value).unwrap_or_default())
}

fn apply_height(
    cx: &mut ApplyContext<'_>,
    value: &Value,
    _previous: Option<&Value>,
) -> Result<(), RenderError> {
    cx.set_style("height", &css_length(value).unwrap_or_default())
}

/// Positions only move a live element; unrendered nodes are positioned on
/// finalize.
fn apply_x(
    cx: &mut ApplyContext<'_>,
    value: &Value,
    _previous: Option<&Value>,
) -> Result<(), RenderError> {
    match cx.element() {
        Some(el) => Ok(cx.host.set_style(el, "left", &css_length(value).unwrap_or_default())?),
        None => Ok(()),
    }
}

fn apply_y(
    cx: &mut ApplyContext<'_>,
    value: &Value,
    _previous: Option<&Value>,
) -> Result<(), RenderError> {
    match cx.element() {
        Some(el) => Ok(cx.host.set_style(el, "top", &css_length(value).unwrap_or_default())?),
        None => Ok(()),
    }
}

/// Before rendering the value is emitted by the content slot; afterwards it
/// replaces the content target's children.
fn apply_html(
    cx: &mut ApplyContext<'_>,
    value: &Value,
    _previous: Option<&Value>,
) -> Result<(), RenderError> {
    if !cx.node.is_rendered() {
        return Ok(());
    }
    match cx.node.content_target() {
        Some(target) => Ok(cx.host.set_text(target, &value.to_string())?),
        None => Ok(()),
    }
}

config_table! {
    /// Entries shared by every widget.
    pub fn component_config_table() {
        "cls" => (Unrendered, apply_cls),
        "style" => (Unrendered, apply_style),
        "html" => (Unrendered, apply_html),
        "width" => (Unrendered, apply_width),
        "height" => (Unrendered, apply_height),
        "x" => (Unrendered, apply_x),
        "y" => (Unrendered, apply_y),
        "frame" => (Unrendered, store_only),
        "rtl" => (Unrendered, store_only),
        "ctCls" => (Unrendered, store_only),
        "ui" => (BeforeRender, apply_ui),
        "disabled" => (Rendered, apply_disabled),
        "hidden" => (Rendered, apply_hidden),
    }
}
