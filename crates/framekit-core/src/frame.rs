//! Frame geometry lookup for hosts without native rounded corners.
//!
//! Style sheets publish a packed [`FrameInfo`] encoding through a computed
//! style property of a `{base}-{ui}-frameInfo` class. The resolver reads it
//! off a single offscreen proxy element and memoizes the decoded record per
//! style key, negative results included.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use ahash::RandomState;
use hashbrown::{HashMap, HashSet};

use crate::engine_config::EngineConfig;
use crate::markup::ElementMarkup;
use crate::platform::{ElementId, Host};
use crate::{FrameInfo, RenderError};

/// Visual style a frame encoding is published for: `{base}-{ui}`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StyleKey(String);

impl StyleKey {
    /// `base_cls` must already carry the css prefix.
    pub fn new(base_cls: &str, ui: &str) -> Self {
        StyleKey(format!("{base_cls}-{ui}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Class the style sheet attaches the encoding to.
    pub fn proxy_class(&self) -> String {
        format!("{}-frameInfo", self.0)
    }
}

impl fmt::Display for StyleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Append-only cache of decoded frame records keyed by style.
///
/// Clones share storage, so one cache can serve several trees.
#[derive(Clone, Default)]
pub struct FrameInfoCache {
    entries: Rc<RefCell<HashMap<StyleKey, Option<Rc<FrameInfo>>, RandomState>>>,
}

impl FrameInfoCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// `Some(None)` is a cached negative result.
    pub fn get(&self, key: &StyleKey) -> Option<Option<Rc<FrameInfo>>> {
        self.entries.borrow().get(key).cloned()
    }

    /// Stores `info` unless the key is already cached; returns the entry
    /// that is cached afterwards.
    pub fn insert(&self, key: StyleKey, info: Option<FrameInfo>) -> Option<Rc<FrameInfo>> {
        self.entries
            .borrow_mut()
            .entry(key)
            .or_insert_with(|| info.map(Rc::new))
            .clone()
    }

    pub fn contains(&self, key: &StyleKey) -> bool {
        self.entries.borrow().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl fmt::Debug for FrameInfoCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameInfoCache")
            .field("len", &self.len())
            .finish()
    }
}

pub struct FrameGeometryResolver {
    cache: FrameInfoCache,
    proxy: Option<ElementId>,
    property: String,
    warn_missing: bool,
    /// Keys already warned about.
    warned: HashSet<StyleKey, RandomState>,
}

impl FrameGeometryResolver {
    pub fn new(cache: FrameInfoCache, config: &EngineConfig) -> Self {
        Self {
            cache,
            proxy: None,
            property: config.frame_info_property.clone(),
            warn_missing: config.warn_missing_frame,
            warned: HashSet::default(),
        }
    }

    pub fn cache(&self) -> &FrameInfoCache {
        &self.cache
    }

    pub fn proxy(&self) -> Option<ElementId> {
        self.proxy
    }

    /// Frame record for `key`, or `None` when the style has no encoding.
    /// `explicit` marks a frame the caller asked for by configuration; a
    /// missing encoding is then worth a warning.
    pub fn resolve(
        &mut self,
        host: &mut dyn Host,
        key: &StyleKey,
        explicit: bool,
    ) -> Result<Option<Rc<FrameInfo>>, RenderError> {
        let info = match self.cache.get(key) {
            Some(cached) => cached,
            None => {
                let decoded = self.read_encoding(host, key)?;
                self.cache.insert(key.clone(), decoded)
            }
        };
        if info.is_none() && explicit && self.warn_missing && self.warned.insert(key.clone()) {
            log::warn!("frame requested for {key} but the style sheet publishes no frame encoding");
        }
        Ok(info)
    }

    fn read_encoding(
        &mut self,
        host: &mut dyn Host,
        key: &StyleKey,
    ) -> Result<Option<FrameInfo>, RenderError> {
        let proxy = self.style_proxy(host)?;
        host.set_class_name(proxy, &key.proxy_class())?;
        let Some(encoded) = host.computed_style(proxy, &self.property) else {
            return Ok(None);
        };
        match FrameInfo::decode(&encoded) {
            Ok(info) => {
                log::trace!("frame info for {key}: {}", info.encode());
                Ok(Some(info))
            }
            Err(err) => {
                log::debug!("no frame info for {key}: {err}");
                Ok(None)
            }
        }
    }

    fn style_proxy(&mut self, host: &mut dyn Host) -> Result<ElementId, RenderError> {
        if let Some(proxy) = self.proxy {
            return Ok(proxy);
        }
        let markup = ElementMarkup::new("div")
            .with_attr("data-sticky", "true")
            .with_attr("role", "presentation")
            .with_style("position", "absolute")
            .with_style("top", "-10000px");
        let proxy = host.create(&markup.into())?;
        let body = host.body();
        host.append(body, proxy)?;
        self.proxy = Some(proxy);
        Ok(proxy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_host::MemoryHost;

    #[test]
    fn resolves_once_per_style_key() {
        let mut host = MemoryHost::without_rounded_corners();
        host.add_rule("x-panel-default-frameInfo", "font-family", "dh-2-2-2-2-1-1-1-1-3-3-3-3");
        let cache = FrameInfoCache::new();
        let mut resolver = FrameGeometryResolver::new(cache.clone(), &EngineConfig::default());
        let key = StyleKey::new("x-panel", "default");

        let first = resolver.resolve(&mut host, &key, true).unwrap().unwrap();
        host.add_rule("x-panel-default-frameInfo", "font-family", "th-9-9-9-9-9-9-9-9-9-9-9-9");
        let second = resolver.resolve(&mut host, &key, true).unwrap().unwrap();
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(first.extent.to_array(), [2, 2, 2, 2]);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn missing_encoding_is_cached_as_negative() {
        let mut host = MemoryHost::without_rounded_corners();
        let mut resolver =
            FrameGeometryResolver::new(FrameInfoCache::new(), &EngineConfig::default());
        let key = StyleKey::new("x-btn", "default");
        assert_eq!(resolver.resolve(&mut host, &key, true).unwrap(), None);
        host.add_rule("x-btn-default-frameInfo", "font-family", "dh-2-2-2-2-1-1-1-1-3-3-3-3");
        assert_eq!(resolver.resolve(&mut host, &key, false).unwrap(), None);
        assert_eq!(resolver.cache().get(&key), Some(None));
    }

    #[test]
    fn missing_encoding_warns_once_per_style() {
        let mut host = MemoryHost::without_rounded_corners();
        let mut resolver =
            FrameGeometryResolver::new(FrameInfoCache::new(), &EngineConfig::default());
        let btn = StyleKey::new("x-btn", "default");
        let panel = StyleKey::new("x-panel", "default");

        resolver.resolve(&mut host, &btn, false).unwrap();
        assert!(resolver.warned.is_empty());
        for _ in 0..3 {
            resolver.resolve(&mut host, &btn, true).unwrap();
        }
        resolver.resolve(&mut host, &panel, true).unwrap();
        assert_eq!(resolver.warned.len(), 2);

        let mut quiet = FrameGeometryResolver::new(
            FrameInfoCache::new(),
            &EngineConfig::default().with_missing_frame_warning(false),
        );
        quiet.resolve(&mut host, &btn, true).unwrap();
        assert!(quiet.warned.is_empty());
    }

    #[test]
    fn proxy_is_created_once_offscreen() {
        let mut host = MemoryHost::without_rounded_corners();
        let mut resolver =
            FrameGeometryResolver::new(FrameInfoCache::new(), &EngineConfig::default());
        resolver
            .resolve(&mut host, &StyleKey::new("x-a", "default"), false)
            .unwrap();
        let proxy = resolver.proxy().unwrap();
        resolver
            .resolve(&mut host, &StyleKey::new("x-b", "default"), false)
            .unwrap();
        assert_eq!(resolver.proxy(), Some(proxy));
        assert_eq!(host.inline_style(proxy, "top"), Some("-10000px"));
        assert_eq!(host.attribute(proxy, "data-sticky"), Some("true"));
    }
}
