//! The rule engine: registry, state, element bindings and the frame-driven
//! match pass.
//!
//! Public calls only record intent (new rules, new state) and schedule a frame.
//! Matching and applying happen in the frame callback, or in
//! [`RuleEngine::flush`], always against the latest state.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Weak};

use focss_core::logging::{span_names, targets};
use focss_core::{
    Document, ElementId, FrameRequestId, FrameScheduler, MutationKind, MutationObserver,
    MutationRecord, SharedDocument,
};
use parking_lot::Mutex;

use super::binding::ElementBinding;
use super::cascade::cascade_properties;
use crate::config::{DestroyPolicy, EngineConfig};
use crate::operator::{InlineStyleOperator, PropertyMap, StyleOperator};
use crate::rules::{PropertyBinding, RuleHandle, RuleRegistry};
use crate::state::State;
use crate::template::SelectorTemplate;
use crate::{Error, Result};

/// Lifecycle of a [`RuleEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStatus {
    /// No state has been processed; nothing is matched or applied.
    Uninitialized,
    /// State is present; rules are matched and applied each frame.
    Ready,
    /// Torn down; every further call fails.
    Destroyed,
}

/// Engine state guarded by one lock.
struct EngineCore<O> {
    status: EngineStatus,
    config: EngineConfig,
    operator: O,
    rules: RuleRegistry,
    state: Option<State>,
    bindings: HashMap<ElementId, ElementBinding>,
    full_pass: bool,
    root: ElementId,
    observer: Option<MutationObserver>,
}

/// Everything the frame callback and the observer waker need to reach.
struct Shared<O> {
    core: Mutex<EngineCore<O>>,
    document: SharedDocument,
    scheduler: FrameScheduler,
    frame_request: Mutex<Option<FrameRequestId>>,
}

/// Reactively applies templated rules to a document.
///
/// # Example
///
/// ```
/// use focss::{RuleEngine, State};
/// use focss_core::{FrameScheduler, SharedDocument, StyleSurface};
///
/// let document = SharedDocument::new();
/// let scheduler = FrameScheduler::new();
/// let engine = RuleEngine::new(document.clone(), scheduler.clone()).unwrap();
///
/// let div = document.with_write(|doc| {
///     let root = doc.root();
///     let div = doc.append_element(root, "div")?;
///     doc.add_class(div, "bar")?;
///     Ok::<_, focss_core::DomError>(div)
/// })
/// .unwrap();
///
/// engine.insert(".${foo}", [("max-width", "width")]).unwrap();
/// engine.process(State::new().with("foo", "bar").with("width", 100)).unwrap();
///
/// scheduler.run_frame();
/// let width = document.with_read(|doc| {
///     doc.style(div).unwrap().get_property_value("max-width").to_string()
/// });
/// assert_eq!(width, "100px");
/// ```
pub struct RuleEngine<O: StyleOperator + 'static = InlineStyleOperator> {
    shared: Arc<Shared<O>>,
}

impl RuleEngine<InlineStyleOperator> {
    /// Create an engine with the default configuration and operator.
    pub fn new(document: SharedDocument, scheduler: FrameScheduler) -> Result<Self> {
        Self::with_config(document, scheduler, EngineConfig::default())
    }

    /// Create an engine with the default operator.
    pub fn with_config(
        document: SharedDocument,
        scheduler: FrameScheduler,
        config: EngineConfig,
    ) -> Result<Self> {
        Self::with_operator(document, scheduler, config, InlineStyleOperator::default())
    }
}

impl<O: StyleOperator + 'static> RuleEngine<O> {
    /// Create an engine writing through `operator`.
    ///
    /// Observes the whole document; mutations schedule a frame.
    pub fn with_operator(
        document: SharedDocument,
        scheduler: FrameScheduler,
        config: EngineConfig,
        operator: O,
    ) -> Result<Self> {
        let root = document.read().root();
        let shared = Arc::new(Shared {
            core: Mutex::new(EngineCore {
                status: EngineStatus::Uninitialized,
                config,
                operator,
                rules: RuleRegistry::new(),
                state: None,
                bindings: HashMap::new(),
                full_pass: false,
                root,
                observer: None,
            }),
            document,
            scheduler,
            frame_request: Mutex::new(None),
        });

        let weak = Arc::downgrade(&shared);
        let observer = shared.document.write().observe(root, move || {
            if let Some(shared) = weak.upgrade() {
                Shared::schedule(&shared);
            }
        })?;
        shared.core.lock().observer = Some(observer);

        tracing::debug!(target: targets::ENGINE, ?root, "rule engine created");
        Ok(Self { shared })
    }

    /// Register a rule mapping dash-case properties to state keys.
    ///
    /// Nothing is applied synchronously. Once the engine is ready the rule is
    /// resolved against the current state and applied on the next frame.
    pub fn insert<I, P, K>(&self, selector: &str, properties: I) -> Result<RuleHandle>
    where
        I: IntoIterator<Item = (P, K)>,
        P: Into<String>,
        K: Into<String>,
    {
        let mut guard = self.shared.core.lock();
        let core = &mut *guard;
        core.ensure_alive()?;

        let properties: Vec<PropertyBinding> = properties
            .into_iter()
            .map(|(property, state_key)| {
                let property: String = property.into();
                let key = core.operator.internal_key(&property);
                PropertyBinding::new(property, key, state_key)
            })
            .collect();
        let handle = core
            .rules
            .insert(SelectorTemplate::parse(selector), properties);
        tracing::debug!(target: targets::ENGINE, ?handle, %selector, "rule inserted");

        if core.status == EngineStatus::Ready {
            if let Some(rule) = core.rules.get_mut(handle) {
                rule.resolve(core.state.as_ref());
            }
            core.full_pass = true;
            Shared::schedule(&self.shared);
        }
        Ok(handle)
    }

    /// Unregister a rule. Elements it styled are re-diffed on the next frame.
    pub fn remove(&self, handle: RuleHandle) -> Result<()> {
        let mut core = self.shared.core.lock();
        core.ensure_alive()?;
        core.rules.remove(handle).ok_or(Error::UnknownRule(handle))?;
        tracing::debug!(target: targets::ENGINE, ?handle, "rule removed");

        if core.status == EngineStatus::Ready {
            core.full_pass = true;
            Shared::schedule(&self.shared);
        }
        Ok(())
    }

    /// Replace the state, resolve every rule and schedule a full pass.
    ///
    /// Calls made before the next frame coalesce: only the latest state is
    /// ever applied.
    pub fn process(&self, state: State) -> Result<()> {
        let mut guard = self.shared.core.lock();
        let core = &mut *guard;
        core.ensure_alive()?;

        core.state = Some(state);
        core.rules.resolve_all(core.state.as_ref());
        core.full_pass = true;
        if core.status == EngineStatus::Uninitialized {
            core.status = EngineStatus::Ready;
            tracing::info!(target: targets::ENGINE, rules = core.rules.len(), "rule engine ready");
        }
        Shared::schedule(&self.shared);
        Ok(())
    }

    /// Run the pending pass now instead of on the next frame.
    pub fn flush(&self) -> Result<()> {
        let mut core = self.shared.core.lock();
        core.ensure_alive()?;
        self.shared.cancel_frame();
        core.run_pass(&self.shared.document);
        Ok(())
    }

    /// Tear the engine down.
    ///
    /// Disconnects the observer, cancels the pending frame and drops every
    /// rule and binding. Applied styles stay unless the configuration says
    /// [`DestroyPolicy::Revert`].
    pub fn destroy(&self) -> Result<()> {
        let mut guard = self.shared.core.lock();
        let core = &mut *guard;
        core.ensure_alive()?;

        if let Some(observer) = core.observer.take() {
            observer.disconnect();
        }

        let bindings = std::mem::take(&mut core.bindings);
        if core.config.destroy_policy == DestroyPolicy::Revert {
            let mut document = self.shared.document.write();
            for (element, binding) in bindings {
                core.revert(&mut document, element, &binding.applied);
            }
        }

        core.rules.clear();
        core.state = None;
        core.full_pass = false;
        core.status = EngineStatus::Destroyed;
        self.shared.cancel_frame();

        tracing::info!(target: targets::ENGINE, "rule engine destroyed");
        Ok(())
    }

    /// Current lifecycle status.
    pub fn status(&self) -> EngineStatus {
        self.shared.core.lock().status
    }

    /// Number of registered rules.
    pub fn rule_count(&self) -> usize {
        self.shared.core.lock().rules.len()
    }

    /// Number of elements the engine currently tracks.
    pub fn binding_count(&self) -> usize {
        self.shared.core.lock().bindings.len()
    }

    /// What the engine last applied to `element`.
    pub fn applied(&self, element: ElementId) -> Option<PropertyMap> {
        self.shared
            .core
            .lock()
            .bindings
            .get(&element)
            .map(|binding| binding.applied.clone())
    }

    /// Rules matching `element` as of the last pass, lowest priority first.
    pub fn matched_rules(&self, element: ElementId) -> Vec<RuleHandle> {
        self.shared
            .core
            .lock()
            .bindings
            .get(&element)
            .map(|binding| binding.matched.clone())
            .unwrap_or_default()
    }

    /// The last processed state.
    pub fn state(&self) -> Option<State> {
        self.shared.core.lock().state.clone()
    }

    /// The engine configuration.
    pub fn config(&self) -> EngineConfig {
        self.shared.core.lock().config.clone()
    }

    /// Whether a frame callback is queued.
    pub fn has_pending_frame(&self) -> bool {
        self.shared.frame_request.lock().is_some()
    }

    /// The document this engine styles.
    pub fn document(&self) -> &SharedDocument {
        &self.shared.document
    }
}

impl<O: StyleOperator + 'static> Drop for RuleEngine<O> {
    fn drop(&mut self) {
        if let Some(observer) = self.shared.core.lock().observer.take() {
            observer.disconnect();
        }
        self.shared.cancel_frame();
    }
}

impl<O: StyleOperator + 'static> std::fmt::Debug for RuleEngine<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let core = self.shared.core.lock();
        f.debug_struct("RuleEngine")
            .field("status", &core.status)
            .field("rules", &core.rules.len())
            .field("bindings", &core.bindings.len())
            .finish()
    }
}

impl<O: StyleOperator + 'static> Shared<O> {
    /// Queue one frame callback unless one is already pending.
    ///
    /// Runs from the observer waker while the document is locked, so it must
    /// not touch the engine core or the document.
    fn schedule(shared: &Arc<Self>) {
        let mut request = shared.frame_request.lock();
        if request.is_some() {
            return;
        }
        let weak: Weak<Self> = Arc::downgrade(shared);
        *request = Some(shared.scheduler.request_frame(move |frame| {
            if let Some(shared) = weak.upgrade() {
                shared.on_frame(frame);
            }
        }));
    }

    fn cancel_frame(&self) {
        if let Some(id) = self.frame_request.lock().take() {
            self.scheduler.cancel(id);
        }
    }

    fn on_frame(&self, frame: u64) {
        *self.frame_request.lock() = None;
        let mut core = self.core.lock();
        if core.status == EngineStatus::Destroyed {
            tracing::trace!(target: targets::ENGINE, frame, "frame after destroy ignored");
            return;
        }
        core.run_pass(&self.document);
    }
}

impl<O: StyleOperator> EngineCore<O> {
    fn ensure_alive(&self) -> Result<()> {
        match self.status {
            EngineStatus::Destroyed => Err(Error::Destroyed),
            _ => Ok(()),
        }
    }

    /// Drain mutation records and bring element styles up to date.
    fn run_pass(&mut self, document: &SharedDocument) {
        let records = self
            .observer
            .as_ref()
            .map(MutationObserver::take_records)
            .unwrap_or_default();

        if self.status != EngineStatus::Ready {
            if !records.is_empty() {
                tracing::trace!(
                    target: targets::ENGINE,
                    records = records.len(),
                    "mutations before first process discarded"
                );
            }
            return;
        }
        if !self.full_pass && records.is_empty() {
            return;
        }

        let span = tracing::debug_span!(
            target: targets::ENGINE,
            span_names::MATCH_PASS,
            full = self.full_pass,
            records = records.len()
        );
        let _enter = span.enter();

        let mut document = document.write();
        self.bindings.retain(|element, _| document.contains(*element));

        let (rematch, detached) = if std::mem::take(&mut self.full_pass) {
            let live = document.subtree(self.root).unwrap_or_default();
            let live_set: HashSet<ElementId> = live.iter().copied().collect();
            let stale: BTreeSet<ElementId> = self
                .bindings
                .keys()
                .filter(|element| !live_set.contains(element))
                .copied()
                .collect();
            (live.into_iter().collect::<BTreeSet<_>>(), stale)
        } else {
            affected_elements(&document, self.root, &records)
        };

        for element in &detached {
            if let Some(binding) = self.bindings.remove(element) {
                self.revert(&mut document, *element, &binding.applied);
            }
        }
        let mut changed = 0;
        for element in &rematch {
            if self.match_element(&mut document, *element) {
                changed += 1;
            }
        }

        tracing::debug!(
            target: targets::ENGINE,
            matched = rematch.len(),
            detached = detached.len(),
            changed,
            "match pass complete"
        );
    }

    /// Recompute and apply one element. Returns whether its style changed.
    fn match_element(&mut self, document: &mut Document, element: ElementId) -> bool {
        let Some(state) = self.state.as_ref() else {
            return false;
        };

        let matched = self.rules.matching(document, element);
        let mut incoming = PropertyMap::new();
        for (handle, _) in &matched {
            if let Some(rule) = self.rules.get(*handle) {
                cascade_properties(&mut incoming, rule, state, &self.config);
            }
        }

        let previous = self.bindings.remove(&element).unwrap_or_default();
        let changed = incoming != previous.applied;
        if changed {
            match document.style_mut(element) {
                Ok(style) => {
                    tracing::trace!(target: targets::ENGINE, ?element, ?incoming, "apply");
                    self.operator.apply(style, &incoming, &previous.applied);
                }
                Err(err) => {
                    tracing::debug!(target: targets::ENGINE, %err, "element vanished");
                    return false;
                }
            }
        }

        let binding = ElementBinding {
            applied: incoming,
            matched: matched.into_iter().map(|(handle, _)| handle).collect(),
        };
        if !binding.is_empty() {
            self.bindings.insert(element, binding);
        }
        changed
    }

    /// Clear what the engine applied to `element`, if it still exists.
    fn revert(&self, document: &mut Document, element: ElementId, applied: &PropertyMap) {
        if let Ok(style) = document.style_mut(element) {
            tracing::trace!(target: targets::ENGINE, ?element, "revert");
            self.operator.apply(style, &PropertyMap::new(), applied);
        }
    }
}

/// Elements to re-match and elements to clear, given a batch of records.
///
/// Attribute changes can flip descendant and sibling selectors, so they
/// re-match the target's subtree and every following sibling's subtree.
/// Insertions and removals change sibling positions and the parent's child
/// count, so they re-match the parent's whole subtree. Elements that ended up
/// outside `root` are cleared, whatever the records say happened in between.
fn affected_elements(
    document: &Document,
    root: ElementId,
    records: &[MutationRecord],
) -> (BTreeSet<ElementId>, BTreeSet<ElementId>) {
    let mut rematch = BTreeSet::new();
    let mut detached = BTreeSet::new();
    let live = |element: ElementId| {
        document.contains(element) && document.is_inclusive_ancestor(root, element)
    };

    for record in records {
        if let MutationKind::Added { parent } | MutationKind::Removed { parent } = record.kind {
            if live(parent) {
                rematch.extend(document.subtree(parent).unwrap_or_default());
            }
        }

        let target = record.target;
        if !document.contains(target) {
            continue;
        }
        if !document.is_inclusive_ancestor(root, target) {
            detached.extend(document.subtree(target).unwrap_or_default());
            continue;
        }

        rematch.extend(document.subtree(target).unwrap_or_default());
        if let MutationKind::Attribute { .. } = record.kind {
            for sibling in document.next_siblings(target).unwrap_or_default() {
                rematch.extend(document.subtree(sibling).unwrap_or_default());
            }
        }
    }

    // A node moved out and back in is live.
    detached.retain(|element| !rematch.contains(element));
    (rematch, detached)
}
