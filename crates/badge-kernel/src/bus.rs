//! Hierarchical publish/subscribe event bus.
//!
//! Listeners live in a trie keyed by path segment. Dispatching an event walks
//! the trie from the root along the event's keypath and invokes the listeners
//! at every visited node, ancestors before descendants and registration order
//! within a node. The first listener to return a [`Reply`] ends the walk and
//! fixes the bus result for the rest of the session.
//!
//! The bus is generic over the dispatch target `C`: listeners receive `&mut C`
//! alongside the event, so they can reach the active screen and the runtime
//! services without the bus owning either.
//!
//! # Session lifecycle
//!
//! A session starts with [`EventBus::clear`]. Infrastructure listeners are
//! registered first, then [`EventBus::mark_baseline`] records how many exist.
//! The bus stays [active](EventBus::is_active) while more listeners than the
//! baseline are registered, and [`EventBus::await_result`] blocks on a
//! caller-supplied poll step until a result appears or the bus goes idle.

use std::collections::HashMap;

use crate::{
    directive::Reply,
    error::BusError,
    event::{Event, Keypath},
};

/// Boxed listener callback.
pub type Callback<C> = Box<dyn FnMut(&mut C, &Event) -> Option<Reply>>;

struct Registration<C> {
    callback: Callback<C>,
    once: bool,
}

struct Node<C> {
    children: HashMap<String, Node<C>>,
    listeners: Vec<Registration<C>>,
}

impl<C> Node<C> {
    fn new() -> Self {
        Self { children: HashMap::new(), listeners: Vec::new() }
    }
}

/// Trie-backed event bus dispatching to listeners over a target `C`.
pub struct EventBus<C> {
    root: Node<C>,
    live: usize,
    baseline: usize,
    result: Option<Reply>,
}

impl<C> Default for EventBus<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> EventBus<C> {
    /// Empty bus.
    pub fn new() -> Self {
        Self { root: Node::new(), live: 0, baseline: 0, result: None }
    }

    /// Register a persistent listener.
    pub fn on<F>(&mut self, path: &str, callback: F) -> Result<(), BusError>
    where
        F: FnMut(&mut C, &Event) -> Option<Reply> + 'static,
    {
        self.register(path, false, callback)
    }

    /// Register a listener that is removed after its first invocation.
    pub fn once<F>(&mut self, path: &str, callback: F) -> Result<(), BusError>
    where
        F: FnMut(&mut C, &Event) -> Option<Reply> + 'static,
    {
        self.register(path, true, callback)
    }

    /// Register a listener at `path`.
    ///
    /// The empty path registers at the root, which sees every event.
    ///
    /// # Errors
    ///
    /// - `BusError::InvalidListener` if any segment is the reserved `_`
    pub fn register<F>(&mut self, path: &str, once: bool, callback: F) -> Result<(), BusError>
    where
        F: FnMut(&mut C, &Event) -> Option<Reply> + 'static,
    {
        let keypath = Keypath::parse(path);
        if keypath.has_reserved() {
            return Err(BusError::InvalidListener { path: path.to_owned() });
        }

        let mut node = &mut self.root;
        for segment in keypath.segments() {
            node = node.children.entry(segment.clone()).or_insert_with(Node::new);
        }
        node.listeners.push(Registration { callback: Box::new(callback), once });
        self.live += 1;
        Ok(())
    }

    /// Dispatch `event` to every listener on its path.
    ///
    /// Returns the session result. If a result is already set, no listener is
    /// invoked and the existing result is returned.
    pub fn dispatch(&mut self, event: &Event, target: &mut C) -> Option<Reply> {
        if self.result.is_some() {
            return self.result.clone();
        }

        let mut segments = event.path().segments().iter();
        let mut node = &mut self.root;
        loop {
            if let Some(reply) = invoke(node, &mut self.live, event, target) {
                tracing::trace!(event = %event.path(), "listener produced result");
                self.result = Some(reply);
                break;
            }

            let Some(segment) = segments.next() else { break };
            let Some(child) = node.children.get_mut(segment) else { break };
            node = child;
        }

        self.result.clone()
    }

    /// Drop every listener and the session result.
    pub fn clear(&mut self) {
        self.root = Node::new();
        self.live = 0;
        self.baseline = 0;
        self.result = None;
    }

    /// Record the current listener count as the idle threshold.
    pub fn mark_baseline(&mut self) {
        self.baseline = self.live;
    }

    /// True while more listeners than the baseline are registered.
    pub fn is_active(&self) -> bool {
        self.live > self.baseline
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.live
    }

    /// Session result, if one was produced.
    pub fn result(&self) -> Option<&Reply> {
        self.result.as_ref()
    }

    /// Take the session result, leaving none.
    pub fn take_result(&mut self) -> Option<Reply> {
        self.result.take()
    }

    /// Forget the session result so dispatching resumes.
    pub fn reset_result(&mut self) {
        self.result = None;
    }

    /// Run `poll_step` until a result appears or the bus goes idle.
    ///
    /// `poll_step` is where the caller suspends (and delivers pending input by
    /// dispatching on the bus it is handed). The bus is checked before the
    /// first step, so an already-set result returns immediately.
    ///
    /// # Errors
    ///
    /// Propagates the first error returned by `poll_step`.
    pub fn await_result<E, F>(&mut self, mut poll_step: F) -> Result<Option<Reply>, E>
    where
        F: FnMut(&mut Self) -> Result<(), E>,
    {
        while self.result.is_none() && self.is_active() {
            poll_step(self)?;
        }
        Ok(self.result.clone())
    }
}

fn invoke<C>(
    node: &mut Node<C>,
    live: &mut usize,
    event: &Event,
    target: &mut C,
) -> Option<Reply> {
    let mut index = 0;
    while index < node.listeners.len() {
        let registration = &mut node.listeners[index];
        let once = registration.once;
        let reply = (registration.callback)(target, event);

        if once {
            node.listeners.remove(index);
            *live = live.saturating_sub(1);
        } else {
            index += 1;
        }

        if reply.is_some() {
            return reply;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directive::Directive;

    type Trace = Vec<&'static str>;

    fn event(name: &str) -> Event {
        Event::new(name).expect("valid event name")
    }

    fn record(label: &'static str) -> impl FnMut(&mut Trace, &Event) -> Option<Reply> {
        move |trace, _| {
            trace.push(label);
            None
        }
    }

    #[test]
    fn ancestors_before_descendants() {
        let mut bus = EventBus::new();
        bus.on("input.up.console.b", record("leaf")).unwrap();
        bus.on("input", record("input")).unwrap();
        bus.on("", record("root")).unwrap();
        bus.on("input.up", record("up-1")).unwrap();
        bus.on("input.up", record("up-2")).unwrap();

        let mut trace = Trace::new();
        assert_eq!(bus.dispatch(&event("input.up.console.b"), &mut trace), None);
        assert_eq!(trace, ["root", "input", "up-1", "up-2", "leaf"]);
    }

    #[test]
    fn first_result_stops_the_walk() {
        let mut bus = EventBus::new();
        bus.on("input", |trace: &mut Trace, _| {
            trace.push("input");
            Some(Directive::Reload.into())
        })
        .unwrap();
        bus.on("input.up", record("up")).unwrap();

        let mut trace = Trace::new();
        let reply = bus.dispatch(&event("input.up"), &mut trace);
        assert_eq!(reply, Some(Reply::Directive(Directive::Reload)));
        assert_eq!(trace, ["input"]);
    }

    #[test]
    fn result_is_write_once() {
        let mut bus = EventBus::new();
        bus.on("a", |_: &mut Trace, _| Some(Directive::Exit.into())).unwrap();
        bus.on("b", |_: &mut Trace, _| Some(Directive::Reload.into())).unwrap();

        let mut trace = Trace::new();
        bus.dispatch(&event("a"), &mut trace);
        assert_eq!(bus.dispatch(&event("b"), &mut trace), Some(Directive::Exit.into()));

        bus.reset_result();
        assert_eq!(bus.dispatch(&event("b"), &mut trace), Some(Directive::Reload.into()));
    }

    #[test]
    fn once_listener_fires_once() {
        let mut bus = EventBus::new();
        bus.once("tick", record("once")).unwrap();
        bus.on("tick", record("always")).unwrap();
        assert_eq!(bus.listener_count(), 2);

        let mut trace = Trace::new();
        bus.dispatch(&event("tick"), &mut trace);
        bus.dispatch(&event("tick"), &mut trace);
        assert_eq!(trace, ["once", "always", "always"]);
        assert_eq!(bus.listener_count(), 1);
    }

    #[test]
    fn reserved_segment_rejected() {
        let mut bus: EventBus<Trace> = EventBus::new();
        assert_eq!(
            bus.on("input._", record("x")),
            Err(BusError::InvalidListener { path: "input._".into() })
        );
        assert_eq!(bus.listener_count(), 0);
    }

    #[test]
    fn unrelated_paths_not_invoked() {
        let mut bus = EventBus::new();
        bus.on("input.down", record("down")).unwrap();
        bus.on("input.up.console.a", record("a")).unwrap();

        let mut trace = Trace::new();
        bus.dispatch(&event("input.up.console.b"), &mut trace);
        assert!(trace.is_empty());
    }

    #[test]
    fn baseline_tracks_activity() {
        let mut bus = EventBus::new();
        bus.on("input.char", record("relay")).unwrap();
        bus.mark_baseline();
        assert!(!bus.is_active());

        bus.once("input.up", record("screen")).unwrap();
        assert!(bus.is_active());

        let mut trace = Trace::new();
        bus.dispatch(&event("input.up"), &mut trace);
        assert!(!bus.is_active());

        bus.clear();
        assert_eq!(bus.listener_count(), 0);
        assert!(!bus.is_active());
    }

    #[test]
    fn await_returns_when_idle_or_resolved() {
        let mut bus: EventBus<Trace> = EventBus::new();
        let idle: Result<_, ()> = bus.await_result(|_| panic!("idle bus must not poll"));
        assert_eq!(idle, Ok(None));

        bus.on("key", |_, _| Some(Directive::Exit.into())).unwrap();
        let mut polls = 0;
        let resolved: Result<_, ()> = bus.await_result(|bus| {
            polls += 1;
            let mut trace = Trace::new();
            bus.dispatch(&event("key"), &mut trace);
            Ok(())
        });
        assert_eq!(resolved, Ok(Some(Directive::Exit.into())));
        assert_eq!(polls, 1);
    }

    #[test]
    fn await_propagates_poll_errors() {
        let mut bus: EventBus<Trace> = EventBus::new();
        bus.on("key", record("key")).unwrap();
        let outcome = bus.await_result(|_| Err("interrupted"));
        assert_eq!(outcome, Err("interrupted"));
    }
}
