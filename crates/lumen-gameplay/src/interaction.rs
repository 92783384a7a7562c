//! Proximity-gated interactables and the actor's interaction focus.
//!
//! An actor focuses the nearest interactable on request. The focused
//! interactable then tracks the actor on its own: it fires its effect once
//! the actor is inside its radius and drops the focus once the actor leaves.

use std::collections::{HashMap, VecDeque};
use std::fmt;

use glam::Vec2;
use lumen_common::{ConfigError, ConfigResult, EntityId, LayerMask};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::INTERACTABLE_LAYER;

/// Effect fired when a focused actor reaches an interactable.
pub trait InteractionEffect: fmt::Debug {
    /// Runs the effect.
    fn interact(&mut self, interactable: EntityId, actor: EntityId);
}

/// Effect that only logs, for interactables with nothing else to do.
#[derive(Debug, Clone, Default)]
pub struct LogInteraction {
    /// Name used in the log line
    pub name: String,
}

impl LogInteraction {
    /// Creates a named logging effect.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl InteractionEffect for LogInteraction {
    fn interact(&mut self, interactable: EntityId, actor: EntityId) {
        debug!(name = %self.name, %interactable, %actor, "interacting");
    }
}

/// Resolves actor positions without holding on to the actors.
pub trait ActorLocator {
    /// Current position of an actor, or `None` if it no longer exists.
    fn actor_position(&self, actor: EntityId) -> Option<Vec2>;
}

impl ActorLocator for HashMap<EntityId, Vec2> {
    fn actor_position(&self, actor: EntityId) -> Option<Vec2> {
        self.get(&actor).copied()
    }
}

/// State of a focus, from focus until defocus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusSession {
    /// Actor that focused the interactable
    pub owner: EntityId,
    /// Whether the effect already fired in this session
    pub has_interacted: bool,
}

/// Something that happened to an interactable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractableEvent {
    /// Focus session started
    Focused {
        /// Interactable
        interactable: EntityId,
        /// Actor that focused it
        owner: EntityId,
    },
    /// Effect fired
    Interacted {
        /// Interactable
        interactable: EntityId,
        /// Actor that triggered it
        owner: EntityId,
    },
    /// Focus session ended
    Defocused {
        /// Interactable
        interactable: EntityId,
    },
}

/// A point in the world that reacts to a focusing actor.
#[derive(Debug)]
pub struct Interactable {
    id: EntityId,
    position: Vec2,
    radius: f32,
    layer: LayerMask,
    session: Option<FocusSession>,
    effect: Box<dyn InteractionEffect>,
    events: VecDeque<InteractableEvent>,
}

impl Interactable {
    /// Default trigger radius.
    pub const DEFAULT_RADIUS: f32 = 5.0;

    /// Undelivered events kept between [`Self::update`] calls; older ones are dropped.
    pub const MAX_PENDING_EVENTS: usize = 32;

    /// Creates an interactable on every layer.
    #[must_use]
    pub fn new(position: Vec2, radius: f32, effect: Box<dyn InteractionEffect>) -> Self {
        Self {
            id: EntityId::new(),
            position,
            radius,
            layer: LayerMask::ALL,
            session: None,
            effect,
            events: VecDeque::new(),
        }
    }

    /// Restricts the interactable to a layer.
    #[must_use]
    pub fn with_layer(mut self, layer: LayerMask) -> Self {
        self.layer = layer;
        self
    }

    /// Interactable id.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Position.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Trigger radius.
    #[must_use]
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Layer.
    #[must_use]
    pub fn layer(&self) -> LayerMask {
        self.layer
    }

    /// Current session.
    #[must_use]
    pub fn session(&self) -> Option<FocusSession> {
        self.session
    }

    /// Whether a session is live.
    #[must_use]
    pub fn is_focused(&self) -> bool {
        self.session.is_some()
    }

    /// Owner of the live session.
    #[must_use]
    pub fn focused_by(&self) -> Option<EntityId> {
        self.session.map(|s| s.owner)
    }

    /// Starts a fresh session for `owner`.
    pub fn on_focused(&mut self, owner: EntityId) {
        self.session = Some(FocusSession {
            owner,
            has_interacted: false,
        });
        debug!(interactable = %self.id, %owner, "focused");
        self.push_event(InteractableEvent::Focused {
            interactable: self.id,
            owner,
        });
    }

    /// Ends the session, if any.
    pub fn on_defocused(&mut self) {
        if self.session.take().is_some() {
            debug!(interactable = %self.id, "defocused");
            self.push_event(InteractableEvent::Defocused {
                interactable: self.id,
            });
        }
    }

    /// Per-tick proximity check against the session owner.
    ///
    /// Returns every event since the previous call, including focus changes
    /// made through [`InteractionFocus`].
    pub fn update(&mut self, locator: &dyn ActorLocator) -> Vec<InteractableEvent> {
        if let Some(session) = self.session {
            match locator.actor_position(session.owner) {
                None => self.on_defocused(),
                Some(actor) => {
                    let distance = actor.distance(self.position);
                    if distance <= self.radius && !session.has_interacted {
                        self.session = Some(FocusSession {
                            has_interacted: true,
                            ..session
                        });
                        self.effect.interact(self.id, session.owner);
                        self.push_event(InteractableEvent::Interacted {
                            interactable: self.id,
                            owner: session.owner,
                        });
                    }
                    if distance > self.radius {
                        self.on_defocused();
                    }
                }
            }
        }

        self.events.drain(..).collect()
    }

    /// Events queued since the previous [`Self::update`].
    #[must_use]
    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    fn push_event(&mut self, event: InteractableEvent) {
        if self.events.len() == Self::MAX_PENDING_EVENTS {
            let dropped = self.events.pop_front();
            debug!(interactable = %self.id, ?dropped, "event queue full");
        }
        self.events.push_back(event);
    }
}

/// Lookup of interactables for focus requests.
pub trait InteractableDirectory {
    /// Interactables on `mask` within `radius` of `center`, in a stable order.
    fn interactables_near(&self, center: Vec2, radius: f32, mask: LayerMask) -> Vec<EntityId>;

    /// Position of an interactable.
    fn position_of(&self, interactable: EntityId) -> Option<Vec2>;

    /// Mutable access to an interactable.
    fn interactable_mut(&mut self, interactable: EntityId) -> Option<&mut Interactable>;
}

/// Owned list of interactables.
#[derive(Debug, Default)]
pub struct InteractableSet {
    items: Vec<Interactable>,
}

impl InteractableSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an interactable and returns its id.
    pub fn insert(&mut self, interactable: Interactable) -> EntityId {
        let id = interactable.id();
        self.items.push(interactable);
        id
    }

    /// Looks up an interactable.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Interactable> {
        self.items.iter().find(|i| i.id() == id)
    }

    /// Runs every interactable's proximity check.
    pub fn update_all(&mut self, locator: &dyn ActorLocator) -> Vec<InteractableEvent> {
        self.items
            .iter_mut()
            .flat_map(|i| i.update(locator))
            .collect()
    }
}

impl InteractableDirectory for InteractableSet {
    fn interactables_near(&self, center: Vec2, radius: f32, mask: LayerMask) -> Vec<EntityId> {
        self.items
            .iter()
            .filter(|i| i.layer().intersects(mask) && i.position().distance(center) <= radius)
            .map(Interactable::id)
            .collect()
    }

    fn position_of(&self, interactable: EntityId) -> Option<Vec2> {
        self.get(interactable).map(Interactable::position)
    }

    fn interactable_mut(&mut self, interactable: EntityId) -> Option<&mut Interactable> {
        self.items.iter_mut().find(|i| i.id() == interactable)
    }
}

/// Focus search tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Search radius around the actor
    pub detect_distance: f32,
    /// Layers searched
    pub mask: LayerMask,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            detect_distance: 2.0,
            mask: INTERACTABLE_LAYER,
        }
    }
}

impl InteractionConfig {
    /// Validates the search radius.
    pub fn validate(&self) -> ConfigResult<()> {
        if !(self.detect_distance >= 0.0) {
            return Err(ConfigError::invalid(
                "interaction.detect_distance",
                format!("must not be negative, got {}", self.detect_distance),
            ));
        }
        Ok(())
    }
}

/// The interactable an actor currently focuses.
#[derive(Debug, Clone, Default)]
pub struct InteractionFocus {
    config: InteractionConfig,
    current: Option<EntityId>,
}

impl InteractionFocus {
    /// Creates an empty focus.
    #[must_use]
    pub fn new(config: InteractionConfig) -> Self {
        Self {
            config,
            current: None,
        }
    }

    /// Interactable last focused by this actor.
    #[must_use]
    pub fn current(&self) -> Option<EntityId> {
        self.current
    }

    /// Nearest interactable within the detection distance.
    ///
    /// Ties keep the first one encountered.
    #[must_use]
    pub fn nearest(
        &self,
        position: Vec2,
        directory: &dyn InteractableDirectory,
    ) -> Option<EntityId> {
        let mut best: Option<(EntityId, f32)> = None;

        for candidate in
            directory.interactables_near(position, self.config.detect_distance, self.config.mask)
        {
            let Some(at) = directory.position_of(candidate) else {
                continue;
            };
            let distance = position.distance(at);
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((candidate, distance));
            }
        }

        best.map(|(id, _)| id)
    }

    /// Focuses the nearest interactable, or clears the focus if there is none.
    ///
    /// Returns whether something is focused afterwards.
    pub fn request(
        &mut self,
        actor: EntityId,
        position: Vec2,
        directory: &mut dyn InteractableDirectory,
    ) -> bool {
        let Some(found) = self.nearest(position, directory) else {
            self.clear(actor, directory);
            return false;
        };

        let live = directory
            .interactable_mut(found)
            .is_some_and(|i| i.focused_by() == Some(actor));
        if self.current == Some(found) && live {
            return true;
        }

        if self.current != Some(found) {
            self.clear(actor, directory);
        }

        match directory.interactable_mut(found) {
            Some(interactable) => {
                interactable.on_focused(actor);
                self.current = Some(found);
                true
            }
            None => false,
        }
    }

    /// Drops the current focus, ending its session if this actor owns it.
    pub fn clear(&mut self, actor: EntityId, directory: &mut dyn InteractableDirectory) {
        let Some(old) = self.current.take() else {
            return;
        };
        if let Some(interactable) = directory.interactable_mut(old) {
            if interactable.focused_by() == Some(actor) {
                interactable.on_defocused();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Debug, Default)]
    struct Counter(Rc<Cell<u32>>);

    impl InteractionEffect for Counter {
        fn interact(&mut self, _interactable: EntityId, _actor: EntityId) {
            self.0.set(self.0.get() + 1);
        }
    }

    fn counted(position: Vec2, radius: f32) -> (Interactable, Rc<Cell<u32>>) {
        let count = Rc::new(Cell::new(0));
        let effect = Counter(Rc::clone(&count));
        (Interactable::new(position, radius, Box::new(effect)), count)
    }

    fn focus() -> InteractionFocus {
        InteractionFocus::new(InteractionConfig {
            detect_distance: 2.0,
            mask: LayerMask::ALL,
        })
    }

    #[test]
    fn test_interacts_once_per_session() {
        let actor = EntityId::from_raw(1);
        let (interactable, count) = counted(Vec2::new(1.0, 0.0), 1.5);
        let mut set = InteractableSet::new();
        let id = set.insert(interactable);
        let mut locator = HashMap::from([(actor, Vec2::ZERO)]);

        assert!(focus().request(actor, Vec2::ZERO, &mut set));

        let events = set.update_all(&locator);
        assert_eq!(
            events,
            vec![
                InteractableEvent::Focused { interactable: id, owner: actor },
                InteractableEvent::Interacted { interactable: id, owner: actor },
            ]
        );

        locator.insert(actor, Vec2::new(0.5, 0.0));
        assert!(set.update_all(&locator).is_empty());
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_leaving_radius_before_trigger_never_interacts() {
        let actor = EntityId::from_raw(1);
        // Detected at 2.0 but the trigger radius is smaller
        let (interactable, count) = counted(Vec2::new(1.75, 0.0), 1.0);
        let mut set = InteractableSet::new();
        let id = set.insert(interactable);
        let mut focus = focus();

        assert!(focus.request(actor, Vec2::ZERO, &mut set));

        let mut locator = HashMap::from([(actor, Vec2::new(-0.5, 0.0))]);
        let events = set.update_all(&locator);
        assert_eq!(
            events,
            vec![
                InteractableEvent::Focused { interactable: id, owner: actor },
                InteractableEvent::Defocused { interactable: id },
            ]
        );

        locator.insert(actor, Vec2::new(-3.0, 0.0));
        assert!(set.update_all(&locator).is_empty());
        assert_eq!(count.get(), 0);
        assert!(set.get(id).is_some_and(|i| !i.is_focused()));
    }

    #[test]
    fn test_undelivered_events_are_capped() {
        let (mut interactable, _count) = counted(Vec2::ZERO, 1.0);
        for raw in 0..100 {
            interactable.on_focused(EntityId::from_raw(raw));
            interactable.on_defocused();
        }
        assert_eq!(interactable.pending_events(), Interactable::MAX_PENDING_EVENTS);

        let events = interactable.update(&HashMap::<EntityId, Vec2>::new());
        assert_eq!(events.len(), Interactable::MAX_PENDING_EVENTS);
        assert_eq!(
            events[events.len() - 2],
            InteractableEvent::Focused {
                interactable: interactable.id(),
                owner: EntityId::from_raw(99),
            }
        );
        assert_eq!(interactable.pending_events(), 0);
    }

    #[test]
    fn test_nearest_wins_and_ties_keep_first() {
        let mut set = InteractableSet::new();
        let first = set.insert(counted(Vec2::new(1.0, 0.0), 1.0).0);
        let _tie = set.insert(counted(Vec2::new(-1.0, 0.0), 1.0).0);
        let closer = set.insert(counted(Vec2::new(0.0, 0.5), 1.0).0);

        let focus = focus();
        assert_eq!(focus.nearest(Vec2::ZERO, &set), Some(closer));
        assert_eq!(focus.nearest(Vec2::new(0.0, -1.5), &set), Some(first));
    }

    #[test]
    fn test_refocus_switches_and_defocuses_old() {
        let actor = EntityId::from_raw(1);
        let mut set = InteractableSet::new();
        let left = set.insert(counted(Vec2::new(-1.0, 0.0), 1.0).0);
        let right = set.insert(counted(Vec2::new(1.0, 0.0), 1.0).0);
        let mut focus = focus();

        focus.request(actor, Vec2::new(-0.5, 0.0), &mut set);
        assert_eq!(focus.current(), Some(left));

        focus.request(actor, Vec2::new(0.5, 0.0), &mut set);
        assert_eq!(focus.current(), Some(right));
        assert!(set.get(left).is_some_and(|i| !i.is_focused()));
        assert!(set.get(right).is_some_and(Interactable::is_focused));
    }

    #[test]
    fn test_same_live_focus_is_kept() {
        let actor = EntityId::from_raw(1);
        let mut set = InteractableSet::new();
        let id = set.insert(counted(Vec2::new(1.0, 0.0), 1.5).0);
        let locator = HashMap::from([(actor, Vec2::ZERO)]);
        let mut focus = focus();

        focus.request(actor, Vec2::ZERO, &mut set);
        set.update_all(&locator);
        assert!(set.get(id).and_then(Interactable::session).is_some_and(|s| s.has_interacted));

        assert!(focus.request(actor, Vec2::ZERO, &mut set));
        assert!(set.get(id).and_then(Interactable::session).is_some_and(|s| s.has_interacted));
    }

    #[test]
    fn test_nothing_in_range_clears_focus() {
        let actor = EntityId::from_raw(1);
        let mut set = InteractableSet::new();
        let id = set.insert(counted(Vec2::new(1.0, 0.0), 1.0).0);
        let mut focus = focus();

        focus.request(actor, Vec2::ZERO, &mut set);
        assert!(!focus.request(actor, Vec2::new(10.0, 0.0), &mut set));
        assert_eq!(focus.current(), None);
        assert!(set.get(id).is_some_and(|i| !i.is_focused()));
    }

    #[test]
    fn test_missing_owner_defocuses() {
        let actor = EntityId::from_raw(1);
        let mut set = InteractableSet::new();
        let id = set.insert(counted(Vec2::new(1.0, 0.0), 1.0).0);

        focus().request(actor, Vec2::ZERO, &mut set);
        let events = set.update_all(&HashMap::<EntityId, Vec2>::new());
        assert_eq!(events.last(), Some(&InteractableEvent::Defocused { interactable: id }));
    }
}
