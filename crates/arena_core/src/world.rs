//! Entity and component storage.
//!
//! The [`World`] owns every component value in the simulation. Components are
//! stored per type, keyed by entity id, and are handed out **by value**:
//! reads copy the component out of the store and a change only becomes
//! visible after it is written back with [`World::set_component`].
//!
//! ```
//! use arena_core::components::Health;
//! use arena_core::world::World;
//!
//! let mut world = World::new();
//! let hero = world.create_entity();
//! world.add_component(hero, Health::new(100));
//!
//! let mut health = world.get_component::<Health>(hero).unwrap();
//! health.apply_damage(30);
//! // Not visible until written back.
//! assert_eq!(world.get_component::<Health>(hero).unwrap().current, 100);
//!
//! world.set_component(hero, health);
//! assert_eq!(world.get_component::<Health>(hero).unwrap().current, 70);
//! ```
//!
//! # Queries
//!
//! The component type is the query key. [`World::get_components`] returns a
//! snapshot of every `(id, value)` pair for one type, sorted by entity id.
//! Systems that need a second type probe it per entity with
//! [`World::has_component`] or [`World::try_get_component`].
//!
//! # Services
//!
//! The world also carries a [`ServiceRegistry`]: a type-keyed table of
//! shared singletons that lets independently registered systems find each
//! other. It lives and dies with the world.

use std::any::{type_name, Any, TypeId};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::rc::Rc;

use crate::error::{GameError, Result};

/// Unique identifier for entities.
pub type EntityId = u64;

/// Marker trait for values that can be attached to an entity.
///
/// Components are plain values; `Clone` backs the copy-out / copy-back
/// access discipline.
pub trait Component: Clone + 'static {}

/// Storage for a single component type.
#[derive(Debug, Clone)]
pub struct ComponentStorage<T: Component> {
    components: BTreeMap<EntityId, T>,
}

impl<T: Component> Default for ComponentStorage<T> {
    fn default() -> Self {
        Self {
            components: BTreeMap::new(),
        }
    }
}

impl<T: Component> ComponentStorage<T> {
    /// Insert or overwrite the component for an entity.
    pub fn insert(&mut self, entity: EntityId, component: T) -> Option<T> {
        self.components.insert(entity, component)
    }

    /// Borrow the component for an entity.
    #[must_use]
    pub fn get(&self, entity: EntityId) -> Option<&T> {
        self.components.get(&entity)
    }

    /// Remove the component for an entity.
    pub fn remove(&mut self, entity: EntityId) -> Option<T> {
        self.components.remove(&entity)
    }

    /// Check whether an entity holds this component.
    #[must_use]
    pub fn contains(&self, entity: EntityId) -> bool {
        self.components.contains_key(&entity)
    }

    /// Number of entities holding this component.
    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Check if no entity holds this component.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Iterate in ascending entity id order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &T)> {
        self.components.iter().map(|(id, c)| (*id, c))
    }
}

/// Type-erased view over a [`ComponentStorage`].
trait AnyStorage {
    fn remove_entity(&mut self, entity: EntityId) -> bool;
    fn contains_entity(&self, entity: EntityId) -> bool;
    fn entity_ids(&self) -> Vec<EntityId>;
    fn len(&self) -> usize;
    fn component_name(&self) -> &'static str;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component> AnyStorage for ComponentStorage<T> {
    fn remove_entity(&mut self, entity: EntityId) -> bool {
        self.remove(entity).is_some()
    }

    fn contains_entity(&self, entity: EntityId) -> bool {
        self.contains(entity)
    }

    fn entity_ids(&self) -> Vec<EntityId> {
        self.components.keys().copied().collect()
    }

    fn len(&self) -> usize {
        self.components.len()
    }

    fn component_name(&self) -> &'static str {
        short_type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Last path segment of a type name, for error messages and logs.
fn short_type_name<T>() -> &'static str {
    let full = type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

/// Type-keyed table of shared singletons.
///
/// Services are stored as `Rc<RefCell<T>>` so the same instance can be held
/// by the registry and by whoever else produced it (typically the scheduler).
#[derive(Default)]
pub struct ServiceRegistry {
    services: HashMap<TypeId, Rc<dyn Any>>,
}

impl ServiceRegistry {
    /// Register a shared service, replacing any previous instance of `T`.
    pub fn register<T: 'static>(&mut self, service: Rc<RefCell<T>>) {
        let erased: Rc<dyn Any> = service;
        if self.services.insert(TypeId::of::<T>(), erased).is_some() {
            tracing::debug!(service = short_type_name::<T>(), "Service replaced");
        }
    }

    /// Look up a service by type.
    #[must_use]
    pub fn get<T: 'static>(&self) -> Option<Rc<RefCell<T>>> {
        self.services
            .get(&TypeId::of::<T>())
            .cloned()
            .and_then(|service| service.downcast::<RefCell<T>>().ok())
    }

    /// Check whether a service of type `T` is registered.
    #[must_use]
    pub fn contains<T: 'static>(&self) -> bool {
        self.services.contains_key(&TypeId::of::<T>())
    }

    /// Number of registered services.
    #[must_use]
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Check if no services are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Drop every registered service.
    pub fn clear(&mut self) {
        self.services.clear();
    }
}

impl fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("services", &self.services.len())
            .finish()
    }
}

/// The authoritative game state: entity allocator, component storages and
/// service registry.
pub struct World {
    /// Next entity ID to assign. Ids are never reused.
    next_entity_id: EntityId,
    storages: HashMap<TypeId, Box<dyn AnyStorage>>,
    services: ServiceRegistry,
}

impl World {
    /// Create an empty world.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_entity_id: 1,
            storages: HashMap::new(),
            services: ServiceRegistry::default(),
        }
    }

    /// Allocate a fresh, never-reused entity id.
    pub fn create_entity(&mut self) -> EntityId {
        let id = self.next_entity_id;
        self.next_entity_id += 1;
        id
    }

    /// Attach `component` to `entity`, overwriting any existing value of `T`.
    pub fn add_component<T: Component>(&mut self, entity: EntityId, component: T) {
        self.storage_mut::<T>().insert(entity, component);
    }

    /// Write a (possibly modified) copy back into the store.
    ///
    /// This is the only way a change to a fetched component becomes visible.
    /// Attaches the component if the entity did not hold it.
    pub fn set_component<T: Component>(&mut self, entity: EntityId, component: T) {
        self.storage_mut::<T>().insert(entity, component);
    }

    /// Check whether `entity` holds a `T`.
    #[must_use]
    pub fn has_component<T: Component>(&self, entity: EntityId) -> bool {
        self.storage::<T>().is_some_and(|s| s.contains(entity))
    }

    /// Copy out the `T` attached to `entity`.
    ///
    /// Fails with [`GameError::ComponentNotFound`] when absent; use
    /// [`World::try_get_component`] wherever absence is possible.
    pub fn get_component<T: Component>(&self, entity: EntityId) -> Result<T> {
        self.try_get_component(entity)
            .ok_or_else(|| GameError::ComponentNotFound {
                entity,
                component: short_type_name::<T>(),
            })
    }

    /// Copy out the `T` attached to `entity`, if any.
    #[must_use]
    pub fn try_get_component<T: Component>(&self, entity: EntityId) -> Option<T> {
        self.storage::<T>()
            .and_then(|s| s.get(entity))
            .cloned()
    }

    /// Detach and return the `T` attached to `entity`.
    pub fn remove_component<T: Component>(&mut self, entity: EntityId) -> Option<T> {
        self.storage_mut_if_exists::<T>()
            .and_then(|s| s.remove(entity))
    }

    /// Snapshot of every entity holding `T`, sorted by entity id.
    ///
    /// The snapshot is independent of the store: writing components while
    /// walking it is safe and calling it again restarts from current state.
    #[must_use]
    pub fn get_components<T: Component>(&self) -> Vec<(EntityId, T)> {
        self.storage::<T>()
            .map(|s| s.iter().map(|(id, c)| (id, c.clone())).collect())
            .unwrap_or_default()
    }

    /// Ids of every entity holding `T`, sorted.
    #[must_use]
    pub fn entities_with<T: Component>(&self) -> Vec<EntityId> {
        self.storage::<T>()
            .map(|s| s.iter().map(|(id, _)| id).collect())
            .unwrap_or_default()
    }

    /// Number of entities holding `T`.
    #[must_use]
    pub fn component_count<T: Component>(&self) -> usize {
        self.storage::<T>().map_or(0, ComponentStorage::len)
    }

    /// Check whether any component is attached to `entity`.
    #[must_use]
    pub fn is_alive(&self, entity: EntityId) -> bool {
        self.storages.values().any(|s| s.contains_entity(entity))
    }

    /// Destroy an entity by removing every component it holds.
    ///
    /// Returns `true` if anything was removed. Other entities referring to
    /// this id are left untouched.
    pub fn destroy_entity(&mut self, entity: EntityId) -> bool {
        let mut removed = false;
        for storage in self.storages.values_mut() {
            removed |= storage.remove_entity(entity);
        }
        if removed {
            tracing::trace!(entity, "Entity destroyed");
        }
        removed
    }

    /// Number of live entities (holding at least one component).
    #[must_use]
    pub fn entity_count(&self) -> usize {
        let mut ids = BTreeSet::new();
        for storage in self.storages.values() {
            ids.extend(storage.entity_ids());
        }
        ids.len()
    }

    /// Names of the component types attached to `entity`, sorted.
    #[must_use]
    pub fn component_names(&self, entity: EntityId) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self
            .storages
            .values()
            .filter(|s| s.contains_entity(entity))
            .map(|s| s.component_name())
            .collect();
        names.sort_unstable();
        names
    }

    /// Register a service, returning the shared handle.
    pub fn register_service<T: 'static>(&mut self, service: T) -> Rc<RefCell<T>> {
        let shared = Rc::new(RefCell::new(service));
        self.services.register(Rc::clone(&shared));
        shared
    }

    /// Register an already shared service instance.
    pub fn register_shared_service<T: 'static>(&mut self, service: Rc<RefCell<T>>) {
        self.services.register(service);
    }

    /// Look up a service. `None` means "not registered yet".
    #[must_use]
    pub fn try_get_service<T: 'static>(&self) -> Option<Rc<RefCell<T>>> {
        self.services.get::<T>()
    }

    /// Check whether a service of type `T` is registered.
    #[must_use]
    pub fn has_service<T: 'static>(&self) -> bool {
        self.services.contains::<T>()
    }

    /// Access the service registry.
    #[must_use]
    pub fn services(&self) -> &ServiceRegistry {
        &self.services
    }

    fn storage<T: Component>(&self) -> Option<&ComponentStorage<T>> {
        self.storages
            .get(&TypeId::of::<T>())
            .and_then(|s| s.as_any().downcast_ref::<ComponentStorage<T>>())
    }

    fn storage_mut_if_exists<T: Component>(&mut self) -> Option<&mut ComponentStorage<T>> {
        self.storages
            .get_mut(&TypeId::of::<T>())
            .and_then(|s| s.as_any_mut().downcast_mut::<ComponentStorage<T>>())
    }

    fn storage_mut<T: Component>(&mut self) -> &mut ComponentStorage<T> {
        let storage = self
            .storages
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(ComponentStorage::<T>::default()));
        match storage.as_any_mut().downcast_mut::<ComponentStorage<T>>() {
            Some(typed) => typed,
            None => unreachable!("storage keyed by TypeId always matches its type"),
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut counts: Vec<(&'static str, usize)> = self
            .storages
            .values()
            .map(|s| (s.component_name(), s.len()))
            .collect();
        counts.sort_unstable();
        f.debug_struct("World")
            .field("next_entity_id", &self.next_entity_id)
            .field("components", &counts)
            .field("services", &self.services)
            .finish()
    }
}
