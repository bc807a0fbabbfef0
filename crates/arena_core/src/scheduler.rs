//! Ordered per-tick system execution.
//!
//! The scheduler runs every registered unit exactly once per tick, strictly
//! in registration order. There is no dependency inference: the order chosen
//! at assembly time is the contract between systems (input before movement,
//! attribute recomputation before anything that reads attributes, ...).
//!
//! Units come in two flavours:
//!
//! - **stateless**: a plain `fn(&mut World, Fixed)` wrapped in [`FnSystem`];
//! - **stateful**: any type implementing [`System`], typically caching
//!   handles it resolved lazily from the world's service registry.
//!
//! A unit that cannot do its work this tick simply returns. Nothing a unit
//! does can abort the tick.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::math::Fixed;
use crate::world::World;

/// A per-tick update unit.
pub trait System {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Advance this system by `dt` seconds.
    fn update(&mut self, world: &mut World, dt: Fixed);
}

/// Signature of a stateless system.
pub type SystemFn = fn(&mut World, Fixed);

/// Adapts a stateless function into a [`System`].
#[derive(Clone, Copy)]
pub struct FnSystem {
    name: &'static str,
    func: SystemFn,
}

impl FnSystem {
    /// Wrap a function under a name.
    #[must_use]
    pub const fn new(name: &'static str, func: SystemFn) -> Self {
        Self { name, func }
    }
}

impl System for FnSystem {
    fn name(&self) -> &'static str {
        self.name
    }

    fn update(&mut self, world: &mut World, dt: Fixed) {
        (self.func)(world, dt);
    }
}

impl fmt::Debug for FnSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnSystem").field("name", &self.name).finish()
    }
}

/// Schedules a system that is also shared elsewhere, e.g. as a service.
pub struct SharedSystem<T: System> {
    inner: Rc<RefCell<T>>,
}

impl<T: System> SharedSystem<T> {
    /// Wrap a shared system handle.
    #[must_use]
    pub fn new(inner: Rc<RefCell<T>>) -> Self {
        Self { inner }
    }
}

impl<T: System> System for SharedSystem<T> {
    fn name(&self) -> &'static str {
        self.inner
            .try_borrow()
            .map_or("shared_system", |system| system.name())
    }

    fn update(&mut self, world: &mut World, dt: Fixed) {
        match self.inner.try_borrow_mut() {
            Ok(mut system) => system.update(world, dt),
            Err(_) => {
                tracing::warn!("Shared system is borrowed elsewhere; skipping this tick");
            }
        }
    }
}

/// Ordered list of systems.
#[derive(Default)]
pub struct Scheduler {
    systems: Vec<Box<dyn System>>,
    ticks_run: u64,
}

impl Scheduler {
    /// Create an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stateful system.
    pub fn add_system<S: System + 'static>(&mut self, system: S) -> &mut Self {
        self.systems.push(Box::new(system));
        self
    }

    /// Append a stateless system.
    pub fn add_fn(&mut self, name: &'static str, func: SystemFn) -> &mut Self {
        self.add_system(FnSystem::new(name, func))
    }

    /// Append a system whose instance is shared with other owners.
    pub fn add_shared<T: System + 'static>(&mut self, system: Rc<RefCell<T>>) -> &mut Self {
        self.add_system(SharedSystem::new(system))
    }

    /// Run every system once, in registration order.
    pub fn run(&mut self, world: &mut World, dt: Fixed) {
        for system in &mut self.systems {
            let _span = tracing::trace_span!("system", name = system.name()).entered();
            system.update(world, dt);
        }
        self.ticks_run += 1;
    }

    /// Names of the registered systems, in execution order.
    #[must_use]
    pub fn system_names(&self) -> Vec<&'static str> {
        self.systems.iter().map(|s| s.name()).collect()
    }

    /// Number of completed runs.
    #[must_use]
    pub const fn ticks_run(&self) -> u64 {
        self.ticks_run
    }

    /// Number of registered systems.
    #[must_use]
    pub fn len(&self) -> usize {
        self.systems.len()
    }

    /// Check if no systems are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("systems", &self.system_names())
            .field("ticks_run", &self.ticks_run)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Journal {
        entries: Vec<&'static str>,
    }

    struct Recorder {
        name: &'static str,
        journal: Rc<RefCell<Journal>>,
    }

    impl System for Recorder {
        fn name(&self) -> &'static str {
            self.name
        }

        fn update(&mut self, _world: &mut World, _dt: Fixed) {
            self.journal.borrow_mut().entries.push(self.name);
        }
    }

    #[derive(Debug, Default)]
    struct Tally {
        total: u32,
    }

    /// Feeds the `Tally` service once it shows up.
    #[derive(Default)]
    struct Feeder {
        tally: Option<Rc<RefCell<Tally>>>,
        skipped: u32,
    }

    impl System for Feeder {
        fn name(&self) -> &'static str {
            "feeder"
        }

        fn update(&mut self, world: &mut World, _dt: Fixed) {
            if self.tally.is_none() {
                self.tally = world.try_get_service::<Tally>();
            }
            let Some(tally) = &self.tally else {
                self.skipped += 1;
                return;
            };
            tally.borrow_mut().total += 1;
        }
    }

    fn bump_tally(world: &mut World, _dt: Fixed) {
        if let Some(tally) = world.try_get_service::<Tally>() {
            tally.borrow_mut().total += 100;
        }
    }

    #[test]
    fn test_runs_in_registration_order() {
        let journal = Rc::new(RefCell::new(Journal::default()));
        let mut scheduler = Scheduler::new();
        for name in ["input", "movement", "attributes", "render_sync"] {
            scheduler.add_system(Recorder {
                name,
                journal: Rc::clone(&journal),
            });
        }

        let mut world = World::new();
        scheduler.run(&mut world, Fixed::ONE);
        scheduler.run(&mut world, Fixed::ONE);

        assert_eq!(
            journal.borrow().entries,
            vec![
                "input", "movement", "attributes", "render_sync", "input", "movement",
                "attributes", "render_sync",
            ]
        );
        assert_eq!(scheduler.ticks_run(), 2);
    }

    #[test]
    fn test_late_service_is_picked_up() {
        let mut world = World::new();
        let feeder = Rc::new(RefCell::new(Feeder::default()));
        let mut scheduler = Scheduler::new();
        scheduler.add_shared(Rc::clone(&feeder));

        scheduler.run(&mut world, Fixed::ONE);
        assert_eq!(feeder.borrow().skipped, 1);

        let tally = world.register_service(Tally::default());
        scheduler.run(&mut world, Fixed::ONE);
        assert_eq!(tally.borrow().total, 1);
        assert_eq!(feeder.borrow().skipped, 1);
    }

    #[test]
    fn test_fn_systems_mix_with_stateful() {
        let mut world = World::new();
        let tally = world.register_service(Tally::default());
        let mut scheduler = Scheduler::new();
        scheduler
            .add_fn("bump", bump_tally)
            .add_system(Feeder::default());

        assert_eq!(scheduler.system_names(), vec!["bump", "feeder"]);
        scheduler.run(&mut world, Fixed::ONE);
        assert_eq!(tally.borrow().total, 101);
    }

    #[test]
    fn test_borrowed_shared_system_is_skipped() {
        let mut world = World::new();
        let feeder = Rc::new(RefCell::new(Feeder::default()));
        let mut scheduler = Scheduler::new();
        scheduler.add_shared(Rc::clone(&feeder));

        let guard = feeder.borrow_mut();
        scheduler.run(&mut world, Fixed::ONE);
        drop(guard);

        assert_eq!(feeder.borrow().skipped, 0);
        assert_eq!(scheduler.ticks_run(), 1);
    }

    #[test]
    fn test_empty_scheduler() {
        let mut scheduler = Scheduler::new();
        assert!(scheduler.is_empty());
        scheduler.run(&mut World::new(), Fixed::ONE);
        assert_eq!(scheduler.ticks_run(), 1);
    }
}
