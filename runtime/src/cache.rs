//! Per-worker cache for reusable builder/updater implementation instances
//!
//! Under the `ReuseInstances` lifecycle, each generation unit owns one
//! cache struct (`Default`-constructed, one field per reusable
//! implementation type). Those cache structs live here, in an explicit
//! map keyed by the unit name and the cache struct's type identity,
//! instead of in ambient thread-local storage. Callers thread a
//! `&mut WorkerContext` through generated entry functions; because the
//! API is exclusively `&mut`, no two logical threads can share a context
//! and no locking is needed.
//!
//! The `currently_in_use` flag carried by reusable implementation
//! structs is not a lock. It only detects reentrant acquisition from the
//! same logical thread (a callback re-entering the same builder while a
//! previous chain is still unfinished), in which case the busy instance
//! is abandoned and a fresh one takes its place in the slot.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;

/// Key of one cache slot: the generation unit plus the identity of its
/// cache struct type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct SlotKey {
    unit:  &'static str,
    cache: TypeId,
}

/// Explicit per-worker cache map backing `ReuseInstances` goals.
///
/// Slots are populated lazily on first use and cleared only by explicit
/// invalidation.
#[derive(Debug, Default)]
pub struct WorkerContext {
    slots: HashMap<SlotKey, Box<dyn Any>>,
}

impl WorkerContext {
    /// Creates an empty context with no cached instances.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cache struct for `unit`, creating it on first use.
    pub fn unit_cache<C: Default + 'static>(&mut self, unit: &'static str) -> &mut C {
        let key = SlotKey {
            unit,
            cache: TypeId::of::<C>(),
        };
        let slot = self
            .slots
            .entry(key)
            .or_insert_with(|| Box::new(C::default()));
        match slot.downcast_mut::<C>() {
            Some(cache) => cache,
            // The slot is keyed by the TypeId of its cache type.
            None => unreachable!("cache slot holds a {}", type_name::<C>()),
        }
    }

    /// Drops every cached instance belonging to `unit`.
    pub fn invalidate(&mut self, unit: &'static str) {
        self.slots.retain(|key, _| key.unit != unit);
    }

    /// Drops every cached instance in this context.
    pub fn invalidate_all(&mut self) {
        self.slots.clear();
    }

    /// Number of populated cache slots, across all units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no slot has been populated yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Implemented by generated reusable implementation structs; exposes the
/// `currently_in_use` reentrancy flag to [`acquire`] and [`release`].
pub trait Recycle: Default {
    /// Whether a previous entry call is still mid-chain on this instance.
    fn currently_in_use(&self) -> bool;

    /// Sets the reentrancy flag.
    fn set_in_use(&mut self, in_use: bool);
}

/// Acquires the instance in `slot` for a new builder/updater chain.
///
/// A busy instance means the same logical thread re-entered before the
/// previous chain reached its terminal method; the busy instance is
/// abandoned and replaced with a fresh one rather than corrupted.
pub fn acquire<'a, T: Recycle>(slot_name: &'static str, slot: &'a mut T) -> &'a mut T {
    if slot.currently_in_use() {
        tracing::debug!(slot = slot_name, "busy instance abandoned, allocating replacement");
        *slot = T::default();
    }
    slot.set_in_use(true);
    slot
}

/// Returns the instance in `slot` to the cache after a completed chain.
pub fn release<T: Recycle>(slot: &mut T) {
    slot.set_in_use(false);
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    /// Stand-in for a generated reusable implementation struct.
    #[derive(Default)]
    struct SumBuilderImpl {
        a:                 Option<i32>,
        currently_in_use:  bool,
        dropped_while_busy: Option<Rc<Cell<bool>>>,
    }

    impl Drop for SumBuilderImpl {
        fn drop(&mut self) {
            if let Some(flag) = &self.dropped_while_busy {
                flag.set(self.currently_in_use);
            }
        }
    }

    impl Recycle for SumBuilderImpl {
        fn currently_in_use(&self) -> bool {
            self.currently_in_use
        }

        fn set_in_use(&mut self, in_use: bool) {
            self.currently_in_use = in_use;
        }
    }

    #[derive(Default)]
    struct SumBuildersCache {
        sum_builder_impl: SumBuilderImpl,
    }

    #[test]
    fn test_unit_cache_populated_lazily() {
        let mut ctx = WorkerContext::new();
        assert!(ctx.is_empty());

        let cache = ctx.unit_cache::<SumBuildersCache>("sum_builders");
        assert!(!cache.sum_builder_impl.currently_in_use);
        assert_eq!(ctx.len(), 1);

        // A second lookup reuses the populated slot.
        let _ = ctx.unit_cache::<SumBuildersCache>("sum_builders");
        assert_eq!(ctx.len(), 1);
    }

    #[test]
    fn test_sequential_chains_reuse_the_cached_instance() {
        let mut ctx = WorkerContext::new();

        // First chain: acquire, fill, terminal releases.
        let cache = ctx.unit_cache::<SumBuildersCache>("sum_builders");
        let first = acquire("sum_builder_impl", &mut cache.sum_builder_impl);
        first.a = Some(3);
        release(first);

        // Second chain observes CACHED_FREE -> CACHED_BUSY on the same
        // instance: the field filled by the first chain is still there.
        let cache = ctx.unit_cache::<SumBuildersCache>("sum_builders");
        let second = acquire("sum_builder_impl", &mut cache.sum_builder_impl);
        assert!(second.currently_in_use);
        assert_eq!(second.a, Some(3));
    }

    #[test]
    fn test_reentrant_acquire_replaces_busy_instance() {
        let mut ctx = WorkerContext::new();
        let dropped_busy = Rc::new(Cell::new(false));

        let cache = ctx.unit_cache::<SumBuildersCache>("sum_builders");
        let first = acquire("sum_builder_impl", &mut cache.sum_builder_impl);
        first.a = Some(7);
        first.dropped_while_busy = Some(Rc::clone(&dropped_busy));
        // No release: the first chain is still mid-flight.

        let second = acquire("sum_builder_impl", &mut cache.sum_builder_impl);
        assert!(second.currently_in_use);
        // Fresh instance, not the half-filled one.
        assert_eq!(second.a, None);
        // The abandoned instance went down with its flag still set.
        assert!(dropped_busy.get());
    }

    // Hand-expanded output of a reusing two-step constructor goal,
    // exactly as the generator shapes it: one contract per step, one
    // implementation behind them, the entry acquiring from the cache.
    mod point_chain {
        use super::super::{Recycle, WorkerContext, acquire};

        #[derive(Debug, PartialEq, Eq)]
        pub struct Point {
            pub x: i32,
            pub y: i32,
        }

        impl Point {
            pub const fn new(x: i32, y: i32) -> Self {
                Self { x, y }
            }
        }

        pub trait PointBuilderX {
            fn x(&mut self, x: i32) -> &mut dyn PointBuilderY;
        }

        pub trait PointBuilderY {
            fn y(&mut self, y: i32) -> Point;
        }

        #[derive(Default)]
        pub struct PointBuilderImpl {
            pub x:                i32,
            pub currently_in_use: bool,
        }

        impl PointBuilderX for PointBuilderImpl {
            fn x(&mut self, x: i32) -> &mut dyn PointBuilderY {
                self.x = x;
                self
            }
        }

        impl PointBuilderY for PointBuilderImpl {
            fn y(&mut self, y: i32) -> Point {
                self.currently_in_use = false;
                Point::new(self.x, y)
            }
        }

        impl Recycle for PointBuilderImpl {
            fn currently_in_use(&self) -> bool {
                self.currently_in_use
            }

            fn set_in_use(&mut self, in_use: bool) {
                self.currently_in_use = in_use;
            }
        }

        #[derive(Default)]
        pub struct PointBuildersCache {
            pub point_builder_impl: PointBuilderImpl,
        }

        pub fn point_builder(ctx: &mut WorkerContext) -> &mut dyn PointBuilderX {
            let builder: &mut PointBuilderImpl = acquire(
                "point_builder_impl",
                &mut ctx.unit_cache::<PointBuildersCache>("point_builders").point_builder_impl,
            );
            builder
        }
    }

    #[test]
    fn test_generated_chain_builds_and_recycles() {
        use point_chain::*;

        let mut ctx = WorkerContext::new();
        assert_eq!(point_builder(&mut ctx).x(3).y(4), Point::new(3, 4));

        // Terminal completed: the slot is free again and the next chain
        // reuses the cached instance, old field value and all.
        let slot = &ctx.unit_cache::<PointBuildersCache>("point_builders").point_builder_impl;
        assert!(!slot.currently_in_use);
        assert_eq!(slot.x, 3);
        assert_eq!(point_builder(&mut ctx).x(5).y(6), Point::new(5, 6));
    }

    // Hand-expanded output of the matching updater goal: flat setters,
    // entry pre-populates from the existing instance's projections,
    // `done()` frees the slot first and re-invokes the constructor.
    mod point_update {
        use super::super::{Recycle, WorkerContext, acquire};
        pub use super::point_chain::Point;

        pub trait PointUpdate {
            fn x(&mut self, x: i32) -> &mut Self;
            fn y(&mut self, y: i32) -> &mut Self;
        }

        #[derive(Default)]
        pub struct PointUpdater {
            x:                    i32,
            y:                    i32,
            pub currently_in_use: bool,
        }

        impl PointUpdate for PointUpdater {
            fn x(&mut self, x: i32) -> &mut Self {
                self.x = x;
                self
            }

            fn y(&mut self, y: i32) -> &mut Self {
                self.y = y;
                self
            }
        }

        impl PointUpdater {
            pub fn done(&mut self) -> Point {
                self.currently_in_use = false;
                Point::new(self.x, self.y)
            }
        }

        impl Recycle for PointUpdater {
            fn currently_in_use(&self) -> bool {
                self.currently_in_use
            }

            fn set_in_use(&mut self, in_use: bool) {
                self.currently_in_use = in_use;
            }
        }

        #[derive(Default)]
        pub struct PointUpdatersCache {
            point_updater: PointUpdater,
        }

        pub fn point_updater<'a>(ctx: &'a mut WorkerContext, point: &Point) -> &'a mut PointUpdater {
            let updater = acquire(
                "point_updater",
                &mut ctx.unit_cache::<PointUpdatersCache>("point_builders").point_updater,
            );
            updater.x = point.x;
            updater.y = point.y;
            updater
        }
    }

    #[test]
    fn test_generated_updater_round_trips_unmodified_instances() {
        use point_update::*;

        let mut ctx = WorkerContext::new();
        let original = Point::new(3, 4);

        // Copy in, touch nothing, rebuild: observably equal.
        assert_eq!(point_updater(&mut ctx, &original).done(), original);
        // Overwriting a subset leaves the rest projected from the
        // original.
        assert_eq!(point_updater(&mut ctx, &original).y(9).done(), Point::new(3, 9));
    }

    #[test]
    fn test_generated_chain_reentrancy_gets_a_fresh_instance() {
        use point_chain::*;

        let mut ctx = WorkerContext::new();
        // First chain stops mid-way: the instance stays busy.
        point_builder(&mut ctx).x(100);

        // Reentrant entry: the busy instance is abandoned; the slot now
        // holds a fresh one, busy but empty.
        let second = point_builder(&mut ctx);
        let _ = second;
        let slot = &ctx.unit_cache::<PointBuildersCache>("point_builders").point_builder_impl;
        assert!(slot.currently_in_use);
        assert_eq!(slot.x, 0);
    }

    #[test]
    fn test_invalidate_clears_only_the_named_unit() {
        let mut ctx = WorkerContext::new();
        let _ = ctx.unit_cache::<SumBuildersCache>("sum_builders");
        let _ = ctx.unit_cache::<SumBuildersCache>("other_builders");
        assert_eq!(ctx.len(), 2);

        ctx.invalidate("sum_builders");
        assert_eq!(ctx.len(), 1);

        ctx.invalidate_all();
        assert!(ctx.is_empty());
    }
}
