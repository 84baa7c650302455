//! Multi-type iteration over the [`ComponentManager`].
//!
//! `for_each*` visits every entity that currently holds *all* of the named
//! component types and hands the callback a mutable reference to each, in
//! declared order.
//!
//! ## Algorithm
//!
//! 1. Fetch the stores of all queried types as disjoint mutable borrows.
//! 2. Pick the store with the fewest entries as the driver.
//! 3. For each entity in the driver's dense order, probe every store with
//!    `try_get_mut`; call the callback only if all probes hit.
//!
//! Visit order is the driver's dense order and is not stable across frames.
//!
//! ## Structural changes
//!
//! A query holds `&mut ComponentManager` for its whole duration, so the
//! callback cannot create or destroy entities or components directly. Record
//! them into [`Commands`](crate::Commands) and apply the buffer once the
//! query returns.

use tracing::trace;

use crate::component::{Component, ComponentTypeId};
use crate::entity::Entity;
use crate::error::EcsError;
use crate::manager::{ComponentManager, StoreMap, downcast_store};
use crate::storage::ErasedStore;

/// Borrows the stores named in `wanted` mutably and all at once, in the
/// order given.
///
/// Duplicate types are rejected up front since they would alias.
fn disjoint_stores<'s>(
    stores: &'s mut StoreMap,
    wanted: &[(ComponentTypeId, &'static str)],
) -> Result<Vec<&'s mut Box<dyn ErasedStore>>, EcsError> {
    for (i, &(id, name)) in wanted.iter().enumerate() {
        if wanted[..i].iter().any(|&(earlier, _)| earlier == id) {
            return Err(EcsError::AliasedQuery(name));
        }
    }

    let mut slots: Vec<Option<&'s mut Box<dyn ErasedStore>>> = wanted.iter().map(|_| None).collect();
    for (id, store) in stores.iter_mut() {
        if let Some(pos) = wanted.iter().position(|(wanted_id, _)| wanted_id == id) {
            slots[pos] = Some(store);
        }
    }

    slots
        .into_iter()
        .zip(wanted)
        .map(|(slot, &(_, name))| slot.ok_or(EcsError::UnregisteredComponentType(name)))
        .collect()
}

/// Index of the shortest store, ties resolved toward the first declared.
fn driver_index(lens: &[usize]) -> usize {
    lens.iter()
        .enumerate()
        .min_by_key(|&(_, len)| *len)
        .map_or(0, |(index, _)| index)
}

macro_rules! impl_for_each {
    ($(#[$attr:meta])* $name:ident; $($ty:ident $store:ident),+) => {
        impl ComponentManager {
            $(#[$attr])*
            ///
            /// Returns the number of entities the callback was invoked for.
            ///
            /// # Errors
            ///
            /// - [`EcsError::UnregisteredComponentType`] if any queried type has
            ///   no store.
            /// - [`EcsError::AliasedQuery`] if a type is named twice.
            /// - [`EcsError::TypeIdCollision`] if a queried type shares its id
            ///   with a different registered type.
            pub fn $name<$($ty: Component,)+ F>(&mut self, mut f: F) -> Result<usize, EcsError>
            where
                F: FnMut(Entity, $(&mut $ty),+),
            {
                let wanted = [$((ComponentTypeId::of::<$ty>(), <$ty as Component>::type_name())),+];
                let mut fetched = disjoint_stores(&mut self.stores, &wanted)?.into_iter();
                $(
                    let $store = downcast_store::<$ty>(
                        fetched.next().expect("one store fetched per queried type"),
                    )?;
                )+

                let lens = [$($store.len()),+];
                let driver = driver_index(&lens);

                let scratch = &mut self.query_scratch;
                scratch.clear();
                scratch.extend_from_slice([$($store.entities()),+][driver]);

                let mut visited = 0usize;
                for &entity in scratch.iter() {
                    if let ($(Some($store),)+) = ($($store.try_get_mut(entity),)+) {
                        f(entity, $($store),+);
                        visited += 1;
                    }
                }

                trace!(
                    query = stringify!($name),
                    driver = wanted[driver].1,
                    probed = lens[driver],
                    visited,
                    "query complete"
                );
                Ok(visited)
            }
        }
    };
}

impl_for_each! {
    /// Runs `f` for every entity holding an `A`.
    for_each; A a
}

impl_for_each! {
    /// Runs `f` for every entity holding both an `A` and a `B`.
    for_each2; A a, B b
}

impl_for_each! {
    /// Runs `f` for every entity holding an `A`, a `B`, and a `C`.
    for_each3; A a, B b, C c
}

impl_for_each! {
    /// Runs `f` for every entity holding all of `A`, `B`, `C`, and `D`.
    for_each4; A a, B b, C c, D d
}
