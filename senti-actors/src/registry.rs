use crate::actor::{Actor, Addr};
use dashmap::DashMap;
use std::{
    any::{Any, TypeId},
    sync::Arc,
};

/// Thread-safe registry of shared values, usually `Addr<T>` or client handles.
///
/// Lets components be wired after spawn without threading every dependency
/// through constructors.
#[derive(Default, Clone)]
pub struct Registry {
    by_name: Arc<DashMap<String, Box<dyn Any + Send + Sync>>>,
    by_type: Arc<DashMap<TypeId, Box<dyn Any + Send + Sync>>>,
}

impl Registry {
    pub fn insert<T: Send + Sync + 'static>(&self, value: T) {
        self.by_type.insert(TypeId::of::<T>(), Box::new(value));
    }

    pub fn get<T: Send + Sync + 'static + Clone>(&self) -> Option<T> {
        self.by_type
            .get(&TypeId::of::<T>())?
            .downcast_ref::<T>()
            .cloned()
    }

    /// Addresses are keyed by actor type and name, so two actor kinds can
    /// share a name.
    pub fn insert_addr<A: Actor>(&self, name: &str, addr: Addr<A>) {
        self.by_name.insert(addr_key::<A>(name), Box::new(addr));
    }

    pub fn get_addr<A: Actor>(&self, name: &str) -> Option<Addr<A>> {
        self.by_name
            .get(&addr_key::<A>(name))?
            .downcast_ref::<Addr<A>>()
            .cloned()
    }

    pub fn clear(&self) {
        self.by_name.clear();
        self.by_type.clear();
    }
}

fn addr_key<A: Actor>(name: &str) -> String {
    format!("{}::{}", std::any::type_name::<A>(), name)
}
