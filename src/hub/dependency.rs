use super::binding::{Binder, Binding, Injectable};
use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::sync::{Arc, Weak};

/// Type-erased pointer stored for every view of a dependency.
///
/// The pointee is always either an `Arc<T>` or a `Weak<T>`, which lets unsized
/// views such as `Arc<dyn Trait>` be recovered with a plain downcast.
pub(crate) type AnyPtr = Arc<dyn Any + Send + Sync>;

pub(crate) type AliasFn<T> = Box<dyn FnOnce(&Arc<T>) -> (TypeDescriptor, AnyPtr) + Send + Sync>;

/// Descriptor of a concrete (or aliased) component type.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeDescriptor {
    id: TypeId,
    name: &'static str,
}

impl TypeDescriptor {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A registered component: its name, concrete type and every type it resolves as.
#[derive(Clone)]
pub(crate) struct Dependency {
    name: String,
    descriptor: TypeDescriptor,
    views: Vec<(TypeDescriptor, AnyPtr)>,
}

impl Dependency {
    pub(crate) fn strong<T>(name: &str, value: Arc<T>, aliases: Vec<AliasFn<T>>) -> Self
    where
        T: Send + Sync + 'static,
    {
        let mut views = Vec::with_capacity(aliases.len() + 1);
        for alias in aliases {
            views.push(alias(&value));
        }
        views.insert(0, (TypeDescriptor::of::<T>(), Arc::new(value) as AnyPtr));

        Self {
            name: name.to_string(),
            descriptor: TypeDescriptor::of::<T>(),
            views,
        }
    }

    /// A record that does not keep its value alive. Used for self-registrations.
    pub(crate) fn weak<T>(name: &str, value: Weak<T>) -> Self
    where
        T: Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            descriptor: TypeDescriptor::of::<T>(),
            views: vec![(TypeDescriptor::of::<T>(), Arc::new(value) as AnyPtr)],
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn descriptor(&self) -> TypeDescriptor {
        self.descriptor
    }

    pub(crate) fn is_assignable_to(&self, target: TypeId) -> bool {
        self.views.iter().any(|(descriptor, _)| descriptor.id == target)
    }

    pub(crate) fn resolve<T: ?Sized + 'static>(&self) -> Option<Arc<T>> {
        let target = TypeId::of::<T>();
        let (_, view) = self.views.iter().find(|(descriptor, _)| descriptor.id == target)?;

        if let Some(strong) = view.downcast_ref::<Arc<T>>() {
            return Some(Arc::clone(strong));
        }
        view.downcast_ref::<Weak<T>>().and_then(Weak::upgrade)
    }
}

pub(crate) enum Slot<T> {
    Owned(T),
    Shared(Arc<T>),
}

/// A value ready to be registered into a [`Hub`](super::Hub).
///
/// Plain values carry no bindings and register as-is. Values built with
/// [`Component::injectable`] are wired from the hub before they are stored.
///
/// ```rust,ignore
/// hub.register("greeter", Component::new(EnglishGreeter).provides::<dyn Greeter>(|g| g as Arc<dyn Greeter>))?;
/// ```
pub struct Component<T> {
    slot: Slot<T>,
    bindings: Vec<Binding<T>>,
    aliases: Vec<AliasFn<T>>,
}

impl<T: Send + Sync + 'static> Component<T> {
    /// Wrap a plain value. It is stored as-is, without injection.
    pub fn new(value: T) -> Self {
        Self {
            slot: Slot::Owned(value),
            bindings: Vec::new(),
            aliases: Vec::new(),
        }
    }

    /// Wrap a value that is already shared elsewhere. The hub stores this same `Arc`.
    pub fn shared(value: Arc<T>) -> Self {
        Self {
            slot: Slot::Shared(value),
            bindings: Vec::new(),
            aliases: Vec::new(),
        }
    }

    /// Also expose the component as `U`, typically a trait object it implements.
    pub fn provides<U>(mut self, cast: fn(Arc<T>) -> Arc<U>) -> Self
    where
        U: ?Sized + Send + Sync + 'static,
    {
        self.aliases.push(Box::new(move |value: &Arc<T>| {
            let view: Arc<U> = cast(Arc::clone(value));
            (TypeDescriptor::of::<U>(), Arc::new(view) as AnyPtr)
        }));
        self
    }

    pub(crate) fn into_parts(self) -> (Slot<T>, Vec<Binding<T>>, Vec<AliasFn<T>>) {
        (self.slot, self.bindings, self.aliases)
    }
}

impl<T: Injectable + Send + Sync> Component<T> {
    /// Wrap a value whose [`Injectable::bindings`] are resolved at registration.
    pub fn injectable(value: T) -> Self {
        Self {
            slot: Slot::Owned(value),
            bindings: Binder::collect(),
            aliases: Vec::new(),
        }
    }

    /// Like [`Component::injectable`], for an `Arc` that must still be uniquely owned
    /// when it is registered.
    pub fn injectable_shared(value: Arc<T>) -> Self {
        Self {
            slot: Slot::Shared(value),
            bindings: Binder::collect(),
            aliases: Vec::new(),
        }
    }
}
