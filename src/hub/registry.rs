use super::binding::{Binder, Binding, Directive, Injectable, Target};
use super::dependency::{Component, Dependency, Slot};
use super::{HUB, WILDCARD};
use crate::error::{Result, SenError};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::any::type_name;
use std::sync::{Arc, Weak};

/// Named store of singleton components with dependency injection.
///
/// Components are registered under unique names. Registering a component first
/// runs its bindings against what is already stored, so later components may
/// depend on earlier ones. The hub registers itself under [`HUB`].
pub struct Hub {
    dependencies: DashMap<String, Dependency>,
}

impl Hub {
    /// Create an empty hub that already holds itself under [`HUB`].
    ///
    /// The self-registration is weak, so the returned `Arc` is the only owner.
    pub fn new() -> Arc<Self> {
        Arc::new_cyclic(|this: &Weak<Hub>| {
            let dependencies = DashMap::new();
            dependencies.insert(HUB.to_string(), Dependency::weak(HUB, this.clone()));
            Self { dependencies }
        })
    }

    /// Inject dependencies into `component` and store it under `name`.
    ///
    /// # Errors
    /// Fails on a duplicate or reserved name and on any injection failure. Nothing
    /// is stored when an error is returned.
    pub fn register<T>(&self, name: &str, component: Component<T>) -> Result<()>
    where
        T: Send + Sync + 'static,
    {
        self.validate_name(name)?;

        let (slot, bindings, aliases) = component.into_parts();
        let value = match slot {
            Slot::Owned(mut value) => {
                self.apply_bindings(&mut value, &bindings)?;
                Arc::new(value)
            }
            Slot::Shared(mut value) => {
                self.apply_shared(&mut value, &bindings)?;
                value
            }
        };

        self.store(name, Dependency::strong(name, value, aliases))
    }

    /// Store a component without keeping it alive.
    pub(crate) fn register_weak<T>(&self, name: &str, value: Weak<T>) -> Result<()>
    where
        T: Send + Sync + 'static,
    {
        self.validate_name(name)?;
        self.store(name, Dependency::weak(name, value))
    }

    /// Retrieve the component registered under `name` as a `T`.
    ///
    /// # Errors
    /// Returns [`SenError::NotRegistered`] when nothing is stored under `name`, and
    /// [`SenError::TypeMismatch`] when the component cannot be viewed as `T`.
    pub fn retrieve<T: ?Sized + 'static>(&self, name: &str) -> Result<Arc<T>> {
        let dependency = self
            .lookup(name)
            .ok_or_else(|| SenError::not_registered(name))?;

        dependency
            .resolve::<T>()
            .ok_or_else(|| SenError::TypeMismatch {
                name: name.to_string(),
                expected: type_name::<T>(),
                found: dependency.descriptor().name(),
            })
    }

    /// Wire `component` from the hub without storing it.
    pub fn inject<C: Injectable>(&self, component: &mut C) -> Result<()> {
        let bindings = Binder::<C>::collect();
        self.apply_bindings(component, &bindings)
    }

    /// Wire a shared component. Bindings can only be applied while the `Arc` is
    /// uniquely owned.
    pub fn inject_shared<C: Injectable>(&self, component: &mut Arc<C>) -> Result<()> {
        let bindings = Binder::<C>::collect();
        self.apply_shared(component, &bindings)
    }

    /// Check whether a component is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.dependencies.contains_key(name)
    }

    /// Registered names in lexical order.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .dependencies
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        names.sort_unstable();
        names
    }

    /// Number of registered components, the hub's own entry included.
    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }

    /// Drop every stored component, including the self-registration.
    pub fn clear(&self) {
        self.dependencies.clear();
    }

    fn validate_name(&self, name: &str) -> Result<()> {
        if name == WILDCARD {
            return Err(SenError::ReservedName {
                name: name.to_string(),
            });
        }
        if self.dependencies.contains_key(name) {
            return Err(SenError::AlreadyRegistered {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    fn store(&self, name: &str, dependency: Dependency) -> Result<()> {
        match self.dependencies.entry(name.to_string()) {
            Entry::Occupied(_) => Err(SenError::AlreadyRegistered {
                name: name.to_string(),
            }),
            Entry::Vacant(slot) => {
                tracing::debug!(
                    name,
                    component = dependency.descriptor().name(),
                    "Registered component"
                );
                slot.insert(dependency);
                Ok(())
            }
        }
    }

    fn lookup(&self, name: &str) -> Option<Dependency> {
        self.dependencies.get(name).map(|entry| entry.value().clone())
    }

    fn apply_shared<C>(&self, component: &mut Arc<C>, bindings: &[Binding<C>]) -> Result<()> {
        if bindings.is_empty() {
            return Ok(());
        }

        let component = Arc::get_mut(component).ok_or(SenError::NotInjectable {
            type_name: type_name::<C>(),
        })?;
        self.apply_bindings(component, bindings)
    }

    /// Resolve every binding first, then assign them, so a failure leaves `component`
    /// untouched.
    fn apply_bindings<C>(&self, component: &mut C, bindings: &[Binding<C>]) -> Result<()> {
        let mut setters = Vec::with_capacity(bindings.len());
        for binding in bindings {
            let directive = Directive::parse(binding.directive())?;
            let Some(dependency) = self.resolve_directive(&directive, binding)? else {
                tracing::debug!(
                    directive = binding.directive(),
                    component = type_name::<C>(),
                    "Optional binding left unset"
                );
                continue;
            };

            setters.push(binding.prepare(&dependency)?);
            tracing::debug!(
                directive = binding.directive(),
                dependency = dependency.name(),
                component = type_name::<C>(),
                "Resolved dependency"
            );
        }

        let injected = setters.len();
        for set in setters {
            set(&mut *component);
        }
        tracing::debug!(injected, component = type_name::<C>(), "Injected dependencies");
        Ok(())
    }

    fn resolve_directive<C>(
        &self,
        directive: &Directive<'_>,
        binding: &Binding<C>,
    ) -> Result<Option<Dependency>> {
        match directive.target {
            Target::Named(name) => match self.lookup(name) {
                Some(dependency) => Ok(Some(dependency)),
                None if directive.optional => Ok(None),
                None => Err(SenError::not_registered(name)),
            },
            Target::Wildcard => self.find_by_type(binding, directive.optional),
        }
    }

    /// Linear scan for the single dependency assignable to the binding's target.
    fn find_by_type<C>(&self, binding: &Binding<C>, optional: bool) -> Result<Option<Dependency>> {
        let target = binding.target();
        let mut candidates: Vec<Dependency> = self
            .dependencies
            .iter()
            .filter(|entry| entry.value().is_assignable_to(target.id()))
            .map(|entry| entry.value().clone())
            .collect();

        match candidates.len() {
            0 if optional => Ok(None),
            0 => Err(SenError::NoCandidate {
                type_name: target.name(),
            }),
            1 => Ok(candidates.pop()),
            _ => {
                let mut names: Vec<String> = candidates
                    .iter()
                    .map(|dependency| dependency.name().to_string())
                    .collect();
                names.sort_unstable();
                Err(SenError::Ambiguous {
                    type_name: target.name(),
                    candidates: names,
                })
            }
        }
    }
}
