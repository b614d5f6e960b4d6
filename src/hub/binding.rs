use super::WILDCARD;
use super::dependency::{Dependency, TypeDescriptor};
use crate::error::{Result, SenError};
use std::any::type_name;
use std::sync::Arc;

const OPTIONAL: &str = "optional";

/// Trait for components whose fields are wired from the [`Hub`](super::Hub).
///
/// Each binding pairs a directive with a setter. A directive is either the name of a
/// registered component or `*` to resolve by type, optionally followed by `,optional`.
///
/// # Example
/// ```rust,ignore
/// struct UserService {
///     repository: Option<Arc<dyn UserRepository>>,
///     cache: Option<Arc<Cache>>,
/// }
///
/// impl Injectable for UserService {
///     fn bindings(binder: &mut Binder<Self>) {
///         binder
///             .bind("*", |s: &mut Self, repo: Arc<dyn UserRepository>| s.repository = Some(repo))
///             .bind("cache,optional", |s: &mut Self, cache: Arc<Cache>| s.cache = Some(cache));
///     }
/// }
/// ```
pub trait Injectable: Sized + 'static {
    /// Declare the bindings of this component. The default declares none.
    fn bindings(_binder: &mut Binder<Self>) {}
}

/// A resolved value waiting to be written into its component.
pub(crate) type Setter<C> = Box<dyn FnOnce(&mut C)>;

type PrepareFn<C> = Box<dyn Fn(&Dependency) -> Result<Setter<C>> + Send + Sync>;

/// A single injection site of a component.
pub struct Binding<C> {
    directive: String,
    target: TypeDescriptor,
    prepare: PrepareFn<C>,
}

impl<C> Binding<C> {
    pub fn directive(&self) -> &str {
        &self.directive
    }

    pub fn target(&self) -> TypeDescriptor {
        self.target
    }

    /// Resolve `dependency` as the binding's target type. The component is only
    /// touched once the returned setter is called.
    pub(crate) fn prepare(&self, dependency: &Dependency) -> Result<Setter<C>> {
        (self.prepare)(dependency)
    }
}

/// Collects the bindings declared by [`Injectable::bindings`].
pub struct Binder<C> {
    bindings: Vec<Binding<C>>,
}

impl<C: 'static> Binder<C> {
    /// Bind the dependency selected by `directive` to a field through `setter`.
    pub fn bind<T, F>(&mut self, directive: impl Into<String>, setter: F) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&mut C, Arc<T>) + Send + Sync + 'static,
    {
        let setter = Arc::new(setter);
        let prepare = move |dependency: &Dependency| -> Result<Setter<C>> {
            let value = dependency
                .resolve::<T>()
                .ok_or_else(|| SenError::TypeMismatch {
                    name: dependency.name().to_string(),
                    expected: type_name::<T>(),
                    found: dependency.descriptor().name(),
                })?;
            let setter = Arc::clone(&setter);
            Ok(Box::new(move |component: &mut C| setter(component, value)))
        };

        self.bindings.push(Binding {
            directive: directive.into(),
            target: TypeDescriptor::of::<T>(),
            prepare: Box::new(prepare),
        });
        self
    }

    pub(crate) fn collect() -> Vec<Binding<C>>
    where
        C: Injectable,
    {
        let mut binder = Self {
            bindings: Vec::new(),
        };
        C::bindings(&mut binder);
        binder.bindings
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Target<'a> {
    Named(&'a str),
    Wildcard,
}

/// Parsed form of `name` | `name,optional` | `*` | `*,optional`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Directive<'a> {
    pub(crate) target: Target<'a>,
    pub(crate) optional: bool,
}

impl<'a> Directive<'a> {
    pub(crate) fn parse(raw: &'a str) -> Result<Self> {
        let invalid = |reason: String| SenError::InvalidDirective {
            directive: raw.to_string(),
            reason,
        };

        let mut parts = raw.split(',');
        let target = parts.next().unwrap_or_default();
        let modifier = parts.next();
        if parts.next().is_some() {
            return Err(invalid("expected at most one modifier".to_string()));
        }
        if target.is_empty() {
            return Err(invalid("target must not be empty".to_string()));
        }

        let optional = match modifier {
            None => false,
            Some(OPTIONAL) => true,
            Some(other) => return Err(invalid(format!("{other} is unexpected"))),
        };
        let target = if target == WILDCARD {
            Target::Wildcard
        } else {
            Target::Named(target)
        };

        Ok(Self { target, optional })
    }
}
