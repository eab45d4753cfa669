//! Class descriptors: registered member tables for a concrete type.

use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::reflect::args::{ArgType, Args, Value};

/// A type that embeds its ancestor, so members registered on the ancestor's
/// class can be reached through a value of this type.
pub trait Inherits: Any {
    /// The embedded ancestor type.
    type Parent: Any;

    /// Borrows the embedded ancestor.
    fn parent(&self) -> &Self::Parent;

    /// Mutably borrows the embedded ancestor.
    fn parent_mut(&mut self) -> &mut Self::Parent;
}

type ConstructorFn = Box<dyn Fn(&Args) -> Result<Value> + Send + Sync>;
type MethodFn = Box<dyn Fn(Option<&mut dyn Any>, &Args) -> Result<Value> + Send + Sync>;
type GetterFn = Box<dyn Fn(Option<&dyn Any>) -> Result<Value> + Send + Sync>;
type SetterFn = Box<dyn Fn(Option<&mut dyn Any>, Value) -> Result<()> + Send + Sync>;

pub(crate) struct Constructor {
    params: Vec<ArgType>,
    pub call: ConstructorFn,
}

pub(crate) struct Method {
    name: String,
    params: Vec<ArgType>,
    pub is_static: bool,
    pub call: MethodFn,
}

pub(crate) struct Field {
    name: String,
    pub is_static: bool,
    pub get: GetterFn,
    pub set: SetterFn,
}

/// Link from a class to its ancestor.
pub(crate) struct Parent {
    pub class: Arc<Class>,
    pub project: fn(&dyn Any) -> Option<&dyn Any>,
    pub project_mut: fn(&mut dyn Any) -> Option<&mut dyn Any>,
}

/// The registered members of one type.
///
/// Build one with [`ClassBuilder`].
pub struct Class {
    name: String,
    parent: Option<Parent>,
    constructors: Vec<Constructor>,
    methods: Vec<Method>,
    fields: Vec<Field>,
}

impl Class {
    /// Returns the class name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the ancestor class, if any.
    #[must_use]
    pub fn parent(&self) -> Option<&Arc<Class>> {
        self.parent.as_ref().map(|p| &p.class)
    }

    pub(crate) fn parent_link(&self) -> Option<&Parent> {
        self.parent.as_ref()
    }

    pub(crate) fn declared_constructor(&self, params: &[ArgType]) -> Option<&Constructor> {
        self.constructors.iter().find(|c| c.params == params)
    }

    pub(crate) fn declared_method(&self, name: &str, params: &[ArgType]) -> Option<&Method> {
        self.methods
            .iter()
            .find(|m| m.name == name && m.params == params)
    }

    pub(crate) fn declared_field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let methods: Vec<_> = self.methods.iter().map(|m| m.name.as_str()).collect();
        let fields: Vec<_> = self.fields.iter().map(|f| f.name.as_str()).collect();
        f.debug_struct("Class")
            .field("name", &self.name)
            .field("parent", &self.parent().map(|p| p.name()))
            .field("constructors", &self.constructors.len())
            .field("methods", &methods)
            .field("fields", &fields)
            .finish()
    }
}

/// Registers the members of a type `T`.
///
/// # Example
///
/// ```rust
/// use testkit_executor::reflect::{self, ArgType, ClassBuilder};
/// use testkit_executor::args;
///
/// struct Counter {
///     hits: u32,
/// }
///
/// impl Counter {
///     fn hidden() -> Self {
///         Counter { hits: 0 }
///     }
///
///     fn bump(&mut self, by: u32) -> u32 {
///         self.hits += by;
///         self.hits
///     }
/// }
///
/// let class = ClassBuilder::<Counter>::new("Counter")
///     .constructor(&[], |_| Ok(Counter::hidden()))
///     .method("bump", &[ArgType::of::<u32>()], |this, args| Ok(this.bump(args.get(0)?)))
///     .field("hits", |this| &this.hits, |this| &mut this.hits)
///     .build();
///
/// let mut counter: Counter = reflect::construct(&class, &[], &args![]).unwrap();
/// let hits: u32 = reflect::invoke(&mut counter, &class, "bump", &[ArgType::of::<u32>()], &args![3_u32]).unwrap();
/// assert_eq!(hits, 3);
///
/// reflect::set_field(&mut counter, &class, "hits", 10_u32).unwrap();
/// assert_eq!(reflect::get_field::<u32>(&counter, &class, "hits").unwrap(), 10);
/// ```
pub struct ClassBuilder<T> {
    class: Class,
    _marker: std::marker::PhantomData<fn() -> T>,
}

impl<T: Any> ClassBuilder<T> {
    /// Starts a class with no members.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            class: Class {
                name: name.into(),
                parent: None,
                constructors: Vec::new(),
                methods: Vec::new(),
                fields: Vec::new(),
            },
            _marker: std::marker::PhantomData,
        }
    }

    /// Registers a constructor taking `params`.
    #[must_use]
    pub fn constructor<F>(mut self, params: &[ArgType], ctor: F) -> Self
    where
        T: Send,
        F: Fn(&Args) -> Result<T> + Send + Sync + 'static,
    {
        self.class.constructors.push(Constructor {
            params: params.to_vec(),
            call: Box::new(move |args: &Args| ctor(args).map(|value| Box::new(value) as Value)),
        });
        self
    }

    /// Registers an instance method.
    #[must_use]
    pub fn method<R, F>(mut self, name: &str, params: &[ArgType], body: F) -> Self
    where
        R: Any + Send,
        F: Fn(&mut T, &Args) -> Result<R> + Send + Sync + 'static,
    {
        let member = format!("{}.{name}", self.class.name);
        let call: MethodFn = Box::new(move |receiver: Option<&mut dyn Any>, args: &Args| {
            let receiver = receiver.ok_or_else(|| {
                Error::illegal_access(format!("{member} needs an instance"))
            })?;
            let this = receiver.downcast_mut::<T>().ok_or_else(|| {
                Error::illegal_access(format!("{member} called on a value that is not a {}", type_name::<T>()))
            })?;
            body(this, args).map(|value| Box::new(value) as Value)
        });
        self.class.methods.push(Method {
            name: name.to_string(),
            is_static: false,
            params: params.to_vec(),
            call,
        });
        self
    }

    /// Registers a static method; any receiver passed in is ignored.
    #[must_use]
    pub fn static_method<R, F>(mut self, name: &str, params: &[ArgType], body: F) -> Self
    where
        R: Any + Send,
        F: Fn(&Args) -> Result<R> + Send + Sync + 'static,
    {
        let call: MethodFn = Box::new(move |_receiver: Option<&mut dyn Any>, args: &Args| {
            body(args).map(|value| Box::new(value) as Value)
        });
        self.class.methods.push(Method {
            name: name.to_string(),
            is_static: true,
            params: params.to_vec(),
            call,
        });
        self
    }

    /// Registers an instance field through a pair of projections.
    #[must_use]
    pub fn field<V, G, S>(mut self, name: &str, get: G, set: S) -> Self
    where
        V: Any + Clone + Send,
        G: Fn(&T) -> &V + Send + Sync + 'static,
        S: Fn(&mut T) -> &mut V + Send + Sync + 'static,
    {
        let member = format!("{}.{name}", self.class.name);
        let get_member = member.clone();
        let getter: GetterFn = Box::new(move |receiver: Option<&dyn Any>| {
            let this = receiver
                .ok_or_else(|| Error::illegal_access(format!("{get_member} needs an instance")))?
                .downcast_ref::<T>()
                .ok_or_else(|| Error::illegal_access(format!("{get_member} read from the wrong type")))?;
            Ok(Box::new(get(this).clone()) as Value)
        });
        let setter: SetterFn = Box::new(move |receiver: Option<&mut dyn Any>, value: Value| {
            let this = receiver
                .ok_or_else(|| Error::illegal_access(format!("{member} needs an instance")))?
                .downcast_mut::<T>()
                .ok_or_else(|| Error::illegal_access(format!("{member} written on the wrong type")))?;
            let value = value.downcast::<V>().map_err(|_| {
                Error::illegal_argument(format!("{member} holds a {}", type_name::<V>()))
            })?;
            *set(this) = *value;
            Ok(())
        });
        self.class.fields.push(Field {
            name: name.to_string(),
            is_static: false,
            get: getter,
            set: setter,
        });
        self
    }

    /// Registers a static field backed by a shared cell.
    #[must_use]
    pub fn static_field<V>(mut self, name: &str, cell: Arc<Mutex<V>>) -> Self
    where
        V: Any + Clone + Send,
    {
        let member = format!("{}.{name}", self.class.name);
        let read = Arc::clone(&cell);
        let getter: GetterFn =
            Box::new(move |_receiver: Option<&dyn Any>| Ok(Box::new(read.lock().clone()) as Value));
        let setter: SetterFn = Box::new(move |_receiver: Option<&mut dyn Any>, value: Value| {
            let value = value.downcast::<V>().map_err(|_| {
                Error::illegal_argument(format!("{member} holds a {}", type_name::<V>()))
            })?;
            *cell.lock() = *value;
            Ok(())
        });
        self.class.fields.push(Field {
            name: name.to_string(),
            is_static: true,
            get: getter,
            set: setter,
        });
        self
    }

    /// Makes `parent` the ancestor of this class. Lookups that miss on this
    /// class continue on `parent`, reaching it through [`Inherits`].
    #[must_use]
    pub fn extends(mut self, parent: Arc<Class>) -> Self
    where
        T: Inherits,
    {
        self.class.parent = Some(Parent {
            class: parent,
            project: project::<T>,
            project_mut: project_mut::<T>,
        });
        self
    }

    /// Finishes the class.
    #[must_use]
    pub fn build(self) -> Arc<Class> {
        Arc::new(self.class)
    }
}

fn project<T: Inherits>(this: &dyn Any) -> Option<&dyn Any> {
    this.downcast_ref::<T>().map(|t| t.parent() as &dyn Any)
}

fn project_mut<T: Inherits>(this: &mut dyn Any) -> Option<&mut dyn Any> {
    this.downcast_mut::<T>().map(|t| t.parent_mut() as &mut dyn Any)
}

impl<T> fmt::Debug for ClassBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClassBuilder").field(&self.class).finish()
    }
}
