//! Name-based access to members a test cannot otherwise reach.
//!
//! Rust has no runtime reflection, so members are registered up front on a
//! [`Class`] with [`ClassBuilder`]. The functions in this module then look
//! them up by name and parameter types, the way a test would poke at a
//! private constructor, method or field:
//!
//! - [`construct`] - call a constructor declared on the class itself
//! - [`invoke`] / [`invoke_static`] - call a method
//! - [`get_field`] / [`set_field`] and their static variants - read or
//!   write a field
//! - [`verify_enum_statics`] - check an enum's constant lookup round trip
//!
//! Method and field lookups that miss on a class continue on its ancestors
//! (see [`Inherits`] and [`ClassBuilder::extends`]) and fail once the root
//! has been searched.
//!
//! # Example
//!
//! ```rust
//! use testkit_executor::reflect::{self, ClassBuilder, Inherits};
//! use testkit_executor::{args, Error};
//!
//! struct Base {
//!     id: u64,
//! }
//!
//! struct Derived {
//!     base: Base,
//! }
//!
//! impl Inherits for Derived {
//!     type Parent = Base;
//!     fn parent(&self) -> &Base {
//!         &self.base
//!     }
//!     fn parent_mut(&mut self) -> &mut Base {
//!         &mut self.base
//!     }
//! }
//!
//! let base = ClassBuilder::<Base>::new("Base")
//!     .method("id", &[], |this, _| Ok(this.id))
//!     .build();
//! let derived = ClassBuilder::<Derived>::new("Derived").extends(base).build();
//!
//! let mut value = Derived { base: Base { id: 7 } };
//! let id: u64 = reflect::invoke(&mut value, &derived, "id", &[], &args![]).unwrap();
//! assert_eq!(id, 7);
//!
//! let err = reflect::invoke::<u64>(&mut value, &derived, "idd", &[], &args![]).unwrap_err();
//! assert!(matches!(err, Error::NoSuchMethod { .. }));
//! ```

use std::any::{type_name, Any};

use tracing::trace;

use crate::error::{Error, Result};

mod args;
mod class;
mod enums;

pub use args::{ArgType, Args, Value};
pub use class::{Class, ClassBuilder, Inherits};
pub use enums::{verify_enum_statics, Enumerated};

use args::signature;
use class::Parent;

/// A member found on `class` or one of its ancestors, with the parent links
/// crossed to reach it.
struct Resolved<'c, M> {
    member: &'c M,
    path: Vec<&'c Parent>,
}

/// Searches `class` and then each ancestor in turn.
fn resolve<'c, M>(
    class: &'c Class,
    find: impl Fn(&'c Class) -> Option<&'c M>,
) -> Option<Resolved<'c, M>> {
    let mut current = class;
    let mut path = Vec::new();
    loop {
        if let Some(member) = find(current) {
            trace!(
                class = class.name(),
                declared_on = current.name(),
                depth = path.len(),
                "member resolved"
            );
            return Some(Resolved { member, path });
        }
        let parent = current.parent_link()?;
        path.push(parent);
        current = &parent.class;
    }
}

fn upcast<'a>(mut this: &'a dyn Any, path: &[&Parent]) -> Result<&'a dyn Any> {
    for parent in path {
        this = (parent.project)(this).ok_or_else(|| {
            Error::illegal_access(format!(
                "value cannot be viewed as {}",
                parent.class.name()
            ))
        })?;
    }
    Ok(this)
}

fn upcast_mut<'a>(mut this: &'a mut dyn Any, path: &[&Parent]) -> Result<&'a mut dyn Any> {
    for parent in path {
        this = (parent.project_mut)(this).ok_or_else(|| {
            Error::illegal_access(format!(
                "value cannot be viewed as {}",
                parent.class.name()
            ))
        })?;
    }
    Ok(this)
}

fn cast<T: Any>(value: Value, member: impl FnOnce() -> String) -> Result<T> {
    value
        .downcast::<T>()
        .map(|boxed| *boxed)
        .map_err(|_| Error::TypeMismatch {
            member: member(),
            expected: type_name::<T>(),
        })
}

/// Calls the constructor declared on `class` that takes exactly `params`.
///
/// Constructors are not inherited, so ancestors are not searched.
///
/// # Errors
///
/// [`Error::NoSuchConstructor`] if no constructor matches, any error from
/// the constructor itself, or [`Error::TypeMismatch`] if it does not build
/// a `T`.
pub fn construct<T: Any>(class: &Class, params: &[ArgType], args: &Args) -> Result<T> {
    let ctor = class
        .declared_constructor(params)
        .ok_or_else(|| Error::NoSuchConstructor {
            class: class.name().to_string(),
            signature: signature(params),
        })?;
    trace!(class = class.name(), "constructing");
    cast((ctor.call)(args)?, || format!("{}::new", class.name()))
}

/// Calls the instance method `name` taking exactly `params` on `instance`.
///
/// A static method found this way is called without `instance`.
///
/// # Errors
///
/// [`Error::NoSuchMethod`] if neither `class` nor any ancestor declares the
/// method, [`Error::IllegalAccess`] if `instance` is not a value of `class`,
/// any error from the method itself, or [`Error::TypeMismatch`] if the
/// method does not return an `R`.
pub fn invoke<R: Any>(
    instance: &mut dyn Any,
    class: &Class,
    name: &str,
    params: &[ArgType],
    args: &Args,
) -> Result<R> {
    call_method(Some(instance), class, name, params, args)
}

/// Calls the static method `name` taking exactly `params`.
///
/// # Errors
///
/// As for [`invoke`]; calling an instance method this way is an
/// [`Error::IllegalAccess`].
pub fn invoke_static<R: Any>(
    class: &Class,
    name: &str,
    params: &[ArgType],
    args: &Args,
) -> Result<R> {
    call_method(None, class, name, params, args)
}

fn call_method<R: Any>(
    instance: Option<&mut dyn Any>,
    class: &Class,
    name: &str,
    params: &[ArgType],
    args: &Args,
) -> Result<R> {
    let Some(resolved) = resolve(class, |c| c.declared_method(name, params)) else {
        return Err(Error::NoSuchMethod {
            class: class.name().to_string(),
            name: name.to_string(),
            signature: signature(params),
        });
    };
    let receiver = match instance {
        Some(this) if !resolved.member.is_static => Some(upcast_mut(this, &resolved.path)?),
        _ => None,
    };
    let value = (resolved.member.call)(receiver, args)?;
    cast(value, || format!("{}.{name}", class.name()))
}

/// Reads the instance field `name` of `instance`.
///
/// A static field found this way is read without `instance`.
///
/// # Errors
///
/// [`Error::NoSuchField`] if neither `class` nor any ancestor declares the
/// field, [`Error::IllegalAccess`] if `instance` is not a value of `class`,
/// or [`Error::TypeMismatch`] if the field is not a `V`.
pub fn get_field<V: Any>(instance: &dyn Any, class: &Class, name: &str) -> Result<V> {
    read_field(Some(instance), class, name)
}

/// Reads the static field `name`.
///
/// # Errors
///
/// As for [`get_field`].
pub fn get_static_field<V: Any>(class: &Class, name: &str) -> Result<V> {
    read_field(None, class, name)
}

fn read_field<V: Any>(instance: Option<&dyn Any>, class: &Class, name: &str) -> Result<V> {
    let resolved = resolve(class, |c| c.declared_field(name))
        .ok_or_else(|| no_such_field(class, name))?;
    let receiver = match instance {
        Some(this) if !resolved.member.is_static => Some(upcast(this, &resolved.path)?),
        _ => None,
    };
    let value = (resolved.member.get)(receiver)?;
    cast(value, || format!("{}.{name}", class.name()))
}

/// Writes the instance field `name` of `instance`.
///
/// A static field found this way is written without `instance`.
///
/// # Errors
///
/// [`Error::NoSuchField`] if neither `class` nor any ancestor declares the
/// field, [`Error::IllegalAccess`] if `instance` is not a value of `class`,
/// or [`Error::IllegalArgument`] if `value` is not of the field's type.
pub fn set_field<V: Any + Send>(
    instance: &mut dyn Any,
    class: &Class,
    name: &str,
    value: V,
) -> Result<()> {
    write_field(Some(instance), class, name, Box::new(value))
}

/// Writes the static field `name`.
///
/// # Errors
///
/// As for [`set_field`].
pub fn set_static_field<V: Any + Send>(class: &Class, name: &str, value: V) -> Result<()> {
    write_field(None, class, name, Box::new(value))
}

fn write_field(
    instance: Option<&mut dyn Any>,
    class: &Class,
    name: &str,
    value: Value,
) -> Result<()> {
    let resolved = resolve(class, |c| c.declared_field(name))
        .ok_or_else(|| no_such_field(class, name))?;
    let receiver = match instance {
        Some(this) if !resolved.member.is_static => Some(upcast_mut(this, &resolved.path)?),
        _ => None,
    };
    (resolved.member.set)(receiver, value)
}

fn no_such_field(class: &Class, name: &str) -> Error {
    Error::NoSuchField {
        class: class.name().to_string(),
        name: name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use parking_lot::Mutex;

    use crate::args;

    struct Animal {
        legs: u32,
    }

    struct Dog {
        animal: Animal,
        name: String,
    }

    struct Puppy {
        dog: Dog,
    }

    impl Inherits for Dog {
        type Parent = Animal;
        fn parent(&self) -> &Animal {
            &self.animal
        }
        fn parent_mut(&mut self) -> &mut Animal {
            &mut self.animal
        }
    }

    impl Inherits for Puppy {
        type Parent = Dog;
        fn parent(&self) -> &Dog {
            &self.dog
        }
        fn parent_mut(&mut self) -> &mut Dog {
            &mut self.dog
        }
    }

    fn classes() -> (Arc<Class>, Arc<Class>, Arc<Class>) {
        let animal = ClassBuilder::<Animal>::new("Animal")
            .constructor(&[], |_| Ok(Animal { legs: 4 }))
            .method("legs", &[], |this, _| Ok(this.legs))
            .method("describe", &[], |this, _| Ok(format!("{} legs", this.legs)))
            .field("legs", |a| &a.legs, |a| &mut a.legs)
            .build();
        let dog = ClassBuilder::<Dog>::new("Dog")
            .extends(Arc::clone(&animal))
            .method("describe", &[], |this, _| Ok(format!("dog {}", this.name)))
            .method("rename", &[ArgType::of::<String>()], |this, args| {
                this.name = args.get(0)?;
                Ok(())
            })
            .field("name", |d| &d.name, |d| &mut d.name)
            .build();
        let puppy = ClassBuilder::<Puppy>::new("Puppy")
            .extends(Arc::clone(&dog))
            .build();
        (animal, dog, puppy)
    }

    fn puppy() -> Puppy {
        Puppy {
            dog: Dog {
                animal: Animal { legs: 4 },
                name: "rex".to_string(),
            },
        }
    }

    #[test]
    fn test_construct_hidden_zero_arg() {
        let (animal, _, _) = classes();
        let value: Animal = construct(&animal, &[], &args![]).unwrap();
        assert_eq!(value.legs, 4);
    }

    #[test]
    fn test_construct_wrong_signature() {
        let (animal, _, _) = classes();
        let err = construct::<Animal>(&animal, &[ArgType::of::<u32>()], &args![1_u32])
            .err()
            .unwrap();
        assert!(matches!(err, Error::NoSuchConstructor { .. }));
    }

    #[test]
    fn test_constructors_are_not_inherited() {
        let (_, dog, _) = classes();
        let err = construct::<Animal>(&dog, &[], &args![]).err().unwrap();
        assert!(matches!(err, Error::NoSuchConstructor { ref class, .. } if class == "Dog"));
    }

    #[test]
    fn test_invoke_walks_two_ancestors() {
        let (_, _, puppy_class) = classes();
        let mut value = puppy();

        let legs: u32 = invoke(&mut value, &puppy_class, "legs", &[], &args![]).unwrap();
        assert_eq!(legs, 4);
    }

    #[test]
    fn test_nearest_declaration_wins() {
        let (_, _, puppy_class) = classes();
        let mut value = puppy();

        let text: String = invoke(&mut value, &puppy_class, "describe", &[], &args![]).unwrap();
        assert_eq!(text, "dog rex");
    }

    #[test]
    fn test_invoke_with_arguments_mutates() {
        let (_, dog, _) = classes();
        let mut value = puppy().dog;

        invoke::<()>(
            &mut value,
            &dog,
            "rename",
            &[ArgType::of::<String>()],
            &args!["max".to_string()],
        )
        .unwrap();
        assert_eq!(value.name, "max");
    }

    #[test]
    fn test_misspelled_method_fails() {
        let (_, _, puppy_class) = classes();
        let mut value = puppy();

        let err = invoke::<u32>(&mut value, &puppy_class, "lges", &[], &args![]).unwrap_err();
        match err {
            Error::NoSuchMethod { class, name, .. } => {
                assert_eq!(class, "Puppy");
                assert_eq!(name, "lges");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_overload_needs_matching_params() {
        let (_, dog, _) = classes();
        let mut value = puppy().dog;

        let err = invoke::<()>(&mut value, &dog, "rename", &[], &args![]).unwrap_err();
        assert!(matches!(err, Error::NoSuchMethod { ref signature, .. } if signature == "()"));
    }

    #[test]
    fn test_invoke_on_wrong_instance_is_illegal() {
        let (_, dog, _) = classes();
        let mut not_a_dog = Animal { legs: 3 };

        let err = invoke::<u32>(&mut not_a_dog, &dog, "legs", &[], &args![]).unwrap_err();
        assert!(matches!(err, Error::IllegalAccess(_)));
    }

    #[test]
    fn test_invoke_static_on_instance_method_is_illegal() {
        let (animal, _, _) = classes();
        let err = invoke_static::<u32>(&animal, "legs", &[], &args![]).unwrap_err();
        assert!(matches!(err, Error::IllegalAccess(_)));
    }

    #[test]
    fn test_wrong_result_type() {
        let (animal, _, _) = classes();
        let mut value = Animal { legs: 2 };
        let err = invoke::<String>(&mut value, &animal, "legs", &[], &args![]).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
    }

    #[test]
    fn test_method_errors_propagate() {
        let class = ClassBuilder::<Animal>::new("Animal")
            .method("fail", &[], |_, _| Err::<(), _>(Error::invocation("refused")))
            .build();
        let mut value = Animal { legs: 0 };

        let err = invoke::<()>(&mut value, &class, "fail", &[], &args![]).unwrap_err();
        assert_eq!(err.to_string(), "Invocation failed: refused");
    }

    #[test]
    fn test_fields_through_ancestors() {
        let (_, _, puppy_class) = classes();
        let mut value = puppy();

        assert_eq!(get_field::<u32>(&value, &puppy_class, "legs").unwrap(), 4);
        set_field(&mut value, &puppy_class, "legs", 3_u32).unwrap();
        assert_eq!(value.dog.animal.legs, 3);

        set_field(&mut value, &puppy_class, "name", "fido".to_string()).unwrap();
        assert_eq!(
            get_field::<String>(&value, &puppy_class, "name").unwrap(),
            "fido"
        );
    }

    #[test]
    fn test_missing_field_fails() {
        let (_, _, puppy_class) = classes();
        let mut value = puppy();

        let err = get_field::<u32>(&value, &puppy_class, "tail").unwrap_err();
        assert!(matches!(err, Error::NoSuchField { .. }));
        let err = set_field(&mut value, &puppy_class, "tail", 1_u32).unwrap_err();
        assert!(matches!(err, Error::NoSuchField { .. }));
    }

    #[test]
    fn test_set_field_wrong_type() {
        let (animal, _, _) = classes();
        let mut value = Animal { legs: 4 };
        let err = set_field(&mut value, &animal, "legs", "four").unwrap_err();
        assert!(matches!(err, Error::IllegalArgument(_)));
        assert_eq!(value.legs, 4);
    }

    #[test]
    fn test_instance_field_without_instance_is_illegal() {
        let (animal, _, _) = classes();
        let err = get_static_field::<u32>(&animal, "legs").unwrap_err();
        assert!(matches!(err, Error::IllegalAccess(_)));
    }

    #[test]
    fn test_static_members() {
        let registry = Arc::new(Mutex::new(10_u32));
        let base = ClassBuilder::<Animal>::new("Animal")
            .static_field("population", Arc::clone(&registry))
            .static_method("census", &[], |_| Ok("counted"))
            .build();
        let dog = ClassBuilder::<Dog>::new("Dog").extends(base).build();

        assert_eq!(get_static_field::<u32>(&dog, "population").unwrap(), 10);
        set_static_field(&dog, "population", 11_u32).unwrap();
        assert_eq!(*registry.lock(), 11);

        let census: &str = invoke_static(&dog, "census", &[], &args![]).unwrap();
        assert_eq!(census, "counted");
    }

    #[test]
    fn test_inherited_statics_ignore_receiver() {
        let registry = Arc::new(Mutex::new(5_u32));
        let base = ClassBuilder::<Animal>::new("Animal")
            .static_field("population", Arc::clone(&registry))
            .static_method("census", &[], |_| Ok("counted"))
            .build();
        let dog = ClassBuilder::<Dog>::new("Dog").extends(base).build();
        let mut not_a_dog = String::from("cat");

        assert_eq!(get_field::<u32>(&not_a_dog, &dog, "population").unwrap(), 5);
        set_field(&mut not_a_dog, &dog, "population", 6_u32).unwrap();
        assert_eq!(*registry.lock(), 6);

        let census: &str = invoke(&mut not_a_dog, &dog, "census", &[], &args![]).unwrap();
        assert_eq!(census, "counted");
    }
}
