//! Enum constant round-trip checks.

use std::any::Any;
use std::fmt::Debug;

use crate::error::{Error, Result};
use crate::reflect::args::{ArgType, Args};
use crate::reflect::class::{Class, ClassBuilder};

/// A fieldless enum whose constants can be listed and named.
pub trait Enumerated: Any + Clone + PartialEq + Debug + Send + Sync {
    /// Every constant, in declaration order.
    fn constants() -> Vec<Self>;

    /// The constant's name.
    fn name(&self) -> &'static str;
}

impl<E: Enumerated> ClassBuilder<E> {
    /// Starts a class for an enum with static `values` and `valueOf(String)`
    /// methods and an instance `name` method already registered.
    #[must_use]
    pub fn enumeration(name: impl Into<String>) -> Self {
        let class_name: String = name.into();
        let missing = class_name.clone();
        Self::new(class_name)
            .static_method("values", &[], |_| Ok(E::constants()))
            .static_method("valueOf", &[ArgType::of::<String>()], move |args| {
                let wanted: String = args.get(0)?;
                E::constants()
                    .into_iter()
                    .find(|c| c.name() == wanted)
                    .ok_or_else(|| Error::invocation(format!("No enum constant {missing}.{wanted}")))
            })
            .method("name", &[], |this: &mut E, _| Ok(this.name().to_string()))
    }
}

/// Checks that the first constant of an enum class survives a
/// `values` → `name` → `valueOf` round trip.
///
/// # Errors
///
/// - [`Error::NoSuchMethod`] if `class` has no `values`, `name` or `valueOf`
///   member, which is the case for any class not built as an enum.
/// - [`Error::TypeMismatch`] if the constants are not `E`s.
/// - [`Error::EmptyEnum`] if there are no constants.
/// - [`Error::AssertionFailed`] if `valueOf` returns a different constant.
///
/// # Example
///
/// ```rust
/// use testkit_executor::reflect::{verify_enum_statics, ClassBuilder, Enumerated};
///
/// #[derive(Clone, Debug, PartialEq)]
/// enum Light {
///     Red,
///     Green,
/// }
///
/// impl Enumerated for Light {
///     fn constants() -> Vec<Self> {
///         vec![Light::Red, Light::Green]
///     }
///
///     fn name(&self) -> &'static str {
///         match self {
///             Light::Red => "Red",
///             Light::Green => "Green",
///         }
///     }
/// }
///
/// let class = ClassBuilder::<Light>::enumeration("Light").build();
/// verify_enum_statics::<Light>(&class).unwrap();
/// ```
pub fn verify_enum_statics<E>(class: &Class) -> Result<()>
where
    E: Any + Clone + PartialEq + Debug,
{
    let values: Vec<E> = super::invoke_static(class, "values", &[], &Args::new())?;
    let first = values
        .first()
        .cloned()
        .ok_or_else(|| Error::EmptyEnum(class.name().to_string()))?;

    let mut receiver = first.clone();
    let name: String = super::invoke(&mut receiver, class, "name", &[], &Args::new())?;
    let found: E = super::invoke_static(
        class,
        "valueOf",
        &[ArgType::of::<String>()],
        &Args::new().with(name.clone()),
    )?;

    if found == first {
        Ok(())
    } else {
        Err(Error::AssertionFailed(format!(
            "{}.valueOf({name}) returned {found:?}, expected {first:?}",
            class.name()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    enum Axis {
        X,
        Y,
    }

    impl Enumerated for Axis {
        fn constants() -> Vec<Self> {
            vec![Axis::X, Axis::Y]
        }

        fn name(&self) -> &'static str {
            match self {
                Axis::X => "X",
                Axis::Y => "Y",
            }
        }
    }

    #[derive(Clone, Debug, PartialEq)]
    enum Never {}

    impl Enumerated for Never {
        fn constants() -> Vec<Self> {
            Vec::new()
        }

        fn name(&self) -> &'static str {
            match *self {}
        }
    }

    #[derive(Clone, Debug, PartialEq)]
    enum Mislabeled {
        A,
        B,
    }

    /// A class whose `valueOf` ignores its argument.
    fn broken_value_of() -> std::sync::Arc<Class> {
        ClassBuilder::<Mislabeled>::new("Mislabeled")
            .static_method("values", &[], |_| Ok(vec![Mislabeled::A, Mislabeled::B]))
            .static_method("valueOf", &[ArgType::of::<String>()], |_| Ok(Mislabeled::B))
            .method("name", &[], |this: &mut Mislabeled, _| Ok(format!("{this:?}")))
            .build()
    }

    #[test]
    fn test_enum_round_trip_passes() {
        let class = ClassBuilder::<Axis>::enumeration("Axis").build();
        assert!(verify_enum_statics::<Axis>(&class).is_ok());
    }

    #[test]
    fn test_empty_enum_fails() {
        let class = ClassBuilder::<Never>::enumeration("Never").build();
        let err = verify_enum_statics::<Never>(&class).unwrap_err();
        assert!(matches!(err, Error::EmptyEnum(ref name) if name == "Never"));
    }

    #[test]
    fn test_non_enum_class_fails() {
        struct Plain;
        let class = ClassBuilder::<Plain>::new("Plain").build();

        let err = verify_enum_statics::<Axis>(&class).unwrap_err();
        assert!(matches!(err, Error::NoSuchMethod { ref name, .. } if name == "values"));
    }

    #[test]
    fn test_wrong_constant_type_fails() {
        let class = ClassBuilder::<Axis>::enumeration("Axis").build();
        let err = verify_enum_statics::<Mislabeled>(&class).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
    }

    #[test]
    fn test_mismatched_round_trip_fails() {
        let class = broken_value_of();
        let err = verify_enum_statics::<Mislabeled>(&class).unwrap_err();
        assert!(matches!(err, Error::AssertionFailed(_)));
        assert!(err.to_string().contains("valueOf(A) returned B"));
    }

    #[test]
    fn test_value_of_unknown_name_fails() {
        let class = ClassBuilder::<Axis>::enumeration("Axis").build();
        let err = super::super::invoke_static::<Axis>(
            &class,
            "valueOf",
            &[ArgType::of::<String>()],
            &crate::args!["Z".to_string()],
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Invocation failed: No enum constant Axis.Z");
    }
}
