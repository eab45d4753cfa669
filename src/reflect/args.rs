//! Parameter types and argument lists for registered members.

use std::any::{type_name, Any, TypeId};
use std::fmt;

use crate::error::{Error, Result};

/// A type-erased value passed to or returned from a registered member.
pub type Value = Box<dyn Any + Send>;

/// One entry of a member's parameter list.
///
/// Lookups match on the exact list of parameter types, the way overloads
/// are told apart.
#[derive(Clone, Copy)]
pub struct ArgType {
    id: TypeId,
    name: &'static str,
}

impl ArgType {
    /// The parameter type `T`.
    #[must_use]
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    /// Returns the type's name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for ArgType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ArgType {}

impl fmt::Debug for ArgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Renders a parameter list as `(a, b)`.
pub(crate) fn signature(params: &[ArgType]) -> String {
    let names: Vec<_> = params.iter().map(ArgType::name).collect();
    format!("({})", names.join(", "))
}

/// Arguments for a constructor or method call.
///
/// # Example
///
/// ```rust
/// use testkit_executor::args;
///
/// let args = args![7_u32, String::from("seven")];
/// assert_eq!(args.len(), 2);
/// assert_eq!(args.get::<u32>(0).unwrap(), 7);
/// assert!(args.get::<i64>(0).is_err());
/// ```
#[derive(Default)]
pub struct Args(Vec<Value>);

impl Args {
    /// An empty argument list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an argument.
    #[must_use]
    pub fn with<T: Any + Send>(mut self, value: T) -> Self {
        self.0.push(Box::new(value));
        self
    }

    /// Returns the number of arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no arguments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns a copy of the argument at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IllegalArgument`] if there is no such argument or it
    /// is not a `T`.
    pub fn get<T: Any + Clone>(&self, index: usize) -> Result<T> {
        let value = self
            .0
            .get(index)
            .ok_or_else(|| Error::illegal_argument(format!("missing argument {index}")))?;
        value.downcast_ref::<T>().cloned().ok_or_else(|| {
            Error::illegal_argument(format!(
                "argument {index} is not a {}",
                type_name::<T>()
            ))
        })
    }
}

impl fmt::Debug for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Args").field("len", &self.len()).finish()
    }
}

/// Builds an [`Args`] list from expressions.
#[macro_export]
macro_rules! args {
    () => {
        $crate::reflect::Args::new()
    };
    ($($value:expr),+ $(,)?) => {
        $crate::reflect::Args::new()$(.with($value))+
    };
}
