//! Reflection scenarios: reaching hidden members of a small type hierarchy.

use std::sync::Arc;

use parking_lot::Mutex;
use testkit_executor::args;
use testkit_executor::prelude::*;
use testkit_executor::reflect::{self, verify_enum_statics};

/// A connection pool whose constructor and counters are not public API.
#[derive(Debug, Clone, PartialEq)]
struct Pool {
    size: usize,
    leased: usize,
}

impl Pool {
    fn hidden_new() -> Self {
        Self { size: 4, leased: 0 }
    }
}

/// A pool that also tracks a label, reusing everything registered on `Pool`.
#[derive(Debug)]
struct LabeledPool {
    pool: Pool,
    label: String,
}

impl Inherits for LabeledPool {
    type Parent = Pool;

    fn parent(&self) -> &Pool {
        &self.pool
    }

    fn parent_mut(&mut self) -> &mut Pool {
        &mut self.pool
    }
}

fn pool_class(instances: Arc<Mutex<u32>>) -> Arc<Class> {
    ClassBuilder::<Pool>::new("Pool")
        .constructor(&[], |_| Ok(Pool::hidden_new()))
        .constructor(&[ArgType::of::<usize>()], |args| {
            Ok(Pool {
                size: args.get(0)?,
                leased: 0,
            })
        })
        .method("lease", &[], |this: &mut Pool, _| {
            if this.leased == this.size {
                return Err(Error::invocation("pool exhausted"));
            }
            this.leased += 1;
            Ok(this.leased)
        })
        .method("resize", &[ArgType::of::<usize>()], |this: &mut Pool, args| {
            this.size = args.get(0)?;
            Ok(())
        })
        .field("leased", |p: &Pool| &p.leased, |p: &mut Pool| &mut p.leased)
        .static_field("instances", instances)
        .build()
}

fn labeled_class(parent: Arc<Class>) -> Arc<Class> {
    ClassBuilder::<LabeledPool>::new("LabeledPool")
        .constructor(&[ArgType::of::<String>()], |args| {
            Ok(LabeledPool {
                pool: Pool::hidden_new(),
                label: args.get(0)?,
            })
        })
        .field(
            "label",
            |p: &LabeledPool| &p.label,
            |p: &mut LabeledPool| &mut p.label,
        )
        .extends(parent)
        .build()
}

#[test]
fn test_hidden_constructor_yields_instance() {
    let class = pool_class(Arc::new(Mutex::new(0)));

    let pool: Pool = reflect::construct(&class, &[], &args![]).unwrap();
    assert_eq!(pool, Pool::hidden_new());

    let sized: Pool =
        reflect::construct(&class, &[ArgType::of::<usize>()], &args![16usize]).unwrap();
    assert_eq!(sized.size, 16);
}

#[test]
fn test_misspelled_method_fails() {
    let class = pool_class(Arc::new(Mutex::new(0)));
    let mut pool = Pool::hidden_new();

    let err = reflect::invoke::<usize>(&mut pool, &class, "lesae", &[], &args![]).unwrap_err();
    assert!(matches!(err, Error::NoSuchMethod { ref name, .. } if name == "lesae"));
}

#[test]
fn test_method_errors_propagate_unchanged() {
    let class = pool_class(Arc::new(Mutex::new(0)));
    let mut pool = Pool { size: 1, leased: 0 };

    let first: usize = reflect::invoke(&mut pool, &class, "lease", &[], &args![]).unwrap();
    assert_eq!(first, 1);

    let err = reflect::invoke::<usize>(&mut pool, &class, "lease", &[], &args![]).unwrap_err();
    assert_eq!(err.to_string(), "Invocation failed: pool exhausted");
}

#[test]
fn test_wrong_parameter_types_do_not_match() {
    let class = pool_class(Arc::new(Mutex::new(0)));
    let mut pool = Pool::hidden_new();

    let err = reflect::invoke::<()>(
        &mut pool,
        &class,
        "resize",
        &[ArgType::of::<u32>()],
        &args![8u32],
    )
    .unwrap_err();
    assert!(matches!(err, Error::NoSuchMethod { .. }));
}

#[test]
fn test_fields_read_and_write() {
    let instances = Arc::new(Mutex::new(0u32));
    let class = pool_class(Arc::clone(&instances));
    let mut pool = Pool::hidden_new();

    reflect::set_field(&mut pool, &class, "leased", 3usize).unwrap();
    assert_eq!(pool.leased, 3);
    let leased: usize = reflect::get_field(&pool, &class, "leased").unwrap();
    assert_eq!(leased, 3);

    reflect::set_static_field(&class, "instances", 9u32).unwrap();
    assert_eq!(*instances.lock(), 9);
    let read: u32 = reflect::get_static_field(&class, "instances").unwrap();
    assert_eq!(read, 9);
}

#[test]
fn test_members_found_on_ancestor() {
    let class = labeled_class(pool_class(Arc::new(Mutex::new(0))));

    let mut pool: LabeledPool =
        reflect::construct(&class, &[ArgType::of::<String>()], &args!["db".to_string()])
            .unwrap();

    let leased: usize = reflect::invoke(&mut pool, &class, "lease", &[], &args![]).unwrap();
    assert_eq!(leased, 1);
    assert_eq!(pool.pool.leased, 1);

    let label: String = reflect::get_field(&pool, &class, "label").unwrap();
    assert_eq!(label, "db");
    let leased: usize = reflect::get_field(&pool, &class, "leased").unwrap();
    assert_eq!(leased, 1);
}

#[test]
fn test_constructors_are_not_inherited() {
    let class = labeled_class(pool_class(Arc::new(Mutex::new(0))));

    let err = reflect::construct::<LabeledPool>(&class, &[], &args![]).unwrap_err();
    assert!(matches!(err, Error::NoSuchConstructor { .. }));
}

#[test]
fn test_missing_field_fails_after_root() {
    let class = labeled_class(pool_class(Arc::new(Mutex::new(0))));
    let pool = LabeledPool {
        pool: Pool::hidden_new(),
        label: String::new(),
    };

    let err = reflect::get_field::<usize>(&pool, &class, "capacity").unwrap_err();
    assert!(matches!(err, Error::NoSuchField { ref class, .. } if class == "LabeledPool"));
}

#[test]
fn test_instance_member_needs_receiver() {
    let class = pool_class(Arc::new(Mutex::new(0)));

    let err = reflect::invoke_static::<usize>(&class, "lease", &[], &args![]).unwrap_err();
    assert!(matches!(err, Error::IllegalAccess(_)));
}

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

#[test]
fn test_enum_statics_round_trip() {
    let class = ClassBuilder::<Axis>::enumeration("Axis").build();
    verify_enum_statics::<Axis>(&class).unwrap();
}

#[test]
fn test_enum_check_rejects_plain_class() {
    let class = pool_class(Arc::new(Mutex::new(0)));
    let err = verify_enum_statics::<Axis>(&class).unwrap_err();
    assert!(matches!(err, Error::NoSuchMethod { .. }));
}
