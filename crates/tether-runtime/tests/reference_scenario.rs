//! End-to-end binding lifecycle between a text source and an int target.
//!
//! Walks one pair of objects through every ownership mode in order:
//! unbound writes, default binding, explicit unbind, scope release,
//! sync-create, and a managed binding that outlives its handle.

use tether_core::{Object, Property};
use tether_runtime::{Binding, BindingFlags, bind_property_full, transform};

struct Fixture {
    source: Object,
    target: Object,
}

impl Fixture {
    fn new() -> Self {
        tether_core::init();
        Self {
            source: Object::new("StringSource")
                .with_property("string", "")
                .unwrap(),
            target: Object::new("IntTarget").with_property("int", 0).unwrap(),
        }
    }

    fn string(&self) -> Property {
        self.source.property("string").unwrap()
    }

    fn int(&self) -> Property {
        self.target.property("int").unwrap()
    }

    fn set_source(&self, text: &str) {
        self.string().set(text).unwrap();
    }

    fn target_value(&self) -> i32 {
        self.int().get_as::<i32>().unwrap()
    }

    fn create_binding(&self, flags: BindingFlags) -> Binding {
        bind_property_full(
            &self.source,
            "string",
            &self.target,
            "int",
            flags,
            Some(transform::string_to_int()),
            None,
        )
        .unwrap()
    }
}

fn with_test_logging(f: impl FnOnce()) {
    let subscriber = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::with_default(subscriber, f);
}

#[test]
fn full_lifecycle() {
    with_test_logging(|| {
        let fx = Fixture::new();

        // Nothing is bound yet.
        fx.int().set(7).unwrap();
        fx.set_source("42");
        assert_eq!(fx.target_value(), 7);

        {
            let binding = fx.create_binding(BindingFlags::DEFAULT);

            // Without SYNC_CREATE only later changes sync.
            assert_eq!(fx.target_value(), 7);

            // An empty string is not a zero.
            fx.set_source("");
            assert_eq!(fx.target_value(), 7);

            fx.set_source("47");
            assert_eq!(fx.target_value(), 47);

            fx.set_source("six six six");
            assert_eq!(fx.target_value(), 47);

            binding.unbind();
            fx.set_source("666");
            assert_eq!(fx.target_value(), 47);
        }

        // Released when the handle went out of scope.
        fx.set_source("89");
        assert_eq!(fx.target_value(), 47);

        {
            let _binding = fx.create_binding(BindingFlags::SYNC_CREATE);
            assert_eq!(fx.target_value(), 89);
        }

        fx.set_source("97");
        assert_eq!(fx.target_value(), 89);

        {
            let binding = fx.create_binding(BindingFlags::DEFAULT);
            binding.manage();

            fx.set_source("1999");
            assert_eq!(fx.target_value(), 1999);
        }

        // The managed binding outlives its handle.
        fx.set_source("2001");
        assert_eq!(fx.target_value(), 2001);
    });
}

#[test]
fn scope_release_without_unbind() {
    let fx = Fixture::new();
    fx.int().set(47).unwrap();
    {
        let binding = fx.create_binding(BindingFlags::DEFAULT);
        assert!(binding.is_bound());
    }
    fx.set_source("89");
    assert_eq!(fx.target_value(), 47);
    assert_eq!(fx.string().live_subscriber_count(), 0);
}

#[test]
fn managed_binding_lives_until_explicit_unbind() {
    let fx = Fixture::new();
    let binding = fx.create_binding(BindingFlags::DEFAULT);
    let id = binding.manage();
    let kept = binding.clone();
    drop(binding);

    fx.set_source("2001");
    assert_eq!(fx.target_value(), 2001);
    assert!(fx.source.registry().contains(id));

    kept.unbind();
    kept.unbind();
    assert!(!fx.source.registry().contains(id));

    fx.set_source("3");
    assert_eq!(fx.target_value(), 2001);
}

#[test]
fn registry_clear_tears_down_managed_bindings() {
    let fx = Fixture::new();
    let binding = fx.create_binding(BindingFlags::DEFAULT);
    binding.manage();
    drop(binding);

    fx.source.registry().clear();
    fx.set_source("5");
    assert_eq!(fx.target_value(), 0);
}

#[test]
fn other_target_observers_see_binding_writes() {
    let fx = Fixture::new();
    let seen = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
    let seen_clone = std::rc::Rc::clone(&seen);
    let _sub = fx
        .int()
        .subscribe(move |v| seen_clone.borrow_mut().push(v.get::<i32>().unwrap_or(-1)));

    let _binding = fx.create_binding(BindingFlags::DEFAULT);
    fx.set_source("1");
    fx.set_source("x");
    fx.set_source("1");
    assert_eq!(*seen.borrow(), vec![1, 1]);
}
