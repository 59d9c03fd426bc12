//! Convention Mixin and State Namespace Tests
//!
//! Property round-trips through the generic convention mixin, and the
//! scalar/list namespace separation.

use std::sync::Arc;

use serde_json::json;

use quilt::model::{convention, Capability, ConventionMixin, ModelBuilder, ModelRegistry};
use quilt::{CompositeInstance, CompositeModel, ModelBuildError};

fn item_model() -> Arc<CompositeModel> {
    Arc::new(
        ModelBuilder::new("Basket")
            .capability(
                Capability::new("Contents")
                    .method("getFoo")
                    .method("setFoo")
                    .method("addFoo")
                    .method("removeFoo")
                    .method("fooIterator"),
            )
            .mixin(convention::applies, ConventionMixin)
            .build()
            .unwrap(),
    )
}

// =============================================================================
// Property Round-Trips
// =============================================================================

/// set("foo", v) then get("foo") returns v.
#[test]
fn test_scalar_round_trip() {
    let mut basket = CompositeInstance::new(item_model());
    basket.invoke("setFoo", &[json!({"kind": "apple"})]).unwrap();
    assert_eq!(
        basket.invoke("getFoo", &[]).unwrap(),
        json!({"kind": "apple"})
    );
}

/// add("foo", x) then iterating "foo" yields x, without touching the
/// scalar "foo" value, and vice versa.
#[test]
fn test_scalar_and_list_namespaces_are_independent() {
    let mut basket = CompositeInstance::new(item_model());

    basket.invoke("addFoo", &[json!("x")]).unwrap();
    assert_eq!(basket.invoke("fooIterator", &[]).unwrap(), json!(["x"]));
    assert_eq!(basket.invoke("getFoo", &[]).unwrap(), json!(null));

    basket.invoke("setFoo", &[json!("scalar")]).unwrap();
    assert_eq!(basket.invoke("fooIterator", &[]).unwrap(), json!(["x"]));
    assert_eq!(basket.invoke("getFoo", &[]).unwrap(), json!("scalar"));
}

/// Removing a list element leaves other elements and the scalar intact.
#[test]
fn test_list_removal_is_scoped() {
    let mut basket = CompositeInstance::new(item_model());
    basket.invoke("setFoo", &[json!("keep")]).unwrap();
    basket.invoke("addFoo", &[json!(1)]).unwrap();
    basket.invoke("addFoo", &[json!(2)]).unwrap();

    assert_eq!(basket.invoke("removeFoo", &[json!(1)]).unwrap(), json!(true));
    assert_eq!(basket.invoke("fooIterator", &[]).unwrap(), json!([2]));
    assert_eq!(basket.invoke("getFoo", &[]).unwrap(), json!("keep"));
}

// =============================================================================
// Model Build Guarantees
// =============================================================================

/// A method outside the convention with no other mixin fails at
/// registration time, never at call time.
#[test]
fn test_unresolvable_method_fails_at_registration() {
    let mut registry = ModelRegistry::new();
    let builder = ModelBuilder::new("Odd")
        .capability(Capability::new("C").method("getName").method("frobnicate"))
        .mixin(convention::applies, ConventionMixin);

    let err = registry.register(builder).unwrap_err();
    assert!(matches!(err, ModelBuildError::NoApplicableMixin { .. }));
}

/// One registered model serves all instances of its type.
#[test]
fn test_registered_model_is_shared() {
    let mut registry = ModelRegistry::new();
    let id = registry
        .register(
            ModelBuilder::new("Basket")
                .capability(Capability::new("Contents").method("getFoo").method("setFoo"))
                .mixin(convention::applies, ConventionMixin),
        )
        .unwrap();

    let model = registry.get(id).unwrap();
    let mut a = CompositeInstance::new(Arc::clone(model));
    let mut b = CompositeInstance::new(Arc::clone(model));

    a.invoke("setFoo", &[json!("a")]).unwrap();
    b.invoke("setFoo", &[json!("b")]).unwrap();

    // Shared model, independent state.
    assert_eq!(a.invoke("getFoo", &[]).unwrap(), json!("a"));
    assert_eq!(b.invoke("getFoo", &[]).unwrap(), json!("b"));
}
