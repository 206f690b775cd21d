//! Tests for model catalogs and resolution.

use conduit_core::{Catalog, ModelDescriptor, Usage};

#[test]
fn resolve_known_model() {
    let catalog = Catalog::anthropic();
    let descriptor = catalog.resolve(Some("claude-3-opus-20240229"));

    assert_eq!(descriptor.id, "claude-3-opus-20240229");
    assert_eq!(descriptor.max_output_tokens, Some(4096));
}

#[test]
fn resolve_unknown_falls_back_to_default() {
    let catalog = Catalog::openai();
    assert_eq!(catalog.resolve(Some("gpt-9")).id, "gpt-4o");
    assert_eq!(catalog.resolve(None).id, "gpt-4o");
}

#[test]
fn catalogs_are_scoped_per_family() {
    // an OpenAI id is unknown to the Anthropic catalog
    let descriptor = Catalog::anthropic().resolve(Some("gpt-4o"));
    assert_eq!(descriptor.id, "claude-3-5-sonnet-20241022");
}

#[test]
fn default_families() {
    assert_eq!(Catalog::deepseek().default_model().id, "deepseek-chat");
    assert_eq!(
        Catalog::deepseek().resolve(Some("deepseek-reasoner")).id,
        "deepseek-reasoner"
    );

    let openrouter = Catalog::openrouter();
    assert_eq!(openrouter.default_model().id, "anthropic/claude-3.5-sonnet");
    assert!(openrouter.default_model().supports_cache_hints);
    assert!(!openrouter.resolve(Some("openai/gpt-4o")).supports_cache_hints);
}

#[test]
fn with_adds_and_replaces_entries() {
    let custom = ModelDescriptor {
        max_output_tokens: Some(1024),
        ..ModelDescriptor::new("my-model")
    };
    let smaller_default = ModelDescriptor {
        max_output_tokens: Some(2048),
        ..ModelDescriptor::new("gpt-4o")
    };
    let catalog = Catalog::openai().with([custom.clone(), smaller_default]);

    assert_eq!(catalog.resolve(Some("my-model")), custom);
    assert_eq!(catalog.resolve(None).max_output_tokens, Some(2048));
    assert_eq!(catalog.resolve(Some("gpt-4o")).max_output_tokens, Some(2048));
}

#[test]
fn descriptor_from_toml_defaults_capabilities() {
    let descriptor: ModelDescriptor = toml::from_str(r#"id = "bare""#).expect("descriptor");
    assert_eq!(descriptor, ModelDescriptor::new("bare"));
}

#[test]
fn cost_prices_cache_tokens_separately() {
    let descriptor = Catalog::anthropic().resolve(None);
    let usage = Usage {
        cache_write_tokens: Some(1_000_000),
        cache_read_tokens: Some(1_000_000),
        ..Usage::new(1_000_000, 1_000_000)
    };

    let cost = descriptor.cost(&usage).expect("priced");
    assert!((cost - (3.0 + 15.0 + 3.75 + 0.3)).abs() < 1e-9);
}

#[test]
fn cost_of_unpriced_model_is_none() {
    assert_eq!(ModelDescriptor::new("free").cost(&Usage::new(10, 10)), None);
}
