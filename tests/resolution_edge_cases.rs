//! Edge-case tests for rule shapes the administrative layer can produce.

use permission_gate::{
    HttpMethod, MemoryPermissionCache, MemoryRuleStore, PermissionResolver, PermissionRule,
};

fn resolver_with(
    rules: Vec<PermissionRule>,
) -> PermissionResolver<MemoryPermissionCache, MemoryRuleStore> {
    PermissionResolver::new(MemoryPermissionCache::new(), MemoryRuleStore::with_rules(rules))
}

#[test]
fn test_empty_store_resolves_nothing() {
    let resolver = resolver_with(vec![]);
    assert_eq!(resolver.resolve(Some(HttpMethod::Get), "/anything"), None);
    assert_eq!(resolver.resolve(Some(HttpMethod::Post), "/"), None);
}

#[test]
fn test_unbound_rule_never_matches_a_request() {
    // Rules without a bound method exist for non-API capabilities.
    let resolver = resolver_with(vec![PermissionRule::unbound("report:export")]);
    assert_eq!(resolver.resolve(Some(HttpMethod::Get), "/report/export"), None);
}

#[test]
fn test_malformed_template_is_simply_non_matching() {
    let resolver = resolver_with(vec![
        PermissionRule::new("broken", HttpMethod::Get, "/users/{id"),
        PermissionRule::new("ok", HttpMethod::Get, "/users/{id}"),
    ]);

    // The malformed rule neither matches nor poisons resolution.
    assert_eq!(
        resolver.resolve(Some(HttpMethod::Get), "/users/42").as_deref(),
        Some("ok")
    );
}

#[test]
fn test_template_stored_unnormalized_still_resolves() {
    let resolver = resolver_with(vec![PermissionRule::new(
        "x",
        HttpMethod::Put,
        "users//{id}/profile/",
    )]);

    assert_eq!(
        resolver
            .resolve(Some(HttpMethod::Put), "/users/9/profile")
            .as_deref(),
        Some("x")
    );
}

#[test]
fn test_root_route() {
    let resolver = resolver_with(vec![PermissionRule::new("root", HttpMethod::Get, "/")]);
    assert_eq!(
        resolver.resolve(Some(HttpMethod::Get), "/").as_deref(),
        Some("root")
    );
    assert_eq!(
        resolver.resolve(Some(HttpMethod::Get), "///").as_deref(),
        Some("root")
    );
}

#[test]
fn test_placeholder_value_with_special_characters() {
    let resolver = resolver_with(vec![PermissionRule::new(
        "x",
        HttpMethod::Get,
        "/files/{name}",
    )]);

    assert_eq!(
        resolver
            .resolve(Some(HttpMethod::Get), "/files/report-2024.pdf")
            .as_deref(),
        Some("x")
    );
}

#[test]
fn test_method_parsed_from_pipeline_strings() {
    let resolver = resolver_with(vec![PermissionRule::new(
        "x",
        HttpMethod::Delete,
        "/posts/{id}",
    )]);

    // The pipeline parses whatever verb string arrives; unknown verbs
    // resolve to no restriction.
    let method = "delete".parse::<HttpMethod>().ok();
    assert_eq!(resolver.resolve(method, "/posts/3").as_deref(), Some("x"));

    let unknown = "TRACE".parse::<HttpMethod>().ok();
    assert_eq!(resolver.resolve(unknown, "/posts/3"), None);
}

#[test]
fn test_rule_disabled_after_caching_requires_invalidation() {
    let store = MemoryRuleStore::with_rules(vec![PermissionRule::new(
        "x",
        HttpMethod::Get,
        "/a",
    )]);
    let resolver = PermissionResolver::new(MemoryPermissionCache::new(), store);

    assert_eq!(resolver.resolve(Some(HttpMethod::Get), "/a").as_deref(), Some("x"));

    // Administrative delete without invalidation: stale positive entry is
    // still served (acceptable staleness bounded by the TTL).
    resolver.store().remove_rule("x");
    assert_eq!(resolver.resolve(Some(HttpMethod::Get), "/a").as_deref(), Some("x"));

    // After invalidation the store is re-consulted and the rule is gone.
    resolver.invalidate_all();
    assert_eq!(resolver.resolve(Some(HttpMethod::Get), "/a"), None);
}

#[test]
fn test_same_template_different_methods() {
    let resolver = resolver_with(vec![
        PermissionRule::new("read", HttpMethod::Get, "/posts/{id}"),
        PermissionRule::new("update", HttpMethod::Put, "/posts/{id}"),
        PermissionRule::new("delete", HttpMethod::Delete, "/posts/{id}"),
    ]);

    assert_eq!(
        resolver.resolve(Some(HttpMethod::Get), "/posts/1").as_deref(),
        Some("read")
    );
    assert_eq!(
        resolver.resolve(Some(HttpMethod::Put), "/posts/1").as_deref(),
        Some("update")
    );
    assert_eq!(
        resolver.resolve(Some(HttpMethod::Delete), "/posts/1").as_deref(),
        Some("delete")
    );
    assert_eq!(resolver.resolve(Some(HttpMethod::Patch), "/posts/1"), None);
}
