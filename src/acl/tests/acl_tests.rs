//! Decision pipeline tests
//!
//! Principal resolution → role → area gate → permission gate, and
//! composition of `|`-separated keys.

mod common;

use common::{article_acl, user_with_role};
use cretoai_acl::{
    Acl, Authorizable, DecisionReason, Parameters, Permissionable, Permissions, Principal, Role,
};
use serde_json::json;
use std::sync::Arc;

// ============================================================================
// PRINCIPAL RESOLUTION
// ============================================================================

#[test]
fn test_no_principal_is_denied() {
    let acl = article_acl();
    acl.add_permissions(["articles.read"]);

    let decision = acl.check("articles.read", &Parameters::none(), None);
    assert!(!decision.allowed);
    assert_eq!(decision.reason, DecisionReason::NoPrincipal);
}

#[test]
fn test_principal_without_role_is_denied() {
    let acl = article_acl();
    acl.add_permissions(["articles.read"]);

    let nick = Arc::new(Principal::new("user:nick").with_permissions(["articles.read"]));
    acl.set_current_user(nick.clone());

    assert!(acl.cant("articles.read", &Parameters::none(), None));
    assert_eq!(
        acl.check("articles.read", &Parameters::none(), Some(&*nick)).reason,
        DecisionReason::NoRole
    );
}

#[test]
fn test_role_permissions_grant() {
    let acl = article_acl();
    let nick = user_with_role("user:nick", Role::new("editor").with_permissions(["articles.read"]));

    assert!(nick.can(&acl, "articles.read", &Parameters::none()));
    assert!(nick.cant(&acl, "articles.create", &Parameters::none()));
}

#[test]
fn test_current_user_is_used_when_none_passed() {
    let acl = article_acl();
    let nick = user_with_role("user:nick", Role::new("editor").with_permissions(["articles.read"]));
    acl.set_current_user(nick);

    assert!(acl.can("articles.read", &Parameters::none(), None));
    assert!(acl.cant("articles.update", &Parameters::none(), None));
}

#[test]
fn test_bound_current_user_checks_through_trait_object() {
    let acl = article_acl();
    let nick = user_with_role("user:nick", Role::new("editor").with_permissions(["articles.read"]));
    acl.set_current_user(nick);

    let current = acl.current_user().unwrap();
    assert!(current.can(&acl, "articles.read", &Parameters::none()));
    assert!(current.cant(&acl, "articles.delete", &Parameters::none()));
}

/// Principal kind with a fixed role, held only as a trait object
struct ServiceAccount {
    role: Arc<Role>,
    permissions: Permissions,
}

impl Permissionable for ServiceAccount {
    fn permissions(&self) -> &Permissions {
        &self.permissions
    }
}

impl Authorizable for ServiceAccount {
    fn id(&self) -> &str {
        "service:indexer"
    }

    fn role_key(&self) -> String {
        self.role.key().to_string()
    }

    fn set_role_key(&self, _role_key: &str) {}

    fn role(&self) -> Option<Arc<Role>> {
        Some(Arc::clone(&self.role))
    }

    fn set_role(&self, _role: Option<Arc<Role>>) {}

    fn as_authorizable(&self) -> &dyn Authorizable {
        self
    }
}

#[test]
fn test_custom_principal_kinds_share_the_contract() {
    let acl = article_acl();

    let nick: Arc<dyn Authorizable> =
        user_with_role("user:nick", Role::new("editor").with_permissions(["articles.read"]));
    let indexer: Arc<dyn Authorizable> = Arc::new(ServiceAccount {
        role: Arc::new(Role::new("indexer").with_permissions(["articles.read"])),
        permissions: Permissions::default(),
    });
    let principals = [nick, indexer];

    for principal in &principals {
        assert!(principal.can(&acl, "articles.read", &Parameters::none()), "{}", principal.id());
        assert!(principal.cant(&acl, "articles.update", &Parameters::none()), "{}", principal.id());
    }
}

#[test]
fn test_registry_permissions_only_merge_for_current_user() {
    let acl = article_acl();
    acl.add_permissions(["articles.read"]);

    let nick = user_with_role("user:nick", Role::new("editor"));
    acl.set_current_user(nick.clone());

    // implicit current user picks up the registry default
    assert!(acl.can("articles.read", &Parameters::none(), None));

    // the same principal passed explicitly does not
    assert!(acl.cant("articles.read", &Parameters::none(), Some(&*nick)));
}

#[test]
fn test_unknown_rule_is_denied() {
    let acl = article_acl();
    let nick = user_with_role("user:nick", Role::new("editor").with_permissions(["articles.publish"]));

    let decision = acl.check("articles.publish", &Parameters::none(), Some(&*nick));
    assert_eq!(decision.reason, DecisionReason::UnknownRule);
}

// ============================================================================
// PERMISSION PRECEDENCE
// ============================================================================

#[test]
fn test_principal_permissions_replace_role_permissions() {
    let acl = article_acl();
    let nick = Arc::new(
        Principal::new("user:nick")
            .with_role(Arc::new(Role::new("editor").with_permissions(["articles.update"])))
            .with_permissions(["articles.delete"]),
    );

    assert!(nick.cant(&acl, "articles.update", &Parameters::none()));
    assert!(nick.can(&acl, "articles.delete", &Parameters::none()));
}

#[test]
fn test_clearing_override_falls_back_to_role() {
    let acl = article_acl();
    let nick = Arc::new(
        Principal::new("user:nick")
            .with_role(Arc::new(Role::new("editor").with_permissions(["articles.update"])))
            .with_permissions(["articles.delete"]),
    );

    nick.set_permissions(Vec::<String>::new());

    assert!(nick.can(&acl, "articles.update", &Parameters::none()));
    assert!(nick.cant(&acl, "articles.delete", &Parameters::none()));
}

#[test]
fn test_registered_role_edits_reach_bound_principals() {
    let mut acl = article_acl();
    acl.set_roles(vec![Role::new("editor").with_permissions(["articles.read"])]);

    let editor = acl.get_role("editor").unwrap();
    let nick = Principal::new("user:nick").with_role(Arc::clone(&editor));
    assert!(nick.cant(&acl, "articles.create", &Parameters::none()));

    editor.add_permissions(["articles.create"]);
    assert!(nick.can(&acl, "articles.create", &Parameters::none()));
}

#[test]
fn test_registered_role_wins_over_detached_copy() {
    let mut acl = article_acl();
    acl.set_roles(vec![Role::new("editor").with_permissions(["articles.update"])]);

    // the principal's own copy of "editor" is stale
    let nick = user_with_role("user:nick", Role::new("editor").with_permissions(["articles.read"]));

    assert!(nick.can(&acl, "articles.update", &Parameters::none()));
    assert!(nick.cant(&acl, "articles.read", &Parameters::none()));
}

#[test]
fn test_rebinding_role_between_checks() {
    let acl = article_acl();
    let nick = user_with_role("user:nick", Role::new("guest"));
    acl.set_current_user(nick.clone());

    assert!(acl.cant("articles.update", &Parameters::none(), None));

    nick.set_role(Some(Arc::new(Role::new("editor").with_permissions(["articles.update"]))));
    nick.set_role_key("editor");
    assert!(acl.can("articles.update", &Parameters::none(), None));

    nick.set_role(None);
    assert!(acl.cant("articles.update", &Parameters::none(), None));
}

#[test]
fn test_inactive_role_is_informational() {
    let acl = article_acl();
    let nick = user_with_role(
        "user:nick",
        Role::new("editor").with_active(false).with_permissions(["articles.read"]),
    );

    assert!(nick.can(&acl, "articles.read", &Parameters::none()));
}

// ============================================================================
// AREA GATING
// ============================================================================

fn backend_acl() -> Acl {
    let mut acl = article_acl();
    acl.rule("articles.create").area("backend");
    acl
}

#[test]
fn test_rule_outside_home_area_is_denied() {
    let acl = backend_acl();
    let nick = user_with_role("user:nick", Role::new("editor").with_permissions(["articles.create"]));

    let decision = acl.check("articles.create", &Parameters::none(), Some(&*nick));
    assert_eq!(
        decision.reason,
        DecisionReason::AreaMismatch {
            rule_area: "backend".to_string(),
            home_area: "frontend".to_string(),
        }
    );
}

#[test]
fn test_areas_to_rules_opens_other_area() {
    let mut acl = backend_acl();
    acl.set_areas_to_rules([("frontend", vec!["backend"])]);

    let nick = user_with_role("user:nick", Role::new("editor").with_permissions(["articles.create"]));
    assert!(nick.can(&acl, "articles.create", &Parameters::none()));
}

#[test]
fn test_areas_to_rules_is_keyed_by_home_area() {
    let mut acl = backend_acl();
    acl.set_areas_to_rules([("api", vec!["backend"])]);

    let nick = user_with_role("user:nick", Role::new("editor").with_permissions(["articles.create"]));
    assert!(nick.cant(&acl, "articles.create", &Parameters::none()));
}

#[test]
fn test_home_area_is_first_declared_area() {
    let acl = backend_acl();

    let admin = user_with_role(
        "user:admin",
        Role::new("admin")
            .with_areas(["backend", "frontend"])
            .with_permissions(["articles.create", "articles.read"]),
    );

    assert!(admin.can(&acl, "articles.create", &Parameters::none()));
    // "frontend" is declared but is not the home area
    assert!(admin.cant(&acl, "articles.read", &Parameters::none()));
}

#[test]
fn test_area_gate_applies_before_permission_gate() {
    let acl = backend_acl();
    let nick = user_with_role("user:nick", Role::new("editor"));

    let decision = acl.check("articles.create", &Parameters::none(), Some(&*nick));
    assert!(matches!(decision.reason, DecisionReason::AreaMismatch { .. }));
}

#[test]
fn test_rule_without_permission_skips_area_gate() {
    let mut acl = article_acl();
    acl.rule("dashboard.view").area("backend").needs_permission(false);

    let nick = user_with_role("user:nick", Role::new("editor"));
    assert!(nick.can(&acl, "dashboard.view", &Parameters::none()));
}

// ============================================================================
// COMPOSITE KEYS
// ============================================================================

#[test]
fn test_composite_requires_every_key() {
    let acl = article_acl();
    let nick = user_with_role(
        "user:nick",
        Role::new("editor").with_permissions(["articles.read", "articles.update"]),
    );

    assert!(nick.can(&acl, "articles.read|articles.update", &Parameters::none()));
    assert!(nick.cant(&acl, "articles.read|articles.delete", &Parameters::none()));
}

#[test]
fn test_composite_reports_first_failing_key() {
    let acl = article_acl();
    let nick = user_with_role("user:nick", Role::new("editor").with_permissions(["articles.read"]));

    let decision = acl.check(
        "articles.read|articles.create|articles.delete",
        &Parameters::none(),
        Some(&*nick),
    );
    assert_eq!(decision.key, "articles.create");
    assert_eq!(decision.reason, DecisionReason::MissingPermission);
}

#[test]
fn test_composite_grant_names_whole_key() {
    let acl = article_acl();
    let nick = user_with_role("user:nick", Role::new("editor").with_permissions(["articles.read"]));

    let decision = acl.check("articles.read|articles.read", &Parameters::none(), Some(&*nick));
    assert!(decision.allowed);
    assert_eq!(decision.key, "articles.read|articles.read");
}

#[test]
fn test_composite_with_empty_segment_is_denied() {
    let acl = article_acl();
    let nick = user_with_role("user:nick", Role::new("editor").with_permissions(["articles.read"]));

    assert!(nick.cant(&acl, "articles.read|", &Parameters::none()));
}

#[test]
fn test_composite_parameters_are_looked_up_by_key() {
    let mut acl = article_acl();
    acl.rule("owner")
        .needs_permission(false)
        .handler(1, |user, params| params[0] == json!(user.id()));

    let nick = user_with_role("user:nick", Role::new("editor").with_permissions(["articles.read"]));

    let keyed = Parameters::keyed([("owner", vec![json!("user:nick")])]);
    assert!(nick.can(&acl, "articles.read|owner", &keyed));

    // positional parameters cannot be addressed by sub-key
    let positional = Parameters::list([json!("user:nick")]);
    let decision = acl.check("articles.read|owner", &positional, Some(&*nick));
    assert_eq!(
        decision.reason,
        DecisionReason::HandlerArityMismatch { required: 1, supplied: 0 }
    );
}

// ============================================================================
// REGISTRY TABLES
// ============================================================================

#[test]
fn test_role_lookup_returns_same_instance_for_every_area() {
    let mut acl = Acl::new();
    acl.set_roles(vec![Role::new("editor").with_areas(["frontend", "backend", "api"])]);

    let editor = acl.get_role("editor").unwrap();
    for area in editor.areas() {
        let roles = acl.get_roles(Some(area));
        assert!(Arc::ptr_eq(&editor, &roles["editor"]), "area {}", area);
    }
}

#[test]
fn test_later_role_registration_wins() {
    let mut acl = Acl::new();
    acl.set_roles(vec![Role::new("editor").with_permissions(["articles.read"])]);
    acl.set_roles(vec![Role::new("editor").with_permissions(["articles.update"])]);

    let editor = acl.get_role("editor").unwrap();
    assert!(editor.has_permission("articles.update"));
    assert!(!editor.has_permission("articles.read"));
}

#[test]
fn test_shared_registry_across_threads() {
    let acl = Arc::new(article_acl());
    let nick = user_with_role("user:nick", Role::new("editor").with_permissions(["articles.read"]));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let acl = Arc::clone(&acl);
            let nick = Arc::clone(&nick);
            std::thread::spawn(move || nick.can(&acl, "articles.read", &Parameters::none()))
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap());
    }
}
