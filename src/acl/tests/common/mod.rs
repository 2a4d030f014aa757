//! Shared fixtures for integration tests

#![allow(dead_code)]

use cretoai_acl::{Acl, Principal, Role};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Route `tracing` output to the test harness (`RUST_LOG=cretoai_acl=debug`)
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Registry with the four article rules in the default area
pub fn article_acl() -> Acl {
    init_tracing();

    let mut acl = Acl::new();
    acl.rule("articles.read");
    acl.rule("articles.create");
    acl.rule("articles.update");
    acl.rule("articles.delete");
    acl
}

pub fn user_with_role(id: &str, role: Role) -> Arc<Principal> {
    Arc::new(Principal::new(id).with_role(Arc::new(role)))
}
