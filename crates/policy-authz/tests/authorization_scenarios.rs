//! End-to-end tests for policy management and authorization decisions.
//!
//! These tests drive the public service surface over the in-memory
//! repository, the way a boundary layer would.
//!
//! Scenarios:
//! 1. deny_overrides_allow: a narrow DENY beats a broad ALLOW
//! 2. implicit_deny: no policies means every check is denied
//! 3. security_admin: role policy grants its namespace only
//! 4. allowed_actions: enumeration agrees with single checks
//! 5. policy_lifecycle: create, update, delete change decisions
//! 6. seeded_roles: predefined role defaults are persisted and protected
//! 7. user_urn_spellings: any UUID spelling targets the same user

use policy_authz::{
    AuthorizationRequest, AuthzError, Caller, CapabilityInterceptor, CreatePolicy, DeletePolicy,
    EngineConfig, GuardRequest, InterceptorChain, PolicyService, RequiredAccess, RouteTable,
    SeedRoleDefaults, UpdatePolicy, REASON_ALLOW, REASON_EXPLICIT_DENY, REASON_IMPLICIT_DENY,
};
use policy_store::{MemoryPolicyRepository, PolicyRepository};
use policy_types::{Action, Effect, ProfileId};
use std::sync::Arc;
use uuid::Uuid;

/// Test fixture holding a service over a fresh repository.
struct TestFixture {
    /// Service under test.
    service: PolicyService,
    /// Repository shared with the service.
    repository: Arc<MemoryPolicyRepository>,
    /// Profile every policy is created in.
    profile: ProfileId,
}

impl TestFixture {
    fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    fn with_config(config: EngineConfig) -> Self {
        let repository = Arc::new(MemoryPolicyRepository::new());
        Self {
            service: PolicyService::with_config(repository.clone(), config),
            repository,
            profile: ProfileId::new("P"),
        }
    }

    /// Create a policy in the fixture profile.
    async fn policy(&self, subject: &str, effect: &str, action: &str, resource: &str) -> String {
        self.service
            .create_policy(CreatePolicy {
                profile_id: self.profile.clone(),
                subject: subject.to_string(),
                action_pattern: action.to_string(),
                resource_pattern: Some(resource.to_string()),
                effect: Some(effect.to_string()),
                description: None,
                created_by: "admin".to_string(),
            })
            .await
            .expect("policy should be created")
            .id
            .to_string()
    }

    fn caller(&self, roles: &[&str]) -> Caller {
        roles.iter().fold(
            Caller::new(self.profile.clone(), Uuid::now_v7()),
            |caller, role| caller.with_role(*role),
        )
    }

    async fn check(&self, caller: &Caller, action: &str, resource: &str) -> (bool, String) {
        let decision = self
            .service
            .check_authorization(&AuthorizationRequest {
                caller: caller.clone(),
                action: action.to_string(),
                resource_id: Some(resource.to_string()),
            })
            .await
            .expect("check should not fail");
        (decision.allowed, decision.reason)
    }
}

#[tokio::test]
async fn deny_overrides_allow() {
    let fixture = TestFixture::new();
    fixture.policy("role:R", "ALLOW", "payments.*", "*").await;
    fixture.policy("role:R", "DENY", "payments.delete", "acct:999").await;
    let caller = fixture.caller(&["R"]);

    assert_eq!(
        fixture.check(&caller, "payments.delete", "acct:999").await,
        (false, REASON_EXPLICIT_DENY.to_string())
    );
    assert_eq!(
        fixture.check(&caller, "payments.delete", "acct:111").await,
        (true, REASON_ALLOW.to_string())
    );
    assert!(fixture.check(&caller, "payments.create", "acct:1").await.0);
}

#[tokio::test]
async fn deny_wins_regardless_of_specificity() {
    let fixture = TestFixture::new();
    fixture.policy("role:R", "DENY", "*", "*").await;
    fixture.policy("role:R", "ALLOW", "payments.create", "acct:1").await;
    let caller = fixture.caller(&["R"]);

    let (allowed, reason) = fixture.check(&caller, "payments.create", "acct:1").await;
    assert!(!allowed);
    assert_eq!(reason, REASON_EXPLICIT_DENY);
}

#[tokio::test]
async fn implicit_deny() {
    let fixture = TestFixture::new();
    let caller = fixture.caller(&["SERVICE_ADMIN", "READER"]);

    for (action, resource) in [
        ("payments.view", "*"),
        ("security.user.lock", "acct:1"),
        ("*", "*"),
    ] {
        assert_eq!(
            fixture.check(&caller, action, resource).await,
            (false, REASON_IMPLICIT_DENY.to_string())
        );
    }
    assert!(fixture
        .service
        .get_allowed_actions(&caller)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn security_admin() {
    let fixture = TestFixture::new();
    fixture.policy("role:SECURITY_ADMIN", "ALLOW", "security.*", "*").await;
    let caller = fixture.caller(&["SECURITY_ADMIN"]);

    assert!(fixture.check(&caller, "security.user.lock", "acct:1").await.0);
    assert!(!fixture.check(&caller, "payments.create", "acct:1").await.0);

    // Same policy in another profile does not apply.
    let elsewhere = Caller::new(ProfileId::new("Q"), caller.user_id).with_role("SECURITY_ADMIN");
    assert!(!fixture.check(&elsewhere, "security.user.lock", "acct:1").await.0);
}

#[tokio::test]
async fn allowed_actions() {
    let catalog = [
        "payments.view",
        "payments.create",
        "payments.delete",
        "payments.detail.view",
        "transfers.view",
        "transfers.create",
    ];
    let fixture = TestFixture::with_config(EngineConfig::default().with_action_catalog(catalog));
    fixture.policy("role:READER", "ALLOW", "*.view", "*").await;
    fixture.policy("role:R", "ALLOW", "payments.*", "*").await;
    fixture.policy("role:R", "DENY", "payments.delete", "*").await;
    fixture.policy("role:R", "ALLOW", "transfers.create", "acct:1").await;
    let caller = fixture.caller(&["READER", "R"]);

    let allowed = fixture.service.get_allowed_actions(&caller).await.unwrap();
    for action in catalog {
        let (expected, _) = fixture.check(&caller, action, "*").await;
        assert_eq!(allowed.contains(action), expected, "action {action}");
    }
    for action in &allowed {
        assert!(fixture.check(&caller, action, "*").await.0, "action {action}");
    }
    assert!(allowed.contains("payments.detail.view"));
    assert!(!allowed.contains("payments.delete"));
    assert!(!allowed.contains("transfers.create"));
}

#[tokio::test]
async fn policy_lifecycle() {
    let fixture = TestFixture::new();
    let caller = fixture.caller(&["R"]);
    let id = fixture.policy("role:R", "allow", "payments.view", "acct:1,acct:2").await;

    assert!(fixture.check(&caller, "payments.view", "acct:2").await.0);
    assert!(!fixture.check(&caller, "payments.view", "acct:3").await.0);

    let updated = fixture
        .service
        .update_policy(UpdatePolicy {
            effect: Some("DENY".into()),
            ..UpdatePolicy::new(id.as_str().into())
        })
        .await
        .unwrap();
    assert_eq!(updated.effect, Effect::Deny);
    assert_eq!(
        fixture.check(&caller, "payments.view", "acct:2").await,
        (false, REASON_EXPLICIT_DENY.to_string())
    );

    fixture
        .service
        .delete_policy(DeletePolicy {
            policy_id: id.as_str().into(),
        })
        .await
        .unwrap();
    assert_eq!(
        fixture.check(&caller, "payments.view", "acct:2").await,
        (false, REASON_IMPLICIT_DENY.to_string())
    );

    let err = fixture
        .service
        .delete_policy(DeletePolicy {
            policy_id: id.as_str().into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AuthzError::PolicyNotFound(_)));
}

#[tokio::test]
async fn seeded_roles() {
    let fixture = TestFixture::new();
    let seeded = fixture
        .service
        .seed_role_defaults(SeedRoleDefaults {
            profile_id: fixture.profile.clone(),
            role_name: "APPROVER".into(),
        })
        .await
        .unwrap();
    assert_eq!(seeded.len(), 1);
    assert_eq!(seeded[0].id.as_str(), "system:role:APPROVER:0");
    assert!(seeded[0].system_policy);

    // Seeding again overwrites rather than duplicating.
    fixture
        .service
        .seed_role_defaults(SeedRoleDefaults {
            profile_id: fixture.profile.clone(),
            role_name: "APPROVER".into(),
        })
        .await
        .unwrap();
    assert_eq!(
        fixture.repository.find_by_profile_id(&fixture.profile).await.unwrap().len(),
        1
    );

    let caller = fixture.caller(&["APPROVER"]);
    assert!(fixture.check(&caller, "expenses.approve", "acct:7").await.0);
    assert!(!fixture.check(&caller, "expenses.create", "acct:7").await.0);

    let err = fixture
        .service
        .delete_policy(DeletePolicy {
            policy_id: seeded[0].id.clone(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AuthzError::SystemPolicyProtected(_)));
}

#[tokio::test]
async fn guarded_routes() {
    let fixture = TestFixture::new();
    fixture.policy("role:READER", "ALLOW", "*.view", "*").await;

    let routes = RouteTable::new()
        .route("/health", RequiredAccess::Open)
        .route(
            "/payments",
            RequiredAccess::Action(Action::new("payments.view").unwrap()),
        )
        .route(
            "/payments/approve",
            RequiredAccess::action_on(Action::new("payments.approve").unwrap(), "account"),
        );
    let chain = InterceptorChain::new().with(CapabilityInterceptor::new(
        fixture.service.resolver().clone(),
        routes,
    ));
    let reader = fixture.caller(&["READER"]);

    chain.run(&GuardRequest::anonymous("/health")).await.unwrap();
    chain
        .run(&GuardRequest::new("/payments/42", reader.clone()))
        .await
        .unwrap();

    let err = chain
        .run(&GuardRequest::new("/payments/approve", reader).with_param("account", "acct:1"))
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 403);
    assert_eq!(err.to_string(), format!("Forbidden: {REASON_IMPLICIT_DENY}"));
}

#[tokio::test]
async fn user_urn_spellings() {
    let fixture = TestFixture::new();
    fixture.policy("role:R", "ALLOW", "payments.*", "*").await;
    let caller = fixture.caller(&["R"]);
    let hyphenated = caller.user_id.hyphenated().to_string();

    for spelling in [
        hyphenated.to_uppercase(),
        caller.user_id.simple().to_string(),
        format!("{{{hyphenated}}}"),
        format!("urn:uuid:{hyphenated}"),
    ] {
        let resource = format!("acct:{}", spelling.len());
        fixture
            .policy(&format!("user:{spelling}"), "DENY", "payments.view", &resource)
            .await;

        assert_eq!(
            fixture.check(&caller, "payments.view", &resource).await,
            (false, REASON_EXPLICIT_DENY.to_string()),
            "spelling {spelling}"
        );
    }

    let upper_urn = format!("USER:{}", hyphenated.to_uppercase());
    let listed = fixture
        .service
        .list_policies_by_subject(&fixture.profile, &upper_urn)
        .await
        .unwrap();
    assert_eq!(listed.len(), 4);
    assert!(listed.iter().all(|p| p.subject == format!("user:{hyphenated}")));
}
