//! End-to-end workflow tests against the stateful in-memory platform.

use std::collections::BTreeMap;

use provisioner::error::ProvisionError;
use provisioner::provisioner::project_folder_name;

#[path = "test_utils/mod.rs"]
mod test_utils;

use test_utils::provisioner_with_fake;

fn no_tokens() -> BTreeMap<String, String> {
    BTreeMap::new()
}

#[tokio::test]
async fn provision_is_idempotent_across_invocations() {
    let (platform, provisioner) = provisioner_with_fake();
    platform.seed_dashboard(1, "Sales Overview", None);
    platform.seed_dashboard(2, "Churn Risk", None);

    let first = provisioner
        .provision("demo-project", "analysts@company.com", &[1, 2], &no_tokens())
        .await
        .unwrap();
    assert_eq!(first.dashboard_ids.len(), 2);
    let creates_after_first = platform.create_calls();

    let second = provisioner
        .provision("demo-project", "analysts@company.com", &[1, 2], &no_tokens())
        .await
        .unwrap();

    assert_eq!(second.group_id, first.group_id);
    assert_eq!(second.folder_id, first.folder_id);
    assert_eq!(second.dashboard_ids, first.dashboard_ids);
    // The second run resolves everything through searches.
    assert_eq!(platform.create_calls(), creates_after_first);
    // Two runs still mean exactly two clones, not four.
    assert_eq!(platform.dashboards_in_folder(first.folder_id).len(), 2);
    assert_ne!(second.correlation_id, first.correlation_id);
}

#[tokio::test]
async fn provision_rejects_empty_inputs_before_any_remote_call() {
    let (platform, provisioner) = provisioner_with_fake();

    let err = provisioner
        .provision("", "no-at-sign", &[], &no_tokens())
        .await
        .unwrap_err();

    assert!(matches!(err, ProvisionError::Validation(_)));
    assert_eq!(platform.calls("search_groups"), 0);
    assert_eq!(platform.create_calls(), 0);
}

#[tokio::test]
async fn provision_maps_group_into_saml_config() {
    let (platform, provisioner) = provisioner_with_fake();

    provisioner
        .provision("demo-project", "analysts@company.com", &[], &no_tokens())
        .await
        .unwrap();

    assert_eq!(platform.saml_group_names(), vec!["analysts@company.com"]);

    // A second tenant appends without disturbing the first entry.
    provisioner
        .provision("other-project", "viewers@company.com", &[], &no_tokens())
        .await
        .unwrap();
    assert_eq!(
        platform.saml_group_names(),
        vec!["analysts@company.com", "viewers@company.com"]
    );
}

#[tokio::test]
async fn provision_failure_keeps_prior_side_effects() {
    let (platform, provisioner) = provisioner_with_fake();
    platform.seed_dashboard(1, "Sales Overview", None);
    // Exhaust the entire attempt budget so the clone step fails for good.
    platform.fail_next("copy_dashboard", 10);

    let err = provisioner
        .provision("demo-project", "analysts@company.com", &[1], &no_tokens())
        .await
        .unwrap_err();
    assert!(matches!(err, ProvisionError::Provisioning { .. }));

    // Group, mapping, and folder survive the aborted run.
    assert_eq!(platform.saml_group_names(), vec!["analysts@company.com"]);
    assert!(
        platform
            .folder_name(provision_folder_id(&platform, "demo-project"))
            .is_some()
    );

    // A clean retry converges instead of duplicating the earlier steps.
    platform.fail_next("copy_dashboard", 0);
    let outcome = provisioner
        .provision("demo-project", "analysts@company.com", &[1], &no_tokens())
        .await
        .unwrap();
    assert_eq!(outcome.dashboard_ids.len(), 1);
    assert_eq!(platform.calls("create_group"), 1);
    assert_eq!(platform.calls("create_folder"), 1);
}

#[tokio::test]
async fn token_substitution_touches_only_fresh_clones() {
    let (platform, provisioner) = provisioner_with_fake();
    platform.seed_dashboard(1, "Sales Overview", Some("Report for {{TEAM}}"));
    let tokens = BTreeMap::from([("TEAM".to_string(), "Analytics".to_string())]);

    let first = provisioner
        .provision("demo-project", "analysts@company.com", &[1], &tokens)
        .await
        .unwrap();
    let clone_id = first.dashboard_ids[0];
    assert_eq!(
        platform.dashboard_description(clone_id).as_deref(),
        Some("Report for Analytics")
    );
    let updates_after_first = platform.calls("update_dashboard");

    // Re-running reuses the clone and must not rewrite its description.
    let other_tokens = BTreeMap::from([("TEAM".to_string(), "Somebody Else".to_string())]);
    provisioner
        .provision("demo-project", "analysts@company.com", &[1], &other_tokens)
        .await
        .unwrap();
    assert_eq!(platform.calls("update_dashboard"), updates_after_first);
    assert_eq!(
        platform.dashboard_description(clone_id).as_deref(),
        Some("Report for Analytics")
    );
}

#[tokio::test]
async fn token_substitution_survives_transient_update_failure() {
    let (platform, provisioner) = provisioner_with_fake();
    platform.seed_dashboard(1, "Sales Overview", Some("Report for {{TEAM}}"));
    platform.fail_next("update_dashboard", 1);
    let tokens = BTreeMap::from([("TEAM".to_string(), "Analytics".to_string())]);

    // The description patch lands on the retry; the clone itself is not
    // redone, so the fresh-clone path stays the one that substitutes.
    let outcome = provisioner
        .provision("demo-project", "analysts@company.com", &[1], &tokens)
        .await
        .unwrap();
    assert_eq!(
        platform.dashboard_description(outcome.dashboard_ids[0]).as_deref(),
        Some("Report for Analytics")
    );
    assert_eq!(platform.calls("copy_dashboard"), 1);
    assert_eq!(platform.calls("update_dashboard"), 2);
}

#[tokio::test]
async fn decommission_of_unknown_project_is_a_noop() {
    let (platform, provisioner) = provisioner_with_fake();

    let outcome = provisioner
        .decommission_project("nonexistent-project", true, true, true)
        .await
        .unwrap();

    assert!(!outcome.archived_folder);
    assert_eq!(outcome.deleted_dashboards, 0);
    assert_eq!(outcome.deleted_schedules, 0);
    assert_eq!(platform.calls("rename_folder"), 0);
}

#[tokio::test]
async fn decommission_full_cycle_archives_and_counts() {
    let (platform, provisioner) = provisioner_with_fake();
    platform.seed_dashboard(1, "Sales Overview", None);

    let outcome = provisioner
        .provision("demo-project", "analysts@company.com", &[1], &no_tokens())
        .await
        .unwrap();
    let dashboard_id = outcome.dashboard_ids[0];
    let spec = provisioner::provisioner::ScheduledDeliverySpec {
        dashboard_id,
        name: "weekly".to_string(),
        cron_schedule: "0 9 * * 1".to_string(),
        destination_emails: vec!["analysts@company.com".to_string()],
        pdf_paper_size: "letter".to_string(),
    };
    provisioner.create_scheduled_plan(&spec).await.unwrap();

    let result = provisioner
        .decommission_project("demo-project", true, true, true)
        .await
        .unwrap();

    assert!(result.archived_folder);
    assert_eq!(result.deleted_dashboards, 1);
    // Schedules are counted off the dashboard list captured before the
    // dashboard deletions.
    assert_eq!(result.deleted_schedules, 1);
    assert_eq!(platform.plan_count(), 0);
    assert_eq!(
        platform.folder_name(outcome.folder_id).as_deref(),
        Some("Archived: Project: demo-project")
    );
}

#[tokio::test]
async fn decommission_archive_only_leaves_content_alone() {
    let (platform, provisioner) = provisioner_with_fake();
    platform.seed_dashboard(1, "Sales Overview", None);
    let outcome = provisioner
        .provision("demo-project", "analysts@company.com", &[1], &no_tokens())
        .await
        .unwrap();

    let result = provisioner
        .decommission_project("demo-project", true, false, false)
        .await
        .unwrap();

    assert!(result.archived_folder);
    assert_eq!(result.deleted_dashboards, 0);
    assert_eq!(platform.dashboards_in_folder(outcome.folder_id).len(), 1);
}

fn provision_folder_id(platform: &test_utils::InMemoryPlatform, project_id: &str) -> i64 {
    // The fake assigns the folder id after the group id in these tests;
    // resolve it through the naming convention instead of hardcoding.
    let name = project_folder_name(project_id);
    for id in 1..10 {
        if platform.folder_name(id).as_deref() == Some(name.as_str()) {
            return id;
        }
    }
    panic!("folder {name} not found");
}
