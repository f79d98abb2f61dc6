// ABOUTME: Integration tests for the single-resource lifecycle controller.
// ABOUTME: Runs on a paused clock so deadlines and poll cadence are exact.

mod support;

use std::sync::Arc;
use std::time::Duration;
use support::fake_gateway::{Behavior, Call, FakeGateway};
use testbed::config::ProvisionSettings;
use testbed::plan::{ContainerSpec, Descriptor, EnvSnapshot, Fragment, Plan, Scheme, Slot, resolve};
use testbed::provision::{
    HealthStatus, Ledger, ProvisionError, ProvisionErrorKind, Provisioner,
};
use testbed::runtime::HealthState;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

fn settings() -> ProvisionSettings {
    ProvisionSettings {
        poll_interval: Duration::from_millis(500),
        ..ProvisionSettings::default()
    }
}

fn plan(slot: Slot) -> Plan {
    resolve(&Descriptor::new("it").slot(slot), &EnvSnapshot::empty()).unwrap()
}

fn service(name: &str) -> Slot {
    Slot::service(name).with(Fragment::image("busybox:1.36"))
}

/// A provisioner already attached to the plan's network.
async fn provisioner(gateway: &Arc<FakeGateway>, plan: &Plan) -> Provisioner<FakeGateway> {
    let provisioner = Provisioner::new(
        Arc::clone(gateway),
        plan.environment(),
        settings(),
        Arc::new(Ledger::new()),
    );
    let network = provisioner
        .provision_network(
            plan.network(),
            Instant::now() + Duration::from_secs(60),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    provisioner.on_network(network)
}

fn only_container(plan: &Plan) -> &ContainerSpec {
    &plan.containers()[0]
}

fn is_stop(call: &Call) -> bool {
    matches!(call, Call::Stop(_))
}

fn is_remove(call: &Call) -> bool {
    matches!(call, Call::Remove(_))
}

#[tokio::test(start_paused = true)]
async fn container_without_healthcheck_is_ready_after_one_inspect() {
    let gateway = Arc::new(FakeGateway::new());
    let plan = plan(service("cache"));
    let provisioner = provisioner(&gateway, &plan).await;

    let handle = provisioner
        .provision(only_container(&plan), Duration::from_secs(5), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(handle.status(), HealthStatus::Healthy);
    assert_eq!(gateway.count(|c| matches!(c, Call::Inspect(_))), 1);
    assert!(handle.name().starts_with("it-cache-"));
    assert_eq!(handle.image().to_string(), "busybox:1.36");
}

#[tokio::test(start_paused = true)]
async fn waits_for_health_at_poll_interval() {
    let gateway = Arc::new(FakeGateway::new());
    gateway.behave("cache", Behavior::healthy_after(3));
    let plan = plan(service("cache"));
    let provisioner = provisioner(&gateway, &plan).await;

    let started = Instant::now();
    let handle = provisioner
        .provision(only_container(&plan), Duration::from_secs(5), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(handle.status(), HealthStatus::Healthy);
    assert_eq!(gateway.count(|c| matches!(c, Call::Inspect(_))), 4);
    assert_eq!(started.elapsed(), Duration::from_millis(1500));
}

#[tokio::test(start_paused = true)]
async fn unhealthy_container_times_out_at_deadline_and_is_removed() {
    let gateway = Arc::new(FakeGateway::new());
    gateway.behave(
        "db",
        Behavior {
            logs: vec!["FATAL: role does not exist".to_string()],
            ..Behavior::unhealthy()
        },
    );
    let plan = plan(service("db"));
    let provisioner = provisioner(&gateway, &plan).await;

    let started = Instant::now();
    let err = provisioner
        .provision(only_container(&plan), Duration::from_secs(5), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(started.elapsed(), Duration::from_secs(5));
    match err {
        ProvisionError::StartupTimeout {
            slot,
            waited,
            last_status,
        } => {
            assert_eq!(slot.as_str(), "db");
            assert_eq!(waited, Duration::from_secs(5));
            assert_eq!(last_status, HealthStatus::Unhealthy);
        }
        other => panic!("expected StartupTimeout, got {other:?}"),
    }
    assert_eq!(gateway.count(is_stop), 1);
    assert_eq!(gateway.count(is_remove), 1);
    assert_eq!(gateway.count(|c| matches!(c, Call::Logs(_))), 1);
    assert_eq!(gateway.live_containers(), 0);
    assert_eq!(provisioner.ledger().len(), 1, "only the network stays owned");
}

#[tokio::test(start_paused = true)]
async fn unhealthy_container_that_recovers_is_returned_healthy() {
    let gateway = Arc::new(FakeGateway::new());
    gateway.behave(
        "db",
        Behavior {
            health: vec![
                HealthState::Unhealthy,
                HealthState::Unhealthy,
                HealthState::Healthy,
            ],
            ..Behavior::default()
        },
    );
    let plan = plan(service("db"));
    let provisioner = provisioner(&gateway, &plan).await;

    let started = Instant::now();
    let handle = provisioner
        .provision(only_container(&plan), Duration::from_secs(5), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(handle.status(), HealthStatus::Healthy);
    assert_eq!(gateway.count(|c| matches!(c, Call::Inspect(_))), 3);
    assert_eq!(started.elapsed(), settings().poll_interval * 2);
    assert_eq!(gateway.count(is_stop), 0);
    assert_eq!(gateway.count(is_remove), 0);
    assert_eq!(gateway.live_containers(), 1);
}

#[tokio::test(start_paused = true)]
async fn cancellation_interrupts_a_slow_start() {
    let gateway = Arc::new(FakeGateway::new());
    gateway.behave("app", Behavior::slow_start(Duration::from_secs(30)));
    let plan = plan(service("app"));
    let provisioner = provisioner(&gateway, &plan).await;
    let cancel = CancellationToken::new();

    let started = Instant::now();
    let (result, ()) = tokio::join!(
        provisioner.provision(only_container(&plan), Duration::from_secs(60), &cancel),
        async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            cancel.cancel();
        }
    );

    let err = result.unwrap_err();
    assert_eq!(err.kind(), ProvisionErrorKind::Cancelled);
    assert_eq!(err.slot().as_str(), "app");
    assert_eq!(started.elapsed(), Duration::from_secs(1));
    assert_eq!(gateway.count(is_remove), 1);
    assert_eq!(gateway.live_containers(), 0);
}

#[tokio::test(start_paused = true)]
async fn cancelled_before_creation_creates_nothing() {
    let gateway = Arc::new(FakeGateway::new());
    let plan = plan(service("app"));
    let provisioner = provisioner(&gateway, &plan).await;
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = provisioner
        .provision(only_container(&plan), Duration::from_secs(5), &cancel)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ProvisionErrorKind::Cancelled);
    assert_eq!(gateway.count(|c| matches!(c, Call::Create(_))), 0);
}

#[tokio::test(start_paused = true)]
async fn start_failure_cleans_up() {
    let gateway = Arc::new(FakeGateway::new());
    gateway.behave(
        "app",
        Behavior {
            start_error: Some("port is already allocated".to_string()),
            ..Behavior::default()
        },
    );
    let plan = plan(service("app"));
    let provisioner = provisioner(&gateway, &plan).await;

    let err = provisioner
        .provision(only_container(&plan), Duration::from_secs(5), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ProvisionErrorKind::StartFailed);
    assert!(err.to_string().contains("port is already allocated"));
    assert_eq!(gateway.count(is_remove), 1);
    assert_eq!(gateway.live_containers(), 0);
}

#[tokio::test(start_paused = true)]
async fn creation_failure_leaves_nothing_behind() {
    let gateway = Arc::new(FakeGateway::new());
    gateway.behave(
        "app",
        Behavior {
            create_error: Some("no space left on device".to_string()),
            ..Behavior::default()
        },
    );
    let plan = plan(service("app"));
    let provisioner = provisioner(&gateway, &plan).await;

    let err = provisioner
        .provision(only_container(&plan), Duration::from_secs(5), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ProvisionErrorKind::CreationFailed);
    assert_eq!(gateway.live_containers(), 0);
    assert_eq!(gateway.count(|c| matches!(c, Call::Start(_))), 0);
}

#[tokio::test(start_paused = true)]
async fn build_failure_is_reported_before_creation() {
    let gateway = Arc::new(FakeGateway::new());
    gateway.behave(
        "app",
        Behavior {
            build_error: Some("COPY failed".to_string()),
            ..Behavior::default()
        },
    );
    let plan = plan(Slot::service("app").with(Fragment::build("./app")));
    let provisioner = provisioner(&gateway, &plan).await;

    let err = provisioner
        .provision(only_container(&plan), Duration::from_secs(5), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ProvisionErrorKind::BuildFailed);
    assert_eq!(gateway.count(|c| matches!(c, Call::Build(_))), 1);
    assert_eq!(gateway.count(|c| matches!(c, Call::Create(_))), 0);
}

#[tokio::test(start_paused = true)]
async fn built_image_is_used_for_the_container() {
    let gateway = Arc::new(FakeGateway::new());
    let plan = plan(Slot::service("app").with(Fragment::build("./app")));
    let provisioner = provisioner(&gateway, &plan).await;

    let handle = provisioner
        .provision(only_container(&plan), Duration::from_secs(5), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(handle.image().to_string(), "testbed/it-app:latest");
    assert_eq!(gateway.count(|c| matches!(c, Call::Pull(_))), 0);
}

#[tokio::test(start_paused = true)]
async fn present_image_is_not_pulled() {
    let gateway = Arc::new(FakeGateway::new().with_image("busybox:1.36"));
    let plan = plan(service("cache"));
    let provisioner = provisioner(&gateway, &plan).await;

    provisioner
        .provision(only_container(&plan), Duration::from_secs(5), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(gateway.count(|c| matches!(c, Call::Pull(_))), 0);
}

#[tokio::test(start_paused = true)]
async fn missing_image_is_pulled_once() {
    let gateway = Arc::new(FakeGateway::new());
    let plan = plan(service("cache"));
    let provisioner = provisioner(&gateway, &plan).await;

    provisioner
        .provision(only_container(&plan), Duration::from_secs(5), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        gateway.count(|c| *c == Call::Pull("busybox:1.36".to_string())),
        1
    );
}

#[tokio::test(start_paused = true)]
async fn expired_deadline_fails_network_creation() {
    let gateway = Arc::new(FakeGateway::new());
    let plan = plan(service("cache"));
    let provisioner = Provisioner::new(
        Arc::clone(&gateway),
        plan.environment(),
        settings(),
        Arc::new(Ledger::new()),
    );

    let err = provisioner
        .provision_network(plan.network(), Instant::now(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ProvisionErrorKind::StartupTimeout);
    assert!(gateway.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn https_port_is_reported_secure() {
    let gateway = Arc::new(FakeGateway::new());
    let plan = plan(
        Slot::http("web")
            .with(Fragment::image("nginx:1.25"))
            .with(Fragment::port(Scheme::Http, 80))
            .with(Fragment::port(Scheme::Https, 443)),
    );
    let provisioner = provisioner(&gateway, &plan).await;

    let handle = provisioner
        .provision(only_container(&plan), Duration::from_secs(5), &CancellationToken::new())
        .await
        .unwrap();

    let secure: Vec<_> = handle.secure().map(|p| p.container_port).collect();
    let unsecure: Vec<_> = handle.unsecure().map(|p| p.container_port).collect();
    assert_eq!(secure, [443]);
    assert_eq!(unsecure, [80]);
}
