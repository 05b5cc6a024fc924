// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use scorm_dry_tests::{FrameEvent, RecordingBackend, RecordingFrame, ScriptedPackages};
use scorm_host::{ContentHost, FrameError, HostConfig, HostError, HostFrames, HostPhase};
use scorm_proto::{PackageStatus, ScormVersion, TrackingOp};
use scorm_runtime::{ApiRegistry, BackendError, Dispatcher, FrameRef, Learner, TRUE};
use std::sync::Arc;
use url::Url;

const WINDOW: FrameRef = FrameRef::new(10);
const TOP: FrameRef = FrameRef::new(1);

struct Rig {
    host: ContentHost<RecordingFrame>,
    frame: RecordingFrame,
    backend: RecordingBackend,
    packages: ScriptedPackages,
    registry: ApiRegistry,
    dispatcher: Dispatcher,
}

fn rig(version: ScormVersion, packages: ScriptedPackages) -> Rig {
    let registry = ApiRegistry::new();
    let global = scorm_runtime::profile_for(version).global_name;
    let frame = RecordingFrame::watching(registry.clone(), WINDOW, global);
    let backend = RecordingBackend::new();
    let dispatcher = Dispatcher::current(Arc::new(backend.clone())).unwrap();
    let config = HostConfig::new(
        "pkg1".into(),
        version,
        Url::parse("https://lms.example.edu/courses/42").unwrap(),
        HostFrames {
            window: WINDOW,
            top: TOP,
        },
    );
    let host = ContentHost::new(
        config,
        frame.clone(),
        registry.clone(),
        Arc::new(packages.clone()),
        dispatcher.clone(),
    );
    Rig {
        host,
        frame,
        backend,
        packages,
        registry,
        dispatcher,
    }
}

fn ready_12() -> ScriptedPackages {
    ScriptedPackages::ready("index.html", ScormVersion::Scorm12, "tkt123")
}

#[tokio::test]
async fn mount_publishes_before_pointing_frame_at_proxy() {
    let mut rig = rig(ScormVersion::Scorm12, ready_12());

    rig.host.mount().await.unwrap();

    assert_eq!(
        rig.host.launch_url().unwrap().as_str(),
        "https://lms.example.edu/scorm-proxy/tkt123/pkg1/index.html"
    );
    assert_eq!(rig.frame.sources(), vec![rig.host.launch_url().unwrap().clone()]);
    assert_eq!(rig.frame.api_visible_at_load(), vec![true]);
    assert!(rig.registry.lookup(WINDOW, "API").is_some());
    assert!(rig.registry.lookup(TOP, "API").is_some());
    assert!(rig.registry.lookup(WINDOW, "API_1484_11").is_none());
    assert_eq!(rig.packages.package_requests(), 1);
    assert_eq!(rig.packages.ticket_requests(), 1);

    assert!(rig.host.is_loading());
    rig.host.on_frame_load();
    assert_eq!(rig.host.phase(), &HostPhase::Ready);
}

#[tokio::test]
async fn scorm_2004_publishes_under_its_own_name() {
    let packages = ScriptedPackages::ready("/sco/start.htm?lang=en", ScormVersion::Scorm2004, "t9");
    let mut rig = rig(ScormVersion::Scorm2004, packages);

    rig.host.mount().await.unwrap();

    assert_eq!(
        rig.host.launch_url().unwrap().as_str(),
        "https://lms.example.edu/scorm-proxy/t9/pkg1/sco/start.htm?lang=en"
    );
    assert!(rig.registry.lookup(TOP, "API_1484_11").is_some());
    assert!(rig.registry.lookup(TOP, "API").is_none());
}

#[tokio::test]
async fn package_not_ready_is_terminal_and_publishes_nothing() {
    let mut rig = rig(
        ScormVersion::Scorm12,
        ScriptedPackages::with_status(PackageStatus::Processing),
    );

    let err = rig.host.mount().await.unwrap_err();

    assert_eq!(
        err,
        HostError::PackageNotReady {
            status: PackageStatus::Processing
        }
    );
    assert_eq!(rig.host.error(), Some(&err));
    assert!(rig.registry.is_empty());
    assert!(rig.frame.events().is_empty());
    assert!(rig.host.api().is_none());
    rig.host.on_frame_load();
    assert!(matches!(rig.host.phase(), HostPhase::Failed(_)));
}

#[tokio::test]
async fn ticket_failure_is_terminal() {
    let packages = ready_12();
    packages.set_ticket(Err(BackendError::Status {
        operation: "viewer-ticket",
        status: 403,
        detail: "forbidden".into(),
    }));
    let mut rig = rig(ScormVersion::Scorm12, packages);

    let err = rig.host.mount().await.unwrap_err();

    assert!(matches!(err, HostError::TicketUnavailable(_)));
    assert!(rig.registry.is_empty());
    assert!(rig.frame.sources().is_empty());
}

#[tokio::test]
async fn missing_or_escaping_launch_paths_are_rejected() {
    let mut rig = rig(ScormVersion::Scorm12, ready_12());
    rig.packages.set_meta(Ok(scorm_proto::PackageMeta {
        status: PackageStatus::Ready,
        launch_url: Some("  ".into()),
        version: None,
        title: None,
    }));
    assert_eq!(rig.host.mount().await.unwrap_err(), HostError::MissingLaunchUrl);

    rig.packages.set_meta(Ok(scorm_proto::PackageMeta {
        status: PackageStatus::Ready,
        launch_url: Some("../../admin/index.html".into()),
        version: None,
        title: None,
    }));
    assert!(matches!(
        rig.host.mount().await.unwrap_err(),
        HostError::MalformedLaunch(_)
    ));
    assert!(rig.registry.is_empty());
}

#[tokio::test]
async fn reload_starts_a_fresh_session_on_the_same_url() {
    let mut rig = rig(ScormVersion::Scorm12, ready_12());
    rig.host.mount().await.unwrap();
    rig.host.on_frame_load();
    let first = Arc::clone(rig.host.api().unwrap());
    let completion = rig.host.completion();
    assert_eq!(first.initialize(""), TRUE);
    assert_eq!(first.set_value("cmi.core.lesson_status", "incomplete"), TRUE);
    assert_eq!(first.get_value(""), "");
    assert_eq!(first.get_last_error(), "201");

    rig.host.reload().unwrap();
    rig.dispatcher.settle().await;

    assert!(first.snapshot().terminated());
    assert_eq!(rig.backend.count(TrackingOp::Terminate), 1);
    let second = Arc::clone(rig.host.api().unwrap());
    assert!(!Arc::ptr_eq(&first, &second));
    assert!(!second.snapshot().initialized());
    assert_eq!(second.get_last_error(), "0");
    assert_eq!(second.get_value("cmi.core.lesson_location"), "");
    assert_eq!(second.get_last_error(), "301");
    assert!(Arc::ptr_eq(&rig.registry.lookup(WINDOW, "API").unwrap(), &second));
    assert!(Arc::ptr_eq(&rig.registry.lookup(TOP, "API").unwrap(), &second));
    assert!(rig.host.is_loading());
    let sources = rig.frame.sources();
    assert_eq!(sources.len(), 2);
    assert_eq!(sources[0], sources[1]);
    assert_eq!(rig.frame.api_visible_at_load(), vec![true, true]);
    assert_eq!(rig.packages.ticket_requests(), 1);

    assert_eq!(second.initialize(""), TRUE);
    assert_eq!(second.set_value("cmi.core.lesson_status", "completed"), TRUE);
    assert_eq!(completion.borrow().as_deref(), Some("completed"));
}

#[tokio::test]
async fn reload_2004_session_starts_uninitialized_with_no_error() {
    let packages = ScriptedPackages::ready("sco/launch.html", ScormVersion::Scorm2004, "tkt9");
    let mut rig = rig(ScormVersion::Scorm2004, packages);
    rig.host.mount().await.unwrap();
    let first = Arc::clone(rig.host.api().unwrap());
    assert_eq!(first.initialize(""), TRUE);
    assert_eq!(first.set_value("cmi.completion_status", "completed"), TRUE);
    assert_eq!(first.set_value("cmi.success_status", "maybe"), "false");
    assert_eq!(first.get_last_error(), "406");

    rig.host.reload().unwrap();
    rig.dispatcher.settle().await;

    let second = Arc::clone(rig.host.api().unwrap());
    assert!(first.snapshot().terminated());
    assert_eq!(second.get_last_error(), "0");
    assert_eq!(second.get_value("cmi.location"), "");
    assert_eq!(second.get_last_error(), "123");
    assert!(Arc::ptr_eq(
        &rig.registry.lookup(TOP, "API_1484_11").unwrap(),
        &second
    ));
    assert_eq!(rig.backend.count(TrackingOp::Terminate), 1);
}

#[tokio::test]
async fn reload_without_content_is_an_error() {
    let mut rig = rig(ScormVersion::Scorm12, ready_12());
    assert_eq!(rig.host.reload().unwrap_err(), HostError::NotMounted);
}

#[tokio::test]
async fn unmount_terminates_once_and_withdraws_both_bindings() {
    let mut rig = rig(ScormVersion::Scorm12, ready_12());
    rig.host.mount().await.unwrap();
    let api = Arc::clone(rig.host.api().unwrap());
    assert_eq!(api.initialize(""), TRUE);

    rig.host.unmount();
    rig.host.unmount();
    drop(rig.host);
    rig.dispatcher.settle().await;

    assert_eq!(rig.backend.count(TrackingOp::Terminate), 1);
    assert!(rig.registry.is_empty());
    assert_eq!(rig.frame.events().last(), Some(&FrameEvent::ClearSource));
    assert!(api.snapshot().terminated());
}

#[tokio::test]
async fn unmount_of_unopened_session_sends_nothing() {
    let mut rig = rig(ScormVersion::Scorm2004, ready_12());
    rig.host.mount().await.unwrap();

    rig.host.unmount();
    rig.dispatcher.settle().await;

    assert_eq!(rig.backend.total(), 0);
    assert!(rig.registry.is_empty());
    assert_eq!(rig.host.phase(), &HostPhase::Idle);
}

#[tokio::test]
async fn dropping_the_host_tears_down() {
    let rig = rig(ScormVersion::Scorm12, ready_12());
    let Rig {
        mut host,
        registry,
        frame,
        ..
    } = rig;
    host.mount().await.unwrap();
    assert_eq!(registry.len(), 2);

    drop(host);

    assert!(registry.is_empty());
    assert_eq!(frame.events().last(), Some(&FrameEvent::ClearSource));
}

#[tokio::test]
async fn set_package_remounts_and_resets_completion() {
    let mut rig = rig(ScormVersion::Scorm12, ready_12());
    rig.host.mount().await.unwrap();
    let api = Arc::clone(rig.host.api().unwrap());
    api.initialize("");
    api.set_value("cmi.core.lesson_status", "passed");
    let completion = rig.host.completion();
    assert_eq!(completion.borrow().as_deref(), Some("passed"));

    rig.host
        .set_package("pkg2".into(), ScormVersion::Scorm2004)
        .await
        .unwrap();

    assert!(completion.borrow().is_none());
    assert!(rig.registry.lookup(WINDOW, "API").is_none());
    assert!(rig.registry.lookup(WINDOW, "API_1484_11").is_some());
    assert_eq!(
        rig.host.launch_url().unwrap().as_str(),
        "https://lms.example.edu/scorm-proxy/tkt123/pkg2/index.html"
    );
    assert_eq!(rig.host.config().version, ScormVersion::Scorm2004);
}

#[tokio::test]
async fn learner_identity_reaches_the_data_model() {
    let rig = rig(ScormVersion::Scorm12, ready_12());
    let config = rig.host.config().clone().with_learner(Learner {
        id: "u-17".into(),
        name: "Doe, Jane".into(),
    });
    let mut host = ContentHost::new(
        config,
        RecordingFrame::new(),
        ApiRegistry::new(),
        Arc::new(rig.packages.clone()),
        rig.dispatcher.clone(),
    );
    host.mount().await.unwrap();
    let api = host.api().unwrap();
    api.initialize("");
    assert_eq!(api.get_value("cmi.core.student_id"), "u-17");
    assert_eq!(api.get_value("cmi.core.student_name"), "Doe, Jane");
}

#[tokio::test]
async fn fullscreen_state_follows_container_events_only() {
    let mut rig = rig(ScormVersion::Scorm12, ready_12());
    rig.host.mount().await.unwrap();

    rig.host.toggle_fullscreen().unwrap();
    assert!(!rig.host.is_fullscreen());
    rig.host.on_fullscreen_change(true);
    assert!(rig.host.is_fullscreen());

    rig.host.toggle_fullscreen().unwrap();
    rig.host.on_fullscreen_change(false);

    rig.frame.deny_fullscreen();
    assert!(matches!(
        rig.host.toggle_fullscreen(),
        Err(FrameError::Denied(_))
    ));
    assert!(!rig.host.is_fullscreen());

    let fullscreen_events: Vec<_> = rig
        .frame
        .events()
        .into_iter()
        .filter(|e| matches!(e, FrameEvent::RequestFullscreen | FrameEvent::ExitFullscreen))
        .collect();
    assert_eq!(
        fullscreen_events,
        vec![FrameEvent::RequestFullscreen, FrameEvent::ExitFullscreen]
    );
}
