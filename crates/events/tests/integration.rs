//! Integration tests for the event system

use pkgsmith_events::{channel, AppEvent, BuildEvent, EventEmitter, GeneralEvent};
use pkgsmith_types::DepKind;

#[tokio::test]
async fn events_flow_through_the_channel() {
    let (tx, mut rx) = channel();

    tx.emit(AppEvent::Build(BuildEvent::Started {
        package: "test1".to_string(),
        pass: 1,
    }));
    tx.emit(AppEvent::Build(BuildEvent::MissingDependency {
        package: "test1".to_string(),
        dependency: "test1-dep1".to_string(),
        kind: DepKind::Runtime,
    }));

    match rx.recv().await {
        Some(AppEvent::Build(BuildEvent::Started { package, pass })) => {
            assert_eq!(package, "test1");
            assert_eq!(pass, 1);
        }
        other => panic!("unexpected event: {other:?}"),
    }
    match rx.recv().await {
        Some(AppEvent::Build(BuildEvent::MissingDependency { kind, .. })) => {
            assert_eq!(kind, DepKind::Runtime);
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn optional_sender_emits_when_present() {
    let (tx, mut rx) = channel();

    let none: Option<pkgsmith_events::EventSender> = None;
    none.emit_warning("nobody is listening");

    let some = Some(tx);
    some.emit_warning("malformed manifest");

    match rx.recv().await {
        Some(AppEvent::General(GeneralEvent::Warning { message })) => {
            assert_eq!(message, "malformed manifest");
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[test]
fn dropped_receiver_does_not_panic() {
    let (tx, rx) = channel();
    drop(rx);
    tx.emit_debug("receiver is gone");
}
