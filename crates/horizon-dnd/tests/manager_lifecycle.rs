//! Drag lifecycle through the manager with the mouse strategy.

mod common;

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use common::Scene;
use horizon_dnd::{CriterionConfig, CriterionRegistry, DragEventType, ServerResponse, Transferable};
use horizon_dnd_core::{EventKind, Key, NativeEvent, Point};

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

/// Leaves `a` into `b` the way a browser reports it: `mouseout` on `a`
/// with `b` as the related target, then `mouseover` on `b`.
fn cross_a_to_b(scene: &mut Scene) {
    let out = NativeEvent::mouse(EventKind::MouseOut, Point::new(150.0, 50.0), scene.a_root)
        .with_related_target(scene.b_root);
    scene.manager.preview_native_event(&out).unwrap();
    scene.over_b();
}

fn cross_b_to_a(scene: &mut Scene) {
    let out = NativeEvent::mouse(EventKind::MouseOut, Point::new(150.0, 50.0), scene.b_root)
        .with_related_target(scene.a_root);
    scene.manager.preview_native_event(&out).unwrap();
    scene.over_a();
}

#[test]
fn test_enter_once_then_over_for_each_move() {
    let mut scene = Scene::new();
    scene.start();
    scene.over_a();
    for x in [20.0, 30.0, 40.0] {
        let event = scene.send(EventKind::MouseMove, x, 50.0, scene.a_root);
        assert!(event.is_default_prevented());
    }
    // Entering a child of the same target changes nothing.
    scene.over_a();

    assert_eq!(
        scene.calls(),
        strings(&["enter a", "accepted a", "over a", "over a", "over a"])
    );
}

#[test]
fn test_crossing_targets_leaves_before_entering() {
    let mut scene = Scene::new();
    scene.start();
    scene.over_a();
    scene.over_b();
    cross_b_to_a(&mut scene);

    assert_eq!(
        scene.calls(),
        strings(&[
            "enter a", "accepted a", "leave a", "enter b", "accepted b", "leave b", "enter a",
            "accepted a",
        ])
    );
    assert_eq!(scene.manager.current_drop_target().map(|t| t.owner()), Some(scene.a));
}

#[test]
fn test_mouse_out_to_nothing_leaves() {
    let mut scene = Scene::new();
    scene.start();
    scene.over_a();
    let out = NativeEvent::mouse(EventKind::MouseOut, Point::new(150.0, 50.0), scene.a_root)
        .with_related_target(scene.body);
    scene.manager.preview_native_event(&out).unwrap();
    scene.send(EventKind::MouseMove, 150.0, 50.0, scene.body);

    assert_eq!(scene.calls(), strings(&["enter a", "accepted a", "leave a"]));
    assert!(scene.manager.current_drop_target().is_none());
}

#[test]
fn test_escape_leaves_without_drop() {
    let mut scene = Scene::new();
    scene.start();
    scene.over_a();
    for x in [20.0, 30.0, 40.0] {
        scene.send(EventKind::MouseMove, x, 50.0, scene.a_root);
    }

    let escape = NativeEvent::key_down(Key::Escape);
    scene.manager.preview_native_event(&escape).unwrap();

    assert!(escape.is_canceled());
    assert!(escape.is_default_prevented());
    let calls = scene.calls();
    assert_eq!(calls.iter().filter(|c| *c == "leave a").count(), 1);
    assert!(!calls.iter().any(|c| c.starts_with("drop")));
    assert_eq!(calls.last().map(String::as_str), Some("leave a"));

    assert!(scene.manager.current_drag().is_none());
    assert!(!scene.manager.is_intercepting());
    assert!(!scene.has_source_style());
    assert_eq!(scene.document.read().capture(), None);

    // Events after the drag ended are ignored.
    scene.send(EventKind::MouseUp, 50.0, 50.0, scene.a_root);
    assert_eq!(scene.calls(), calls);
}

#[test]
fn test_other_key_down_is_ignored() {
    let mut scene = Scene::new();
    scene.start();
    scene.over_a();
    let enter = NativeEvent::key_down(Key::Enter);
    scene.manager.preview_native_event(&enter).unwrap();
    assert!(!enter.is_canceled());
    assert!(scene.manager.current_drag().is_some());
    assert_eq!(scene.calls(), strings(&["enter a", "accepted a"]));
}

#[test]
fn test_movement_threshold() {
    let mut scene = Scene::new();
    let press = NativeEvent::mouse(EventKind::MouseDown, Point::new(10.0, 10.0), scene.a_root);
    scene
        .manager
        .start_drag(Transferable::new(scene.source), Some(&press), true);
    assert!(scene.manager.is_start_pending());

    scene.send(EventKind::MouseMove, 12.0, 10.0, scene.a_root);
    assert!(scene.manager.is_start_pending());
    assert!(!scene.manager.is_started());
    assert!(scene.calls().is_empty());
    assert!(!scene.has_source_style());

    scene.send(EventKind::MouseMove, 14.0, 10.0, scene.a_root);
    assert!(scene.manager.is_started());
    assert!(scene.has_source_style());
    assert_eq!(scene.calls(), strings(&["enter a", "accepted a"]));

    scene.send(EventKind::MouseMove, 16.0, 10.0, scene.a_root);
    assert_eq!(scene.calls(), strings(&["enter a", "accepted a", "over a"]));
}

#[test]
fn test_start_drag_hands_back_the_current_drag() {
    let mut scene = Scene::new();
    let press =
        NativeEvent::mouse(EventKind::MouseDown, Point::new(10.0, 310.0), scene.source_root);
    let pending = scene
        .manager
        .start_drag(Transferable::new(scene.source), Some(&press), true);
    pending.transferable_mut().set_data("itemId", "row-9");
    let pending_id = pending.event_id();

    let current = scene.manager.current_drag().unwrap();
    assert_eq!(current.event_id(), pending_id);
    assert_eq!(
        current.transferable().get_data("itemId").and_then(|value| value.as_str()),
        Some("row-9")
    );

    // Without event handling the drag starts at once.
    let moved = NativeEvent::mouse(EventKind::MouseMove, Point::new(50.0, 50.0), scene.a_root);
    let started = scene
        .manager
        .start_drag(Transferable::new(scene.source), Some(&moved), false);
    assert_ne!(started.event_id(), pending_id);
    assert_eq!(started.element_over(), Some(scene.a_root));
    assert!(scene.manager.is_started());
    assert_eq!(scene.calls(), strings(&["enter a", "accepted a"]));
}

#[test]
fn test_pending_start_ignores_focus_and_keys_but_aborts_on_click() {
    let mut scene = Scene::new();
    scene.press();
    for kind in [
        EventKind::Focus,
        EventKind::Blur,
        EventKind::KeyDown,
        EventKind::MouseOver,
        EventKind::Pointer,
    ] {
        scene.send(kind, 10.0, 310.0, scene.source_root);
        assert!(scene.manager.is_start_pending(), "{} aborted the pending drag", kind.name());
    }
    // Leaving the source without a drag image is not movement.
    scene.send(EventKind::MouseOut, 90.0, 310.0, scene.source_root);
    assert!(scene.manager.is_start_pending());

    scene.send(EventKind::Click, 10.0, 310.0, scene.source_root);
    assert!(!scene.manager.is_start_pending());
    assert!(scene.manager.current_drag().is_none());
    assert!(!scene.has_source_style());
}

#[test]
fn test_new_drag_interrupts_previous() {
    let mut scene = Scene::new();
    scene.start();
    scene.over_a();
    let first = scene.manager.current_drag().map(|drag| drag.event_id());

    scene.start();
    let second = scene.manager.current_drag().map(|drag| drag.event_id());
    assert_ne!(first, second);
    assert_eq!(scene.calls(), strings(&["enter a", "accepted a", "leave a"]));
}

#[test]
fn test_visit_ids_increase_then_reset() {
    let mut scene = Scene::new();
    scene.require_server_checks();
    scene.start();
    scene.over_a();
    cross_a_to_b(&mut scene);
    assert_eq!(scene.manager.visit_id(), 2);

    scene.send(EventKind::MouseUp, 250.0, 50.0, scene.b_root);
    assert_eq!(scene.manager.visit_id(), 0);
    assert!(!scene.manager.is_busy());

    let requests = scene.requests();
    let ids: Vec<u32> = requests.iter().map(|r| r.visit_id).collect();
    assert_eq!(ids, [1, 2, 3]);
    let kinds: Vec<_> = requests.iter().map(|r| r.drag_event_type()).collect();
    assert_eq!(
        kinds,
        [Some(DragEventType::Enter), Some(DragEventType::Enter), Some(DragEventType::Drop)]
    );

    let enter = &requests[0];
    assert_eq!(enter.drop_handler_owner.as_deref(), Some("10"));
    assert_eq!(enter.drag_source.as_deref(), Some("30"));
    assert_eq!(enter.transferable["itemId"], "row-7");
    assert!(enter.drop_details["mouseEvent"].is_string());

    let drop = &requests[2];
    assert_eq!(drop.drop_handler_owner.as_deref(), Some("20"));
    let snapshot = drop.drop_details["mouseEvent"].as_str().unwrap();
    assert!(snapshot.starts_with("left,250,50,"));
    assert!(snapshot.contains("mouseup"));

    // The next drag starts counting again.
    scene.start();
    scene.over_a();
    assert_eq!(scene.manager.visit_id(), 1);
}

#[test]
fn test_stale_response_is_ignored() {
    let mut scene = Scene::new();
    scene.require_server_checks();
    scene.start();
    scene.over_a();
    cross_a_to_b(&mut scene);
    scene.clear_calls();

    scene.manager.handle_server_response(&ServerResponse::new(1, true));
    assert!(scene.calls().is_empty());
    assert!(scene.manager.is_busy());

    scene.manager.handle_server_response(&ServerResponse::new(2, true));
    assert_eq!(scene.calls(), strings(&["accepted b"]));
    assert!(!scene.manager.is_busy());

    // Delivered twice: nothing is waiting any more.
    scene.manager.handle_server_response(&ServerResponse::new(2, true));
    assert_eq!(scene.calls(), strings(&["accepted b"]));
}

#[test]
fn test_rejection_never_calls_back() {
    let mut scene = Scene::new();
    scene.require_server_checks();
    scene.start();
    scene.over_a();
    scene.manager.handle_server_response(&ServerResponse::new(1, false));
    assert_eq!(scene.calls(), strings(&["enter a"]));
    assert!(!scene.manager.is_busy());
}

#[test]
fn test_late_response_after_drag_end() {
    let mut scene = Scene::new();
    scene.require_server_checks();
    scene.start();
    scene.over_a();
    cross_a_to_b(&mut scene);
    cross_b_to_a(&mut scene);
    cross_a_to_b(&mut scene);
    cross_b_to_a(&mut scene);
    assert_eq!(scene.manager.visit_id(), 5);

    scene
        .manager
        .preview_native_event(&NativeEvent::key_down(Key::Escape))
        .unwrap();
    assert_eq!(scene.manager.visit_id(), 0);

    scene.manager.handle_server_response(&ServerResponse::new(5, true));
    assert!(!scene.calls().iter().any(|c| c.starts_with("accepted")));
}

#[test]
fn test_drop_request_keeps_source_style_until_answered() {
    let mut scene = Scene::new();
    scene.require_server_checks();
    scene.start();
    scene.over_a();
    scene.manager.handle_server_response(&ServerResponse::new(1, true));
    assert_eq!(scene.calls(), strings(&["enter a", "accepted a"]));

    scene.outbox.active.set(true);
    scene.send(EventKind::MouseUp, 50.0, 50.0, scene.a_root);
    assert_eq!(scene.calls().last().map(String::as_str), Some("drop a"));
    assert_eq!(scene.requests().len(), 2);
    assert!(scene.has_source_style());
    assert!(scene.manager.current_drag().is_none());

    assert_eq!(scene.advance(Duration::from_millis(100)), 1);
    assert!(scene.has_source_style());

    scene.outbox.active.set(false);
    scene.advance(Duration::from_secs(1));
    assert!(!scene.has_source_style());
    assert_eq!(scene.scheduler.active_count(), 0);
}

#[test]
fn test_rejected_drop_sends_nothing() {
    let mut scene = Scene::new();
    let registry = CriterionRegistry::with_builtins();
    let rules = CriterionConfig::new("contains-data-flavor")
        .with_attribute("flavors", serde_json::json!(["html"]));
    scene
        .a_handler
        .borrow_mut()
        .base
        .update_accept_rules(rules, &registry)
        .unwrap();

    scene.start();
    scene.over_a();
    scene.send(EventKind::MouseUp, 50.0, 50.0, scene.a_root);

    assert_eq!(scene.calls(), strings(&["enter a", "drop a"]));
    assert!(scene.requests().is_empty());
    assert!(!scene.has_source_style());
    assert_eq!(scene.scheduler.active_count(), 0);
}

#[test]
fn test_accepted_local_drop_is_sent() {
    let mut scene = Scene::new();
    scene.start();
    scene.over_a();
    scene.send(EventKind::MouseUp, 50.0, 50.0, scene.a_root);

    let requests = scene.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].drag_event_type(), Some(DragEventType::Drop));
    assert_eq!(requests[0].visit_id, 1);

    scene.advance(Duration::from_millis(50));
    assert!(!scene.has_source_style());
}

#[test]
fn test_disabled_or_removed_targets_are_skipped() {
    let mut scene = Scene::new();
    scene.document.write().set_enabled(scene.a, false).unwrap();
    scene.start();
    scene.over_a();
    assert!(scene.calls().is_empty());

    scene.document.write().remove_widget(scene.b).unwrap();
    scene.over_b();
    assert!(scene.calls().is_empty());
    assert!(scene.manager.current_drop_target().is_none());
}

#[test]
fn test_deferred_commands_wait_for_the_visit() {
    let mut scene = Scene::new();
    scene.require_server_checks();
    scene.start();
    scene.over_a();
    assert!(scene.manager.is_busy());

    let first = Rc::new(Cell::new(0));
    let second = Rc::new(Cell::new(0));
    let counter = Rc::clone(&first);
    scene
        .manager
        .execute_when_ready(Box::new(move |_| counter.set(counter.get() + 1)));
    let counter = Rc::clone(&second);
    scene
        .manager
        .execute_when_ready(Box::new(move |_| counter.set(counter.get() + 1)));
    assert_eq!((first.get(), second.get()), (0, 0));

    scene.manager.handle_server_response(&ServerResponse::new(1, true));
    // One slot: the second command replaced the first.
    assert_eq!((first.get(), second.get()), (0, 1));

    let counter = Rc::clone(&first);
    scene
        .manager
        .execute_when_ready(Box::new(move |_| counter.set(counter.get() + 1)));
    assert_eq!(first.get(), 1);
}

#[test]
fn test_stale_response_keeps_deferred_command_queued() {
    let mut scene = Scene::new();
    scene.require_server_checks();
    scene.start();
    scene.over_a();

    let ran = Rc::new(Cell::new(false));
    let flag = Rc::clone(&ran);
    scene
        .manager
        .execute_when_ready(Box::new(move |_| flag.set(true)));

    scene.manager.handle_server_response(&ServerResponse::new(99, true));
    assert!(!ran.get());
    assert!(scene.manager.is_busy());

    scene.manager.handle_server_response(&ServerResponse::new(1, true));
    assert!(ran.get());
    assert!(!scene.manager.is_busy());
}
