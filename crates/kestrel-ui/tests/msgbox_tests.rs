//! Message box lifecycle tests driven through the event loop.

use kestrel_ui::{
    EventKind, EventLoop, HandleStatus, InputEvent, LifecycleState, MsgBox, MsgBoxOptions,
    NodeKind, TreeConfig, UiCore, UiError, UiEvent, handler,
};
use std::cell::RefCell;
use std::rc::Rc;

/// Nodes in a box with title, text, buttons and a close button.
const FULL_BOX_NODES: u64 = 8;

fn full_box(lp: &mut EventLoop, modal: bool) -> MsgBox {
    let parent = if modal { None } else { Some(lp.core().screen()) };
    MsgBox::create(lp.core_mut(), parent, Some("T"), Some("X"), &["Apply", "Cancel"], true).unwrap()
}

#[test]
fn test_create_reports_title_text_and_buttons() {
    let mut core = UiCore::new();
    let screen = core.screen();
    let msgbox = MsgBox::create(
        &mut core,
        Some(screen),
        Some("The title"),
        Some("The text"),
        &["Apply", "Cancel"],
        true,
    )
    .unwrap();

    assert_eq!(msgbox.title(&core).unwrap(), Some("The title"));
    assert_eq!(msgbox.text(&core).unwrap(), Some("The text"));
    assert_eq!(msgbox.button_text(&core, 0).unwrap(), Some("Apply"));
    assert_eq!(msgbox.button_text(&core, 1).unwrap(), Some("Cancel"));
    assert_eq!(msgbox.button_text(&core, 2).unwrap(), None);
    assert_eq!(msgbox.button_texts(&core).unwrap(), vec!["Apply", "Cancel"]);
    assert_eq!(msgbox.active_button(&core).unwrap(), None);
    assert_eq!(msgbox.active_button_text(&core).unwrap(), None);
    assert_eq!(msgbox.state(&core), LifecycleState::Active);
    assert!(!msgbox.is_modal(&core).unwrap());
    assert_eq!(core.tree().parent(msgbox.root()).unwrap(), Some(screen));
}

#[test]
fn test_modal_close_destroys_synchronously() {
    let mut lp = EventLoop::default();
    let msgbox = full_box(&mut lp, true);
    assert!(msgbox.is_modal(lp.core()).unwrap());
    assert_eq!(lp.core().overlays().len(), 1);

    msgbox.close(lp.core_mut()).unwrap();

    assert!(!msgbox.is_alive(lp.core()));
    assert_eq!(msgbox.state(lp.core()), LifecycleState::Destroyed);
    assert!(lp.core().overlays().is_empty());
    assert!(lp.core().tree().children(lp.core().top_layer()).unwrap().is_empty());
}

fn assert_accessors_report_invalid_handle(msgbox: MsgBox, core: &UiCore) {
    let stale = Some(UiError::InvalidHandle(msgbox.root()));
    assert_eq!(msgbox.title(core).err(), stale);
    assert_eq!(msgbox.text(core).err(), stale);
    assert_eq!(msgbox.title_label(core).err(), stale);
    assert_eq!(msgbox.text_label(core).err(), stale);
    assert_eq!(msgbox.header(core).err(), stale);
    assert_eq!(msgbox.close_button(core).err(), stale);
    assert_eq!(msgbox.content(core).err(), stale);
    assert_eq!(msgbox.buttons(core).err(), stale);
    assert_eq!(msgbox.button_text(core, 0).err(), stale);
    assert_eq!(msgbox.button_texts(core).err(), stale);
    assert_eq!(msgbox.active_button(core).err(), stale);
    assert_eq!(msgbox.active_button_text(core).err(), stale);
    assert_eq!(msgbox.is_modal(core).err(), stale);
    assert_eq!(msgbox.state(core), LifecycleState::Destroyed);
}

#[test]
fn test_accessors_on_destroyed_box_report_invalid_handle() {
    let mut lp = EventLoop::default();

    let closed = full_box(&mut lp, true);
    closed.close(lp.core_mut()).unwrap();
    assert_accessors_report_invalid_handle(closed, lp.core());
    assert_eq!(
        closed.set_title(lp.core_mut(), "late"),
        Err(UiError::InvalidHandle(closed.root()))
    );
    assert_eq!(
        closed.add_content(lp.core_mut(), NodeKind::Container),
        Err(UiError::InvalidHandle(closed.root()))
    );

    let deferred = full_box(&mut lp, false);
    {
        let (core, tasks) = lp.parts_mut();
        deferred.close_async(core, tasks).unwrap();
    }
    assert_eq!(deferred.title(lp.core()).unwrap(), Some("T"));
    lp.drain_tasks();
    assert_accessors_report_invalid_handle(deferred, lp.core());
}

#[test]
fn test_modality_ends_with_overlay() {
    let mut lp = EventLoop::default();
    let msgbox = full_box(&mut lp, true);
    let close = msgbox.close_button(lp.core()).unwrap().unwrap();
    let caption = lp.core().tree().children(close).unwrap()[0];

    assert!(msgbox.is_modal(lp.core()).unwrap());
    lp.push_input(InputEvent::click(caption));
    lp.run_once();

    assert!(!msgbox.is_alive(lp.core()));
    assert!(lp.core().overlays().is_empty());
}

#[test]
fn test_non_modal_close_detaches_from_parent() {
    let mut lp = EventLoop::default();
    let screen = lp.core().screen();
    let msgbox = full_box(&mut lp, false);

    msgbox.close(lp.core_mut()).unwrap();

    assert!(!msgbox.is_alive(lp.core()));
    assert!(!lp.core().tree().children(screen).unwrap().contains(&msgbox.root()));
}

#[test]
fn test_close_async_waits_for_one_drain() {
    let mut lp = EventLoop::default();
    let msgbox = full_box(&mut lp, false);

    let (core, tasks) = lp.parts_mut();
    msgbox.close_async(core, tasks).unwrap();
    assert!(msgbox.is_alive(lp.core()));
    assert_eq!(msgbox.state(lp.core()), LifecycleState::PendingAsyncClose);

    assert_eq!(lp.drain_tasks(), 1);
    assert!(!msgbox.is_alive(lp.core()));
}

#[test]
fn test_close_button_click_closes_after_one_iteration() {
    let mut lp = EventLoop::default();
    let msgbox = full_box(&mut lp, false);
    let close = msgbox.close_button(lp.core()).unwrap().unwrap();

    lp.push_input(InputEvent::click(close));
    lp.run_once();

    assert!(!msgbox.is_alive(lp.core()));
    assert_eq!(lp.stats().tasks_run, 1);
}

#[test]
fn test_close_button_keeps_box_alive_until_drain() {
    let mut lp = EventLoop::default();
    let msgbox = full_box(&mut lp, true);
    let close = msgbox.close_button(lp.core()).unwrap().unwrap();

    lp.send_event(close, UiEvent::click()).unwrap();
    assert!(msgbox.is_alive(lp.core()));
    assert_eq!(lp.tasks().len(), 1);

    lp.drain_tasks();
    assert!(!msgbox.is_alive(lp.core()));
    assert!(lp.core().overlays().is_empty());
}

#[test]
fn test_repeated_close_calls_destroy_once() {
    let mut lp = EventLoop::default();
    let msgbox = full_box(&mut lp, false);
    let before = lp.core().tree().stats().nodes_destroyed;

    {
        let (core, tasks) = lp.parts_mut();
        msgbox.close_async(core, tasks).unwrap();
        msgbox.close_async(core, tasks).unwrap();
    }
    assert_eq!(lp.tasks().len(), 1);

    msgbox.close(lp.core_mut()).unwrap();
    assert_eq!(msgbox.close(lp.core_mut()), Err(UiError::InvalidHandle(msgbox.root())));
    {
        let (core, tasks) = lp.parts_mut();
        assert!(matches!(
            msgbox.close_async(core, tasks),
            Err(UiError::InvalidHandle(_))
        ));
    }

    lp.drain_tasks();
    assert_eq!(
        lp.core().tree().stats().nodes_destroyed - before,
        FULL_BOX_NODES
    );
}

#[test]
fn test_stale_task_spares_new_occupant() {
    let mut lp = EventLoop::default();
    let first = full_box(&mut lp, false);
    {
        let (core, tasks) = lp.parts_mut();
        first.close_async(core, tasks).unwrap();
    }
    first.close(lp.core_mut()).unwrap();

    let second = full_box(&mut lp, false);
    let reused = lp
        .core()
        .tree()
        .node_ids()
        .into_iter()
        .find(|id| id.index() == first.root().index())
        .unwrap();
    assert_ne!(reused, first.root());
    lp.drain_tasks();

    assert!(lp.core().tree().is_alive(reused));

    assert!(!first.is_alive(lp.core()));
    assert!(second.is_alive(lp.core()));
    assert_eq!(second.state(lp.core()), LifecycleState::Active);
}

#[test]
fn test_sync_close_inside_own_handler_is_rejected() {
    let mut lp = EventLoop::default();
    let msgbox = full_box(&mut lp, false);
    let row = msgbox.buttons(lp.core()).unwrap().unwrap();
    let outcome = Rc::new(RefCell::new(None));

    let sink = outcome.clone();
    lp.core_mut()
        .tree_mut()
        .observe(
            row,
            Some(EventKind::ValueChanged),
            handler(move |ctx, _| {
                *sink.borrow_mut() = Some(msgbox.close(ctx.core));
                HandleStatus::consumed()
            }),
        )
        .unwrap();

    lp.push_input(InputEvent::click_item(row, 1));
    lp.run_once();

    assert_eq!(*outcome.borrow(), Some(Err(UiError::DispatchInProgress(row))));
    assert!(msgbox.is_alive(lp.core()));
}

#[test]
fn test_close_async_from_button_handler() {
    let mut lp = EventLoop::default();
    let msgbox = full_box(&mut lp, false);
    let row = msgbox.buttons(lp.core()).unwrap().unwrap();
    let picked = Rc::new(RefCell::new(None));

    let sink = picked.clone();
    lp.core_mut()
        .tree_mut()
        .observe(
            msgbox.root(),
            Some(EventKind::ValueChanged),
            handler(move |ctx, _| {
                let text = msgbox.active_button_text(ctx.core).unwrap().map(str::to_owned);
                *sink.borrow_mut() = text;
                msgbox.close_async(ctx.core, ctx.tasks).unwrap();
                HandleStatus::consumed()
            }),
        )
        .unwrap();

    lp.push_input(InputEvent::click_item(row, 0));
    lp.run_once();

    assert_eq!(picked.borrow().as_deref(), Some("Apply"));
    assert!(!msgbox.is_alive(lp.core()));
}

#[test]
fn test_button_click_sets_active_button() {
    let mut lp = EventLoop::default();
    let msgbox = full_box(&mut lp, false);
    let row = msgbox.buttons(lp.core()).unwrap().unwrap();

    lp.push_input(InputEvent::click_item(row, 1));
    lp.push_input(InputEvent::click_item(row, 7));
    lp.run_once();

    assert_eq!(msgbox.active_button(lp.core()).unwrap(), Some(1));
    assert_eq!(msgbox.active_button_text(lp.core()).unwrap(), Some("Cancel"));
}

#[test]
fn test_modal_box_blocks_outside_clicks_until_closed() {
    let mut lp = EventLoop::default();
    let screen = lp.core().screen();
    let outside = lp
        .core_mut()
        .tree_mut()
        .create_node(screen, NodeKind::Button)
        .unwrap();
    let clicks = Rc::new(RefCell::new(0));
    let sink = clicks.clone();
    lp.core_mut()
        .tree_mut()
        .observe(
            outside,
            Some(EventKind::Clicked),
            handler(move |_, _| {
                *sink.borrow_mut() += 1;
                HandleStatus::consumed()
            }),
        )
        .unwrap();

    let msgbox = full_box(&mut lp, true);
    lp.push_input(InputEvent::click(outside));
    lp.run_once();
    assert_eq!(*clicks.borrow(), 0);
    assert_eq!(lp.stats().events_blocked, 1);

    let close = msgbox.close_button(lp.core()).unwrap().unwrap();
    lp.push_input(InputEvent::click(close));
    lp.run_once();
    assert!(!msgbox.is_alive(lp.core()));

    lp.push_input(InputEvent::click(outside));
    lp.run_once();
    assert_eq!(*clicks.borrow(), 1);
}

#[test]
fn test_stacked_modals_only_top_accepts_input() {
    let mut lp = EventLoop::default();
    let lower = full_box(&mut lp, true);
    let upper = full_box(&mut lp, true);
    let lower_close = lower.close_button(lp.core()).unwrap().unwrap();

    lp.push_input(InputEvent::click(lower_close));
    lp.run_once();
    assert!(lower.is_alive(lp.core()));

    upper.close(lp.core_mut()).unwrap();
    lp.push_input(InputEvent::click(lower_close));
    lp.run_once();
    assert!(!lower.is_alive(lp.core()));
}

#[test]
fn test_construction_failure_leaves_no_trace() {
    let mut core = UiCore::with_config(TreeConfig::with_max_nodes(5));
    let screen = core.screen();
    let result = MsgBox::create(&mut core, Some(screen), Some("T"), Some("X"), &["A"], true);

    match result {
        Err(UiError::ConstructionFailure(inner)) => {
            assert_eq!(*inner, UiError::CapacityExceeded { max_nodes: 5 });
        }
        other => panic!("expected construction failure, got {:?}", other),
    }
    assert!(core.tree().children(screen).unwrap().is_empty());
    assert!(core.overlays().is_empty());
    assert_eq!(core.tree().len(), 2);

    let stats = core.tree().stats();
    assert_eq!(stats.nodes_created - 2, stats.nodes_destroyed);
}

#[test]
fn test_modal_construction_failure_removes_backdrop() {
    let mut core = UiCore::with_config(TreeConfig::with_max_nodes(3));
    let result = MsgBox::create(&mut core, None, Some("T"), Some("X"), &["A"], true);

    assert!(matches!(result, Err(UiError::ConstructionFailure(_))));
    assert!(core.tree().children(core.top_layer()).unwrap().is_empty());
    assert!(core.overlays().is_empty());
}

#[test]
fn test_create_with_dead_parent() {
    let mut core = UiCore::new();
    let screen = core.screen();
    let panel = core.tree_mut().create_node(screen, NodeKind::Container).unwrap();
    core.tree_mut().destroy_subtree(panel).unwrap();

    let result = MsgBox::create_with(&mut core, Some(panel), &MsgBoxOptions::new().title("T"));
    assert_eq!(result, Err(UiError::InvalidHandle(panel)));
}

#[test]
fn test_add_content_appends_after_text() {
    let mut core = UiCore::new();
    let screen = core.screen();
    let msgbox = MsgBox::create_with(
        &mut core,
        Some(screen),
        &MsgBoxOptions::new().text("Body").button("OK"),
    )
    .unwrap();

    let extra = msgbox.add_content(&mut core, NodeKind::label("More")).unwrap();
    let content = msgbox.content(&core).unwrap();
    let text = msgbox.text_label(&core).unwrap().unwrap();

    assert_eq!(core.tree().children(content).unwrap(), &[text, extra]);
    assert_eq!(msgbox.header(&core).unwrap(), None);
}

#[test]
fn test_clean_screen_invalidates_boxes() {
    let mut lp = EventLoop::default();
    let msgbox = full_box(&mut lp, false);
    {
        let (core, tasks) = lp.parts_mut();
        msgbox.close_async(core, tasks).unwrap();
    }

    assert_eq!(lp.core_mut().clean_screen().unwrap(), FULL_BOX_NODES as usize);
    lp.drain_tasks();
    assert!(!msgbox.is_alive(lp.core()));
}
