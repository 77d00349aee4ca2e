//! Message Box Example - Modal Dialog Lifecycle
//!
//! Opens a modal confirmation box over a screen button, shows that the
//! button is blocked while the box is open, picks "Delete" from the button
//! row and closes the box from its own handler via the task queue.
//!
//! Run with `RUST_LOG=trace` to see stale deferred closes being skipped.

use kestrel_core::config::{Config, ProfilingMode};
use kestrel_ui::{
    EventKind, EventLoop, HandleStatus, InputEvent, MsgBox, MsgBoxOptions, NodeKind, UiResult,
    handler,
};

fn main() -> UiResult<()> {
    Config {
        profiling: ProfilingMode::On,
        log_filter: None,
    }
    .apply();

    let mut lp = EventLoop::default();
    let screen = lp.core().screen();
    let refresh = lp.core_mut().tree_mut().create_node(screen, NodeKind::Button)?;
    lp.core_mut().tree_mut().observe(
        refresh,
        Some(EventKind::Clicked),
        handler(|_, _| {
            tracing::info!("refresh clicked");
            HandleStatus::consumed()
        }),
    )?;

    let options = MsgBoxOptions::new()
        .title("Delete file?")
        .text("This cannot be undone.")
        .buttons(["Delete", "Cancel"])
        .closable(true);
    let msgbox = MsgBox::create_with(lp.core_mut(), None, &options)?;

    lp.core_mut().tree_mut().observe(
        msgbox.root(),
        Some(EventKind::ValueChanged),
        handler(move |ctx, _| {
            if let Ok(Some(choice)) = msgbox.active_button_text(ctx.core) {
                tracing::info!("user picked {:?}", choice);
            }
            if let Err(err) = msgbox.close_async(ctx.core, ctx.tasks) {
                tracing::warn!("close failed: {}", err);
            }
            HandleStatus::consumed()
        }),
    )?;

    // Blocked by the modal overlay.
    lp.push_input(InputEvent::click(refresh));
    lp.run_once();

    if let Some(row) = msgbox.buttons(lp.core())? {
        lp.push_input(InputEvent::click_item(row, 0));
    }
    lp.run_once();
    tracing::info!("message box alive after pick: {}", msgbox.is_alive(lp.core()));

    lp.push_input(InputEvent::click(refresh));
    lp.run_once();

    tracing::info!("loop stats: {:?}", lp.stats());
    Ok(())
}
