//! Registers the Executor-reply handlers into the Workflow Dispatcher.
//! Normalized Bridge events (`user_input_normal`, `user_input_pending`,
//! `reset`) never reach this table — they don't carry a Reply envelope to
//! key on. `user_input_normal`/`reset` are matched in the controller
//! binary's `user_message` event listener instead; `user_input_pending`
//! is handled directly by the Controller Loop, which already holds the
//! pending-queue context those handlers need.

pub mod handlers;
pub mod state;

use std::sync::Arc;

use crate::context::AppContext;
use crate::dispatcher::Dispatcher;

pub fn build_dispatcher() -> Dispatcher {
    let mut dispatcher = Dispatcher::new();

    dispatcher.register(
        "git",
        "clone_repo",
        Arc::new(|ctx, reply| Box::pin(handlers::handle_clone_repo(ctx, reply))),
    );
    dispatcher.register(
        "git",
        "read_py_files",
        Arc::new(|ctx, reply| Box::pin(handlers::handle_read_py_files(ctx, reply))),
    );
    dispatcher.register(
        "git",
        "create_venv",
        Arc::new(|ctx, reply| Box::pin(handlers::handle_create_venv(ctx, reply))),
    );
    dispatcher.register(
        "git",
        "edit",
        Arc::new(|ctx, reply| Box::pin(handlers::handle_edit(ctx, reply))),
    );
    dispatcher.register(
        "git",
        "run_in_venv",
        Arc::new(|ctx, reply| Box::pin(handlers::handle_run_in_venv(ctx, reply))),
    );

    dispatcher
}

#[allow(dead_code)]
fn assert_context_send_sync() {
    fn is_send_sync<T: Send + Sync>() {}
    is_send_sync::<Arc<AppContext>>();
}
