pub mod app;
pub mod common;
pub mod idea;
pub mod note;
pub mod pull;
pub mod queue;
pub mod sync;
pub mod task;
pub mod watch;
