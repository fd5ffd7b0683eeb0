//! Terminal front end: drives the session state machine from the command line.
mod app;
mod effects;
mod render;

pub use app::run;
