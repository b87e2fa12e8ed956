//! Application-level orchestration.
//!
//! This module owns the submit/poll lifecycle (validation, create request, poll
//! sessions, cancellation) and post-run processing such as report building and
//! exports. UI/CLI layers call into this module to keep responsibilities separated.

mod controller;
mod post_process;
mod session;
mod tracker;

pub(crate) use controller::{run_controller, ControllerEvent, UiCommand};
pub(crate) use post_process::{build_report, export_json, process_completion};
pub(crate) use tracker::Snapshot;
