#![deny(unreachable_pub)]
#![deny(unused_extern_crates)]
#![deny(unused_allocation)]
#![deny(unused_assignments)]
#![deny(unused_comparisons)]
#![deny(warnings)]
#![allow(clippy::float_cmp)]
#![allow(clippy::new_ret_no_self)]
#![deny(clippy::clone_on_ref_ptr)]
#![deny(clippy::trivially_copy_pass_by_ref)]

//! Decode JSON log payloads (repairing nginx `\xNN` escapes and converting
//! from a configured charset) and re-emit them as compact JSON lines.
#[macro_use]
extern crate tracing;

#[macro_use]
pub mod internal_events;

pub mod app;
pub mod cli;
pub mod codecs;
pub mod config;
pub mod sinks;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_util;
pub mod trace;

pub fn json_nginx_version() -> impl std::fmt::Display {
    env!("CARGO_PKG_VERSION")
}

/// Returns a string containing full version information of the current build.
pub fn get_version() -> String {
    let pkg_version = json_nginx_version();

    let debug_info = if cfg!(debug_assertions) { " debug" } else { "" };

    format!("{pkg_version}{debug_info}")
}
