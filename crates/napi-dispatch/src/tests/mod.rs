//! Test suites for the dispatcher and message loop.

mod listener;
mod support;
