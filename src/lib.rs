//! The `jtl` command line tool.
//!
//! Runs a WebAssembly guest against the graphics and console translation
//! layers: the bindings are exported into a linker, the module is
//! instantiated, both layers are activated with the guest's memory, and then
//! `enter` is called once and `step` once per frame.

pub mod commands;
pub mod common;
pub mod config;
