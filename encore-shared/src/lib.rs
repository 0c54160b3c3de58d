#![cfg_attr(not(test), forbid(unsafe_code))]

//! Shared wire models and configuration for the Encore support platform.

pub mod config;
pub mod models;
