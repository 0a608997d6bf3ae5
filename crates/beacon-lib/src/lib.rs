//! Protocol-level capabilities for the Solstice launcher: Microsoft OAuth
//! device-code authentication, Mojang profile/entitlement lookups and the
//! Minecraft Server List Ping probe.
//!
//! This crate knows nothing about the launcher's local account store; it
//! exchanges credentials for tokens and profiles and reports what the
//! network said.

pub mod api;
pub mod auth;
