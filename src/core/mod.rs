//! Core packing logic module
//!
//! This module contains the policy that decides what goes into the image
//! archive. Archive, filesystem and process plumbing belongs in
//! [`crate::infra`].
//!
//! # Submodules
//!
//! - [`info_dict`] - Build configuration dictionary and recovery fstab
//! - [`properties`] - Per-partition image properties and inclusion policy
//! - [`staging`] - Partition source directories and scratch space
//! - [`size_check`] - Image size validation
//! - [`assembler`] - Partition image assembly
//! - [`bootable`] - Boot and recovery image pass-through
//! - [`radio`] - Radio firmware and flash script
//! - [`pack`] - Run orchestration
//! - [`global_config`] - User configuration management

pub mod assembler;
pub mod bootable;
pub mod global_config;
pub mod info_dict;
pub mod pack;
pub mod properties;
pub mod radio;
pub mod size_check;
pub mod staging;
