//! Two-motor differential drive layer for ROSArduinoBridge-style firmware on
//! no-std embedded platforms.
//!
//! The physical driver is chosen at build time with the `l298` or `esda-ac`
//! feature. For a host-side harness, see the `mock-mcu` binary.
#![no_std]

pub mod utils;
