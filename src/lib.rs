//! Terminal map comparing which countries you and up to two friends have
//! visited, on a fitted flat map and on a rotatable globe.

pub mod app;
pub mod braille;
pub mod config;
pub mod data;
mod hash;
pub mod interaction;
pub mod map;
pub mod style;
pub mod ui;
pub mod visit;
