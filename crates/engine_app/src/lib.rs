//! # engine_app
//!
//! The game host built on [`engine_component`]. It owns the component
//! manager instance, loads settings and textures, feeds input to an ordered
//! [`Schedule`](schedule::Schedule) of systems, and draws every
//! [`RenderComponent`](components::RenderComponent) to a
//! [`Surface`](surface::Surface) once per frame.

pub mod components;
pub mod config;
pub mod game;
pub mod input;
pub mod resources;
pub mod schedule;
pub mod surface;
