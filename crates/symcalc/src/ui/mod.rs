//! Page-facing side of the calculator
//!
//! The controller drives a [`page::PageSurface`]; everything it shows goes
//! through the presenter and the typesetting and charting collaborators.

pub mod collab;
pub mod controller;
pub mod dom;
pub mod locale;
pub mod page;
pub mod presenter;
pub mod scheduler;
