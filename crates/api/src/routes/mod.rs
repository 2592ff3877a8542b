//! Route handlers

pub mod predict;
pub mod root;
pub mod submissions;
