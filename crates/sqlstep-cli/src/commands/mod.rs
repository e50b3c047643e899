//! CLI command implementations

pub(crate) mod apply;
pub(crate) mod common;
pub(crate) mod ls;
pub(crate) mod new;
pub(crate) mod status;
