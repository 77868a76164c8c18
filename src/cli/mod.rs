//! Command handlers for the plugin-center binary.

mod generate;
mod verify;

pub(crate) use generate::cmd_generate;
pub(crate) use verify::cmd_verify;
