// Vanity Infrastructure - System Adapters
// Implements: KeypairGenerator by driving the external search tool

pub mod keypair;
mod output;
mod tool_generator;

pub use keypair::{verify_keypair, SecretMaterial, VerifiedKeypair};
pub use output::{parse_tool_output, ToolOutput};
pub use tool_generator::{ToolGenerator, SUFFIX_PLACEHOLDER};
