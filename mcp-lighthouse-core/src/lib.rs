//! Lighthouse audit MCP server core library.
//!
//! Provides `build_server()` which constructs a fully-configured MCP `Server`
//! with website audit tools, analysis prompts and `lighthouse://` reference
//! resources, ready to be served over HTTP or stdio.

pub mod analysis;
pub mod browser;
pub mod categories;
pub mod cli;
pub mod constants;
pub mod engine;
pub mod error;
pub mod gate;
pub mod launch_config;
pub mod normalize;
pub mod options;
pub mod performance;
pub mod prompts;
pub mod report;
pub mod resources;
pub mod runner;
pub mod tools;

use pmcp::types::{
    PromptCapabilities, ResourceCapabilities, ServerCapabilities, ToolCapabilities,
};
use pmcp::Server;
use runner::AuditRunner;
use std::sync::Arc;

pub use error::{AuditError, Result};

/// Build a fully-configured MCP server over the given runner.
pub fn build_server(runner: Arc<AuditRunner>) -> pmcp::Result<Server> {
    let builder = Server::builder()
        .name("lighthouse")
        .version(env!("CARGO_PKG_VERSION"))
        .capabilities(ServerCapabilities {
            tools: Some(ToolCapabilities {
                list_changed: Some(true),
            }),
            prompts: Some(PromptCapabilities {
                list_changed: Some(false),
            }),
            resources: Some(ResourceCapabilities {
                subscribe: Some(false),
                list_changed: Some(false),
            }),
            ..Default::default()
        });

    let builder = tools::register_tools(builder, runner);
    let builder = prompts::register_prompts(builder);
    let builder = builder.resources(resources::reference_resources());

    builder.build()
}
