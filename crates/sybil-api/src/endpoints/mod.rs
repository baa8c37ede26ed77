// Endpoint groups, each an inherent `impl SybilClient` block.

mod auth;
mod chat;
mod gdrive;
mod otter;
mod pipeline;
mod prompt;
mod whitelist;
