mod chat_flow_test;
pub mod common;
mod timeline_render_test;
