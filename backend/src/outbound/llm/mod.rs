//! Language model adapters for the support chatbot.

mod dto;
mod openai_client;

pub use openai_client::{DEFAULT_MODEL, DEFAULT_TIMEOUT, OpenAiChatClient, OpenAiSettings};
