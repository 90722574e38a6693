// Copyright 2025 FarminAi contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # FarminAi
//!
//! A farming assistant that forwards questions to a hosted text-generation
//! inference endpoint and keeps the conversation for display.
//!
//! The [`ModelClient`] does the work: it wraps the question in a fixed
//! preamble, posts it, retries timeouts after a fixed delay, and trims the
//! reply at the next turn marker. [`ChatSession`] is the state a front-end
//! owns between questions.
//!
//! ## Example
//!
//! ```rust,no_run
//! use farmin_ai::{ChatSession, ModelClient, ModelConfig, QueryOptions};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = ModelClient::new(ModelConfig::default().with_api_token("hf_xxx"))?;
//!     let mut session = ChatSession::new("HuggingFaceH4/zephyr-7b-beta", QueryOptions::default());
//!
//!     match session.ask(&client, "When should I rotate my maize field?").await {
//!         Ok(reply) => println!("{}", reply.content),
//!         Err(e) => eprintln!("{}", e.display_message()),
//!     }
//!     Ok(())
//! }
//! ```

pub mod chat;
pub mod config;
pub mod model;
pub mod settings;

pub use chat::{ChatSession, Conversation, Message, Role};
pub use model::{ConfigError, ModelClient, ModelConfig, QueryError, QueryOptions};
pub use settings::AppSettings;
