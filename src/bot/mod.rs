//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules:
//! - `message_handler`: Turns incoming messages into conversation events
//! - `callback_handler`: Handles inline keyboard callback queries
//! - `dialogue_manager`: The conversion state machine
//! - `transport`: Outbound messages and downloads
//! - `ui_builder`: Creates keyboards and formats messages
//! - `commands`: The slash command menu

pub mod callback_handler;
pub mod commands;
pub mod dialogue_manager;
pub mod message_handler;
pub mod transport;
pub mod ui_builder;

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;

pub use callback_handler::callback_handler;
pub use commands::Command;
pub use dialogue_manager::{ConversionFlow, InboundEvent};
pub use message_handler::message_handler;
pub use transport::{TelegramTransport, Transport};

/// Handler tree shared by the binary and tests.
///
/// Requires an `Arc<ConversionFlow>` dependency.
pub fn schema() -> UpdateHandler<anyhow::Error> {
    dptree::entry()
        .branch(Update::filter_message().endpoint(message_handler))
        .branch(Update::filter_callback_query().endpoint(callback_handler))
}
