use std::time::Duration;

use teloxide::adaptors::throttle::Limits;
use teloxide::adaptors::Throttle;
use teloxide::prelude::*;
use teloxide::Bot;

use crate::config::AppConfig;
use crate::error::{BotError, BotResult, HandlerResult};
use crate::handler::get_handler;
use crate::service::dialogue::DialogueService;
use crate::state::AppState;

pub struct BotService {
    pub bot: Throttle<Bot>,
    pub state: AppState,
}

impl BotService {
    pub async fn new(config: AppConfig) -> BotResult<Self> {
        info!("Initializing AppState...");
        let client = teloxide::net::default_reqwest_settings()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| BotError::Other(e.into()))?;

        let bot = Bot::with_client(config.telegram.token.clone(), client).throttle(Limits::default());

        let state = AppState::new(config).await?;
        info!("AppState initialized");

        Ok(Self { bot, state })
    }

    pub async fn start(&self) -> HandlerResult<()> {
        info!("Testing connection to Telegram API...");
        match self.bot.get_me().await {
            Ok(_) => info!("Successfully connected to Telegram API"),
            Err(e) => {
                error!("Failed to connect to Telegram API: {:?}", e);
                return Err(anyhow::anyhow!("Failed to connect to Telegram API: {}", e).into());
            }
        }

        let bot = self.bot.clone();
        let state = self.state.clone();
        let storage = DialogueService::get_dialogue_storage(&state.config.dialogue).await?;

        crate::command::setup_user_commands(&bot).await?;

        state.service_registry.availability.refresh_if_stale().await;
        state.runtime.start().await?;

        let handler = get_handler();

        Dispatcher::builder(bot, handler)
            .dependencies(dptree::deps![storage, state.clone()])
            .error_handler(LoggingErrorHandler::with_custom_text(
                "An error has occurred in the dispatcher",
            ))
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;

        state.runtime.stop().await;

        Ok(())
    }
}
