use teloxide::{
    adaptors::Throttle,
    macros::BotCommands,
    prelude::Requester,
    types::BotCommand,
    Bot,
};

use crate::error::HandlerResult;

#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase")]
pub enum Command {
    Start,
    Help,
}

impl Command {
    pub fn user_commands() -> Vec<BotCommand> {
        vec![
            BotCommand::new("start", t!("commands.description.start")),
            BotCommand::new("help", t!("commands.description.help")),
        ]
    }
}

pub async fn setup_user_commands(bot: &Throttle<Bot>) -> HandlerResult<()> {
    bot.delete_my_commands().await?;
    bot.set_my_commands(Command::user_commands()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use teloxide::utils::command::BotCommands;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("/start", "storefront_bot").unwrap(), Command::Start);
        assert_eq!(Command::parse("/help@storefront_bot", "storefront_bot").unwrap(), Command::Help);
        assert!(Command::parse("/language", "storefront_bot").is_err());
    }
}
