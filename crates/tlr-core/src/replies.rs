//! User-facing reply texts (plain text, no markup).

use crate::{dialog::DelayInputError, messaging::types::CommandSpec};

pub const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "start",
        description: "Start the bot",
    },
    CommandSpec {
        name: "set_timer",
        description: "Set auto-delete timer for TikTok links",
    },
    CommandSpec {
        name: "disable",
        description: "Disable auto-deletion",
    },
    CommandSpec {
        name: "cancel",
        description: "Cancel the timer setup dialog",
    },
    CommandSpec {
        name: "help",
        description: "Show available commands",
    },
];

pub const SET_TIMER_BUTTON: &str = "Set Auto-Delete Timer";

pub const WELCOME_PRIVATE: &str = "Welcome to TikTok Link Handler Bot!\n\n\
I can help you manage TikTok links in your chat:\n\
- Automatically delete TikTok links after a custom time period\n\n\
Add me to a group and make me an admin with 'Delete Messages' permission to get started.";

pub const WELCOME_GROUP: &str = "TikTok Link Handler Bot is now active in this group!\n\n\
Available commands:\n\
/set_timer [seconds] - Set time to auto-delete TikTok links\n\
/disable - Turn off auto-deletion\n\
/help - Show all commands\n\n\
Make sure I have 'Delete Messages' permission as an admin.";

pub const HELP_PRIVATE: &str = "TikTok Link Handler Bot Commands:\n\n\
/start - Start the bot and show main menu\n\
/set_timer [seconds] - Set auto-delete timer (e.g., /set_timer 60)\n\
/disable - Disable auto-deletion of TikTok links\n\
/cancel - Cancel the timer setup dialog\n\
/help - Show this help message\n\n\
To use me in a group, add me to the group and make me an admin with 'Delete Messages' permission.";

pub fn help_group(bot_username: Option<&str>) -> String {
    let mut out = String::from(
        "TikTok Link Handler Bot Commands for Groups:\n\n\
/set_timer [seconds] - Set auto-delete timer (e.g., /set_timer 60)\n\
/disable - Disable auto-deletion of TikTok links\n\
/help - Show this help message\n\n\
Important: Make sure I have 'Delete Messages' permission as an admin.",
    );
    if let Some(name) = bot_username {
        out.push_str(&format!(
            "\nTo configure advanced settings, chat with me privately: @{name}"
        ));
    }
    out
}

pub const ADDED_TO_GROUP: &str = "Thanks for adding me to this group!\n\n\
I can automatically delete TikTok links after a specific time period.\n\n\
To get started:\n\
1. Make me an admin with 'Delete Messages' permission\n\
2. Set auto-delete timer with: /set_timer [seconds]\n\n\
For help, type /help";

pub const SET_TIMER_USAGE: &str =
    "Please specify the number of seconds to wait before deleting TikTok links.\n\
Example: /set_timer 60";

pub const DIALOG_PROMPT: &str =
    "Please send the number of seconds to wait before deleting TikTok links.\n\
For example, send '60' to delete links after 1 minute.";

pub fn invalid_delay(err: DelayInputError) -> String {
    match err {
        DelayInputError::NotANumber => "Please enter a valid number of seconds.".to_string(),
        DelayInputError::NotPositive => "Please enter a positive number of seconds.".to_string(),
        DelayInputError::TooLarge { max_seconds } => {
            format!("Please enter at most {max_seconds} seconds.")
        }
    }
}

pub fn dialog_retry_hint(err: DelayInputError) -> String {
    format!(
        "{}\nSend another number, or /cancel to stop.",
        invalid_delay(err)
    )
}

pub fn confirm_question(seconds: u64) -> String {
    format!("Are you sure you want to set auto-delete timer to {seconds} seconds?")
}

pub fn confirm_button(seconds: u64) -> String {
    format!("Confirm: {seconds} seconds")
}

pub fn timer_enabled(seconds: u64) -> String {
    format!("TikTok links will now be automatically deleted after {seconds} seconds in this chat.")
}

pub const INVALID_SELECTION: &str = "Invalid selection. Please try again.";

pub const CONFIRMATION_EXPIRED: &str =
    "This confirmation is no longer valid. Use /start to set up the timer again.";

pub const DISABLED: &str = "Auto-deletion of TikTok links has been disabled for this chat.";

pub const NOT_ENABLED: &str = "Auto-deletion was not enabled for this chat.";

pub const DIALOG_CANCELLED: &str = "Timer setup cancelled.";

pub const NOTHING_TO_CANCEL: &str = "There is no timer setup in progress.";

pub fn will_delete(seconds: u64) -> String {
    format!("TikTok link detected. It will be deleted in {seconds} seconds.")
}

pub const MISSING_DELETE_PERMISSION: &str =
    "TikTok link detected, but I don't have permission to delete messages. \
Please make me an admin with 'Delete Messages' permission.";

pub const AUTO_DELETE_OFF: &str = "TikTok link detected. Auto-deletion is not enabled for this chat.\n\
An admin can enable it with the command:\n\
/set_timer [seconds]";
