//! Inbound event routing.
//!
//! Each `IncomingUpdate` goes to exactly one handler. Handlers only add
//! notifications and scheduler entries; none of them waits for a scheduled
//! deletion to run.

use std::{sync::Arc, time::Duration};

use tracing::{debug, info, warn};

use crate::{
    config::Config,
    dialog::{parse_delay_seconds, ConfirmOutcome, DialogStore, SecondsOutcome},
    domain::{ChatId, MessageRef},
    matcher::{LinkMatcher, RegexLinkMatcher},
    messaging::{
        port::MessagingPort,
        types::{
            CallbackQuery, Command, IncomingUpdate, InlineKeyboard, MembersJoined, TextMessage,
        },
    },
    policy::PolicyStore,
    replies,
    scheduler::{DeferredDeletion, DeferredScheduler},
    Result,
};

const SET_TIMER_PAYLOAD: &str = "set_timer";
const CONFIRM_PAYLOAD_PREFIX: &str = "confirm_delete_";

/// Button payloads understood by the dispatcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallbackAction {
    SetTimer,
    ConfirmDelete(u64),
    /// A confirm payload whose value does not parse.
    Malformed,
    Unknown,
}

impl CallbackAction {
    pub fn parse(data: &str) -> Self {
        if data == SET_TIMER_PAYLOAD {
            return Self::SetTimer;
        }
        let Some(value) = data.strip_prefix(CONFIRM_PAYLOAD_PREFIX) else {
            return Self::Unknown;
        };
        match value.parse::<u64>() {
            Ok(seconds) if seconds > 0 => Self::ConfirmDelete(seconds),
            _ => Self::Malformed,
        }
    }

    pub fn payload(&self) -> String {
        match self {
            Self::SetTimer => SET_TIMER_PAYLOAD.to_string(),
            Self::ConfirmDelete(seconds) => format!("{CONFIRM_PAYLOAD_PREFIX}{seconds}"),
            Self::Malformed | Self::Unknown => String::new(),
        }
    }
}

/// Split `/cmd@botname arg1 ...` into (`cmd`, `arg1 ...`); `cmd` is lowercased.
pub fn parse_command(text: &str) -> (String, String) {
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    (cmd, rest)
}

/// What happened to a message containing a target link.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LinkOutcome {
    Scheduled(Vec<DeferredDeletion>),
    MissingPermission,
    NotConfigured,
}

pub struct Dispatcher {
    cfg: Arc<Config>,
    messenger: Arc<dyn MessagingPort>,
    scheduler: DeferredScheduler,
    matcher: Arc<dyn LinkMatcher>,
    policies: Arc<PolicyStore>,
    dialogs: Arc<DialogStore>,
    bot_username: Option<String>,
}

impl Dispatcher {
    /// The stores are shared with the caller, which owns their lifetime.
    pub fn new(
        cfg: Arc<Config>,
        messenger: Arc<dyn MessagingPort>,
        scheduler: DeferredScheduler,
        policies: Arc<PolicyStore>,
        dialogs: Arc<DialogStore>,
    ) -> Self {
        let bot_username = cfg.bot_username.clone();
        Self {
            cfg,
            messenger,
            scheduler,
            matcher: Arc::new(RegexLinkMatcher::tiktok()),
            policies,
            dialogs,
            bot_username,
        }
    }

    /// Replace the default TikTok matcher.
    pub fn with_matcher(mut self, matcher: Arc<dyn LinkMatcher>) -> Self {
        self.matcher = matcher;
        self
    }

    /// Username used in group help; the configured value wins.
    pub fn with_bot_username(mut self, username: Option<String>) -> Self {
        if self.bot_username.is_none() {
            self.bot_username = username;
        }
        self
    }

    pub fn policies(&self) -> &Arc<PolicyStore> {
        &self.policies
    }

    pub fn dialogs(&self) -> &Arc<DialogStore> {
        &self.dialogs
    }

    pub fn scheduler(&self) -> &DeferredScheduler {
        &self.scheduler
    }

    /// Advertise the command menu.
    pub async fn register_commands(&self) -> Result<()> {
        self.messenger.register_commands(replies::COMMANDS).await
    }

    pub async fn handle(&self, update: IncomingUpdate) -> Result<()> {
        match update {
            IncomingUpdate::Command(cmd) => self.on_command(cmd).await,
            IncomingUpdate::Callback(q) => self.on_callback(q).await,
            IncomingUpdate::Text(msg) => self.on_text(msg).await,
            IncomingUpdate::MembersJoined(ev) => self.on_members_joined(ev).await,
        }
    }

    // ============== Commands ==============

    async fn on_command(&self, cmd: Command) -> Result<()> {
        let private = cmd.chat_kind.is_private();
        match cmd.name.as_str() {
            "start" if private => {
                self.messenger
                    .send_inline_keyboard(
                        cmd.chat_id,
                        replies::WELCOME_PRIVATE,
                        InlineKeyboard::single(
                            replies::SET_TIMER_BUTTON,
                            CallbackAction::SetTimer.payload(),
                        ),
                        Some(cmd.message),
                    )
                    .await?;
            }
            "start" => {
                self.reply(cmd.message, replies::WELCOME_GROUP).await?;
            }
            "help" if private => {
                self.reply(cmd.message, replies::HELP_PRIVATE).await?;
            }
            "help" => {
                let text = replies::help_group(self.bot_username.as_deref());
                self.reply(cmd.message, &text).await?;
            }
            "set_timer" => self.on_set_timer(&cmd).await?,
            "disable" => {
                let text = if self.policies.clear(cmd.chat_id) {
                    info!(chat_id = cmd.chat_id.0, "auto-deletion disabled");
                    replies::DISABLED
                } else {
                    replies::NOT_ENABLED
                };
                self.reply(cmd.message, text).await?;
            }
            "cancel" => {
                let text = if self.dialogs.cancel(cmd.user_id, cmd.chat_id) {
                    replies::DIALOG_CANCELLED
                } else {
                    replies::NOTHING_TO_CANCEL
                };
                self.reply(cmd.message, text).await?;
            }
            other => debug!(command = other, "ignoring unknown command"),
        }
        Ok(())
    }

    async fn on_set_timer(&self, cmd: &Command) -> Result<()> {
        let Some(arg) = cmd.args.split_whitespace().next() else {
            self.reply(cmd.message, replies::SET_TIMER_USAGE).await?;
            return Ok(());
        };

        match parse_delay_seconds(arg, self.cfg.max_delete_delay) {
            Ok(seconds) => {
                self.policies.set(cmd.chat_id, seconds)?;
                info!(chat_id = cmd.chat_id.0, seconds, "auto-deletion enabled");
                self.reply(cmd.message, &replies::timer_enabled(seconds))
                    .await?;
            }
            Err(e) => {
                self.reply(cmd.message, &replies::invalid_delay(e)).await?;
            }
        }
        Ok(())
    }

    // ============== Buttons ==============

    async fn on_callback(&self, q: CallbackQuery) -> Result<()> {
        // Always answer first so the client stops its spinner.
        self.messenger
            .answer_callback_query(&q.callback_id, None)
            .await?;

        match CallbackAction::parse(&q.data) {
            CallbackAction::SetTimer => {
                self.dialogs.begin(q.user_id, q.chat_id);
                self.edit_or_send(q.chat_id, q.message, replies::DIALOG_PROMPT)
                    .await?;
            }
            CallbackAction::ConfirmDelete(seconds) => {
                let text = match self.dialogs.confirm(q.user_id, q.chat_id, seconds) {
                    ConfirmOutcome::Confirmed(seconds) => {
                        self.policies.set(q.chat_id, seconds)?;
                        info!(chat_id = q.chat_id.0, seconds, "auto-deletion enabled via dialog");
                        replies::timer_enabled(seconds)
                    }
                    ConfirmOutcome::Expired => replies::CONFIRMATION_EXPIRED.to_string(),
                };
                self.edit_or_send(q.chat_id, q.message, &text).await?;
            }
            CallbackAction::Malformed => {
                self.edit_or_send(q.chat_id, q.message, replies::INVALID_SELECTION)
                    .await?;
            }
            CallbackAction::Unknown => debug!(data = %q.data, "ignoring unknown callback payload"),
        }
        Ok(())
    }

    // ============== Plain text ==============

    async fn on_text(&self, msg: TextMessage) -> Result<()> {
        if msg.chat_kind.is_private() && self.dialogs.is_awaiting_seconds(msg.user_id, msg.chat_id)
        {
            return self.on_dialog_input(&msg).await;
        }

        if !self.matcher.is_match(&msg.text) {
            return Ok(());
        }

        let outcome = self.on_link(&msg).await?;
        debug!(message = %msg.message, ?outcome, "link handled");
        Ok(())
    }

    async fn on_dialog_input(&self, msg: &TextMessage) -> Result<()> {
        match self.dialogs.submit_seconds(
            msg.user_id,
            msg.chat_id,
            &msg.text,
            self.cfg.max_delete_delay,
        ) {
            SecondsOutcome::Proposed(seconds) => {
                self.messenger
                    .send_inline_keyboard(
                        msg.chat_id,
                        &replies::confirm_question(seconds),
                        InlineKeyboard::single(
                            replies::confirm_button(seconds),
                            CallbackAction::ConfirmDelete(seconds).payload(),
                        ),
                        Some(msg.message),
                    )
                    .await?;
            }
            SecondsOutcome::Rejected(e) => {
                self.reply(msg.message, &replies::dialog_retry_hint(e))
                    .await?;
            }
            SecondsOutcome::NotAwaiting => {}
        }
        Ok(())
    }

    async fn on_link(&self, msg: &TextMessage) -> Result<LinkOutcome> {
        let private = msg.chat_kind.is_private();

        let Some(policy) = self.policies.get(msg.chat_id) else {
            if !private {
                self.reply(msg.message, replies::AUTO_DELETE_OFF).await?;
            }
            return Ok(LinkOutcome::NotConfigured);
        };

        let permissions = self.messenger.self_permissions(msg.chat_id).await?;
        if !permissions.can_delete_messages {
            warn!(chat_id = msg.chat_id.0, "link found but bot cannot delete messages");
            if !private {
                self.reply(msg.message, replies::MISSING_DELETE_PERMISSION)
                    .await?;
            }
            return Ok(LinkOutcome::MissingPermission);
        }

        let notice = if !private && self.cfg.post_deletion_notices {
            Some(
                self.reply(msg.message, &replies::will_delete(policy.delay_seconds))
                    .await?,
            )
        } else {
            None
        };

        let delay = policy.delay();
        let mut scheduled = vec![self.schedule_deletion(msg.message, delay)?];
        if let Some(notice) = notice {
            scheduled.push(self.schedule_deletion(notice, delay)?);
        }

        info!(
            chat_id = msg.chat_id.0,
            message_id = msg.message.message_id.0,
            seconds = policy.delay_seconds,
            deletions = scheduled.len(),
            "scheduled link deletion"
        );
        Ok(LinkOutcome::Scheduled(scheduled))
    }

    // ============== Membership ==============

    async fn on_members_joined(&self, ev: MembersJoined) -> Result<()> {
        if !ev.bot_added {
            debug!(
                chat_id = ev.chat_id.0,
                count = ev.new_members.len(),
                "members joined"
            );
            return Ok(());
        }
        if ev.chat_kind.is_private() {
            return Ok(());
        }
        info!(chat_id = ev.chat_id.0, "added to group");
        self.reply(ev.message, replies::ADDED_TO_GROUP).await?;
        Ok(())
    }

    // ============== Helpers ==============

    fn schedule_deletion(&self, target: MessageRef, delay: Duration) -> Result<DeferredDeletion> {
        self.scheduler
            .schedule_deletion(self.messenger.clone(), target, delay)
    }

    async fn reply(&self, to: MessageRef, text: &str) -> Result<MessageRef> {
        self.messenger.reply_text(to, text).await
    }

    async fn edit_or_send(
        &self,
        chat_id: ChatId,
        message: Option<MessageRef>,
        text: &str,
    ) -> Result<()> {
        match message {
            Some(msg) => self.messenger.edit_text(msg, text).await,
            None => self.messenger.send_text(chat_id, text).await.map(|_| ()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{ChatKind, MessageId, UserId},
        messaging::types::InlineButton,
        test_support::{FakeMessenger, Sent},
    };
    use tokio::time::sleep;

    const GROUP: ChatId = ChatId(-100_42);
    const ADMIN: UserId = UserId(7);
    const DM: ChatId = ChatId(7);

    struct Harness {
        messenger: Arc<FakeMessenger>,
        dispatcher: Dispatcher,
    }

    fn harness() -> Harness {
        harness_with(Config::with_token("x"))
    }

    fn harness_with(cfg: Config) -> Harness {
        let messenger = Arc::new(FakeMessenger::default());
        let dispatcher = Dispatcher::new(
            Arc::new(cfg),
            messenger.clone(),
            DeferredScheduler::spawn(),
            Arc::new(PolicyStore::new()),
            Arc::new(DialogStore::new()),
        );
        Harness {
            messenger,
            dispatcher,
        }
    }

    fn msg_ref(chat_id: ChatId, id: i32) -> MessageRef {
        MessageRef {
            chat_id,
            message_id: MessageId(id),
        }
    }

    fn text(chat_id: ChatId, id: i32, body: &str) -> IncomingUpdate {
        let chat_kind = if chat_id.0 > 0 {
            ChatKind::Private
        } else {
            ChatKind::Group
        };
        IncomingUpdate::Text(TextMessage {
            chat_id,
            chat_kind,
            user_id: ADMIN,
            message: msg_ref(chat_id, id),
            text: body.to_string(),
        })
    }

    fn command(chat_id: ChatId, raw: &str) -> IncomingUpdate {
        let (name, args) = parse_command(raw);
        let chat_kind = if chat_id.0 > 0 {
            ChatKind::Private
        } else {
            ChatKind::Group
        };
        IncomingUpdate::Command(Command {
            chat_id,
            chat_kind,
            user_id: ADMIN,
            message: msg_ref(chat_id, 1),
            name,
            args,
        })
    }

    fn press(chat_id: ChatId, data: &str) -> IncomingUpdate {
        IncomingUpdate::Callback(CallbackQuery {
            chat_id,
            chat_kind: ChatKind::Private,
            user_id: ADMIN,
            callback_id: "cb".to_string(),
            data: data.to_string(),
            message: Some(msg_ref(chat_id, 500)),
        })
    }

    #[test]
    fn parses_commands_with_bot_suffix() {
        assert_eq!(
            parse_command("/Set_Timer@tiktok_links_remover_bot  60 extra"),
            ("set_timer".to_string(), "60 extra".to_string())
        );
        assert_eq!(parse_command("/disable"), ("disable".to_string(), String::new()));
    }

    #[test]
    fn callback_payloads() {
        assert_eq!(CallbackAction::parse("set_timer"), CallbackAction::SetTimer);
        assert_eq!(
            CallbackAction::parse("confirm_delete_30"),
            CallbackAction::ConfirmDelete(30)
        );
        assert_eq!(CallbackAction::parse("confirm_delete_x"), CallbackAction::Malformed);
        assert_eq!(CallbackAction::parse("confirm_delete_0"), CallbackAction::Malformed);
        assert_eq!(CallbackAction::parse("askuser:1:2"), CallbackAction::Unknown);
        assert_eq!(CallbackAction::ConfirmDelete(30).payload(), "confirm_delete_30");
    }

    #[tokio::test(start_paused = true)]
    async fn configured_chat_with_permission_deletes_link_and_notice() {
        let h = harness();
        h.dispatcher.policies().set(GROUP, 5).unwrap();

        h.dispatcher
            .handle(text(GROUP, 10, "lol https://vm.tiktok.com/ZMabc123/"))
            .await
            .unwrap();

        let sent = h.messenger.sent();
        assert_eq!(sent.len(), 1);
        let Sent::Reply { to, text } = &sent[0] else {
            panic!("expected a threaded notice, got {sent:?}");
        };
        assert_eq!(*to, msg_ref(GROUP, 10));
        assert!(text.contains("deleted in 5 seconds"));
        assert_eq!(h.dispatcher.scheduler().pending(), 2);

        sleep(Duration::from_millis(4_900)).await;
        assert!(h.messenger.deleted().is_empty());

        sleep(Duration::from_millis(200)).await;
        let deleted = h.messenger.deleted();
        assert_eq!(deleted.len(), 2);
        assert!(deleted.contains(&msg_ref(GROUP, 10)));
        assert!(deleted.contains(&msg_ref(GROUP, 1000)));

        sleep(Duration::from_secs(60)).await;
        assert_eq!(h.messenger.delete_attempts(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn notices_can_be_turned_off() {
        let mut cfg = Config::with_token("x");
        cfg.post_deletion_notices = false;
        let h = harness_with(cfg);
        h.dispatcher.policies().set(GROUP, 5).unwrap();

        h.dispatcher
            .handle(text(GROUP, 10, "https://www.tiktok.com/@a/video/1"))
            .await
            .unwrap();

        assert!(h.messenger.sent().is_empty());
        sleep(Duration::from_secs(6)).await;
        assert_eq!(h.messenger.deleted(), vec![msg_ref(GROUP, 10)]);
    }

    #[tokio::test(start_paused = true)]
    async fn unconfigured_group_gets_advisory_only() {
        let h = harness();

        h.dispatcher
            .handle(text(GROUP, 10, "https://vt.tiktok.com/abc"))
            .await
            .unwrap();

        let texts = h.messenger.sent_texts();
        assert_eq!(texts.len(), 1);
        assert!(texts[0].contains("Auto-deletion is not enabled"));
        assert_eq!(h.dispatcher.scheduler().pending(), 0);

        sleep(Duration::from_secs(600)).await;
        assert_eq!(h.messenger.delete_attempts(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn unconfigured_private_chat_is_silent() {
        let h = harness();
        h.dispatcher
            .handle(text(DM, 10, "https://vt.tiktok.com/abc"))
            .await
            .unwrap();
        assert!(h.messenger.sent().is_empty());
        assert_eq!(h.dispatcher.scheduler().pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_permission_warns_and_schedules_nothing() {
        let h = harness();
        h.messenger.deny_delete_permission();
        h.dispatcher.policies().set(GROUP, 5).unwrap();

        h.dispatcher
            .handle(text(GROUP, 10, "https://vm.tiktok.com/ZMabc123/"))
            .await
            .unwrap();

        let texts = h.messenger.sent_texts();
        assert_eq!(texts, vec![replies::MISSING_DELETE_PERMISSION.to_string()]);
        assert_eq!(h.dispatcher.scheduler().pending(), 0);
        sleep(Duration::from_secs(10)).await;
        assert_eq!(h.messenger.delete_attempts(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn permission_check_failure_surfaces_as_error() {
        let h = harness();
        h.messenger.fail_permission_check();
        h.dispatcher.policies().set(GROUP, 5).unwrap();

        let res = h
            .dispatcher
            .handle(text(GROUP, 10, "https://vm.tiktok.com/ZMabc123/"))
            .await;
        assert!(res.is_err());
        assert_eq!(h.dispatcher.scheduler().pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn injected_stores_and_matcher_are_used() {
        let messenger = Arc::new(FakeMessenger::default());
        let policies = Arc::new(PolicyStore::new());
        policies.set(GROUP, 5).unwrap();
        let matcher = RegexLinkMatcher::new(r"https?://(?:www\.)?youtube\.com/\S+").unwrap();
        let dispatcher = Dispatcher::new(
            Arc::new(Config::with_token("x")),
            messenger.clone(),
            DeferredScheduler::spawn(),
            policies.clone(),
            Arc::new(DialogStore::new()),
        )
        .with_matcher(Arc::new(matcher));

        dispatcher
            .handle(text(GROUP, 10, "https://vm.tiktok.com/ZMabc123/"))
            .await
            .unwrap();
        assert_eq!(dispatcher.scheduler().pending(), 0);

        dispatcher
            .handle(text(GROUP, 11, "watch https://youtube.com/watch?v=1"))
            .await
            .unwrap();
        assert_eq!(dispatcher.scheduler().pending(), 2);

        sleep(Duration::from_secs(6)).await;
        assert!(messenger.deleted().contains(&msg_ref(GROUP, 11)));

        dispatcher.handle(command(GROUP, "/disable")).await.unwrap();
        assert!(policies.get(GROUP).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn unrepresentable_delay_fails_instead_of_panicking() {
        let mut cfg = Config::with_token("x");
        cfg.max_delete_delay = Duration::from_secs(u64::MAX);
        let h = harness_with(cfg);

        h.dispatcher
            .handle(command(GROUP, "/set_timer 9223372036854775807"))
            .await
            .unwrap();
        assert_eq!(
            h.dispatcher.policies().get(GROUP).unwrap().delay_seconds,
            9_223_372_036_854_775_807
        );

        let err = h
            .dispatcher
            .handle(text(GROUP, 10, "https://vm.tiktok.com/abc"))
            .await
            .unwrap_err();
        assert!(matches!(err, crate::errors::Error::Validation(_)));
        assert_eq!(h.dispatcher.scheduler().pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn non_matching_text_is_ignored() {
        let h = harness();
        h.dispatcher.policies().set(GROUP, 5).unwrap();
        h.dispatcher
            .handle(text(GROUP, 10, "visit https://youtube.com/x"))
            .await
            .unwrap();
        assert!(h.messenger.sent().is_empty());
        assert_eq!(h.dispatcher.scheduler().pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn set_timer_and_disable_commands() {
        let h = harness();

        h.dispatcher.handle(command(GROUP, "/set_timer")).await.unwrap();
        h.dispatcher
            .handle(command(GROUP, "/set_timer abc"))
            .await
            .unwrap();
        h.dispatcher
            .handle(command(GROUP, "/set_timer -5"))
            .await
            .unwrap();
        assert!(h.dispatcher.policies().get(GROUP).is_none());

        h.dispatcher
            .handle(command(GROUP, "/set_timer@bot 60"))
            .await
            .unwrap();
        assert_eq!(h.dispatcher.policies().get(GROUP).unwrap().delay_seconds, 60);

        h.dispatcher.handle(command(GROUP, "/disable")).await.unwrap();
        h.dispatcher.handle(command(GROUP, "/disable")).await.unwrap();
        assert!(h.dispatcher.policies().get(GROUP).is_none());

        let texts = h.messenger.sent_texts();
        assert_eq!(
            texts,
            vec![
                replies::SET_TIMER_USAGE.to_string(),
                "Please enter a valid number of seconds.".to_string(),
                "Please enter a positive number of seconds.".to_string(),
                replies::timer_enabled(60),
                replies::DISABLED.to_string(),
                replies::NOT_ENABLED.to_string(),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn set_timer_rejects_values_beyond_delete_window() {
        let h = harness();
        h.dispatcher
            .handle(command(GROUP, "/set_timer 172801"))
            .await
            .unwrap();
        assert!(h.dispatcher.policies().get(GROUP).is_none());
        assert_eq!(
            h.messenger.sent_texts(),
            vec!["Please enter at most 172800 seconds.".to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn dialog_commits_confirmed_value() {
        let h = harness();

        h.dispatcher.handle(command(DM, "/start")).await.unwrap();
        let sent = h.messenger.sent();
        let Sent::Keyboard { keyboard, .. } = &sent[0] else {
            panic!("expected start keyboard");
        };
        assert_eq!(keyboard.buttons[0].callback_data, "set_timer");

        h.dispatcher.handle(press(DM, "set_timer")).await.unwrap();
        assert_eq!(
            h.messenger.edits(),
            vec![(msg_ref(DM, 500), replies::DIALOG_PROMPT.to_string())]
        );

        h.dispatcher.handle(text(DM, 11, "30")).await.unwrap();
        let sent = h.messenger.sent();
        let Sent::Keyboard { text, keyboard, .. } = sent.last().unwrap() else {
            panic!("expected confirmation keyboard");
        };
        assert!(text.contains("30 seconds"));
        assert_eq!(
            keyboard.buttons,
            vec![InlineButton {
                label: "Confirm: 30 seconds".to_string(),
                callback_data: "confirm_delete_30".to_string(),
            }]
        );
        assert!(h.dispatcher.policies().get(DM).is_none());

        h.dispatcher
            .handle(press(DM, "confirm_delete_30"))
            .await
            .unwrap();
        assert_eq!(h.dispatcher.policies().get(DM).unwrap().delay_seconds, 30);
        assert_eq!(
            h.dispatcher.dialogs().state(ADMIN, DM),
            crate::dialog::DialogState::Idle
        );
        assert_eq!(
            h.messenger.edits().last().unwrap().1,
            replies::timer_enabled(30)
        );
        assert_eq!(h.messenger.answered().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn dialog_rejects_negative_and_keeps_waiting() {
        let h = harness();
        h.dispatcher.handle(press(DM, "set_timer")).await.unwrap();

        h.dispatcher.handle(text(DM, 11, "-5")).await.unwrap();
        let texts = h.messenger.sent_texts();
        assert_eq!(texts.len(), 1);
        assert!(texts[0].starts_with("Please enter a positive number of seconds."));
        assert!(h.dispatcher.policies().get(DM).is_none());
        assert!(h.dispatcher.dialogs().is_awaiting_seconds(ADMIN, DM));

        // A link sent mid-dialog is treated as (invalid) input, not detected.
        h.dispatcher
            .handle(text(DM, 12, "https://vm.tiktok.com/abc"))
            .await
            .unwrap();
        assert!(h.messenger.sent_texts()[1].starts_with("Please enter a valid number"));

        h.dispatcher.handle(command(DM, "/cancel")).await.unwrap();
        assert!(!h.dispatcher.dialogs().is_awaiting_seconds(ADMIN, DM));
    }

    #[tokio::test(start_paused = true)]
    async fn stale_or_malformed_confirmation_commits_nothing() {
        let h = harness();

        h.dispatcher
            .handle(press(DM, "confirm_delete_30"))
            .await
            .unwrap();
        h.dispatcher
            .handle(press(DM, "confirm_delete_abc"))
            .await
            .unwrap();

        assert!(h.dispatcher.policies().is_empty());
        let edits: Vec<String> = h.messenger.edits().into_iter().map(|(_, t)| t).collect();
        assert_eq!(
            edits,
            vec![
                replies::CONFIRMATION_EXPIRED.to_string(),
                replies::INVALID_SELECTION.to_string(),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn disabling_does_not_retract_scheduled_deletions() {
        let h = harness();
        h.dispatcher.policies().set(GROUP, 5).unwrap();
        h.dispatcher
            .handle(text(GROUP, 10, "https://vm.tiktok.com/abc"))
            .await
            .unwrap();
        h.dispatcher.handle(command(GROUP, "/disable")).await.unwrap();

        sleep(Duration::from_secs(6)).await;
        assert!(h.messenger.deleted().contains(&msg_ref(GROUP, 10)));
    }

    #[tokio::test(start_paused = true)]
    async fn greets_only_when_bot_is_added() {
        let h = harness();
        let joined = |bot_added| {
            IncomingUpdate::MembersJoined(MembersJoined {
                chat_id: GROUP,
                chat_kind: ChatKind::Group,
                message: msg_ref(GROUP, 3),
                new_members: vec![UserId(99)],
                bot_added,
            })
        };

        h.dispatcher.handle(joined(false)).await.unwrap();
        assert!(h.messenger.sent().is_empty());

        h.dispatcher.handle(joined(true)).await.unwrap();
        assert_eq!(
            h.messenger.sent_texts(),
            vec![replies::ADDED_TO_GROUP.to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn group_help_mentions_username_when_known() {
        let h = harness();
        let dispatcher = h
            .dispatcher
            .with_bot_username(Some("tiktok_links_remover_bot".to_string()));
        dispatcher.handle(command(GROUP, "/help")).await.unwrap();
        assert!(h.messenger.sent_texts()[0].contains("@tiktok_links_remover_bot"));
    }

    #[tokio::test(start_paused = true)]
    async fn registers_command_menu() {
        let h = harness();
        h.dispatcher.register_commands().await.unwrap();
        let names: Vec<_> = h.messenger.commands().iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["start", "set_timer", "disable", "cancel", "help"]);
    }
}
