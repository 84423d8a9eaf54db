//! Event routing.
//!
//! [`Handler`] dispatches each event by kind. Every method has a default
//! that does nothing, so an implementation overrides only what it answers.
//! [`dispatch`] runs a batch: events are handled in delivery order and a
//! failing event is logged and skipped without affecting its siblings.
//!
//! # Example
//! ```rust
//! use line_webhook_rs::{
//!     event::{EventContext, TextContent},
//!     router::Handler,
//!     Error,
//! };
//!
//! struct Logger;
//!
//! impl Handler for Logger {
//!     async fn handle_text(&self, ctx: EventContext, text: TextContent) -> Result<(), Error> {
//!         println!("{:?} said {:?}", ctx.reply_token, text.text);
//!         Ok(())
//!     }
//! }
//! ```

use std::{future::Future, time::Duration};

use tracing::{debug, warn};

use crate::{
    client::{MessagingClient, DEFAULT_TIMEOUT},
    error::Error,
    event::{
        Event, EventContext, ImageContent, MessageContent, MessageEvent, Postback, PostbackEvent,
        StickerContent, TextContent,
    },
    message::OutboundMessage,
    reply,
};

/// Event handler trait.
///
/// `handle` is the entry point; its default implementation matches every
/// event and content kind and calls the specific method. Kinds without a
/// method ([`Event::Unknown`], [`MessageContent::Unsupported`]) succeed
/// without doing anything.
pub trait Handler: Send + Sync {
    #[inline]
    fn handle(&self, event: Event) -> impl Future<Output = Result<(), Error>> + Send {
        async move {
            match event {
                Event::Message(MessageEvent { context, message }) => match message {
                    MessageContent::Text(text) => self.handle_text(context, text).await,
                    MessageContent::Sticker(sticker) => self.handle_sticker(context, sticker).await,
                    MessageContent::Image(image) => self.handle_image(context, image).await,
                    MessageContent::Unsupported => Ok(()),
                },
                Event::Postback(PostbackEvent { context, postback }) => {
                    self.handle_postback(context, postback).await
                }
                Event::Unknown => Ok(()),
            }
        }
    }

    fn handle_text(
        &self,
        _ctx: EventContext,
        _text: TextContent,
    ) -> impl Future<Output = Result<(), Error>> + Send {
        async { Ok(()) }
    }

    fn handle_sticker(
        &self,
        _ctx: EventContext,
        _sticker: StickerContent,
    ) -> impl Future<Output = Result<(), Error>> + Send {
        async { Ok(()) }
    }

    fn handle_image(
        &self,
        _ctx: EventContext,
        _image: ImageContent,
    ) -> impl Future<Output = Result<(), Error>> + Send {
        async { Ok(()) }
    }

    fn handle_postback(
        &self,
        _ctx: EventContext,
        _postback: Postback,
    ) -> impl Future<Output = Result<(), Error>> + Send {
        async { Ok(()) }
    }
}

/// Outcome counts of one batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Events a handler processed successfully.
    pub handled: usize,
    /// Events of a kind no rule applies to.
    pub ignored: usize,
    /// Events whose handler returned an error.
    pub failed: usize,
    /// Entries of the delivery that could not be decoded into an event.
    pub malformed: usize,
}

/// Handles `events` in order.
///
/// A handler error is logged and counted; the remaining events still run.
pub async fn dispatch<H: Handler>(handler: &H, events: Vec<Event>) -> DispatchReport {
    let mut report = DispatchReport::default();

    for (index, event) in events.into_iter().enumerate() {
        let kind = event.kind();
        if !is_routable(&event) {
            debug!(index, kind, "ignoring event");
            report.ignored += 1;
            continue;
        }

        match handler.handle(event).await {
            Ok(()) => {
                debug!(index, kind, "event handled");
                report.handled += 1;
            }
            Err(error) => {
                warn!(index, kind, %error, "event handler failed; skipping");
                report.failed += 1;
            }
        }
    }

    report
}

fn is_routable(event: &Event) -> bool {
    match event {
        Event::Message(event) => !matches!(event.message, MessageContent::Unsupported),
        Event::Postback(_) => true,
        Event::Unknown => false,
    }
}

/// The bot: answers each event with exactly one reply call.
///
/// | Input | Reply |
/// |---|---|
/// | text `menu` / `選單` | flex menu card |
/// | other text | echo |
/// | sticker | fixed sticker |
/// | image | acknowledgment text |
/// | postback containing `action=help` | help text |
/// | other postback | echo of the data |
#[derive(Clone, Debug)]
pub struct ReplyBot<C> {
    client: C,
    reply_timeout: Duration,
}

impl<C: MessagingClient> ReplyBot<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            reply_timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Bounds each reply call. An expired call fails that event with
    /// [`Error::Timeout`].
    pub fn reply_timeout(mut self, timeout: Duration) -> Self {
        self.reply_timeout = timeout;
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Events without a reply token (standby mode) are left unanswered.
    async fn reply(&self, ctx: &EventContext, message: OutboundMessage) -> Result<(), Error> {
        let Some(reply_token) = ctx.reply_token.as_deref() else {
            debug!(mode = ?ctx.mode, "no reply token; not replying");
            return Ok(());
        };
        if ctx.is_redelivery() {
            debug!(reply_token, "replying to a redelivered event");
        }

        tokio::time::timeout(
            self.reply_timeout,
            self.client.reply_message(reply_token, vec![message]),
        )
        .await
        .map_err(|_| Error::Timeout)?
    }
}

impl<C: MessagingClient> Handler for ReplyBot<C> {
    async fn handle_text(&self, ctx: EventContext, text: TextContent) -> Result<(), Error> {
        self.reply(&ctx, reply::for_text(&text.text)).await
    }

    async fn handle_sticker(&self, ctx: EventContext, sticker: StickerContent) -> Result<(), Error> {
        self.reply(&ctx, reply::for_sticker(&sticker)).await
    }

    async fn handle_image(&self, ctx: EventContext, image: ImageContent) -> Result<(), Error> {
        self.reply(&ctx, reply::for_image(&image)).await
    }

    async fn handle_postback(&self, ctx: EventContext, postback: Postback) -> Result<(), Error> {
        self.reply(&ctx, reply::for_postback(&postback)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::parse_events;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    /// Records reply calls; fails any call whose token is in `fail`.
    #[derive(Clone, Default)]
    struct Recorder {
        calls: Arc<Mutex<Vec<(String, Vec<OutboundMessage>)>>>,
        fail: Vec<&'static str>,
    }

    impl MessagingClient for Recorder {
        fn reply_message(
            &self,
            reply_token: &str,
            messages: Vec<OutboundMessage>,
        ) -> impl Future<Output = Result<(), Error>> + Send {
            self.calls
                .lock()
                .unwrap()
                .push((reply_token.to_owned(), messages));
            let failed = self.fail.iter().any(|token| *token == reply_token);
            async move {
                if failed {
                    Err(Error::internal("reply rejected".into()))
                } else {
                    Ok(())
                }
            }
        }
    }

    struct Stalled;

    impl MessagingClient for Stalled {
        fn reply_message(
            &self,
            _reply_token: &str,
            _messages: Vec<OutboundMessage>,
        ) -> impl Future<Output = Result<(), Error>> + Send {
            std::future::pending()
        }
    }

    fn text_event(token: &str, text: &str) -> serde_json::Value {
        json!({
            "type": "message",
            "replyToken": token,
            "source": {"type": "user", "userId": "U1"},
            "message": {"type": "text", "id": "1", "text": text}
        })
    }

    fn events(events: serde_json::Value) -> Vec<Event> {
        parse_events(&serde_json::to_vec(&json!({ "events": events })).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn menu_text_yields_one_flex_reply() {
        let recorder = Recorder::default();
        let bot = ReplyBot::new(recorder.clone());

        let report = dispatch(&bot, events(json!([text_event("t1", " Menu ")]))).await;

        assert_eq!(report.handled, 1);
        let calls = recorder.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "t1");
        assert_eq!(calls[0].1.len(), 1);
        assert!(matches!(calls[0].1[0], OutboundMessage::Flex { .. }));
    }

    #[tokio::test]
    async fn each_kind_is_routed_to_its_rule() {
        let recorder = Recorder::default();
        let bot = ReplyBot::new(recorder.clone());

        let batch = events(json!([
            text_event("t1", "hello"),
            {
                "type": "message", "replyToken": "t2",
                "message": {"type": "sticker", "id": "2", "packageId": "1", "stickerId": "1"}
            },
            {
                "type": "message", "replyToken": "t3",
                "message": {"type": "image", "id": "3"}
            },
            {"type": "postback", "replyToken": "t4", "postback": {"data": "action=help"}},
            {"type": "postback", "replyToken": "t5", "postback": {"data": "action=xyz"}},
            {"type": "follow", "replyToken": "t6"},
            {
                "type": "message", "replyToken": "t7",
                "message": {"type": "audio", "id": "7"}
            }
        ]));
        let report = dispatch(&bot, batch).await;

        assert_eq!(
            report,
            DispatchReport {
                handled: 5,
                ignored: 2,
                failed: 0,
                malformed: 0,
            }
        );

        let calls = recorder.calls.lock().unwrap();
        let tokens: Vec<_> = calls.iter().map(|(token, _)| token.as_str()).collect();
        assert_eq!(tokens, ["t1", "t2", "t3", "t4", "t5"]);
        assert_eq!(calls[0].1[0].as_text(), Some("你說：hello"));
        assert_eq!(calls[1].1[0], OutboundMessage::sticker("11537", "52002734"));
        assert_eq!(calls[2].1[0].as_text(), Some(reply::IMAGE_ACK));
        assert_eq!(calls[3].1[0].as_text(), Some(reply::HELP_TEXT));
        assert!(calls[4].1[0].as_text().unwrap().contains("action=xyz"));
    }

    #[tokio::test]
    async fn failing_event_does_not_stop_siblings() {
        let recorder = Recorder {
            fail: vec!["t2"],
            ..Default::default()
        };
        let bot = ReplyBot::new(recorder.clone());

        let report = dispatch(
            &bot,
            events(json!([
                text_event("t1", "one"),
                text_event("t2", "two"),
                text_event("t3", "three")
            ])),
        )
        .await;

        assert_eq!(report.handled, 2);
        assert_eq!(report.failed, 1);
        let calls = recorder.calls.lock().unwrap();
        let tokens: Vec<_> = calls.iter().map(|(token, _)| token.as_str()).collect();
        assert_eq!(tokens, ["t1", "t2", "t3"]);
    }

    #[tokio::test]
    async fn stalled_reply_times_out() {
        let bot = ReplyBot::new(Stalled).reply_timeout(Duration::from_millis(50));

        let result = bot.handle(events(json!([text_event("t1", "hi")])).remove(0)).await;
        assert!(matches!(result, Err(Error::Timeout)));
    }

    #[tokio::test]
    async fn standby_event_is_not_answered() {
        let bot = ReplyBot::new(Recorder::default());

        let report = dispatch(
            &bot,
            events(json!([
                text_event("t1", "hello"),
                {
                    "type": "message",
                    "mode": "standby",
                    "source": {"type": "user", "userId": "U1"},
                    "message": {"type": "text", "id": "2", "text": "hello"}
                }
            ])),
        )
        .await;

        assert_eq!(report.handled, 2);
        assert_eq!(report.failed, 0);
        let calls = bot.client().calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "t1");
    }

    #[tokio::test]
    async fn handler_methods_accept_hand_built_context() {
        let bot = ReplyBot::new(Recorder::default());
        let sticker = StickerContent {
            id: "1".to_owned(),
            package_id: "446".to_owned(),
            sticker_id: "1988".to_owned(),
        };

        bot.handle_sticker(EventContext::new("t9"), sticker)
            .await
            .unwrap();

        let calls = bot.client().calls.lock().unwrap();
        assert_eq!(calls[0].0, "t9");
        assert_eq!(calls[0].1, [OutboundMessage::sticker("11537", "52002734")]);
    }

    #[tokio::test]
    async fn default_handler_methods_succeed() {
        struct Nothing;
        impl Handler for Nothing {}

        let report = dispatch(&Nothing, events(json!([text_event("t1", "hi")]))).await;
        assert_eq!(report.handled, 1);
    }
}
