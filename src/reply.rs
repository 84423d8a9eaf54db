//! Reply rules.
//!
//! Pure functions mapping inbound content to the message this bot answers
//! with. Nothing here touches the network; see [`crate::router::ReplyBot`]
//! for the part that sends.

use crate::event::{ImageContent, Postback, StickerContent};
use crate::message::{
    Action, Bubble, ButtonStyle, FlexBox, FlexButton, FlexImage, FlexText, OutboundMessage,
};

/// Commands that open the menu card, compared after trimming and lowercasing.
pub const MENU_COMMANDS: [&str; 2] = ["menu", "選單"];

/// Postback data carried by the menu's help button.
pub const HELP_POSTBACK: &str = "action=help";

/// Sticker sent back for any sticker.
pub const STICKER_REPLY: (&str, &str) = ("11537", "52002734");

pub const ECHO_PREFIX: &str = "你說：";
pub const POSTBACK_PREFIX: &str = "Postback 收到：";
pub const IMAGE_ACK: &str = "收到圖片啦 📷";
pub const HELP_TEXT: &str = "這是說明：輸入 menu 來看 Flex，或隨便講話我會回聲～";

const MENU_TITLE: &str = "範例選單";
const MENU_SUBTITLE: &str = "點按下方按鈕試試";
const MENU_HERO_URL: &str = "https://picsum.photos/600/400";

/// Whether `text` asks for the menu card.
pub fn is_menu_command(text: &str) -> bool {
    let text = text.trim().to_lowercase();
    MENU_COMMANDS.contains(&text.as_str())
}

/// Menu card for menu commands, an echo of the trimmed text otherwise.
pub fn for_text(text: &str) -> OutboundMessage {
    if is_menu_command(text) {
        menu_card()
    } else {
        OutboundMessage::text(format!("{ECHO_PREFIX}{}", text.trim()))
    }
}

pub fn for_sticker(_sticker: &StickerContent) -> OutboundMessage {
    OutboundMessage::sticker(STICKER_REPLY.0, STICKER_REPLY.1)
}

pub fn for_image(_image: &ImageContent) -> OutboundMessage {
    OutboundMessage::text(IMAGE_ACK)
}

/// Help text when the data contains `action=help`, an echo of the data otherwise.
pub fn for_postback(postback: &Postback) -> OutboundMessage {
    if postback.data.contains(HELP_POSTBACK) {
        OutboundMessage::text(HELP_TEXT)
    } else {
        OutboundMessage::text(format!("{POSTBACK_PREFIX}{}", postback.data))
    }
}

/// The greeting menu: hero image, title, and two buttons.
pub fn menu_card() -> OutboundMessage {
    let card = Bubble::new()
        .hero(FlexImage::new(MENU_HERO_URL).cover("2:1"))
        .body(
            FlexBox::vertical([
                FlexText::new(MENU_TITLE).bold().size("xl").into(),
                FlexText::new(MENU_SUBTITLE)
                    .size("sm")
                    .color("#888888")
                    .into(),
            ])
            .spacing("md"),
        )
        .footer(
            FlexBox::vertical([
                FlexButton::new(Action::postback("查看說明", HELP_POSTBACK))
                    .style(ButtonStyle::Primary)
                    .into(),
                FlexButton::new(Action::message("回聲測試", "echo hello"))
                    .style(ButtonStyle::Secondary)
                    .into(),
            ])
            .spacing("sm"),
        );

    OutboundMessage::flex(MENU_TITLE, card)
}
