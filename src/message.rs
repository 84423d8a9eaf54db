//! Outbound messages.
//!
//! Messages are immutable values that serialize to the Messaging API JSON
//! format. Text converts directly from strings:
//!
//! ```rust
//! use line_webhook_rs::message::OutboundMessage;
//!
//! let hello: OutboundMessage = "Hello".into();
//! assert_eq!(
//!     serde_json::to_value(&hello).unwrap(),
//!     serde_json::json!({"type": "text", "text": "Hello"})
//! );
//! ```
//!
//! Flex messages are built from a [`Bubble`] tree:
//!
//! ```rust
//! use line_webhook_rs::message::{Action, Bubble, FlexBox, FlexButton, FlexText, OutboundMessage};
//!
//! let card = Bubble::new()
//!     .body(FlexBox::vertical([FlexText::new("Pick one").into()]))
//!     .footer(FlexBox::vertical([
//!         FlexButton::new(Action::postback("Help", "action=help")).into(),
//!     ]));
//! let message = OutboundMessage::flex("Pick one", card);
//! ```

use serde::{Serialize, Serializer};

/// A message sent through the reply or push API.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
#[non_exhaustive]
pub enum OutboundMessage {
    Text {
        text: String,
    },
    Sticker {
        package_id: String,
        sticker_id: String,
    },
    Flex {
        /// Shown in notifications and on clients that cannot render flex.
        alt_text: String,
        contents: FlexContainer,
    },
}

impl OutboundMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn sticker(package_id: impl Into<String>, sticker_id: impl Into<String>) -> Self {
        Self::Sticker {
            package_id: package_id.into(),
            sticker_id: sticker_id.into(),
        }
    }

    pub fn flex(alt_text: impl Into<String>, contents: impl Into<FlexContainer>) -> Self {
        Self::Flex {
            alt_text: alt_text.into(),
            contents: contents.into(),
        }
    }

    /// The text body, for text messages.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            _ => None,
        }
    }
}

impl From<&str> for OutboundMessage {
    fn from(value: &str) -> Self {
        Self::text(value)
    }
}

impl From<String> for OutboundMessage {
    fn from(value: String) -> Self {
        Self::text(value)
    }
}

/// Top-level flex layout.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
#[non_exhaustive]
pub enum FlexContainer {
    Bubble(Bubble),
}

impl From<Bubble> for FlexContainer {
    fn from(value: Bubble) -> Self {
        Self::Bubble(value)
    }
}

/// A single card: optional hero, body and footer blocks.
#[derive(Serialize, Clone, Debug, Default, PartialEq)]
#[non_exhaustive]
pub struct Bubble {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hero: Option<FlexComponent>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "tagged_box")]
    pub body: Option<FlexBox>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "tagged_box")]
    pub footer: Option<FlexBox>,
}

/// Bubble blocks are always boxes but still carry `"type": "box"`.
#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum TaggedBox<'a> {
    Box(&'a FlexBox),
}

fn tagged_box<S: Serializer>(value: &Option<FlexBox>, serializer: S) -> Result<S::Ok, S::Error> {
    value.as_ref().map(TaggedBox::Box).serialize(serializer)
}

impl Bubble {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hero(mut self, hero: impl Into<FlexComponent>) -> Self {
        self.hero = Some(hero.into());
        self
    }

    pub fn body(mut self, body: FlexBox) -> Self {
        self.body = Some(body);
        self
    }

    pub fn footer(mut self, footer: FlexBox) -> Self {
        self.footer = Some(footer);
        self
    }
}

/// A node in a flex layout.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
#[non_exhaustive]
pub enum FlexComponent {
    Box(FlexBox),
    Text(FlexText),
    Image(FlexImage),
    Button(FlexButton),
}

macro_rules! into_component {
    ($($ty:ident => $variant:ident),*) => {$(
        impl From<$ty> for FlexComponent {
            fn from(value: $ty) -> Self {
                Self::$variant(value)
            }
        }
    )*};
}

into_component!(FlexBox => Box, FlexText => Text, FlexImage => Image, FlexButton => Button);

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    Vertical,
    Horizontal,
    Baseline,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[non_exhaustive]
pub struct FlexBox {
    pub layout: Layout,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spacing: Option<String>,
    pub contents: Vec<FlexComponent>,
}

impl FlexBox {
    pub fn new(layout: Layout, contents: impl IntoIterator<Item = FlexComponent>) -> Self {
        Self {
            layout,
            spacing: None,
            contents: contents.into_iter().collect(),
        }
    }

    pub fn vertical(contents: impl IntoIterator<Item = FlexComponent>) -> Self {
        Self::new(Layout::Vertical, contents)
    }

    /// `none`, `xs`, `sm`, `md`, `lg`, `xl`, `xxl`, or a pixel value.
    pub fn spacing(mut self, spacing: impl Into<String>) -> Self {
        self.spacing = Some(spacing.into());
        self
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[non_exhaustive]
pub struct FlexText {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wrap: Option<bool>,
}

impl FlexText {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            weight: None,
            size: None,
            color: None,
            wrap: None,
        }
    }

    pub fn bold(mut self) -> Self {
        self.weight = Some("bold".to_owned());
        self
    }

    pub fn size(mut self, size: impl Into<String>) -> Self {
        self.size = Some(size.into());
        self
    }

    /// Hex color such as `#888888`.
    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn wrap(mut self) -> Self {
        self.wrap = Some(true);
        self
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct FlexImage {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_mode: Option<String>,
}

impl FlexImage {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            size: None,
            aspect_ratio: None,
            aspect_mode: None,
        }
    }

    /// Full-width cover image with the given `width:height` ratio.
    pub fn cover(mut self, aspect_ratio: impl Into<String>) -> Self {
        self.size = Some("full".to_owned());
        self.aspect_ratio = Some(aspect_ratio.into());
        self.aspect_mode = Some("cover".to_owned());
        self
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[non_exhaustive]
pub struct FlexButton {
    pub action: Action,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<ButtonStyle>,
}

impl FlexButton {
    pub fn new(action: Action) -> Self {
        Self {
            action,
            style: None,
        }
    }

    pub fn style(mut self, style: ButtonStyle) -> Self {
        self.style = Some(style);
        self
    }
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ButtonStyle {
    Primary,
    Secondary,
    Link,
}

/// What happens when a user taps a button.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
#[non_exhaustive]
pub enum Action {
    /// Sends a postback event carrying `data` back to the webhook.
    Postback {
        label: String,
        data: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        display_text: Option<String>,
    },
    /// Sends `text` as if the user had typed it.
    Message { label: String, text: String },
    /// Opens `uri`.
    Uri { label: String, uri: String },
}

impl Action {
    pub fn postback(label: impl Into<String>, data: impl Into<String>) -> Self {
        Self::Postback {
            label: label.into(),
            data: data.into(),
            display_text: None,
        }
    }

    pub fn message(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Message {
            label: label.into(),
            text: text.into(),
        }
    }

    pub fn uri(label: impl Into<String>, uri: impl Into<String>) -> Self {
        Self::Uri {
            label: label.into(),
            uri: uri.into(),
        }
    }
}
