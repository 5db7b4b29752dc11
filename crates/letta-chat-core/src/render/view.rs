//! Message views
//!
//! User and assistant messages share one rendering contract. Everything that
//! differs between the two lives in a [`ViewStyle`] row, so the layout rules
//! can be read in one place.

use chrono::{DateTime, Local};
use tracing::debug;

use super::markdown::{escape_html, markdown_to_html};
use crate::normalize::normalize;
use crate::state::{ChatMessage, ChatRole};

const ACTION_BUTTON: &str =
    "h-6 w-6 p-0 bg-white dark:bg-gray-800 border border-gray-200 dark:border-gray-700";
const ACTIONS: &str =
    "absolute -bottom-8 left-0 flex gap-1 opacity-0 group-hover:opacity-100 transition-opacity";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageView {
    User,
    Assistant,
}

/// Per-variant layout and behaviour
#[derive(Debug)]
pub struct ViewStyle {
    pub justify: &'static str,
    pub avatar: &'static str,
    pub avatar_class: &'static str,
    /// Avatar is placed before the bubble
    pub avatar_leading: bool,
    pub bubble_class: &'static str,
    pub body_class: &'static str,
    pub timestamp_class: &'static str,
    /// Content goes through the normalizer and markdown renderer
    pub markdown: bool,
    /// Copy and feedback buttons are shown on hover
    pub actions: bool,
}

const USER_STYLE: ViewStyle = ViewStyle {
    justify: "justify-end",
    avatar: "U",
    avatar_class: "bg-gray-600 text-white",
    avatar_leading: false,
    bubble_class: "bg-gray-600 text-white",
    body_class: "text-sm leading-relaxed text-white",
    timestamp_class: "text-gray-100",
    markdown: false,
    actions: false,
};

const ASSISTANT_STYLE: ViewStyle = ViewStyle {
    justify: "justify-start",
    avatar: "🤖",
    avatar_class: "bg-gray-200 text-gray-700",
    avatar_leading: true,
    bubble_class: "bg-white dark:bg-gray-800 border border-gray-200 dark:border-gray-700",
    body_class: "text-sm leading-relaxed text-gray-900 dark:text-gray-100 prose prose-sm dark:prose-invert max-w-none break-words",
    timestamp_class: "text-gray-500",
    markdown: true,
    actions: true,
};

/// Feedback placeholders. They render but carry no behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback {
    Up,
    Down,
}

impl Feedback {
    pub fn all() -> [Feedback; 2] {
        [Feedback::Up, Feedback::Down]
    }

    fn icon(&self) -> &'static str {
        match self {
            Feedback::Up => "👍",
            Feedback::Down => "👎",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Feedback::Up => "Good response",
            Feedback::Down => "Bad response",
        }
    }
}

/// Hour and minute, zero padded.
pub fn format_timestamp(timestamp: &DateTime<Local>) -> String {
    timestamp.format("%H:%M").to_string()
}

impl MessageView {
    pub fn for_role(role: ChatRole) -> Self {
        match role {
            ChatRole::User => MessageView::User,
            ChatRole::Assistant => MessageView::Assistant,
        }
    }

    pub fn style(&self) -> &'static ViewStyle {
        match self {
            MessageView::User => &USER_STYLE,
            MessageView::Assistant => &ASSISTANT_STYLE,
        }
    }

    /// Inner HTML of the message body.
    pub fn body_html(&self, content: &str) -> String {
        if self.style().markdown {
            markdown_to_html(&normalize(content))
        } else {
            format!(
                "<p class=\"whitespace-pre-wrap m-0\">{}</p>",
                escape_html(content)
            )
        }
    }

    fn actions_html(&self, content: &str, copied: bool) -> String {
        let (title, icon_class) = if copied {
            ("Copied!", "h-3 w-3 text-green-500")
        } else {
            ("Copy message", "h-3 w-3")
        };

        let mut html = format!(
            "<div class=\"{ACTIONS}\"><button type=\"button\" class=\"{ACTION_BUTTON}\" data-action=\"copy\" data-copy=\"{}\" title=\"{title}\"><span class=\"{icon_class}\">⧉</span></button>",
            escape_html(content)
        );
        for feedback in Feedback::all() {
            html.push_str(&format!(
                "<button type=\"button\" class=\"{ACTION_BUTTON}\" aria-label=\"{}\"><span class=\"h-3 w-3\">{}</span></button>",
                feedback.label(),
                feedback.icon()
            ));
        }
        html.push_str("</div>");
        html
    }

    /// Render `message` as a complete HTML fragment. `copied` reflects the
    /// copy button's acknowledgement state.
    pub fn render(&self, message: &ChatMessage, copied: bool) -> String {
        let style = self.style();

        if *self == MessageView::Assistant {
            let preview: String = message.content.chars().take(100).collect();
            debug!(
                content_length = message.content.len(),
                %preview,
                has_literal_newlines = message.content.contains("\\n"),
                has_actual_newlines = message.content.contains('\n'),
                "rendering assistant message"
            );
        }

        let avatar = format!(
            "<div class=\"h-8 w-8 shrink-0 rounded-full flex items-center justify-center {}\">{}</div>",
            style.avatar_class, style.avatar
        );

        let mut bubble = format!(
            "<div class=\"group relative rounded-2xl px-4 py-3 shadow-sm transition-all {}\"><div class=\"{}\">{}</div>",
            style.bubble_class,
            style.body_class,
            self.body_html(&message.content)
        );
        if style.actions {
            bubble.push_str(&self.actions_html(&message.content, copied));
        }
        if let Some(timestamp) = &message.timestamp {
            bubble.push_str(&format!(
                "<div class=\"mt-2 text-xs opacity-60 {}\">{}</div>",
                style.timestamp_class,
                format_timestamp(timestamp)
            ));
        }
        bubble.push_str("</div>");

        let (first, second) = if style.avatar_leading {
            (avatar, bubble)
        } else {
            (bubble, avatar)
        };

        format!(
            "<div class=\"flex w-full {}\" data-role=\"{}\"><div class=\"flex gap-3 max-w-[85%]\">{first}{second}</div></div>",
            style.justify,
            message.role.as_str()
        )
    }
}

/// Render a message with its copy button at rest.
pub fn render_message(message: &ChatMessage) -> String {
    MessageView::for_role(message.role).render(message, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_user_message_is_literal_and_right_aligned() {
        let html = render_message(&ChatMessage::user("**not bold**\n  <kept>"));

        assert!(html.contains("justify-end"));
        assert!(html.contains("whitespace-pre-wrap"));
        assert!(html.contains("**not bold**\n  &lt;kept&gt;"));
        assert!(!html.contains("<strong"));
        assert!(!html.contains("data-action=\"copy\""));
        // bubble before avatar
        assert!(html.find("group relative").unwrap() < html.find(">U</div>").unwrap());
    }

    #[test]
    fn test_assistant_message_is_normalized_markdown() {
        let raw = "Hello\\n\\nThis is code:\\nimport os\\ndef f():\\n  pass";
        let html = render_message(&ChatMessage::assistant(raw));

        assert!(html.contains("justify-start"));
        assert!(html.contains("language-python"));
        assert!(html.contains("def f():"));
        // avatar before bubble
        assert!(html.find("🤖").unwrap() < html.find("group relative").unwrap());
    }

    #[test]
    fn test_copy_button_carries_raw_content() {
        let raw = "line\\nnext <b>";
        let html = render_message(&ChatMessage::assistant(raw));
        assert!(html.contains("data-copy=\"line\\nnext &lt;b&gt;\""));
        assert!(html.contains("title=\"Copy message\""));
        assert!(html.contains("aria-label=\"Good response\""));
        assert!(html.contains("aria-label=\"Bad response\""));
        assert!(html.contains("group-hover:opacity-100"));
    }

    #[test]
    fn test_acknowledged_copy_button() {
        let message = ChatMessage::assistant("hi");
        let html = MessageView::Assistant.render(&message, true);
        assert!(html.contains("title=\"Copied!\""));
        assert!(html.contains("text-green-500"));
    }

    #[test]
    fn test_timestamp_hour_minute() {
        let at = Local.with_ymd_and_hms(2024, 5, 1, 9, 5, 42).unwrap();
        let html = render_message(&ChatMessage::user("hi").with_timestamp(at));
        assert!(html.contains(">09:05</div>"));

        let html = render_message(&ChatMessage::user("hi"));
        assert!(!html.contains("mt-2 text-xs"));
    }
}
