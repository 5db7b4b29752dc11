//! HTML rendering of chat messages

pub mod copy;
pub mod markdown;
pub mod view;

pub use copy::{Clipboard, CopyButton, SystemClipboard, COPY_ACK_DURATION};
pub use markdown::markdown_to_html;
pub use view::{render_message, Feedback, MessageView, ViewStyle};
