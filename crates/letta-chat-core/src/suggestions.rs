/// A canned prompt offered on an empty chat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Suggestion {
    pub title: &'static str,
    pub subtitle: &'static str,
}

impl Suggestion {
    /// The text sent when the suggestion is picked
    pub fn prompt(&self) -> String {
        format!("{} {}", self.title, self.subtitle)
    }
}

pub const SUGGESTIONS: [Suggestion; 4] = [
    Suggestion {
        title: "Top 3 Sales performers",
        subtitle: "this year?",
    },
    Suggestion {
        title: "Top 3 Customers",
        subtitle: "by deal size",
    },
    Suggestion {
        title: "Total Sales",
        subtitle: "broken by Region",
    },
    Suggestion {
        title: "What is the average deal size",
        subtitle: "by product?",
    },
];

/// Suggestion by its 1-based position in the list
pub fn suggestion(number: usize) -> Option<&'static Suggestion> {
    number.checked_sub(1).and_then(|i| SUGGESTIONS.get(i))
}
