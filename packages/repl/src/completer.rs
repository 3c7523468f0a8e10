use reedline::{Completer, Span, Suggestion};

/// (command, description) pairs offered for completion.
const COMMANDS: &[(&str, &str)] = &[
    ("get", "Read the value at a path"),
    ("set", "Write a value at a path"),
    ("has", "Whether a non-empty value is stored"),
    ("merge", "Shallow-merge keys into an object"),
    ("parse", "Show record name and sub-path"),
    ("sub", "Print changes at a path"),
    ("unsub", "Stop printing changes at a path"),
    ("subs", "List subscriptions"),
    ("call", "Call an RPC endpoint"),
    ("records", "List stored records"),
    ("help", "Show help"),
    ("exit", "Exit the shell"),
];

/// Completes the command word of the line.
#[derive(Debug, Default)]
pub struct ReplCompleter;

impl ReplCompleter {
    /// Create a command completer.
    pub fn new() -> Self {
        Self
    }
}

impl Completer for ReplCompleter {
    fn complete(&mut self, line: &str, pos: usize) -> Vec<Suggestion> {
        let line_to_pos = &line[..pos];
        let start = line_to_pos.len() - line_to_pos.trim_start().len();
        let prefix = &line_to_pos[start..];

        // Only the first word is a command.
        if prefix.contains(char::is_whitespace) {
            return Vec::new();
        }

        COMMANDS
            .iter()
            .filter(|(cmd, _)| cmd.starts_with(prefix))
            .map(|(cmd, desc)| Suggestion {
                value: cmd.to_string(),
                description: Some(desc.to_string()),
                style: None,
                extra: None,
                span: Span::new(start, pos),
                append_whitespace: true,
                match_indices: None,
            })
            .collect()
    }
}
