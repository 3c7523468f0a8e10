//! Shell command parsing and execution.
//!
//! Commands:
//! - `get <path> [fallback]` - Read the value at a path
//! - `set <path> <json>` - Write a value
//! - `has <path>` - Whether a meaningful value is stored
//! - `merge <path> <json-object>` - Shallow-merge keys into an object
//! - `parse <path>` - Show the record name and sub-path a path resolves to
//! - `sub <path>` / `unsub <path>` - Follow changes at a path
//! - `call <name> [json]` - Call an RPC endpoint
//! - `records`, `subs`, `help`, `exit`
//!
//! A path is either a delimited string (`users/alice@profile.name`) or a
//! JSON array / `{"path": [..], "subkey": [..]}` object.

use nu_ansi_term::{Color, Style};
use serde_json::{Map, Value};

use recordfs_core::PathExpr;

use crate::session::Session;

/// Result of executing a command
pub enum CommandResult {
    /// Succeeded, optionally with text to display
    Ok(Option<String>),
    /// Failed with a message
    Error(String),
    Exit,
    Help,
}

impl CommandResult {
    fn ok_display(display: impl Into<String>) -> Self {
        CommandResult::Ok(Some(display.into()))
    }
}

/// Parse and execute one input line.
pub fn execute(input: &str, session: &mut Session) -> CommandResult {
    let input = input.trim();
    if input.is_empty() {
        return CommandResult::Ok(None);
    }

    let (command, args) = match input.find(char::is_whitespace) {
        Some(pos) => (&input[..pos], input[pos..].trim()),
        None => (input, ""),
    };

    match command.to_lowercase().as_str() {
        "get" | "read" | "r" => cmd_get(args, session),
        "set" | "write" | "w" => cmd_set(args, session),
        "has" => cmd_has(args, session),
        "merge" => cmd_merge(args, session),
        "parse" => cmd_parse(args, session),
        "sub" | "subscribe" => cmd_sub(args, session),
        "unsub" | "unsubscribe" => cmd_unsub(args, session),
        "call" => cmd_call(args, session),
        "records" | "ls" => cmd_records(session),
        "subs" => cmd_subs(session),
        "help" | "?" => CommandResult::Help,
        "exit" | "quit" | "q" => CommandResult::Exit,
        other => CommandResult::Error(format!(
            "Unknown command: {}. Type 'help' for available commands.",
            other
        )),
    }
}

/// Render the help text listing commands and path forms.
pub fn format_help() -> String {
    let cmd_style = Style::new().bold().fg(Color::Cyan);
    let arg_style = Style::new().fg(Color::Yellow);

    let mut help = String::new();
    help.push_str(&format!(
        "{}\n\n",
        Style::new().bold().paint("recordfs shell commands")
    ));

    let commands = [
        ("get", "<path> [fallback]", "Read the value at path (alias: read, r)"),
        ("set", "<path> <json>", "Write a value at path (alias: write, w)"),
        ("has", "<path>", "Whether a non-empty value is stored"),
        ("merge", "<path> <object>", "Shallow-merge keys into the object at path"),
        ("parse", "<path>", "Show the record name and sub-path"),
        ("", "", ""),
        ("sub", "<path>", "Print changes at path after each command"),
        ("unsub", "<path>", "Stop printing changes at path"),
        ("subs", "", "List subscriptions"),
        ("", "", ""),
        ("call", "<name> [json]", "Call an RPC endpoint (try: echo, records.list)"),
        ("records", "", "List stored records (alias: ls)"),
        ("help", "", "Show this help message"),
        ("exit", "", "Exit the shell (alias: quit, q)"),
    ];

    for (cmd, args, desc) in commands {
        if cmd.is_empty() {
            help.push('\n');
        } else {
            help.push_str(&format!(
                "  {:<8} {:<20} {}\n",
                cmd_style.paint(cmd),
                arg_style.paint(args),
                desc
            ));
        }
    }

    help.push_str(&format!("\n{}\n", Style::new().bold().paint("Paths")));
    for (example, meaning) in [
        ("users/alice", "record users.alice"),
        ("users/alice@profile.name", "key profile.name inside users.alice"),
        ("[\"a/b\", \"c\"]", "record a_b.c"),
        ("{\"path\": [\"a\"], \"subkey\": [\"b\"]}", "key b inside record a"),
    ] {
        help.push_str(&format!("  {:<44} {}\n", arg_style.paint(example), meaning));
    }

    help
}

fn cmd_get(args: &str, session: &mut Session) -> CommandResult {
    let (expr, rest) = match split_path_arg(args) {
        Ok(parts) => parts,
        Err(e) => return CommandResult::Error(format!("{}\nUsage: get <path> [fallback]", e)),
    };

    if !rest.is_empty() {
        let fallback = match parse_json_arg(rest) {
            Ok(v) => v,
            Err(e) => return CommandResult::Error(e),
        };
        return match session.block_on(session.client().get_or(&expr, fallback)) {
            Ok(value) => CommandResult::ok_display(format_json(&value)),
            Err(e) => CommandResult::Error(format!("Read error: {}", e)),
        };
    }

    match session.block_on(session.client().get(&expr)) {
        Ok(Some(value)) => CommandResult::ok_display(format_json(&value)),
        Ok(None) => CommandResult::ok_display(
            Color::Yellow
                .paint("null (nothing stored at path)")
                .to_string(),
        ),
        Err(e) => CommandResult::Error(format!("Read error: {}", e)),
    }
}

fn cmd_set(args: &str, session: &mut Session) -> CommandResult {
    const USAGE: &str = "Usage: set <path> <json>\nExample: set users/alice {\"name\": \"Alice\"}";

    let (expr, rest) = match split_path_arg(args) {
        Ok(parts) => parts,
        Err(e) => return CommandResult::Error(format!("{}\n{}", e, USAGE)),
    };
    if rest.is_empty() {
        return CommandResult::Error(USAGE.to_string());
    }
    let value = match parse_json_arg(rest) {
        Ok(v) => v,
        Err(e) => return CommandResult::Error(e),
    };

    let path = match session.client().parse(&expr) {
        Ok(path) => path,
        Err(e) => return CommandResult::Error(e.to_string()),
    };
    match session.block_on(session.client().set(&expr, value)) {
        Ok(_) => CommandResult::ok_display(format!(
            "{} {}",
            Color::Green.paint("Set"),
            Color::Yellow.paint(path.to_string())
        )),
        Err(e) => CommandResult::Error(format!("Write error: {}", e)),
    }
}

fn cmd_has(args: &str, session: &mut Session) -> CommandResult {
    let (expr, _) = match split_path_arg(args) {
        Ok(parts) => parts,
        Err(e) => return CommandResult::Error(format!("{}\nUsage: has <path>", e)),
    };
    match session.block_on(session.client().has(&expr)) {
        Ok(present) => CommandResult::ok_display(Color::Yellow.paint(present.to_string()).to_string()),
        Err(e) => CommandResult::Error(format!("Read error: {}", e)),
    }
}

fn cmd_merge(args: &str, session: &mut Session) -> CommandResult {
    const USAGE: &str = "Usage: merge <path> <json-object>";

    let (expr, rest) = match split_path_arg(args) {
        Ok(parts) => parts,
        Err(e) => return CommandResult::Error(format!("{}\n{}", e, USAGE)),
    };
    let partial: Map<String, Value> = match parse_json_arg(rest) {
        Ok(Value::Object(map)) => map,
        Ok(_) => return CommandResult::Error(format!("merge expects a JSON object\n{}", USAGE)),
        Err(e) => return CommandResult::Error(e),
    };

    match session.block_on(session.client().merge(&expr, partial)) {
        Ok(merged) => CommandResult::ok_display(format_json(&merged)),
        Err(e) => CommandResult::Error(format!("Write error: {}", e)),
    }
}

fn cmd_parse(args: &str, session: &mut Session) -> CommandResult {
    let (expr, _) = match split_path_arg(args) {
        Ok(parts) => parts,
        Err(e) => return CommandResult::Error(format!("{}\nUsage: parse <path>", e)),
    };
    match session.client().parse(&expr) {
        Ok(path) => CommandResult::ok_display(format!(
            "record:   {}\nsub-path: {}",
            Color::Yellow.paint(&path.record_name),
            Color::Yellow.paint(path.sub_path().unwrap_or("(none)"))
        )),
        Err(e) => CommandResult::Error(e.to_string()),
    }
}

fn cmd_sub(args: &str, session: &mut Session) -> CommandResult {
    let (expr, _) = match split_path_arg(args) {
        Ok(parts) => parts,
        Err(e) => return CommandResult::Error(format!("{}\nUsage: sub <path>", e)),
    };
    match session.subscribe(&expr) {
        Ok(path) => CommandResult::ok_display(format!(
            "{} {}",
            Color::Green.paint("Subscribed to"),
            Color::Yellow.paint(path.to_string())
        )),
        Err(e) => CommandResult::Error(e.to_string()),
    }
}

fn cmd_unsub(args: &str, session: &mut Session) -> CommandResult {
    let (expr, _) = match split_path_arg(args) {
        Ok(parts) => parts,
        Err(e) => return CommandResult::Error(format!("{}\nUsage: unsub <path>", e)),
    };
    match session.unsubscribe(&expr) {
        Ok((path, true)) => CommandResult::ok_display(format!(
            "{} {}",
            Color::Green.paint("Unsubscribed from"),
            Color::Yellow.paint(path.to_string())
        )),
        Ok((path, false)) => CommandResult::ok_display(format!(
            "{} {}",
            Color::DarkGray.paint("Not subscribed to"),
            Color::Yellow.paint(path.to_string())
        )),
        Err(e) => CommandResult::Error(e.to_string()),
    }
}

fn cmd_call(args: &str, session: &mut Session) -> CommandResult {
    let (name, rest) = match args.find(char::is_whitespace) {
        Some(pos) => (&args[..pos], args[pos..].trim()),
        None => (args, ""),
    };
    if name.is_empty() {
        return CommandResult::Error("Usage: call <name> [json]".to_string());
    }
    let payload = if rest.is_empty() {
        Value::Null
    } else {
        match parse_json_arg(rest) {
            Ok(v) => v,
            Err(e) => return CommandResult::Error(e),
        }
    };

    match session.block_on(session.client().rpc().call(name, payload)) {
        Ok(response) => CommandResult::ok_display(format_json(&response)),
        Err(e) => CommandResult::Error(e.to_string()),
    }
}

fn cmd_records(session: &mut Session) -> CommandResult {
    let names = session.store().record_names();
    if names.is_empty() {
        return CommandResult::ok_display(Color::DarkGray.paint("(no records)").to_string());
    }
    let lines: Vec<String> = names
        .iter()
        .map(|name| format!("  {}", Color::Yellow.paint(name)))
        .collect();
    CommandResult::ok_display(lines.join("\n"))
}

fn cmd_subs(session: &mut Session) -> CommandResult {
    let paths = session.subscription_paths();
    if paths.is_empty() {
        return CommandResult::ok_display(Color::DarkGray.paint("(no subscriptions)").to_string());
    }
    let lines: Vec<String> = paths
        .iter()
        .map(|path| format!("  {}", Color::Yellow.paint(path)))
        .collect();
    CommandResult::ok_display(lines.join("\n"))
}

/// Split the leading path argument from the rest of the line.
///
/// A path starting with `[` or `{` is read as one JSON value; anything else
/// runs up to the first whitespace.
fn split_path_arg(args: &str) -> Result<(PathExpr, &str), String> {
    let args = args.trim_start();
    if args.is_empty() {
        return Err("Missing path".to_string());
    }

    if args.starts_with('[') || args.starts_with('{') {
        let mut values = serde_json::Deserializer::from_str(args).into_iter::<Value>();
        let value = match values.next() {
            Some(Ok(value)) => value,
            Some(Err(e)) => return Err(format!("Invalid path: {}", e)),
            None => return Err("Missing path".to_string()),
        };
        let rest = &args[values.byte_offset()..];
        let expr = PathExpr::from_json(&value).map_err(|e| e.to_string())?;
        return Ok((expr, rest.trim()));
    }

    match args.find(char::is_whitespace) {
        Some(pos) => Ok((PathExpr::text(&args[..pos]), args[pos..].trim())),
        None => Ok((PathExpr::text(args), "")),
    }
}

fn parse_json_arg(text: &str) -> Result<Value, String> {
    serde_json::from_str(text).map_err(|e| format!("Invalid JSON: {}", e))
}

/// Render a value as one line for notifications.
pub fn format_compact(value: &Value) -> String {
    value.to_string()
}

/// Pretty-print JSON with colored scalars.
pub fn format_json(value: &Value) -> String {
    let pretty = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());

    let mut result = String::new();
    let mut chars = pretty.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' => {
                let mut literal = String::from('"');
                let mut escaped = false;
                for next in chars.by_ref() {
                    literal.push(next);
                    if escaped {
                        escaped = false;
                    } else if next == '\\' {
                        escaped = true;
                    } else if next == '"' {
                        break;
                    }
                }
                // A string followed by ':' is an object key.
                let is_key = chars.peek() == Some(&':');
                let color = if is_key { Color::Blue } else { Color::Green };
                result.push_str(&color.paint(literal).to_string());
            }
            '{' | '}' | '[' | ']' => result.push_str(&Color::White.bold().paint(c.to_string()).to_string()),
            c if c.is_ascii_digit() || c == '-' => {
                let mut number = String::from(c);
                while let Some(&next) = chars.peek() {
                    if next.is_ascii_alphanumeric() || matches!(next, '.' | '+' | '-') {
                        number.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                result.push_str(&Color::Cyan.paint(number).to_string());
            }
            c if c.is_ascii_alphabetic() => {
                let mut word = String::from(c);
                while let Some(&next) = chars.peek() {
                    if next.is_ascii_alphabetic() {
                        word.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                result.push_str(&Color::Yellow.paint(word).to_string());
            }
            other => result.push(other),
        }
    }
    result
}
