//! Terminal host on Reedline: line editing, completion and history.

use std::borrow::Cow;
use std::io::{self, Write};
use std::path::PathBuf;

use nu_ansi_term::{Color, Style};
use reedline::{
    default_emacs_keybindings, default_vi_insert_keybindings, default_vi_normal_keybindings,
    ColumnarMenu, DefaultHinter, EditMode, Emacs, FileBackedHistory, KeyCode, KeyModifiers,
    Keybindings, MenuBuilder, Prompt, PromptEditMode, PromptHistorySearch,
    PromptHistorySearchStatus, PromptViMode, Reedline, ReedlineEvent, ReedlineMenu,
    Signal as ReedlineSignal, Vi,
};
use tracing::warn;

use crate::completer::ReplCompleter;
use crate::io::{InputLine, IoError, IoHost, Output, OutputStyle, PromptConfig, Signal};

const HISTORY_SIZE: usize = 1000;

/// Explicit editing mode chosen on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditModeChoice {
    Vi,
    Emacs,
}

/// Terminal host using Reedline for interactive I/O.
pub struct TerminalHost {
    line_editor: Reedline,
    pending_input: Option<InputLine>,
    pending_signal: Option<Signal>,
    current_prompt: PromptConfig,
}

impl TerminalHost {
    /// Create a terminal host. Without an explicit choice the editing mode
    /// follows `RECORDFS_EDIT_MODE`, then `$EDITOR`/`$VISUAL`, then inputrc.
    pub fn new(choice: Option<EditModeChoice>) -> io::Result<Self> {
        let completion_menu = Box::new(
            ColumnarMenu::default()
                .with_name("completion_menu")
                .with_text_style(Style::new().fg(Color::Cyan))
                .with_selected_text_style(Style::new().fg(Color::Black).on(Color::Cyan).bold()),
        );

        let use_vi = match choice {
            Some(choice) => choice == EditModeChoice::Vi,
            None => detect_vi_mode(),
        };
        let edit_mode: Box<dyn EditMode> = if use_vi {
            let mut insert = default_vi_insert_keybindings();
            bind_tab_completion(&mut insert);
            Box::new(Vi::new(insert, default_vi_normal_keybindings()))
        } else {
            let mut keybindings = default_emacs_keybindings();
            bind_tab_completion(&mut keybindings);
            Box::new(Emacs::new(keybindings))
        };

        let mut line_editor = Reedline::create()
            .with_completer(Box::new(ReplCompleter::new()))
            .with_hinter(Box::new(
                DefaultHinter::default().with_style(Style::new().fg(Color::LightGray).dimmed()),
            ))
            .with_menu(ReedlineMenu::EngineCompleter(completion_menu))
            .with_edit_mode(edit_mode);

        if let Some(history_path) = history_path() {
            if let Some(parent) = history_path.parent() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    warn!(error = %e, path = %parent.display(), "cannot create history directory");
                }
            }
            match FileBackedHistory::with_file(HISTORY_SIZE, history_path) {
                Ok(history) => line_editor = line_editor.with_history(Box::new(history)),
                Err(e) => warn!(error = %e, "history disabled"),
            }
        }

        Ok(Self {
            line_editor,
            pending_input: None,
            pending_signal: None,
            current_prompt: PromptConfig::default(),
        })
    }
}

impl IoHost for TerminalHost {
    fn wait_for_input(&mut self) -> Result<(), IoError> {
        let prompt = TerminalPrompt(self.current_prompt.clone());

        match self.line_editor.read_line(&prompt) {
            Ok(ReedlineSignal::Success(line)) => self.pending_input = Some(InputLine { line }),
            Ok(ReedlineSignal::CtrlC) => self.pending_signal = Some(Signal::Interrupt),
            Ok(ReedlineSignal::CtrlD) => self.pending_signal = Some(Signal::Eof),
            Err(e) => return Err(IoError::Io(format!("Reedline error: {}", e))),
        }
        Ok(())
    }

    fn read_input(&mut self) -> Result<Option<InputLine>, IoError> {
        Ok(self.pending_input.take())
    }

    fn read_signal(&mut self) -> Result<Option<Signal>, IoError> {
        Ok(self.pending_signal.take())
    }

    fn write_output(&mut self, output: Output) -> Result<(), IoError> {
        let styled = match output.style {
            OutputStyle::Normal => output.text,
            OutputStyle::Error => format!("{} {}", Color::Red.bold().paint("Error:"), output.text),
            OutputStyle::Info | OutputStyle::Banner => Color::Cyan.paint(&output.text).to_string(),
            OutputStyle::Notification => format!(
                "{} {}",
                Color::Magenta.bold().paint("~"),
                Color::Magenta.paint(&output.text)
            ),
        };
        println!("{}", styled);
        Ok(())
    }

    fn write_prompt(&mut self, config: PromptConfig) -> Result<(), IoError> {
        self.current_prompt = config;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), IoError> {
        Ok(io::stdout().flush()?)
    }
}

struct TerminalPrompt(PromptConfig);

impl Prompt for TerminalPrompt {
    fn render_prompt_left(&self) -> Cow<'_, str> {
        let PromptConfig {
            record_count,
            subscription_count,
        } = self.0;
        let mut left = format!(
            "{} {}",
            Color::Blue.bold().paint("recordfs"),
            Color::Yellow.paint(format!("{} rec", record_count))
        );
        if subscription_count > 0 {
            left.push_str(&format!(
                " {}",
                Color::Magenta.paint(format!("{} sub", subscription_count))
            ));
        }
        Cow::Owned(left)
    }

    fn render_prompt_right(&self) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_indicator(&self, edit_mode: PromptEditMode) -> Cow<'_, str> {
        let indicator = match edit_mode {
            PromptEditMode::Default | PromptEditMode::Emacs => Color::Green.bold().paint(">"),
            PromptEditMode::Vi(PromptViMode::Normal) => Color::Blue.bold().paint("[N]>"),
            PromptEditMode::Vi(PromptViMode::Insert) => Color::Green.bold().paint("[I]>"),
            PromptEditMode::Custom(s) => return Cow::Owned(format!("({})> ", s)),
        };
        Cow::Owned(format!(" {} ", indicator))
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<'_, str> {
        Cow::Borrowed(": ")
    }

    fn render_prompt_history_search_indicator(
        &self,
        history_search: PromptHistorySearch,
    ) -> Cow<'_, str> {
        let prefix = match history_search.status {
            PromptHistorySearchStatus::Passing => "",
            PromptHistorySearchStatus::Failing => "failing ",
        };
        Cow::Owned(format!(
            "({}reverse-search: {}) ",
            prefix, history_search.term
        ))
    }
}

fn bind_tab_completion(keybindings: &mut Keybindings) {
    keybindings.add_binding(
        KeyModifiers::NONE,
        KeyCode::Tab,
        ReedlineEvent::UntilFound(vec![
            ReedlineEvent::Menu("completion_menu".to_string()),
            ReedlineEvent::MenuNext,
        ]),
    );
}

fn history_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|p| p.join("recordfs").join("history.txt"))
}

fn detect_vi_mode() -> bool {
    if let Ok(mode) = std::env::var("RECORDFS_EDIT_MODE") {
        return matches!(mode.to_lowercase().as_str(), "vi" | "vim");
    }

    let editor_is_vi = ["EDITOR", "VISUAL"].iter().any(|var| {
        std::env::var(var)
            .map(|value| is_vi_editor(&value))
            .unwrap_or(false)
    });
    editor_is_vi || inputrc_selects_vi()
}

fn is_vi_editor(value: &str) -> bool {
    let name = value
        .rsplit('/')
        .next()
        .unwrap_or(value)
        .split_whitespace()
        .next()
        .unwrap_or("")
        .to_lowercase();
    matches!(name.as_str(), "vi" | "vim" | "nvim" | "gvim")
}

fn inputrc_selects_vi() -> bool {
    let candidates = [
        std::env::var("INPUTRC").ok().map(PathBuf::from),
        dirs::home_dir().map(|p| p.join(".inputrc")),
        Some(PathBuf::from("/etc/inputrc")),
    ];

    candidates
        .into_iter()
        .flatten()
        .filter_map(|path| std::fs::read_to_string(path).ok())
        .any(|content| {
            content.lines().any(|line| {
                let words: Vec<&str> = line.split_whitespace().collect();
                words == ["set", "editing-mode", "vi"]
            })
        })
}
