//! Platform-independent shell core.
//!
//! The loop interacts with the user only through [`IoHost`], so the same
//! core runs in the terminal and under a scripted host in tests.

use crate::commands::{self, CommandResult};
use crate::io::{ExitReason, IoError, IoHost, Output, PromptConfig, Signal};
use crate::session::{Session, SessionError};
use recordfs_core::SplitPolicy;

/// The platform-independent shell core.
pub struct ReplCore {
    session: Session,
}

impl ReplCore {
    /// Create a core over a fresh in-memory store.
    pub fn new(split: SplitPolicy) -> Result<Self, SessionError> {
        Ok(Self::with_session(Session::new(split)?))
    }

    /// Create a core over an existing session.
    pub fn with_session(session: Session) -> Self {
        Self { session }
    }

    /// Run the loop until the user exits.
    ///
    /// Notifications raised by a command, including the immediate replay of
    /// a new subscription, are printed right after that command's output.
    pub fn run(&mut self, io: &mut impl IoHost) -> Result<ExitReason, IoError> {
        io.write_output(Output::banner(BANNER))?;

        loop {
            self.update_prompt(io)?;
            io.wait_for_input()?;

            if let Some(signal) = io.read_signal()? {
                match signal {
                    Signal::Eof => {
                        io.write_output(Output::info("Goodbye!"))?;
                        io.flush()?;
                        return Ok(ExitReason::Eof);
                    }
                    Signal::Interrupt => {
                        io.write_output(Output::info("^C (use 'exit' to quit)"))?;
                        continue;
                    }
                }
            }

            let Some(input) = io.read_input()? else {
                continue;
            };

            match commands::execute(&input.line, &mut self.session) {
                CommandResult::Ok(None) => {}
                CommandResult::Ok(Some(output)) => io.write_output(Output::normal(output))?,
                CommandResult::Error(msg) => io.write_output(Output::error(msg))?,
                CommandResult::Help => io.write_output(Output::normal(commands::format_help()))?,
                CommandResult::Exit => {
                    io.write_output(Output::info("Goodbye!"))?;
                    io.flush()?;
                    return Ok(ExitReason::UserExit);
                }
            }

            self.write_notifications(io)?;
            io.flush()?;
        }
    }

    /// The session commands run against.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Mutable access to the session, for seeding state before `run`.
    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    fn write_notifications(&self, io: &mut impl IoHost) -> Result<(), IoError> {
        for notification in self.session.drain_notifications() {
            io.write_output(Output::notification(format!(
                "{} {}",
                notification.path,
                commands::format_compact(&notification.value)
            )))?;
        }
        Ok(())
    }

    fn update_prompt(&self, io: &mut impl IoHost) -> Result<(), IoError> {
        io.write_prompt(PromptConfig {
            record_count: self.session.store().record_names().len(),
            subscription_count: self.session.subscription_count(),
        })
    }
}

const BANNER: &str = r#"
                           _  __
  _ __ ___  ___ ___  _ __ __| |/ _|___
 | '__/ _ \/ __/ _ \| '__/ _` | |_/ __|
 | | |  __/ (_| (_) | | | (_| |  _\__ \
 |_|  \___|\___\___/|_|  \__,_|_| |___/

Type 'help' for available commands, 'exit' to quit.
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{InputLine, OutputStyle};
    use std::collections::VecDeque;

    /// Scripted host: one queued step per `wait_for_input`.
    enum Step {
        Line(&'static str),
        Signal(Signal),
    }

    #[derive(Default)]
    struct MockHost {
        steps: VecDeque<Step>,
        pending_input: Option<InputLine>,
        pending_signal: Option<Signal>,
        outputs: Vec<Output>,
        prompts: Vec<PromptConfig>,
    }

    impl MockHost {
        fn with_lines(lines: &[&'static str]) -> Self {
            Self {
                steps: lines.iter().copied().map(Step::Line).collect(),
                ..Self::default()
            }
        }

        fn then_signal(mut self, signal: Signal) -> Self {
            self.steps.push_back(Step::Signal(signal));
            self
        }

        fn styled(&self, style: OutputStyle) -> Vec<&str> {
            self.outputs
                .iter()
                .filter(|o| o.style == style)
                .map(|o| o.text.as_str())
                .collect()
        }
    }

    impl IoHost for MockHost {
        fn wait_for_input(&mut self) -> Result<(), IoError> {
            match self.steps.pop_front() {
                Some(Step::Line(line)) => {
                    self.pending_input = Some(InputLine {
                        line: line.to_string(),
                    })
                }
                Some(Step::Signal(signal)) => self.pending_signal = Some(signal),
                None => return Err(IoError::Io("script exhausted".to_string())),
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
            self.outputs.push(output);
            Ok(())
        }

        fn write_prompt(&mut self, config: PromptConfig) -> Result<(), IoError> {
            self.prompts.push(config);
            Ok(())
        }
    }

    fn core() -> ReplCore {
        ReplCore::new(SplitPolicy::Slash).unwrap()
    }

    #[test]
    fn test_exit_command() {
        let mut core = core();
        let mut host = MockHost::with_lines(&["exit"]);

        let result = core.run(&mut host);

        assert!(matches!(result, Ok(ExitReason::UserExit)));
        assert!(host.outputs.iter().any(|o| o.text.contains("Goodbye")));
    }

    #[test]
    fn test_eof_signal() {
        let mut core = core();
        let mut host = MockHost::default().then_signal(Signal::Eof);

        assert!(matches!(core.run(&mut host), Ok(ExitReason::Eof)));
    }

    #[test]
    fn test_interrupt_continues() {
        let mut core = core();
        let mut host = MockHost::default()
            .then_signal(Signal::Interrupt)
            .then_signal(Signal::Eof);

        assert!(matches!(core.run(&mut host), Ok(ExitReason::Eof)));
        assert!(host.outputs.iter().any(|o| o.text.contains("^C")));
    }

    #[test]
    fn test_notifications_follow_command_output() {
        let mut core = core();
        let mut host = MockHost::with_lines(&[
            "sub scores@home",
            "set scores@home 3",
            "set scores@away 1",
            "exit",
        ]);

        core.run(&mut host).unwrap();

        assert_eq!(
            host.styled(OutputStyle::Notification),
            vec!["scores@home null", "scores@home 3"]
        );

        // The replay is printed right after the subscribe confirmation.
        let texts: Vec<&str> = host.outputs.iter().map(|o| o.text.as_str()).collect();
        let confirm = texts
            .iter()
            .position(|t| t.contains("Subscribed to"))
            .unwrap();
        assert_eq!(texts[confirm + 1], "scores@home null");
    }

    #[test]
    fn test_errors_are_styled_and_loop_continues() {
        let mut core = core();
        let mut host = MockHost::with_lines(&["get", "nonsense", "exit"]);

        assert!(matches!(core.run(&mut host), Ok(ExitReason::UserExit)));
        assert_eq!(host.styled(OutputStyle::Error).len(), 2);
    }

    #[test]
    fn test_prompt_tracks_state() {
        let mut core = core();
        let mut host = MockHost::with_lines(&["set a 1", "sub a", "exit"]);

        core.run(&mut host).unwrap();

        assert_eq!(
            host.prompts.last(),
            Some(&PromptConfig {
                record_count: 1,
                subscription_count: 1
            })
        );
        assert_eq!(
            host.prompts.first(),
            Some(&PromptConfig {
                record_count: 0,
                subscription_count: 0
            })
        );
    }
}
