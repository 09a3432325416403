//! The interactive session loop.
//!
//! One input line is handled to completion, including any confirmation and
//! command run, before the next one is read. Failures at any step are shown
//! to the user and the loop continues.

use crate::action::executor::{NO_OUTPUT, STDERR_LABEL};
use crate::action::{route, Action, CommandGate, Executor, GateDecision};
use crate::client::banner::print_help;
use crate::client::{paint, Confirmer, InputEvent, LineSource, Spinner};
use crate::history::ConversationHistory;
use crate::llm::OllamaClient;
use crate::prompt;
use anyhow::Result;
use crossterm::style::Color;
use tracing::{debug, info, warn};

/// Whether the loop keeps going after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// What came of one user turn sent to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Turn {
    /// Plain reply to show.
    Reply(String),
    /// The model asked for a command.
    Action(ActionOutcome),
    /// The model call failed.
    Failed(String),
}

/// What came of one requested command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Cancelled { command: String },
    Blocked { command: String, token: String },
    Completed { command: String, output: String },
    Failed { command: String, message: String },
}

/// Built-in commands recognised at the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    Exit,
    Clear,
    Help,
    Status,
}

impl Control {
    fn parse(input: &str) -> Option<Self> {
        match input {
            "exit" | "quit" => Some(Control::Exit),
            "clear" => Some(Control::Clear),
            "help" => Some(Control::Help),
            "status" => Some(Control::Status),
            _ => None,
        }
    }
}

/// A conversation with one model.
pub struct Session<C> {
    llm: OllamaClient,
    history: ConversationHistory,
    pre_prompt: String,
    gate: CommandGate,
    executor: Executor,
    confirmer: C,
    show_spinner: bool,
}

impl<C: Confirmer> Session<C> {
    pub fn new(
        llm: OllamaClient,
        pre_prompt: String,
        gate: CommandGate,
        executor: Executor,
        confirmer: C,
    ) -> Self {
        Self {
            llm,
            history: ConversationHistory::new(),
            pre_prompt,
            gate,
            executor,
            confirmer,
            show_spinner: false,
        }
    }

    /// Draw a spinner during model calls.
    pub fn with_spinner(mut self, enabled: bool) -> Self {
        self.show_spinner = enabled;
        self
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    /// Read and handle lines until `exit`/`quit` or end of input.
    pub async fn run<L: LineSource>(&mut self, lines: &mut L) -> Result<()> {
        println!("{}", paint(format!(" {} CLI started!", self.llm.model()), Color::Green));
        loop {
            match lines.next_line()? {
                InputEvent::Line(line) => {
                    if self.process_line(&line).await == Flow::Exit {
                        break;
                    }
                }
                InputEvent::Interrupted => {
                    println!(
                        "{}",
                        paint("\nInterruption detected. Type \"exit\" to quit properly.", Color::Yellow)
                    );
                }
                InputEvent::Eof => {
                    debug!("Input closed");
                    break;
                }
            }
        }
        info!("Session ended");
        Ok(())
    }

    /// Handle one line: a built-in command or a turn for the model.
    pub async fn process_line(&mut self, line: &str) -> Flow {
        let input = line.trim();
        if input.is_empty() {
            return Flow::Continue;
        }

        match Control::parse(input) {
            Some(Control::Exit) => return Flow::Exit,
            Some(Control::Clear) => {
                self.history.clear();
                println!("{}", paint("History cleared", Color::Green));
            }
            Some(Control::Help) => print_help(),
            Some(Control::Status) => self.print_status().await,
            None => {
                let turn = self.ask(input).await;
                print_turn(&turn);
            }
        }
        Flow::Continue
    }

    /// Send one user turn and act on the reply.
    pub async fn ask(&mut self, input: &str) -> Turn {
        let prompt = prompt::compose(&self.pre_prompt, &self.history, input);

        let spinner = Spinner::start(self.show_spinner);
        let result = self.llm.generate(&prompt).await;
        spinner.stop().await;

        let reply = match result {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Model request failed: {}", e);
                return Turn::Failed(e.to_string());
            }
        };

        self.history.record_exchange(input, &reply);

        match route(&reply) {
            Action::Display(text) => Turn::Reply(text),
            Action::Execute(command) => Turn::Action(self.run_action(command).await),
        }
    }

    /// Confirm, gate, then execute one command.
    pub async fn run_action(&mut self, command: String) -> ActionOutcome {
        match self.confirmer.confirm(&command) {
            Ok(true) => {}
            Ok(false) => return ActionOutcome::Cancelled { command },
            Err(e) => {
                return ActionOutcome::Failed {
                    command,
                    message: format!("confirmation failed: {:#}", e),
                }
            }
        }

        if let GateDecision::Blocked { token, .. } = self.gate.check(&command) {
            warn!("Blocked command {:?} (matched {:?})", command, token);
            return ActionOutcome::Blocked { command, token };
        }

        info!("Running confirmed command: {}", command);
        match self.executor.execute(&command).await {
            Ok(output) => ActionOutcome::Completed { command, output },
            Err(e) => ActionOutcome::Failed {
                command,
                message: e.to_string(),
            },
        }
    }

    async fn print_status(&self) {
        println!("{}", paint("Checking connection...", Color::Blue));
        match self.llm.list_models().await {
            Ok(models) => {
                let models = format!("Connection OK - Models: {}", models.join(", "));
                println!("{}", paint(models, Color::Green));
            }
            Err(e) => {
                debug!("Status check failed: {}", e);
                println!("{}", paint("Connection to Ollama failed", Color::Red));
            }
        }
    }
}

fn print_turn(turn: &Turn) {
    match turn {
        Turn::Reply(text) => println!("{}", paint(format!("\n {}\n", text), Color::Cyan)),
        Turn::Failed(message) => println!("{}", paint(format!("Error: {}", message), Color::Red)),
        Turn::Action(outcome) => print_outcome(outcome),
    }
}

fn print_outcome(outcome: &ActionOutcome) {
    match outcome {
        ActionOutcome::Cancelled { .. } => {
            println!("{}", paint("Command execution cancelled", Color::Yellow));
        }
        ActionOutcome::Blocked { command, .. } => {
            println!(
                "{}",
                paint(format!("Command blocked for security reasons: {}", command), Color::Red)
            );
        }
        ActionOutcome::Failed { message, .. } => {
            println!("{}", paint(format!("Execution error: {}", message), Color::Red));
        }
        ActionOutcome::Completed { output, .. } => {
            println!();
            for line in output.lines() {
                if line == STDERR_LABEL {
                    println!("{}", paint(line, Color::Yellow));
                } else if line == NO_OUTPUT {
                    println!("{}", paint(line, Color::DarkGrey));
                } else {
                    println!("{}", paint(line, Color::Blue));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::SamplingOptions;
    use std::collections::VecDeque;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct StubConfirmer {
        answer: bool,
        asked: Vec<String>,
    }

    impl Confirmer for StubConfirmer {
        fn confirm(&mut self, command: &str) -> Result<bool> {
            self.asked.push(command.to_string());
            Ok(self.answer)
        }
    }

    struct ScriptedLines(VecDeque<InputEvent>);

    impl LineSource for ScriptedLines {
        fn next_line(&mut self) -> Result<InputEvent> {
            Ok(self.0.pop_front().unwrap_or(InputEvent::Eof))
        }
    }

    async fn server_replying(reply: &str) -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "response": reply, "done": true })),
            )
            .mount(&mock_server)
            .await;
        mock_server
    }

    fn session(server: &MockServer, answer: bool) -> Session<StubConfirmer> {
        let llm = OllamaClient::new(
            server.uri(),
            "mistral",
            SamplingOptions::default(),
            Duration::from_secs(5),
        )
        .unwrap();
        Session::new(
            llm,
            "PRE".to_string(),
            CommandGate::default(),
            Executor::default(),
            StubConfirmer {
                answer,
                asked: Vec::new(),
            },
        )
    }

    #[tokio::test]
    async fn test_plain_reply_is_recorded() {
        let server = server_replying("Hello there").await;
        let mut session = session(&server, true);

        assert_eq!(session.ask("hi").await, Turn::Reply("Hello there".to_string()));
        assert_eq!(session.history().formatted(), "USER: hi\nASSISTANT: Hello there");
        assert!(session.confirmer.asked.is_empty());
    }

    #[tokio::test]
    async fn test_confirmed_action_runs() {
        let server = server_replying("ACTION: `echo hi`").await;
        let mut session = session(&server, true);

        assert_eq!(
            session.ask("say hi").await,
            Turn::Action(ActionOutcome::Completed {
                command: "echo hi".to_string(),
                output: "hi\n".to_string(),
            })
        );
        assert_eq!(session.confirmer.asked, vec!["echo hi".to_string()]);
    }

    #[tokio::test]
    async fn test_declined_action_does_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("marker");
        let reply = format!("ACTION: touch {}", marker.display());
        let server = server_replying(&reply).await;
        let mut session = session(&server, false);

        let turn = session.ask("make a file").await;
        assert!(matches!(turn, Turn::Action(ActionOutcome::Cancelled { .. })));
        assert!(!marker.exists());
    }

    #[tokio::test]
    async fn test_blocked_action_never_executes() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("marker");
        // "rm" anywhere in the command blocks it.
        let reply = format!("ACTION: ```echo rm > {}``` ", marker.display());
        let server = server_replying(&reply).await;
        let mut session = session(&server, true);

        match session.ask("do it").await {
            Turn::Action(ActionOutcome::Blocked { command, token }) => {
                assert_eq!(command, format!("echo rm > {}", marker.display()));
                assert_eq!(token, "rm");
            }
            other => panic!("expected Blocked, got {other:?}"),
        }
        assert!(!marker.exists());
    }

    #[tokio::test]
    async fn test_failed_action_is_reported() {
        let server = server_replying("ACTION: exit 2").await;
        let mut session = session(&server, true);

        match session.ask("fail").await {
            Turn::Action(ActionOutcome::Failed { command, message }) => {
                assert_eq!(command, "exit 2");
                assert!(message.contains("exit status: 2"), "{}", message);
            }
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_action_is_displayed() {
        let server = server_replying("ACTION:").await;
        let mut session = session(&server, true);

        assert_eq!(session.ask("hm").await, Turn::Reply(String::new()));
        assert!(session.confirmer.asked.is_empty());
    }

    #[tokio::test]
    async fn test_model_error_is_not_recorded() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&mock_server)
            .await;
        let mut session = session(&mock_server, true);

        match session.ask("hi").await {
            Turn::Failed(message) => assert!(message.contains("500"), "{}", message),
            other => panic!("expected Failed, got {other:?}"),
        }
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn test_control_commands() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "response": "ok" })))
            .expect(1)
            .mount(&mock_server)
            .await;
        let mut session = session(&mock_server, true);

        assert_eq!(session.process_line("   ").await, Flow::Continue);
        assert_eq!(session.process_line("hello").await, Flow::Continue);
        assert_eq!(session.history().len(), 2);
        assert_eq!(session.process_line("clear").await, Flow::Continue);
        assert!(session.history().is_empty());
        assert_eq!(session.process_line("help").await, Flow::Continue);
        assert_eq!(session.process_line(" quit ").await, Flow::Exit);
        assert_eq!(session.process_line("exit").await, Flow::Exit);
    }

    #[tokio::test]
    async fn test_run_stops_at_exit() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "response": "ok" })))
            .expect(1)
            .mount(&mock_server)
            .await;
        let mut session = session(&mock_server, true);

        let mut lines = ScriptedLines(VecDeque::from([
            InputEvent::Line("first".to_string()),
            InputEvent::Interrupted,
            InputEvent::Line("exit".to_string()),
            InputEvent::Line("never sent".to_string()),
        ]));
        session.run(&mut lines).await.unwrap();
        assert_eq!(session.history().len(), 2);
        assert_eq!(lines.0.len(), 1);
    }

    #[test]
    fn test_control_parse() {
        assert_eq!(Control::parse("quit"), Some(Control::Exit));
        assert_eq!(Control::parse("status"), Some(Control::Status));
        assert_eq!(Control::parse("Clear"), None);
        assert_eq!(Control::parse("list files"), None);
    }
}
