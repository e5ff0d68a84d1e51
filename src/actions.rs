//! Workflow actions typed into a session as slash commands.
//!
//! Identifiers are validated before anything is sent; a rejected action
//! reaches the user only through the [`Notifier`].

use std::fmt;
use std::rc::Rc;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{info, warn};

use crate::core::session::{SessionCommand, SessionId};
use crate::error::DispatchError;
use crate::transport::{ClientMessage, Transport};

const COMMAND_PREFIX: &str = "/bmad:bmm:workflows:";

static STORY_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]+-[0-9]+(-[a-z0-9-]+)?$").expect("STORY_ID_RE should compile")
});

/// Receives user-facing error messages
pub trait Notifier {
    fn error(&self, message: &str);
}

/// Notifier that only logs
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn error(&self, message: &str) {
        warn!("{}", message);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoryWorkflow {
    StoryContext,
    DevStory,
    CodeReview,
}

impl StoryWorkflow {
    pub const ALL: [StoryWorkflow; 3] = [
        StoryWorkflow::StoryContext,
        StoryWorkflow::DevStory,
        StoryWorkflow::CodeReview,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StoryWorkflow::StoryContext => "story-context",
            StoryWorkflow::DevStory => "dev-story",
            StoryWorkflow::CodeReview => "code-review",
        }
    }
}

impl fmt::Display for StoryWorkflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoryWorkflow {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|workflow| workflow.as_str() == s)
            .ok_or_else(|| DispatchError::WorkflowNotAllowed(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpicWorkflow {
    EpicTechContext,
}

impl EpicWorkflow {
    pub fn as_str(self) -> &'static str {
        match self {
            EpicWorkflow::EpicTechContext => "epic-tech-context",
        }
    }
}

impl fmt::Display for EpicWorkflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EpicWorkflow {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "epic-tech-context" => Ok(EpicWorkflow::EpicTechContext),
            other => Err(DispatchError::WorkflowNotAllowed(other.to_string())),
        }
    }
}

/// `<epic>-<story>` with an optional lowercase slug, e.g. `4-16-session-list`
pub fn validate_story_id(id: &str) -> Result<(), DispatchError> {
    if STORY_ID_RE.is_match(id) {
        Ok(())
    } else {
        Err(DispatchError::InvalidStoryId(id.to_string()))
    }
}

/// Positive decimal integer, digits only
pub fn validate_epic_number(number: &str) -> Result<u32, DispatchError> {
    let invalid = || DispatchError::InvalidEpicNumber(number.to_string());
    if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    match number.parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(invalid()),
    }
}

pub fn story_command(story_id: &str, workflow: StoryWorkflow) -> String {
    format!("{}{} {}\n", COMMAND_PREFIX, workflow, story_id)
}

pub fn epic_command(epic: u32, workflow: EpicWorkflow) -> String {
    format!("{}{} {}\n", COMMAND_PREFIX, workflow, epic)
}

/// Types validated workflow commands into a session
pub struct ActionDispatcher {
    transport: Rc<dyn Transport>,
    notifier: Rc<dyn Notifier>,
}

impl ActionDispatcher {
    pub fn new(transport: Rc<dyn Transport>, notifier: Rc<dyn Notifier>) -> Self {
        Self {
            transport,
            notifier,
        }
    }

    /// Run a story workflow. `workflow` is the raw workflow name as chosen
    /// in the UI.
    pub fn dispatch_story(
        &self,
        session: Option<&SessionId>,
        story_id: &str,
        workflow: &str,
    ) -> Result<ClientMessage, DispatchError> {
        let result = session.ok_or(DispatchError::NoSession).and_then(|session| {
            let workflow = workflow.parse::<StoryWorkflow>()?;
            validate_story_id(story_id)?;
            self.send(session, story_command(story_id, workflow))
        });
        self.report(result)
    }

    pub fn dispatch_epic(
        &self,
        session: Option<&SessionId>,
        epic: &str,
        workflow: &str,
    ) -> Result<ClientMessage, DispatchError> {
        let result = session.ok_or(DispatchError::NoSession).and_then(|session| {
            let workflow = workflow.parse::<EpicWorkflow>()?;
            let epic = validate_epic_number(epic)?;
            self.send(session, epic_command(epic, workflow))
        });
        self.report(result)
    }

    fn send(&self, session: &SessionId, command: String) -> Result<ClientMessage, DispatchError> {
        if !self.transport.is_connected() {
            return Err(DispatchError::Disconnected);
        }
        let message = SessionCommand::Input(command).into_message(session.clone());
        self.transport.send(message.clone());
        Ok(message)
    }

    fn report(
        &self,
        result: Result<ClientMessage, DispatchError>,
    ) -> Result<ClientMessage, DispatchError> {
        match &result {
            Ok(message) => info!("Dispatched workflow to session {}", message.session_id()),
            Err(e) => self.notifier.error(&e.to_string()),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::transport::LocalTransport;

    #[derive(Default)]
    struct RecordingNotifier {
        messages: RefCell<Vec<String>>,
    }

    impl Notifier for RecordingNotifier {
        fn error(&self, message: &str) {
            self.messages.borrow_mut().push(message.to_string());
        }
    }

    fn dispatcher() -> (ActionDispatcher, LocalTransport, Rc<RecordingNotifier>) {
        let transport = LocalTransport::new();
        let notifier = Rc::new(RecordingNotifier::default());
        let dispatcher = ActionDispatcher::new(Rc::new(transport.clone()), notifier.clone());
        (dispatcher, transport, notifier)
    }

    fn input(session: &str, data: &str) -> ClientMessage {
        ClientMessage::Input {
            session_id: SessionId::from(session),
            data: data.to_string(),
        }
    }

    #[test]
    fn test_story_command() {
        let (dispatcher, transport, notifier) = dispatcher();
        let session = SessionId::from("s-1");
        dispatcher
            .dispatch_story(Some(&session), "4-16", "dev-story")
            .unwrap();
        assert_eq!(
            transport.sent(),
            vec![input("s-1", "/bmad:bmm:workflows:dev-story 4-16\n")]
        );
        assert!(notifier.messages.borrow().is_empty());
    }

    #[test]
    fn test_story_id_with_slug() {
        let (dispatcher, transport, _) = dispatcher();
        let session = SessionId::from("s-1");
        dispatcher
            .dispatch_story(Some(&session), "4-16-session-list-hydration", "story-context")
            .unwrap();
        assert_eq!(
            transport.sent(),
            vec![input(
                "s-1",
                "/bmad:bmm:workflows:story-context 4-16-session-list-hydration\n"
            )]
        );
    }

    #[test]
    fn test_invalid_story_id_sends_nothing() {
        let (dispatcher, transport, notifier) = dispatcher();
        let session = SessionId::from("s-1");
        for id in ["abc-16", "4", "4-16-Upper", "4-16; rm -rf /", ""] {
            let err = dispatcher
                .dispatch_story(Some(&session), id, "dev-story")
                .unwrap_err();
            assert_eq!(err, DispatchError::InvalidStoryId(id.to_string()));
        }
        assert_eq!(transport.send_calls(), 0);
        assert_eq!(notifier.messages.borrow().len(), 5);
    }

    #[test]
    fn test_disallowed_workflow_sends_nothing() {
        let (dispatcher, transport, notifier) = dispatcher();
        let session = SessionId::from("s-1");
        let err = dispatcher
            .dispatch_story(Some(&session), "4-16", "rm-rf")
            .unwrap_err();
        assert_eq!(err, DispatchError::WorkflowNotAllowed("rm-rf".to_string()));
        assert!(dispatcher
            .dispatch_epic(Some(&session), "6", "dev-story")
            .is_err());
        assert_eq!(transport.send_calls(), 0);
        assert!(notifier.messages.borrow()[0].contains("rm-rf"));
    }

    #[test]
    fn test_epic_command() {
        let (dispatcher, transport, _) = dispatcher();
        let session = SessionId::from("s-2");
        dispatcher
            .dispatch_epic(Some(&session), "6", "epic-tech-context")
            .unwrap();
        assert_eq!(
            transport.sent(),
            vec![input("s-2", "/bmad:bmm:workflows:epic-tech-context 6\n")]
        );
    }

    #[test]
    fn test_invalid_epic_numbers() {
        for epic in ["0", "-1", "+6", "6a", "", "1.5", "99999999999"] {
            assert_eq!(
                validate_epic_number(epic),
                Err(DispatchError::InvalidEpicNumber(epic.to_string()))
            );
        }
        assert_eq!(validate_epic_number("007"), Ok(7));
    }

    #[test]
    fn test_missing_session_or_connection() {
        let (dispatcher, transport, notifier) = dispatcher();
        assert_eq!(
            dispatcher.dispatch_story(None, "4-16", "dev-story"),
            Err(DispatchError::NoSession)
        );

        transport.set_connected(false);
        let session = SessionId::from("s-1");
        assert_eq!(
            dispatcher.dispatch_epic(Some(&session), "6", "epic-tech-context"),
            Err(DispatchError::Disconnected)
        );
        assert_eq!(transport.send_calls(), 0);
        assert_eq!(notifier.messages.borrow().len(), 2);
    }
}
