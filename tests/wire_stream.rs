//! Outbound messages as they appear on a JSON-lines stream.

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use bmad_terminal::actions::{ActionDispatcher, LogNotifier};
use bmad_terminal::core::{
    ContainerSize, ControllerOptions, SessionId, SessionProps, SessionStatus,
    TerminalSessionController, VtEmulatorFactory,
};
use bmad_terminal::transport::{LocalTransport, Transport};

#[derive(Clone, Default)]
struct SharedBuf(Rc<RefCell<Vec<u8>>>);

impl SharedBuf {
    fn lines(&self) -> Vec<serde_json::Value> {
        String::from_utf8(self.0.borrow().clone())
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_dispatch_writes_one_input_line() {
    let buf = SharedBuf::default();
    let transport = LocalTransport::with_writer(buf.clone());
    let dispatcher = ActionDispatcher::new(Rc::new(transport.clone()), Rc::new(LogNotifier));

    dispatcher
        .dispatch_story(Some(&SessionId::from("s-1")), "4-16", "code-review")
        .unwrap();
    assert!(dispatcher
        .dispatch_story(Some(&SessionId::from("s-1")), "4-16", "rm-rf")
        .is_err());
    transport.flush().unwrap();

    assert_eq!(
        buf.lines(),
        vec![serde_json::json!({
            "type": "terminal.input",
            "sessionId": "s-1",
            "data": "/bmad:bmm:workflows:code-review 4-16\n",
        })]
    );
}

#[test]
fn test_controller_lifecycle_on_the_wire() {
    let buf = SharedBuf::default();
    let transport = LocalTransport::with_writer(buf.clone());
    let controller = TerminalSessionController::new(
        Rc::new(transport.clone()) as Rc<dyn Transport>,
        Box::new(VtEmulatorFactory),
        ControllerOptions::default(),
        SessionProps::new("s-7", SessionStatus::Active),
        ContainerSize::new(800.0, 400.0),
    );
    transport
        .deliver_line(r#"{"type":"terminal.output","sessionId":"s-7","data":"\u001b[6n"}"#)
        .unwrap();
    transport
        .deliver_line(r#"{"type":"terminal.exit","sessionId":"s-7"}"#)
        .unwrap();
    assert_eq!(controller.status(), SessionStatus::Error);
    controller.unmount();

    let types: Vec<String> = buf
        .lines()
        .iter()
        .map(|line| line["type"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(
        types,
        vec![
            "terminal.resize",
            "session.attach",
            "terminal.input",
            "session.detach"
        ]
    );
    let lines = buf.lines();
    assert_eq!(lines[0]["sessionId"], "s-7");
    assert!(lines[0]["cols"].as_u64().unwrap() > 0);
    assert_eq!(lines[2]["data"], "\u{1b}[1;1R");
}
