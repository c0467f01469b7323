use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Result;
use url::Url;

use cyclops_shell::bridge::SessionBridge;
use cyclops_shell::config::Banners;
use cyclops_shell::event::BridgeEvent;
use cyclops_shell::exec::{ExecTarget, OutboundCommand, Transport};
use cyclops_shell::input::KeyInput;
use cyclops_shell::surface::VirtualSurface;

/// What a [`RecordingTransport`] saw; shared so it outlives the bridge.
#[derive(Debug, Default)]
pub struct TransportLog {
    pub open: bool,
    pub opened: Vec<Url>,
    pub sent: Vec<OutboundCommand>,
    pub closes: usize,
}

#[derive(Clone, Default)]
pub struct RecordingTransport {
    pub log: Rc<RefCell<TransportLog>>,
}

impl Transport for RecordingTransport {
    fn open(&mut self, endpoint: &Url) -> Result<()> {
        self.log.borrow_mut().opened.push(endpoint.clone());
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.log.borrow().open
    }

    fn send(&mut self, command: OutboundCommand) -> Result<()> {
        self.log.borrow_mut().sent.push(command);
        Ok(())
    }

    fn close(&mut self) {
        let mut log = self.log.borrow_mut();
        log.open = false;
        log.closes += 1;
    }
}

pub type TestBridge = SessionBridge<RecordingTransport, VirtualSurface>;

/// A mounted bridge whose transport has not opened yet.
pub fn mounted() -> (TestBridge, Rc<RefCell<TransportLog>>) {
    let transport = RecordingTransport::default();
    let log = Rc::clone(&transport.log);
    let target = ExecTarget::new("cyclops", "demo-5b7c9", "nginx").unwrap();
    let endpoint = Url::parse("ws://localhost:8080/exec/cyclops/demo-5b7c9/nginx").unwrap();

    let mut bridge = SessionBridge::new(
        target,
        endpoint,
        transport,
        VirtualSurface::new(24, 80),
        Banners::default(),
    );
    bridge.mount().unwrap();
    (bridge, log)
}

/// A bridge with an open transport.
pub fn connected() -> (TestBridge, Rc<RefCell<TransportLog>>) {
    let (mut bridge, log) = mounted();
    log.borrow_mut().open = true;
    bridge.handle(BridgeEvent::TransportOpen).unwrap();
    (bridge, log)
}

/// Deliver each character as its own keystroke.
pub fn type_keys(bridge: &mut TestBridge, text: &str) {
    for c in text.chars() {
        bridge
            .handle(BridgeEvent::Key(KeyInput::Data(c.to_string())))
            .unwrap();
    }
}
