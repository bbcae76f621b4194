use crate::draw::messages::Command;
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};

/// Producer side of the command bus. Cheap to clone and `Send`, so control
/// surfaces on other threads can hold their own copy.
#[derive(Debug, Clone)]
pub struct CommandSender {
    tx: Sender<Command>,
}

impl CommandSender {
    /// Enqueues without blocking. Returns `false` only if the bus is gone.
    pub fn submit(&self, command: Command) -> bool {
        tracing::trace!(command = %command, "command submitted");
        self.tx.send(command).is_ok()
    }

    /// Enqueues a command given in its textual form. Unknown verbs and
    /// malformed arguments are logged and dropped.
    pub fn submit_wire(&self, wire: &str) -> bool {
        match Command::parse(wire) {
            Ok(Some(command)) => self.submit(command),
            Ok(None) => {
                tracing::debug!(wire, "ignoring unknown command verb");
                false
            }
            Err(err) => {
                tracing::warn!(wire, ?err, "dropping malformed command");
                false
            }
        }
    }
}

/// Single-consumer end of the command bus, owned by the engine runtime.
#[derive(Debug)]
pub struct CommandBus {
    tx: Sender<Command>,
    rx: Receiver<Command>,
}

impl Default for CommandBus {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandBus {
    pub fn new() -> Self {
        let (tx, rx) = channel();
        Self { tx, rx }
    }

    pub fn sender(&self) -> CommandSender {
        CommandSender {
            tx: self.tx.clone(),
        }
    }

    /// Takes everything queued right now, in FIFO order. Commands pushed
    /// while draining are either included or left for the next drain.
    pub fn drain(&self) -> Vec<Command> {
        let mut drained = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(command) => drained.push(command),
                Err(TryRecvError::Empty) => break,
                // The bus keeps its own sender alive, so this cannot happen.
                Err(TryRecvError::Disconnected) => break,
            }
        }
        drained
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::model::Mode;

    #[test]
    fn drain_returns_commands_in_submission_order() {
        let bus = CommandBus::new();
        let sender = bus.sender();
        sender.submit(Command::Width(3));
        sender.submit(Command::Mode(Mode::Arrow));
        sender.submit(Command::Undo);

        assert_eq!(
            bus.drain(),
            vec![Command::Width(3), Command::Mode(Mode::Arrow), Command::Undo]
        );
        assert!(bus.drain().is_empty());
    }

    #[test]
    fn wire_submission_drops_bad_commands() {
        let bus = CommandBus::new();
        let sender = bus.sender();
        assert!(sender.submit_wire("alpha 40"));
        assert!(!sender.submit_wire("alpha lots"));
        assert!(!sender.submit_wire("teleport 1 2"));

        assert_eq!(bus.drain(), vec![Command::Alpha(40)]);
    }

    #[test]
    fn producers_on_other_threads_never_lose_messages() {
        let bus = CommandBus::new();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let sender = bus.sender();
                std::thread::spawn(move || {
                    for width in 1..=10 {
                        sender.submit(Command::Width(width));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let drained = bus.drain();
        assert_eq!(drained.len(), 40);
    }
}
