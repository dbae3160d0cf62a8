use std::collections::HashMap;
use std::sync::Arc;

use crate::command::{CommandSender, VisibilityCommand};

/// A write-only switch for one layer.
///
/// Setting it queues a [`VisibilityCommand`]. It never touches the layer
/// itself; the render loop applies the command on its next tick.
///
/// [`VisibilityCommand`]: struct.VisibilityCommand.html
#[derive(Debug, Clone)]
pub struct VisibilityHandle {
    name: Arc<str>,
    sender: CommandSender,
}

impl VisibilityHandle {
    pub fn new<N: Into<Arc<str>>>(name: N, sender: CommandSender) -> Self {
        Self {
            name: name.into(),
            sender,
        }
    }

    pub fn set(&self, visible: bool) {
        self.sender
            .push(VisibilityCommand::new(Arc::clone(&self.name), visible));
    }

    pub fn show(&self) {
        self.set(true);
    }

    pub fn hide(&self) {
        self.set(false);
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// One [`VisibilityHandle`] per layer, in layer order.
///
/// [`VisibilityHandle`]: struct.VisibilityHandle.html
#[derive(Debug, Clone)]
pub struct VisibilityHandles {
    handles: Vec<VisibilityHandle>,
    index: HashMap<Arc<str>, usize>,
}

impl VisibilityHandles {
    pub fn new<I, N>(names: I, sender: &CommandSender) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Arc<str>>,
    {
        let mut handles = Vec::new();
        let mut index = HashMap::new();

        for name in names {
            let name: Arc<str> = name.into();
            if index.contains_key(&name) {
                continue;
            }
            index.insert(Arc::clone(&name), handles.len());
            handles.push(VisibilityHandle::new(name, sender.clone()));
        }

        Self { handles, index }
    }

    pub fn get(&self, name: &str) -> Option<&VisibilityHandle> {
        self.index.get(name).map(|&i| &self.handles[i])
    }

    /// Sets the layer called `name`. Returns `false`, and queues nothing, if
    /// there is no handle with that name.
    pub fn set(&self, name: &str, visible: bool) -> bool {
        match self.get(name) {
            Some(handle) => {
                handle.set(visible);
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &VisibilityHandle> {
        self.handles.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handles.iter().map(VisibilityHandle::name)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandChannel;

    #[test]
    fn setting_a_handle_pushes_a_command() {
        let channel = CommandChannel::new();
        let handles = VisibilityHandles::new(["base", "seg1", "seg2"], &channel.sender());

        handles.get("seg1").unwrap().show();
        handles.get("seg2").unwrap().set(false);
        assert!(handles.set("seg1", false));

        assert_eq!(
            channel.drain(),
            vec![
                VisibilityCommand::show("seg1"),
                VisibilityCommand::hide("seg2"),
                VisibilityCommand::hide("seg1"),
            ]
        );
    }

    #[test]
    fn unknown_names_queue_nothing() {
        let channel = CommandChannel::new();
        let handles = VisibilityHandles::new(["base"], &channel.sender());

        assert!(handles.get("missing").is_none());
        assert!(!handles.set("missing", true));
        assert!(channel.is_empty());
    }

    #[test]
    fn names_keep_layer_order() {
        let channel = CommandChannel::new();
        let handles = VisibilityHandles::new(["base", "b", "a", "b"], &channel.sender());

        assert_eq!(handles.len(), 3);
        assert!(!handles.is_empty());
        assert_eq!(handles.names().collect::<Vec<_>>(), vec!["base", "b", "a"]);
    }

    #[test]
    fn iterating_handles_drives_every_layer() {
        let channel = CommandChannel::new();
        let handles = VisibilityHandles::new(["seg1", "seg2"], &channel.sender());

        for handle in handles.iter() {
            handle.hide();
        }

        assert_eq!(
            channel.drain(),
            vec![VisibilityCommand::hide("seg1"), VisibilityCommand::hide("seg2")]
        );
    }

    #[test]
    fn no_layers_no_handles() {
        let channel = CommandChannel::new();
        let handles = VisibilityHandles::new(Vec::<&str>::new(), &channel.sender());

        assert!(handles.is_empty());
        assert_eq!(handles.iter().count(), 0);
    }
}
