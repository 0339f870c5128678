use rabbithole::slug::find_node_by_slug;
use rabbithole::{build_history, NodeId};

use crate::commands::{parse_command, Command, HELP_TEXT};
use crate::controller::{ChatController, SelectionDraft};
use crate::render::{render_branch, render_history, render_sessions, render_tree};

/// REPL state: the controller plus the exit flag.
pub struct App {
    controller: ChatController,
    pub should_exit: bool,
}

impl App {
    pub fn new(controller: ChatController) -> Self {
        Self {
            controller,
            should_exit: false,
        }
    }

    pub fn controller(&self) -> &ChatController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut ChatController {
        &mut self.controller
    }

    /// Handles one input line and returns the text to print.
    ///
    /// Prompts block until the model has answered.
    pub fn handle_line(&mut self, line: &str) -> String {
        let Some(command) = parse_command(line) else {
            return String::new();
        };

        match command {
            Command::Help => HELP_TEXT.to_string(),
            Command::New => {
                self.controller.new_session();
                self.branch_view()
            }
            Command::Sessions => render_sessions(self.controller.state()),
            Command::Switch(index) => match self.session_at(index) {
                Some(session_id) => {
                    self.controller.switch_session(&session_id);
                    self.branch_view()
                }
                None => format!("No session {index}."),
            },
            Command::Delete(index) => match self.session_at(index) {
                Some(session_id) => {
                    self.controller.delete_session(&session_id);
                    render_sessions(self.controller.state())
                }
                None => format!("No session {index}."),
            },
            Command::Tree => self.tree_view(),
            Command::Focus(slug) => match self.node_named(&slug) {
                Some(node_id) => {
                    self.controller.focus(&node_id);
                    self.branch_view()
                }
                None => format!("No node named '{slug}'."),
            },
            Command::Current(slug) => match self.node_named(&slug) {
                Some(node_id)
                    if self.controller.state().active_branch_node_ids.contains(&node_id) =>
                {
                    self.controller.set_current_node(&node_id);
                    self.branch_view()
                }
                Some(_) => format!("'{slug}' is not on the active branch; use /focus."),
                None => format!("No node named '{slug}'."),
            },
            Command::Branch {
                message,
                start,
                end,
                prompt,
            } => self.branch(message, start, end, &prompt),
            Command::Header(text) => {
                self.controller.set_header(&text);
                self.tree_view()
            }
            Command::History => {
                let state = self.controller.state();
                render_history(&build_history(state, &state.active_branch_node_ids))
            }
            Command::Quit => {
                self.controller.shutdown();
                self.should_exit = true;
                String::new()
            }
            Command::Prompt(text) => {
                if self.controller.send_prompt(&text).is_none() {
                    return "Nothing to send.".to_string();
                }
                self.controller.wait_idle();
                self.branch_view()
            }
            Command::Usage(usage) => format!("Usage: {usage}"),
            Command::Unknown(command) => format!("Unknown command {command}. Try /help."),
        }
    }

    fn branch(&mut self, message: usize, start: usize, end: usize, prompt: &str) -> String {
        let Some(draft) = self.selection_draft(message, start, end) else {
            return format!("No message {message} in the current node.");
        };
        if self.controller.send_branch_prompt(&draft, prompt).is_none() {
            return "Cannot branch there: the span is empty, out of range, or overlaps an existing branch."
                .to_string();
        }
        self.controller.wait_idle();
        self.branch_view()
    }

    fn selection_draft(&self, message: usize, start: usize, end: usize) -> Option<SelectionDraft> {
        let node = self.controller.state().current_node()?;
        let message = node.messages.get(message.checked_sub(1)?)?;
        Some(SelectionDraft {
            node_id: node.id.clone(),
            message_id: message.id.clone(),
            start_offset: start,
            end_offset: end,
        })
    }

    fn node_named(&self, slug: &str) -> Option<NodeId> {
        self.controller
            .state()
            .active_session()
            .and_then(|session| find_node_by_slug(session, slug))
    }

    fn session_at(&self, index: usize) -> Option<rabbithole::SessionId> {
        self.controller
            .state()
            .sessions_by_creation()
            .get(index.checked_sub(1)?)
            .map(|session| session.id.clone())
    }

    fn loading_nodes(&self) -> std::collections::HashSet<NodeId> {
        self.controller
            .state()
            .active_session()
            .map(|session| {
                session
                    .nodes
                    .keys()
                    .filter(|node_id| self.controller.is_loading(node_id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn branch_view(&self) -> String {
        let mut out = render_branch(self.controller.state(), &self.loading_nodes());
        if let Some(error) = self.controller.last_error() {
            out.push_str(&format!("(error: {error})\n"));
        }
        out
    }

    fn tree_view(&self) -> String {
        render_tree(self.controller.state(), &self.loading_nodes())
    }
}
