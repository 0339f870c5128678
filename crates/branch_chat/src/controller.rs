use std::collections::{HashSet, VecDeque};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use chat_provider::{CompletionError, CompletionProvider, CompletionRequest, HistoryLine};
use rabbithole::offset::canonical_selection;
use rabbithole::{
    branch_note, build_session_history, hydrate, save_state, BranchingState, ChildNodeRequest,
    CompletionOutcome, Debouncer, Message, MessageId, NodeId, SessionId,
};
use state_store::StateStore;
use tracing::{debug, warn};

/// A span picked on the rendered text of one message.
///
/// Offsets are in rendered coordinates; they are translated to canonical
/// offsets against the message's highlights before the fork is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionDraft {
    pub node_id: NodeId,
    pub message_id: MessageId,
    pub start_offset: usize,
    pub end_offset: usize,
}

/// Where a completion result must land once it arrives.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RequestTarget {
    session_id: SessionId,
    node_id: NodeId,
}

struct CompletedRequest {
    target: RequestTarget,
    outcome: CompletionOutcome,
}

#[derive(Default)]
struct CompletionQueue {
    items: Mutex<VecDeque<CompletedRequest>>,
    ready: Condvar,
}

impl CompletionQueue {
    fn push(&self, completed: CompletedRequest) {
        lock_unpoisoned(&self.items).push_back(completed);
        self.ready.notify_all();
    }

    fn pop(&self) -> Option<CompletedRequest> {
        lock_unpoisoned(&self.items).pop_front()
    }

    /// Blocks until at least one item is queued or `timeout` elapses.
    fn wait_for_item(&self, timeout: Duration) {
        let items = lock_unpoisoned(&self.items);
        let _ = self
            .ready
            .wait_timeout_while(items, timeout, |items| items.is_empty());
    }
}

/// Owns the live conversation state and everything that feeds it: the
/// completion provider, in-flight requests, and debounced persistence.
///
/// All state transitions happen on the thread that owns the controller;
/// worker threads only run provider calls and queue their outcomes.
pub struct ChatController {
    state: BranchingState,
    loading: HashSet<NodeId>,
    provider: Arc<dyn CompletionProvider>,
    store: Arc<dyn StateStore>,
    debouncer: Debouncer,
    version: u64,
    saved_version: u64,
    last_error: Option<String>,
    queue: Arc<CompletionQueue>,
    workers: Vec<JoinHandle<()>>,
    next_request_id: u64,
}

impl ChatController {
    /// Hydrates state from `store`; a missing or corrupt record starts fresh.
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        store: Arc<dyn StateStore>,
        persist_debounce: Duration,
    ) -> Self {
        let state = hydrate(store.as_ref());
        Self {
            state,
            loading: HashSet::new(),
            provider,
            store,
            debouncer: Debouncer::new(persist_debounce),
            version: 0,
            saved_version: 0,
            last_error: None,
            queue: Arc::new(CompletionQueue::default()),
            workers: Vec::new(),
            next_request_id: 1,
        }
    }

    pub fn state(&self) -> &BranchingState {
        &self.state
    }

    /// Incremented on every state change; persisted versions trail it.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn saved_version(&self) -> u64 {
        self.saved_version
    }

    pub fn is_loading(&self, node_id: &NodeId) -> bool {
        self.loading.contains(node_id)
    }

    /// Time left until the pending version is due to be written, if any.
    pub fn flush_due_in(&self, now: Instant) -> Option<Duration> {
        self.debouncer
            .deadline()
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    pub fn has_pending_requests(&self) -> bool {
        !self.loading.is_empty()
    }

    /// Most recent completion failure, cleared by the next successful send.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn new_session(&mut self) -> SessionId {
        let (next, session_id) = self.state.create_session();
        self.commit(next);
        session_id
    }

    pub fn switch_session(&mut self, session_id: &SessionId) {
        let next = self.state.set_active_session(session_id);
        self.commit(next);
    }

    pub fn delete_session(&mut self, session_id: &SessionId) {
        let next = self.state.delete_session(session_id);
        self.commit(next);
    }

    pub fn focus(&mut self, node_id: &NodeId) {
        let next = self.state.focus_node(node_id);
        self.commit(next);
    }

    pub fn set_current_node(&mut self, node_id: &NodeId) {
        let next = self.state.set_current_node_id(node_id);
        self.commit(next);
    }

    /// Sets the current node's header.
    pub fn set_header(&mut self, header: &str) {
        let Some(node_id) = self.state.current_node_id.clone() else {
            return;
        };
        let next = self.state.set_node_header(&node_id, Some(header));
        self.commit(next);
    }

    /// Appends `text` to the current node and requests the model's reply.
    ///
    /// When the current node is not the tail of the active branch, the branch
    /// is first cut back to end at it.
    ///
    /// Returns the node awaiting the reply, or `None` when the prompt is blank,
    /// there is no current node, or that node is already awaiting one.
    pub fn send_prompt(&mut self, text: &str) -> Option<NodeId> {
        let prompt = text.trim();
        if prompt.is_empty() {
            return None;
        }
        let node_id = self.state.current_node_id.clone()?;
        if self.state.active_session()?.node(&node_id).is_none() {
            return None;
        }
        if self.is_loading(&node_id) {
            debug!(node = %node_id, "send_prompt: node is already awaiting a reply");
            return None;
        }

        // The context is the path ending at the prompted node, never its descendants.
        if self.state.active_branch_node_ids.last() != Some(&node_id) {
            let next = self.state.focus_node(&node_id);
            self.commit(next);
        }
        let session = self.state.active_session()?;
        let history = build_session_history(session, &self.state.active_branch_node_ids);
        let target = RequestTarget {
            session_id: session.id.clone(),
            node_id: node_id.clone(),
        };

        let next = self.state.append_message(&node_id, Message::user(prompt));
        self.commit(next);
        self.last_error = None;
        self.dispatch(target, CompletionRequest::new(history, prompt));
        Some(node_id)
    }

    /// Forks a child from `draft` with `prompt` as its first message and
    /// requests the model's reply for it.
    ///
    /// Returns the new child, or `None` when the prompt is blank or the fork
    /// is rejected.
    pub fn send_branch_prompt(&mut self, draft: &SelectionDraft, prompt: &str) -> Option<NodeId> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return None;
        }
        let session = self.state.active_session()?;
        let message = session.node(&draft.node_id)?.message(&draft.message_id)?;
        let selection = canonical_selection(
            &message.text,
            draft.start_offset,
            draft.end_offset,
            &message.highlights,
        );
        let note_text = selection.text.clone();

        let request = ChildNodeRequest::new(draft.node_id.clone(), draft.message_id.clone(), selection)
            .with_initial_message(Message::user(prompt));
        let (next, child_id) = self.state.create_child_node(request);
        let child_id = child_id?;
        self.commit(next);

        let session = self.state.active_session()?;
        let parent_branch = self
            .state
            .active_branch_node_ids
            .split_last()
            .map(|(_, parents)| parents)
            .unwrap_or_default();
        let mut history = build_session_history(session, parent_branch);
        history.push(HistoryLine::user(branch_note(&note_text)));
        let target = RequestTarget {
            session_id: session.id.clone(),
            node_id: child_id.clone(),
        };

        self.last_error = None;
        self.dispatch(target, CompletionRequest::new(history, prompt));
        Some(child_id)
    }

    /// Applies every completion that has arrived; returns how many were applied.
    pub fn drain_completions(&mut self) -> usize {
        let mut drained = 0usize;
        while let Some(completed) = self.queue.pop() {
            self.apply_completed(completed);
            drained += 1;
        }
        self.reap_workers();
        drained
    }

    /// Blocks until every in-flight request has been applied.
    pub fn wait_idle(&mut self) {
        while self.has_pending_requests() {
            self.queue.wait_for_item(Duration::from_millis(50));
            self.drain_completions();
        }
    }

    /// Applies arrived completions and flushes state once the quiet period
    /// has elapsed. Returns the version written, if any.
    pub fn tick(&mut self, now: Instant) -> Option<u64> {
        self.drain_completions();
        let version = self.debouncer.poll(now)?;
        self.flush(version)
    }

    /// Applies arrived completions and writes any pending version immediately.
    pub fn shutdown(&mut self) -> Option<u64> {
        self.drain_completions();
        let version = self.debouncer.take_pending()?;
        self.flush(version)
    }

    fn commit(&mut self, next: BranchingState) {
        if next == self.state {
            return;
        }
        self.state = next;
        self.version += 1;
        self.debouncer.schedule(self.version, Instant::now());
    }

    fn flush(&mut self, version: u64) -> Option<u64> {
        match save_state(self.store.as_ref(), &self.state) {
            Ok(()) => {
                self.saved_version = version;
                Some(version)
            }
            Err(error) => {
                warn!(%error, version, "failed to persist state");
                None
            }
        }
    }

    fn dispatch(&mut self, target: RequestTarget, request: CompletionRequest) {
        let request_id = self.next_request_id;
        self.next_request_id += 1;
        self.loading.insert(target.node_id.clone());

        let provider = Arc::clone(&self.provider);
        let queue = Arc::clone(&self.queue);
        let worker_target = target.clone();
        let spawned = thread::Builder::new()
            .name(format!("branch-chat-request-{request_id}"))
            .spawn(move || {
                let outcome = catch_unwind(AssertUnwindSafe(|| provider.complete(&request)))
                    .unwrap_or_else(|_| {
                        Err(CompletionError::Provider(
                            "Completion provider panicked".to_string(),
                        ))
                    });
                queue.push(CompletedRequest {
                    target: worker_target,
                    outcome,
                });
            });

        match spawned {
            Ok(handle) => self.workers.push(handle),
            Err(error) => self.apply_completed(CompletedRequest {
                target,
                outcome: Err(CompletionError::Provider(format!(
                    "Failed to spawn request worker: {error}"
                ))),
            }),
        }
    }

    fn apply_completed(&mut self, completed: CompletedRequest) {
        let CompletedRequest { target, outcome } = completed;
        if let Err(error) = &outcome {
            warn!(node = %target.node_id, %error, "completion failed");
            self.last_error = Some(error.to_string());
        }

        let next = self
            .state
            .apply_completion(&target.session_id, &target.node_id, &outcome);
        self.commit(next);
        self.loading.remove(&target.node_id);
    }

    fn reap_workers(&mut self) {
        let (finished, running): (Vec<_>, Vec<_>) = self
            .workers
            .drain(..)
            .partition(|handle| handle.is_finished());
        self.workers = running;
        for handle in finished {
            let _ = handle.join();
        }
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
