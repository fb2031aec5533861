use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    AwaitingFirstFragment,
    StreamingFragments,
    Completed,
    Aborted,
}

impl TurnState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TurnState::Completed | TurnState::Aborted)
    }
}

/// Bookkeeping for one user message and the reply streamed back for it.
#[derive(Debug)]
pub struct Turn {
    id: Uuid,
    state: TurnState,
    reply: String,
    fragments: usize,
}

impl Turn {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: TurnState::AwaitingFirstFragment,
            reply: String::new(),
            fragments: 0,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn reply(&self) -> &str {
        &self.reply
    }

    pub fn fragments(&self) -> usize {
        self.fragments
    }

    /// Appends a fragment to the reply. Ignored once the turn is terminal.
    pub fn push_fragment(&mut self, text: &str) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        self.state = TurnState::StreamingFragments;
        self.reply.push_str(text);
        self.fragments += 1;
        true
    }

    /// Finishes the turn and hands back the full reply, exactly once.
    pub fn complete(&mut self) -> Option<String> {
        if self.state.is_terminal() {
            return None;
        }
        self.state = TurnState::Completed;
        Some(std::mem::take(&mut self.reply))
    }

    /// Abandons the turn and hands back whatever partial reply was built.
    pub fn abort(&mut self) -> Option<String> {
        if self.state.is_terminal() {
            return None;
        }
        self.state = TurnState::Aborted;
        Some(std::mem::take(&mut self.reply))
    }
}

impl Default for Turn {
    fn default() -> Self {
        Self::new()
    }
}
