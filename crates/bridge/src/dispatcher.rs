use std::sync::Arc;

use {
    jirabot_channels::{MembershipEvent, MessageEvent, OutboundMessage, Transport, TransportEvent},
    jirabot_common::RoomId,
    jirabot_jira::IssueTracker,
    jirabot_membership::MembershipStore,
    tracing::{debug, info, warn},
};

use crate::{
    command::{Command, CommandParser},
    error::{Error, Result},
    reply::ReplyFormatter,
    retry::RetryPolicy,
};

/// Where the dispatcher is in its loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherState {
    /// Waiting for the next batch from the transport.
    Idle,
    /// Handling one event.
    Processing,
}

/// Single-threaded event loop: one event in flight, strictly in delivery
/// order.
pub struct EventDispatcher {
    transport: Arc<dyn Transport>,
    tracker: Arc<dyn IssueTracker>,
    store: MembershipStore,
    parser: CommandParser,
    formatter: ReplyFormatter,
    retry: RetryPolicy,
    state: DispatcherState,
}

impl EventDispatcher {
    pub fn new(
        transport: Arc<dyn Transport>,
        tracker: Arc<dyn IssueTracker>,
        store: MembershipStore,
    ) -> Self {
        Self {
            transport,
            tracker,
            store,
            parser: CommandParser::default(),
            formatter: ReplyFormatter::default(),
            retry: RetryPolicy::default(),
            state: DispatcherState::Idle,
        }
    }

    #[must_use]
    pub fn with_parser(mut self, parser: CommandParser) -> Self {
        self.parser = parser;
        self
    }

    #[must_use]
    pub fn with_formatter(mut self, formatter: ReplyFormatter) -> Self {
        self.formatter = formatter;
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn state(&self) -> DispatcherState {
        self.state
    }

    pub fn store(&self) -> &MembershipStore {
        &self.store
    }

    /// Join every room already in the ledger.
    ///
    /// Covers invites that were recorded but never joined before a restart.
    /// A room the server refuses outright is dropped from the ledger; a join
    /// that stays unavailable after retries is fatal.
    pub async fn rejoin_recorded_rooms(&mut self) -> Result<()> {
        let recorded = self.store.rooms().to_vec();
        for room in &recorded {
            match self.join(room).await {
                Ok(_) => {},
                Err(Error::Transport { source, .. }) if !source.is_retryable() => {
                    warn!(room = %room, error = %source, "recorded room refused the join, forgetting it");
                    self.store.remove(room)?;
                },
                Err(error) => return Err(error),
            }
        }
        info!(rooms = self.store.len(), "recorded rooms rejoined");
        Ok(())
    }

    /// Join the configured startup rooms and record the room IDs they
    /// resolve to in the ledger.
    pub async fn join_static_rooms(&mut self, rooms: &[RoomId]) -> Result<()> {
        for room in rooms {
            let joined = self.join(room).await?;
            if self.store.add(&joined)? {
                info!(room = %joined, requested = %room, "recorded static room");
            }
        }
        Ok(())
    }

    /// Process batches until the transport closes (`Ok`) or a fatal error.
    pub async fn run(&mut self) -> Result<()> {
        info!(
            user_id = %self.transport.user_id(),
            rooms = self.store.len(),
            "dispatcher started"
        );
        loop {
            self.state = DispatcherState::Idle;
            let transport = &*self.transport;
            let batch = self
                .retry
                .run("sync", move || transport.next_batch())
                .await
                .map_err(|source| Error::transport("sync", source))?;
            let Some(events) = batch else {
                info!("transport closed, dispatcher stopping");
                return Ok(());
            };
            for event in events {
                self.handle_event(event).await?;
            }
        }
    }

    /// Handle one event to completion.
    pub async fn handle_event(&mut self, event: TransportEvent) -> Result<()> {
        self.state = DispatcherState::Processing;
        let result = match event {
            TransportEvent::Membership(event) => self.handle_membership(event).await,
            TransportEvent::Message(message) => self.handle_message(message).await,
        };
        self.state = DispatcherState::Idle;
        result
    }

    async fn handle_membership(&mut self, event: MembershipEvent) -> Result<()> {
        if event.actor() != self.transport.user_id() {
            debug!(room = %event.room(), actor = %event.actor(), "ignoring membership change of another user");
            return Ok(());
        }
        match event {
            MembershipEvent::Invited { room, .. } => {
                if self.store.contains(room.as_str()) {
                    debug!(room = %room, "invited to a room already in the ledger");
                    return Ok(());
                }
                self.store.add(&room)?;
                self.join(&room).await?;
            },
            MembershipEvent::Kicked { room, .. } => {
                if self.store.contains(room.as_str()) {
                    self.store.remove(&room)?;
                    info!(room = %room, "removed from room");
                }
            },
        }
        Ok(())
    }

    async fn handle_message(&mut self, message: MessageEvent) -> Result<()> {
        if &message.sender == self.transport.user_id() {
            return Ok(());
        }
        let Some(command) = self.parser.parse(&message.body) else {
            return Ok(());
        };
        debug!(room = %message.room, sender = %message.sender, verb = command.verb(), "command received");

        let reply = match command {
            Command::Show { issue_key } => self.show(&message.room, &issue_key).await,
        };
        self.send(&message.room, &reply).await
    }

    async fn show(&self, room: &RoomId, issue_key: &str) -> OutboundMessage {
        match self.tracker.lookup(issue_key).await {
            Ok(result) => self.formatter.format(&result),
            Err(error) => {
                warn!(room = %room, issue_key, %error, "issue lookup failed");
                self.formatter.apology()
            },
        }
    }

    async fn join(&self, room: &RoomId) -> Result<RoomId> {
        let transport = &*self.transport;
        self.retry
            .run("join", move || transport.join_room(room))
            .await
            .map_err(|source| Error::transport(format!("join {room}"), source))
    }

    async fn send(&self, room: &RoomId, message: &OutboundMessage) -> Result<()> {
        let transport = &*self.transport;
        self.retry
            .run("send", move || transport.send_message(room, message))
            .await
            .map_err(|source| Error::transport(format!("send to {room}"), source))
    }
}
