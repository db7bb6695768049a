//! Per-connection SSH handler.
//!
//! Translates russh callbacks into channel-table operations and starts one
//! session [`Runtime`] per shell or exec request. Every client is accepted
//! without credentials: the gateway has no notion of users.

use std::{net::SocketAddr, sync::Arc};

use geminal_app::{Inference, Runtime, SessionOutcome};
use russh::{
    Channel, ChannelId, Pty,
    keys::PublicKey,
    server::{Auth, Handler, Msg, Session},
};

use crate::{
    ServerError,
    channels::{ChannelTable, SessionStart},
    terminal::SshDriver,
};

/// Handler for one SSH connection.
pub struct ConnectionHandler<I> {
    connection_id: u64,
    peer: Option<SocketAddr>,
    inference: Arc<I>,
    channels: ChannelTable<ChannelId>,
}

impl<I: Inference> ConnectionHandler<I> {
    /// Create a handler for a freshly accepted connection.
    pub fn new(connection_id: u64, peer: Option<SocketAddr>, inference: Arc<I>) -> Self {
        Self { connection_id, peer, inference, channels: ChannelTable::new() }
    }

    /// Answer a channel request that asked for a reply.
    fn reply(&self, channel: ChannelId, accepted: bool, session: &mut Session) {
        let result =
            if accepted { session.channel_success(channel) } else { session.channel_failure(channel) };
        if let Err(e) = result {
            tracing::debug!(
                connection_id = self.connection_id,
                channel = ?channel,
                accepted,
                "channel request reply failed: {e:?}"
            );
        }
    }

    /// Spawn the session runtime for `channel`.
    fn spawn_session(&self, channel: ChannelId, start: SessionStart, session: &Session) {
        let driver = SshDriver::new(session.handle(), channel, start.input, start.full_screen);
        let runtime = Runtime::new(driver, Arc::clone(&self.inference));
        let connection_id = self.connection_id;

        tracing::info!(
            connection_id,
            channel = ?channel,
            full_screen = start.full_screen,
            "session started"
        );

        tokio::spawn(async move {
            match runtime.run().await {
                Ok(SessionOutcome::Closed { exit_status }) => {
                    tracing::info!(connection_id, channel = ?channel, exit_status, "session closed");
                },
                Ok(SessionOutcome::Disconnected) => {
                    tracing::info!(connection_id, channel = ?channel, "session disconnected");
                },
                Err(e) => {
                    tracing::debug!(
                        connection_id,
                        channel = ?channel,
                        "session write failed: {e}"
                    );
                },
            }
        });
    }
}

impl<I: Inference> Handler for ConnectionHandler<I> {
    type Error = ServerError;

    async fn auth_none(&mut self, user: &str) -> Result<Auth, Self::Error> {
        tracing::debug!(connection_id = self.connection_id, user, "auth none accepted");
        Ok(Auth::Accept)
    }

    async fn auth_password(&mut self, user: &str, _password: &str) -> Result<Auth, Self::Error> {
        tracing::debug!(connection_id = self.connection_id, user, "auth password accepted");
        Ok(Auth::Accept)
    }

    async fn auth_publickey(
        &mut self,
        user: &str,
        _public_key: &PublicKey,
    ) -> Result<Auth, Self::Error> {
        tracing::debug!(connection_id = self.connection_id, user, "auth publickey accepted");
        Ok(Auth::Accept)
    }

    async fn channel_open_session(
        &mut self,
        channel: Channel<Msg>,
        _session: &mut Session,
    ) -> Result<bool, Self::Error> {
        // All I/O goes through the handler callbacks and the session handle.
        let id = channel.id();
        self.channels.open(id);

        tracing::debug!(
            connection_id = self.connection_id,
            peer = ?self.peer,
            channel = ?id,
            open_channels = self.channels.len(),
            "session channel opened"
        );
        Ok(true)
    }

    async fn pty_request(
        &mut self,
        channel: ChannelId,
        term: &str,
        col_width: u32,
        row_height: u32,
        _pix_width: u32,
        _pix_height: u32,
        _modes: &[(Pty, u32)],
        session: &mut Session,
    ) -> Result<(), Self::Error> {
        let accepted = self.channels.request_pty(channel);
        if accepted {
            tracing::debug!(channel = ?channel, term, col_width, row_height, "pty requested");
        }
        self.reply(channel, accepted, session);
        Ok(())
    }

    async fn shell_request(
        &mut self,
        channel: ChannelId,
        session: &mut Session,
    ) -> Result<(), Self::Error> {
        let start = self.channels.start(channel);
        self.reply(channel, start.is_some(), session);
        if let Some(start) = start {
            self.spawn_session(channel, start, session);
        }
        Ok(())
    }

    async fn exec_request(
        &mut self,
        channel: ChannelId,
        data: &[u8],
        session: &mut Session,
    ) -> Result<(), Self::Error> {
        let start = self.channels.start_exec(channel, data);
        self.reply(channel, start.is_some(), session);
        if let Some(start) = start {
            self.spawn_session(channel, start, session);
        }
        Ok(())
    }

    async fn data(
        &mut self,
        channel: ChannelId,
        data: &[u8],
        _session: &mut Session,
    ) -> Result<(), Self::Error> {
        self.channels.feed(channel, data);
        Ok(())
    }

    async fn channel_eof(
        &mut self,
        channel: ChannelId,
        _session: &mut Session,
    ) -> Result<(), Self::Error> {
        if !self.channels.end_input(channel) {
            tracing::trace!(connection_id = self.connection_id, channel = ?channel, "eof ignored");
        }
        Ok(())
    }

    async fn channel_close(
        &mut self,
        channel: ChannelId,
        _session: &mut Session,
    ) -> Result<(), Self::Error> {
        if self.channels.close(channel) {
            tracing::debug!(
                connection_id = self.connection_id,
                channel = ?channel,
                "channel closed"
            );
        }
        Ok(())
    }
}
