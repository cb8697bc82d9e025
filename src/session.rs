//! Per-connection session handling
//!
//! Owns one client from accept to close: sends the banner, registers the
//! guest identity in the directory, runs the command loop, and tears the
//! user down exactly once on logout, EOF, or read error. The socket write
//! side is a separate task draining the user's outbound channel, so
//! broadcast fan-out from other workers never touches this worker's loop.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::command::{listing, with_prompt, Command, Usage, HELP_TEXT};
use crate::error::AppError;
use crate::gate::DirectoryGate;
use crate::router::{self, RouteOutcome};
use crate::types::{bounded_name, ConnId, DEFAULT_ROOM, MOTD, PROMPT};

/// Line buffer sizing for the read side
const READ_BUFFER_SIZE: usize = 2048;

/// Loop control for the command dispatcher
enum Flow {
    Continue,
    Quit,
}

/// Handle a new TCP connection
///
/// Runs the full session lifecycle; returns once the connection is torn
/// down. Teardown runs regardless of how the command loop ended.
pub async fn handle_connection(
    stream: TcpStream,
    gate: Arc<DirectoryGate>,
) -> Result<(), AppError> {
    let peer_addr = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    let id = ConnId::next();
    info!("Client {} connected from {}", id, peer_addr);

    let (read_half, mut write_half) = stream.into_split();

    // Channel for server -> client text; the directory holds a clone as
    // the user's delivery handle
    let (msg_tx, mut msg_rx) = mpsc::unbounded_channel::<String>();

    // Write task: drain the channel onto the socket
    let write_task = tokio::spawn(async move {
        while let Some(text) = msg_rx.recv().await {
            if write_half.write_all(text.as_bytes()).await.is_err() {
                debug!("Socket write failed, ending write task");
                break;
            }
        }
        debug!("Write task ended for client");
        let _ = write_half.shutdown().await;
    });

    // Banner goes out before the user exists anywhere
    let _ = msg_tx.send(MOTD.to_string());

    bootstrap(&gate, id, &msg_tx).await;

    let mut reader = BufReader::with_capacity(READ_BUFFER_SIZE, read_half);
    let result = command_loop(&mut reader, &gate, id, &msg_tx).await;

    teardown(&gate, id).await;

    // Dropping the last sender lets the write task flush and close
    drop(msg_tx);
    let _ = write_task.await;

    info!("Client {} disconnected", id);
    result
}

/// Register the guest identity and place it in the default room
///
/// On a display-name collision the insert is dropped (the directory
/// logs it) and the session is left without a record; its command loop
/// will notice and end on the next line received.
async fn bootstrap(gate: &DirectoryGate, id: ConnId, msg_tx: &mpsc::UnboundedSender<String>) {
    let sender = msg_tx.clone();
    let (users, rooms) = gate
        .with_write(|dir| {
            if dir.register_user(id, &id.guest_name(), sender).is_ok() {
                dir.create_room(DEFAULT_ROOM);
                dir.add_member(DEFAULT_ROOM, id);
            }
            (dir.user_count(), dir.room_count())
        })
        .await;
    debug!("Total clients: {}, Total rooms: {}", users, rooms);
}

/// Remove the user and all its relationships; idempotent
async fn teardown(gate: &DirectoryGate, id: ConnId) {
    let (users, rooms) = gate
        .with_write(|dir| {
            dir.remove_user_entirely(id);
            (dir.user_count(), dir.room_count())
        })
        .await;
    debug!(
        "Client {} torn down. Total clients: {}, Total rooms: {}",
        id, users, rooms
    );
}

/// Read lines until quit, EOF, or a transport error
async fn command_loop(
    reader: &mut BufReader<OwnedReadHalf>,
    gate: &DirectoryGate,
    id: ConnId,
    out: &mpsc::UnboundedSender<String>,
) -> Result<(), AppError> {
    let mut line = String::new();
    loop {
        line.clear();
        let n = reader.read_line(&mut line).await?;
        if n == 0 {
            debug!("Client {} reached EOF", id);
            return Ok(());
        }
        let line = line.trim_end_matches(['\r', '\n']);

        // The record can vanish underneath the session (duplicate
        // registration drop); treat that like a disconnect
        let present = gate.with_read(|dir| dir.find_user_by_conn(id).is_some()).await;
        if !present {
            warn!("Client {} has no directory record, closing", id);
            return Ok(());
        }

        match dispatch(gate, id, out, line).await {
            Flow::Continue => {}
            Flow::Quit => return Ok(()),
        }
    }
}

/// Execute one received line against the directory
async fn dispatch(
    gate: &DirectoryGate,
    id: ConnId,
    out: &mpsc::UnboundedSender<String>,
    line: &str,
) -> Flow {
    let cmd = match Command::parse(line) {
        Ok(cmd) => cmd,
        Err(Usage(hint)) => {
            let _ = out.send(with_prompt(&format!("Usage: {hint}")));
            return Flow::Continue;
        }
    };

    match cmd {
        Command::Empty => {
            let _ = out.send(PROMPT.to_string());
        }

        Command::Login(name) => {
            debug!("Client {} login: {}", id, name);
            gate.with_write(|dir| dir.rename_user(id, &name)).await;
            let _ = out.send(with_prompt(&format!("Logged in as {name}")));
        }

        Command::Create(room) => {
            debug!("Client {} create room: {}", id, room);
            let room = bounded_name(&room);
            gate.with_write(|dir| dir.create_room(&room)).await;
            let _ = out.send(with_prompt(&format!(
                "Room {room} created (or already exists)"
            )));
        }

        Command::Join(room) => {
            debug!("Client {} join room: {}", id, room);
            let room = bounded_name(&room);
            gate.with_write(|dir| {
                dir.create_room(&room);
                dir.add_member(&room, id);
            })
            .await;
            let _ = out.send(with_prompt(&format!("Joined room {room}")));
        }

        Command::Leave(room) => {
            debug!("Client {} leave room: {}", id, room);
            let room = bounded_name(&room);
            let reply = gate
                .with_write(|dir| {
                    if dir.find_room(&room).is_some() {
                        let _ = dir.remove_member(&room, id);
                        dir.delete_empty_rooms(DEFAULT_ROOM);
                        format!("Left room {room}")
                    } else {
                        format!("Room {room} does not exist")
                    }
                })
                .await;
            let _ = out.send(with_prompt(&reply));
        }

        Command::Connect(name) => {
            debug!("Client {} connect to user: {}", id, name);
            let reply = gate
                .with_write(|dir| match dir.find_user_by_name(&name).map(|u| u.id) {
                    None => format!("User {name} not found"),
                    Some(peer) => match dir.connect(id, peer) {
                        Ok(()) => format!("Connected to {name}"),
                        Err(AppError::AlreadyConnected) => {
                            format!("Already connected to {name}")
                        }
                        Err(err) => err.to_string(),
                    },
                })
                .await;
            let _ = out.send(with_prompt(&reply));
        }

        Command::Disconnect(name) => {
            debug!("Client {} disconnect from user: {}", id, name);
            let reply = gate
                .with_write(|dir| match dir.find_user_by_name(&name).map(|u| u.id) {
                    None => format!("User {name} not found"),
                    Some(peer) => {
                        dir.disconnect(id, peer);
                        format!("Disconnected from {name}")
                    }
                })
                .await;
            let _ = out.send(with_prompt(&reply));
        }

        Command::Rooms => {
            let reply = gate
                .with_read(|dir| listing("Rooms:", &dir.list_room_names()))
                .await;
            let _ = out.send(reply);
        }

        Command::Users => {
            let reply = gate
                .with_read(|dir| listing("Users:", &dir.list_user_names()))
                .await;
            let _ = out.send(reply);
        }

        Command::Help => {
            let _ = out.send(HELP_TEXT.to_string());
            let _ = out.send(PROMPT.to_string());
        }

        Command::Quit => return Flow::Quit,

        Command::Broadcast(text) => {
            let outcome = gate.with_read(|dir| router::route(dir, id, &text)).await;
            if outcome == RouteOutcome::NoRecipients {
                let _ = out.send(with_prompt(
                    "No recipients. Join a room or connect to a user first.",
                ));
            }
        }
    }

    Flow::Continue
}
