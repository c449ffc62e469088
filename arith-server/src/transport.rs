//! TCP transport: one task per participant connection. Hello handshake, then framed quiz messages.
//! Messages of a connection are handled in order; the session lock serializes state changes.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use arith_core::wire::{decode_payload, encode_frame, frame_len, LEN_SIZE};
use arith_core::{ClientVars, PlayerId, Session};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

pub type SharedSession = Arc<Mutex<Session>>;

/// First client frame: who is connecting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Hello {
    pub participant: String,
}

/// Server reply to `Hello`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Welcome {
    pub session: String,
    pub player: PlayerId,
    pub vars: ClientVars,
}

/// Accept connections until the listener fails.
pub async fn run_transport(listener: TcpListener, session: SharedSession) -> io::Result<()> {
    loop {
        let (stream, addr) = listener.accept().await?;
        let session = session.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, addr, session).await {
                tracing::debug!(%addr, error = %e, "connection dropped");
            }
        });
    }
}

async fn handle_connection(
    mut stream: TcpStream,
    addr: SocketAddr,
    session: SharedSession,
) -> io::Result<()> {
    let (mut r, mut w) = stream.split();
    let Some(hello) = read_frame::<_, Hello>(&mut r).await? else {
        return Ok(());
    };

    let (player, deadline, welcome) = {
        let mut s = session.lock().await;
        let known = s.players().len();
        let player = s
            .join(&hello.participant, unix_now())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        if s.is_round_over(player) {
            tracing::info!(%addr, %player, "rejoin after round end refused");
            return Ok(());
        }
        let deadline = s.round_deadline(player).unwrap_or_else(unix_now);
        if s.players().len() > known {
            schedule_round_end(session.clone(), player, deadline);
        }
        let welcome = Welcome {
            session: s.code().to_string(),
            player,
            vars: s.config().client_vars(),
        };
        (player, deadline, welcome)
    };
    write_frame(&mut w, &welcome).await?;
    tracing::debug!(%addr, %player, "participant connected");

    let round_over = tokio::time::sleep(remaining(deadline));
    tokio::pin!(round_over);
    loop {
        let raw: Value = tokio::select! {
            _ = &mut round_over => {
                session.lock().await.end_round(player);
                return Ok(());
            }
            frame = read_frame::<_, Value>(&mut r) => match frame? {
                Some(v) => v,
                None => return Ok(()),
            },
        };
        let result = session.lock().await.on_message(player, &raw, unix_now());
        match result {
            Ok(reply) => write_frame(&mut w, &reply).await?,
            Err(e) => {
                // every rejection ends the exchange; the client sees the channel close
                tracing::warn!(%addr, %player, error = %e, "rejected message, closing");
                return Ok(());
            }
        }
    }
}

/// End the player's round at `deadline`, whether or not they are still connected.
pub fn schedule_round_end(session: SharedSession, player: PlayerId, deadline: f64) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(remaining(deadline)).await;
        session.lock().await.end_round(player);
    })
}

/// Read one frame. Returns None on a clean end of stream before the header.
pub async fn read_frame<R, T>(r: &mut R) -> io::Result<Option<T>>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let mut header = [0u8; LEN_SIZE];
    match r.read_exact(&mut header).await {
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e),
    }
    let len = frame_len(header).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    let mut payload = vec![0u8; len];
    r.read_exact(&mut payload).await?;
    decode_payload(&payload)
        .map(Some)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

pub async fn write_frame<W, T>(w: &mut W, msg: &T) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let frame = encode_frame(msg).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    w.write_all(&frame).await?;
    w.flush().await
}

pub fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

fn remaining(deadline: f64) -> Duration {
    Duration::try_from_secs_f64(deadline - unix_now()).unwrap_or(Duration::ZERO)
}
