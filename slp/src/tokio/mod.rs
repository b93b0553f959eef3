//! The status exchange on top of the tokio runtime.

use tokio::{
    io::{AsyncRead, AsyncWrite, AsyncWriteExt},
    net::TcpStream,
};

use crate::{
    Error, ServerStatus, StatusRequest,
    handshake::{build_handshake, build_status_request},
    reader::{Stage, bounded, read_status},
};

/// Retrieve the status of a Minecraft Java server.
///
/// Opens one TCP connection, sends the handshake and status request, reads
/// the response and closes the connection again, whatever the outcome. The
/// request's timeout bounds the connect and each read and write on its own.
///
/// # Examples
///
/// ```no_run
/// # async {
/// use std::time::Duration;
///
/// let request = slp::StatusRequest::new("mc.hypixel.net", 25565)
///     .with_timeout(Duration::from_secs(2));
/// let status = slp::tokio::get_status(&request).await?;
/// println!("{} / {}", status.players().online, status.players().max);
/// # Ok::<(), slp::Error>(())
/// # };
/// ```
///
/// # Errors
/// If the server cannot be reached or its response cannot be decoded.
pub async fn get_status(request: &StatusRequest) -> Result<ServerStatus, Error> {
    let addr = (request.host(), request.port());
    let mut stream = bounded(Stage::Connect, request.timeout(), async {
        TcpStream::connect(addr).await.map_err(Error::from)
    })
    .await?;
    trace!(host = request.host(), port = request.port(), "connected");
    stream.set_nodelay(true)?;
    exchange(&mut stream, request).await
}

/// Runs the status exchange over an already connected stream.
///
/// # Errors
/// See [`get_status`].
pub async fn exchange<S>(stream: &mut S, request: &StatusRequest) -> Result<ServerStatus, Error>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let handshake = build_handshake(request);
    bounded(Stage::SendRequest, request.timeout(), async {
        stream.write_all(&handshake).await?;
        stream.write_all(&build_status_request()).await?;
        stream.flush().await?;
        Ok::<_, Error>(())
    })
    .await?;

    let json = read_status(stream, request.timeout()).await?;
    trace!(bytes = json.len(), "read status response");
    ServerStatus::decode(&json)
}
