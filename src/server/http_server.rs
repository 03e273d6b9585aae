//! HTTP server implementation.

use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tokio::signal;
use log::{debug, info, warn, error};
use std::net::SocketAddr;

use crate::parser::{content_length, find_head_end, parse_request};
use crate::server::config::ServerConfig;
use crate::server::error::Error;
use crate::server::handler::{BoxedHandler, Handler};
use crate::server::response::{HttpResponse, StatusCode};
use crate::server::writer::ResponseWriter;

/// An HTTP server that feeds every parsed request to one [`Handler`].
pub struct HttpServer {
    /// The server configuration.
    pub config: ServerConfig,
    /// The handler requests are dispatched to.
    pub handler: BoxedHandler,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and handler.
    pub fn new(config: ServerConfig, handler: impl Handler + 'static) -> Self {
        Self {
            config,
            handler: Arc::new(handler),
        }
    }

    /// Set up the TCP listener.
    async fn setup_listener(&self) -> Result<TcpListener, Error> {
        let listener = TcpListener::bind(&self.config.addr).await?;
        info!("Server listening on http://{addr}", addr = self.config.addr);
        Ok(listener)
    }

    /// Set up a Ctrl+C handler that stops the accept loop.
    fn setup_ctrl_c_handler(shutdown_tx: mpsc::Sender<()>, tasks: &mut JoinSet<()>) {
        tasks.spawn(async move {
            match signal::ctrl_c().await {
                Ok(()) => {
                    info!("Received Ctrl+C, stopping server");
                    let _ = shutdown_tx.send(()).await;
                }
                Err(e) => {
                    error!("Error setting up Ctrl+C handler: {e}");
                }
            }
        });
    }

    /// Handle a new connection.
    async fn handle_new_connection(
        &self,
        mut socket: TcpStream,
        addr: SocketAddr,
        semaphore: Arc<Semaphore>,
        tasks: &mut JoinSet<()>,
    ) {
        let permit = match semaphore.try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                warn!("Connection limit reached, rejecting connection from {addr}");
                let response = HttpResponse::new(StatusCode::ServiceUnavailable)
                    .with_content_type("text/plain")
                    .with_body_string("Server is at capacity, please try again later");
                let _ = socket.write_all(&response.to_bytes()).await;
                return;
            }
        };

        let handler = self.handler.clone();
        let config = self.config.clone();
        let client_ip = addr.ip().to_string();

        tasks.spawn(async move {
            // The permit is dropped when the task completes, releasing the semaphore slot
            let _permit = permit;

            if let Err(e) = Self::handle_connection(&mut socket, handler, &config, &client_ip).await {
                error!("Error handling connection from {client_ip}: {e}");
            }
        });
    }

    /// Log an accept error. Returns true if the accept loop should stop.
    async fn handle_connection_error(e: std::io::Error) -> bool {
        error!("Error accepting connection: {e}");

        if e.kind() == std::io::ErrorKind::BrokenPipe {
            error!("Critical error accepting connection, shutting down");
            return true;
        }

        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
        false
    }

    /// Start the server and listen for incoming connections.
    ///
    /// Returns after Ctrl+C. Connections still in flight at that point are
    /// aborted.
    pub async fn start(&self) -> Result<(), Error> {
        let listener = self.setup_listener().await?;
        self.run(listener).await
    }

    /// Accept connections on an already bound listener until Ctrl+C.
    ///
    /// `config.addr` is ignored; everything else in the configuration
    /// applies.
    pub async fn run(&self, listener: TcpListener) -> Result<(), Error> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_connections));
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let mut tasks = JoinSet::new();

        Self::setup_ctrl_c_handler(shutdown_tx, &mut tasks);

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("Shutting down server...");
                    break;
                }

                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((socket, addr)) => {
                            debug!("Connection from {addr}");
                            self.handle_new_connection(socket, addr, semaphore.clone(), &mut tasks).await;
                        },
                        Err(e) => {
                            if Self::handle_connection_error(e).await {
                                break;
                            }
                        }
                    }
                }
            }

            // Reap finished connection tasks so the set does not grow unbounded
            while tasks.try_join_next().is_some() {}
        }

        info!("Aborting {len} open connections", len = tasks.len());
        tasks.shutdown().await;
        info!("Server shutdown complete");

        Ok(())
    }

    /// Serve every request arriving on one connection.
    ///
    /// Requests are answered in order until the peer closes the connection or
    /// a request does not ask for keep-alive.
    pub async fn handle_connection(
        socket: &mut (impl AsyncRead + AsyncWrite + Unpin),
        handler: BoxedHandler,
        config: &ServerConfig,
        client_ip: &str,
    ) -> Result<(), Error> {
        let mut pending = Vec::new();

        loop {
            let message = match Self::read_message(socket, &mut pending, config).await {
                Ok(Some(message)) => message,
                Ok(None) => return Ok(()), // Connection closed
                Err(Error::PayloadTooLarge(len)) => {
                    let response = HttpResponse::new(StatusCode::PayloadTooLarge)
                        .with_content_type("text/plain")
                        .with_body_string(format!("Request body of {len} bytes is too large"));
                    socket.write_all(&response.to_bytes()).await?;
                    return Err(Error::PayloadTooLarge(len));
                }
                Err(Error::ParseError(e)) => {
                    Self::write_bad_request(socket, &e).await?;
                    return Err(Error::ParseError(e));
                }
                Err(e) => return Err(e),
            };

            let mut request = match parse_request(&message) {
                Ok(req) => req,
                Err(e) => {
                    Self::write_bad_request(socket, &e).await?;
                    return Err(Error::ParseError(e));
                }
            };
            request.client_ip = client_ip.to_string();

            let mut writer = ResponseWriter::new();
            handler.serve(&mut writer, &mut request);
            let response = writer.into_response();

            debug!(
                "{method} {path} -> {status}",
                method = request.method,
                path = request.path,
                status = response.status.as_u16()
            );
            socket.write_all(&response.to_bytes()).await?;

            if !request.keep_alive() {
                return Ok(());
            }
        }
    }

    async fn write_bad_request(
        socket: &mut (impl AsyncWrite + Unpin),
        e: &crate::parser::Error,
    ) -> Result<(), Error> {
        let response = HttpResponse::new(StatusCode::BadRequest)
            .with_content_type("text/plain")
            .with_body_string(format!("Error parsing request: {e}"));
        socket.write_all(&response.to_bytes()).await?;
        Ok(())
    }

    /// Read one complete request (header block plus `Content-Length` body).
    ///
    /// Bytes past the end of the request stay in `pending` for the next call.
    /// Returns `Ok(None)` when the peer closes the connection between
    /// requests.
    async fn read_message(
        socket: &mut (impl AsyncRead + Unpin),
        pending: &mut Vec<u8>,
        config: &ServerConfig,
    ) -> Result<Option<Vec<u8>>, Error> {
        let mut buf = vec![0; config.read_buffer_size];

        loop {
            match find_head_end(pending) {
                Some(head_end) => {
                    let body_len = content_length(&pending[..head_end])?;
                    if body_len > config.max_body_size {
                        return Err(Error::PayloadTooLarge(body_len));
                    }
                    let total = head_end + body_len;
                    if pending.len() >= total {
                        return Ok(Some(pending.drain(..total).collect()));
                    }
                }
                None if pending.len() > config.read_buffer_size => {
                    return Err(Error::ParseError(crate::parser::Error::InvalidHeaderFormat));
                }
                None => {}
            }

            let n = socket.read(&mut buf).await?;
            if n == 0 {
                if pending.is_empty() {
                    return Ok(None);
                }
                // A header block without its terminating blank line is still
                // handed to the parser, which reports what is wrong with it.
                if find_head_end(pending).is_none() {
                    return Ok(Some(std::mem::take(pending)));
                }
                return Err(Error::IncompleteRequest);
            }
            pending.extend_from_slice(&buf[..n]);
        }
    }
}
