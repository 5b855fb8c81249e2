//! Blocking TCP client for the EMCA server protocol.
//!
//! The protocol is strictly request/response: the client writes a `u16`
//! request id (plus arguments), the server answers with a `u16` response id
//! followed by the payload. Only one request is ever in flight.

use std::io::{self, BufReader, BufWriter, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use emca_core::{ClientOptions, DecodeLimits, EmcaError, Result, ServerMsg, Stream};
use emca_scene::{CameraData, PixelData, RenderInfo, SceneResponse};

/// A [`Stream`] over a TCP connection with buffered reads and writes.
pub struct SocketStream {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
    peer: SocketAddr,
    timeout: Option<Duration>,
}

impl SocketStream {
    /// Connects to `options.hostname:options.port`, trying every resolved
    /// address in turn.
    pub fn connect(options: &ClientOptions) -> Result<Self> {
        let mut last_err = None;
        for addr in options.address().to_socket_addrs()? {
            let attempt = if options.connect_timeout_ms == 0 {
                TcpStream::connect(addr)
            } else {
                TcpStream::connect_timeout(&addr, Duration::from_millis(options.connect_timeout_ms))
            };
            match attempt {
                Ok(socket) => return Self::from_tcp(socket, io_timeout(options)),
                Err(e) => {
                    log::debug!("connect to {addr} failed: {e}");
                    last_err = Some(e);
                }
            }
        }
        Err(last_err
            .unwrap_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("{} did not resolve to any address", options.address()),
                )
            })
            .into())
    }

    /// Wraps an already connected socket.
    pub fn from_tcp(socket: TcpStream, timeout: Option<Duration>) -> Result<Self> {
        socket.set_read_timeout(timeout)?;
        socket.set_write_timeout(timeout)?;
        socket.set_nodelay(true)?;
        let peer = socket.peer_addr()?;
        let writer = BufWriter::new(socket.try_clone()?);
        Ok(Self {
            reader: BufReader::new(socket),
            writer,
            peer,
            timeout,
        })
    }

    /// Address of the connected peer.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Waits up to `wait` for the next byte and reports whether one arrived.
    ///
    /// Nothing is consumed. A closed connection reports `false`; the next
    /// read then surfaces the error.
    pub fn poll_readable(&mut self, wait: Duration) -> Result<bool> {
        if !self.reader.buffer().is_empty() {
            return Ok(true);
        }
        if wait.is_zero() {
            return Ok(false);
        }
        let socket = self.reader.get_ref();
        socket.set_read_timeout(Some(wait))?;
        let mut next = [0_u8; 1];
        let peeked = socket.peek(&mut next);
        socket.set_read_timeout(self.timeout)?;
        match peeked {
            Ok(n) => Ok(n > 0),
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl Stream for SocketStream {
    fn read_raw(&mut self, buf: &mut [u8]) -> Result<()> {
        self.reader.read_exact(buf).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => EmcaError::TruncatedStream { needed: buf.len() },
            _ => EmcaError::IoError(e),
        })
    }

    fn write_raw(&mut self, data: &[u8]) -> Result<()> {
        Ok(self.writer.write_all(data)?)
    }

    fn flush(&mut self) -> Result<()> {
        Ok(self.writer.flush()?)
    }
}

fn io_timeout(options: &ClientOptions) -> Option<Duration> {
    (options.io_timeout_ms > 0).then(|| Duration::from_millis(options.io_timeout_ms))
}

/// Result of a render image request.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedImage {
    /// Where the renderer stored the image, on the server's file system.
    pub path: String,
    /// Heatmap scene the renderer sent along with the image, if it collected one.
    pub heatmap: Option<SceneResponse>,
}

/// A connected, handshaken EMCA session.
///
/// Every request borrows the client mutably, so the read cursor is owned by
/// exactly one caller for the duration of a decode. If a response fails to
/// decode the cursor may sit mid-record; the client then refuses further
/// requests and the caller has to reconnect.
pub struct Client {
    stream: SocketStream,
    limits: DecodeLimits,
    heatmap_wait: Duration,
    supported_plugins: Vec<i16>,
    pending_heatmap: Option<SceneResponse>,
    poisoned: bool,
}

impl Client {
    /// Connects and performs the handshake.
    pub fn connect(options: &ClientOptions) -> Result<Self> {
        let stream = SocketStream::connect(options)?;
        Self::handshake(stream, options)
    }

    /// Runs the handshake on an open stream: the server greets with Hello
    /// and the client answers with Hello.
    pub fn handshake(mut stream: SocketStream, options: &ClientOptions) -> Result<Self> {
        let greeting = stream.read_u16()?;
        if ServerMsg::from_id(greeting) != Some(ServerMsg::Hello) {
            log::error!("received wrong handshake message {greeting:#06x} from server");
            // Best effort: the session is dead either way.
            let _ = stream
                .write_u16(ServerMsg::Quit.id())
                .and_then(|()| stream.flush());
            return Err(EmcaError::Handshake(format!(
                "expected hello, got {greeting:#06x}"
            )));
        }
        stream.write_u16(ServerMsg::Hello.id())?;
        stream.flush()?;
        log::info!("handshake with {} complete", stream.peer_addr());

        Ok(Self {
            stream,
            limits: options.limits,
            heatmap_wait: Duration::from_millis(options.heatmap_wait_ms),
            supported_plugins: Vec::new(),
            pending_heatmap: None,
            poisoned: false,
        })
    }

    /// Plugin ids the server has announced so far.
    ///
    /// The announcement arrives right after the handshake and is picked up
    /// while waiting for the first response.
    pub fn supported_plugins(&self) -> &[i16] {
        &self.supported_plugins
    }

    /// Caps applied while decoding responses.
    pub fn limits(&self) -> &DecodeLimits {
        &self.limits
    }

    /// Address of the server.
    pub fn peer_addr(&self) -> SocketAddr {
        self.stream.peer_addr()
    }

    /// Returns true once a failed read has left the stream unusable.
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Requests renderer and scene names plus the sample count.
    pub fn request_render_info(&mut self) -> Result<RenderInfo> {
        self.request(ServerMsg::RequestRenderInfo, &[], |s, _| RenderInfo::decode(s))
    }

    /// Requests the renderer's camera.
    pub fn request_camera(&mut self) -> Result<CameraData> {
        self.request(ServerMsg::RequestCamera, &[], |s, _| CameraData::decode(s))
    }

    /// Requests the scene geometry (or heatmap proxy meshes).
    pub fn request_scene(&mut self) -> Result<SceneResponse> {
        let scene = self.request(ServerMsg::RequestScene, &[], SceneResponse::decode)?;
        let summary = scene.shapes.summary();
        log::info!(
            "loaded scene with {} shapes ({} meshes, {} spheres, {} triangles)",
            summary.shape_count,
            summary.mesh_count,
            summary.sphere_count,
            summary.triangle_count
        );
        Ok(scene)
    }

    /// Renders the full image with `sample_count` samples per pixel.
    ///
    /// If the renderer collected heatmap data it sends a scene response right
    /// after the image path. The client waits up to
    /// [`ClientOptions::heatmap_wait_ms`] for it; a heatmap that arrives later
    /// is kept for [`Client::take_pending_heatmap`].
    pub fn request_render_image(&mut self, sample_count: u32) -> Result<RenderedImage> {
        let path = self.request(ServerMsg::RequestRenderImage, &[sample_count], |s, _| {
            s.read_string()
        })?;
        log::info!("rendered image at {path}");

        let heatmap = self.guarded(ServerMsg::RequestRenderImage, |client| {
            if client.stream.poll_readable(client.heatmap_wait)? {
                client
                    .receive(ServerMsg::ResponseScene, SceneResponse::decode)
                    .map(Some)
            } else {
                Ok(None)
            }
        })?;
        if let Some(scene) = &heatmap {
            log::info!("received heatmap with {} shapes", scene.shapes.len());
        }
        Ok(RenderedImage { path, heatmap })
    }

    /// Re-renders pixel `(x, y)` with `sample_count` samples and returns the
    /// traced paths.
    pub fn request_render_pixel(&mut self, x: u32, y: u32, sample_count: u32) -> Result<PixelData> {
        log::info!("requesting pixel ({x}, {y})");
        let pixel = self.request(
            ServerMsg::RequestRenderPixel,
            &[x, y, sample_count],
            PixelData::decode,
        )?;
        log::info!("loaded pixel ({x}, {y}) with {} paths", pixel.path_count());
        Ok(pixel)
    }

    /// Returns a heatmap scene that arrived after its image request had
    /// stopped waiting for it.
    pub fn take_pending_heatmap(&mut self) -> Option<SceneResponse> {
        self.pending_heatmap.take()
    }

    /// Ends the session; the server goes back to listening.
    pub fn disconnect(self) -> Result<()> {
        self.send_final(ServerMsg::Disconnect)
    }

    /// Ends the session and asks the server to shut down.
    pub fn quit(self) -> Result<()> {
        self.send_final(ServerMsg::Quit)
    }

    fn send_final(mut self, msg: ServerMsg) -> Result<()> {
        log::info!("closing session with {} ({msg:?})", self.stream.peer_addr());
        self.stream.write_u16(msg.id())?;
        self.stream.flush()
    }

    fn request<T>(
        &mut self,
        request: ServerMsg,
        args: &[u32],
        decode: impl FnOnce(&mut SocketStream, &DecodeLimits) -> Result<T>,
    ) -> Result<T> {
        let Some(response) = request.response() else {
            return Err(EmcaError::malformed(format!("{request:?} is not a request")));
        };
        self.guarded(request, |client| {
            client.send(request, args)?;
            client.receive(response, decode)
        })
    }

    /// Runs `exchange` unless the connection is poisoned, and poisons it if
    /// the exchange leaves the stream mid-record.
    fn guarded<T>(
        &mut self,
        request: ServerMsg,
        exchange: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        if self.poisoned {
            return Err(EmcaError::ConnectionPoisoned);
        }
        let result = exchange(self);
        if let Err(e) = &result {
            if e.desyncs_stream() {
                log::warn!("{request:?} failed, connection needs to be re-established: {e}");
                self.poisoned = true;
            }
        }
        result
    }

    fn send(&mut self, request: ServerMsg, args: &[u32]) -> Result<()> {
        log::debug!("sending {request:?} {args:?}");
        self.stream.write_u16(request.id())?;
        for &arg in args {
            self.stream.write_u32(arg)?;
        }
        self.stream.flush()
    }

    fn receive<T>(
        &mut self,
        response: ServerMsg,
        decode: impl FnOnce(&mut SocketStream, &DecodeLimits) -> Result<T>,
    ) -> Result<T> {
        loop {
            let id = self.stream.read_u16()?;
            match ServerMsg::from_id(id) {
                Some(msg) if msg == response => return decode(&mut self.stream, &self.limits),
                Some(ServerMsg::SupportedPlugins) => self.read_supported_plugins()?,
                Some(ServerMsg::ResponseScene) => {
                    let scene = SceneResponse::decode(&mut self.stream, &self.limits)?;
                    log::warn!("received late heatmap scene with {} shapes", scene.shapes.len());
                    self.pending_heatmap = Some(scene);
                }
                Some(ServerMsg::Disconnect) => return Err(EmcaError::Disconnected),
                _ => {
                    return Err(EmcaError::UnexpectedMessage {
                        expected: response.id(),
                        actual: id,
                    })
                }
            }
        }
    }

    fn read_supported_plugins(&mut self) -> Result<()> {
        let count = self.stream.read_u32()?;
        let count = DecodeLimits::check("plugin", count, u32::from(u16::MAX))?;
        self.supported_plugins = (0..count)
            .map(|_| self.stream.read_i16())
            .collect::<Result<_>>()?;
        log::info!("supported plugins = {:?}", self.supported_plugins);
        Ok(())
    }
}
