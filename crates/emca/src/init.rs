//! Process-level setup for emca-rs.

use crate::client::Client;
use crate::Result;
use emca_core::ClientOptions;
use emca_scene::SceneResponse;

/// Installs `env_logger` as the `log` backend.
///
/// Defaults to the `info` level unless `RUST_LOG` says otherwise. Calling
/// this more than once is harmless.
pub fn init_logging() {
    let env = env_logger::Env::default().default_filter_or("info");
    let _ = env_logger::Builder::from_env(env).try_init();
}

/// Connects, fetches the scene once and disconnects.
///
/// # Example
///
/// ```no_run
/// use emca::*;
///
/// fn main() -> Result<()> {
///     init_logging();
///     let scene = fetch_scene(&ClientOptions::default())?;
///     println!("{}", scene.shapes);
///     Ok(())
/// }
/// ```
pub fn fetch_scene(options: &ClientOptions) -> Result<SceneResponse> {
    let mut client = Client::connect(options)?;
    let scene = client.request_scene()?;
    client.disconnect()?;
    Ok(scene)
}
