use anyhow::Result;
use std::process::Command;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

/// Cap on simultaneous ffmpeg children. Anything over the cap is refused and
/// surfaces as a per-item start rejection, which the grid already tolerates.
const MAX_PROCESSES: usize = 4;

static ACTIVE_COUNT: AtomicUsize = AtomicUsize::new(0);
static AVAILABLE: OnceLock<bool> = OnceLock::new();

/// Whether an `ffmpeg` binary answers on this machine. Probed once.
pub fn is_available() -> bool {
    *AVAILABLE.get_or_init(|| {
        match Command::new("ffmpeg").arg("-version").output() {
            Ok(output) if output.status.success() => {
                log::info!("ffmpeg found, video sound and posters enabled");
                true
            }
            _ => {
                log::warn!("ffmpeg not found; video items will not start");
                false
            }
        }
    })
}

fn run(mut command: Command) -> Result<Vec<u8>> {
    if !is_available() {
        return Err(anyhow::anyhow!("ffmpeg is not available"));
    }

    let current = ACTIVE_COUNT.load(Ordering::SeqCst);
    if current >= MAX_PROCESSES {
        return Err(anyhow::anyhow!(
            "Cannot execute ffmpeg: {} processes already running (max: {})",
            current,
            MAX_PROCESSES
        ));
    }

    ACTIVE_COUNT.fetch_add(1, Ordering::SeqCst);
    let result = command.output();
    ACTIVE_COUNT.fetch_sub(1, Ordering::SeqCst);

    let output = result.map_err(|e| anyhow::anyhow!("ffmpeg execution failed: {}", e))?;
    if !output.status.success() {
        let error = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow::anyhow!("ffmpeg exited with an error: {}", error));
    }
    Ok(output.stdout)
}

/// Render the audio track of a remote media file to WAV bytes in memory, the
/// same shape the rodio decoder wants. Length is capped: wall tiles are short
/// loops, not feature films.
pub fn render_wav(url: &str) -> Result<Vec<u8>> {
    let mut cmd = Command::new("ffmpeg");
    cmd.arg("-i").arg(url);
    cmd.arg("-vn");
    cmd.arg("-f").arg("wav");
    cmd.arg("-ac").arg("2");
    cmd.arg("-ar").arg("48000");
    cmd.arg("-t").arg("120");
    cmd.arg("pipe:1");

    let bytes = run(cmd)?;
    if bytes.is_empty() {
        return Err(anyhow::anyhow!("ffmpeg produced no audio for {}", url));
    }
    Ok(bytes)
}

/// Grab a single poster frame as PNG bytes for a video tile.
pub fn extract_poster(url: &str) -> Result<Vec<u8>> {
    let mut cmd = Command::new("ffmpeg");
    cmd.arg("-i").arg(url);
    cmd.arg("-frames:v").arg("1");
    cmd.arg("-f").arg("image2pipe");
    cmd.arg("-vcodec").arg("png");
    cmd.arg("pipe:1");

    let bytes = run(cmd)?;
    if bytes.is_empty() {
        return Err(anyhow::anyhow!("ffmpeg produced no frame for {}", url));
    }
    Ok(bytes)
}
