//! Per-process colored, line-buffered stdout/stderr forwarding (spec §4.6
//! "Stdout and stderr are each wrapped in a line-buffered ... writer that
//! prefixes every line with the process's instance name in a stable
//! per-process color; stderr additionally renders red.").

use owo_colors::{AnsiColors, OwoColorize};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

const PALETTE: &[AnsiColors] = &[
    AnsiColors::Cyan,
    AnsiColors::Magenta,
    AnsiColors::Yellow,
    AnsiColors::Green,
    AnsiColors::Blue,
    AnsiColors::BrightCyan,
    AnsiColors::BrightMagenta,
    AnsiColors::BrightYellow,
];

pub fn color_for(index: usize) -> AnsiColors {
    PALETTE[index % PALETTE.len()]
}

/// Spawn a task that reads `reader` line by line and prints each line to
/// stdout, prefixed with `name` in `color` (red for stderr lines
/// regardless of the process's own color).
pub fn forward<R>(name: String, color: AnsiColors, is_stderr: bool, reader: R) -> tokio::task::JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let prefix = format!("[{name}]").color(color);
                    if is_stderr {
                        eprintln!("{prefix} {}", line.red());
                    } else {
                        println!("{prefix} {line}");
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(process = %name, error = %e, "log stream read error");
                    break;
                }
            }
        }
    })
}
