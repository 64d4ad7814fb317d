use crate::mode;
use rasmus_core::{Command, Request, Response};
use std::fs::Permissions;
use std::io;
use std::os::unix::fs::{MetadataExt, PermissionsExt};
use std::os::unix::process::ExitStatusExt;
use std::process::{ExitStatus, Stdio};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::unix::pipe;
use tracing::{debug, info};

/// Performs a single request against the local filesystem or process space.
///
/// Failures never escape: every outcome is folded into the returned
/// [`Response`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandExecutor;

impl CommandExecutor {
    pub fn new() -> Self {
        CommandExecutor
    }

    pub async fn handle(&self, request: Request) -> Response {
        info!(
            id = %request.id,
            command = %request.command,
            path = %request.path,
            "Handling request"
        );

        let mut response = Response::for_request(&request.id);

        match request.command() {
            Command::Read => read(&request, &mut response).await,
            Command::Write => write(&request, &mut response).await,
            Command::List => list(&request, &mut response).await,
            Command::Execute => execute(&request, &mut response).await,
            Command::Unknown(name) => {
                response.message = format!("Unknown command {}", name);
            }
        }

        info!(
            id = %response.correlation_id,
            completed = response.completed,
            success = response.success,
            message = %response.message,
            "Request finished"
        );

        response.finalize()
    }
}

fn describe(op: &str, path: &str, err: &io::Error) -> String {
    format!("{} {}: {}", op, path, err)
}

async fn read(request: &Request, response: &mut Response) {
    match fs::read(&request.path).await {
        Ok(bytes) => {
            response.output = String::from_utf8_lossy(&bytes).into_owned();
            response.completed = true;
        }
        Err(e) => response.message = describe("open", &request.path, &e),
    }
}

async fn write(request: &Request, response: &mut Response) {
    match write_file(&request.path, request.input.as_bytes(), request.mode).await {
        Ok(()) => response.completed = true,
        Err((op, e)) => response.message = describe(op, &request.path, &e),
    }
}

/// Returns the failing step alongside the error
async fn write_file(
    path: &str,
    contents: &[u8],
    wire_mode: u32,
) -> Result<(), (&'static str, io::Error)> {
    let unix_mode = mode::to_unix(wire_mode);

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(unix_mode)
        .open(path)
        .await
        .map_err(|e| ("open", e))?;
    file.write_all(contents).await.map_err(|e| ("write", e))?;
    file.flush().await.map_err(|e| ("write", e))?;

    // The create mode is filtered by the umask and ignored for existing files
    file.set_permissions(Permissions::from_mode(unix_mode))
        .await
        .map_err(|e| ("chmod", e))
}

async fn list(request: &Request, response: &mut Response) {
    match fs::metadata(&request.path).await {
        Ok(meta) => {
            response.completed = true;
            response.message = format!(
                "{} {} {}",
                meta.len(),
                mode::from_unix(meta.mode()),
                meta.mtime()
            );
        }
        Err(e) => {
            response.message = format!("Error: {}", describe("stat", &request.path, &e));
        }
    }
}

async fn execute(request: &Request, response: &mut Response) {
    let (output, status) = match run_process(request).await {
        Ok(result) => result,
        Err(e) => {
            response.message = describe("exec", &request.path, &e);
            return;
        }
    };

    response.output = String::from_utf8_lossy(&output).into_owned();

    match status.code() {
        Some(code) => {
            response.completed = true;
            response.success = status.success();
            if code != 0 {
                response.message = format!("exit status {}", code);
            }
        }
        None => {
            response.message = match status.signal() {
                Some(signal) => format!("signal: {}", signal),
                None => "process terminated abnormally".to_string(),
            };
        }
    }
}

/// Run a child process with stdout and stderr sharing one pipe
async fn run_process(request: &Request) -> io::Result<(Vec<u8>, ExitStatus)> {
    let (sender, mut receiver) = pipe::pipe()?;
    let stdout = sender.into_blocking_fd()?;
    let stderr = stdout.try_clone()?;

    let mut command = tokio::process::Command::new(&request.path);
    command
        .args(&request.params)
        .stdout(stdout)
        .stderr(stderr)
        .stdin(if request.input.is_empty() {
            Stdio::null()
        } else {
            Stdio::piped()
        });

    let mut child = command.spawn()?;
    // Closes our copies of the write end so the reader sees EOF when the child exits
    drop(command);

    if let Some(mut stdin) = child.stdin.take() {
        let input = request.input.clone().into_bytes();
        tokio::spawn(async move {
            if let Err(e) = stdin.write_all(&input).await {
                debug!("Child closed stdin early: {}", e);
            }
        });
    }

    let mut output = Vec::new();
    let (status, read) = tokio::join!(child.wait(), receiver.read_to_end(&mut output));
    read?;

    Ok((output, status?))
}
