use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::{json, Value};

use super::RigRpc;

const PARSE_ERROR: i64 = -32700;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;

fn success(id: Value, result: Value) -> String {
    json!({ "jsonrpc": "2.0", "id": id, "result": result }).to_string()
}

fn failure(id: Value, code: i64, message: impl Into<String>) -> String {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": code, "message": message.into() }
    })
    .to_string()
}

/// Notifications never get a response line
fn is_notification(method: &str) -> bool {
    method.starts_with("notifications/")
}

/// Run one tool and wrap its JSON result as text content. Tool-level
/// failures (bad arguments, rejected edits) are flagged with `isError`
/// rather than turned into protocol errors.
fn call_tool(rpc: &RigRpc, params: &Value) -> Result<Value, String> {
    let name = params
        .get("name")
        .and_then(Value::as_str)
        .ok_or("tools/call needs a tool name")?;
    let arguments = params.get("arguments").cloned().unwrap_or_else(|| json!({}));
    let result = rpc.handle_tool_call(name, &arguments);
    let failed = result.get("status").and_then(Value::as_str) == Some("error");
    Ok(json!({
        "content": [{
            "type": "text",
            "text": serde_json::to_string_pretty(&result).unwrap_or_default()
        }],
        "isError": failed
    }))
}

/// Answer one request line. None for notifications.
fn handle_jsonrpc_line(line: &str, rpc: &RigRpc) -> Option<String> {
    let request: Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => return Some(failure(Value::Null, PARSE_ERROR, format!("Parse error: {}", e))),
    };

    let id = request.get("id").cloned().unwrap_or(Value::Null);
    let method = request.get("method").and_then(Value::as_str).unwrap_or("");
    let params = request.get("params").cloned().unwrap_or_else(|| json!({}));

    let response = match method {
        "initialize" => success(
            id,
            json!({
                "protocolVersion": "2024-11-05",
                "capabilities": { "tools": {} },
                "serverInfo": {
                    "name": "toneshare",
                    "version": env!("CARGO_PKG_VERSION")
                }
            }),
        ),
        "tools/list" => success(id, RigRpc::list_tools()),
        "tools/call" => match call_tool(rpc, &params) {
            Ok(result) => success(id, result),
            Err(message) => failure(id, INVALID_PARAMS, message),
        },
        m if is_notification(m) => return None,
        m => failure(id, METHOD_NOT_FOUND, format!("Unknown method '{}'", m)),
    };
    Some(response)
}

/// Serve one client until it disconnects
fn handle_connection(stream: UnixStream, rpc: &RigRpc) {
    let mut writer = match stream.try_clone() {
        Ok(s) => s,
        Err(e) => {
            log::warn!("rpc client dropped: {}", e);
            return;
        }
    };
    let reader = BufReader::new(stream);

    for line in reader.lines().map_while(|l| l.ok()) {
        if line.trim().is_empty() {
            continue;
        }
        let Some(response) = handle_jsonrpc_line(&line, rpc) else {
            continue;
        };
        if writeln!(writer, "{}", response)
            .and_then(|_| writer.flush())
            .is_err()
        {
            break;
        }
    }
    log::debug!("rpc client disconnected");
}

/// Start the socket server in a background thread. Each client gets its
/// own thread; all of them talk to the editor through the command bus.
pub fn start_socket_server(rpc: Arc<RigRpc>, path: &Path, shutdown: Arc<AtomicBool>) -> Result<()> {
    // Remove stale socket file
    let _ = std::fs::remove_file(path);

    let listener = UnixListener::bind(path)
        .with_context(|| format!("Failed to bind {}", path.display()))?;

    // Non-blocking so we can check the shutdown flag periodically
    listener
        .set_nonblocking(true)
        .context("Failed to configure socket")?;
    log::info!("listening on {}", path.display());

    let path: PathBuf = path.to_path_buf();
    std::thread::spawn(move || {
        while !shutdown.load(Ordering::Relaxed) {
            match listener.accept() {
                Ok((stream, _)) => {
                    stream.set_nonblocking(false).ok();
                    let rpc = rpc.clone();
                    std::thread::spawn(move || handle_connection(stream, &rpc));
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    std::thread::sleep(std::time::Duration::from_millis(50));
                }
                Err(e) => {
                    log::warn!("socket accept failed: {}", e);
                    break;
                }
            }
        }
        // Clean up socket file on shutdown
        let _ = std::fs::remove_file(&path);
    });
    Ok(())
}

/// Bridge stdin/stdout to a running editor's socket, for clients that can
/// only spawn a process. Fails if no editor is listening.
pub fn run_as_proxy(path: &Path) -> std::io::Result<()> {
    let stream = UnixStream::connect(path)?;
    let mut from_editor = BufReader::new(stream.try_clone()?);
    let mut to_editor = stream;
    let mut stdout = std::io::stdout();

    for line in std::io::stdin().lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        writeln!(to_editor, "{}", line)?;
        to_editor.flush()?;

        let method = serde_json::from_str::<Value>(&line)
            .ok()
            .and_then(|req| req.get("method").and_then(Value::as_str).map(str::to_string));
        if method.as_deref().is_some_and(is_notification) {
            continue;
        }

        let mut response = String::new();
        if from_editor.read_line(&mut response)? == 0 {
            // Editor went away
            break;
        }
        stdout.write_all(response.as_bytes())?;
        stdout.flush()?;
    }
    Ok(())
}
