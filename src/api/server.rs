use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::api::dto::{GraphDto, SelectionDto, TableDto};
use crate::application::{CaptureMode, Session};
use crate::config::Config;
use crate::infrastructure::capture_log::HitRecord;
use crate::infrastructure::{DotRenderer, MemoryRenderer, MemoryTableView};
use crate::ports::{GraphRenderer, TableView};

#[derive(Debug, Deserialize)]
struct CommandReq {
    command: String,
    params: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct StartParams {
    location: String,
    #[serde(default)]
    mode: Option<CaptureMode>,
}

#[derive(Debug, Deserialize)]
struct SelectParams {
    index: usize,
}

/// Server-wide settings; every connection gets its own session.
#[derive(Debug, Clone, Default)]
pub struct ServerOptions {
    pub config: Config,
    /// Where DOT files go. Renders are only kept in memory when unset.
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Shutdown,
}

pub fn start_server(port: u16, options: ServerOptions) -> Result<()> {
    let address = format!("127.0.0.1:{}", port);
    let listener = TcpListener::bind(&address)
        .with_context(|| format!("Failed to bind to {}", address))?;
    serve(listener, &options)
}

/// Accept connections one at a time until a client sends `SHUTDOWN`.
///
/// Connections are served sequentially: the rendering backend takes one
/// request at a time.
pub fn serve(listener: TcpListener, options: &ServerOptions) -> Result<()> {
    let address = listener.local_addr().context("Listener has no local address")?;
    info!(%address, "session server listening");

    for stream in listener.incoming() {
        match stream {
            Ok(stream) => match handle_connection(stream, options) {
                Ok(Flow::Shutdown) => {
                    info!("shutdown requested");
                    break;
                }
                Ok(Flow::Continue) => {}
                Err(e) => warn!("connection error: {:#}", e),
            },
            Err(e) => warn!("accept error: {}", e),
        }
    }

    Ok(())
}

fn handle_connection(mut stream: TcpStream, options: &ServerOptions) -> Result<Flow> {
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut line = String::new();

    let dot;
    let memory = MemoryRenderer::new();
    let renderer: &dyn GraphRenderer = match &options.output_dir {
        Some(dir) => {
            dot = DotRenderer::new(dir.clone());
            &dot
        }
        None => &memory,
    };
    let table_view = MemoryTableView::new();
    let mut session: Option<Session<'_>> = None;

    loop {
        line.clear();
        let bytes_read = reader.read_line(&mut line)?;
        if bytes_read == 0 {
            return Ok(Flow::Continue); // Connection closed
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let (response, flow) =
            match process_command(trimmed, &mut session, renderer, &table_view, &options.config) {
                Ok((data, flow)) => (
                    json!({
                        "status": "success",
                        "data": data
                    }),
                    flow,
                ),
                Err(e) => (
                    json!({
                        "status": "error",
                        "message": format!("{:#}", e)
                    }),
                    Flow::Continue,
                ),
            };

        let response_str = serde_json::to_string(&response)?;
        stream.write_all(response_str.as_bytes())?;
        stream.write_all(b"\n")?;

        if flow == Flow::Shutdown {
            return Ok(flow);
        }
    }
}

fn process_command<'a>(
    json_str: &str,
    session: &mut Option<Session<'a>>,
    renderer: &'a dyn GraphRenderer,
    table_view: &'a dyn TableView,
    config: &Config,
) -> Result<(serde_json::Value, Flow)> {
    let req: CommandReq = serde_json::from_str(json_str).context("Invalid JSON format")?;

    let data = match req.command.as_str() {
        "PING" => json!("PONG"),
        "START" => handle_start(req.params, session, renderer, table_view, config)?,
        "CAPTURE" => handle_capture(req.params, session)?,
        "COMPLETE" => handle_complete(session)?,
        "SELECT" => handle_select(req.params, session)?,
        "SHUTDOWN" => return Ok((json!("Shutting down..."), Flow::Shutdown)),
        _ => anyhow::bail!("Unknown command: {}", req.command),
    };
    Ok((data, Flow::Continue))
}

fn parse_params<T: DeserializeOwned>(params: Option<serde_json::Value>, command: &str) -> Result<T> {
    let params = params.ok_or_else(|| anyhow::anyhow!("Missing params for {}", command))?;
    serde_json::from_value(params).with_context(|| format!("Invalid params for {}", command))
}

fn active<'s, 'a>(session: &'s mut Option<Session<'a>>) -> Result<&'s mut Session<'a>> {
    session
        .as_mut()
        .ok_or_else(|| anyhow::anyhow!("No capture session; send START first"))
}

fn handle_start<'a>(
    raw: Option<serde_json::Value>,
    session: &mut Option<Session<'a>>,
    renderer: &'a dyn GraphRenderer,
    table_view: &'a dyn TableView,
    config: &Config,
) -> Result<serde_json::Value> {
    let params: StartParams = parse_params(raw, "START")?;

    if let Some(previous) = session.as_ref() {
        if !previous.is_completed() {
            warn!(location = previous.location(), "replacing an unfinished capture session");
        }
    }

    let mut config = config.clone();
    if let Some(mode) = params.mode {
        config.session.mode = mode;
    }
    let started = Session::start(&params.location, &config, renderer, table_view)?;
    let data = json!({
        "location": started.location(),
        "graph": started.graph_name(),
        "mode": started.mode(),
    });
    *session = Some(started);
    Ok(data)
}

fn handle_capture(
    raw: Option<serde_json::Value>,
    session: &mut Option<Session<'_>>,
) -> Result<serde_json::Value> {
    let record: HitRecord = parse_params(raw, "CAPTURE")?;
    let session = active(session)?;
    let (frames, locals) = record.into_parts();
    let should_pause = session.on_capture(frames, locals);
    let captures = session.store().count();
    let report = if should_pause {
        Some(session.hit_report(captures - 1)?)
    } else {
        None
    };
    Ok(json!({
        "should_pause": should_pause,
        "captures": captures,
        "report": report,
    }))
}

fn handle_complete(session: &mut Option<Session<'_>>) -> Result<serde_json::Value> {
    let session = active(session)?;
    let table = TableDto::from(session.on_complete()?);
    let graph = session
        .graph()
        .map(|graph| GraphDto::new(session.graph_name(), graph))
        .ok_or_else(|| anyhow::anyhow!("Completed session has no graph"))?;
    Ok(json!({ "graph": graph, "table": table }))
}

fn handle_select(
    raw: Option<serde_json::Value>,
    session: &mut Option<Session<'_>>,
) -> Result<serde_json::Value> {
    let params: SelectParams = parse_params(raw, "SELECT")?;
    let session = active(session)?;
    let edges = session.on_row_selected(params.index)?;
    Ok(serde_json::to_value(SelectionDto::new(params.index, &edges))?)
}
