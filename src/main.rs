// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Disview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of disview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! disview CLI entrypoint.
//!
//! By default this runs the interactive TUI over a program image and serves MCP over streamable
//! HTTP at `http://127.0.0.1:<port>/mcp`.

use std::error::Error;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::Router;
use rmcp::transport::{
    streamable_http_server::session::local::LocalSessionManager, StreamableHttpServerConfig,
    StreamableHttpService,
};
use tokio::sync::Mutex;

use disview::config::ViewportConfig;
use disview::engine::{demo_program, FixtureEngine, Program};

const DEFAULT_MCP_HTTP_PORT: u16 = 27435;

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [<program.json>] [--templates <dir>] [--log-file <path>] [--mcp-http-port <port>]\n  {program} [--program <program.json>] [--no-mcp] [--templates <dir>] [--log-file <path>]\n  {program} --demo [--no-mcp] [--mcp-http-port <port>]\n  {program} --dump-demo <path>\n\nWithout a program image the built-in demo program is shown.\nMCP is served over streamable HTTP at `http://127.0.0.1:<port>/mcp`.\n--mcp-http-port selects the port (0 = ephemeral; default {DEFAULT_MCP_HTTP_PORT}); --no-mcp disables it.\n--templates overrides the chart and graph template directory.\n--log-file writes logs there (RUST_LOG filters, default warn).\n--dump-demo writes the demo program image as JSON and exits."
    );
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct CliOptions {
    demo: bool,
    no_mcp: bool,
    program: Option<String>,
    mcp_http_port: Option<u16>,
    templates: Option<String>,
    log_file: Option<String>,
    dump_demo: Option<String>,
}

fn parse_options(mut args: impl Iterator<Item = String>) -> Result<CliOptions, ()> {
    let mut options = CliOptions::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--demo" => {
                if options.demo {
                    return Err(());
                }
                options.demo = true;
            }
            "--no-mcp" => {
                if options.no_mcp {
                    return Err(());
                }
                options.no_mcp = true;
            }
            "--program" => {
                if options.program.is_some() {
                    return Err(());
                }
                options.program = Some(args.next().ok_or(())?);
            }
            "--mcp-http-port" => {
                if options.mcp_http_port.is_some() {
                    return Err(());
                }
                let raw = args.next().ok_or(())?;
                let port: u16 = raw.parse().map_err(|_| ())?;
                options.mcp_http_port = Some(port);
            }
            "--templates" => {
                if options.templates.is_some() {
                    return Err(());
                }
                options.templates = Some(args.next().ok_or(())?);
            }
            "--log-file" => {
                if options.log_file.is_some() {
                    return Err(());
                }
                options.log_file = Some(args.next().ok_or(())?);
            }
            "--dump-demo" => {
                if options.dump_demo.is_some() {
                    return Err(());
                }
                options.dump_demo = Some(args.next().ok_or(())?);
            }
            _ if arg.starts_with('-') => return Err(()),
            _ => {
                if options.program.is_some() {
                    return Err(());
                }
                options.program = Some(arg);
            }
        }
    }

    if options.demo && options.program.is_some() {
        return Err(());
    }

    if options.no_mcp && options.mcp_http_port.is_some() {
        return Err(());
    }

    if options.dump_demo.is_some() && (options.program.is_some() || options.demo) {
        return Err(());
    }

    Ok(options)
}

fn init_logging(log_file: Option<&str>) -> Result<(), Box<dyn Error>> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if let Some(path) = log_file {
        let file = File::create(path)?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.try_init()?;
    Ok(())
}

fn load_program(options: &CliOptions) -> Result<Program, Box<dyn Error>> {
    match options.program.as_deref() {
        Some(path) => Ok(disview::store::load_program(Path::new(path))?),
        None => Ok(demo_program()),
    }
}

fn main() {
    let result = (|| -> Result<(), Box<dyn Error>> {
        let mut args = std::env::args();
        let program = args.next().unwrap_or_else(|| "disview".to_owned());

        let options = match parse_options(args) {
            Ok(options) => options,
            Err(()) => {
                print_usage(&program);
                std::process::exit(2);
            }
        };

        init_logging(options.log_file.as_deref())?;

        if let Some(path) = options.dump_demo.as_deref() {
            disview::store::save_program(Path::new(path), &demo_program())?;
            return Ok(());
        }

        let image = load_program(&options)?;
        let mut config = ViewportConfig::from_env()?;
        if let Some(dir) = options.templates.as_deref() {
            config = config.with_template_dir(Some(PathBuf::from(dir)));
        }

        if options.no_mcp {
            let engine = Box::new(FixtureEngine::new(image));
            return disview::tui::run(engine, config);
        }

        let ui_state = Arc::new(Mutex::new(disview::ui::UiState::default()));
        let mcp = disview::mcp::DisviewMcp::new(ui_state.clone());
        let mcp_http_port = options.mcp_http_port.unwrap_or(DEFAULT_MCP_HTTP_PORT);

        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;

        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::bind(("127.0.0.1", mcp_http_port)).await?;
            log::info!("MCP listening on http://{}/mcp", listener.local_addr()?);

            let config_http = StreamableHttpServerConfig {
                stateful_mode: true,
                ..StreamableHttpServerConfig::default()
            };
            let shutdown_token = config_http.cancellation_token.clone();
            let server_shutdown = shutdown_token.clone();

            let session_manager = Arc::new(LocalSessionManager::default());
            let mcp_service = {
                let mcp = mcp.clone();
                StreamableHttpService::new(move || Ok(mcp.clone()), session_manager, config_http)
            };

            let router = Router::new().nest_service("/mcp", mcp_service);
            let server_handle = tokio::spawn(async move {
                let serve = axum::serve(listener, router).with_graceful_shutdown(async move {
                    server_shutdown.cancelled().await;
                });
                if let Err(err) = serve.await {
                    log::error!("MCP HTTP server error: {err}");
                }
            });

            // The viewport engine is not `Send`; it is built on the terminal thread.
            let tui_ui_state = ui_state.clone();
            let tui_join = tokio::task::spawn_blocking(move || {
                let engine = Box::new(FixtureEngine::new(image));
                disview::tui::run_with_ui_state(engine, config, Some(tui_ui_state))
                    .map_err(|err| err.to_string())
            })
            .await;

            shutdown_token.cancel();
            let _ = server_handle.await;

            let tui_result = tui_join.map_err(|err| -> Box<dyn Error> { Box::new(err) })?;
            tui_result.map_err(|err| {
                Box::new(std::io::Error::new(std::io::ErrorKind::Other, err)) as Box<dyn Error>
            })?;
            Ok::<(), Box<dyn Error>>(())
        })?;

        Ok(())
    })();

    if let Err(err) = result {
        eprintln!("disview: {err}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_options, CliOptions};

    fn args(values: &[&str]) -> impl Iterator<Item = String> {
        values
            .iter()
            .map(|value| (*value).to_owned())
            .collect::<Vec<_>>()
            .into_iter()
    }

    #[test]
    fn parses_empty_args() {
        let options = parse_options(std::iter::empty()).expect("parse options");
        assert_eq!(options, CliOptions::default());
    }

    #[test]
    fn parses_demo_flag() {
        let options = parse_options(args(&["--demo"])).expect("parse options");
        assert!(options.demo);
        assert!(!options.no_mcp);
        assert!(options.program.is_none());
        assert_eq!(options.mcp_http_port, None);
    }

    #[test]
    fn parses_program_flag_and_positional() {
        let options =
            parse_options(args(&["--program", "bin.json"])).expect("parse options");
        assert_eq!(options.program.as_deref(), Some("bin.json"));

        let options = parse_options(args(&["bin.json", "--no-mcp"])).expect("parse options");
        assert_eq!(options.program.as_deref(), Some("bin.json"));
        assert!(options.no_mcp);
    }

    #[test]
    fn parses_mcp_http_port() {
        let options = parse_options(args(&["--mcp-http-port", "1234"])).expect("parse options");
        assert_eq!(options.mcp_http_port, Some(1234));
    }

    #[test]
    fn parses_templates_and_log_file() {
        let options = parse_options(args(&["--templates", "tpl", "--log-file", "out.log"]))
            .expect("parse options");
        assert_eq!(options.templates.as_deref(), Some("tpl"));
        assert_eq!(options.log_file.as_deref(), Some("out.log"));
    }

    #[test]
    fn parses_dump_demo() {
        let options = parse_options(args(&["--dump-demo", "demo.json"])).expect("parse options");
        assert_eq!(options.dump_demo.as_deref(), Some("demo.json"));
    }

    #[test]
    fn rejects_dump_demo_with_program() {
        parse_options(args(&["--dump-demo", "demo.json", "bin.json"])).unwrap_err();
        parse_options(args(&["--demo", "--dump-demo", "demo.json"])).unwrap_err();
    }

    #[test]
    fn rejects_mcp_http_port_without_mcp() {
        parse_options(args(&["--no-mcp", "--mcp-http-port", "0"])).unwrap_err();
    }

    #[test]
    fn rejects_invalid_port() {
        parse_options(args(&["--mcp-http-port", "70000"])).unwrap_err();
        parse_options(args(&["--mcp-http-port"])).unwrap_err();
    }

    #[test]
    fn rejects_demo_with_program() {
        parse_options(args(&["--demo", "bin.json"])).unwrap_err();
        parse_options(args(&["--program", "bin.json", "--demo"])).unwrap_err();
    }

    #[test]
    fn rejects_unknown_args() {
        parse_options(args(&["--nope"])).unwrap_err();
    }

    #[test]
    fn rejects_duplicate_flags() {
        parse_options(args(&["--demo", "--demo"])).unwrap_err();
        parse_options(args(&["--no-mcp", "--no-mcp"])).unwrap_err();
        parse_options(args(&["--templates", "a", "--templates", "b"])).unwrap_err();
        parse_options(args(&["one.json", "two.json"])).unwrap_err();
        parse_options(args(&["--program", "one.json", "two.json"])).unwrap_err();
    }

    #[test]
    fn rejects_missing_values() {
        parse_options(args(&["--program"])).unwrap_err();
        parse_options(args(&["--log-file"])).unwrap_err();
    }
}
