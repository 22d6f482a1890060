use std::net::SocketAddr;

use axum::Router;
use tower_http::services::ServeDir;

use crate::{ServeArgs, build::Builder};

pub async fn run(args: &ServeArgs) -> Result<(), anyhow::Error> {
    let (config, base_path) = super::load_project(args.config_file.as_deref())?;

    // Build the site first
    let result = Builder::new(config, base_path).build().await?;
    log!(
        "serve";
        "built {} studies ({} failed)",
        result.studies.len(),
        result.failed.len()
    );

    // Create the static file server
    let serve_dir = ServeDir::new(&result.output_dir).append_index_html_on_directories(true);
    let app = Router::new().fallback_service(serve_dir);

    // Parse the address
    let addr: SocketAddr = format!("{}:{}", args.bind, args.port).parse()?;

    // Determine the URL to display
    let display_host = if args.bind == "0.0.0.0" {
        "localhost"
    } else {
        &args.bind
    };
    let url = format!("http://{}:{}", display_host, args.port);

    log!("serve"; "serving {} at {}", result.output_dir.display(), url);
    log!("serve"; "press Ctrl+C to stop");

    // Open browser if requested
    if args.open
        && let Err(e) = open::that(&url)
    {
        log_error!("serve"; "failed to open browser: {}", e);
    }

    // Start the server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
