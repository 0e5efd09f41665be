//! Fetch command - issue one request from a page

use crate::cli::args::FetchArgs;
use crate::cli::commands::open_registry;
use crate::config::Config;
use crate::error::{NewswError, NewswResult};
use crate::http::{Request, Response};
use crate::page::Page;
use console::style;
use std::io::Write;
use tracing::debug;
use url::Url;

/// Execute the fetch command
pub async fn execute(args: FetchArgs, config: &Config) -> NewswResult<()> {
    let origin = Url::parse(&config.worker.origin)
        .map_err(|e| NewswError::invalid_url(&config.worker.origin, e))?;

    let mut request = Request::parse(&args.method, &args.url, &origin)?;
    for (name, value) in args.headers {
        request = request.with_header(name, value);
    }

    let page = Page::open(open_registry(config, None), config.feed.clone()).await;
    match page.controller().await {
        Some(worker) => debug!("{} via worker {}", request, worker.id()),
        None => debug!("{} via network", request),
    }

    let target = request.url().to_string();
    let result = page.fetch(request).await;
    page.close().await;

    let response = result?.ok_or(NewswError::NoResponse(target))?;
    if args.include {
        print_head(&response);
    }

    std::io::stdout()
        .write_all(&response.into_body())
        .map_err(|e| NewswError::io("writing response body", e))?;

    Ok(())
}

fn print_head(response: &Response) {
    let status = format!("{} {}", response.status(), response.status_text());
    let status = if response.ok() {
        style(status).green()
    } else {
        style(status).yellow()
    };
    eprintln!("{} {}", status, style(response.url()).dim());
    for (name, value) in response.headers().iter() {
        eprintln!("{}: {}", style(name).bold(), value);
    }
    eprintln!();
}
