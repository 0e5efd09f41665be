//! Articles command - load the feed the way the page does

use crate::cli::args::{ArticlesArgs, OutputFormat};
use crate::cli::commands::open_registry;
use crate::config::Config;
use crate::error::NewswResult;
use crate::page::{Article, Page};
use crate::ui::{report, TaskSpinner, Terminal};
use console::style;

/// Execute the articles command
pub async fn execute(args: ArticlesArgs, config: &Config) -> NewswResult<()> {
    let term = Terminal::detect();
    let table = matches!(args.format, OutputFormat::Table);
    let page = Page::open(open_registry(config, None), config.feed.clone()).await;
    let controlled = page.controller().await.is_some();

    let mut spinner = TaskSpinner::new(&term);
    if table {
        spinner.start("Loading articles...");
    }

    let (articles, registered) = if args.no_register {
        (page.fetch_articles().await, true)
    } else {
        let loaded = page.load().await;
        (loaded.articles, loaded.registered)
    };
    page.close().await;

    if table {
        match articles {
            Ok(ref list) => spinner.stop(&format!("Loaded {} article(s)", list.len())),
            Err(_) => spinner.stop_error("Could not load articles"),
        }
        if !registered {
            report::registration_skipped(&term);
        }
    }

    let mut articles = articles?;
    if args.limit > 0 {
        articles.truncate(args.limit);
    }

    match args.format {
        OutputFormat::Table => print_articles(&term, &articles, controlled),
        OutputFormat::Json => print_json(&articles)?,
        OutputFormat::Plain => print_plain(&articles),
    }

    Ok(())
}

fn print_articles(term: &Terminal, articles: &[Article], controlled: bool) {
    if articles.is_empty() {
        report::feed_empty(term);
        return;
    }

    for article in articles {
        println!("{}", style(article.title().unwrap_or("(untitled)")).bold());

        let byline = match (article.source(), article.published_at()) {
            (Some(source), Some(date)) => format!("{} - {}", source, date),
            (Some(source), None) => source.to_string(),
            (None, Some(date)) => date.to_string(),
            (None, None) => String::new(),
        };
        if !byline.is_empty() {
            println!("  {}", style(byline).dim());
        }
        if let Some(description) = article.description() {
            println!("  {}", description);
        }
        if let Some(url) = article.url() {
            println!("  {}", style(url).cyan());
        }
        println!();
    }

    let via = if controlled { "worker" } else { "network" };
    println!("{} article(s) via {}", articles.len(), via);
}

fn print_json(articles: &[Article]) -> NewswResult<()> {
    let raw: Vec<_> = articles.iter().map(Article::raw).collect();
    println!("{}", serde_json::to_string_pretty(&raw)?);
    Ok(())
}

fn print_plain(articles: &[Article]) {
    for article in articles {
        println!(
            "{}\t{}",
            article.title().unwrap_or_default(),
            article.url().unwrap_or_default()
        );
    }
}
