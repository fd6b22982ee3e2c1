use anyhow::{Context, Result};
use lessonmark::{
    Config, CopyButton, CopyOutcome, MarkdownRenderer, SystemClipboard, copy_code_block,
    preview_page,
};
use std::fs;
use std::io::Write;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Copies one code block of the rendered fragment to the system clipboard.
///
/// A failed copy is reported but does not fail the command.
fn copy_block(fragment: &str, renderer: &MarkdownRenderer, index: usize) {
    let code_id = renderer.code_id(index);
    let mut clipboard = SystemClipboard::new();
    let mut button = CopyButton::new();

    match copy_code_block(
        fragment,
        &code_id,
        &mut clipboard,
        &mut button,
        Instant::now(),
    ) {
        CopyOutcome::Copied => {
            eprintln!("{} copied to clipboard", code_id);
        }
        CopyOutcome::Failed(notification) => {
            eprintln!("Warning: {}", notification.message);
        }
    }
}

fn main() -> Result<()> {
    let config = Config::parse();
    init_logging(&config);
    config.validate().context("Invalid configuration")?;

    let source = config.read_input()?;
    let renderer = MarkdownRenderer::new(config.id.clone());
    let fragment = renderer.render(&source);

    if let Some(index) = config.copy {
        copy_block(&fragment, &renderer, index);
    }

    let output = if config.page {
        preview_page(&config.page_title(), &fragment).into_string()
    } else {
        fragment
    };

    match &config.output {
        Some(path) => {
            fs::write(path, &output)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), bytes = output.len(), "Wrote output");
            println!("Generated: {}", path.display());

            if config.open {
                open::that(path)
                    .with_context(|| format!("Failed to open {}", path.display()))?;
            }
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(output.as_bytes())
                .context("Failed to write stdout")?;
            stdout.flush().context("Failed to flush stdout")?;
        }
    }

    Ok(())
}
