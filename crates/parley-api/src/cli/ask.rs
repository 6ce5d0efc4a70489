//! One-shot `ask` command: run a single message through the pipeline.

use std::path::Path;

use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use console::style;

use parley_types::chat::ChatSelector;
use parley_types::enrich::FileAttachment;
use parley_types::pipeline::MessageRequest;

use crate::state::AppState;

/// Send `prompt` as `external_id`, registering the account if needed.
pub async fn ask(
    state: &AppState,
    external_id: &str,
    prompt: String,
    chat: Option<&str>,
    image: Option<&Path>,
    file: Option<&Path>,
    json: bool,
) -> Result<()> {
    let chat = ChatSelector::parse(chat).map_err(|e| anyhow::anyhow!(e))?;
    state.user_service.login(external_id, None).await?;

    let image = match image {
        Some(path) => Some(STANDARD.encode(read(path).await?)),
        None => None,
    };
    let file = match file {
        Some(path) => Some(FileAttachment {
            buffer: STANDARD.encode(read(path).await?),
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "attachment".to_string()),
            mime: guess_mime(path).to_string(),
        }),
        None => None,
    };

    let reply = state
        .orchestrator
        .handle(MessageRequest {
            external_id: external_id.to_string(),
            prompt,
            image,
            file,
            chat,
        })
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&reply)?);
        return Ok(());
    }

    println!();
    println!("{}", reply.content);
    println!();
    println!(
        "  {}",
        style(format!("chat {} ({})", reply.chat_id, reply.kind)).dim()
    );
    Ok(())
}

async fn read(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))
}

/// Best-effort MIME type from the file extension.
fn guess_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "txt" | "md" => "text/plain",
        "csv" => "text/csv",
        "json" => "application/json",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_mime_by_extension() {
        assert_eq!(guess_mime(Path::new("report.PDF")), "application/pdf");
        assert_eq!(guess_mime(Path::new("notes.md")), "text/plain");
        assert_eq!(guess_mime(Path::new("blob")), "application/octet-stream");
    }
}
