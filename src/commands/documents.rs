use crate::app::App;
use crate::error::ClientError;
use crate::models::Document;
use crate::upload::UploadPhase;
use std::path::Path;

pub async fn list(app: &mut App, json: bool) -> Result<(), ClientError> {
    let documents = app.refresh_documents().await?;
    if json {
        let rendered = serde_json::to_string_pretty(documents)
            .map_err(std::io::Error::other)?;
        println!("{}", rendered);
    } else {
        print_documents(documents);
    }
    Ok(())
}

fn print_documents(documents: &[Document]) {
    if documents.is_empty() {
        println!("No documents uploaded yet.");
        return;
    }
    println!("Uploaded Documents");
    for doc in documents {
        println!("  {}", doc.filename);
    }
}

/// Uploads and waits for processing. Ctrl-C drops the upload, which stops polling.
pub async fn upload(app: &mut App, path: &Path) -> Result<(), ClientError> {
    let mut phases = app.uploads().subscribe();
    let printer = tokio::spawn(async move {
        while phases.changed().await.is_ok() {
            let phase = phases.borrow_and_update().clone();
            match phase {
                UploadPhase::Submitting { filename } => eprintln!("Uploading {}...", filename),
                UploadPhase::Polling {
                    attempt,
                    chunks: Some((done, total)),
                    ..
                } => eprintln!("Processing ({}/{} chunks, check {})", done, total, attempt),
                UploadPhase::Polling {
                    attempt,
                    progress: Some(progress),
                    ..
                } => eprintln!("Processing ({:.0}%, check {})", progress, attempt),
                UploadPhase::Polling { attempt: 1, .. } => eprintln!("Processing..."),
                _ => {}
            }
        }
    });

    let result = tokio::select! {
        result = app.upload(path) => result,
        _ = tokio::signal::ctrl_c() => Err(ClientError::Cancelled),
    };
    printer.abort();

    let outcome = result?;
    println!(
        "{} processed ({} status checks)",
        outcome.filename, outcome.polls
    );
    print_documents(app.documents());
    Ok(())
}

pub async fn delete(app: &mut App, filename: &str) -> Result<(), ClientError> {
    app.delete_document(filename).await?;
    println!("Deleted {}", filename);
    print_documents(app.documents());
    Ok(())
}
