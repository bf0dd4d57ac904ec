//! tutorgate-kb - manage the knowledge base
//!
//! Topics and document metadata live in the collection store at
//! $XDG_DATA_HOME/tutorgate/store.db (~/.local/share/tutorgate/store.db).
//! A fresh store starts with the seed collections.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tutorgate_core::kb::{DocumentFile, FileType, KnowledgeBaseItem, NewDocument, NewTopic, SUBJECTS};
use tutorgate_core::{Config, KnowledgeBase, SqliteStore};

#[derive(Parser)]
#[command(name = "tutorgate-kb")]
#[command(about = "Manage knowledge base topics and documents")]
#[command(version)]
struct Args {
    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List topics
    Topics {
        #[arg(short, long)]
        subject: Option<String>,
    },
    /// List documents
    Documents {
        #[arg(short, long)]
        subject: Option<String>,
        #[arg(short, long)]
        faculty: Option<String>,
    },
    /// Search documents by keyword, file name, description or subject
    Search {
        /// Search terms (any may match)
        query: Vec<String>,
    },
    /// Add a topic
    AddTopic {
        #[arg(long)]
        topic: String,
        #[arg(long)]
        explanation: String,
        #[arg(long, default_value = "")]
        image_url: String,
        #[arg(long)]
        subject: Option<String>,
        #[arg(long)]
        faculty: Option<String>,
    },
    /// Add document metadata
    AddDocument {
        #[arg(long)]
        file_name: String,
        #[arg(long)]
        subject: String,
        #[arg(long)]
        faculty: String,
        /// pdf, excel, word or other (guessed from the file name if omitted)
        #[arg(long)]
        file_type: Option<FileType>,
        #[arg(long)]
        file_url: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Comma-separated keywords
        #[arg(long, value_delimiter = ',')]
        keywords: Vec<String>,
        #[arg(long, default_value = "unknown")]
        size: String,
    },
    /// Delete a topic by id
    DeleteTopic { id: u64 },
    /// Delete a document by id
    DeleteDocument { id: u64 },
    /// List the subject names
    Subjects,
}

fn main() -> Result<()> {
    let args = Args::parse();

    Config::ensure_xdg_env();

    let config = Config::load().context("failed to load configuration")?;

    let _log_guard =
        tutorgate_core::logging::init(&config.logging).context("failed to initialize logging")?;

    let store_path = Config::store_path();
    tracing::info!(path = %store_path.display(), "Opening store");
    let store = SqliteStore::open(&store_path).context("failed to open store")?;
    let kb = KnowledgeBase::new(Arc::new(store));

    match args.command {
        Command::Topics { subject } => {
            let topics = match subject {
                Some(s) => kb.topics_by_subject(&s)?,
                None => kb.topics()?,
            };
            print_topics(&topics, args.json)?;
        }
        Command::Documents { subject, faculty } => {
            let docs = match (subject, faculty) {
                (Some(s), Some(f)) => {
                    let by_faculty: HashSet<u64> =
                        kb.documents_by_faculty(&f)?.iter().map(|d| d.id).collect();
                    kb.documents_by_subject(&s)?
                        .into_iter()
                        .filter(|d| by_faculty.contains(&d.id))
                        .collect()
                }
                (Some(s), None) => kb.documents_by_subject(&s)?,
                (None, Some(f)) => kb.documents_by_faculty(&f)?,
                (None, None) => kb.documents()?,
            };
            print_documents(&docs, args.json)?;
        }
        Command::Search { query } => {
            let docs = kb.search_documents(&query.join(" "))?;
            print_documents(&docs, args.json)?;
        }
        Command::AddTopic {
            topic,
            explanation,
            image_url,
            subject,
            faculty,
        } => {
            let item = kb.add_topic(NewTopic {
                topic,
                explanation,
                image_url,
                subject,
                faculty_name: faculty,
            })?;
            print_topics(std::slice::from_ref(&item), args.json)?;
        }
        Command::AddDocument {
            file_name,
            subject,
            faculty,
            file_type,
            file_url,
            description,
            keywords,
            size,
        } => {
            let file = kb.add_document(NewDocument {
                file_type: file_type.unwrap_or_else(|| FileType::from_file_name(&file_name)),
                file_url: file_url.unwrap_or_else(|| format!("/files/{}", file_name)),
                upload_date: chrono::Utc::now().format("%Y-%m-%d").to_string(),
                file_name,
                subject,
                faculty_name: faculty,
                description,
                keywords: keywords
                    .into_iter()
                    .map(|k| k.trim().to_string())
                    .filter(|k| !k.is_empty())
                    .collect(),
                size,
            })?;
            print_documents(std::slice::from_ref(&file), args.json)?;
        }
        Command::DeleteTopic { id } => {
            kb.delete_topic(id)?;
            println!("Deleted topic {}", id);
        }
        Command::DeleteDocument { id } => {
            kb.delete_document(id)?;
            println!("Deleted document {}", id);
        }
        Command::Subjects => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(SUBJECTS)?);
            } else {
                for subject in SUBJECTS {
                    println!("{}", subject);
                }
            }
        }
    }

    Ok(())
}

fn print_topics(topics: &[KnowledgeBaseItem], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(topics)?);
        return Ok(());
    }
    if topics.is_empty() {
        println!("No topics found.");
    }
    for t in topics {
        println!(
            "{:>4}  {}  [{}]  {}  {}",
            t.id,
            t.topic,
            t.subject.as_deref().unwrap_or("-"),
            t.faculty_name.as_deref().unwrap_or("-"),
            t.date.as_deref().unwrap_or("-"),
        );
    }
    Ok(())
}

fn print_documents(docs: &[DocumentFile], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(docs)?);
        return Ok(());
    }
    if docs.is_empty() {
        println!("No documents found.");
    }
    for d in docs {
        println!(
            "{:>4}  {}  ({}, {})  [{}]  {}",
            d.id,
            d.file_name,
            d.file_type.as_str(),
            d.size,
            d.subject,
            d.faculty_name,
        );
    }
    Ok(())
}
