//! scrivener CLI entry point

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use scrivener::{
    config::Config,
    embed::{create_embedder, RetryPolicy},
    error::Result,
    extract::HttpMetadataExtractor,
    jobs::{
        create_link, delete_document, delete_documents, delete_link, document_status,
        global_status, ingest_document, print_document_status, print_status, purge_old_blobs,
        register_file, register_text, register_youtube, transcribe_document, IngestRequest,
    },
    meta::{MetaDb, MetadataFieldDef},
    parse::LocalExtractor,
    speech::HttpSpeechClient,
    storage::HttpBlobStore,
    store::{VectorStore, VectorTarget},
    transcript::HttpTranscriptFetcher,
};
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "scrivener")]
#[command(version, about = "Document transcription and ingestion pipeline", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Act as this owner instead of the configured one
    #[arg(long, global = true)]
    owner: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize scrivener configuration and database
    Init {
        /// Force overwrite existing config
        #[arg(long)]
        force: bool,
    },

    /// Upload local files and register them as documents
    Register {
        /// Files to upload
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Add a pasted-text document (complete on arrival)
    AddText {
        /// Document title
        title: String,

        /// Document body
        content: String,
    },

    /// Register a YouTube video by URL
    AddYoutube {
        /// Video URL
        url: String,
    },

    /// Add a curated link with a searchable mirror vector
    AddLink {
        /// Link name
        name: String,

        /// Link URL
        url: String,

        /// Optional description
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Produce a transcript for a registered document
    Transcribe {
        /// Document ID
        document_id: String,
    },

    /// Chunk, extract, embed, and index a transcribed document
    Ingest {
        /// Document ID
        document_id: String,

        /// Vector table to write into (primary or secondary)
        #[arg(long, default_value = "primary")]
        target: VectorTarget,

        /// External link recorded on the ingestion manifest
        #[arg(long)]
        external_link: Option<String>,
    },

    /// Delete documents with their vectors, manifests, and stored objects
    Delete {
        /// Document IDs
        #[arg(required = true)]
        document_ids: Vec<String>,
    },

    /// Remove stored objects older than the retention window
    Purge,

    /// Manage metadata extraction fields
    Fields {
        #[command(subcommand)]
        action: FieldsAction,
    },

    /// Manage curated links
    Links {
        #[command(subcommand)]
        action: LinksAction,
    },

    /// Show document or global status
    Status {
        /// Document ID (omit for global status)
        document_id: Option<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum FieldsAction {
    /// Define a new extraction field
    Add {
        /// Field name
        name: String,

        /// Example value shown to the extraction model
        #[arg(short, long)]
        example: Option<String>,
    },

    /// List defined fields
    List,

    /// Remove a field definition
    Remove {
        /// Field ID (use 'scrivener fields list' to find it)
        field_id: String,
    },
}

#[derive(Subcommand)]
enum LinksAction {
    /// List curated links
    List,

    /// Remove a link and its mirrored vectors
    Remove {
        /// Link ID (use 'scrivener links list' to find it)
        link_id: String,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    // Handle init command specially (doesn't need existing config)
    if matches!(cli.command, Commands::Init { .. }) {
        return handle_init(cli).await;
    }

    // Handle completions command (doesn't need config/db/store)
    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "scrivener", &mut std::io::stdout());
        return Ok(());
    }

    // Load configuration
    let mut config = load_config(cli.config.as_deref()).await?;
    if let Some(owner) = &cli.owner {
        config.owner_id = owner.clone();
    }

    // Initialize components
    let db = MetaDb::new(&config.paths.db_file).await?;
    let store = VectorStore::new(&db);

    // Handle commands
    match cli.command {
        Commands::Init { .. } => unreachable!(),

        Commands::Register { paths } => {
            let blobs = HttpBlobStore::new(&config.storage, config.storage_api_key())?;

            let mut docs = Vec::with_capacity(paths.len());
            for path in &paths {
                docs.push(register_file(&db, &blobs, &config.owner_id, path).await?);
            }

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&docs)?);
            } else {
                for doc in &docs {
                    println!("✓ Registered '{}' [{}]", doc.filename, doc.source_kind);
                    println!("  ID: {}", doc.id);
                }
            }
        }

        Commands::AddText { title, content } => {
            let doc = register_text(&db, &config.owner_id, &title, &content).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&doc)?);
            } else {
                println!("✓ Added text document '{}'", doc.filename);
                println!("  ID: {}", doc.id);
            }
        }

        Commands::AddYoutube { url } => {
            let doc = register_youtube(&db, &config.owner_id, &url).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&doc)?);
            } else {
                println!("✓ Registered '{}'", doc.filename);
                println!("  ID: {}", doc.id);
            }
        }

        Commands::AddLink {
            name,
            url,
            description,
        } => {
            let embedder = create_embedder(&config.embedding)?;
            let outcome = create_link(
                &db,
                &store,
                embedder.as_ref(),
                &config.owner_id,
                &name,
                &url,
                description.as_deref(),
            )
            .await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                println!("✓ Link '{}' added", name);
                println!("  ID: {}", outcome.link_id);
                if outcome.vector_id.is_none() {
                    println!("  Search mirror could not be written");
                }
            }
        }

        Commands::Transcribe { document_id } => {
            let blobs = HttpBlobStore::new(&config.storage, config.storage_api_key())?;
            let speech = HttpSpeechClient::new(&config.speech, config.speech_api_key())?;
            let fetcher =
                HttpTranscriptFetcher::new(&config.transcript, config.transcript_api_key())?;
            let extractor = LocalExtractor;

            transcribe_document(
                &db,
                &blobs,
                &speech,
                None,
                &fetcher,
                &extractor,
                &config,
                &document_id,
            )
            .await?;

            if cli.json {
                if let Some(doc) = db.get_document(&document_id).await? {
                    println!("{}", serde_json::to_string_pretty(&doc)?);
                }
            } else {
                println!("✓ Transcript saved for document {}", document_id);
            }
        }

        Commands::Ingest {
            document_id,
            target,
            external_link,
        } => {
            let embedder = create_embedder(&config.embedding)?;
            let extractor =
                HttpMetadataExtractor::new(&config.extraction, config.extraction_api_key())?;
            let retry = RetryPolicy::from(&config.embedding);

            let request = IngestRequest {
                document_id,
                owner_id: config.owner_id.clone(),
                target,
                external_link,
            };

            let outcome = ingest_document(
                &db,
                &store,
                embedder.as_ref(),
                &extractor,
                &config.chunk,
                &retry,
                &request,
            )
            .await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                println!("✓ Ingestion complete");
                println!("  Chunks: {}", outcome.chunk_count);
                println!("  Vectors written: {}", outcome.vector_count);
            }
        }

        Commands::Delete { document_ids } => {
            let blobs = HttpBlobStore::new(&config.storage, config.storage_api_key())?;

            if let [document_id] = document_ids.as_slice() {
                let outcome = delete_document(&db, &store, &blobs, document_id).await?;

                if cli.json {
                    println!("{}", serde_json::to_string_pretty(&outcome)?);
                } else {
                    println!("✓ Document {} deleted", outcome.document_id);
                    println!("  Vectors removed: {}", outcome.deleted_vectors);
                    if outcome.removed_blob {
                        println!("  Stored object removed");
                    }
                }
            } else {
                let outcome = delete_documents(&db, &blobs, &document_ids).await?;

                if cli.json {
                    println!("{}", serde_json::to_string_pretty(&outcome)?);
                } else {
                    println!(
                        "✓ Deleted {} of {} documents",
                        outcome.deleted,
                        document_ids.len()
                    );
                    println!("  Vectors removed: {}", outcome.deleted_vectors);
                    for err in &outcome.errors {
                        println!("  Failed: {}", err);
                    }
                }
            }
        }

        Commands::Purge => {
            let blobs = HttpBlobStore::new(&config.storage, config.storage_api_key())?;
            let outcome = purge_old_blobs(&blobs, &config.purge).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                println!("✓ Purge complete");
                println!("  Objects scanned: {}", outcome.scanned);
                println!("  Objects removed: {}", outcome.deleted);
            }
        }

        Commands::Fields { action } => match action {
            FieldsAction::Add { name, example } => {
                let field = MetadataFieldDef::new(config.owner_id.clone(), name, example);
                db.insert_field(&field).await?;

                if cli.json {
                    println!("{}", serde_json::to_string_pretty(&field)?);
                } else {
                    println!("✓ Field '{}' added", field.name);
                    println!("  ID: {}", field.id);
                }
            }

            FieldsAction::List => {
                let fields = db.list_fields(&config.owner_id).await?;

                if cli.json {
                    println!("{}", serde_json::to_string_pretty(&fields)?);
                } else if fields.is_empty() {
                    println!("No fields defined. Use 'scrivener fields add' to create one.");
                } else {
                    for field in &fields {
                        let state = if field.enabled { "enabled" } else { "disabled" };
                        println!("• {} [{}]", field.name, state);
                        println!("  ID: {}", field.id);
                        if let Some(example) = &field.example {
                            println!("  Example: {}", example);
                        }
                    }
                }
            }

            FieldsAction::Remove { field_id } => {
                db.delete_field(&field_id).await?;
                println!("✓ Field {} removed", field_id);
            }
        },

        Commands::Links { action } => match action {
            LinksAction::List => {
                let links = db.list_links(&config.owner_id).await?;

                if cli.json {
                    println!("{}", serde_json::to_string_pretty(&links)?);
                } else if links.is_empty() {
                    println!("No links saved. Use 'scrivener add-link' to create one.");
                } else {
                    for link in &links {
                        println!("• {} [{}]", link.name, link.url);
                        println!("  ID: {}", link.id);
                        if let Some(description) = &link.description {
                            println!("  {}", description);
                        }
                    }
                }
            }

            LinksAction::Remove { link_id } => {
                delete_link(&db, &store, &link_id).await?;
                println!("✓ Link {} removed", link_id);
            }
        },

        Commands::Status { document_id } => match document_id {
            Some(id) => {
                let info = document_status(&db, &id).await?;

                if cli.json {
                    println!("{}", serde_json::to_string_pretty(&info)?);
                } else {
                    print_document_status(&info);
                }
            }
            None => {
                let status = global_status(&config, &db, &store).await?;

                if cli.json {
                    println!("{}", serde_json::to_string_pretty(&status)?);
                } else {
                    print_status(&status);
                }
            }
        },

        Commands::Completions { .. } => unreachable!(),
    }

    Ok(())
}

async fn handle_init(cli: Cli) -> Result<()> {
    let Commands::Init { force } = cli.command else {
        unreachable!()
    };

    // Get the base directory: if user specifies a config file, use its parent dir
    let base_dir = if let Some(path) = cli.config {
        if path.extension().map_or(false, |e| e == "toml") {
            path.parent()
                .map(PathBuf::from)
                .unwrap_or_else(Config::default_base_dir)
        } else {
            path
        }
    } else {
        Config::default_base_dir()
    };

    let mut config = Config::default();
    config.paths.base_dir = base_dir.clone();
    config.paths.config_file = base_dir.join("config.toml");
    config.paths.db_file = base_dir.join("metadata.db");

    if let Some(owner) = cli.owner {
        config.owner_id = owner;
    }

    if config.paths.config_file.exists() && !force {
        eprintln!(
            "Config file already exists at: {}\nUse --force to overwrite.",
            config.paths.config_file.display()
        );
        std::process::exit(1);
    }

    std::fs::create_dir_all(&config.paths.base_dir)?;
    config.validate()?;
    config.save()?;

    let db = MetaDb::new(&config.paths.db_file).await?;
    db.init_schema().await?;

    println!("✓ Initialized scrivener at {}", config.paths.base_dir.display());
    println!("\nConfiguration: {}", config.paths.config_file.display());
    println!("Database: {}", config.paths.db_file.display());
    println!("\nNext steps:");
    println!("  1. Edit the config file to point at your services");
    println!("  2. Register a document: scrivener register notes.pdf");
    println!("  3. Transcribe it: scrivener transcribe <document-id>");
    println!("  4. Ingest it: scrivener ingest <document-id>");

    Ok(())
}

async fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    let config_path = path
        .map(PathBuf::from)
        .unwrap_or_else(Config::default_config_path);

    if !config_path.exists() {
        eprintln!(
            "Config file not found: {}\nRun 'scrivener init' first.",
            config_path.display()
        );
        std::process::exit(1);
    }

    Config::load(&config_path)
}
